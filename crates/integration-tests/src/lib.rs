//! Integration test harness for PromptShop.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`.
//! Every [`TestShop`] gets its own temporary directory holding the schema,
//! layout, seed fixture and cache, and a [`ScriptedGateway`] instead of the
//! network client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p prompt-shop-integration-tests
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use prompt_shop::config::StorageConfig;
use prompt_shop::gateway::{ModelGateway, ScriptedGateway};
use prompt_shop::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

/// Minimal schema handed to the model in tests.
pub const SCHEMA: &str = r#"{"type":"object","properties":{"products":{"type":"array"},"cart":{"type":"array"}},"required":["products","cart"]}"#;

/// Minimal page layout.
pub const LAYOUT: &str = "<html><body><nav>MyShop</nav><!-- content --></body></html>";

/// Empty shop, formatted the way a person would write the fixture.
pub const EMPTY_STATE: &str = r#"{"products": [], "cart": []}"#;

/// A response reduced to what tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// A shop wired to a scripted gateway and a temporary cache directory.
pub struct TestShop {
    pub dir: TempDir,
    pub gateway: Arc<ScriptedGateway>,
    pub state: AppState,
    router: Router,
}

impl TestShop {
    /// Start a shop seeded with `seed`.
    pub async fn start(seed: &str) -> Self {
        Self::start_with(seed, false).await
    }

    /// Start a shop seeded with `seed`, optionally validating replacements.
    pub async fn start_with(seed: &str, validate_state: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_inputs(&dir, seed).await;

        let storage = storage_for(&dir, validate_state);
        let gateway = Arc::new(ScriptedGateway::new());
        let dyn_gateway: Arc<dyn ModelGateway> = gateway.clone();
        let state = AppState::initialize(&storage, dyn_gateway)
            .await
            .expect("Failed to initialize application state");
        let router = prompt_shop::app(state.clone());

        Self {
            dir,
            gateway,
            state,
            router,
        }
    }

    /// Storage settings pointing into this shop's temp directory.
    #[must_use]
    pub fn storage(&self) -> StorageConfig {
        storage_for(&self.dir, false)
    }

    /// Path of the persisted state document.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.storage().state_path()
    }

    /// Raw contents of the persisted state document.
    pub async fn read_state_file(&self) -> String {
        tokio::fs::read_to_string(self.state_file())
            .await
            .expect("Failed to read state file")
    }

    /// Path of the cached fragment for `page`.
    #[must_use]
    pub fn fragment_file(&self, page: &str) -> PathBuf {
        self.storage().cache_dir.join(format!("{page}.html"))
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Submit an urlencoded form.
    pub async fn form(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }
}

fn storage_for(dir: &TempDir, validate_state: bool) -> StorageConfig {
    StorageConfig {
        schema_path: dir.path().join("schema.json"),
        layout_path: dir.path().join("page.html"),
        seed_path: dir.path().join("seed.json"),
        cache_dir: dir.path().join("cache"),
        validate_state,
    }
}

async fn write_inputs(dir: &TempDir, seed: &str) {
    for (name, contents) in [("schema.json", SCHEMA), ("page.html", LAYOUT), ("seed.json", seed)] {
        tokio::fs::write(dir.path().join(name), contents)
            .await
            .expect("Failed to write test input");
    }
}

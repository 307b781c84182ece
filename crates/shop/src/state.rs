//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::fragments::FragmentCache;
use crate::gateway::{ModelGateway, OutputSchema};
use crate::prompts::PromptBuilder;
use crate::store::{StateStore, StoreError};

/// Name under which the state schema is sent to the model.
pub const OUTPUT_SCHEMA_NAME: &str = "shop";

/// Error building the application state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema {} is not valid JSON: {source}", path.display())]
    InvalidSchema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("state store: {0}")]
    Store(#[from] StoreError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and replaces what would otherwise
/// be process-wide globals: the state document, schema, layout, fragment cache
/// and model gateway.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: StateStore,
    schema: String,
    output_schema: OutputSchema,
    layout: String,
    fragments: FragmentCache,
    gateway: Arc<dyn ModelGateway>,
}

impl AppState {
    /// Load schema, layout and state document, and wire in the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if an input file is missing, the schema is not JSON,
    /// or the state document cannot be seeded or loaded.
    pub async fn initialize(
        storage: &StorageConfig,
        gateway: Arc<dyn ModelGateway>,
    ) -> Result<Self, StartupError> {
        let schema = read_input(&storage.schema_path).await?;
        let parsed = serde_json::from_str(&schema).map_err(|source| StartupError::InvalidSchema {
            path: storage.schema_path.clone(),
            source,
        })?;
        let layout = read_input(&storage.layout_path).await?;
        let store = StateStore::open(
            storage.state_path(),
            &storage.seed_path,
            storage.validate_state,
        )
        .await?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store,
                schema,
                output_schema: OutputSchema::new(OUTPUT_SCHEMA_NAME, parsed),
                layout,
                fragments: FragmentCache::new(&storage.cache_dir),
                gateway,
            }),
        })
    }

    /// Get a reference to the state document.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    /// Get a reference to the page template cache.
    #[must_use]
    pub fn fragments(&self) -> &FragmentCache {
        &self.inner.fragments
    }

    /// Get a reference to the model gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn ModelGateway {
        self.inner.gateway.as_ref()
    }

    /// Schema that constrains replacement state documents.
    #[must_use]
    pub fn output_schema(&self) -> &OutputSchema {
        &self.inner.output_schema
    }

    /// Prompt builder over the loaded schema and layout.
    #[must_use]
    pub fn prompts(&self) -> PromptBuilder<'_> {
        PromptBuilder::new(&self.inner.schema, &self.inner.layout)
    }

    /// Persist anything still only in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.inner.store.flush().await.map(|_| ())
    }
}

async fn read_input(path: &Path) -> Result<String, StartupError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StartupError::Read {
            path: path.to_path_buf(),
            source,
        })
}

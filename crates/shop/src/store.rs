//! The persisted state document.
//!
//! The shop keeps exactly one JSON document (products + cart). It is loaded at
//! startup, seeded from a fixture if the cache file is missing, and replaced
//! wholesale by every mutation. Replacements are parsed before anything is
//! touched, written verbatim through a temporary file and rename, and only then
//! swapped into memory.

use std::io::Write;
use std::path::{Path, PathBuf};

use prompt_shop_core::ShopState;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from loading or replacing the state document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("State does not match the shop model: {0}")]
    ModelMismatch(#[source] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the error came from a bad replacement document rather than local I/O.
    #[must_use]
    pub const fn is_malformed_document(&self) -> bool {
        matches!(self, Self::InvalidJson(_) | Self::ModelMismatch(_))
    }
}

/// In-memory state document backed by a JSON file.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    validate: bool,
    document: RwLock<Value>,
}

impl StateStore {
    /// Load the state document, seeding it from `seed_path` if `path` is absent.
    ///
    /// With `validate`, every replacement must also deserialize into [`ShopState`].
    ///
    /// # Errors
    ///
    /// Returns an error if seeding or reading fails, or the file is not JSON.
    pub async fn open(
        path: impl Into<PathBuf>,
        seed_path: &Path,
        validate: bool,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        Self::seed(&path, seed_path, false).await?;

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        let document: Value = serde_json::from_str(&raw).map_err(StoreError::InvalidJson)?;

        let summary = prompt_shop_core::StateSummary::of(&document);
        tracing::info!(
            path = %path.display(),
            products = summary.products,
            line_items = summary.line_items,
            "State loaded"
        );

        Ok(Self {
            path,
            validate,
            document: RwLock::new(document),
        })
    }

    /// Copy the seed fixture to `path`.
    ///
    /// Without `force` an existing file is left alone. Returns whether a copy
    /// was made.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the copy fails.
    pub async fn seed(path: &Path, seed_path: &Path, force: bool) -> Result<bool, StoreError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        if exists && !force {
            return Ok(false);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        tokio::fs::copy(seed_path, path)
            .await
            .map_err(|e| StoreError::io(seed_path, e))?;

        tracing::info!(
            seed = %seed_path.display(),
            path = %path.display(),
            "State seeded from fixture"
        );
        Ok(true)
    }

    /// Location of the persisted document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current document.
    pub async fn snapshot(&self) -> Value {
        self.document.read().await.clone()
    }

    /// Current document as compact JSON, as embedded in prompts.
    pub async fn to_json(&self) -> String {
        self.document.read().await.to_string()
    }

    /// Replace the document with `raw` and persist it.
    ///
    /// The file receives `raw` verbatim. On any error neither the file nor the
    /// in-memory document changes. Returns the new document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidJson` or `ModelMismatch` for a bad document, `Io` if the
    /// write fails.
    pub async fn replace(&self, raw: &str) -> Result<Value, StoreError> {
        let document: Value = serde_json::from_str(raw).map_err(StoreError::InvalidJson)?;
        if self.validate {
            ShopState::from_value(&document).map_err(StoreError::ModelMismatch)?;
        }

        let mut current = self.document.write().await;
        write_atomic(&self.path, raw)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        current.clone_from(&document);
        Ok(document)
    }

    /// Write the in-memory document to disk unless the file already holds it.
    ///
    /// Returns whether the file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn flush(&self) -> Result<bool, StoreError> {
        let current = self.document.read().await;
        let on_disk = tokio::fs::read_to_string(&self.path)
            .await
            .ok()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
        if on_disk.as_ref() == Some(&*current) {
            return Ok(false);
        }

        write_atomic(&self.path, &current.to_string())
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), "State flushed");
        Ok(true)
    }
}

/// Write `contents` to a uniquely named sibling temp file, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let path = path.to_path_buf();
    let contents = contents.to_owned();
    tokio::task::spawn_blocking(move || {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .map_err(std::io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = r#"{"products": [], "cart": []}"#;

    async fn store_with_seed(dir: &Path, seed: &str, validate: bool) -> StateStore {
        let seed_path = dir.join("seed.json");
        tokio::fs::write(&seed_path, seed).await.expect("write seed");
        StateStore::open(dir.join("cache").join("db.json"), &seed_path, validate)
            .await
            .expect("open store")
    }

    #[tokio::test]
    async fn test_open_seeds_missing_cache_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_seed(dir.path(), EMPTY, false).await;

        let on_disk = tokio::fs::read_to_string(store.path()).await.expect("read");
        assert_eq!(on_disk, EMPTY);
        assert_eq!(store.to_json().await, r#"{"cart":[],"products":[]}"#);
    }

    #[tokio::test]
    async fn test_open_keeps_existing_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = dir.path().join("cache");
        tokio::fs::create_dir_all(&cache).await.expect("mkdir");
        tokio::fs::write(cache.join("db.json"), r#"{"products":[{"id":"x"}],"cart":[]}"#)
            .await
            .expect("write cache");

        let store = store_with_seed(dir.path(), EMPTY, false).await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot["products"][0]["id"], "x");
    }

    #[tokio::test]
    async fn test_replace_writes_raw_text_and_swaps_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_seed(dir.path(), EMPTY, false).await;
        let raw = r#"{"products": [], "cart": [{"product": "P1", "count": 1}]}"#;

        store.replace(raw).await.expect("replace");

        let on_disk = tokio::fs::read_to_string(store.path()).await.expect("read");
        assert_eq!(on_disk, raw);
        let expected: Value = serde_json::from_str(raw).expect("parse");
        assert_eq!(store.snapshot().await, expected);
    }

    #[tokio::test]
    async fn test_invalid_json_leaves_everything_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_seed(dir.path(), EMPTY, false).await;
        let before = store.snapshot().await;

        let err = store.replace("Sure! Here is your JSON:").await.expect_err("invalid");
        assert!(matches!(err, StoreError::InvalidJson(_)));
        assert!(err.is_malformed_document());

        let on_disk = tokio::fs::read_to_string(store.path()).await.expect("read");
        assert_eq!(on_disk, EMPTY);
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_validation_rejects_off_model_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_seed(dir.path(), EMPTY, true).await;

        let err = store
            .replace(r#"{"products": [], "cart": [{"product": "P1", "count": 1}]}"#)
            .await
            .expect_err("P1 is not a UUID");
        assert!(matches!(err, StoreError::ModelMismatch(_)));

        let on_disk = tokio::fs::read_to_string(store.path()).await.expect("read");
        assert_eq!(on_disk, EMPTY);
    }

    #[tokio::test]
    async fn test_flush_skips_unchanged_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_seed(dir.path(), EMPTY, false).await;
        assert!(!store.flush().await.expect("flush"));

        tokio::fs::remove_file(store.path()).await.expect("remove");
        assert!(store.flush().await.expect("flush"));
        let on_disk = tokio::fs::read_to_string(store.path()).await.expect("read");
        assert_eq!(on_disk, r#"{"cart":[],"products":[]}"#);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_file_all_succeed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cart.html");

        let writes = (0..16).map(|i| {
            let path = path.clone();
            tokio::spawn(async move { write_atomic(&path, &format!("<p>{i}</p>")).await })
        });
        for handle in writes.collect::<Vec<_>>() {
            handle.await.expect("join").expect("write");
        }

        let on_disk = tokio::fs::read_to_string(&path).await.expect("read");
        assert!(on_disk.starts_with("<p>") && on_disk.ends_with("</p>"));
        let mut entries = std::fs::read_dir(dir.path()).expect("read dir");
        assert!(entries.all(|e| e.expect("entry").file_name() == "cart.html"));
    }

    #[tokio::test]
    async fn test_seed_force_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seed = dir.path().join("seed.json");
        let target = dir.path().join("db.json");
        tokio::fs::write(&seed, EMPTY).await.expect("write seed");
        tokio::fs::write(&target, "{}").await.expect("write target");

        assert!(!StateStore::seed(&target, &seed, false).await.expect("seed"));
        assert_eq!(tokio::fs::read_to_string(&target).await.expect("read"), "{}");

        assert!(StateStore::seed(&target, &seed, true).await.expect("seed"));
        assert_eq!(tokio::fs::read_to_string(&target).await.expect("read"), EMPTY);
    }
}

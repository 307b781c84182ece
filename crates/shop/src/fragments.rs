//! On-disk cache of generated page templates.
//!
//! Each logical page gets one `<cache_dir>/<page>.html`. The first render of a
//! page generates it; every later render reads it back. Nothing in the server
//! invalidates a fragment; operators delete files (or use `ps-cli views clear`)
//! to force regeneration.

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::prompts::LAYOUT_PAGE;
use crate::store::write_atomic;

const FRAGMENT_EXTENSION: &str = "html";

/// Errors from resolving or managing cached fragments.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("Page name '{0}' is reserved for the layout")]
    Reserved(String),

    #[error("Invalid page name '{0}'")]
    InvalidName(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fragment generation failed: {0}")]
    Generation(#[from] GatewayError),
}

impl FragmentError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Directory of cached page templates.
#[derive(Debug, Clone)]
pub struct FragmentCache {
    dir: PathBuf,
}

impl FragmentCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the fragment for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for the reserved layout name or a name that is not a
    /// plain `[a-z0-9_]` identifier.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, FragmentError> {
        if name == LAYOUT_PAGE {
            return Err(FragmentError::Reserved(name.to_string()));
        }
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(FragmentError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{FRAGMENT_EXTENSION}")))
    }

    /// Return the cached fragment for `name`, generating and storing it first
    /// if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not cacheable, generation fails, or the
    /// cache directory cannot be read or written.
    pub async fn resolve<F, Fut>(&self, name: &str, generate: F) -> Result<String, FragmentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, GatewayError>>,
    {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(template) => {
                tracing::debug!(page = name, "Fragment cache hit");
                return Ok(template);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(FragmentError::io(&path, e)),
        }

        tracing::info!(page = name, "Fragment cache miss, generating");
        let template = generate().await?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FragmentError::io(&self.dir, e))?;
        write_atomic(&path, &template)
            .await
            .map_err(|e| FragmentError::io(&path, e))?;
        Ok(template)
    }

    /// Names of all cached fragments, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory exists but cannot be read.
    pub async fn list(&self) -> Result<Vec<String>, FragmentError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FragmentError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FragmentError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete the named fragments, or every fragment when `names` is empty.
    ///
    /// Names without a cached file are skipped. Returns the names removed.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a failed deletion.
    pub async fn clear(&self, names: &[String]) -> Result<Vec<String>, FragmentError> {
        let targets = if names.is_empty() {
            self.list().await?
        } else {
            names.to_vec()
        };

        let mut removed = Vec::new();
        for name in targets {
            let path = self.path_for(&name)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed.push(name),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(FragmentError::io(&path, e)),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_second_resolve_reads_cached_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FragmentCache::new(dir.path().join("cache"));
        let generated = AtomicUsize::new(0);

        for _ in 0..2 {
            let template = cache
                .resolve("cart", || async {
                    generated.fetch_add(1, Ordering::SeqCst);
                    Ok("<ul>{{#cart}}{{/cart}}</ul>".to_string())
                })
                .await
                .expect("resolve");
            assert_eq!(template, "<ul>{{#cart}}{{/cart}}</ul>");
        }

        assert_eq!(generated.load(Ordering::SeqCst), 1);
        let on_disk = tokio::fs::read_to_string(dir.path().join("cache").join("cart.html"))
            .await
            .expect("read");
        assert_eq!(on_disk, "<ul>{{#cart}}{{/cart}}</ul>");
    }

    #[tokio::test]
    async fn test_layout_page_is_reserved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FragmentCache::new(dir.path());

        let err = cache
            .resolve("page", || async { Ok(String::new()) })
            .await
            .expect_err("reserved");
        assert!(matches!(err, FragmentError::Reserved(_)));
        assert!(!dir.path().join("page.html").exists());
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        let cache = FragmentCache::new("cache");
        assert!(matches!(
            cache.path_for("../db"),
            Err(FragmentError::InvalidName(_))
        ));
        assert!(matches!(cache.path_for(""), Err(FragmentError::InvalidName(_))));
        assert_eq!(
            cache.path_for("admin_products").expect("valid"),
            PathBuf::from("cache/admin_products.html")
        );
    }

    #[tokio::test]
    async fn test_failed_generation_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FragmentCache::new(dir.path());

        let err = cache
            .resolve("products", || async { Err(GatewayError::EmptyCompletion) })
            .await
            .expect_err("generation failed");
        assert!(matches!(err, FragmentError::Generation(_)));
        assert!(cache.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FragmentCache::new(dir.path());
        for name in ["products", "cart", "product"] {
            cache
                .resolve(name, || async { Ok(format!("<p>{name}</p>")) })
                .await
                .expect("resolve");
        }
        tokio::fs::write(dir.path().join("db.json"), "{}").await.expect("write state");

        assert_eq!(cache.list().await.expect("list"), ["cart", "product", "products"]);

        let removed = cache
            .clear(&["cart".to_string(), "admin_products".to_string()])
            .await
            .expect("clear");
        assert_eq!(removed, ["cart"]);

        let removed = cache.clear(&[]).await.expect("clear all");
        assert_eq!(removed, ["product", "products"]);
        assert!(dir.path().join("db.json").exists());
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FragmentCache::new(dir.path().join("absent"));
        assert!(cache.list().await.expect("list").is_empty());
    }
}

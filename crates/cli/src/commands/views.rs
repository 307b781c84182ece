//! Page template cache commands.

use prompt_shop::config::StorageConfig;
use prompt_shop::fragments::FragmentCache;
use prompt_shop::prompts::View;
use tracing::info;

use super::CliError;

/// Print the names of all cached page templates.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be read.
pub async fn list(storage: &StorageConfig) -> Result<(), CliError> {
    let cache = FragmentCache::new(&storage.cache_dir);
    let names = cache.list().await?;
    if names.is_empty() {
        info!(dir = %cache.dir().display(), "No cached page templates");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

/// Delete cached page templates so they are regenerated on next render.
///
/// # Errors
///
/// Returns an error for a name that is not a known page or a failed deletion.
pub async fn clear(storage: &StorageConfig, pages: &[String]) -> Result<(), CliError> {
    if let Some(unknown) = pages.iter().find(|page| View::from_name(page).is_none()) {
        return Err(CliError::UnknownPage(unknown.clone()));
    }

    let cache = FragmentCache::new(&storage.cache_dir);
    let removed = cache.clear(pages).await?;
    info!(
        dir = %cache.dir().display(),
        count = removed.len(),
        pages = ?removed,
        "Cleared cached page templates"
    );
    Ok(())
}

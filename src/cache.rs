//! On-disk page cache inside the project directory, keyed by the SHA-256 of the page URL.
//! A cached page makes regeneration work offline and keeps chapters byte-stable.

use crate::fetch::{Fetch, FetchError};
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cache directory name under `output_dir`.
pub const CACHE_DIR: &str = ".cached";

/// Wraps another fetcher. Hits are served from `dir/<sha256(url)>.html`; misses go to the
/// inner fetcher and successful bodies are stored. Failures are never cached.
pub struct CachingFetcher<F> {
    inner: F,
    dir: PathBuf,
    refresh: bool,
}

impl<F: Fetch> CachingFetcher<F> {
    pub fn new(inner: F, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
            refresh: false,
        }
    }

    /// Skip cache lookups; fetched pages still replace the stored copies.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.dir.join(format!("{}.html", cache_key(url)))
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn store(&self, path: &Path, html: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, html)
    }
}

impl<F: Fetch> Fetch for CachingFetcher<F> {
    fn fetch(&mut self, url: &Url) -> Result<String, FetchError> {
        let path = self.path_for(url);
        if !self.refresh {
            match std::fs::read_to_string(&path) {
                Ok(html) => {
                    debug!(%url, path = %path.display(), "cache hit");
                    return Ok(html);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(%url, path = %path.display(), "unreadable cache entry, refetching: {}", e),
            }
        }
        let html = self.inner.fetch(url)?;
        if let Err(e) = self.store(&path, &html) {
            warn!(%url, path = %path.display(), "could not cache page: {}", e);
        }
        Ok(html)
    }
}

/// Lowercase hex SHA-256 of the URL as written.
pub fn cache_key(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

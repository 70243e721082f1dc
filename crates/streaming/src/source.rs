use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request for {location} failed: {reason}")]
    Transport { location: String, reason: String },
    #[error("{location} returned status {status}")]
    Status { location: String, status: u16 },
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {location}: {reason}")]
    Decode { location: String, reason: String },
}

/// Where static datasets come from.
///
/// Implementations resolve `location` (a relative path such as
/// `data/plss_sections.geojson`) and return the response body. A
/// non-success status must surface as `LoadError::Status`.
///
/// No `Send` bound: the viewer drives fetches on a single-threaded executor.
pub trait DatasetSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<String, LoadError>>;
}

pub fn join_location(base: &str, location: &str) -> String {
    if base.is_empty() {
        return location.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        location.trim_start_matches('/')
    )
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{FileSource, HttpSource};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::future::Future;
    use std::path::PathBuf;

    use super::{DatasetSource, LoadError, join_location};

    /// Reads datasets over HTTP(S) relative to a base URL.
    #[derive(Debug, Clone)]
    pub struct HttpSource {
        base_url: String,
        http: reqwest::Client,
    }

    impl HttpSource {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
                http: reqwest::Client::new(),
            }
        }

        pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
            Self {
                base_url: base_url.into(),
                http,
            }
        }
    }

    impl DatasetSource for HttpSource {
        fn fetch(&self, location: &str) -> impl Future<Output = Result<String, LoadError>> {
            let url = join_location(&self.base_url, location);
            async move {
                let resp = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| LoadError::Transport {
                        location: url.clone(),
                        reason: e.to_string(),
                    })?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(LoadError::Status {
                        location: url,
                        status: status.as_u16(),
                    });
                }
                resp.text().await.map_err(|e| LoadError::Transport {
                    location: url,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Reads datasets from a local directory.
    #[derive(Debug, Clone)]
    pub struct FileSource {
        root: PathBuf,
    }

    impl FileSource {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }
    }

    impl DatasetSource for FileSource {
        fn fetch(&self, location: &str) -> impl Future<Output = Result<String, LoadError>> {
            let path = self.root.join(location.trim_start_matches('/'));
            async move {
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| LoadError::Io {
                        location: path.display().to_string(),
                        source,
                    })
            }
        }
    }
}

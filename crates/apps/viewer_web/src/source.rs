use std::future::Future;

use gloo_net::http::Request;
use streaming::source::{DatasetSource, LoadError, join_location};

/// `fetch()`-backed dataset source, relative to the page's data root.
#[derive(Debug, Clone)]
pub struct BrowserSource {
    base_url: String,
}

impl BrowserSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl DatasetSource for BrowserSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<String, LoadError>> {
        let url = join_location(&self.base_url, location);
        async move {
            let resp = Request::get(&url)
                .send()
                .await
                .map_err(|e| LoadError::Transport {
                    location: url.clone(),
                    reason: e.to_string(),
                })?;
            if !resp.ok() {
                return Err(LoadError::Status {
                    location: url,
                    status: resp.status(),
                });
            }
            resp.text().await.map_err(|e| LoadError::Transport {
                location: url,
                reason: e.to_string(),
            })
        }
    }
}

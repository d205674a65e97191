//! HTTP image loader backed by reqwest.

use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};

use super::{ImageLoader, LoadError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Loads images over HTTP(S).
///
/// A load succeeds when the response has a success status and the body is
/// in a format the `image` crate recognises. `data:` URLs succeed without a
/// request, since the host decodes them inline.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: reqwest::Client,
}

impl HttpImageLoader {
    /// Creates a loader with the default timeout.
    pub fn new() -> Result<Self, LoadError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a loader with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LoadError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wraps an existing client (shared connection pool, custom headers).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ImageLoader for HttpImageLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        let client = self.client.clone();
        let url = url.to_owned();

        async move {
            if is_data_url(&url) {
                return Ok(());
            }

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| LoadError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| LoadError::Network(format!("failed to read response: {}", e)))?;

            check_image_payload(&body)
        }
        .boxed_local()
    }
}

fn is_data_url(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

fn check_image_payload(body: &[u8]) -> Result<(), LoadError> {
    if body.is_empty() {
        return Err(LoadError::Decode("empty body".to_string()));
    }
    image::guess_format(body)
        .map(|_| ())
        .map_err(|e| LoadError::Decode(e.to_string()))
}

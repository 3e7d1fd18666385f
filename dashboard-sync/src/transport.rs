//! HTTP seam between the synchronizer and the dashboard backend.
//!
//! [`Transport`] speaks JSON over `GET`/`POST`. [`Fetcher`] is the narrower view a single feed
//! needs: "give me the latest body". [`EndpointFetcher`] binds one to the other.

use crate::{
    api,
    config::SyncConfig,
    error::{ConfigError, SyncError, TransportError},
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// JSON request/response access to the dashboard backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, TransportError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
}

/// Retrieves the raw response body of one feed.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<Value, TransportError>;
}

/// [`Fetcher`] that issues a `GET` for a fixed path over a shared [`Transport`].
#[derive(Clone)]
pub struct EndpointFetcher {
    transport: Arc<dyn Transport>,
    path: &'static str,
}

impl EndpointFetcher {
    pub fn new(transport: Arc<dyn Transport>, path: &'static str) -> Self {
        Self { transport, path }
    }
}

impl std::fmt::Debug for EndpointFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointFetcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for EndpointFetcher {
    async fn fetch(&self) -> Result<Value, TransportError> {
        self.transport.get_json(self.path).await
    }
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|error| ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: error.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "not a hierarchical url".to_string(),
            }
            .into());
        }

        // Endpoint paths resolve under any path prefix, e.g. `http://host/dash`
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(TransportError::from)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| TransportError::Request(format!("invalid path {path}: {error}")))
    }

    /// Map non-2xx to [`TransportError::Status`] and non-JSON bodies to [`TransportError::Decode`].
    async fn handle_response(response: reqwest::Response) -> Result<Value, TransportError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| api::server_message(&body));
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|error| TransportError::Decode(error.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path)?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url(path)?;
        debug!(%url, "POST");

        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingTransport {
        gets: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
            self.gets.lock().push(path.to_string());
            Ok(json!({"status": "success"}))
        }

        async fn post_json(&self, _: &str, _: &Value) -> Result<Value, TransportError> {
            unreachable!("fetchers never POST")
        }
    }

    #[tokio::test]
    async fn test_endpoint_fetcher_gets_its_path() {
        let transport = Arc::new(RecordingTransport::default());
        let fetcher = EndpointFetcher::new(transport.clone(), api::OPEN_ORDERS);

        let body = fetcher.fetch().await.unwrap();

        assert_eq!(body, json!({"status": "success"}));
        assert_eq!(*transport.gets.lock(), vec!["/api/open_orders".to_string()]);
    }

    #[test]
    fn test_http_transport_joins_paths_onto_base() {
        struct TestCase {
            base_url: &'static str,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: bare origin
                base_url: "http://127.0.0.1:5000",
                expected: "http://127.0.0.1:5000/api/settings/risk",
            },
            TestCase {
                // TC1: path prefix without trailing slash
                base_url: "http://10.0.0.2/dash",
                expected: "http://10.0.0.2/dash/api/settings/risk",
            },
            TestCase {
                // TC2: path prefix with trailing slash
                base_url: "http://10.0.0.2/dash/",
                expected: "http://10.0.0.2/dash/api/settings/risk",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let transport = HttpTransport::new(&SyncConfig::new(test.base_url)).unwrap();

            let url = transport.url(api::SETTINGS_RISK).unwrap();

            assert_eq!(url.as_str(), test.expected, "TC{} failed", index);
            assert!(url.as_str().starts_with(transport.base_url().as_str()), "TC{} failed", index);
        }
    }

    #[test]
    fn test_http_transport_rejects_invalid_base_url() {
        struct TestCase {
            input: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: relative
                input: "/api",
            },
            TestCase {
                // TC1: not a base
                input: "mailto:ops@example.com",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = HttpTransport::new(&SyncConfig::new(test.input));
            assert!(
                matches!(
                    actual,
                    Err(SyncError::Config(ConfigError::InvalidBaseUrl { .. }))
                ),
                "TC{} failed",
                index
            );
        }
    }
}

use crate::BeaconError;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Upper bound for a single request against the beacon node.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to the base URL of a beacon node API
#[derive(Debug, Clone)]
pub struct BeaconHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl BeaconHttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BeaconError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BeaconError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BeaconError::Client)?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Issue a GET to `path` and decode the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BeaconError> {
        let url = self.url(path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BeaconError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BeaconError::Status { url, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| BeaconError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| BeaconError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Answer {
        value: u64,
    }

    #[test]
    fn test_url_join() {
        let client = BeaconHttpClient::new("http://localhost:9596/").unwrap();
        assert_eq!(
            client.url("/v1/node/version"),
            "http://localhost:9596/v1/node/version"
        );

        let client = BeaconHttpClient::new("http://localhost:9596").unwrap();
        assert_eq!(
            client.url("lodestar/head"),
            "http://localhost:9596/lodestar/head"
        );
    }

    #[tokio::test]
    async fn test_get_decodes_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/answer")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value": 42}"#)
            .create_async()
            .await;

        let client = BeaconHttpClient::new(server.url()).unwrap();
        let answer: Answer = client.get("answer").await.unwrap();
        assert_eq!(answer.value, 42);
    }

    #[tokio::test]
    async fn test_get_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/answer")
            .with_status(503)
            .create_async()
            .await;

        let client = BeaconHttpClient::new(server.url()).unwrap();
        let err = client.get::<Answer>("answer").await.unwrap_err();
        match err {
            BeaconError::Status { status, .. } => assert_eq!(status.as_u16(), 503),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_decode_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/answer")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = BeaconHttpClient::new(server.url()).unwrap();
        let err = client.get::<Answer>("answer").await.unwrap_err();
        assert!(matches!(err, BeaconError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_get_times_out_on_silent_node() {
        // Accepts connections but never writes a response.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut connections = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                connections.push(socket);
            }
        });

        let client =
            BeaconHttpClient::with_timeout(format!("http://{}", addr), Duration::from_millis(200))
                .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), client.get::<Answer>("answer"))
            .await
            .expect("request timeout should fire before the outer timeout");

        match result {
            Err(BeaconError::Transport { source, .. }) => assert!(source.is_timeout()),
            other => panic!("unexpected result: {:?}", other.map(|a| a.value)),
        }

        silent.abort();
    }

    #[tokio::test]
    async fn test_get_connection_refused() {
        // Nothing listens on port 1.
        let client = BeaconHttpClient::new("http://127.0.0.1:1").unwrap();
        let err = client.get::<Answer>("answer").await.unwrap_err();
        assert!(matches!(err, BeaconError::Transport { .. }));
    }
}

/*
[INPUT]:  HTTP configuration (base URL, timeouts) and bearer tokens
[OUTPUT]: Typed JSON responses from the services backend
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing status handling
*/

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::http::{Result, SessionError};

/// Production base URL for the services backend
const API_BASE_URL: &str = "https://api.satgate.io";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the services backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom timeouts
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, API_BASE_URL)
    }

    /// Create a client against an explicit base URL (tests, staging).
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(SessionError::from_transport)?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Build a request builder for an endpoint path
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build a request builder carrying a bearer token
    pub(crate) fn request_with_bearer(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
    ) -> Result<RequestBuilder> {
        Ok(self.request(method, endpoint)?.bearer_auth(token))
    }

    /// Send a request and decode a JSON response body.
    ///
    /// Non-success statuses are mapped through the session error taxonomy,
    /// using the backend's `message` field when the error body carries one.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(SessionError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SessionError::InvalidResponse(e.to_string()))
    }

    /// Send a request where the response body is irrelevant to the caller
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await.map_err(SessionError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        Ok(())
    }
}

async fn error_from_response(status: StatusCode, response: reqwest::Response) -> SessionError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    debug!(status = status.as_u16(), "request failed");
    SessionError::from_status(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_json_parses_error_body_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/thing"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "bad thing"})),
            )
            .mount(&server)
            .await;

        let client =
            ApiClient::with_config_and_base_url(ClientConfig::default(), &server.uri()).unwrap();
        let builder = client.request(Method::GET, "/v1/thing").unwrap();
        let err = client
            .send_json::<serde_json::Value>(builder)
            .await
            .unwrap_err();

        match err {
            SessionError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad thing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = ClientConfig {
            timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(200),
        };
        let client = ApiClient::with_config_and_base_url(config, &server.uri()).unwrap();
        let builder = client.request(Method::GET, "/v1/slow").unwrap();
        let err = client
            .send_json::<serde_json::Value>(builder)
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::Timeout);
    }
}

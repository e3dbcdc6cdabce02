//! HTTP implementation of `SessionApi`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sessionbridge_types::{
    ErrorCode, ExchangeResponse, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse,
    StatusResponse,
};

use crate::error::SdkError;
use crate::identity::SessionApi;

/// Default request timeout. A timeout is treated like any other network failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Configuration for the session endpoints client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the session routes (e.g., "https://auth.example.com/api/session")
    pub base_url: String,

    /// Per-request timeout (default: 8 seconds)
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `SessionApi` over HTTP with a cookie store, so the shared session cookie
/// set by `login` is sent back on `exchange`, `status` and `logout`.
pub struct HttpSessionApi {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpSessionApi {
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SdkError::Config("base_url is required".into()));
        }
        if config.timeout.is_zero() {
            return Err(SdkError::Config("timeout must be positive".into()));
        }

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn exchange(&self) -> Result<ExchangeResponse, SdkError> {
        send(self.http_client.post(self.url("exchange"))).await
    }

    async fn login(&self, id_token: &str) -> Result<LoginResponse, SdkError> {
        let body = LoginRequest {
            id_token: Some(id_token.to_string()),
        };
        send(self.http_client.post(self.url("login")).json(&body)).await
    }

    async fn status(&self) -> Result<StatusResponse, SdkError> {
        send(self.http_client.get(self.url("status"))).await
    }

    async fn logout(&self, everywhere: bool) -> Result<LogoutResponse, SdkError> {
        send(
            self.http_client
                .post(self.url("logout"))
                .json(&LogoutRequest { everywhere }),
        )
        .await
    }
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, SdkError> {
    let response = request.send().await.map_err(map_transport_error)?;

    if !response.status().is_success() {
        let status = response.status();

        // Parse the API's {code, message} body when there is one
        #[derive(serde::Deserialize)]
        struct ApiErrorBody {
            code: ErrorCode,
            #[serde(default)]
            message: Option<String>,
        }

        return Err(match response.json::<ApiErrorBody>().await {
            Ok(body) => SdkError::Api {
                code: body.code,
                message: body.message.unwrap_or_else(|| status.to_string()),
            },
            Err(_) => SdkError::Api {
                code: ErrorCode::InternalError,
                message: format!("Unexpected status: {status}"),
            },
        });
    }

    response.json().await.map_err(map_transport_error)
}

fn map_transport_error(e: reqwest::Error) -> SdkError {
    if e.is_timeout() {
        SdkError::Timeout
    } else {
        SdkError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            HttpSessionApi::new(ClientConfig::new("")),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig {
            timeout: Duration::ZERO,
            ..ClientConfig::new("https://auth.example.com/api/session")
        };
        assert!(matches!(HttpSessionApi::new(config), Err(SdkError::Config(_))));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let api = HttpSessionApi::new(ClientConfig::new("https://auth.example.com/api/session/"))
            .unwrap();
        assert_eq!(api.url("status"), "https://auth.example.com/api/session/status");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error_not_a_panic() {
        let config = ClientConfig {
            timeout: Duration::from_secs(1),
            ..ClientConfig::new("http://127.0.0.1:9/api/session")
        };
        let api = HttpSessionApi::new(config).unwrap();

        let err = api.exchange().await.unwrap_err();
        assert!(matches!(err, SdkError::Http(_) | SdkError::Timeout));
    }
}

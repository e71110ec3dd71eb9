use crate::core::FetchError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("tripdash/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Checks the status and parses the body of a provider response.
///
/// `what` names the request in error messages, e.g. "EUR rates".
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, FetchError> {
    let status = response.status();
    debug!(%status, "Received response for {}", what);
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| FetchError::Network(format!("Failed to read body for {what}: {e}")))?;

    if text.trim().is_empty() {
        return Err(FetchError::parse(format!(
            "Received empty response for {what}"
        )));
    }

    serde_json::from_str(&text).map_err(|e| {
        error!(error = ?e, response = %text, "Failed to parse response for {}", what);
        FetchError::parse(format!("Failed to parse JSON response for {what}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: u32,
    }

    // The server is returned so it outlives the body read.
    async fn respond_with(template: ResponseTemplate) -> (MockServer, reqwest::Response) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        let response = http_client()
            .unwrap()
            .get(mock_server.uri())
            .send()
            .await
            .unwrap();
        (mock_server, response)
    }

    #[tokio::test]
    async fn test_read_json_success() {
        let (_server, response) =
            respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 7}"#)).await;
        let payload: Payload = read_json(response, "test").await.unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn test_read_json_http_error() {
        let (_server, response) = respond_with(ResponseTemplate::new(503)).await;
        let err = read_json::<Payload>(response, "test").await.unwrap_err();
        assert_eq!(err, FetchError::Http { status: 503 });
    }

    #[tokio::test]
    async fn test_read_json_empty_body() {
        let (_server, response) = respond_with(ResponseTemplate::new(200)).await;
        let err = read_json::<Payload>(response, "test").await.unwrap_err();
        assert_eq!(err, FetchError::parse("Received empty response for test"));
    }

    #[tokio::test]
    async fn test_read_json_malformed() {
        let (_server, response) =
            respond_with(ResponseTemplate::new(200).set_body_string(r#"{"other": 1}"#)).await;
        let err = read_json::<Payload>(response, "test").await.unwrap_err();
        let FetchError::Parse(msg) = &err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert!(msg.contains("Failed to parse JSON response for test"));
    }
}

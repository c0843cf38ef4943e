//! HTTP utilities for Azure Resource Manager REST calls

use super::error::ApiError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header ARM echoes back so a request can be traced on the service side
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for ARM calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cosmos-collections/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to an ARM endpoint
    ///
    /// Non-2xx responses become an [`ApiError`] inside the returned error.
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(request_id = %request_id, "GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                request_id = %request_id,
                "API error: {} - {}",
                status,
                sanitize_for_log(&body)
            );
            return Err(ApiError::from_response(status.as_u16(), &body).into());
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format an Azure API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_azure_error(error: &anyhow::Error) -> String {
    if let Some(api) = error.chain().find_map(|c| c.downcast_ref::<ApiError>()) {
        return match api.status {
            401 => "Authentication failed. Check your Azure credentials.".to_string(),
            403 => "Permission denied. Check your Azure role assignments.".to_string(),
            404 => "Resource not found.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 => "Invalid request. Check your parameters.".to_string(),
            409 => "Resource conflict. The resource may be in use.".to_string(),
            500..=599 => "Azure service temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        };
    }

    let error_str = format!("{:#}", error);

    // Truncate long error messages and remove potential sensitive data
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let logged = sanitize_for_log(&body);
        assert!(logged.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(logged.ends_with("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc"), "abc");
    }

    #[test]
    fn test_format_api_errors_by_status() {
        let err: anyhow::Error = ApiError::from_response(403, "{}").into();
        assert!(format_azure_error(&err).starts_with("Permission denied"));

        let err: anyhow::Error = ApiError::from_response(503, "{}").into();
        assert!(format_azure_error(&err).contains("temporarily unavailable"));
    }

    #[test]
    fn test_format_plain_errors_are_truncated() {
        let err = anyhow::anyhow!("{}", "y".repeat(300));
        let formatted = format_azure_error(&err);
        assert!(formatted.ends_with("..."));
        assert_eq!(formatted.len(), 123);
    }
}

//! Azure Resource Manager error types
//!
//! ARM reports failures with an envelope of the form
//! `{"error": {"code": "...", "message": "..."}}`. The HTTP layer parses that
//! envelope into [`ApiError`] so callers can classify failures by code
//! instead of matching on message text.

use serde::Deserialize;
use thiserror::Error;

/// Error codes ARM uses when a resource does not exist
pub const NOT_FOUND_CODES: &[&str] = &["ResourceNotFound", "NotFound"];

/// A failed ARM REST call
#[derive(Debug, Clone, Error)]
#[error("API request failed: {status} ({}): {message}", .code.as_deref().unwrap_or("-"))]
pub struct ApiError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    /// Build an error from a non-2xx response body.
    ///
    /// Bodies that are not an ARM error envelope keep the status and get a
    /// generic message.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: Option<Detail>,
        }

        #[derive(Deserialize)]
        struct Detail {
            code: Option<String>,
            message: Option<String>,
        }

        let detail = serde_json::from_str::<Envelope>(body)
            .ok()
            .and_then(|e| e.error);

        match detail {
            Some(detail) => Self {
                status,
                code: detail.code,
                message: detail.message.unwrap_or_default(),
            },
            None => Self {
                status,
                code: None,
                message: "no error details returned".to_string(),
            },
        }
    }

    /// Whether the ARM error code is one of `codes`
    pub fn has_code(&self, codes: &[&str]) -> bool {
        self.code
            .as_deref()
            .map(|c| codes.contains(&c))
            .unwrap_or(false)
    }
}

/// Failure to obtain credentials for a session
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no Azure credentials configured; set AZURE_ACCESS_TOKEN or AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET")]
    MissingCredentials,

    #[error("token request rejected by {authority}: {reason}")]
    TokenRejected { authority: String, reason: String },
}

/// Build a predicate that matches errors carrying one of `codes`.
///
/// Errors that are not ARM API errors never match.
pub fn is_not_found_error(codes: &'static [&'static str]) -> impl Fn(&anyhow::Error) -> bool {
    move |err: &anyhow::Error| {
        err.chain()
            .filter_map(|cause| cause.downcast_ref::<ApiError>())
            .any(|api| api.has_code(codes))
    }
}

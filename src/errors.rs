//! Error taxonomy for the REST boundary
//!
//! The backend is inconsistent about failure bodies: sometimes a
//! field-to-message map under `errors`, sometimes a single `message`
//! string, sometimes nothing parseable at all. Everything is normalized
//! here so call sites match on one discriminated type instead of sniffing
//! body shapes.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Field-level validation failures, rendered inline next to inputs
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(HashMap<String, String>),
    /// A single server-level message, rendered as a banner
    #[error("{0}")]
    Server(String),
    /// Transport failure before any response body was available
    #[error("network error: {0}")]
    Network(String),
}

impl ApiError {
    /// Normalize an error-status response body into the taxonomy.
    pub fn from_error_body(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(fields) = value.get("errors").and_then(|v| v.as_object()) {
                let fields = fields
                    .iter()
                    .map(|(k, v)| {
                        let message = v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string());
                        (k.clone(), message)
                    })
                    .collect();
                return ApiError::Validation(fields);
            }
            if let Some(message) = value.get("message").and_then(|v| v.as_str()) {
                return ApiError::Server(message.to_owned());
            }
        }
        ApiError::Server(format!("HTTP {status}"))
    }

    /// Field messages for inline rendering, if this is a validation error.
    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            ApiError::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Network(format!("invalid endpoint: {err}"))
    }
}

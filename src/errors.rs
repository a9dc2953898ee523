use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body returned to HTTP clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pricing or export parameter failed to resolve to a concrete value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Template {channel}/{template_type} not found")]
    TemplateNotFound {
        channel: String,
        template_type: String,
    },

    #[error("{0}")]
    TemplateInvalid(String),

    #[error("Template {channel}/{template_type} could not be parsed: {detail}")]
    TemplateParseError {
        channel: String,
        template_type: String,
        detail: String,
    },

    #[error("Template {channel}/{template_type} references unknown field '{field}'")]
    UnknownTemplateField {
        channel: String,
        template_type: String,
        field: String,
    },

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::TemplateNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidInput(_)
            | Self::TemplateInvalid(_)
            | Self::TemplateParseError { .. }
            | Self::UnknownTemplateField { .. } => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_)
            | Self::Configuration(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for HTTP responses. Internal errors return generic
    /// messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            ServiceError::NotFound("order 7".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("product_ids is empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::TemplateNotFound {
                channel: "smartstore".into(),
                template_type: "custom".into(),
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn template_not_found_names_channel_and_type() {
        let err = ServiceError::TemplateNotFound {
            channel: "smartstore".into(),
            template_type: "custom".into(),
        };
        assert_eq!(err.to_string(), "Template smartstore/custom not found");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ServiceError::InternalError("csv writer poisoned".into());
        assert_eq!(err.response_message(), "Internal server error");
    }
}

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::{
    auth::{jwt::TokenError, password::PasswordError},
    response::ApiResponse,
    users::repo::RepoError,
};

/// Request-level failure, rendered as the standard envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        detail: Option<String>,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Unauthorized {
        message: String,
        detail: Option<String>,
    },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: RepoError,
    },
    #[error("{message}")]
    Hashing {
        message: String,
        #[source]
        source: PasswordError,
    },
    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            detail: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            message: message.into(),
            detail: None,
        }
    }

    pub fn store(message: impl Into<String>, source: RepoError) -> Self {
        AppError::Store {
            message: message.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store { .. } | AppError::Hashing { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            AppError::Validation { detail, .. }
            | AppError::Unauthorized { detail, .. }
            | AppError::Internal { detail, .. } => detail.clone(),
            AppError::Store { source, .. } => Some(source.to_string()),
            AppError::Hashing { source, .. } => Some(source.to_string()),
            AppError::Conflict(_) | AppError::Forbidden(_) | AppError::NotFound(_) => None,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            message: "invalid request body".into(),
            detail: Some(rejection.body_text()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        let detail = Some(e.to_string());
        match e {
            TokenError::Signing(_) | TokenError::LifetimeOutOfRange => AppError::Internal {
                message: "failed to issue token".into(),
                detail,
            },
            _ => AppError::Unauthorized {
                message: "invalid or expired token".into(),
                detail,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!(error = %self, detail = ?detail, "request failed");
        }
        let body = ApiResponse::failure(self.to_string(), detail);
        (status, Json(body)).into_response()
    }
}

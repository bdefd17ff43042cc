use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::dto::LoginResponse, error::AppError, users::repo_types::PublicUser};

/// Envelope wrapped around every API body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    UserEnvelope = ApiResponse<PublicUser>,
    UserListEnvelope = ApiResponse<Vec<PublicUser>>,
    LoginEnvelope = ApiResponse<LoginResponse>,
    MessageEnvelope = ApiResponse<String>
)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::OK, Json(Self::success(message, Some(data))))
    }

    pub fn created(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(Self::success(message, Some(data))))
    }

    fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn ok_empty(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::OK, Json(Self::success(message, None)))
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

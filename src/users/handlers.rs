use axum::{
    extract::{Path, State},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::middleware::{require_admin, require_auth},
    error::AppError,
    response::{ApiResponse, ApiResult},
    state::AppState,
    users::{repo::RepoError, repo_types::PublicUser},
};

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, require_auth))
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|e| AppError::Validation {
        message: "invalid user id".into(),
        detail: Some(e.to_string()),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = crate::response::UserListEnvelope),
        (
            status = 401,
            description = "Missing or invalid token",
            body = crate::response::MessageEnvelope
        ),
        (status = 403, description = "Not an admin", body = crate::response::MessageEnvelope),
    )
)]
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<PublicUser>> {
    let users = state.users.list_all().await.map_err(|e| {
        error!(error = %e, "list users failed");
        AppError::store("failed to list users", e)
    })?;
    let items: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();
    Ok(ApiResponse::ok("users loaded", items))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = crate::response::UserEnvelope),
        (status = 400, description = "Non-numeric id", body = crate::response::MessageEnvelope),
        (status = 403, description = "Not an admin", body = crate::response::MessageEnvelope),
        (status = 404, description = "No such user", body = crate::response::MessageEnvelope),
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<PublicUser> {
    let id = parse_id(&raw)?;
    let user = state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| AppError::store("failed to load user", e))?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;
    Ok(ApiResponse::ok("user loaded", PublicUser::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = crate::response::MessageEnvelope),
        (status = 400, description = "Non-numeric id", body = crate::response::MessageEnvelope),
        (status = 403, description = "Not an admin", body = crate::response::MessageEnvelope),
        (status = 404, description = "No such user", body = crate::response::MessageEnvelope),
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&raw)?;
    let exists = state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| AppError::store("failed to load user", e))?
        .is_some();
    if !exists {
        return Err(AppError::NotFound("user not found".into()));
    }

    state.users.delete_by_id(id).await.map_err(|e| match e {
        // removed by someone else between the check and the delete
        RepoError::NotFound => AppError::NotFound("user not found".into()),
        other => {
            error!(error = %other, user_id = id, "delete user failed");
            AppError::store("failed to delete user", other)
        }
    })?;

    info!(user_id = id, "user deleted");
    Ok(ApiResponse::ok_empty("user deleted"))
}

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::AuthSubject,
        dto::{LoginRequest, LoginResponse, RegisterRequest},
        middleware::require_auth,
        password::{hash_password, verify_password, PasswordError},
    },
    error::AppError,
    response::{ApiResponse, ApiResult},
    state::AppState,
    users::{
        repo::RepoError,
        repo_types::{NewUser, PublicUser, Role},
    },
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn profile_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/profile", get(profile))
        .route_layer(from_fn_with_state(state, require_auth))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = crate::response::UserEnvelope),
        (status = 400, description = "Invalid input", body = crate::response::MessageEnvelope),
        (
            status = 409,
            description = "Email or username taken",
            body = crate::response::MessageEnvelope
        ),
    )
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<PublicUser> {
    let Json(mut payload) = payload?;
    payload.normalize();
    if let Err(e) = payload.validate() {
        warn!(error = %e, "registration rejected");
        return Err(e);
    }

    let existing = state
        .users
        .find_by_email_or_username(&payload.email, &payload.username)
        .await
        .map_err(|e| AppError::store("failed to look up existing users", e))?;
    if let Some(found) = existing {
        let message = if found.email == payload.email {
            "email already registered"
        } else {
            "username already taken"
        };
        warn!(email = %payload.email, username = %payload.username, "{message}");
        return Err(AppError::Conflict(message.into()));
    }

    let hash = hash_password(&payload.password).map_err(|e| AppError::Hashing {
        message: "failed to hash password".into(),
        source: e,
    })?;

    let new_user = NewUser::new(payload.username, payload.email, hash, Role::User);
    let (username, email) = (new_user.username.clone(), new_user.email.clone());
    let id = match state.users.insert(new_user).await {
        Ok(id) => id,
        Err(RepoError::Conflict) => {
            warn!(email = %email, "concurrent registration lost the race");
            return Err(AppError::Conflict("user already exists".into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(AppError::store("failed to create user", e));
        }
    };

    info!(user_id = id, email = %email, "user registered");
    Ok(ApiResponse::created(
        "user registered",
        PublicUser {
            id,
            username,
            email,
            role: Role::User,
        },
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = crate::response::LoginEnvelope),
        (status = 400, description = "Invalid input", body = crate::response::MessageEnvelope),
        (
            status = 401,
            description = "Invalid email or password",
            body = crate::response::MessageEnvelope
        ),
    )
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(mut payload) = payload?;
    payload.normalize();
    payload.validate()?;

    let user = match state.users.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AppError::store("failed to look up user", e));
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }
        Err(e) => {
            return Err(AppError::Hashing {
                message: "failed to verify password".into(),
                source: e,
            });
        }
    }

    let token = state.jwt.issue(user.id, &user.username, user.role)?;

    info!(user_id = user.id, "user logged in");
    Ok(ApiResponse::ok(
        "login successful",
        LoginResponse {
            token,
            token_type: "Bearer".into(),
            expires_in: state.jwt.ttl().as_secs(),
            user: PublicUser::from(user),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = crate::response::UserEnvelope),
        (
            status = 401,
            description = "Missing or invalid token",
            body = crate::response::MessageEnvelope
        ),
        (
            status = 404,
            description = "User no longer exists",
            body = crate::response::MessageEnvelope
        ),
    )
)]
#[instrument(skip(state, subject), fields(user_id = subject.user_id))]
pub async fn profile(State(state): State<AppState>, subject: AuthSubject) -> ApiResult<PublicUser> {
    let user = state
        .users
        .find_by_id(subject.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "profile lookup failed");
            AppError::store("failed to load profile", e)
        })?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    Ok(ApiResponse::ok("profile loaded", PublicUser::from(user)))
}

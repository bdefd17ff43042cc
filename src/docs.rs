use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    app,
    auth::{
        self,
        dto::{LoginRequest, LoginResponse, RegisterRequest},
    },
    response::{LoginEnvelope, MessageEnvelope, UserEnvelope, UserListEnvelope},
    users::{
        self,
        repo_types::{PublicUser, Role},
    },
};

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/swagger";

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::profile,
        users::handlers::list_users,
        users::handlers::get_user,
        users::handlers::delete_user,
        app::health,
        app::version,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        PublicUser,
        Role,
        UserEnvelope,
        UserListEnvelope,
        LoginEnvelope,
        MessageEnvelope,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and the caller's profile"),
        (name = "users", description = "Admin-only user management"),
        (name = "meta", description = "Service health and version"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

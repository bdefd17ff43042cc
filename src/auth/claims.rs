use serde::{Deserialize, Serialize};

use crate::users::repo_types::Role;

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub jti: String, // unique per issued token
    pub iat: i64,    // issued at (unix timestamp)
    pub exp: i64,    // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

/// Identity attached to a request once its bearer token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthSubject {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.user_id,
            username: c.username,
            role: c.role,
        }
    }
}

use std::sync::Arc;

use crate::{
    auth::jwt::JwtKeys,
    config::AppConfig,
    db,
    users::repo::{PgUserRepository, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await;

        let users = Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>;
        Ok(Self::from_parts(users, Arc::new(config)))
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        let jwt = JwtKeys::from_config(&config.jwt);
        Self { users, config, jwt }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Arc::new(crate::users::memory::InMemoryUserRepository::new()))
    }

    #[cfg(test)]
    pub fn fake_with(users: Arc<dyn UserRepository>) -> Self {
        let lookup = |key: &str| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            "JWT_ISSUER" => Some("test-issuer".to_string()),
            "JWT_AUDIENCE" => Some("test-aud".to_string()),
            "JWT_TTL_MINUTES" => Some("5".to_string()),
            "APP_ENV" => Some("test".to_string()),
            _ => None,
        };
        let config = AppConfig::from_lookup(lookup).expect("test config is valid");
        Self::from_parts(users, Arc::new(config))
    }
}

use crate::auth::{
    jwt::TokenKeys, password::PasswordService, repo::PgUserStore, services::AuthService,
};
use crate::config::AppConfig;
use crate::contact::repo::{ContactStore, PgContactStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub contacts: Arc<dyn ContactStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = AppConfig::from_env()?;
        let db = crate::db::connect(&config).await?;
        let state = Self::from_parts(db.clone(), config)?;
        Ok((state, db))
    }

    pub fn from_parts(db: PgPool, config: AppConfig) -> anyhow::Result<Self> {
        let auth = AuthService::new(
            Arc::new(PgUserStore::new(db.clone())),
            PasswordService::new(&config.password)?,
            TokenKeys::new(&config.jwt),
            config.store_timeout,
        );
        Ok(Self {
            config: Arc::new(config),
            auth,
            contacts: Arc::new(PgContactStore::new(db)),
        })
    }

    /// State over in-memory stores; needs no database.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::auth::repo::memory::MemoryUserStore;
        use crate::contact::repo::memory::MemoryContactStore;

        let config = AppConfig::test();
        let auth = AuthService::new(
            Arc::new(MemoryUserStore::default()),
            PasswordService::new(&config.password).expect("test params are valid"),
            TokenKeys::new(&config.jwt),
            config.store_timeout,
        );
        Self {
            config: Arc::new(config),
            auth,
            contacts: Arc::new(MemoryContactStore::default()),
        }
    }
}

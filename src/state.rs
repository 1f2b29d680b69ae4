use std::sync::Arc;

use crate::auth::{jwt::JwtKeys, password::PasswordHasher};
use crate::config::{AppConfig, StoreKind};
use crate::db;
use crate::storage::{MemoryStore, PgStore, Store};

/// Shared per-request context. Built once at startup; everything inside is
/// immutable or internally synchronized.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = match config.store {
            StoreKind::Postgres => {
                let pool = db::connect(&config).await?;
                db::migrate(&pool).await?;
                Arc::new(PgStore::new(pool))
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory store; data is lost on exit");
                Arc::new(MemoryStore::new())
            }
        };
        Self::from_parts(store, Arc::new(config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        Ok(Self {
            jwt: JwtKeys::new(&config.jwt),
            hasher: PasswordHasher::new(&config.password)?,
            store,
            config,
        })
    }

    pub async fn shutdown(&self) {
        self.store.close().await;
        tracing::info!("store closed");
    }

    /// Memory-backed state with cheap hashing, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{JwtConfig, PasswordConfig};

        let config = Arc::new(AppConfig {
            store: StoreKind::Memory,
            database_url: String::new(),
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec!["http://localhost:5174".into()],
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl: std::time::Duration::from_secs(7 * 24 * 60 * 60),
            },
            password: PasswordConfig {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
        });
        Self::from_parts(Arc::new(MemoryStore::new()), config).expect("fake state")
    }
}

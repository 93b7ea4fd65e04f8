use chrono::Duration;

use crate::config::AppConfig;
use crate::database::connection::DbConnection;
use crate::server::throttle::LoginThrottle;

pub struct AppState {
    pub config: AppConfig,
    pub db_connection: DbConnection,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    pub async fn try_init(config: &AppConfig) -> anyhow::Result<Self> {
        let db_connection = DbConnection::connect(&config.database).await?;
        Ok(Self::with_connection(config, db_connection))
    }

    pub fn with_connection(config: &AppConfig, db_connection: DbConnection) -> Self {
        Self {
            config: config.clone(),
            db_connection,
            login_throttle: LoginThrottle::new(&config.throttle),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.config.session.ttl_hours.max(1))
    }
}

#[cfg(test)]
impl AppState {
    /// State whose pool never connects unless a handler reaches the database.
    pub fn offline() -> std::sync::Arc<Self> {
        use crate::config::{ServerConfig, SessionConfig, ThrottleConfig};
        use crate::database::connection::DbConfig;

        let config = AppConfig {
            server: ServerConfig {
                address: "127.0.0.1:0".to_string(),
                public_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../../public").to_string(),
            },
            database: DbConfig::development("wall_db", "wall_guest", "wallpass"),
            session: SessionConfig::default(),
            throttle: ThrottleConfig {
                login_attempts_per_minute: 1,
            },
        };
        let db = DbConnection::connect_lazy(&config.database);
        std::sync::Arc::new(Self::with_connection(&config, db))
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbConfig {
    username: String,
    password: String,
    dbname: String,
    host: Option<String>,
    port: Option<u16>,
    max_connections: Option<u32>,
    /// Seconds to wait for a free pooled connection.
    acquire_timeout: Option<u64>,
}

impl DbConfig {
    const HOST_FALLBACK: &'static str = "localhost";
    const PORT_FALLBACK: u16 = 5432;
    const MAX_CONN_FALLBACK: u32 = 5;
    const ACQUIRE_TIMEOUT_FALLBACK: u64 = 30;

    pub fn development(dbname: &str, username: &str, password: &str) -> Self {
        Self {
            dbname: dbname.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            host: None,
            port: None,
            max_connections: None,
            acquire_timeout: None,
        }
    }

    /// Credentials go through the options builder, so they need no url escaping.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(self.host.as_deref().unwrap_or(Self::HOST_FALLBACK))
            .port(self.port.unwrap_or(Self::PORT_FALLBACK))
            .username(&self.username)
            .password(&self.password)
            .database(&self.dbname)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(Self::MAX_CONN_FALLBACK)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout.unwrap_or(Self::ACQUIRE_TIMEOUT_FALLBACK))
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections())
            .acquire_timeout(self.acquire_timeout())
    }
}

pub struct DbConnection {
    pool: PgPool,
}

impl DbConnection {
    pub async fn connect(config: &DbConfig) -> Result<Self, SqlxError> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await?;
        info!(
            "connected to database {} with up to {} connections",
            config.dbname,
            config.max_connections()
        );
        Ok(Self { pool })
    }

    /// Pool that opens connections on first use.
    pub fn connect_lazy(config: &DbConfig) -> Self {
        let pool = config
            .pool_options()
            .connect_lazy_with(config.connect_options());
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_config_targets_localhost() {
        let config = DbConfig::development("wall_db", "wall_guest", "wallpass");
        let options = config.connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "wall_guest");
        assert_eq!(options.get_database(), Some("wall_db"));
        assert_eq!(config.max_connections(), 5);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
    }
}

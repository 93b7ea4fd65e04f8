use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::database::connection::DbConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    /// Static files (stylesheets, images) served for any unrouted path.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

fn default_public_dir() -> String {
    "public".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    /// Send the cookie over https only.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            ttl_hours: 24 * 7,
            secure: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub login_attempts_per_minute: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            login_attempts_per_minute: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl AppConfig {
    pub fn from_yaml_file<P: Into<PathBuf>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.into();
        let content = read_to_string(&path).with_context(|| format!("path: {path:?}"))?;
        Self::from_yaml_str(&content).with_context(|| format!("path: {path:?}"))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, anyhow::Error> {
        Ok(serde_yaml::from_str(content)?)
    }
}

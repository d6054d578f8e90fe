use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Deserialize)]
pub struct Server {
    pub listen: String,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct Push {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub postgres: Postgres,
    pub auth: Auth,
    pub push: Push,
}

impl Settings {
    /// Reads `path`, then lets `LETSGO__SECTION__KEY` variables override it.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.listen", "0.0.0.0:5000")?
            .set_default("postgres.max_connections", 5)?
            .set_default("push.url", DEFAULT_EXPO_PUSH_URL)?
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("LETSGO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

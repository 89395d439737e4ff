use std::env::{self, VarError};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVariable(&'static str),

    #[error("PORT is not a valid port number")]
    InvalidPort,
}

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cookies_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: match env::var("PORT") {
                Ok(port) => port.parse().map_err(|_| ConfigError::InvalidPort)?,
                Err(VarError::NotPresent) => 6060,
                Err(_) => return Err(ConfigError::InvalidPort),
            },
            cookies_secret: required("COOKIES_SECRET")?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVariable(name))
}

pub mod auth;
pub mod payload;
pub mod record;
pub mod signature;
pub mod utils;
pub mod web;

use std::env;
use once_cell::sync::Lazy;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "8080";

pub static WEBHOOK_SECRET: Lazy<Option<String>> = Lazy::new(|| env_opt("WEBHOOK_SECRET"));
pub static WEBHOOK_TOKEN: Lazy<Option<String>> = Lazy::new(|| env_opt("WEBHOOK_TOKEN"));

pub static HOST: Lazy<String> =
    Lazy::new(|| env_opt("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()));

pub static PORT: Lazy<String> =
    Lazy::new(|| env_opt("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string()));

fn env_opt(key: &str) -> Option<String> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => dotenv::var(key).unwrap_or_default(),
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn init_env() {
    dotenv::dotenv().ok();
}

/// Immutable configuration snapshot taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Token required on the generic webhook family. `None` disables auth.
    pub token: Option<String>,
    /// HMAC-SHA256 shared secret. `None` disables signature verification.
    pub secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            token: WEBHOOK_TOKEN.clone(),
            secret: WEBHOOK_SECRET.clone(),
        }
    }

    pub fn token_auth_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn signature_verification_enabled(&self) -> bool {
        self.secret.is_some()
    }
}

pub struct AppContext {
    pub config: Config,
}

use std::{env, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Data directory for the file store; `None` keeps everything in memory.
    pub store_path: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Simulated payment processing time at checkout.
    pub payment_delay: Duration,
    pub seed_on_start: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let store_path = env::var("STORE_PATH").ok().filter(|p| !p.trim().is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let payment_delay = env::var("PAYMENT_DELAY_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(3));
        let seed_on_start = env::var("SEED_ON_START")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            store_path,
            host,
            port,
            jwt_secret,
            payment_delay,
            seed_on_start,
        })
    }
}

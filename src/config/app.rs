use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    /// How far ahead of their scheduled time sessions are materialized.
    pub hours_advance_creation: i64,
    /// How long past its scheduled time an occurrence may still be created.
    pub max_hours_late: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let hours_advance_creation = env::var("SCHEDULE_HOURS_ADVANCE")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let max_hours_late = env::var("SCHEDULE_MAX_HOURS_LATE")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .unwrap_or(1);

        Ok(AppConfig {
            host,
            port,
            environment,
            log_level,
            hours_advance_creation,
            max_hours_late,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

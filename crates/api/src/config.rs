//! Server and database settings for the tracking API process.
//!
//! Tracking behaviour itself (aliases, store alias, admin handler) lives in
//! [`TrackingSettings`](actionlog_core::settings::TrackingSettings); this
//! struct only covers how the process listens and which databases it opens.

/// Process-level configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Time the admin event listener gets to drain on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Database behind the `default` store.
    pub database_url: String,
    /// Separate database for the tracking store. When absent the tracking
    /// store shares the default database.
    pub tracking_database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `DATABASE_URL`          | required                |
    /// | `TRACKING_DATABASE_URL` | unset (share default)   |
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is missing or a numeric variable does not
    /// parse. Misconfiguration should stop the process before it binds.
    pub fn from_env() -> Self {
        Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 3000),
            cors_origins: var_or("CORS_ORIGINS", "http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: parse_var("SHUTDOWN_TIMEOUT_SECS", 30),
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            tracking_database_url: std::env::var("TRACKING_DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid number, got '{raw}': {e}")),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        assert_eq!(parse_var::<u64>("ACTIONLOG_TEST_UNSET_TIMEOUT", 30), 30);
        assert_eq!(var_or("ACTIONLOG_TEST_UNSET_HOST", "0.0.0.0"), "0.0.0.0");
    }
}

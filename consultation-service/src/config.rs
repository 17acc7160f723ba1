//! Environment-driven configuration.

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Base URL of the pharmacy backend the five API clients talk to.
    pub backend_api_url: String,
    /// Optional Postgres URL for persistent sessions; in-memory otherwise.
    pub database_url: Option<String>,
    /// "json" (default) or "pretty" log output.
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_api_url = std::env::var("BACKEND_API_URL")
            .map_err(|_| anyhow::anyhow!("BACKEND_API_URL not set"))?;

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            backend_api_url,
            database_url: std::env::var("DATABASE_URL").ok(),
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
        })
    }
}

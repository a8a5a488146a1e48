use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Bind address for the health and metrics endpoints.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Upper bound on pooled database connections.
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Seconds between refreshes of the pending/in-progress job gauges.
    #[serde(default = "default_gauge_refresh_secs")]
    pub gauge_refresh_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_gauge_refresh_secs() -> u64 {
    15
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

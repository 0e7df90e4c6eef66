use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PassportApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub passport_api: PassportApiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let passport_api = PassportApiConfig {
            base_url: std::env::var("PASSPORT_API_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            timeout_secs: std::env::var("PASSPORT_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            passport_api,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub sync_api_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);
        let sync_api_key =
            std::env::var("SYNC_API_KEY").unwrap_or_else(|_| "change-this-in-production".into());

        Config {
            host,
            port,
            sync_api_key,
        }
    }
}

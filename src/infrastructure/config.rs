use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Postal code directory used by `--import-addresses`
    pub address_csv_path: String,
    /// WHATWG label, e.g. `shift_jis` or `utf-8`
    pub address_csv_encoding: String,
}

impl Config {
    pub fn from_env() -> Self {
        let profile = env::var("PROFILE").unwrap_or_else(|_| "default".to_string());

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://bookshop.db?mode=rwc".to_string()
            } else {
                format!("sqlite://bookshop_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            profile,
            address_csv_path: env::var("ADDRESS_CSV_PATH")
                .unwrap_or_else(|_| "data/x-ken-all.csv".to_string()),
            address_csv_encoding: env::var("ADDRESS_CSV_ENCODING")
                .unwrap_or_else(|_| "shift_jis".to_string()),
        }
    }
}

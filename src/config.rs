//! Environment configuration
//!
//! Values are read once at startup (after `.env` is loaded) and passed to the
//! handlers through `AppState`.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Server port number
    pub port: u16,
    /// Path to the embedded database file
    pub database_url: String,
    /// Directory receiving uploaded user photos
    pub uploads_dir: PathBuf,
    /// Raw internal error text is only sent to clients in development
    pub expose_errors: bool,
    /// When set, every API request must carry this value in `Authorization`
    pub admin_token: Option<String>,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn load() -> Self {
        let app_env: String = try_load("APP_ENV", "production");

        Self {
            port: try_load("PORT", "5000"),
            database_url: try_load("DATABASE_URL", "dashboard.db"),
            uploads_dir: PathBuf::from(try_load::<String>("UPLOADS_DIR", "uploads")),
            expose_errors: app_env.eq_ignore_ascii_case("development"),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|token| !token.is_empty()),
            bcrypt_cost: try_load("BCRYPT_COST", "12"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "dashboard.db".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            expose_errors: false,
            admin_token: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

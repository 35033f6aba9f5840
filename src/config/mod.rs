use std::env;
use std::str::FromStr;

use crate::history::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Absent means the in-memory store is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub history_page_size: usize,
    pub cors_permissive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            db_max_connections: 10,
            server_host: "0.0.0.0".to_string(),
            server_port: 3007,
            api_base_uri: String::new(),
            history_page_size: DEFAULT_PAGE_SIZE,
            cors_permissive: true,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {:?} for {}, using default", value, key);
            default
        }),
    }
}

impl Config {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(e),
        })
    }

    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, env::VarError>
    where
        F: FnMut(&str) -> Result<Option<String>, env::VarError>,
    {
        let defaults = Config::default();

        let bool_flag = |raw: Option<String>, default: bool| match raw.as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            _ => default,
        };

        Ok(Config {
            database_url: lookup("DATABASE_URL")?.filter(|url| !url.trim().is_empty()),
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS")?,
                defaults.db_max_connections,
            ),
            server_host: lookup("SERVER_HOST")?.unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", lookup("SERVER_PORT")?, defaults.server_port),
            api_base_uri: lookup("API_BASE_URI")?
                .map(|uri| uri.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_uri),
            history_page_size: parse_or(
                "HISTORY_PAGE_SIZE",
                lookup("HISTORY_PAGE_SIZE")?,
                defaults.history_page_size,
            )
            .max(1),
            cors_permissive: bool_flag(lookup("CORS_PERMISSIVE")?, defaults.cors_permissive),
        })
    }
}

/// Application configuration module
use crate::services::{DEFAULT_BASE_URL, DEFAULT_SEARCH_PATH};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub search_path: String,
    pub state_file: PathBuf,
    pub default_query: String,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("NASA_IMAGES_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let search_path =
            env::var("NASA_SEARCH_PATH").unwrap_or_else(|_| DEFAULT_SEARCH_PATH.to_string());

        let state_file = env::var("QUERY_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".nasa_image_search.json"));

        let default_query = env::var("DEFAULT_QUERY").unwrap_or_else(|_| "apollo 11".to_string());

        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECONDS", 30));

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            api_base_url,
            search_path,
            state_file,
            default_query,
            http_timeout,
            bind_addr,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_u64_falls_back_on_garbage() {
        env::set_var("NASA_IMAGE_SEARCH_TEST_TIMEOUT", "soon");
        assert_eq!(env_u64("NASA_IMAGE_SEARCH_TEST_TIMEOUT", 30), 30);
        env::set_var("NASA_IMAGE_SEARCH_TEST_TIMEOUT", "5");
        assert_eq!(env_u64("NASA_IMAGE_SEARCH_TEST_TIMEOUT", 30), 5);
        env::remove_var("NASA_IMAGE_SEARCH_TEST_TIMEOUT");
    }

    #[test]
    fn test_env_u64_missing_key() {
        assert_eq!(env_u64("NASA_IMAGE_SEARCH_TEST_UNSET", 7), 7);
    }
}

//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the application can start with
//! zero configuration for local development.

use std::path::PathBuf;

use syncin_shared::constants::MAX_MEDIA_SIZE;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Filesystem path where uploaded media is stored.
    /// Env: `SYNCIN_MEDIA_PATH`
    /// Default: `./media`
    pub media_path: PathBuf,

    /// Maximum media upload size in bytes (50 MiB).
    /// Env: `SYNCIN_MAX_MEDIA_SIZE`
    pub max_media_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            media_path: PathBuf::from("./media"),
            max_media_size: MAX_MEDIA_SIZE,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SYNCIN_MEDIA_PATH") {
            config.media_path = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var("SYNCIN_MAX_MEDIA_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_media_size = n;
            } else {
                tracing::warn!(value = %val, "Invalid SYNCIN_MAX_MEDIA_SIZE, using default");
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.media_path, PathBuf::from("./media"));
        assert_eq!(config.max_media_size, MAX_MEDIA_SIZE);
    }
}

use crate::error::{Error, Result};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen-turbo";

/// Effective settings for a rename run.
///
/// Every field has a default so an empty configuration is valid; the CLI
/// layers its own flags on top of whatever was loaded here.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_path: Option<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub keyword: Option<String>,
    /// Pause between batches, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub journal_path: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_batch_size() -> usize {
    3
}

fn default_delay_secs() -> f64 {
    2.0
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            recursive: false,
            batch_size: default_batch_size(),
            keyword: None,
            delay_secs: default_delay_secs(),
            model: default_model(),
            api_base: default_api_base(),
            api_key: None,
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            ignore_patterns: Vec::new(),
            journal_path: None,
            dry_run: false,
        }
    }
}

impl AppConfig {
    /// Pause between batches. Zero, negative and NaN mean no pause; a value
    /// too large for a [`Duration`] is a configuration error.
    pub fn delay(&self) -> Result<Duration> {
        if self.delay_secs.is_nan() || self.delay_secs <= 0.0 {
            return Ok(Duration::ZERO);
        }
        Duration::try_from_secs_f64(self.delay_secs).map_err(|e| {
            Error::Other(format!("delay_secs = {} is out of range: {}", self.delay_secs, e))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// The API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_secret)
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Loads `Config.{toml,yaml,json}` from the working directory (optional),
/// then `RENAMER_*` environment variables on top.
pub fn load_configuration() -> std::result::Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("RENAMER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Like [`load_configuration`], but reads the given file (which must exist)
/// instead of `Config.*` in the working directory.
pub fn load_configuration_file(path: &Path) -> std::result::Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .add_source(
            Environment::with_prefix("RENAMER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::builder()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.delay().unwrap(), Duration::from_secs(2));
        assert!(!config.recursive);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_load_configuration_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renamer.toml");
        fs::write(
            &path,
            "batch_size = 5\nrecursive = true\nkeyword = \"travel\"\ndelay_secs = 0.5\nignore_patterns = [\"*.tmp\"]\n",
        )
        .unwrap();

        let config = load_configuration_file(&path).unwrap();
        assert_eq!(config.batch_size, 5);
        assert!(config.recursive);
        assert_eq!(config.keyword.as_deref(), Some("travel"));
        assert_eq!(config.delay().unwrap(), Duration::from_millis(500));
        assert_eq!(config.ignore_patterns, vec!["*.tmp".to_string()]);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_negative_delay_is_zero() {
        let config = AppConfig {
            delay_secs: -1.0,
            ..AppConfig::default()
        };
        assert_eq!(config.delay().unwrap(), Duration::ZERO);

        let config = AppConfig {
            delay_secs: f64::NAN,
            ..AppConfig::default()
        };
        assert_eq!(config.delay().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_oversized_delay_is_an_error() {
        for delay_secs in [1e20, f64::INFINITY] {
            let config = AppConfig {
                delay_secs,
                ..AppConfig::default()
            };
            assert!(matches!(config.delay(), Err(Error::Other(_))), "{}", delay_secs);
        }
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-abcdef1234"), "*********1234");
        assert_eq!(mask_secret("abc"), "***");
    }
}

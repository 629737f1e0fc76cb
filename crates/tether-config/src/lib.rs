use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "tether";
const CONFIG_FILENAME: &str = "config.toml";

/// Telegram caps messages at 4096 characters; keeping a margin below that
/// leaves room for the spoiler markers and headers added around windowed
/// text.
pub const DEFAULT_MESSAGE_BUDGET: usize = 4000;
pub const DEFAULT_RECENT_DAYS: i64 = 7;
pub const DEFAULT_MATCH_LIMIT: usize = 3;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub message_budget: usize,
    pub recent_days: i64,
    pub match_limit: usize,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            message_budget: DEFAULT_MESSAGE_BUDGET,
            recent_days: DEFAULT_RECENT_DAYS,
            match_limit: DEFAULT_MATCH_LIMIT,
            telegram: TelegramConfig {
                token: None,
                api_url: DEFAULT_API_URL.to_string(),
                poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid message_budget value: {0}")]
    InvalidMessageBudget(usize),
    #[error("invalid recent_days value: {0}")]
    InvalidRecentDays(i64),
    #[error("invalid match_limit value: {0}")]
    InvalidMatchLimit(usize),
    #[error("telegram token must not be blank")]
    BlankTelegramToken,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    message_budget: Option<usize>,
    recent_days: Option<i64>,
    match_limit: Option<usize>,
    telegram: Option<TelegramFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TelegramFile {
    token: Option<String>,
    api_url: Option<String>,
    poll_timeout_secs: Option<u64>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(budget) = parsed.message_budget {
        if budget == 0 {
            return Err(ConfigError::InvalidMessageBudget(budget));
        }
        config.message_budget = budget;
    }

    if let Some(days) = parsed.recent_days {
        if days <= 0 {
            return Err(ConfigError::InvalidRecentDays(days));
        }
        config.recent_days = days;
    }

    if let Some(limit) = parsed.match_limit {
        if limit == 0 {
            return Err(ConfigError::InvalidMatchLimit(limit));
        }
        config.match_limit = limit;
    }

    if let Some(telegram) = parsed.telegram {
        if let Some(token) = telegram.token {
            if token.trim().is_empty() {
                return Err(ConfigError::BlankTelegramToken);
            }
            config.telegram.token = Some(token);
        }
        if let Some(api_url) = telegram.api_url {
            config.telegram.api_url = api_url;
        }
        if let Some(timeout) = telegram.poll_timeout_secs {
            config.telegram.poll_timeout_secs = timeout;
        }
    }

    Ok(config)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_at_path, merge_config, ConfigFile, TelegramFile};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    #[test]
    fn merge_config_applies_values() {
        let parsed = ConfigFile {
            message_budget: Some(2000),
            recent_days: Some(14),
            match_limit: Some(5),
            telegram: Some(TelegramFile {
                token: Some("123:abc".to_string()),
                api_url: None,
                poll_timeout_secs: Some(10),
            }),
        };
        let merged = merge_config(parsed).expect("merge");
        assert_eq!(merged.message_budget, 2000);
        assert_eq!(merged.recent_days, 14);
        assert_eq!(merged.match_limit, 5);
        assert_eq!(merged.telegram.token.as_deref(), Some("123:abc"));
        assert_eq!(merged.telegram.api_url, super::DEFAULT_API_URL);
        assert_eq!(merged.telegram.poll_timeout_secs, 10);
    }

    #[test]
    fn merge_config_rejects_zero_budget() {
        let parsed = ConfigFile {
            message_budget: Some(0),
            recent_days: None,
            match_limit: None,
            telegram: None,
        };
        let err = merge_config(parsed).unwrap_err();
        assert!(err.to_string().contains("message_budget"));
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_at_path_parses_toml() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "message_budget = 3500\n[telegram]\ntoken = \"42:xyz\"\n",
        )
        .expect("write config");
        restrict_permissions(&path);

        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.message_budget, 3500);
        assert_eq!(config.telegram.token.as_deref(), Some("42:xyz"));
        assert_eq!(config.recent_days, super::DEFAULT_RECENT_DAYS);
    }
}

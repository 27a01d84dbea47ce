//! Configuration for postdraft.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (POSTDRAFT_HOME, POSTDRAFT_QUEUE)
//! 2. Config file (.postdraft/config.yaml)
//! 3. Defaults (~/.postdraft)
//!
//! Config file discovery:
//! - Searches current directory and parents for .postdraft/config.yaml
//! - Paths in config file are relative to the .postdraft/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default store file name
pub const QUEUE_FILE_NAME: &str = "drafts_queue.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub fetch: Option<FetchConfig>,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .postdraft/)
    pub home: Option<String>,
    /// Queue store file (relative to .postdraft/)
    pub queue: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub delay_between_ms: Option<u64>,
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the state directory
    pub home: PathBuf,
    /// Path to the queue store
    pub queue: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Fetch settings
    pub fetch: FetchSettings,
    /// Model refinement settings
    pub llm: LlmSettings,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub delay_between_ms: u64,
    pub retry: RetryPolicy,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 10,
            delay_between_ms: 2000,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchSettings {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Polite delay between URLs
    pub fn delay_between(&self) -> Duration {
        Duration::from_millis(self.delay_between_ms)
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            max_tokens: 2000,
            temperature: 0.3,
        }
    }
}

impl FetchSettings {
    fn from_file(config: Option<&FetchConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            user_agent: config.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout_seconds: config.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            delay_between_ms: config.delay_between_ms.unwrap_or(defaults.delay_between_ms),
            retry: config.retry.clone().unwrap_or(defaults.retry),
        }
    }
}

impl LlmSettings {
    fn from_file(config: Option<&LlmConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            model: config.model.clone().unwrap_or(defaults.model),
            api_base: config.api_base.clone().unwrap_or(defaults.api_base),
            max_tokens: config.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: config.temperature.unwrap_or(defaults.temperature),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".postdraft").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    resolve(
        config_file,
        parsed,
        std::env::var("POSTDRAFT_HOME").ok(),
        std::env::var("POSTDRAFT_QUEUE").ok(),
    )
}

/// Combine the config file, env overrides and defaults
fn resolve(
    config_file: Option<PathBuf>,
    parsed: Option<ConfigFile>,
    env_home: Option<String>,
    env_queue: Option<String>,
) -> Result<ResolvedConfig> {
    // home/queue in the file are relative to .postdraft/
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let paths = parsed.as_ref().map(|c| c.paths.clone()).unwrap_or_default();

    let home = if let Some(env_home) = env_home {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = paths.home {
        resolve_path(&config_dir, home_path)
    } else {
        dirs::home_dir()
            .context("Failed to determine home directory")?
            .join(".postdraft")
    };

    let queue = if let Some(env_queue) = env_queue {
        PathBuf::from(env_queue)
    } else if let Some(ref queue_path) = paths.queue {
        resolve_path(&config_dir, queue_path)
    } else {
        home.join(QUEUE_FILE_NAME)
    };

    Ok(ResolvedConfig {
        home,
        queue,
        fetch: FetchSettings::from_file(parsed.as_ref().and_then(|c| c.fetch.as_ref())),
        llm: LlmSettings::from_file(parsed.as_ref().and_then(|c| c.llm.as_ref())),
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the postdraft home directory
pub fn postdraft_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the queue store path
pub fn queue_path() -> Result<PathBuf> {
    Ok(config()?.queue.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = resolve(None, None, None, None).unwrap();

        let expected_home = dirs::home_dir().unwrap().join(".postdraft");
        assert_eq!(config.home, expected_home);
        assert_eq!(config.queue, expected_home.join("drafts_queue.json"));
        assert!(config.config_file.is_none());
        assert_eq!(config.fetch.timeout_seconds, 10);
        assert_eq!(config.fetch.retry.max_attempts, 3);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_env_overrides() {
        let config = resolve(
            None,
            None,
            Some("/srv/postdraft".to_string()),
            Some("/tmp/q.json".to_string()),
        )
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/srv/postdraft"));
        assert_eq!(config.queue, PathBuf::from("/tmp/q.json"));
    }

    #[test]
    fn test_queue_follows_home() {
        let config = resolve(None, None, Some("/srv/postdraft".to_string()), None).unwrap();
        assert_eq!(config.queue, PathBuf::from("/srv/postdraft/drafts_queue.json"));
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".postdraft");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  queue: /data/drafts.json
fetch:
  timeout_seconds: 30
  delay_between_ms: 0
  retry:
    max_attempts: 5
llm:
  model: gpt-4o-mini
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.paths.home, Some("./state".to_string()));

        let config = resolve(Some(config_path), Some(parsed), None, None).unwrap();
        assert_eq!(config.home, config_dir.join("./state"));
        assert_eq!(config.queue, PathBuf::from("/data/drafts.json"));
        assert_eq!(config.fetch.timeout_seconds, 30);
        assert_eq!(config.fetch.delay_between_ms, 0);
        assert_eq!(config.fetch.retry.max_attempts, 5);
        // Unset retry fields keep their defaults
        assert_eq!(config.fetch.retry.initial_delay_ms, 1000);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 2000);
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}

//! Backend configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizreport_core::traits::Backend;

use crate::directory::DirectoryBackend;
use crate::http::HttpBackend;

/// Where report inputs are read from and settings are written to.
///
/// Note: Custom Debug impl masks the API token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_token: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Directory {
        path: PathBuf,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                base_url,
                api_token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_token", &api_token.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            BackendConfig::Directory { path } => {
                f.debug_struct("Directory").field("path", path).finish()
            }
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Directory {
            path: default_data_dir(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Top-level quizreport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizreportConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Directory generated reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Quiet window before a template edit is saved automatically.
    #[serde(default = "default_debounce_ms")]
    pub autosave_debounce_ms: u64,
    /// Max concurrent report fetches in a batch.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output format used when none is given on the command line.
    #[serde(default = "default_format")]
    pub default_format: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizreport-data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizreport-output")
}
fn default_debounce_ms() -> u64 {
    2000
}
fn default_parallelism() -> usize {
    4
}
fn default_format() -> String {
    "html".to_string()
}

impl Default for QuizreportConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            output_dir: default_output_dir(),
            autosave_debounce_ms: default_debounce_ms(),
            parallelism: default_parallelism(),
            default_format: default_format(),
        }
    }
}

impl QuizreportConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => BackendConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_token: api_token.as_ref().map(|t| resolve_env_vars(t)),
            timeout_secs: *timeout_secs,
        },
        BackendConfig::Directory { path } => BackendConfig::Directory {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizreport.toml` in the current directory
/// 2. `~/.config/quizreport/config.toml`
///
/// Environment variable override: `QUIZREPORT_API_URL` selects the HTTP
/// backend at that URL.
pub fn load_config() -> Result<QuizreportConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizreportConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizreport.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizreportConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizreportConfig::default(),
    };

    if let Ok(url) = std::env::var("QUIZREPORT_API_URL") {
        match &mut config.backend {
            BackendConfig::Http { base_url, .. } => *base_url = url,
            other => {
                *other = BackendConfig::Http {
                    base_url: url,
                    api_token: None,
                    timeout_secs: default_timeout_secs(),
                }
            }
        }
    }

    config.backend = resolve_backend_config(&config.backend);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizreport"))
}

/// Create a backend instance from its configuration.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    match config {
        BackendConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => {
            let backend = HttpBackend::new(base_url, api_token.clone(), *timeout_secs)
                .context("failed to build HTTP backend")?;
            Ok(Arc::new(backend))
        }
        BackendConfig::Directory { path } => Ok(Arc::new(DirectoryBackend::new(path))),
    }
}

//! Configuration and logging setup for beanscope.
//!
//! Configuration is a small TOML document:
//!
//! ```toml
//! [model]
//! allow_auto_configuration = true
//! exclude_test_sources = true
//! auto_configure_order_default = 0
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! Unknown keys never fail loading; they are reported through
//! [`ConfigDiagnostics`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock};

use parking_lot::ReentrantMutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;

/// Environment variable that overrides config discovery.
pub const BEANSCOPE_CONFIG_ENV_VAR: &str = "BEANSCOPE_CONFIG_PATH";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// When disabled, auto-configured model discovery yields nothing.
    #[serde(default = "ModelConfig::default_allow_auto_configuration")]
    pub allow_auto_configuration: bool,

    /// Skip configuration units that live in test sources during
    /// auto-discovery.
    #[serde(default = "ModelConfig::default_exclude_test_sources")]
    pub exclude_test_sources: bool,

    /// Order assigned to auto-configuration units without an explicit order.
    #[serde(default)]
    pub auto_configure_order_default: i32,
}

impl ModelConfig {
    fn default_allow_auto_configuration() -> bool {
        true
    }

    fn default_exclude_test_sources() -> bool {
        true
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            allow_auto_configuration: Self::default_allow_auto_configuration(),
            exclude_test_sources: Self::default_exclude_test_sources(),
            auto_configure_order_default: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Either a simple level (`info`, `debug`, ...) or a full
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Mirror logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file. If it cannot be opened, file logging is
    /// disabled while other sinks remain active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Effective filter: the configured level merged with `RUST_LOG`.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanscopeConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a source snippet; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

/// Non-fatal findings produced while loading a config.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Dotted paths of keys that were ignored (`model.allow_autoconfig`).
    pub unknown_keys: Vec<String>,
}

impl ConfigDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty()
    }
}

impl BeanscopeConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path_with_diagnostics(path)?.0)
    }

    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str_with_diagnostics(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(Self::load_from_str_with_diagnostics(text)?.0)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) = deserialize_toml_with_unknown_keys::<BeanscopeConfig>(text)?;
        for key in &unknown_keys {
            tracing::warn!(target: "beanscope.config", key = %key, "ignoring unknown config key");
        }
        Ok((config, ConfigDiagnostics { unknown_keys }))
    }
}

fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(path.to_string().trim_start_matches('.').to_owned());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Serializes access to [`BEANSCOPE_CONFIG_ENV_VAR`] for tests that set it.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Discover the configuration file for a workspace root.
///
/// Search order:
/// 1) `BEANSCOPE_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `beanscope.toml` in `workspace_root`
/// 3) `.beanscope.toml` in `workspace_root`
/// 4) `.beanscope/config.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(BEANSCOPE_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    ["beanscope.toml", ".beanscope.toml", ".beanscope/config.toml"]
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the configuration for a workspace root.
///
/// If no config is present, returns [`BeanscopeConfig::default`] and `None`.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(BeanscopeConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((BeanscopeConfig::default(), None));
    };

    let config = BeanscopeConfig::load_from_path(&path)?;
    Ok((config, Some(path)))
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Safe to call multiple times; only the first call has an effect. Returns
/// `true` if this call installed the subscriber.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let file = config.file.as_ref().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        let file_failed = config.file.is_some() && file.is_none();

        let mut make_writer = if config.stderr {
            if cfg!(debug_assertions) {
                BoxMakeWriter::new(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
            } else {
                BoxMakeWriter::new(std::io::stderr)
            }
        } else {
            BoxMakeWriter::new(std::io::sink)
        };
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(Mutex::new(file)));
        }

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            installed = true;
            if file_failed {
                if let Some(path) = config.file.as_ref() {
                    tracing::warn!(
                        target: "beanscope.config",
                        path = %path.display(),
                        "failed to open log file; file logging disabled"
                    );
                }
            }
        }
    });
    installed
}

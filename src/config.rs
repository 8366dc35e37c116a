use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration for the presenter binary
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the purpose registry lives
    pub registry: RegistrySettings,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistrySettings {
    /// Path of the registry TOML document
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default log level when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of human readable ones
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry: RegistrySettings {
                path: PathBuf::from("config/purposes.toml"),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (purpose-presenter.toml)
    /// 3. Environment variables (prefixed with PURPOSE_PRESENTER_, `__` between sections)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("purpose-presenter.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("PURPOSE_PRESENTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists, returning the file that was read.
    ///
    /// Nothing is logged here: this runs before the subscriber is installed.
    pub fn load_env_file() -> Result<Option<PathBuf>> {
        Self::load_env_file_from(Path::new(".env"))
    }

    pub fn load_env_file_from(path: &Path) -> Result<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }
        dotenvy::from_path(path)?;
        Ok(Some(path.to_path_buf()))
    }
}

struct LoadedConfig {
    settings: AppConfig,
    /// Outcome of reading `.env`, reported once logging is up
    env_file: Result<Option<PathBuf>, String>,
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<LoadedConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let env_file = AppConfig::load_env_file().map_err(|e| e.to_string());
        Ok(LoadedConfig {
            settings: AppConfig::load()?,
            env_file,
        })
    });

/// Get the global configuration
pub fn config() -> Result<&'static AppConfig> {
    CONFIG
        .as_ref()
        .map(|loaded| &loaded.settings)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup, after telemetry)
pub fn init_config() -> Result<()> {
    let loaded = CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    match &loaded.env_file {
        Ok(Some(path)) => {
            tracing::info!(path = %path.display(), "Loaded environment variables from .env file")
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }
    tracing::info!(
        registry = %loaded.settings.registry.path.display(),
        "Configuration loaded successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.registry.path, PathBuf::from("config/purposes.toml"));
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("purpose-presenter.toml");
        std::fs::write(
            &path,
            "[registry]\npath = \"/etc/limber/purposes.toml\"\n\n[observability]\nlog_level = \"debug\"\njson = true\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.registry.path, PathBuf::from("/etc/limber/purposes.toml"));
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json);
    }

    #[test]
    fn test_env_file_is_reported_not_logged() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join(".env");
        assert_eq!(AppConfig::load_env_file_from(&missing).unwrap(), None);

        std::fs::write(&missing, "LIMBER_DOTENV_CHECK=loaded\n").unwrap();
        assert_eq!(AppConfig::load_env_file_from(&missing).unwrap(), Some(missing.clone()));
        assert_eq!(
            std::env::var("LIMBER_DOTENV_CHECK").as_deref(),
            Ok("loaded")
        );
    }

    #[test]
    fn test_saved_file_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("saved.toml");
        let mut config = AppConfig::default();
        config.observability.json = true;
        config.save_to_file(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }
}

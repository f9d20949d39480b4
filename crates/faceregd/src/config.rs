use facereg_core::{TargetRegion, DEFAULT_TOLERANCE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Daemon configuration: optional TOML file (`FACEREG_CONFIG`) overridden by
/// `FACEREG_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Viewport width the target region is derived from.
    pub viewport_width: f32,
    /// Viewport height the target region is derived from.
    pub viewport_height: f32,
    /// Maximum relative deviation per attribute for an aligned face.
    pub tolerance: f32,
    /// Path to the SQLite registry database.
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport_width: 1080.0,
            viewport_height: 1920.0,
            tolerance: DEFAULT_TOLERANCE,
            db_path: default_data_dir().join("faces.db"),
        }
    }
}

impl Config {
    /// Load the file named by `FACEREG_CONFIG` (if set), apply environment
    /// overrides, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("FACEREG_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Override fields from `FACEREG_*` variables. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let parse_f32 = |key: &str| var(key).and_then(|v| v.parse::<f32>().ok());

        if let Some(v) = parse_f32("FACEREG_VIEWPORT_WIDTH") {
            self.viewport_width = v;
        }
        if let Some(v) = parse_f32("FACEREG_VIEWPORT_HEIGHT") {
            self.viewport_height = v;
        }
        if let Some(v) = parse_f32("FACEREG_TOLERANCE") {
            self.tolerance = v;
        }
        if let Some(v) = var("FACEREG_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{key} must be > 0, got {value}")));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be >= 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Target region centered in the configured viewport.
    pub fn target_region(&self) -> TargetRegion {
        TargetRegion::centered(self.viewport_width, self.viewport_height)
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facereg")
}

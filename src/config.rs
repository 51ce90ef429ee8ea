use crate::translation::{Language, NllbModel};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config directory")]
    NoConfigDir,

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where submissions are stored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Dataset root directory (relative paths resolve against the working directory)
    #[serde(default = "default_dataset_dir")]
    pub dir: String,

    /// CSV file name inside the dataset directory
    #[serde(default = "default_csv_file")]
    pub csv_file: String,

    /// Image directory name inside the dataset directory
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Always name stored images `<uuid>.png`, whatever their actual format.
    /// Only needed when downstream tooling depends on the old naming.
    #[serde(default)]
    pub legacy_png_suffix: bool,

    /// Largest accepted image upload in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dir: default_dataset_dir(),
            csv_file: default_csv_file(),
            images_dir: default_images_dir(),
            legacy_png_suffix: false,
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl DatasetConfig {
    /// Full path of the CSV store.
    pub fn csv_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.csv_file)
    }

    /// Full path of the image directory.
    pub fn images_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.images_dir)
    }
}

fn default_dataset_dir() -> String {
    "data".to_string()
}

fn default_csv_file() -> String {
    "captions.csv".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

/// Caption translation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// NLLB model variant: "600m" or "600m-quantized"
    #[serde(default = "default_nllb_model")]
    pub model: String,

    /// Override the model directory (default: <data dir>/models/<variant>)
    #[serde(default)]
    pub model_dir: Option<String>,

    /// Maximum number of generated tokens per caption
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,

    /// ONNX Runtime intra-op threads
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,

    /// Source language offered by default (display name)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language offered by default (display name)
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_nllb_model(),
            model_dir: None,
            max_new_tokens: default_max_new_tokens(),
            intra_threads: default_intra_threads(),
            source_language: default_source_language(),
            target_language: default_target_language(),
        }
    }
}

impl TranslationConfig {
    /// Resolve the directory holding the ONNX files and tokenizer.
    pub fn resolved_model_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.model_dir {
            return Ok(PathBuf::from(dir));
        }
        Ok(Config::data_dir()?.join("models").join(&self.model))
    }

    /// Parsed model variant.
    pub fn nllb_model(&self) -> Result<NllbModel, ConfigError> {
        self.model
            .parse::<NllbModel>()
            .map_err(ConfigError::ValidationError)
    }
}

fn default_nllb_model() -> String {
    "600m".to_string()
}

fn default_max_new_tokens() -> usize {
    200 // NLLB generation default
}

fn default_intra_threads() -> usize {
    4
}

fn default_source_language() -> String {
    "Telugu".to_string()
}

fn default_target_language() -> String {
    "English".to_string()
}

/// REST API server configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// Bind address (default: 127.0.0.1:8080 - localhost only)
    #[serde(default = "default_api_bind")]
    pub bind: String,

    /// Enable Swagger UI at /swagger-ui/
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Allowed CORS origins (empty = same-origin only)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_api_bind(),
            swagger_ui: true,
            cors_origins: vec![],
        }
    }
}

fn default_api_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("org", "describe-this", "describe-this")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Get the data directory path (for models)
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("org", "describe-this", "describe-this")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // File names live inside the dataset directory
        for (field, value) in [
            ("dataset.csv_file", &self.dataset.csv_file),
            ("dataset.images_dir", &self.dataset.images_dir),
        ] {
            if value.is_empty()
                || value.contains("..")
                || value.contains('/')
                || value.contains('\\')
            {
                return Err(ConfigError::ValidationError(format!(
                    "{} contains invalid characters",
                    field
                )));
            }
        }

        if self.dataset.dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "dataset.dir must not be empty".into(),
            ));
        }

        if self.dataset.max_image_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "dataset.max_image_bytes must be positive".into(),
            ));
        }

        self.translation.nllb_model()?;

        if self.translation.max_new_tokens == 0 || self.translation.max_new_tokens > 1024 {
            return Err(ConfigError::ValidationError(
                "translation.max_new_tokens must be between 1 and 1024".into(),
            ));
        }

        if self.translation.intra_threads == 0 {
            return Err(ConfigError::ValidationError(
                "translation.intra_threads must be positive".into(),
            ));
        }

        for (field, value) in [
            ("translation.source_language", &self.translation.source_language),
            ("translation.target_language", &self.translation.target_language),
        ] {
            if Language::from_display_name(value).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "{} '{}' is not a supported language",
                    field, value
                )));
            }
        }

        Ok(())
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;

        // Create config directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;

        info!("Config saved to: {}", path.display());
        Ok(())
    }
}

/// Show current configuration
pub fn show() -> anyhow::Result<()> {
    let config = Config::load()?;
    let path = Config::config_path()?;

    println!("Config file: {}\n", path.display());
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

/// Update configuration
pub fn update(
    dataset_dir: Option<String>,
    model: Option<String>,
    source_language: Option<String>,
    target_language: Option<String>,
    legacy_png_suffix: Option<bool>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let mut changed = false;

    if let Some(dir) = dataset_dir {
        config.dataset.dir = dir;
        changed = true;
    }

    if let Some(m) = model {
        config.translation.model = m;
        changed = true;
    }

    if let Some(lang) = source_language {
        config.translation.source_language = lang;
        changed = true;
    }

    if let Some(lang) = target_language {
        config.translation.target_language = lang;
        changed = true;
    }

    if let Some(legacy) = legacy_png_suffix {
        config.dataset.legacy_png_suffix = legacy;
        changed = true;
    }

    if let Some(addr) = bind {
        config.api.bind = addr;
        changed = true;
    }

    if changed {
        config.validate()?;
        config.save()?;
        println!("Configuration updated.");
    } else {
        println!("No changes specified. Use --show to view current config.");
    }

    Ok(())
}

use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub inference: InferenceConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl InferenceConfig {
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnnotationConfig {
    #[serde(default = "default_target_label")]
    pub target_label: String,
    #[serde(default = "default_font_paths")]
    pub font_paths: Vec<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            target_label: default_target_label(),
            font_paths: default_font_paths(),
            font_size: default_font_size(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_target_label() -> String {
    "bear".into()
}

fn default_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
        "/usr/share/fonts/TTF/arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn default_font_size() -> f32 {
    20.0
}

fn default_jpeg_quality() -> u8 {
    75
}

pub trait Validatable {
    fn validate(&self) -> Result<(), String>;
}

impl Validatable for InferenceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("inference.url must not be empty".into());
        }
        if self.timeout_secs == 0 {
            return Err("inference.timeout_secs must be greater than zero".into());
        }
        Ok(())
    }
}

impl Validatable for AnnotationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.target_label.is_empty() {
            return Err("annotation.target_label must not be empty".into());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "annotation.jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            ));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(format!(
                "annotation.font_size must be positive, got {}",
                self.font_size
            ));
        }
        Ok(())
    }
}

impl Validatable for Config {
    fn validate(&self) -> Result<(), String> {
        self.inference.validate()?;
        self.annotation.validate()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, <Self as TryFrom<String>>::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "{} is not a supported minimum log level. Use one of `debug`, `info`, `warn` or `error`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("BD")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        return Err(config::ConfigError::Message(e));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(yaml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
server:
  host: 127.0.0.1
  port: 5001
log_level: INFO
inference:
  url: http://localhost:9000/detect/
"#;

    #[test]
    fn test_defaults_are_applied() {
        let config = parse(MINIMAL);

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.server.get_address(), "127.0.0.1:5001");
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.inference.get_timeout(), Duration::from_secs(30));
        assert_eq!(config.annotation.target_label, "bear");
        assert_eq!(config.annotation.jpeg_quality, 75);
        assert_eq!(config.annotation.font_size, 20.0);
        assert!(!config.annotation.font_paths.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let yaml = format!(
            "{}annotation:\n  target_label: cat\n  jpeg_quality: 90\n  font_paths: []\n",
            MINIMAL
        );
        let config = parse(&yaml);

        assert_eq!(config.annotation.target_label, "cat");
        assert_eq!(config.annotation.jpeg_quality, 90);
        assert!(config.annotation.font_paths.is_empty());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = parse(MINIMAL);
        config.annotation.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = parse(MINIMAL);
        config.inference.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = parse(MINIMAL);
        config.annotation.target_label.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level() {
        let level: Result<LogLevel, _> = "trace".to_string().try_into();
        assert!(level.is_err());
    }
}

use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

pub const DEFAULT_CURRENT_TEMPLATE: &str = "{location}, {country}: {emoji}  {temp_c}°";
pub const DEFAULT_SHORT_TEMPLATE: &str = "{emoji} {temp_c}°";
pub const DEFAULT_FORECAST_TEMPLATE: &str = "{emoji} {temp_c}° [{feelslike_c}°]";
pub const DEFAULT_FORECAST_HOURS: usize = 4;
pub const DEFAULT_CACHE_MAX_AGE_MINS: i64 = 30;

/// How the forecast is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown output format '{value}'. Supported formats: table, json.")),
        }
    }
}

/// Asks the user for the values a fresh config file needs.
pub trait ConfigPrompter {
    fn api_key(&self) -> Result<String>;

    fn location(&self) -> Result<String>;

    /// Called once a new config file has been written.
    fn created(&self, _path: &Path) {}
}

/// Application configuration, stored on disk as TOML.
///
/// Every field is optional in the file. A custom config only needs the
/// fields it wants to override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WeatherAPI.com key. Only required in the default config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Location used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Raise log verbosity to `info`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,

    /// Line shown under "Current:" in table output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_template: Option<String>,

    /// The `text` field of JSON output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_template: Option<String>,

    /// One hourly forecast row, shared by table and JSON output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_hours: Option<usize>,

    /// Cached responses older than this are fetched again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_max_age_mins: Option<i64>,
}

impl Config {
    /// Load the default config and merge the custom one over it, creating
    /// either file interactively when it doesn't exist yet.
    pub fn load(paths: &ConfigPaths, prompter: &dyn ConfigPrompter) -> Result<Self> {
        let mut config = Self::load_or_create(&paths.default, true, prompter)?;
        config.set_defaults();

        if let Some(custom) = &paths.custom {
            let custom_config = Self::load_or_create(custom, false, prompter)?;
            config.merge(custom_config);
        }

        Ok(config)
    }

    pub fn load_or_create(
        path: &Path,
        require_api_key: bool,
        prompter: &dyn ConfigPrompter,
    ) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Self::create(path, require_api_key, prompter)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn create(path: &Path, require_api_key: bool, prompter: &dyn ConfigPrompter) -> Result<Self> {
        let mut config = Config::default();

        if require_api_key {
            config.api_key = Some(non_empty(prompter.api_key()?, "API key")?);
        }
        config.location = Some(non_empty(prompter.location()?, "Location")?);
        config.logger = Some(false);

        config.save_to(path)?;
        info!(path = %path.display(), "created configuration file");
        prompter.created(path);

        Ok(config)
    }

    /// Fill every unset field with its default.
    pub fn set_defaults(&mut self) {
        self.logger.get_or_insert(false);
        self.output.get_or_insert_default();
        self.current_template.get_or_insert_with(|| DEFAULT_CURRENT_TEMPLATE.to_string());
        self.short_template.get_or_insert_with(|| DEFAULT_SHORT_TEMPLATE.to_string());
        self.forecast_template.get_or_insert_with(|| DEFAULT_FORECAST_TEMPLATE.to_string());
        self.forecast_hours.get_or_insert(DEFAULT_FORECAST_HOURS);
        self.cache_max_age_mins.get_or_insert(DEFAULT_CACHE_MAX_AGE_MINS);
    }

    /// Override fields with the ones set in `other`. Empty API keys and
    /// locations are ignored.
    pub fn merge(&mut self, other: Config) {
        if let Some(api_key) = other.api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(api_key);
        }
        if let Some(location) = other.location.filter(|l| !l.trim().is_empty()) {
            self.location = Some(location);
        }
        if other.logger.is_some() {
            self.logger = other.logger;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.current_template.is_some() {
            self.current_template = other.current_template;
        }
        if other.short_template.is_some() {
            self.short_template = other.short_template;
        }
        if other.forecast_template.is_some() {
            self.forecast_template = other.forecast_template;
        }
        if other.forecast_hours.is_some() {
            self.forecast_hours = other.forecast_hours;
        }
        if other.cache_max_age_mins.is_some() {
            self.cache_max_age_mins = other.cache_max_age_mins;
        }
    }

    /// Returns the API key, or an error with a hint when it's missing.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No WeatherAPI key configured.\n\
                 Hint: add `api_key = \"...\"` to your config file."
            )
        })
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }

    pub fn logger_enabled(&self) -> bool {
        self.logger.unwrap_or(false)
    }

    pub fn output(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }

    pub fn current_template(&self) -> &str {
        self.current_template.as_deref().unwrap_or(DEFAULT_CURRENT_TEMPLATE)
    }

    pub fn short_template(&self) -> &str {
        self.short_template.as_deref().unwrap_or(DEFAULT_SHORT_TEMPLATE)
    }

    pub fn forecast_template(&self) -> &str {
        self.forecast_template.as_deref().unwrap_or(DEFAULT_FORECAST_TEMPLATE)
    }

    pub fn forecast_hours(&self) -> usize {
        self.forecast_hours.unwrap_or(DEFAULT_FORECAST_HOURS)
    }

    /// Values too large for a `Duration` saturate instead of failing.
    pub fn cache_max_age(&self) -> Duration {
        let mins = self.cache_max_age_mins.unwrap_or(DEFAULT_CACHE_MAX_AGE_MINS);
        Duration::try_minutes(mins).unwrap_or(if mins < 0 { Duration::MIN } else { Duration::MAX })
    }
}

fn non_empty(value: String, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(anyhow!("{what} cannot be empty"));
    }
    Ok(value.to_string())
}

/// Where the default and the optional custom config live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub default: PathBuf,
    pub custom: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn new(default: PathBuf, custom: Option<PathBuf>) -> Self {
        Self { default, custom }
    }

    /// The platform default config path plus an optional custom one.
    pub fn resolve(custom: Option<PathBuf>) -> Result<Self> {
        Ok(Self::new(Self::default_file_path()?, custom))
    }

    /// Path to the default config file.
    pub fn default_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wayther", "wayther")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct StubPrompter {
        api_key: &'static str,
        location: &'static str,
        asked_for_key: Cell<bool>,
    }

    impl StubPrompter {
        fn new(api_key: &'static str, location: &'static str) -> Self {
            Self { api_key, location, asked_for_key: Cell::new(false) }
        }
    }

    impl ConfigPrompter for StubPrompter {
        fn api_key(&self) -> Result<String> {
            self.asked_for_key.set(true);
            Ok(self.api_key.to_string())
        }

        fn location(&self) -> Result<String> {
            Ok(self.location.to_string())
        }
    }

    fn write_config(dir: &TempDir, name: &str, config: &Config) -> PathBuf {
        let path = dir.path().join(name).join("config.toml");
        config.save_to(&path).expect("write config");
        path
    }

    fn base_config() -> Config {
        Config {
            api_key: Some("default_key".into()),
            location: Some("DefaultCity".into()),
            logger: Some(false),
            ..Config::default()
        }
    }

    #[test]
    fn loads_existing_default_config() {
        let dir = TempDir::new().expect("temp dir");
        let default = write_config(&dir, "wayther", &base_config());
        let prompter = StubPrompter::new("unused", "unused");

        let cfg = Config::load(&ConfigPaths::new(default, None), &prompter).expect("load");

        assert_eq!(cfg.api_key().expect("api key"), "default_key");
        assert_eq!(cfg.location(), Some("DefaultCity"));
        assert!(!cfg.logger_enabled());
        assert_eq!(cfg.output(), OutputFormat::Table);
        assert!(!prompter.asked_for_key.get());
    }

    #[test]
    fn custom_config_overrides_default() {
        let dir = TempDir::new().expect("temp dir");
        let default = write_config(&dir, "wayther", &base_config());
        let custom = write_config(
            &dir,
            "custom",
            &Config {
                api_key: Some("custom_key".into()),
                location: Some("CustomCity".into()),
                logger: Some(true),
                output: Some(OutputFormat::Json),
                short_template: Some("custom short".into()),
                ..Config::default()
            },
        );
        let prompter = StubPrompter::new("unused", "unused");

        let cfg = Config::load(&ConfigPaths::new(default, Some(custom)), &prompter).expect("load");

        assert_eq!(cfg.api_key().expect("api key"), "custom_key");
        assert_eq!(cfg.location(), Some("CustomCity"));
        assert!(cfg.logger_enabled());
        assert_eq!(cfg.output(), OutputFormat::Json);
        assert_eq!(cfg.short_template(), "custom short");
        assert_eq!(cfg.forecast_template(), DEFAULT_FORECAST_TEMPLATE);
    }

    #[test]
    fn missing_default_config_is_created_interactively() {
        let dir = TempDir::new().expect("temp dir");
        let default = dir.path().join("nested").join("config.toml");
        let prompter = StubPrompter::new("  secret  ", "Ghent\n");

        let cfg = Config::load(&ConfigPaths::new(default.clone(), None), &prompter).expect("load");

        assert!(prompter.asked_for_key.get());
        assert_eq!(cfg.api_key().expect("api key"), "secret");
        assert_eq!(cfg.location(), Some("Ghent"));
        assert!(default.exists());

        let on_disk = Config::load_from(&default).expect("reload");
        assert_eq!(on_disk.api_key.as_deref(), Some("secret"));
        assert_eq!(on_disk.output, None, "defaults are not written to disk");
    }

    #[test]
    fn missing_custom_config_is_created_without_api_key() {
        let dir = TempDir::new().expect("temp dir");
        let default = write_config(&dir, "wayther", &base_config());
        let custom = dir.path().join("custom").join("config.toml");
        let prompter = StubPrompter::new("unused", "CustomLocation");

        let cfg = Config::load(&ConfigPaths::new(default, Some(custom.clone())), &prompter)
            .expect("load");

        assert!(!prompter.asked_for_key.get());
        assert_eq!(cfg.location(), Some("CustomLocation"));
        assert_eq!(cfg.api_key().expect("api key"), "default_key");
        assert!(custom.exists());
    }

    #[test]
    fn empty_location_is_rejected_on_create() {
        let dir = TempDir::new().expect("temp dir");
        let default = dir.path().join("config.toml");
        let prompter = StubPrompter::new("key", "   ");

        let err = Config::load(&ConfigPaths::new(default.clone(), None), &prompter).unwrap_err();

        assert!(err.to_string().contains("Location cannot be empty"));
        assert!(!default.exists());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn set_defaults_fills_unset_fields() {
        let mut cfg = Config { forecast_hours: Some(8), ..Config::default() };
        cfg.set_defaults();

        assert_eq!(cfg.output, Some(OutputFormat::Table));
        assert_eq!(cfg.short_template.as_deref(), Some(DEFAULT_SHORT_TEMPLATE));
        assert_eq!(cfg.forecast_template.as_deref(), Some(DEFAULT_FORECAST_TEMPLATE));
        assert_eq!(cfg.forecast_hours, Some(8));
        assert_eq!(cfg.cache_max_age(), Duration::minutes(DEFAULT_CACHE_MAX_AGE_MINS));
    }

    #[test]
    fn merge_ignores_empty_key_and_location() {
        let mut cfg = base_config();
        cfg.merge(Config {
            api_key: Some(String::new()),
            location: Some(" ".into()),
            forecast_hours: Some(0),
            ..Config::default()
        });

        assert_eq!(cfg.api_key().expect("api key"), "default_key");
        assert_eq!(cfg.location(), Some("DefaultCity"));
        assert_eq!(cfg.forecast_hours(), 0);
    }

    #[test]
    fn huge_cache_max_age_saturates() {
        let cfg: Config = toml::from_str("cache_max_age_mins = 9223372036854775807").expect("parse");
        assert_eq!(cfg.cache_max_age(), Duration::MAX);

        let cfg: Config = toml::from_str("cache_max_age_mins = -9223372036854775808").expect("parse");
        assert_eq!(cfg.cache_max_age(), Duration::MIN);
    }

    #[test]
    fn api_key_errors_when_not_set() {
        let err = Config::default().api_key().unwrap_err();
        assert!(err.to_string().contains("No WeatherAPI key configured"));
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>().expect("json"), OutputFormat::Json);
        assert_eq!("table".parse::<OutputFormat>().expect("table"), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        if let Ok(path) = ConfigPaths::default_file_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}

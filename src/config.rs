//! Configuration management using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Endpoints;
use crate::repository::DieselDbContext;
use crate::scrapers::{
    HttpClient, ScrapeError, DEFAULT_DETAIL_URL_TEMPLATE, DEFAULT_LISTING_URL, DEFAULT_ROSTER_URL,
};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "part335.db";

/// Default config filename written by `init`.
pub const DEFAULT_CONFIG_FILENAME: &str = "part335.toml";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// User agent: unset for the crate's own, "impersonate" for a browser
    /// string, anything else verbatim.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay after each request in milliseconds.
    pub request_delay_ms: u64,
    pub roster_url: String,
    pub listing_url: String,
    /// Detail URL with `{discl_id}` and `{cert_number}` placeholders.
    pub detail_url_template: String,
    /// Detail pages fetched concurrently.
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("part335");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 250,
            roster_url: DEFAULT_ROSTER_URL.to_string(),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            detail_url_template: DEFAULT_DETAIL_URL_TEMPLATE.to_string(),
            workers: 1,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_url.is_some() || self.database_path().exists()
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        tracing::debug!("data_dir check: path={}", self.data_dir.display());
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> DieselDbContext {
        DieselDbContext::from_url(&self.database_url())
    }

    /// Build the HTTP client all scrapers share.
    pub fn create_http_client(&self) -> Result<HttpClient, ScrapeError> {
        HttpClient::with_user_agent(
            Duration::from_secs(self.request_timeout),
            Duration::from_millis(self.request_delay_ms),
            self.user_agent.as_deref(),
        )
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            roster_url: self.roster_url.clone(),
            listing_url: self.listing_url.clone(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay after each request in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url_template: Option<String>,
    /// Detail pages fetched concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    pub async fn load() -> Self {
        match prefer::load("part335").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(ref url) = self.roster_url {
            settings.roster_url = url.clone();
        }
        if let Some(ref url) = self.listing_url {
            settings.listing_url = url.clone();
        }
        if let Some(ref template) = self.detail_url_template {
            settings.detail_url_template = template.clone();
        }
        if let Some(workers) = self.workers {
            settings.workers = (workers as usize).max(1);
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory or database file (--target flag).
    pub target: Option<PathBuf>,
    /// Database URL from the command line or environment.
    pub database_url: Option<String>,
}

fn is_db_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
        || path.is_file()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Look for a config file in the data directory.
fn find_config_in(data_dir: &Path) -> Option<PathBuf> {
    ["toml", "yaml", "yml", "json"]
        .iter()
        .map(|ext| data_dir.join(format!("part335.{}", ext)))
        .find(|path| path.exists())
}

async fn load_file_config(options: &LoadOptions, data_dir: Option<&Path>) -> Config {
    // Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    // Config inside the target directory
    if let Some(config_path) = data_dir.and_then(find_config_in) {
        tracing::debug!("Found config in data dir: {}", config_path.display());
        return Config::load_from_path(&config_path)
            .await
            .unwrap_or_default();
    }

    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let target = options.target.as_deref().map(absolute);
    let (target_dir, target_file) = match target {
        Some(ref path) if is_db_file(path) => (
            path.parent().map(Path::to_path_buf),
            path.file_name().and_then(|n| n.to_str()).map(str::to_string),
        ),
        Some(ref path) => (Some(path.clone()), None),
        None => (None, None),
    };

    let config = load_file_config(&options, target_dir.as_deref()).await;
    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };
    config.apply_to_settings(&mut settings, &base_dir);

    // --target takes precedence over the config file
    if let Some(dir) = target_dir {
        settings.data_dir = dir;
    }
    if let Some(filename) = target_file {
        settings.database_filename = filename;
    }

    if let Some(url) = options.database_url.filter(|u| !u.is_empty()) {
        tracing::debug!("Using database URL from environment: {}", url);
        settings.database_url = Some(url);
    }

    (settings, config)
}

/// Default config file contents written by `init`.
pub fn default_config_toml(settings: &Settings) -> String {
    format!(
        r#"# part335 configuration

# Directory holding the database.
data_dir = "{data_dir}"
database = "{database}"

# Unset uses the built-in user agent; "impersonate" picks a browser string.
# user_agent = "impersonate"

request_timeout = {timeout}
request_delay_ms = {delay}

# Detail pages fetched concurrently.
workers = {workers}

roster_url = "{roster}"
listing_url = "{listing}"
detail_url_template = "{detail}"
"#,
        data_dir = settings.data_dir.display(),
        database = settings.database_filename,
        timeout = settings.request_timeout,
        delay = settings.request_delay_ms,
        workers = settings.workers,
        roster = settings.roster_url,
        listing = settings.listing_url,
        detail = settings.detail_url_template,
    )
}

/// Write the default config file unless one exists. Returns the path
/// written, or `None` if a file was already there.
pub fn write_default_config(settings: &Settings, path: &Path) -> std::io::Result<Option<PathBuf>> {
    if path.exists() {
        return Ok(None);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, default_config_toml(settings))?;
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_data_dir(PathBuf::from("/tmp/part335"));
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.request_delay_ms, 250);
        assert_eq!(settings.database_url(), "sqlite:/tmp/part335/part335.db");
    }

    #[test]
    fn test_database_url_override() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp/part335"));
        settings.database_url = Some("sqlite:/var/lib/part335.db".to_string());
        assert_eq!(settings.database_url(), "sqlite:/var/lib/part335.db");
        assert!(settings.database_exists());
    }

    #[test]
    fn test_parse_formats() {
        let toml = Config::parse("workers = 4\nuser_agent = \"impersonate\"", Path::new("a.toml"))
            .unwrap();
        assert_eq!(toml.workers, Some(4));
        assert_eq!(toml.user_agent.as_deref(), Some("impersonate"));

        let yaml = Config::parse("request_delay_ms: 1000\n", Path::new("a.yaml")).unwrap();
        assert_eq!(yaml.request_delay_ms, Some(1000));

        let json = Config::parse(r#"{"target": "data"}"#, Path::new("a.json")).unwrap();
        assert_eq!(json.data_dir.as_deref(), Some("data"));

        assert!(Config::parse("workers = ", Path::new("a.toml")).is_err());
    }

    #[test]
    fn test_apply_to_settings_resolves_relative_paths() {
        let config = Config {
            data_dir: Some("data".to_string()),
            workers: Some(0),
            listing_url: Some("http://localhost/listing".to_string()),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/etc/part335"));
        assert_eq!(settings.data_dir, PathBuf::from("/etc/part335/data"));
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.listing_url, "http://localhost/listing");
        assert_eq!(settings.roster_url, DEFAULT_ROSTER_URL);
    }

    #[test]
    fn test_resolve_absolute_path() {
        let config = Config::default();
        assert_eq!(
            config.resolve_path("/srv/part335", Path::new("/etc")),
            PathBuf::from("/srv/part335")
        );
    }

    #[tokio::test]
    async fn test_default_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().to_path_buf());
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);

        assert_eq!(
            write_default_config(&settings, &path).unwrap(),
            Some(path.clone())
        );
        assert_eq!(write_default_config(&settings, &path).unwrap(), None);

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.workers, Some(1));
        assert_eq!(config.detail_url_template.as_deref(), Some(DEFAULT_DETAIL_URL_TEMPLATE));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_target_db_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoadOptions {
            target: Some(dir.path().join("insiders.db")),
            ..Default::default()
        };
        let (settings, _) = load_settings_with_options(options).await;
        assert_eq!(settings.data_dir, dir.path());
        assert_eq!(settings.database_filename, "insiders.db");
    }
}

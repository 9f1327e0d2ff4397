use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::cache::DEFAULT_TTL;

// Include default configuration at compile time
const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");
const DEFAULT_CONFIG_FILE: &str = "govnews.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Hub,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub endpoint: String,
    pub dataset: String,
    pub config: String,
    pub split: String,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub sqlite_path: String,
    pub sqlite_table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            kind: SourceKind::Hub,
            endpoint: "https://datasets-server.huggingface.co".to_string(),
            dataset: "nitaibezerra/govbrnews-reduced".to_string(),
            config: "default".to_string(),
            split: "train".to_string(),
            page_size: 100,
            timeout_secs: 60,
            sqlite_path: "govbrnews.db".to_string(),
            sqlite_table: "articles".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig { limit: 20 }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }
}

/// Loads the explicit file if given, else `govnews.toml` in the working
/// directory, else the embedded defaults. Only an explicit file is required
/// to exist and parse.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let start_time = Instant::now();

    let config = if let Some(path) = config_path {
        info!(action = "load", component = "config_file", file_path = ?path, "Loading configuration from specified file");
        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Config::parse(&content).with_context(|| format!("Invalid config file {:?}", path))?
    } else {
        let default_file = Path::new(DEFAULT_CONFIG_FILE);
        let from_file = if default_file.exists() {
            info!(action = "load", component = "default_config_file", file_path = ?default_file, "Loading configuration from default file");
            match fs::read_to_string(default_file)
                .context("Failed to read default config file")
                .and_then(|content| Config::parse(&content))
            {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(action = "parse", component = "default_config_file", error = %format!("{:#}", e), "Ignoring invalid config file");
                    None
                }
            }
        } else {
            None
        };

        match from_file {
            Some(config) => config,
            None => {
                info!(
                    action = "load",
                    component = "embedded_config",
                    "Using embedded default configuration"
                );
                Config::parse(DEFAULT_CONFIG)?
            }
        }
    };

    info!(
        action = "complete",
        component = "config_loading",
        source_kind = ?config.source.kind,
        ttl_secs = config.cache.ttl_secs,
        duration_ms = start_time.elapsed().as_millis(),
        "Configuration loaded"
    );
    Ok(config)
}

pub fn init_default_config() -> Result<()> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);

    if default_file.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            DEFAULT_CONFIG_FILE
        );
    }

    fs::write(default_file, DEFAULT_CONFIG)?;
    println!("Created {} with default settings", DEFAULT_CONFIG_FILE);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        assert_eq!(Config::parse(DEFAULT_CONFIG).unwrap(), Config::default());
        assert_eq!(Config::default().cache.ttl(), Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::parse(
            "[source]\nkind = \"sqlite\"\nsqlite_path = \"/data/news.db\"\n\n[cache]\nttl_secs = 60\n",
        )
        .unwrap();
        assert_eq!(config.source.kind, SourceKind::Sqlite);
        assert_eq!(config.source.sqlite_path, "/data/news.db");
        assert_eq!(config.source.sqlite_table, "articles");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.display.limit, 20);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::parse("[cache]\nttl = 5\n").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nlimit = 5").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.display.limit, 5);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/govnews.toml"))).is_err());
    }
}

//! Configuration file (`~/.config/livescroll-reddit/config.toml`).
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! Command-line flags are applied on top in `main.rs`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

/// Which feeds to show and how to page through them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed selectors cycled with Tab; the first one is shown at startup.
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Items requested per page (Reddit caps this at 100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Start loading the next page this many rows before the end.
    #[serde(default = "default_prefetch_threshold")]
    pub prefetch_threshold: usize,
}

fn default_selectors() -> Vec<String> {
    vec!["/r/aww".into(), "/r/funny".into(), "/r/gifs".into()]
}

fn default_base_url() -> String {
    "https://www.reddit.com".into()
}

fn default_page_size() -> u32 {
    25
}

fn default_prefetch_threshold() -> usize {
    5
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            selectors: default_selectors(),
            base_url: default_base_url(),
            page_size: default_page_size(),
            prefetch_threshold: default_prefetch_threshold(),
        }
    }
}

/// HTTP client settings shared by page and thumbnail fetches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Size of the thumbnail fetch pool.
    #[serde(default = "default_thumbnail_workers")]
    pub thumbnail_workers: usize,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("livescroll-reddit/{}", env!("CARGO_PKG_VERSION"))
}

fn default_thumbnail_workers() -> usize {
    4
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            thumbnail_workers: default_thumbnail_workers(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Image shown for posts without a usable thumbnail.  Falls back to a
    /// built-in tile when unset or unreadable.
    #[serde(default)]
    pub placeholder: Option<PathBuf>,
}

impl Config {
    /// `<config dir>/livescroll-reddit/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("livescroll-reddit").join("config.toml"))
    }

    /// Load configuration from `path`, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path:?}"))?;
        config.validate().context("Invalid config")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.selectors.is_empty() {
            bail!("feed.selectors must name at least one feed");
        }
        if !(1..=100).contains(&self.feed.page_size) {
            bail!("feed.page_size must be between 1 and 100, got {}", self.feed.page_size);
        }
        if self.network.thumbnail_workers == 0 {
            bail!("network.thumbnail_workers must be at least 1");
        }
        if self.network.timeout_secs == 0 {
            bail!("network.timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.feed.selectors, vec!["/r/aww", "/r/funny", "/r/gifs"]);
        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[feed]
selectors = ["/r/rust"]

[network]
thumbnail_workers = 8
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed.selectors, vec!["/r/rust"]);
        assert_eq!(config.feed.base_url, "https://www.reddit.com");
        assert_eq!(config.network.thumbnail_workers, 8);
        assert_eq!(config.network.timeout_secs, 10);
        assert!(config.thumbnails.placeholder.is_none());
    }

    #[test]
    fn placeholder_path_is_read() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[thumbnails]\nplaceholder = \"/tmp/placeholder.png\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.thumbnails.placeholder, Some(PathBuf::from("/tmp/placeholder.png")));
    }

    #[test]
    fn out_of_range_page_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[feed]\npage_size = 500\n");
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("page_size"));
    }

    #[test]
    fn empty_selectors_are_rejected() {
        let mut config = Config::default();
        config.feed.selectors.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_workers_are_rejected() {
        let mut config = Config::default();
        config.network.thumbnail_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[feed\nselectors = ");
        assert!(Config::load(&path).is_err());
    }
}

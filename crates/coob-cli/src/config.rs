//! Layered CLI configuration.
//!
//! Precedence, highest first: command-line flags, `COOB_*` environment
//! variables (both handled by clap), the TOML config file, built-in
//! defaults.

use anyhow::{Context, Result, bail};
use coob_core::FetchSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the project-local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "coob.toml";

/// Output directory used when none is configured.
pub const DEFAULT_OUT_DIR: &str = "out";

/// Contents of a `coob.toml` / `config.toml` file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub catalog_url: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the config file.
    ///
    /// An explicit path must exist. Otherwise `./coob.toml` is tried, then
    /// the user config. No file at all yields the empty config.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match discover() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// First existing implicit config file.
fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    coob_core::user_config_path().filter(|p| p.is_file())
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub catalog_url: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_url: String,
    pub out_dir: PathBuf,
    pub fetch: FetchSettings,
}

impl Config {
    /// Merge the layers.
    ///
    /// Fails if no layer provides a catalog URL.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let Some(catalog_url) = overrides
            .catalog_url
            .or(file.catalog_url)
            .filter(|url| !url.trim().is_empty())
        else {
            bail!(
                "No catalog URL configured. Pass --catalog-url, set COOB_CATALOG_URL, \
                 or add catalog_url to {LOCAL_CONFIG_FILE}"
            );
        };

        let out_dir = overrides
            .out_dir
            .or(file.out_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

        let mut fetch = FetchSettings::default();
        if let Some(secs) = overrides.timeout_secs.or(file.timeout_secs) {
            fetch = fetch.with_read_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = file.connect_timeout_secs {
            fetch = fetch.with_connect_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            catalog_url,
            out_dir,
            fetch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file() {
        let file = FileConfig::from_toml(
            r#"
catalog_url = "https://coobs.example.com/repo"
out_dir = "build/out"
timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(file.catalog_url.as_deref(), Some("https://coobs.example.com/repo"));
        assert_eq!(file.out_dir, Some(PathBuf::from("build/out")));
        assert_eq!(file.timeout_secs, Some(30));
        assert_eq!(file.connect_timeout_secs, None);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(FileConfig::from_toml("catalog = \"x\"").is_err());
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = FileConfig {
            catalog_url: Some("https://file".into()),
            out_dir: Some("file-out".into()),
            timeout_secs: Some(10),
            connect_timeout_secs: Some(3),
        };
        let overrides = Overrides {
            catalog_url: Some("https://flag".into()),
            out_dir: None,
            timeout_secs: Some(99),
        };

        let config = Config::resolve(overrides, file).unwrap();
        assert_eq!(config.catalog_url, "https://flag");
        assert_eq!(config.out_dir, PathBuf::from("file-out"));
        assert_eq!(config.fetch.read_timeout, Duration::from_secs(99));
        assert_eq!(config.fetch.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_defaults() {
        let overrides = Overrides {
            catalog_url: Some("https://flag".into()),
            ..Overrides::default()
        };
        let config = Config::resolve(overrides, FileConfig::default()).unwrap();
        assert_eq!(config.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert_eq!(config.fetch.read_timeout, FetchSettings::DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_missing_catalog_url() {
        let err = Config::resolve(Overrides::default(), FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No catalog URL"));

        let blank = Overrides {
            catalog_url: Some("  ".into()),
            ..Overrides::default()
        };
        assert!(Config::resolve(blank, FileConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(FileConfig::load(Some(&missing)).await.is_err());

        let present = dir.path().join("coob.toml");
        std::fs::write(&present, "out_dir = \"x\"\n").unwrap();
        let file = FileConfig::load(Some(&present)).await.unwrap();
        assert_eq!(file.out_dir, Some(PathBuf::from("x")));
    }
}

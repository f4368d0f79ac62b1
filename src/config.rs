//! Shell configuration: built-in defaults, optionally overridden by a TOML file.

use crate::campaign::CampaignDate;
use crate::error::{DmshError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up inside the default data directory.
pub const CONFIG_FILE: &str = "dmsh.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where campaign saves live. A leading `~` means `$HOME`.
    pub data_path: PathBuf,
    pub campaign_name: String,
    /// Date a brand new campaign starts on.
    pub campaign_start_date: CampaignDate,
    pub croaker: CroakerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CroakerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("~/.dnd"),
            campaign_name: "deadsands".to_string(),
            campaign_start_date: CampaignDate {
                era: 2,
                year: 1125,
                month: 5,
                day: 25,
            },
            croaker: CroakerConfig::default(),
        }
    }
}

impl Default for CroakerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8003,
        }
    }
}

impl Config {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DmshError::Config(format!("{}: {e}", path.display())))?;
        Ok(toml::from_str(&text)?)
    }

    /// Load `explicit` if given, else the default config file when it exists,
    /// else the built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Self::default().data_dir().join(CONFIG_FILE);
        if fallback.is_file() {
            log::info!("using config {}", fallback.display());
            Self::load(&fallback)
        } else {
            Ok(Self::default())
        }
    }

    /// `data_path` with a leading `~` expanded from `$HOME`.
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.data_path, std::env::var_os("HOME").map(PathBuf::from))
    }
}

fn expand_home(path: &Path, home: Option<PathBuf>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_match_deadsands_campaign() {
        let config = Config::default();
        assert_eq!(config.campaign_name, "deadsands");
        assert_eq!(config.campaign_start_date.to_string(), "2.1125.5.25");
        assert_eq!(config.data_path, PathBuf::from("~/.dnd"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            campaign_name = "frostmaw"

            [croaker]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.campaign_name, "frostmaw");
        assert_eq!(config.croaker.port, 9000);
        assert_eq!(config.croaker.host, "localhost");
        assert_eq!(config.campaign_start_date, Config::default().campaign_start_date);
    }

    #[test]
    fn test_bad_start_date_is_a_parse_error() {
        let err = toml::from_str::<Config>("campaign_start_date = \"soon\"").unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn test_load_reads_file_and_reports_missing_one() {
        let dir = std::env::temp_dir().join(format!("dmsh_config_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join(CONFIG_FILE);
        fs::write(&file, "data_path = \"/srv/dnd\"\n").unwrap();

        let config = Config::load_or_default(Some(&file)).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/srv/dnd"));

        let missing = Config::load(&dir.join("nope.toml")).unwrap_err();
        assert!(matches!(missing, DmshError::Config(_)));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_tilde_expands_from_home() {
        let home = Some(PathBuf::from("/home/dm"));
        assert_eq!(expand_home(Path::new("~/.dnd"), home.clone()), PathBuf::from("/home/dm/.dnd"));
        assert_eq!(expand_home(Path::new("/abs"), home), PathBuf::from("/abs"));
        assert_eq!(expand_home(Path::new("~/.dnd"), None), PathBuf::from("~/.dnd"));
    }
}

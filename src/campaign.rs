//! Campaign state as seen by the shell, and the store that loads and saves it.
//!
//! The shell only needs a handful of values out of a campaign: the date, where
//! the party is and its level. Calendar arithmetic and richer save formats
//! belong to other tools; [`CampaignStore`] is the seam they plug into.

use crate::cache::{Cache, keys};
use crate::error::{DmshError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::LazyLock;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)\.(\d+)$").expect("date pattern is valid")
});

/// A campaign date written `era.year.month.day`, e.g. `2.1125.5.25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CampaignDate {
    pub era: u32,
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl FromStr for CampaignDate {
    type Err = DmshError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DmshError::InvalidDate(s.to_string());
        let caps = DATE_RE.captures(s.trim()).ok_or_else(invalid)?;
        let field = |i: usize| caps[i].parse::<u32>().map_err(|_| invalid());
        let date = CampaignDate {
            era: field(1)?,
            year: field(2)?,
            month: field(3)?,
            day: field(4)?,
        };
        if date.month == 0 || date.day == 0 {
            return Err(invalid());
        }
        Ok(date)
    }
}

impl TryFrom<String> for CampaignDate {
    type Error = DmshError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CampaignDate> for String {
    fn from(date: CampaignDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for CampaignDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.era, self.year, self.month, self.day)
    }
}

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub name: String,
    pub date: CampaignDate,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_level")]
    pub level: u8,
}

fn default_level() -> u8 {
    MIN_LEVEL
}

impl CampaignState {
    /// A campaign that has not been played yet.
    pub fn fresh(name: &str, start_date: CampaignDate) -> Self {
        Self {
            name: name.to_string(),
            date: start_date,
            location: String::new(),
            level: MIN_LEVEL,
        }
    }

    /// Publish the state into the shared cache.
    pub fn store_in(&self, cache: &Cache) {
        cache.set(keys::CAMPAIGN_NAME, self.name.clone());
        cache.set(keys::DATE, self.date);
        cache.set(keys::LOCATION, self.location.clone());
        cache.set(keys::LEVEL, self.level);
    }

    /// Read the state back out of the cache.
    ///
    /// Returns `None` when the cache was never seeded with a campaign.
    pub fn from_cache(cache: &Cache) -> Option<Self> {
        Some(Self {
            name: cache.get(keys::CAMPAIGN_NAME)?,
            date: cache.get(keys::DATE)?,
            location: cache.get(keys::LOCATION).unwrap_or_default(),
            level: cache.get(keys::LEVEL).unwrap_or(MIN_LEVEL),
        })
    }
}

/// Loads and saves campaigns.
pub trait CampaignStore {
    /// Load campaign `name` from `path`, or start a new one at `start_date`.
    fn load(&self, path: &Path, name: &str, start_date: CampaignDate) -> Result<CampaignState>;

    /// Save the campaign, returning where it went and how many backups exist.
    fn save(&self, state: &CampaignState, path: &Path, name: &str) -> Result<(PathBuf, usize)>;
}

/// Stores each campaign as `<path>/<name>.toml`, keeping every previous save
/// under `<path>/<name>.backups/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlStore;

impl TomlStore {
    fn file(path: &Path, name: &str) -> PathBuf {
        path.join(format!("{name}.toml"))
    }

    fn backup_dir(path: &Path, name: &str) -> PathBuf {
        path.join(format!("{name}.backups"))
    }

    /// Highest `n` among the `<name>.<n>.toml` files in `dir`, or 0.
    fn last_backup(dir: &Path, name: &str) -> Result<usize> {
        let prefix = format!("{name}.");
        let mut last = 0;
        for entry in fs::read_dir(dir)? {
            let file_name = entry?.file_name();
            let number = file_name
                .to_str()
                .and_then(|f| f.strip_prefix(&prefix))
                .and_then(|f| f.strip_suffix(".toml"))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(n) = number {
                last = last.max(n);
            }
        }
        Ok(last)
    }

    /// Copy `current` into a new numbered backup and return how many backups
    /// exist afterwards. Existing backups are never overwritten.
    fn backup(path: &Path, name: &str, current: &Path) -> Result<usize> {
        let dir = Self::backup_dir(path, name);
        fs::create_dir_all(&dir)?;
        let target = dir.join(format!("{name}.{}.toml", Self::last_backup(&dir, name)? + 1));
        let mut out = OpenOptions::new().write(true).create_new(true).open(&target)?;
        io::copy(&mut File::open(current)?, &mut out)?;
        log::debug!("backed up {} to {}", current.display(), target.display());
        Ok(fs::read_dir(&dir)?.filter_map(|e| e.ok()).count())
    }
}

impl CampaignStore for TomlStore {
    fn load(&self, path: &Path, name: &str, start_date: CampaignDate) -> Result<CampaignState> {
        let file = Self::file(path, name);
        if !file.exists() {
            log::info!("no saved campaign at {}; starting fresh", file.display());
            return Ok(CampaignState::fresh(name, start_date));
        }
        let text = fs::read_to_string(&file)?;
        let state: CampaignState = toml::from_str(&text)?;
        log::info!("loaded campaign {name} from {}", file.display());
        Ok(state)
    }

    fn save(&self, state: &CampaignState, path: &Path, name: &str) -> Result<(PathBuf, usize)> {
        fs::create_dir_all(path)?;
        let file = Self::file(path, name);
        let backups = if file.exists() {
            Self::backup(path, name, &file)?
        } else {
            0
        };
        fs::write(&file, toml::to_string(state)?)?;
        log::info!("saved campaign {name} to {} ({backups} backups)", file.display());
        Ok((file, backups))
    }
}

/// Keeps saved campaigns in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    saved: Rc<RefCell<Vec<CampaignState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to everything saved so far, oldest first.
    pub fn saved(&self) -> Rc<RefCell<Vec<CampaignState>>> {
        Rc::clone(&self.saved)
    }
}

impl CampaignStore for MemoryStore {
    /// The most recent save of `name`, or a fresh campaign.
    fn load(&self, _path: &Path, name: &str, start_date: CampaignDate) -> Result<CampaignState> {
        Ok(self
            .saved
            .borrow()
            .iter()
            .rev()
            .find(|state| state.name == name)
            .cloned()
            .unwrap_or_else(|| CampaignState::fresh(name, start_date)))
    }

    fn save(&self, state: &CampaignState, path: &Path, name: &str) -> Result<(PathBuf, usize)> {
        let mut saved = self.saved.borrow_mut();
        let backups = saved.len();
        saved.push(state.clone());
        Ok((path.join(name), backups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let p = std::env::temp_dir().join(format!("dmsh_campaign_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p).expect("failed to create temp dir");
        p
    }

    fn start() -> CampaignDate {
        "2.1125.5.25".parse().unwrap()
    }

    #[test]
    fn test_date_parses_and_displays() {
        let date = start();
        assert_eq!(
            date,
            CampaignDate {
                era: 2,
                year: 1125,
                month: 5,
                day: 25
            }
        );
        assert_eq!(date.to_string(), "2.1125.5.25");
        assert_eq!(" 2.1125.6.1 ".parse::<CampaignDate>().unwrap().to_string(), "2.1125.6.1");
    }

    #[test]
    fn test_bad_dates_are_rejected() {
        for bad in ["", "tomorrow", "2.1125.5", "2.1125.5.25.1", "2.1125.0.1", "2.1125.5.0", "2.-1.5.5"] {
            assert!(
                matches!(bad.parse::<CampaignDate>(), Err(DmshError::InvalidDate(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_state_round_trips_through_cache() {
        let cache = Cache::new();
        assert!(CampaignState::from_cache(&cache).is_none());

        let mut state = CampaignState::fresh("deadsands", start());
        state.location = "Oasis".into();
        state.level = 3;
        state.store_in(&cache);

        assert_eq!(CampaignState::from_cache(&cache), Some(state));
    }

    #[test]
    fn test_toml_store_missing_file_starts_fresh() {
        let dir = make_unique_temp_dir();
        let state = TomlStore.load(&dir, "deadsands", start()).unwrap();
        assert_eq!(state, CampaignState::fresh("deadsands", start()));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_toml_store_saves_loads_and_counts_backups() {
        let dir = make_unique_temp_dir();
        let mut state = CampaignState::fresh("deadsands", start());

        let (file, backups) = TomlStore.save(&state, &dir, "deadsands").unwrap();
        assert_eq!(file, dir.join("deadsands.toml"));
        assert_eq!(backups, 0);

        state.date = "2.1125.6.1".parse().unwrap();
        state.location = "Salt Flats".into();
        let (_, backups) = TomlStore.save(&state, &dir, "deadsands").unwrap();
        assert_eq!(backups, 1);
        let (_, backups) = TomlStore.save(&state, &dir, "deadsands").unwrap();
        assert_eq!(backups, 2);

        let loaded = TomlStore.load(&dir, "deadsands", start()).unwrap();
        assert_eq!(loaded, state);

        let text = fs::read_to_string(&file).unwrap();
        assert!(text.contains("date = \"2.1125.6.1\""));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_toml_store_reports_corrupt_file() {
        let dir = make_unique_temp_dir();
        fs::write(dir.join("deadsands.toml"), "date = [").unwrap();
        let err = TomlStore.load(&dir, "deadsands", start()).unwrap_err();
        assert!(matches!(err, DmshError::TomlParse(_)));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_store_records_saves() {
        let store = MemoryStore::new();
        let saved = store.saved();
        let state = CampaignState::fresh("deadsands", start());

        let (_, first) = store.save(&state, Path::new("/tmp"), "deadsands").unwrap();
        let (_, second) = store.save(&state, Path::new("/tmp"), "deadsands").unwrap();
        assert_eq!((first, second), (0, 1));
        assert_eq!(saved.borrow().len(), 2);
    }

    #[test]
    fn test_memory_store_loads_latest_save() {
        let store = MemoryStore::new();
        let fresh = store.load(Path::new("/tmp"), "deadsands", start()).unwrap();
        assert_eq!(fresh, CampaignState::fresh("deadsands", start()));

        let mut state = fresh.clone();
        state.level = 4;
        store.save(&fresh, Path::new("/tmp"), "deadsands").unwrap();
        store.save(&state, Path::new("/tmp"), "deadsands").unwrap();
        assert_eq!(store.load(Path::new("/tmp"), "deadsands", start()).unwrap(), state);
    }

    #[test]
    fn test_toml_store_never_overwrites_a_backup() {
        let dir = make_unique_temp_dir();
        let mut state = CampaignState::fresh("ds", start());
        for level in 1..=4 {
            state.level = level;
            TomlStore.save(&state, &dir, "ds").unwrap();
        }
        let backups = dir.join("ds.backups");
        let third = fs::read_to_string(backups.join("ds.3.toml")).unwrap();
        assert!(third.contains("level = 3"));

        fs::remove_file(backups.join("ds.1.toml")).unwrap();
        state.level = 5;
        let (_, count) = TomlStore.save(&state, &dir, "ds").unwrap();

        assert_eq!(count, 3);
        assert_eq!(fs::read_to_string(backups.join("ds.3.toml")).unwrap(), third);
        let fourth = fs::read_to_string(backups.join("ds.4.toml")).unwrap();
        assert!(fourth.contains("level = 4"));
        let _ = fs::remove_dir_all(dir);
    }
}

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{SettingKey, SettingValue, Settings};
use crate::paths;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot determine the configuration directory")]
    NoConfigDir,
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Persistence backend for [`Settings`].
pub trait ConfigService {
    fn load(&self) -> Result<Settings, ConfigError>;

    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;

    fn get(&self, key: SettingKey) -> Result<SettingValue, ConfigError> {
        Ok(self.load()?.get(key))
    }

    /// Read-modify-write of a single key.
    fn set(&self, key: SettingKey, value: SettingValue) -> Result<(), ConfigError> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings.clamped())
    }

    fn reset_to_defaults(&self) -> Result<(), ConfigError> {
        self.save(&Settings::default())
    }
}

/// Settings stored as one flat JSON object on disk.
///
/// A missing file means defaults. Each key is read on its own: a key that is
/// missing or holds an unusable value takes its default, out-of-range
/// numbers are clamped, and unknown keys are ignored.
#[derive(Debug, Clone)]
pub struct JsonConfigService {
    path: PathBuf,
}

impl JsonConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Service rooted at the platform config directory.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        paths::settings_path()
            .map(Self::new)
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigService for JsonConfigService {
    fn load(&self) -> Result<Settings, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let record: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(Settings::from_record(&record))
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    saved: Option<Settings>,
    save_count: usize,
    failing: bool,
}

/// Config service kept in memory; clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigService {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let service = Self::default();
        service.state.borrow_mut().saved = Some(settings);
        service
    }

    pub fn saved(&self) -> Option<Settings> {
        self.state.borrow().saved.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state.borrow().save_count
    }

    pub fn fail_saves(&self, fail: bool) {
        self.state.borrow_mut().failing = fail;
    }
}

impl ConfigService for MemoryConfigService {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.state.borrow().saved.clone().unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let mut state = self.state.borrow_mut();
        if state.failing {
            return Err(ConfigError::Io {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::Other, "save disabled"),
            });
        }
        state.saved = Some(settings.clone());
        state.save_count += 1;
        Ok(())
    }
}

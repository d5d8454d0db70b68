//! User preferences and the store that persists them.
//!
//! Settings are a flat record. Every mutation goes through [`SettingsStore`],
//! which clamps the value, applies it, and flushes the whole record to its
//! [`ConfigService`] immediately. There is no batching and no rollback: a
//! failed flush is logged and reported, the in-memory value stays.

mod config;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

pub use config::{ConfigError, ConfigService, JsonConfigService, MemoryConfigService};

pub const FONT_SIZE_RANGE: (u16, u16) = (8, 48);
pub const AUTOSAVE_DELAY_RANGE_MS: (u64, u64) = (200, 60_000);
pub const TAB_SIZE_RANGE: (u8, u8) = (1, 8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Dark,
    Light,
    /// Inherit the terminal's own colors.
    Terminal,
}

impl ThemeId {
    pub const ALL: [ThemeId; 3] = [ThemeId::Dark, ThemeId::Light, ThemeId::Terminal];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::Dark => "dark",
            ThemeId::Light => "light",
            ThemeId::Terminal => "terminal",
        }
    }

    /// Next theme in [`ThemeId::ALL`], wrapping around.
    pub fn cycle(self, forward: bool) -> ThemeId {
        let idx = ThemeId::ALL.iter().position(|t| *t == self).unwrap_or(0);
        let len = ThemeId::ALL.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        ThemeId::ALL[next]
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeId::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub font_size: u16,
    pub font_family: String,
    pub theme: ThemeId,
    pub autosave_enabled: bool,
    pub autosave_delay_ms: u64,
    pub tab_size: u8,
    pub sync_scroll: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: 14,
            font_family: "monospace".to_string(),
            theme: ThemeId::Dark,
            autosave_enabled: true,
            autosave_delay_ms: 1000,
            tab_size: 2,
            sync_scroll: true,
        }
    }
}

impl Settings {
    /// Brings every numeric field back into its allowed range.
    pub fn clamped(mut self) -> Self {
        self.font_size = self.font_size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        self.autosave_delay_ms = self
            .autosave_delay_ms
            .clamp(AUTOSAVE_DELAY_RANGE_MS.0, AUTOSAVE_DELAY_RANGE_MS.1);
        self.tab_size = self.tab_size.clamp(TAB_SIZE_RANGE.0, TAB_SIZE_RANGE.1);
        if self.font_family.trim().is_empty() {
            self.font_family = Settings::default().font_family;
        }
        self
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::FontSize => SettingValue::Number(self.font_size as u64),
            SettingKey::FontFamily => SettingValue::Text(self.font_family.clone()),
            SettingKey::Theme => SettingValue::Text(self.theme.as_str().to_string()),
            SettingKey::AutosaveEnabled => SettingValue::Bool(self.autosave_enabled),
            SettingKey::AutosaveDelayMs => SettingValue::Number(self.autosave_delay_ms),
            SettingKey::TabSize => SettingValue::Number(self.tab_size as u64),
            SettingKey::SyncScroll => SettingValue::Bool(self.sync_scroll),
        }
    }

    /// Builds settings from a persisted record one key at a time. Missing
    /// keys, and keys whose value cannot be used, keep their default.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let mut settings = Settings::default();
        for key in SettingKey::ALL {
            let Some(raw) = record.get(key.name()) else {
                continue;
            };
            let applied = SettingValue::from_json(raw)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: key.name(),
                    value: raw.to_string(),
                })
                .and_then(|value| settings.set(key, value));
            if let Err(e) = applied {
                tracing::warn!(error = %e, "ignoring setting, using default");
            }
        }
        settings.clamped()
    }

    /// Assigns one field. The value must have the key's type. Numbers too
    /// large for the field saturate; the result is not clamped here.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<(), ConfigError> {
        let mismatch = || ConfigError::InvalidValue {
            key: key.name(),
            value: value.to_string(),
        };
        match (key, &value) {
            (SettingKey::FontSize, SettingValue::Number(n)) => {
                self.font_size = u16::try_from(*n).unwrap_or(u16::MAX);
            }
            (SettingKey::FontFamily, SettingValue::Text(s)) => self.font_family = s.clone(),
            (SettingKey::Theme, SettingValue::Text(s)) => {
                self.theme = s.parse().map_err(|_| mismatch())?;
            }
            (SettingKey::AutosaveEnabled, SettingValue::Bool(b)) => self.autosave_enabled = *b,
            (SettingKey::AutosaveDelayMs, SettingValue::Number(n)) => self.autosave_delay_ms = *n,
            (SettingKey::TabSize, SettingValue::Number(n)) => {
                self.tab_size = u8::try_from(*n).unwrap_or(u8::MAX);
            }
            (SettingKey::SyncScroll, SettingValue::Bool(b)) => self.sync_scroll = *b,
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    FontSize,
    FontFamily,
    Theme,
    AutosaveEnabled,
    AutosaveDelayMs,
    TabSize,
    SyncScroll,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::Theme,
        SettingKey::FontSize,
        SettingKey::FontFamily,
        SettingKey::TabSize,
        SettingKey::AutosaveEnabled,
        SettingKey::AutosaveDelayMs,
        SettingKey::SyncScroll,
    ];

    /// Key name in the persisted record.
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::FontSize => "font_size",
            SettingKey::FontFamily => "font_family",
            SettingKey::Theme => "theme",
            SettingKey::AutosaveEnabled => "autosave_enabled",
            SettingKey::AutosaveDelayMs => "autosave_delay_ms",
            SettingKey::TabSize => "tab_size",
            SettingKey::SyncScroll => "sync_scroll",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingKey::FontSize => "Font size",
            SettingKey::FontFamily => "Font family",
            SettingKey::Theme => "Theme",
            SettingKey::AutosaveEnabled => "Autosave",
            SettingKey::AutosaveDelayMs => "Autosave delay (ms)",
            SettingKey::TabSize => "Tab size",
            SettingKey::SyncScroll => "Sync scroll",
        }
    }

    pub fn from_name(name: &str) -> Option<SettingKey> {
        SettingKey::ALL.into_iter().find(|k| k.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl SettingValue {
    /// Reads a value from the settings file. Negative integers read as zero
    /// so clamping can bring them into range; fractions are rejected.
    pub fn from_json(value: &Value) -> Option<SettingValue> {
        match value {
            Value::Bool(b) => Some(SettingValue::Bool(*b)),
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_i64().map(|_| 0))
                .map(SettingValue::Number),
            Value::String(s) => Some(SettingValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(true) => f.write_str("on"),
            SettingValue::Bool(false) => f.write_str("off"),
            SettingValue::Number(n) => write!(f, "{n}"),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

const FONT_FAMILIES: &[&str] = &["monospace", "Fira Code", "JetBrains Mono", "Menlo", "Consolas"];

/// Owns the live settings and flushes every change through the config service.
pub struct SettingsStore {
    settings: Settings,
    config: Box<dyn ConfigService>,
}

impl SettingsStore {
    /// Loads settings once. A load failure falls back to defaults.
    pub fn load(config: Box<dyn ConfigService>) -> Self {
        let settings = match config.load() {
            Ok(s) => s.clamped(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load settings, using defaults");
                Settings::default()
            }
        };
        Self { settings, config }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Sets one key, clamps, and persists immediately.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<(), ConfigError> {
        let mut next = self.settings.clone();
        next.set(key, value)?;
        self.settings = next.clamped();
        tracing::debug!(key = key.name(), value = %self.settings.get(key), "setting changed");
        self.persist()
    }

    pub fn set_theme(&mut self, theme: ThemeId) -> Result<(), ConfigError> {
        self.set(SettingKey::Theme, SettingValue::Text(theme.as_str().to_string()))
    }

    pub fn set_font_size(&mut self, size: u16) -> Result<(), ConfigError> {
        self.set(SettingKey::FontSize, SettingValue::Number(size as u64))
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.set(SettingKey::AutosaveEnabled, SettingValue::Bool(enabled))
    }

    pub fn set_autosave_delay_ms(&mut self, delay: u64) -> Result<(), ConfigError> {
        self.set(SettingKey::AutosaveDelayMs, SettingValue::Number(delay))
    }

    pub fn set_tab_size(&mut self, size: u8) -> Result<(), ConfigError> {
        self.set(SettingKey::TabSize, SettingValue::Number(size as u64))
    }

    pub fn set_sync_scroll(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.set(SettingKey::SyncScroll, SettingValue::Bool(enabled))
    }

    /// Steps a setting one notch: toggles booleans, cycles themes and font
    /// families, nudges numbers by a key-specific step.
    pub fn adjust(&mut self, key: SettingKey, forward: bool) -> Result<(), ConfigError> {
        let s = &self.settings;
        let value = match key {
            SettingKey::AutosaveEnabled => SettingValue::Bool(!s.autosave_enabled),
            SettingKey::SyncScroll => SettingValue::Bool(!s.sync_scroll),
            SettingKey::Theme => SettingValue::Text(s.theme.cycle(forward).as_str().to_string()),
            SettingKey::FontFamily => {
                let idx = FONT_FAMILIES
                    .iter()
                    .position(|f| *f == s.font_family)
                    .unwrap_or(0);
                let len = FONT_FAMILIES.len();
                let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
                SettingValue::Text(FONT_FAMILIES[next].to_string())
            }
            SettingKey::FontSize => SettingValue::Number(step(s.font_size as u64, 1, forward)),
            SettingKey::TabSize => SettingValue::Number(step(s.tab_size as u64, 1, forward)),
            SettingKey::AutosaveDelayMs => {
                SettingValue::Number(step(s.autosave_delay_ms, 250, forward))
            }
        };
        self.set(key, value)
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.settings = Settings::default();
        tracing::info!("settings reset to defaults");
        self.config.reset_to_defaults()
    }

    fn persist(&mut self) -> Result<(), ConfigError> {
        self.config.save(&self.settings).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist settings");
        })
    }
}

fn step(value: u64, by: u64, forward: bool) -> u64 {
    if forward {
        value.saturating_add(by)
    } else {
        value.saturating_sub(by)
    }
}

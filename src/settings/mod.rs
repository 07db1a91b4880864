//! User settings: a single complete object persisted under one key.
//!
//! The store never merges. Callers build the full new object (usually by
//! taking [`SettingsStore::get`] and changing fields with
//! [`Settings::set_field`]) and hand it to [`SettingsStore::replace`].

pub mod cloak;

use std::rc::Rc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::constants::SETTINGS_KEY;
use crate::navigation::classify;
use crate::store::{KvStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

/// How long history is retained. Enforcement belongs to whoever schedules
/// pruning; see [`AutoClearHistory::retention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoClearHistory {
    Never,
    Daily,
    Weekly,
    Exit,
}

impl AutoClearHistory {
    /// Maximum record age for time-based policies. `Never` and `Exit` have
    /// no age limit.
    pub fn retention(&self) -> Option<Duration> {
        match self {
            AutoClearHistory::Daily => Some(Duration::days(1)),
            AutoClearHistory::Weekly => Some(Duration::days(7)),
            AutoClearHistory::Never | AutoClearHistory::Exit => None,
        }
    }
}

/// How navigation is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMethod {
    Auto,
    Direct,
    Stealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub font_size: FontSize,
    pub motion_effects: bool,
    pub save_history: bool,
    pub auto_clear_history: AutoClearHistory,
    pub preloading: bool,
    pub proxy_method: ProxyMethod,
    /// Premium: route through this proxy base instead of the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_proxy_base: Option<String>,
    /// Premium: ask the proxy to strip ads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_block: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            font_size: FontSize::Medium,
            motion_effects: true,
            save_history: true,
            auto_clear_history: AutoClearHistory::Never,
            preloading: true,
            proxy_method: ProxyMethod::Auto,
            custom_proxy_base: None,
            ad_block: None,
        }
    }
}

/// Rejected `key=value` edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownField(String),
    #[error("invalid value '{value}' for setting '{field}'")]
    InvalidValue { field: String, value: String },
}

impl Settings {
    /// Names accepted by [`Settings::set_field`].
    pub const FIELDS: &'static [&'static str] = &[
        "theme",
        "font-size",
        "motion-effects",
        "save-history",
        "auto-clear-history",
        "preloading",
        "proxy-method",
        "custom-proxy-base",
        "ad-block",
    ];

    /// Change one field from its textual form. Field names are kebab-case
    /// or camelCase; optional fields accept `none` to unset.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match normalize_field(field).as_str() {
            "theme" => self.theme = parse_enum(value).ok_or_else(invalid)?,
            "fontsize" => self.font_size = parse_enum(value).ok_or_else(invalid)?,
            "motioneffects" => self.motion_effects = value.parse().map_err(|_| invalid())?,
            "savehistory" => self.save_history = value.parse().map_err(|_| invalid())?,
            "autoclearhistory" => {
                self.auto_clear_history = parse_enum(value).ok_or_else(invalid)?
            }
            "preloading" => self.preloading = value.parse().map_err(|_| invalid())?,
            "proxymethod" => self.proxy_method = parse_enum(value).ok_or_else(invalid)?,
            "customproxybase" => {
                self.custom_proxy_base = if is_unset(value) {
                    None
                } else if classify(value).is_url {
                    Some(value.trim_end_matches('/').to_string())
                } else {
                    return Err(invalid());
                }
            }
            "adblock" => {
                self.ad_block = if is_unset(value) {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                }
            }
            _ => return Err(SettingsError::UnknownField(field.to_string())),
        }
        Ok(())
    }
}

fn normalize_field(field: &str) -> String {
    field
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_unset(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

/// Parse a unit enum variant by its serialized name.
fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase())).ok()
}

// ── SettingsStore ─────────────────────────────────────────────────

pub struct SettingsStore {
    kv: Rc<KvStore>,
}

impl SettingsStore {
    pub fn new(kv: Rc<KvStore>) -> Self {
        Self { kv }
    }

    /// Persisted settings, or the defaults if none are stored (or the
    /// stored object is incomplete).
    pub fn get(&self) -> Settings {
        self.kv.load(SETTINGS_KEY).unwrap_or_default()
    }

    /// Persist `settings` as the whole new value.
    pub fn replace(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.kv.save(SETTINGS_KEY, settings)
    }

    /// Persist the default object.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        info!("resetting settings to defaults");
        self.kv.save(SETTINGS_KEY, &Settings::default())
    }
}

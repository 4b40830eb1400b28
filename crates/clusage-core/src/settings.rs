//! Display preferences read from `config/settings.json`
//!
//! The file is optional. A missing, unreadable, or invalid file yields the
//! defaults; the viewer never refuses to start because of settings.
//! `CLUSAGE_LANG` and `CLUSAGE_CACHE_TTL` take precedence over the file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::i18n::Locale;

/// Environment override for the UI language
pub const LANG_ENV_VAR: &str = "CLUSAGE_LANG";
/// Environment override for the cache TTL
pub const CACHE_TTL_ENV_VAR: &str = "CLUSAGE_CACHE_TTL";

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 30;
pub const DEFAULT_EXCHANGE_RATE: f64 = 1300.0;

/// Currency used when displaying estimated costs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Krw,
}

/// Preferred chart style for batch output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphStyle {
    #[default]
    Bar,
    Line,
}

/// Raw contents of the settings file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Locale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_style: Option<GraphStyle>,
}

impl SettingsFile {
    /// Range checks serde cannot express
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ttl) = self.cache_ttl_seconds
            && ttl < 1
        {
            return Err(format!("cacheTtlSeconds must be >= 1, got {ttl}"));
        }
        if let Some(rate) = self.exchange_rate
            && (rate.is_nan() || rate < 1.0)
        {
            return Err(format!("exchangeRate must be >= 1, got {rate}"));
        }
        Ok(())
    }
}

/// Keys accepted by [`Settings::get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    CacheTtlSeconds,
    Language,
    Currency,
    ExchangeRate,
    GraphStyle,
}

/// A resolved setting value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Seconds(u64),
    Language(Locale),
    Currency(Currency),
    Rate(f64),
    GraphStyle(GraphStyle),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{s}"),
            Self::Language(l) => write!(f, "{}", l.code()),
            Self::Currency(Currency::Usd) => write!(f, "USD"),
            Self::Currency(Currency::Krw) => write!(f, "KRW"),
            Self::Rate(r) => write!(f, "{r}"),
            Self::GraphStyle(GraphStyle::Bar) => write!(f, "bar"),
            Self::GraphStyle(GraphStyle::Line) => write!(f, "line"),
        }
    }
}

/// Read-only settings provider
///
/// Loaded once by the host and shared with every view; there is no
/// process-wide cache.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    file: SettingsFile,
}

impl Settings {
    pub fn from_file(file: SettingsFile) -> Self {
        Self { file }
    }

    /// Load settings from `path`, falling back to defaults on any problem
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No settings file at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<SettingsFile>(&content) {
            Ok(file) => match file.validate() {
                Ok(()) => Self { file },
                Err(reason) => {
                    warn!("Ignoring invalid settings file {}: {}", path.display(), reason);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Look up one setting, applying environment overrides and defaults
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::CacheTtlSeconds => SettingValue::Seconds(self.cache_ttl_seconds()),
            SettingKey::Language => SettingValue::Language(self.language()),
            SettingKey::Currency => SettingValue::Currency(self.currency()),
            SettingKey::ExchangeRate => SettingValue::Rate(self.exchange_rate()),
            SettingKey::GraphStyle => SettingValue::GraphStyle(self.graph_style()),
        }
    }

    pub fn cache_ttl_seconds(&self) -> u64 {
        if let Ok(raw) = std::env::var(CACHE_TTL_ENV_VAR)
            && let Ok(ttl) = raw.trim().parse::<u64>()
            && ttl >= 1
        {
            return ttl;
        }
        self.file
            .cache_ttl_seconds
            .unwrap_or(DEFAULT_CACHE_TTL_SECONDS)
    }

    /// Language explicitly chosen by the environment or the settings file
    pub fn configured_language(&self) -> Option<Locale> {
        if let Ok(raw) = std::env::var(LANG_ENV_VAR)
            && let Some(locale) = Locale::from_code(&raw)
        {
            return Some(locale);
        }
        self.file.language
    }

    pub fn language(&self) -> Locale {
        self.configured_language().unwrap_or_default()
    }

    pub fn currency(&self) -> Currency {
        self.file.currency.unwrap_or_default()
    }

    pub fn exchange_rate(&self) -> f64 {
        self.file.exchange_rate.unwrap_or(DEFAULT_EXCHANGE_RATE)
    }

    pub fn graph_style(&self) -> GraphStyle {
        self.file.graph_style.unwrap_or_default()
    }
}

//! Translation catalog for user-facing labels
//!
//! Catalogs are embedded at compile time from `locales/*.json`. Keys are
//! dotted paths into the nested JSON object (`"calendar.noData"`); values may
//! contain `{name}` placeholders filled by [`I18n::t_with`].
//!
//! Lookup falls back from the active locale to Korean and finally to the key
//! itself, so a missing translation shows up as its key rather than failing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use crate::settings::{LANG_ENV_VAR, Settings};

/// Supported UI languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
        }
    }

    /// Parse an exact locale code (`"ko"` or `"en"`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Parse a POSIX locale string such as `en_US.UTF-8` by prefix
    pub fn from_posix(value: &str) -> Option<Self> {
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("ko") {
            Some(Self::Ko)
        } else if lower.starts_with("en") {
            Some(Self::En)
        } else {
            None
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

struct Catalogs {
    ko: Value,
    en: Value,
}

static CATALOGS: Lazy<Catalogs> = Lazy::new(|| Catalogs {
    ko: parse_catalog("ko", include_str!("../locales/ko.json")),
    en: parse_catalog("en", include_str!("../locales/en.json")),
});

fn parse_catalog(name: &str, source: &str) -> Value {
    serde_json::from_str(source).unwrap_or_else(|e| {
        warn!("Failed to parse {} catalog: {}", name, e);
        Value::Null
    })
}

fn lookup<'a>(catalog: &'a Value, key: &str) -> Option<&'a str> {
    let mut current = catalog;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str()
}

fn interpolate(template: &str, params: &[(&str, &dyn fmt::Display)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{name}}}"), &value.to_string());
    }
    out
}

fn translate(
    primary: &Value,
    fallback: Option<&Value>,
    key: &str,
    params: &[(&str, &dyn fmt::Display)],
) -> String {
    let template = lookup(primary, key).or_else(|| fallback.and_then(|f| lookup(f, key)));
    match template {
        Some(template) => interpolate(template, params),
        None => key.to_string(),
    }
}

/// Locale from the usual POSIX variables, in precedence order
fn system_locale() -> Option<Locale> {
    ["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| Locale::from_posix(&value))
}

/// Resolve the UI locale
///
/// Order: `CLUSAGE_LANG`, the settings file, the system locale, Korean.
pub fn resolve_locale(settings: &Settings) -> Locale {
    if let Some(locale) = settings.configured_language() {
        debug!("Using configured locale: {}", locale);
        return locale;
    }
    if let Some(locale) = system_locale() {
        debug!("Using system locale: {}", locale);
        return locale;
    }
    debug!("No locale configured ({} unset), defaulting to ko", LANG_ENV_VAR);
    Locale::Ko
}

/// Translator bound to one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I18n {
    locale: Locale,
}

impl I18n {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Build a translator for the locale the settings and environment select
    pub fn detect(settings: &Settings) -> Self {
        Self::new(resolve_locale(settings))
    }

    /// The active locale
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Translate `key` without parameters
    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &[])
    }

    /// Translate `key`, replacing `{name}` placeholders
    ///
    /// ```
    /// use clusage_core::i18n::{I18n, Locale};
    ///
    /// let i18n = I18n::new(Locale::En);
    /// assert_eq!(i18n.t_with("detail.title", &[("date", &"2026-03-01")]), "2026-03-01 Details");
    /// assert_eq!(i18n.t("no.such.key"), "no.such.key");
    /// ```
    pub fn t_with(&self, key: &str, params: &[(&str, &dyn fmt::Display)]) -> String {
        let catalogs = &*CATALOGS;
        match self.locale {
            Locale::Ko => translate(&catalogs.ko, None, key, params),
            Locale::En => translate(&catalogs.en, Some(&catalogs.ko), key, params),
        }
    }

    /// Translate a comma-separated list entry such as month names
    pub fn list(&self, key: &str) -> Vec<String> {
        self.t(key).split(',').map(|s| s.trim().to_string()).collect()
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(Locale::Ko)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsFile;
    use crate::test_utils::{ENV_MUTEX, EnvVarGuard};

    #[test]
    fn test_catalogs_parse() {
        assert!(CATALOGS.ko.is_object());
        assert!(CATALOGS.en.is_object());
    }

    #[test]
    fn test_interpolation() {
        let i18n = I18n::new(Locale::En);
        assert_eq!(
            i18n.t_with("calendar.records", &[("count", &12)]),
            "12 records"
        );
        let ko = I18n::new(Locale::Ko);
        assert_eq!(ko.t_with("calendar.records", &[("count", &12)]), "12건");
    }

    #[test]
    fn test_missing_key_returns_key() {
        let i18n = I18n::new(Locale::Ko);
        assert_eq!(i18n.t("calendar.doesNotExist"), "calendar.doesNotExist");
    }

    #[test]
    fn test_fallback_catalog_used_for_missing_keys() {
        let en = serde_json::json!({ "a": { "b": "english" } });
        let ko = serde_json::json!({ "a": { "b": "한국어", "c": "{n}개" } });
        assert_eq!(translate(&en, Some(&ko), "a.b", &[]), "english");
        assert_eq!(translate(&en, Some(&ko), "a.c", &[("n", &3)]), "3개");
        assert_eq!(translate(&en, Some(&ko), "a.d", &[]), "a.d");
        // A branch is not a string value
        assert_eq!(translate(&en, None, "a", &[]), "a");
    }

    #[test]
    fn test_lists_have_expected_lengths() {
        for locale in [Locale::Ko, Locale::En] {
            let i18n = I18n::new(locale);
            assert_eq!(i18n.list("histogram.monthNames").len(), 12);
            assert_eq!(i18n.list("histogram.dayNames").len(), 7);
            assert_eq!(i18n.list("calendar.weekdays").len(), 7);
            assert_eq!(i18n.list("calendar.monthNames").len(), 12);
        }
    }

    #[test]
    fn test_from_posix() {
        assert_eq!(Locale::from_posix("en_US.UTF-8"), Some(Locale::En));
        assert_eq!(Locale::from_posix("ko_KR.UTF-8"), Some(Locale::Ko));
        assert_eq!(Locale::from_posix("C"), None);
    }

    #[tokio::test]
    async fn test_resolve_locale_order() {
        let _lock = ENV_MUTEX.lock().await;
        let mut guard = EnvVarGuard::new();
        guard.remove(LANG_ENV_VAR);
        guard.remove("LC_ALL");
        guard.remove("LC_MESSAGES");
        guard.remove("LANGUAGE");
        guard.set("LANG", "en_US.UTF-8");

        let from_file = Settings::from_file(SettingsFile {
            language: Some(Locale::Ko),
            ..Default::default()
        });
        assert_eq!(resolve_locale(&from_file), Locale::Ko);
        assert_eq!(resolve_locale(&Settings::default()), Locale::En);

        guard.set(LANG_ENV_VAR, "en");
        assert_eq!(resolve_locale(&from_file), Locale::En);

        guard.remove(LANG_ENV_VAR);
        guard.set("LANG", "C");
        assert_eq!(resolve_locale(&Settings::default()), Locale::Ko);
    }
}

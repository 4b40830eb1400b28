//! The zone that decides which day a record belongs to
//!
//! [`TimezoneConfig`] comes from `--timezone`/`--utc` or the machine's zone.
//! [`Clock`] answers "now" and "today" in that zone for every view.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{ClusageError, Result};

/// Zone used for date grouping and the current day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneConfig {
    pub tz: Tz,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self { tz: local_zone() }
    }
}

impl TimezoneConfig {
    /// Resolve the command-line flags
    ///
    /// `utc` overrides `name`. With neither, the machine's zone is used.
    pub fn from_cli(name: Option<&str>, utc: bool) -> Result<Self> {
        let tz = match (utc, name) {
            (true, _) => Tz::UTC,
            (false, Some(name)) => parse_zone(name)?,
            (false, None) => return Ok(Self::default()),
        };
        Ok(Self { tz })
    }

    /// IANA name of the zone, `UTC` for UTC
    pub fn display_name(&self) -> &str {
        self.tz.name()
    }
}

fn parse_zone(name: &str) -> Result<Tz> {
    name.parse().map_err(|_| {
        ClusageError::InvalidTimezone(format!(
            "'{name}'. Expected an IANA name such as 'Asia/Seoul' or 'UTC'"
        ))
    })
}

/// `TZ` when it names a known zone, then the OS setting, then UTC
fn local_zone() -> Tz {
    if let Some(tz) = std::env::var("TZ").ok().and_then(|name| name.parse::<Tz>().ok()) {
        debug!("Timezone {} from TZ", tz);
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse().unwrap_or_else(|_| {
            debug!("Unknown system timezone '{}', using UTC", name);
            Tz::UTC
        }),
        Err(e) => {
            debug!("System timezone unavailable ({}), using UTC", e);
            Tz::UTC
        }
    }
}

/// Source of the current instant in the configured zone
///
/// Views never call `Utc::now()` directly; pinning the clock makes
/// "today" and "current hour" deterministic in tests.
#[derive(Debug, Clone)]
pub struct Clock {
    tz: Tz,
    fixed: Option<DateTime<Utc>>,
}

impl Clock {
    /// A clock that follows the system time
    pub fn system(tz: Tz) -> Self {
        Self { tz, fixed: None }
    }

    /// A clock frozen at `instant`
    pub fn fixed(tz: Tz, instant: DateTime<Utc>) -> Self {
        Self {
            tz,
            fixed: Some(instant),
        }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.fixed.unwrap_or_else(Utc::now).with_timezone(&self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_utc_flag_wins() {
        let config = TimezoneConfig::from_cli(Some("Asia/Seoul"), true).unwrap();
        assert_eq!(config.tz, Tz::UTC);
        assert_eq!(config.display_name(), "UTC");
    }

    #[test]
    fn test_named_zone() {
        let config = TimezoneConfig::from_cli(Some("Asia/Seoul"), false).unwrap();
        assert_eq!(config.tz, chrono_tz::Asia::Seoul);
        assert_eq!(config.display_name(), "Asia/Seoul");
    }

    #[test]
    fn test_unknown_zone_is_rejected() {
        let result = TimezoneConfig::from_cli(Some("Mars/Olympus"), false);
        match result {
            Err(ClusageError::InvalidTimezone(message)) => assert!(message.contains("Mars/Olympus")),
            other => panic!("Expected InvalidTimezone, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_clock_uses_zone_for_today() {
        // 2026-03-01 20:30 UTC is already March 2nd in Seoul
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 20, 30, 0).unwrap();
        let clock = Clock::fixed(chrono_tz::Asia::Seoul, instant);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(clock.now().hour(), 5);

        let utc_clock = Clock::fixed(Tz::UTC, instant);
        assert_eq!(utc_clock.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }
}

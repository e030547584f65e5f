// Timezone offset resolution: live IANA lookup with nominal fallback
use crate::registry::TimezoneRegistry;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Get timezone from IANA name
pub fn tz_from_name(tz_name: &str) -> Option<Tz> {
    tz_name.parse().ok()
}

/// Get timezone offset in minutes from datetime
pub fn tz_offset_minutes<T: TimeZone>(dt: &DateTime<T>) -> i32 {
    dt.offset().fix().local_minus_utc() / 60
}

/// Which tier produced an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetSource {
    /// DST-aware answer from the zone database
    Live,
    /// Nominal catalog offset, ignores seasonal shifts
    Nominal,
    /// Zone known to neither tier, offset forced to 0
    Unknown,
}

impl OffsetSource {
    pub fn is_degraded(self) -> bool {
        self != OffsetSource::Live
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOffset {
    pub minutes: i32,
    pub source: OffsetSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverMode {
    #[default]
    Live,
    /// Skip the zone database entirely and answer from the catalog
    NominalOnly,
}

/// Two-tier offset strategy: zone database first, catalog second.
///
/// Offsets are only valid for the instant they were resolved at. Two zones
/// sharing a nominal offset can disagree on dates inside either zone's DST
/// period, so never reuse a result for a different date.
#[derive(Debug, Clone)]
pub struct OffsetResolver {
    registry: TimezoneRegistry,
    mode: ResolverMode,
}

impl OffsetResolver {
    pub fn new(registry: TimezoneRegistry, mode: ResolverMode) -> Self {
        OffsetResolver { registry, mode }
    }

    pub fn registry(&self) -> &TimezoneRegistry {
        &self.registry
    }

    pub fn mode(&self) -> ResolverMode {
        self.mode
    }

    /// Offset in minutes for `at` read as wall-clock time in `timezone`
    pub fn resolve_offset_minutes(&self, timezone: &str, at: NaiveDateTime) -> i32 {
        self.resolve_local(timezone, at).minutes
    }

    /// Offset in minutes for `at_utc` read as an absolute UTC instant
    pub fn resolve_utc_offset_minutes(&self, timezone: &str, at_utc: NaiveDateTime) -> i32 {
        self.resolve_utc(timezone, at_utc).minutes
    }

    /// Resolve for a wall-clock time.
    ///
    /// A time repeated by a backward transition takes the earlier offset. A time
    /// skipped by a forward transition takes the offset in force before the gap.
    pub fn resolve_local(&self, timezone: &str, at: NaiveDateTime) -> ResolvedOffset {
        match self.live_zone(timezone) {
            Some(tz) => ResolvedOffset {
                minutes: local_offset_minutes(&tz, at),
                source: OffsetSource::Live,
            },
            None => self.fallback(timezone),
        }
    }

    /// Resolve for an absolute instant given as naive UTC
    pub fn resolve_utc(&self, timezone: &str, at_utc: NaiveDateTime) -> ResolvedOffset {
        match self.live_zone(timezone) {
            Some(tz) => ResolvedOffset {
                minutes: tz.offset_from_utc_datetime(&at_utc).fix().local_minus_utc() / 60,
                source: OffsetSource::Live,
            },
            None => self.fallback(timezone),
        }
    }

    /// True when `timezone` would be answered by the zone database
    pub fn is_live(&self, timezone: &str) -> bool {
        self.live_zone(timezone).is_some()
    }

    fn live_zone(&self, timezone: &str) -> Option<Tz> {
        match self.mode {
            ResolverMode::Live => tz_from_name(timezone),
            ResolverMode::NominalOnly => None,
        }
    }

    /// Which tier would answer for `timezone`, without resolving an offset
    pub fn zone_source(&self, timezone: &str) -> OffsetSource {
        if self.live_zone(timezone).is_some() {
            OffsetSource::Live
        } else if self.registry.contains(timezone) {
            OffsetSource::Nominal
        } else {
            OffsetSource::Unknown
        }
    }

    fn fallback(&self, timezone: &str) -> ResolvedOffset {
        // Per-lookup detail only; callers warn once per participant
        match self.registry.nominal_offset_minutes(timezone) {
            Some(minutes) => {
                log::debug!("Nominal offset {} min for {}", minutes, timezone);
                ResolvedOffset {
                    minutes,
                    source: OffsetSource::Nominal,
                }
            }
            None => {
                log::debug!("Unknown timezone {}, offset 0", timezone);
                ResolvedOffset {
                    minutes: 0,
                    source: OffsetSource::Unknown,
                }
            }
        }
    }
}

impl Default for OffsetResolver {
    fn default() -> Self {
        Self::new(TimezoneRegistry::builtin(), ResolverMode::Live)
    }
}

fn local_offset_minutes(tz: &Tz, at: NaiveDateTime) -> i32 {
    let offset = match tz.offset_from_local_datetime(&at) {
        LocalResult::Single(o) | LocalResult::Ambiguous(o, _) => o,
        // Offsets stay within +-14h and gaps last at most a few hours, so a
        // day earlier always lands before the transition.
        LocalResult::None => {
            let before = at.checked_sub_signed(Duration::hours(24)).unwrap_or(at);
            tz.offset_from_utc_datetime(&before)
        }
    };
    offset.fix().local_minus_utc() / 60
}

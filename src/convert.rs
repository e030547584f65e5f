// Wall-clock conversion between named timezones
use crate::error::{PlannerError, PlannerResult};
use crate::timezone_utils::{OffsetResolver, OffsetSource};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Converted wall-clock time plus whether any fallback offset was involved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converted {
    pub instant: NaiveDateTime,
    pub degraded: bool,
}

/// Converts civil timestamps between zones using a shared resolver.
///
/// Resolution happens in two steps. The source offset is looked up for the
/// civil instant as wall-clock time in `from`. The target offset is looked up
/// for the resulting UTC instant, not the original civil instant, so a
/// conversion landing on the other side of a DST transition in `to` picks the
/// offset that is actually in force there.
#[derive(Debug, Clone, Copy)]
pub struct TimeConverter<'a> {
    resolver: &'a OffsetResolver,
}

impl<'a> TimeConverter<'a> {
    pub fn new(resolver: &'a OffsetResolver) -> Self {
        TimeConverter { resolver }
    }

    pub fn resolver(&self) -> &'a OffsetResolver {
        self.resolver
    }

    pub fn convert(&self, instant: NaiveDateTime, from: &str, to: &str) -> PlannerResult<NaiveDateTime> {
        Ok(self.convert_tagged(instant, from, to)?.instant)
    }

    pub fn convert_tagged(&self, instant: NaiveDateTime, from: &str, to: &str) -> PlannerResult<Converted> {
        if from == to {
            return Ok(Converted {
                instant,
                degraded: false,
            });
        }

        let (utc, source_from) = self.to_utc_tagged(instant, from)?;
        let (local, source_to) = self.from_utc_tagged(utc, to)?;

        Ok(Converted {
            instant: local,
            degraded: source_from.is_degraded() || source_to.is_degraded(),
        })
    }

    /// Wall-clock time in `from` to naive UTC
    pub fn to_utc(&self, instant: NaiveDateTime, from: &str) -> PlannerResult<NaiveDateTime> {
        Ok(self.to_utc_tagged(instant, from)?.0)
    }

    /// Naive UTC to wall-clock time in `to`
    pub fn from_utc(&self, utc: NaiveDateTime, to: &str) -> PlannerResult<NaiveDateTime> {
        Ok(self.from_utc_tagged(utc, to)?.0)
    }

    /// Current wall-clock time in `zone` for an absolute instant
    pub fn civil_now(&self, now: DateTime<Utc>, zone: &str) -> PlannerResult<NaiveDateTime> {
        self.from_utc(now.naive_utc(), zone)
    }

    fn to_utc_tagged(&self, instant: NaiveDateTime, from: &str) -> PlannerResult<(NaiveDateTime, OffsetSource)> {
        let offset = self.resolver.resolve_local(from, instant);
        let utc = shift_minutes(instant, -(offset.minutes as i64))?;
        Ok((utc, offset.source))
    }

    fn from_utc_tagged(&self, utc: NaiveDateTime, to: &str) -> PlannerResult<(NaiveDateTime, OffsetSource)> {
        let offset = self.resolver.resolve_utc(to, utc);
        let local = shift_minutes(utc, offset.minutes as i64)?;
        Ok((local, offset.source))
    }
}

/// `instant` moved by `minutes`, failing instead of overflowing the calendar range
pub fn shift_minutes(instant: NaiveDateTime, minutes: i64) -> PlannerResult<NaiveDateTime> {
    instant
        .checked_add_signed(Duration::minutes(minutes))
        .ok_or_else(|| PlannerError::InvalidDateTime(format!("{} shifted by {} min is out of range", instant, minutes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TimezoneRegistry;
    use crate::timezone_utils::ResolverMode;
    use chrono::{NaiveDate, TimeZone};
    use proptest::prelude::*;

    fn civil(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    // Zones without DST since well before 2000
    const FIXED_ZONES: [&str; 7] = [
        "Asia/Shanghai",
        "Asia/Tokyo",
        "Asia/Kolkata",
        "Asia/Dubai",
        "Asia/Singapore",
        "Pacific/Honolulu",
        "UTC",
    ];

    #[test]
    fn test_shanghai_to_new_york_winter() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let local = converter.convert(civil(2025, 1, 15, 9, 0), "Asia/Shanghai", "America/New_York").unwrap();
        assert_eq!(local, civil(2025, 1, 14, 20, 0));
    }

    #[test]
    fn test_half_hour_offset() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let local = converter.convert(civil(2025, 1, 15, 9, 0), "Asia/Shanghai", "Asia/Kolkata").unwrap();
        assert_eq!(local, civil(2025, 1, 15, 6, 30));
    }

    #[test]
    fn test_target_offset_resolved_at_utc_instant() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let instant = civil(2025, 3, 9, 10, 30);

        // 10:30 Tokyo is 01:30 UTC, still EST in New York (DST starts 07:00 UTC)
        let local = converter.convert(instant, "Asia/Tokyo", "America/New_York").unwrap();
        assert_eq!(local, civil(2025, 3, 8, 20, 30));

        // Resolving the target against the original civil instant would pick EDT
        let utc = converter.to_utc(instant, "Asia/Tokyo").unwrap();
        let wrong_offset = resolver.resolve_offset_minutes("America/New_York", instant);
        assert_eq!(wrong_offset, -240);
        assert_ne!(utc + Duration::minutes(wrong_offset as i64), local);
    }

    #[test]
    fn test_nominal_only_ignores_dst() {
        let resolver = OffsetResolver::new(TimezoneRegistry::builtin(), ResolverMode::NominalOnly);
        let converter = TimeConverter::new(&resolver);
        let converted = converter.convert_tagged(civil(2025, 7, 1, 9, 0), "Asia/Shanghai", "America/New_York").unwrap();
        assert_eq!(converted.instant, civil(2025, 6, 30, 20, 0));
        assert!(converted.degraded);

        let live = OffsetResolver::default();
        let live_converter = TimeConverter::new(&live);
        let converted_live = live_converter.convert_tagged(civil(2025, 7, 1, 9, 0), "Asia/Shanghai", "America/New_York").unwrap();
        assert_eq!(converted_live.instant, civil(2025, 6, 30, 21, 0));
        assert!(!converted_live.degraded);
    }

    #[test]
    fn test_identity_for_unknown_zone() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let instant = civil(2025, 3, 9, 2, 30);
        let converted = converter.convert_tagged(instant, "Mars/Olympus", "Mars/Olympus").unwrap();
        assert_eq!(converted.instant, instant);
        assert!(!converted.degraded);
    }

    #[test]
    fn test_out_of_range_conversion_is_an_error() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let last_hour = NaiveDate::MAX.and_hms_opt(23, 0, 0).unwrap();

        let result = converter.convert(last_hour, "UTC", "Asia/Tokyo");
        assert!(matches!(result, Err(PlannerError::InvalidDateTime(_))));

        let first_hour = NaiveDate::MIN.and_hms_opt(1, 0, 0).unwrap();
        assert!(converter.convert(first_hour, "UTC", "America/New_York").is_err());
    }

    #[test]
    fn test_round_trip_dst_zones_mid_season() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let zones = ["America/New_York", "Europe/London", "Australia/Sydney", "America/Denver"];
        for instant in [civil(2025, 1, 20, 14, 15), civil(2025, 7, 20, 3, 45)] {
            for a in zones {
                for b in zones {
                    let there = converter.convert(instant, a, b).unwrap();
                    assert_eq!(converter.convert(there, b, a).unwrap(), instant, "{} -> {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_civil_now() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        let now = Utc.with_ymd_and_hms(2025, 1, 14, 18, 30, 0).unwrap();
        assert_eq!(converter.civil_now(now, "Asia/Shanghai").unwrap(), civil(2025, 1, 15, 2, 30));
    }

    proptest! {
        #[test]
        fn prop_round_trip_fixed_zones(
            secs in 946_684_800i64..2_051_222_400i64,
            a in 0usize..FIXED_ZONES.len(),
            b in 0usize..FIXED_ZONES.len(),
        ) {
            let resolver = OffsetResolver::default();
            let converter = TimeConverter::new(&resolver);
            let instant = DateTime::from_timestamp(secs - secs % 60, 0).unwrap().naive_utc();
            let there = converter.convert(instant, FIXED_ZONES[a], FIXED_ZONES[b]).unwrap();
            prop_assert_eq!(converter.convert(there, FIXED_ZONES[b], FIXED_ZONES[a]).unwrap(), instant);
        }

        #[test]
        fn prop_identity_every_catalog_zone(
            secs in 946_684_800i64..2_051_222_400i64,
            z in 0usize..17,
        ) {
            let resolver = OffsetResolver::default();
            let converter = TimeConverter::new(&resolver);
            let zone = resolver.registry().zones()[z].id.clone();
            let instant = DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
            prop_assert_eq!(converter.convert(instant, &zone, &zone).unwrap(), instant);
        }
    }
}

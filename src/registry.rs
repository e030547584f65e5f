// Static catalog of selectable timezones with nominal UTC offsets
use serde::{Deserialize, Serialize};

pub const DEFAULT_TZ_NAME: &str = "Asia/Shanghai";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    pub id: String,
    pub label: String,
    /// Typical offset ignoring DST. Fallback only.
    pub nominal_offset_minutes: i32,
}

impl TimezoneInfo {
    pub fn new(id: &str, label: &str, nominal_offset_minutes: i32) -> Self {
        TimezoneInfo {
            id: id.to_string(),
            label: label.to_string(),
            nominal_offset_minutes,
        }
    }
}

/// Read-only zone catalog, injected into the offset resolver at construction
#[derive(Debug, Clone)]
pub struct TimezoneRegistry {
    zones: Vec<TimezoneInfo>,
    default_id: String,
}

impl TimezoneRegistry {
    /// Build a registry from an explicit catalog.
    /// The first entry becomes the default zone unless `DEFAULT_TZ_NAME` is present.
    pub fn new(zones: Vec<TimezoneInfo>) -> Self {
        let default_id = if zones.iter().any(|z| z.id == DEFAULT_TZ_NAME) {
            DEFAULT_TZ_NAME.to_string()
        } else {
            zones
                .first()
                .map(|z| z.id.clone())
                .unwrap_or_else(|| "UTC".to_string())
        };

        TimezoneRegistry { zones, default_id }
    }

    /// Common zones offered to users, with nominal (standard-time) offsets
    pub fn builtin() -> Self {
        Self::new(vec![
            TimezoneInfo::new("Asia/Shanghai", "Beijing (GMT+8)", 480),
            TimezoneInfo::new("America/New_York", "New York, US Eastern (GMT-5/-4)", -300),
            TimezoneInfo::new("America/Los_Angeles", "Los Angeles, US Pacific (GMT-8/-7)", -480),
            TimezoneInfo::new("Europe/Rome", "Milan (GMT+1/+2)", 60),
            TimezoneInfo::new("Europe/London", "London (GMT+0/+1)", 0),
            TimezoneInfo::new("Europe/Paris", "Paris (GMT+1/+2)", 60),
            TimezoneInfo::new("Asia/Tokyo", "Tokyo (GMT+9)", 540),
            TimezoneInfo::new("Asia/Seoul", "Seoul (GMT+9)", 540),
            TimezoneInfo::new("Asia/Singapore", "Singapore (GMT+8)", 480),
            TimezoneInfo::new("Australia/Sydney", "Sydney (GMT+10/+11)", 600),
            TimezoneInfo::new("Asia/Dubai", "Dubai (GMT+4)", 240),
            TimezoneInfo::new("Asia/Kolkata", "New Delhi (GMT+5:30)", 330),
            TimezoneInfo::new("Europe/Berlin", "Berlin (GMT+1/+2)", 60),
            TimezoneInfo::new("America/Chicago", "Chicago (GMT-6/-5)", -360),
            TimezoneInfo::new("America/Denver", "Denver (GMT-7/-6)", -420),
            TimezoneInfo::new("Pacific/Honolulu", "Hawaii (GMT-10)", -600),
            TimezoneInfo::new("UTC", "Coordinated Universal Time", 0),
        ])
    }

    pub fn zones(&self) -> &[TimezoneInfo] {
        &self.zones
    }

    pub fn get(&self, id: &str) -> Option<&TimezoneInfo> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn nominal_offset_minutes(&self, id: &str) -> Option<i32> {
        self.get(id).map(|z| z.nominal_offset_minutes)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn default_zone(&self) -> &str {
        &self.default_id
    }

    /// Label for display, falling back to the raw id for zones outside the catalog
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|z| z.label.as_str()).unwrap_or(id)
    }
}

impl Default for TimezoneRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

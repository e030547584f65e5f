// Configuration management for the meeting planner
use crate::recommender::{
    SearchRequest, DEFAULT_DAY_END_HOUR, DEFAULT_DAY_START_HOUR, DEFAULT_HORIZON_DAYS,
    DEFAULT_STEP_HOURS, DEFAULT_TOP_N,
};
use crate::registry::{TimezoneInfo, TimezoneRegistry};
use crate::timezone_utils::{OffsetResolver, ResolverMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Duration bounds offered by the form, 15 minute steps
pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 480;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEntry {
    pub name: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Meeting defaults; no anchor means the catalog default zone
    pub anchor_tz: Option<String>,
    pub duration_minutes: u32,

    // Search grid
    pub horizon_days: u32,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub step_hours: u32,
    pub top_n: usize,

    // Offset resolution
    pub live_offsets: bool,

    // Parallelism (0 = auto-detect)
    pub workers: usize,

    // Starting roster, empty means the built-in pair
    pub participants: Vec<ParticipantEntry>,

    // Catalog override, empty means the built-in catalog
    pub timezones: Vec<TimezoneInfo>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            anchor_tz: None,
            duration_minutes: 60,
            horizon_days: DEFAULT_HORIZON_DAYS,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            day_end_hour: DEFAULT_DAY_END_HOUR,
            step_hours: DEFAULT_STEP_HOURS,
            top_n: DEFAULT_TOP_N,
            live_offsets: true,
            workers: 0,
            participants: Vec::new(),
            timezones: Vec::new(),
        }
    }
}

impl Config {
    pub fn registry(&self) -> TimezoneRegistry {
        if self.timezones.is_empty() {
            TimezoneRegistry::builtin()
        } else {
            TimezoneRegistry::new(self.timezones.clone())
        }
    }

    pub fn resolver(&self) -> OffsetResolver {
        let mode = if self.live_offsets {
            ResolverMode::Live
        } else {
            ResolverMode::NominalOnly
        };
        OffsetResolver::new(self.registry(), mode)
    }

    /// Zone meeting times are expressed in
    pub fn anchor_timezone(&self) -> String {
        match &self.anchor_tz {
            Some(tz) => tz.clone(),
            None => self.registry().default_zone().to_string(),
        }
    }

    pub fn search_request(&self) -> SearchRequest {
        SearchRequest {
            duration_minutes: self.duration_minutes,
            horizon_days: self.horizon_days,
            day_start_hour: self.day_start_hour,
            day_end_hour: self.day_end_hour,
            step_hours: self.step_hours,
            anchor_timezone: self.anchor_timezone(),
            top_n: self.top_n,
        }
    }
}

/// True when a duration fits the form's 15..=480 minute range in 15 minute steps.
/// The planner itself accepts any positive duration.
pub fn is_recommended_duration(minutes: u32) -> bool {
    (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) && minutes % 15 == 0
}

/// Load configuration from YAML file and merge with defaults
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(path) = config_path {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let user_config: serde_yaml::Value = serde_yaml::from_str(&contents)?;

            // Merge user config with defaults
            if let serde_yaml::Value::Mapping(map) = user_config {
                for (key, value) in map {
                    if let serde_yaml::Value::String(key_str) = key {
                        merge_config_value(&mut config, &key_str, value)?;
                    }
                }
            }
        } else {
            log::warn!("Config file {:?} not found, using defaults", path);
        }
    }

    Ok(config)
}

fn merge_config_value(config: &mut Config, key: &str, value: serde_yaml::Value) -> anyhow::Result<()> {
    match key {
        "anchor_tz" => {
            if let Some(v) = value.as_str() {
                config.anchor_tz = Some(v.to_string());
            }
        }
        "duration_minutes" => {
            if let Some(v) = value.as_u64() {
                config.duration_minutes = u32::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "horizon_days" => {
            if let Some(v) = value.as_u64() {
                config.horizon_days = u32::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "day_start_hour" => {
            if let Some(v) = value.as_u64() {
                config.day_start_hour = u32::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "day_end_hour" => {
            if let Some(v) = value.as_u64() {
                config.day_end_hour = u32::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "step_hours" => {
            if let Some(v) = value.as_u64() {
                config.step_hours = u32::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "top_n" => {
            if let Some(v) = value.as_u64() {
                config.top_n = usize::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "live_offsets" => {
            if let Some(v) = value.as_bool() {
                config.live_offsets = v;
            }
        }
        "workers" => {
            if let Some(v) = value.as_u64() {
                config.workers = usize::try_from(v).map_err(|_| out_of_range(key, v))?;
            }
        }
        "participants" => {
            config.participants = serde_yaml::from_value(value)?;
        }
        "timezones" => {
            let entries: Vec<CatalogEntry> = serde_yaml::from_value(value)?;
            config.timezones = entries
                .into_iter()
                .map(|e| TimezoneInfo {
                    label: e.label.unwrap_or_else(|| e.id.clone()),
                    id: e.id,
                    nominal_offset_minutes: e.offset_minutes,
                })
                .collect();
        }
        other => log::debug!("Ignoring unknown config key {}", other),
    }
    Ok(())
}

fn out_of_range(key: &str, value: u64) -> anyhow::Error {
    anyhow::anyhow!("Config value {} for {} is out of range", value, key)
}

/// YAML shape of a catalog entry; the label defaults to the id
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    label: Option<String>,
    offset_minutes: i32,
}

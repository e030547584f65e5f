// Error types for planner operations
use chrono::NaiveDateTime;

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Structural failures surfaced to the caller.
///
/// Timezone lookups never produce one of these: they degrade to a fallback
/// offset instead (see `timezone_utils`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    #[error("At least one participant is required")]
    NoParticipants,

    #[error("Meeting end {end} is not after start {start} in {anchor}")]
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
        anchor: String,
    },

    #[error("Invalid search parameters: {0}")]
    InvalidSearch(String),

    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),

    #[error("Unknown participant id: {0}")]
    UnknownParticipant(u64),
}

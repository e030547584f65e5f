// Per-participant evaluation of a single meeting window
use crate::convert::TimeConverter;
use crate::error::{PlannerError, PlannerResult};
use crate::participants::Participant;
use crate::timezone_utils::{OffsetResolver, OffsetSource, ResolverMode};
use crate::working_hours::is_working_hours;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Share of participants in working hours at which a window counts as optimal
pub const OPTIMAL_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub anchor_timezone: String,
}

impl MeetingWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, anchor_timezone: &str) -> Self {
        MeetingWindow {
            start,
            end,
            anchor_timezone: anchor_timezone.to_string(),
        }
    }

    /// Reject windows whose end is not after their start once both are placed in the anchor zone
    pub fn validate(&self, converter: &TimeConverter) -> PlannerResult<()> {
        let start_utc = converter.to_utc(self.start, &self.anchor_timezone)?;
        let end_utc = converter.to_utc(self.end, &self.anchor_timezone)?;

        if end_utc <= start_utc {
            return Err(PlannerError::InvalidWindow {
                start: self.start,
                end: self.end,
                anchor: self.anchor_timezone.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantEvaluation {
    pub participant: Participant,
    pub local_start: NaiveDateTime,
    pub local_end: NaiveDateTime,
    pub is_working_hours: bool,
    /// Some offset for this participant came from the fallback tier
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowEvaluation {
    pub per_participant: Vec<ParticipantEvaluation>,
    pub working_count: usize,
    pub working_fraction: f64,
    pub is_optimal: bool,
}

impl WindowEvaluation {
    pub fn total(&self) -> usize {
        self.per_participant.len()
    }

    pub fn working_percentage(&self) -> f64 {
        self.working_fraction * 100.0
    }
}

/// Warn once for each participant whose zone the zone database cannot answer.
/// Nominal-only mode is a deliberate choice, so only unknown zones warn there.
pub fn warn_unresolved_zones(resolver: &OffsetResolver, participants: &[Participant]) {
    for p in participants {
        match resolver.zone_source(&p.timezone) {
            OffsetSource::Live => {}
            OffsetSource::Nominal => {
                if resolver.mode() == ResolverMode::Live {
                    log::warn!(
                        "{} ({}): not in zone database, using nominal offset",
                        p.name,
                        p.timezone
                    );
                }
            }
            OffsetSource::Unknown => {
                log::warn!("{} ({}): unknown timezone, assuming UTC offset 0", p.name, p.timezone);
            }
        }
    }
}

/// Scores meeting windows against participants' working hours
#[derive(Debug, Clone, Copy)]
pub struct WindowEvaluator<'a> {
    converter: TimeConverter<'a>,
}

impl<'a> WindowEvaluator<'a> {
    pub fn new(resolver: &'a OffsetResolver) -> Self {
        WindowEvaluator {
            converter: TimeConverter::new(resolver),
        }
    }

    pub fn converter(&self) -> &TimeConverter<'a> {
        &self.converter
    }

    /// Localize `window` for every participant.
    ///
    /// A participant is compatible only when both the localized start and the
    /// localized end fall in working hours.
    pub fn evaluate(
        &self,
        window: &MeetingWindow,
        participants: &[Participant],
    ) -> PlannerResult<WindowEvaluation> {
        if participants.is_empty() {
            return Err(PlannerError::NoParticipants);
        }
        warn_unresolved_zones(self.converter.resolver(), participants);
        self.evaluate_window(window, participants)
    }

    /// Evaluate many windows against the same participants on the rayon pool.
    /// Results come back in input order, one per window.
    pub fn evaluate_many(
        &self,
        windows: &[MeetingWindow],
        participants: &[Participant],
    ) -> Vec<PlannerResult<WindowEvaluation>> {
        warn_unresolved_zones(self.converter.resolver(), participants);
        windows
            .par_iter()
            .map(|w| self.evaluate_window(w, participants))
            .collect()
    }

    /// `evaluate` without the per-participant zone warnings, for callers that
    /// already warned once for a whole batch
    pub(crate) fn evaluate_window(
        &self,
        window: &MeetingWindow,
        participants: &[Participant],
    ) -> PlannerResult<WindowEvaluation> {
        if participants.is_empty() {
            return Err(PlannerError::NoParticipants);
        }
        window.validate(&self.converter)?;

        let per_participant = participants
            .iter()
            .map(|p| self.localize(window, p))
            .collect::<PlannerResult<Vec<ParticipantEvaluation>>>()?;

        let working_count = per_participant.iter().filter(|p| p.is_working_hours).count();
        let working_fraction = working_count as f64 / per_participant.len() as f64;

        Ok(WindowEvaluation {
            per_participant,
            working_count,
            working_fraction,
            is_optimal: working_fraction >= OPTIMAL_THRESHOLD,
        })
    }

    fn localize(&self, window: &MeetingWindow, participant: &Participant) -> PlannerResult<ParticipantEvaluation> {
        let start = self
            .converter
            .convert_tagged(window.start, &window.anchor_timezone, &participant.timezone)?;
        let end = self
            .converter
            .convert_tagged(window.end, &window.anchor_timezone, &participant.timezone)?;

        Ok(ParticipantEvaluation {
            participant: participant.clone(),
            local_start: start.instant,
            local_end: end.instant,
            is_working_hours: is_working_hours(&start.instant) && is_working_hours(&end.instant),
            degraded: start.degraded || end.degraded,
        })
    }
}

// Candidate window search and ranking over a multi-day horizon
use crate::convert::TimeConverter;
use crate::error::{PlannerError, PlannerResult};
use crate::evaluator::{warn_unresolved_zones, MeetingWindow, WindowEvaluation, WindowEvaluator};
use crate::participants::Participant;
use crate::timezone_utils::OffsetResolver;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HORIZON_DAYS: u32 = 7;
pub const DEFAULT_DAY_START_HOUR: u32 = 8;
pub const DEFAULT_DAY_END_HOUR: u32 = 20;
pub const DEFAULT_STEP_HOURS: u32 = 1;
pub const DEFAULT_TOP_N: usize = 10;

/// Search parameters. Start hours run from `day_start_hour` to `day_end_hour` inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub duration_minutes: u32,
    pub horizon_days: u32,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub step_hours: u32,
    pub anchor_timezone: String,
    pub top_n: usize,
}

impl SearchRequest {
    pub fn new(duration_minutes: u32, anchor_timezone: &str) -> Self {
        SearchRequest {
            duration_minutes,
            horizon_days: DEFAULT_HORIZON_DAYS,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            day_end_hour: DEFAULT_DAY_END_HOUR,
            step_hours: DEFAULT_STEP_HOURS,
            anchor_timezone: anchor_timezone.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.duration_minutes == 0 {
            return Err(PlannerError::InvalidSearch("duration must be positive".to_string()));
        }
        if self.horizon_days == 0 {
            return Err(PlannerError::InvalidSearch("horizon must cover at least one day".to_string()));
        }
        if self.step_hours == 0 {
            return Err(PlannerError::InvalidSearch("step must be at least one hour".to_string()));
        }
        if self.day_end_hour > 23 || self.day_start_hour > self.day_end_hour {
            return Err(PlannerError::InvalidSearch(format!(
                "hour range {}..={} must lie within 0..=23",
                self.day_start_hour, self.day_end_hour
            )));
        }
        if self.top_n == 0 {
            return Err(PlannerError::InvalidSearch("top_n must be positive".to_string()));
        }
        Ok(())
    }

    /// Candidate start hours for one day
    pub fn start_hours(&self) -> impl Iterator<Item = u32> {
        (self.day_start_hour..=self.day_end_hour).step_by(self.step_hours.max(1) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOption {
    pub window: MeetingWindow,
    pub evaluation: WindowEvaluation,
    /// Working fraction as a percentage, 0..=100
    pub suitability_score: f64,
}

/// "Tomorrow" in the anchor zone relative to `now`
pub fn search_base_date(
    converter: &TimeConverter,
    now: DateTime<Utc>,
    anchor_timezone: &str,
) -> PlannerResult<NaiveDate> {
    let today = converter.civil_now(now, anchor_timezone)?.date();
    today
        .succ_opt()
        .ok_or_else(|| PlannerError::InvalidDateTime(format!("no day after {}", today)))
}

/// All candidate windows in generation order: by day, then by start hour
pub fn candidate_windows(request: &SearchRequest, base_date: NaiveDate) -> PlannerResult<Vec<MeetingWindow>> {
    request.validate()?;

    let duration = Duration::minutes(request.duration_minutes as i64);
    let mut windows = Vec::new();

    for day in 0..request.horizon_days {
        let date = base_date
            .checked_add_signed(Duration::days(day as i64))
            .ok_or_else(|| PlannerError::InvalidDateTime(format!("{} plus {} days is out of range", base_date, day)))?;
        for hour in request.start_hours() {
            let start = date
                .and_hms_opt(hour, 0, 0)
                .ok_or_else(|| PlannerError::InvalidDateTime(format!("{} {}:00", date, hour)))?;
            let end = start
                .checked_add_signed(duration)
                .ok_or_else(|| PlannerError::InvalidDateTime(format!("{} plus {} min is out of range", start, request.duration_minutes)))?;
            windows.push(MeetingWindow::new(start, end, &request.anchor_timezone));
        }
    }

    Ok(windows)
}

/// Proposes the best meeting windows for a participant set
#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator<'a> {
    evaluator: WindowEvaluator<'a>,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(resolver: &'a OffsetResolver) -> Self {
        CandidateGenerator {
            evaluator: WindowEvaluator::new(resolver),
        }
    }

    /// Enumerate, score and rank candidate windows starting tomorrow (anchor zone).
    ///
    /// Ranking is a stable sort on the score, so equal scores stay in
    /// chronological order. Candidates that cannot be evaluated are skipped.
    pub fn generate(
        &self,
        request: &SearchRequest,
        participants: &[Participant],
        now: DateTime<Utc>,
    ) -> PlannerResult<Vec<CandidateOption>> {
        if participants.is_empty() {
            return Err(PlannerError::NoParticipants);
        }
        request.validate()?;

        let base_date = search_base_date(self.evaluator.converter(), now, &request.anchor_timezone)?;
        let windows = candidate_windows(request, base_date)?;
        log::debug!(
            "Evaluating {} candidate windows for {} participants from {}",
            windows.len(),
            participants.len(),
            base_date
        );

        warn_unresolved_zones(self.evaluator.converter().resolver(), participants);

        let evaluated: Vec<(MeetingWindow, PlannerResult<WindowEvaluation>)> = windows
            .into_par_iter()
            .map(|window| {
                let result = self.evaluator.evaluate_window(&window, participants);
                (window, result)
            })
            .collect();

        let mut options = Vec::with_capacity(evaluated.len());
        for (window, result) in evaluated {
            match result {
                Ok(evaluation) => {
                    let suitability_score = evaluation.working_fraction * 100.0;
                    options.push(CandidateOption {
                        window,
                        evaluation,
                        suitability_score,
                    });
                }
                Err(e) => log::warn!("Skipping candidate {} - {}: {}", window.start, window.end, e),
            }
        }

        options.sort_by(|a, b| b.suitability_score.total_cmp(&a.suitability_score));
        options.truncate(request.top_n);

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::log_capture;
    use chrono::{NaiveDateTime, TimeZone};

    fn civil(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn participant(id: u64, tz: &str) -> Participant {
        Participant {
            id,
            name: format!("P{}", id),
            timezone: tz.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        // 12:00 in Shanghai on 2025-01-14
        Utc.with_ymd_and_hms(2025, 1, 14, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_participants_rejected() {
        let resolver = OffsetResolver::default();
        let request = SearchRequest::new(60, "Asia/Shanghai");
        let result = CandidateGenerator::new(&resolver).generate(&request, &[], now());
        assert_eq!(result, Err(PlannerError::NoParticipants));
    }

    #[test]
    fn test_default_grid() {
        let request = SearchRequest::new(45, "Asia/Shanghai");
        let base = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let windows = candidate_windows(&request, base).unwrap();

        assert_eq!(windows.len(), 7 * 13);
        assert_eq!(windows[0].start, civil(2025, 1, 15, 8, 0));
        assert_eq!(windows[0].end, civil(2025, 1, 15, 8, 45));
        assert_eq!(windows[12].start, civil(2025, 1, 15, 20, 0));
        assert_eq!(windows[13].start, civil(2025, 1, 16, 8, 0));
        assert_eq!(windows[90].start, civil(2025, 1, 21, 20, 0));
    }

    #[test]
    fn test_step_hours() {
        let mut request = SearchRequest::new(30, "UTC");
        request.step_hours = 5;
        request.horizon_days = 1;
        let hours: Vec<u32> = request.start_hours().collect();
        assert_eq!(hours, vec![8, 13, 18]);
    }

    #[test]
    fn test_base_date_is_tomorrow_in_anchor_zone() {
        let resolver = OffsetResolver::default();
        let converter = TimeConverter::new(&resolver);
        // 18:00 UTC is already 02:00 the next day in Shanghai
        let late = Utc.with_ymd_and_hms(2025, 1, 14, 18, 0, 0).unwrap();

        assert_eq!(
            search_base_date(&converter, late, "Asia/Shanghai").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
        );
        assert_eq!(
            search_base_date(&converter, late, "America/New_York").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_ranking_shanghai_and_new_york() {
        let resolver = OffsetResolver::default();
        let request = SearchRequest::new(60, "Asia/Shanghai");
        let people = vec![participant(1, "Asia/Shanghai"), participant(2, "America/New_York")];

        let options = CandidateGenerator::new(&resolver).generate(&request, &people, now()).unwrap();
        assert_eq!(options.len(), 10);

        // Only 09:00 and 10:00 Shanghai suit both sides each day; ties stay chronological
        let expected: Vec<NaiveDateTime> = (15..=19)
            .flat_map(|d| [civil(2025, 1, d, 9, 0), civil(2025, 1, d, 10, 0)])
            .collect();
        let starts: Vec<NaiveDateTime> = options.iter().map(|o| o.window.start).collect();
        assert_eq!(starts, expected);

        for option in &options {
            assert_eq!(option.suitability_score, 100.0);
            assert!(option.evaluation.is_optimal);
            assert_eq!(option.window.anchor_timezone, "Asia/Shanghai");
        }
    }

    #[test]
    fn test_sorted_descending_with_chronological_ties() {
        let resolver = OffsetResolver::default();
        let mut request = SearchRequest::new(90, "Europe/London");
        request.top_n = 91;
        let people = vec![
            participant(1, "Europe/London"),
            participant(2, "Asia/Kolkata"),
            participant(3, "America/Los_Angeles"),
            participant(4, "Australia/Sydney"),
        ];

        let options = CandidateGenerator::new(&resolver).generate(&request, &people, now()).unwrap();
        assert_eq!(options.len(), 91);

        for pair in options.windows(2) {
            assert!(pair[0].suitability_score >= pair[1].suitability_score);
            if pair[0].suitability_score == pair[1].suitability_score {
                assert!(pair[0].window.start < pair[1].window.start);
            }
        }
        for option in &options {
            assert_eq!(option.suitability_score, option.evaluation.working_fraction * 100.0);
        }
    }

    #[test]
    fn test_deterministic_for_fixed_now() {
        let resolver = OffsetResolver::default();
        let generator = CandidateGenerator::new(&resolver);
        let request = SearchRequest::new(60, "Asia/Tokyo");
        let people = vec![participant(1, "Europe/Paris"), participant(2, "America/Chicago")];

        let first = generator.generate(&request, &people, now()).unwrap();
        let second = generator.generate(&request, &people, now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_grid_past_calendar_end_is_an_error() {
        let request = SearchRequest::new(60, "UTC");
        let result = candidate_windows(&request, NaiveDate::MAX);
        assert!(matches!(result, Err(PlannerError::InvalidDateTime(_))));

        let mut one_day = SearchRequest::new(60, "UTC");
        one_day.horizon_days = 1;
        one_day.day_start_hour = 23;
        one_day.day_end_hour = 23;
        assert!(matches!(
            candidate_windows(&one_day, NaiveDate::MAX),
            Err(PlannerError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn test_unknown_zone_warned_once_per_search() {
        log_capture::install();
        let resolver = OffsetResolver::default();
        let request = SearchRequest::new(60, "Asia/Shanghai");
        let people = vec![participant(1, "Asia/Shanghai"), participant(2, "Mars/WholeSearch")];

        let options = CandidateGenerator::new(&resolver).generate(&request, &people, now()).unwrap();
        assert_eq!(options.len(), 10);
        assert_eq!(log_capture::warnings_mentioning("Mars/WholeSearch"), 1);
    }

    #[test]
    fn test_invalid_requests() {
        let resolver = OffsetResolver::default();
        let generator = CandidateGenerator::new(&resolver);
        let people = vec![participant(1, "UTC")];

        let mut zero_duration = SearchRequest::new(0, "UTC");
        assert!(matches!(
            generator.generate(&zero_duration, &people, now()),
            Err(PlannerError::InvalidSearch(_))
        ));
        zero_duration.duration_minutes = 15;
        assert!(generator.generate(&zero_duration, &people, now()).is_ok());

        let mut reversed = SearchRequest::new(60, "UTC");
        reversed.day_start_hour = 18;
        reversed.day_end_hour = 9;
        assert!(reversed.validate().is_err());

        let mut out_of_range = SearchRequest::new(60, "UTC");
        out_of_range.day_end_hour = 24;
        assert!(out_of_range.validate().is_err());

        let mut no_step = SearchRequest::new(60, "UTC");
        no_step.step_hours = 0;
        assert!(no_step.validate().is_err());
    }
}

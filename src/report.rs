// Plain-text rendering of evaluations and recommendations
use crate::evaluator::WindowEvaluation;
use crate::recommender::CandidateOption;
use crate::registry::TimezoneRegistry;
use crate::utils::format_civil;
use std::fmt;

fn working_mark(is_working: bool) -> &'static str {
    if is_working {
        "working hours"
    } else {
        "outside working hours"
    }
}

/// Summary line plus one line per participant
pub struct EvaluationReport<'a> {
    pub evaluation: &'a WindowEvaluation,
    pub registry: &'a TimezoneRegistry,
}

impl fmt::Display for EvaluationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let evaluation = self.evaluation;
        writeln!(
            f,
            "In working hours: {}/{} ({:.1}%){}",
            evaluation.working_count,
            evaluation.total(),
            evaluation.working_percentage(),
            if evaluation.is_optimal { "  [optimal]" } else { "  [needs adjustment]" }
        )?;

        for p in &evaluation.per_participant {
            writeln!(
                f,
                "  {:<16} {:<36} {} - {}  {}{}",
                p.participant.name,
                self.registry.label(&p.participant.timezone),
                format_civil(&p.local_start),
                format_civil(&p.local_end),
                working_mark(p.is_working_hours),
                if p.degraded { " (approximate offset)" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// Ranked options, each with participants' local start times
pub struct CandidatesReport<'a> {
    pub options: &'a [CandidateOption],
}

impl fmt::Display for CandidatesReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.is_empty() {
            return writeln!(f, "No recommendations, check the participant list");
        }

        for (i, option) in self.options.iter().enumerate() {
            writeln!(
                f,
                "Option {:>2}: {} - {} {}  score {:.0}%  ({}/{} in working hours)",
                i + 1,
                format_civil(&option.window.start),
                format_civil(&option.window.end),
                option.window.anchor_timezone,
                option.suitability_score,
                option.evaluation.working_count,
                option.evaluation.total()
            )?;
            for p in &option.evaluation.per_participant {
                writeln!(
                    f,
                    "    {:<16} {}  {}",
                    p.participant.name,
                    format_civil(&p.local_start),
                    working_mark(p.is_working_hours)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{MeetingWindow, WindowEvaluator};
    use crate::participants::ParticipantRoster;
    use crate::recommender::{CandidateGenerator, SearchRequest};
    use crate::timezone_utils::OffsetResolver;
    use crate::utils::parse_civil;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_evaluation() {
        let resolver = OffsetResolver::default();
        let roster = ParticipantRoster::with_defaults();
        let window = MeetingWindow::new(
            parse_civil("2025-01-15T09:00").unwrap(),
            parse_civil("2025-01-15T10:00").unwrap(),
            "Asia/Shanghai",
        );
        let evaluation = WindowEvaluator::new(&resolver)
            .evaluate(&window, roster.participants())
            .unwrap();

        let text = EvaluationReport {
            evaluation: &evaluation,
            registry: resolver.registry(),
        }
        .to_string();
        assert!(text.starts_with("In working hours: 2/2 (100.0%)  [optimal]"));
        assert!(text.contains("2025-01-14 20:00 - 2025-01-14 21:00"));
        assert!(text.contains("Beijing (GMT+8)"));
    }

    #[test]
    fn test_render_candidates() {
        let resolver = OffsetResolver::default();
        let roster = ParticipantRoster::with_defaults();
        let now = Utc.with_ymd_and_hms(2025, 1, 14, 4, 0, 0).unwrap();
        let options = CandidateGenerator::new(&resolver)
            .generate(&SearchRequest::new(60, "Asia/Shanghai"), roster.participants(), now)
            .unwrap();

        let text = CandidatesReport { options: &options }.to_string();
        assert!(text.starts_with("Option  1: 2025-01-15 09:00 - 2025-01-15 10:00 Asia/Shanghai  score 100%"));
        assert!(text.contains("Option 10:"));

        assert!(CandidatesReport { options: &[] }.to_string().starts_with("No recommendations"));
    }
}

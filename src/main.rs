// Cross-timezone meeting slot calculator.
//
// Features:
// - DST-aware wall-clock conversion between IANA zones, nominal-offset fallback
// - Working-hours (09:00-22:59) check per participant for a proposed window
// - Ranked recommendations over the next 7 days, hourly 08:00-20:00 starts
// - Batch evaluation of many windows in parallel with rayon
// - YAML config merged over defaults, CLI flags on top

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use meeting_slot_planner::config::{is_recommended_duration, load_config, Config};
use meeting_slot_planner::convert::TimeConverter;
use meeting_slot_planner::evaluator::{MeetingWindow, WindowEvaluator};
use meeting_slot_planner::participants::{build_roster, ParticipantRoster};
use meeting_slot_planner::recommender::CandidateGenerator;
use meeting_slot_planner::report::{CandidatesReport, EvaluationReport};
use meeting_slot_planner::timezone_utils::{tz_from_name, tz_offset_minutes, ResolverMode};
use meeting_slot_planner::utils::{
    format_civil, load_windows_csv, parse_civil, write_batch_csv, write_candidates_csv,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meeting_slot_planner")]
#[command(about = "Cross-timezone meeting slot calculator", long_about = None)]
struct Args {
    /// YAML config merged over defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (0 = auto-detect)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Use nominal catalog offsets only, ignoring DST
    #[arg(long, global = true, default_value = "false")]
    nominal_only: bool,

    #[command(subcommand)]
    command: Command,
}

/// Participant sources shared by evaluate/recommend/batch
#[derive(clap::Args, Debug)]
struct ParticipantArgs {
    /// Participant as Name@Timezone (repeatable)
    #[arg(long = "participant")]
    participants: Vec<String>,

    /// CSV file with name,timezone columns
    #[arg(long)]
    participants_csv: Option<PathBuf>,
}

impl ParticipantArgs {
    /// CLI participants replace config participants, which replace the built-in pair
    fn roster(&self, cfg: &Config) -> anyhow::Result<ParticipantRoster> {
        build_roster(&self.participants, self.participants_csv.as_deref(), &cfg.participants)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported timezones with nominal and current offsets
    Zones,

    /// Convert a wall-clock time from one zone to another
    Convert {
        /// Wall-clock time, YYYY-MM-DDTHH:MM[:SS]
        #[arg(long)]
        at: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Evaluate one meeting window against the participants
    Evaluate {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Zone the start/end times are expressed in
        #[arg(long)]
        tz: Option<String>,
        #[command(flatten)]
        people: ParticipantArgs,
        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Recommend the best windows over the coming days
    Recommend {
        /// Meeting length in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Days to search, starting tomorrow
        #[arg(long)]
        days: Option<u32>,
        /// Number of options to return
        #[arg(long)]
        top: Option<usize>,
        /// Zone the candidate times are expressed in
        #[arg(long)]
        tz: Option<String>,
        /// Reference "now" as RFC 3339, defaults to the system clock
        #[arg(long)]
        now: Option<String>,
        #[command(flatten)]
        people: ParticipantArgs,
        /// Export options to CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Evaluate every window in a CSV file (start,end,timezone)
    Batch {
        #[arg(long)]
        windows: PathBuf,
        #[command(flatten)]
        people: ParticipantArgs,
        /// Output CSV path
        #[arg(long, default_value = "evaluations.csv")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();

    // Load and merge configuration with CLI priority
    let mut cfg = if let Some(config_path) = &args.config {
        load_config(Some(config_path))?
    } else {
        Config::default()
    };

    if args.nominal_only {
        cfg.live_offsets = false;
    }

    if let Some(w) = args.workers {
        cfg.workers = w;
    }
    if cfg.workers == 0 {
        cfg.workers = num_cpus::get();
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.workers)
        .build_global()?;

    let resolver = cfg.resolver();
    if resolver.mode() == ResolverMode::NominalOnly {
        log::info!("Nominal offsets only, DST is ignored");
    }

    match args.command {
        Command::Zones => {
            let now = Utc::now();
            for zone in resolver.registry().zones() {
                let current = match tz_from_name(&zone.id) {
                    Some(tz) => format!("{:+}", tz_offset_minutes(&now.with_timezone(&tz))),
                    None => "n/a".to_string(),
                };
                println!(
                    "{:<22} {:<40} nominal {:+5} min  now {:>5} min",
                    zone.id, zone.label, zone.nominal_offset_minutes, current
                );
            }
        }

        Command::Convert { at, from, to } => {
            let instant = parse_civil(&at)?;
            let converter = TimeConverter::new(&resolver);
            let converted = converter.convert_tagged(instant, &from, &to)?;
            println!(
                "{} {} → {} {}{}",
                format_civil(&instant),
                from,
                format_civil(&converted.instant),
                to,
                if converted.degraded { " (approximate offset)" } else { "" }
            );
        }

        Command::Evaluate {
            start,
            end,
            tz,
            people,
            json,
        } => {
            let roster = people.roster(&cfg)?;
            let anchor = tz.unwrap_or_else(|| cfg.anchor_timezone());
            let window = MeetingWindow::new(parse_civil(&start)?, parse_civil(&end)?, &anchor);

            let evaluation = WindowEvaluator::new(&resolver).evaluate(&window, roster.participants())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                print!(
                    "{}",
                    EvaluationReport {
                        evaluation: &evaluation,
                        registry: resolver.registry(),
                    }
                );
            }
        }

        Command::Recommend {
            duration,
            days,
            top,
            tz,
            now,
            people,
            csv,
            json,
        } => {
            let roster = people.roster(&cfg)?;

            // CLI overrides YAML (only if explicitly provided)
            let mut request = cfg.search_request();
            if let Some(d) = duration {
                request.duration_minutes = d;
            }
            if let Some(d) = days {
                request.horizon_days = d;
            }
            if let Some(n) = top {
                request.top_n = n;
            }
            if let Some(tz) = tz {
                request.anchor_timezone = tz;
            }
            if !is_recommended_duration(request.duration_minutes) {
                log::warn!(
                    "Duration {} min is outside the usual 15-480 min range in 15 min steps",
                    request.duration_minutes
                );
            }

            let now = match now {
                Some(s) => DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc),
                None => Utc::now(),
            };

            let options = CandidateGenerator::new(&resolver).generate(&request, roster.participants(), now)?;

            if let Some(path) = csv {
                write_candidates_csv(&path, &options)?;
                println!("Wrote {} options → {:?}", options.len(), path);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                print!("{}", CandidatesReport { options: &options });
            }
        }

        Command::Batch {
            windows,
            people,
            out,
        } => {
            let roster = people.roster(&cfg)?;
            let windows = load_windows_csv(&windows)?;
            println!("Evaluating {} windows for {} participants...", windows.len(), roster.len());

            let results = WindowEvaluator::new(&resolver).evaluate_many(&windows, roster.participants());
            let failed = results.iter().filter(|r| r.is_err()).count();
            write_batch_csv(&out, &windows, &results)?;

            println!("Batch done → {:?} ({} failed)", out, failed);
        }
    }

    Ok(())
}

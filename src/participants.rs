// Meeting participants and the in-memory roster
use crate::config::ParticipantEntry;
use crate::error::{PlannerError, PlannerResult};
use crate::registry::DEFAULT_TZ_NAME;
use csv::Reader;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub name: String,
    pub timezone: String,
}

/// CSV row: name,timezone
#[derive(Debug, Deserialize)]
struct ParticipantRecord {
    name: String,
    timezone: String,
}

/// Editable participant list. Evaluations only ever see snapshots of it.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRoster {
    participants: Vec<Participant>,
    next_id: u64,
}

impl ParticipantRoster {
    pub fn new() -> Self {
        ParticipantRoster {
            participants: Vec::new(),
            next_id: 1,
        }
    }

    /// Starter roster: one participant in Beijing, one in New York
    pub fn with_defaults() -> Self {
        let mut roster = Self::new();
        // Both names are non-empty, add cannot fail
        let _ = roster.add("Zhang San", DEFAULT_TZ_NAME);
        let _ = roster.add("John", "America/New_York");
        roster
    }

    /// Add a participant, returning its id. Names are trimmed and must not be empty.
    pub fn add(&mut self, name: &str, timezone: &str) -> PlannerResult<u64> {
        let name = validate_name(name)?;
        let id = self.next_id.max(1);
        self.next_id = id + 1;

        self.participants.push(Participant {
            id,
            name,
            timezone: timezone.trim().to_string(),
        });

        Ok(id)
    }

    pub fn update_name(&mut self, id: u64, name: &str) -> PlannerResult<()> {
        let name = validate_name(name)?;
        self.get_mut(id)?.name = name;
        Ok(())
    }

    pub fn update_timezone(&mut self, id: u64, timezone: &str) -> PlannerResult<()> {
        self.get_mut(id)?.timezone = timezone.trim().to_string();
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> PlannerResult<Participant> {
        let pos = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlannerError::UnknownParticipant(id))?;
        Ok(self.participants.remove(pos))
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Owned copy for handing to a concurrent evaluation
    pub fn snapshot(&self) -> Vec<Participant> {
        self.participants.clone()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    fn get_mut(&mut self, id: u64) -> PlannerResult<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PlannerError::UnknownParticipant(id))
    }
}

fn validate_name(name: &str) -> PlannerResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::InvalidParticipant(
            "name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Parse a `Name@Zone` participant spec, e.g. `John@America/New_York`
pub fn parse_participant_spec(spec: &str) -> PlannerResult<(String, String)> {
    let (name, timezone) = spec.rsplit_once('@').ok_or_else(|| {
        PlannerError::InvalidParticipant(format!("{}: expected Name@Timezone", spec))
    })?;

    let timezone = timezone.trim();
    if timezone.is_empty() {
        return Err(PlannerError::InvalidParticipant(format!(
            "{}: timezone must not be empty",
            spec
        )));
    }

    Ok((validate_name(name)?, timezone.to_string()))
}

/// Load participants from a CSV file with `name,timezone` columns into `roster`
pub fn load_participants_csv(path: &Path, roster: &mut ParticipantRoster) -> anyhow::Result<usize> {
    let mut rdr = Reader::from_path(path)?;
    let mut added = 0;

    for (row, result) in rdr.deserialize().enumerate() {
        let record: ParticipantRecord = result?;
        roster
            .add(&record.name, &record.timezone)
            .map_err(|e| anyhow::anyhow!("Row {}: {}", row + 1, e))?;
        added += 1;
    }

    Ok(added)
}

/// Roster from `Name@Zone` specs and an optional CSV file.
///
/// With neither source given, the configured participants are used, or the
/// starter pair when none are configured. An explicit source that yields
/// nobody is an error rather than a silent switch to the starter pair.
pub fn build_roster(
    specs: &[String],
    csv: Option<&Path>,
    configured: &[ParticipantEntry],
) -> anyhow::Result<ParticipantRoster> {
    let mut roster = ParticipantRoster::new();

    if specs.is_empty() && csv.is_none() {
        if configured.is_empty() {
            return Ok(ParticipantRoster::with_defaults());
        }
        for entry in configured {
            roster.add(&entry.name, &entry.timezone)?;
        }
        return Ok(roster);
    }

    for spec in specs {
        let (name, timezone) = parse_participant_spec(spec)?;
        roster.add(&name, &timezone)?;
    }
    if let Some(path) = csv {
        let added = load_participants_csv(path, &mut roster)?;
        log::debug!("Loaded {} participants from {:?}", added, path);
    }

    if roster.is_empty() {
        return Err(PlannerError::NoParticipants.into());
    }
    Ok(roster)
}

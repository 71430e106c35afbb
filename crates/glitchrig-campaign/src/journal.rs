//! Trial event journal.
//!
//! The campaign hands every completed trial to an [`EventSink`] as a flat
//! [`TrialRecord`]. [`JsonlJournal`] writes one JSON object per line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CampaignError, Result};
use crate::model::{LedState, Outcome, Trial};

/// `event_type` tag of a completed-trial record.
pub const TRIAL_COMPLETE: &str = "trial_complete";

/// Flat, self-contained record of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub event_type: String,
    /// Unix seconds, stamped by the sink when written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    pub trial_id: u64,
    pub tg_ns: u32,
    pub delay_ns: u32,
    pub outcome: Outcome,
    pub trigger_seen: bool,
    pub trigger_cleared: bool,
    #[serde(default)]
    pub led_state: Option<LedState>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<&Trial> for TrialRecord {
    fn from(trial: &Trial) -> Self {
        let observation = trial.observation();
        Self {
            event_type: TRIAL_COMPLETE.to_string(),
            timestamp: None,
            trial_id: trial.id(),
            tg_ns: trial.attack().width_ns,
            delay_ns: trial.attack().delay_ns,
            outcome: trial.outcome().unwrap_or(Outcome::Error),
            trigger_seen: observation.is_some_and(|o| o.trigger_seen),
            trigger_cleared: observation.is_some_and(|o| o.trigger_cleared),
            led_state: observation.and_then(|o| o.led_state),
            notes: observation.and_then(|o| o.notes.clone()),
        }
    }
}

/// Receives one record per completed trial.
pub trait EventSink {
    fn append(&mut self, record: &TrialRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl EventSink for Vec<TrialRecord> {
    fn append(&mut self, record: &TrialRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn append(&mut self, record: &TrialRecord) -> io::Result<()> {
        (**self).append(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Append-only JSON-lines journal.
///
/// Each record is flushed as it is written so a crash loses at most the
/// trial in flight.
#[derive(Debug)]
pub struct JsonlJournal {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlJournal {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "journal opened");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlJournal {
    fn append(&mut self, record: &TrialRecord) -> io::Result<()> {
        let stamped = TrialRecord {
            timestamp: Some(record.timestamp.unwrap_or_else(unix_now)),
            ..record.clone()
        };
        serde_json::to_writer(&mut self.writer, &stamped)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Read every trial record back from a JSON-lines journal.
///
/// Blank lines and events of other types are skipped. A malformed line is
/// an error carrying its 1-based line number.
pub fn read_journal(path: impl AsRef<Path>) -> Result<Vec<TrialRecord>> {
    let file = File::open(path.as_ref()).map_err(CampaignError::Journal)?;
    let mut records = Vec::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(CampaignError::Journal)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line).map_err(|source| {
            CampaignError::InvalidRecord {
                line: idx + 1,
                source,
            }
        })?;
        if value.get("event_type").and_then(Value::as_str) != Some(TRIAL_COMPLETE) {
            continue;
        }
        let record = serde_json::from_value(value).map_err(|source| {
            CampaignError::InvalidRecord {
                line: idx + 1,
                source,
            }
        })?;
        records.push(record);
    }

    Ok(records)
}

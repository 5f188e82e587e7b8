use std::io;

use serde::Serialize;

use crate::block::BlockResult;
use crate::trial::TrialRecord;

/// Process-wide accumulator, populated monotonically as phases complete and
/// finalized once testing ends (or the session is aborted).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub training_attempts: Vec<BlockResult>,
    pub calibrated_volume: Option<f32>,
    pub testing: Option<BlockResult>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens the session into persistable rows.
    ///
    /// With `keep_all_training`, every training attempt is included and each
    /// row carries its 1-based attempt number so retries stay
    /// distinguishable; otherwise only the last attempt (the qualifying one,
    /// absent an abort) is written, untagged. Testing rows are never tagged.
    pub fn to_log(&self, keep_all_training: bool) -> SessionLog {
        let mut entries = Vec::new();

        if keep_all_training {
            for (idx, attempt) in self.training_attempts.iter().enumerate() {
                entries.extend(attempt.trials.iter().map(|t| LogEntry {
                    attempt: Some(idx as u32 + 1),
                    record: t.clone(),
                }));
            }
        } else if let Some(last) = self.training_attempts.last() {
            entries.extend(last.trials.iter().map(|t| LogEntry {
                attempt: None,
                record: t.clone(),
            }));
        }

        if let Some(testing) = &self.testing {
            entries.extend(testing.trials.iter().map(|t| LogEntry {
                attempt: None,
                record: t.clone(),
            }));
        }

        SessionLog { entries }
    }
}

/// One persistable row: a trial record plus its training attempt identity.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub attempt: Option<u32>,
    #[serde(flatten)]
    pub record: TrialRecord,
}

/// The flat, ordered session log handed to persistence.
#[derive(Debug, Clone, Serialize)]
pub struct SessionLog {
    pub entries: Vec<LogEntry>,
}

/// Persistence collaborator: writes one row per trial record.
pub trait RecordSink {
    fn persist(&mut self, log: &SessionLog) -> io::Result<()>;
}

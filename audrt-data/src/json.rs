use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use audrt_core::{RecordSink, SessionLog};

/// Pretty-printed JSON export of the session log, alongside the CSV.
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for JsonSink {
    fn persist(&mut self, log: &SessionLog) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(file, &log.entries)?;
        log::info!("wrote session log to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use audrt_core::{
        BlockResult, ResponseKey, SessionState, StimulusKind, TrialPhase, TrialRecord,
    };

    use super::*;

    #[test]
    fn export_round_trips_through_serde_json() {
        let mut state = SessionState::new();
        state.testing = Some(BlockResult::new(vec![TrialRecord {
            phase: TrialPhase::Testing,
            stimulus: StimulusKind::Square,
            correct_key: ResponseKey::Left,
            response_correct: true,
            reaction_time: Some(Duration::from_millis(321)),
            with_noise: true,
        }]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        JsonSink::new(&path).persist(&state.to_log(true)).unwrap();

        let value: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["phase"], "testing");
        assert_eq!(rows[0]["correct_key"], "z");
        assert_eq!(rows[0]["reaction_time"], 0.321);
        assert_eq!(rows[0]["with_noise"], true);
    }
}

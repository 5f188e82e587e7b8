use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use audrt_core::{RecordSink, SessionLog};

/// The column contract downstream analysis scripts rely on. The trailing
/// `attempt` column carries training attempt identity when all attempts are
/// kept; it is empty on testing rows.
const HEADER: &str =
    "phase,stimulus_kind,correct_key,response_correct,reaction_time,with_noise,attempt";

/// Writes the session log as one CSV row per trial record.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for CsvSink {
    fn persist(&mut self, log: &SessionLog) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut w = BufWriter::new(File::create(&self.path)?);
        writeln!(w, "{HEADER}")?;
        for entry in &log.entries {
            let r = &entry.record;
            let rt = r
                .reaction_time
                .map(|d| format!("{:.6}", d.as_secs_f64()))
                .unwrap_or_default();
            let attempt = entry.attempt.map(|a| a.to_string()).unwrap_or_default();
            writeln!(
                w,
                "{},{},{},{},{},{},{}",
                r.phase.label(),
                r.stimulus.label(),
                r.correct_key.key_label(),
                r.response_correct,
                rt,
                r.with_noise,
                attempt
            )?;
        }
        w.flush()?;

        log::info!(
            "wrote {} trial rows to {}",
            log.entries.len(),
            self.path.display()
        );
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

    fn sample_log() -> SessionLog {
        let mut state = SessionState::new();
        state.training_attempts.push(BlockResult::new(vec![
            TrialRecord {
                phase: TrialPhase::Training,
                stimulus: StimulusKind::Square,
                correct_key: ResponseKey::Left,
                response_correct: true,
                reaction_time: Some(Duration::from_millis(512)),
                with_noise: false,
            },
            TrialRecord {
                phase: TrialPhase::Training,
                stimulus: StimulusKind::Circle,
                correct_key: ResponseKey::Right,
                response_correct: false,
                reaction_time: None,
                with_noise: false,
            },
        ]));
        state.testing = Some(BlockResult::new(vec![TrialRecord {
            phase: TrialPhase::Testing,
            stimulus: StimulusKind::Circle,
            correct_key: ResponseKey::Right,
            response_correct: true,
            reaction_time: Some(Duration::from_millis(250)),
            with_noise: true,
        }]));
        state.to_log(true)
    }

    #[test]
    fn rows_follow_the_column_contract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        CsvSink::new(&path).persist(&sample_log()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "phase,stimulus_kind,correct_key,response_correct,reaction_time,with_noise,attempt"
        );
        assert_eq!(lines[1], "training,square,z,true,0.512000,false,1");
        assert_eq!(lines[2], "training,circle,m,false,,false,1");
        assert_eq!(lines[3], "testing,circle,m,true,0.250000,true,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("session.csv");
        CsvSink::new(&path).persist(&sample_log()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn empty_log_writes_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        CsvSink::new(&path)
            .persist(&SessionState::new().to_log(true))
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}

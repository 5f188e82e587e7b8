use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::key::ResponseKey;
use crate::phase::TrialPhase;
use crate::stimulus::StimulusKind;

/// Immutable per-trial configuration, drawn by the block runner and consumed
/// once by the trial executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSpec {
    pub stimulus: StimulusKind,
    pub correct_key: ResponseKey,
    pub with_noise: bool,
}

impl TrialSpec {
    pub fn new(stimulus: StimulusKind, with_noise: bool) -> Self {
        Self {
            stimulus,
            correct_key: stimulus.correct_key(),
            with_noise,
        }
    }
}

/// Recorded outcome of one trial.
///
/// `reaction_time` is present exactly when a category key arrived before the
/// response window closed; a timed-out trial is scored incorrect with no
/// reaction time.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub phase: TrialPhase,
    #[serde(rename = "stimulus_kind")]
    pub stimulus: StimulusKind,
    pub correct_key: ResponseKey,
    pub response_correct: bool,
    #[serde(serialize_with = "secs_or_null")]
    pub reaction_time: Option<Duration>,
    pub with_noise: bool,
}

fn secs_or_null<S: Serializer>(rt: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match rt {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_derives_key_from_stimulus() {
        let spec = TrialSpec::new(StimulusKind::Square, false);
        assert_eq!(spec.correct_key, ResponseKey::Left);
        let spec = TrialSpec::new(StimulusKind::Circle, true);
        assert_eq!(spec.correct_key, ResponseKey::Right);
        assert!(spec.with_noise);
    }

    #[test]
    fn record_serializes_reaction_time_as_seconds() {
        let record = TrialRecord {
            phase: TrialPhase::Testing,
            stimulus: StimulusKind::Circle,
            correct_key: ResponseKey::Right,
            response_correct: true,
            reaction_time: Some(Duration::from_millis(512)),
            with_noise: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["phase"], "testing");
        assert_eq!(json["stimulus_kind"], "circle");
        assert_eq!(json["correct_key"], "m");
        assert_eq!(json["reaction_time"], 0.512);
    }

    #[test]
    fn missing_reaction_time_serializes_as_null() {
        let record = TrialRecord {
            phase: TrialPhase::Training,
            stimulus: StimulusKind::Square,
            correct_key: ResponseKey::Left,
            response_correct: false,
            reaction_time: None,
            with_noise: false,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["reaction_time"].is_null());
    }
}

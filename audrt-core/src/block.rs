use serde::Serialize;

use crate::trial::TrialRecord;

/// One block's worth of trial records, in presentation order, plus the
/// accuracy computed over them.
#[derive(Debug, Clone, Serialize)]
pub struct BlockResult {
    pub accuracy: f64,
    pub trials: Vec<TrialRecord>,
}

impl BlockResult {
    /// Builds a result from records in presentation order; accuracy is the
    /// fraction of correct responses (0.0 for an empty block).
    pub fn new(trials: Vec<TrialRecord>) -> Self {
        let accuracy = if trials.is_empty() {
            0.0
        } else {
            trials.iter().filter(|t| t.response_correct).count() as f64 / trials.len() as f64
        };
        Self { accuracy, trials }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::key::ResponseKey;
    use crate::phase::TrialPhase;
    use crate::stimulus::StimulusKind;

    fn record(correct: bool) -> TrialRecord {
        TrialRecord {
            phase: TrialPhase::Training,
            stimulus: StimulusKind::Square,
            correct_key: ResponseKey::Left,
            response_correct: correct,
            reaction_time: correct.then(|| Duration::from_millis(400)),
            with_noise: false,
        }
    }

    #[test]
    fn accuracy_is_correct_over_len() {
        let block = BlockResult::new(vec![record(true), record(true), record(false)]);
        assert!((block.accuracy - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn accuracy_stays_in_unit_interval() {
        let all_wrong = BlockResult::new(vec![record(false); 10]);
        assert_eq!(all_wrong.accuracy, 0.0);
        let all_right = BlockResult::new(vec![record(true); 10]);
        assert_eq!(all_right.accuracy, 1.0);
    }

    #[test]
    fn empty_block_has_zero_accuracy() {
        let block = BlockResult::new(Vec::new());
        assert_eq!(block.accuracy, 0.0);
        assert!(block.is_empty());
    }
}

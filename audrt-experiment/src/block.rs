//! Block runner: a fixed-size ordered sequence of randomized trials.

use audrt_audio::AudioSink;
use audrt_core::{BlockResult, StimulusKind, TrialPhase, TrialRecord, TrialSpec};
use audrt_timing::Timer;
use rand::Rng;

use crate::frontend::Frontend;
use crate::session::{Session, SessionError};

impl<F, A, T, R> Session<F, A, T, R>
where
    F: Frontend,
    A: AudioSink,
    T: Timer,
    R: Rng,
{
    /// Runs `n` trials strictly in sequence with randomized stimulus and
    /// (testing only) noise assignment, and returns them in presentation
    /// order. On abort the completed prefix is stashed into the session
    /// state so it still reaches persistence.
    pub(crate) fn run_block(
        &mut self,
        n: usize,
        phase: TrialPhase,
    ) -> Result<BlockResult, SessionError> {
        let mut records: Vec<TrialRecord> = Vec::with_capacity(n);

        for index in 0..n {
            let stimulus = if self.rng.random_bool(0.5) {
                StimulusKind::Square
            } else {
                StimulusKind::Circle
            };
            let with_noise = phase == TrialPhase::Testing && self.rng.random_bool(0.5);
            let spec = TrialSpec::new(stimulus, with_noise);

            log::debug!(
                "{} trial {}/{}: {} (noise: {})",
                phase.label(),
                index + 1,
                n,
                spec.stimulus.label(),
                spec.with_noise
            );

            match self.run_trial(phase, &spec) {
                Ok(record) => records.push(record),
                Err(e) => {
                    self.stash_partial(phase, records);
                    return Err(e);
                }
            }
        }

        Ok(BlockResult::new(records))
    }

    fn stash_partial(&mut self, phase: TrialPhase, records: Vec<TrialRecord>) {
        if records.is_empty() {
            return;
        }
        log::info!(
            "stashing {} completed {} trials from interrupted block",
            records.len(),
            phase.label()
        );
        let block = BlockResult::new(records);
        match phase {
            TrialPhase::Training => self.state.training_attempts.push(block),
            TrialPhase::Testing => self.state.testing = Some(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::testutil::{scripted_session, Plan, ScreenEvent};

    #[test]
    fn training_blocks_never_inject_noise() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct; 50]);
        let block = session.run_block(50, TrialPhase::Training).unwrap();

        assert_eq!(block.len(), 50);
        assert!(block.trials.iter().all(|t| !t.with_noise));
        assert!(session.audio.plays.borrow().is_empty());
    }

    #[test]
    fn testing_blocks_assign_noise_to_roughly_half() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct; 80]);
        let block = session.run_block(80, TrialPhase::Testing).unwrap();

        assert_eq!(block.len(), 80);
        assert!(block.trials.iter().any(|t| t.with_noise));
        assert!(block.trials.iter().any(|t| !t.with_noise));
        let noisy = block.trials.iter().filter(|t| t.with_noise).count();
        assert_eq!(session.audio.plays.borrow().len(), noisy);
    }

    #[test]
    fn records_stay_in_presentation_order() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct; 20]);
        let block = session.run_block(20, TrialPhase::Training).unwrap();

        let shown: Vec<_> = session
            .frontend
            .screens
            .iter()
            .filter_map(|s| match s {
                ScreenEvent::Stimulus(kind) => Some(*kind),
                _ => None,
            })
            .collect();
        let recorded: Vec<_> = block.trials.iter().map(|t| t.stimulus).collect();
        assert_eq!(shown, recorded);
    }

    #[test]
    fn accuracy_reflects_the_scripted_mix() {
        let mut plans = vec![Plan::Correct; 6];
        plans.extend(vec![Plan::Incorrect; 3]);
        plans.push(Plan::Timeout);
        let mut session = scripted_session(SessionConfig::default(), plans);
        let block = session.run_block(10, TrialPhase::Training).unwrap();

        assert!((block.accuracy - 0.6).abs() < 1e-9);
    }

    #[test]
    fn abort_mid_block_stashes_the_completed_prefix() {
        let mut plans = vec![Plan::Correct; 5];
        plans.push(Plan::Abort);
        let mut session = scripted_session(SessionConfig::default(), plans);

        let err = session.run_block(10, TrialPhase::Testing).unwrap_err();
        assert!(matches!(err, SessionError::Aborted));

        let stashed = session.state.testing.as_ref().unwrap();
        assert_eq!(stashed.len(), 5);
        assert!(stashed.trials.iter().all(|t| t.response_correct));
    }

    #[test]
    fn abort_on_the_first_trial_stashes_nothing() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Abort]);
        let err = session.run_block(10, TrialPhase::Training).unwrap_err();
        assert!(matches!(err, SessionError::Aborted));
        assert!(session.state.training_attempts.is_empty());
    }
}

//! Trial executor: one fixation → stimulus (+ disruptor) → response →
//! feedback sequence.

use audrt_audio::AudioSink;
use audrt_core::{KeyInput, ResponseKey, TextColor, TrialPhase, TrialRecord, TrialSpec};
use audrt_timing::Timer;
use rand::Rng;

use crate::frontend::Frontend;
use crate::session::{Session, SessionError, FEEDBACK_CORRECT, FEEDBACK_INCORRECT};

const RESPONSE_KEYS: &[KeyInput] = &[
    KeyInput::Category(ResponseKey::Left),
    KeyInput::Category(ResponseKey::Right),
    KeyInput::Abort,
];

impl<F, A, T, R> Session<F, A, T, R>
where
    F: Frontend,
    A: AudioSink,
    T: Timer,
    R: Rng,
{
    /// Runs one trial exactly once. An abort short-circuits before feedback
    /// and propagates; every other outcome (correct, incorrect, timeout)
    /// produces a record.
    pub(crate) fn run_trial(
        &mut self,
        phase: TrialPhase,
        spec: &TrialSpec,
    ) -> Result<TrialRecord, SessionError> {
        // Keys pressed before onset must never count for this trial.
        self.frontend.flush_input();

        self.frontend.render_fixation()?;
        self.timer.sleep(self.config.fixation());

        // The disruptor is dispatched fire-and-continue immediately before
        // the stimulus flip, so playback and presentation coincide.
        if spec.with_noise {
            let volume = self.volume;
            self.play_noise(volume);
        }
        self.frontend.render_stimulus(spec.stimulus)?;

        let response = self
            .frontend
            .wait_key(Some(self.config.response_window()), RESPONSE_KEYS);

        let (response_correct, reaction_time) = match response {
            Some((KeyInput::Abort, _)) => return Err(SessionError::Aborted),
            Some((KeyInput::Category(key), elapsed)) => {
                (key == spec.correct_key, Some(elapsed))
            }
            Some(_) | None => (false, None),
        };

        let (text, color) = if response_correct {
            (FEEDBACK_CORRECT, TextColor::Green)
        } else {
            (FEEDBACK_INCORRECT, TextColor::Red)
        };
        self.frontend.render_text(text, color)?;
        self.timer.sleep(self.config.feedback());

        Ok(TrialRecord {
            phase,
            stimulus: spec.stimulus,
            correct_key: spec.correct_key,
            response_correct,
            reaction_time,
            with_noise: spec.with_noise,
        })
    }
}

#[cfg(test)]
mod tests {
    use audrt_core::StimulusKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::SessionConfig;
    use crate::session::Session;
    use crate::testutil::{
        scripted_session, short_noise, FailingSink, NoopTimer, Plan, ScriptedFrontend,
    };

    #[test]
    fn correct_response_is_scored_with_reaction_time() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct]);
        let spec = TrialSpec::new(StimulusKind::Square, false);
        let record = session.run_trial(TrialPhase::Training, &spec).unwrap();

        assert!(record.response_correct);
        let rt = record.reaction_time.unwrap();
        assert!(rt <= session.config.response_window());
        assert_eq!(record.stimulus, StimulusKind::Square);
        assert_eq!(record.correct_key, ResponseKey::Left);
    }

    #[test]
    fn wrong_key_keeps_reaction_time_but_scores_incorrect() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Incorrect]);
        let spec = TrialSpec::new(StimulusKind::Circle, false);
        let record = session.run_trial(TrialPhase::Training, &spec).unwrap();

        assert!(!record.response_correct);
        assert!(record.reaction_time.is_some());
    }

    #[test]
    fn timeout_scores_incorrect_with_no_reaction_time() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Timeout]);
        let spec = TrialSpec::new(StimulusKind::Square, false);
        let record = session.run_trial(TrialPhase::Testing, &spec).unwrap();

        assert!(!record.response_correct);
        assert!(record.reaction_time.is_none());
    }

    #[test]
    fn abort_short_circuits_before_feedback() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Abort]);
        let spec = TrialSpec::new(StimulusKind::Square, false);
        let err = session.run_trial(TrialPhase::Testing, &spec).unwrap_err();

        assert!(matches!(err, SessionError::Aborted));
        // Fixation and stimulus were shown, feedback never was.
        assert!(session.frontend.texts().is_empty());
    }

    #[test]
    fn stale_input_is_flushed_before_the_trial() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct]);
        let spec = TrialSpec::new(StimulusKind::Square, false);
        session.run_trial(TrialPhase::Training, &spec).unwrap();
        assert_eq!(session.frontend.flushes, 1);
    }

    #[test]
    fn noisy_trial_dispatches_playback_at_current_volume() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct]);
        session.volume = 0.8;
        let spec = TrialSpec::new(StimulusKind::Circle, true);
        let record = session.run_trial(TrialPhase::Testing, &spec).unwrap();

        assert!(record.with_noise);
        assert_eq!(*session.audio.plays.borrow(), vec![0.8]);
    }

    #[test]
    fn missing_noise_buffer_runs_the_trial_silently() {
        let mut session = scripted_session(SessionConfig::default(), vec![Plan::Correct]);
        session.noise = None;
        let spec = TrialSpec::new(StimulusKind::Circle, true);
        let record = session.run_trial(TrialPhase::Testing, &spec).unwrap();

        assert!(record.with_noise);
        assert!(record.response_correct);
        assert!(session.audio.plays.borrow().is_empty());
    }

    #[test]
    fn playback_failure_downgrades_audio_once() {
        let audio = FailingSink::default();
        let mut session = Session::new(
            SessionConfig::default(),
            ScriptedFrontend::with_plans(vec![Plan::Correct, Plan::Correct]),
            audio.clone(),
            NoopTimer,
            StdRng::seed_from_u64(1),
            Some(short_noise()),
        );

        let spec = TrialSpec::new(StimulusKind::Square, true);
        let first = session.run_trial(TrialPhase::Testing, &spec).unwrap();
        let second = session.run_trial(TrialPhase::Testing, &spec).unwrap();

        assert!(first.response_correct && second.response_correct);
        // Only the first trial tries the device; after that audio is off.
        assert_eq!(*audio.attempts.borrow(), 1);
    }
}

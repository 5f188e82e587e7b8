use audrt_audio::{AudioSink, NoiseBuffer};
use audrt_core::{
    KeyInput, RecordSink, SessionLog, SessionPhase, SessionState, TextColor, TrialPhase,
};
use audrt_timing::Timer;
use rand::Rng;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::frontend::{DisplayError, Frontend};

pub(crate) const CONSENT_TEXT: &str = "Visual Categorization under Auditory Disruption\n\n\
This study examines how an unexpected sound affects response time during a\n\
simple visual categorization task. You will see shapes (circles or squares)\n\
and respond by pressing a key. Sometimes you may hear a brief noise.\n\
Your reaction time and accuracy will be recorded.\n\n\
Participation is voluntary and you may withdraw at any time by pressing ESC.\n\
Responses are kept confidential and used only for research purposes.\n\n\
By pressing ENTER, you agree to participate in this study.";

pub(crate) const INSTRUCTIONS_TEXT: &str = "Categorization Task\n\n\
In this task, you will see a square or a circle.\n\
Press 'Z' for a square and 'M' for a circle.\n\
Respond as quickly and accurately as possible.\n\n\
Press SPACE to begin.";

pub(crate) const TRAINING_FAILED_TEXT: &str =
    "Training failed. You did not reach the required accuracy.\nPlease try again.";

pub(crate) const TRAINING_NOT_PASSED_TEXT: &str =
    "Training accuracy was not reached.\nThe session ends here. Thank you!";

pub(crate) const TESTING_INTRO_TEXT: &str = "Great job!\n\n\
Now you will do the same task, but sometimes there will be noise.\n\n\
Press SPACE to continue.";

pub(crate) const COMPLETION_TEXT: &str = "Experiment completed. Thank you!";

pub(crate) const FEEDBACK_CORRECT: &str = "Correct!";
pub(crate) const FEEDBACK_INCORRECT: &str = "Incorrect!";

/// Session-fatal failures. An abort is deliberately a variant here so it
/// propagates through every layer like an error, but callers treat it as a
/// clean exit, not a fault.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session aborted by participant")]
    Aborted,
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("failed to persist session log: {0}")]
    Persist(#[from] std::io::Error),
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Aborted,
    /// The configured training attempt cap ran out below the accuracy gate.
    TrainingNotPassed,
}

/// Phase controller. Owns the collaborators and drives
/// consent → instructions → training (gated retry) → calibration →
/// testing intro → testing → complete, strictly forward.
pub struct Session<F, A, T, R>
where
    F: Frontend,
    A: AudioSink,
    T: Timer,
    R: Rng,
{
    pub frontend: F,
    pub audio: A,
    pub timer: T,
    pub rng: R,
    pub config: SessionConfig,
    pub phase: SessionPhase,
    pub state: SessionState,
    /// Disruptor waveform; `None` runs the whole session silently.
    pub noise: Option<NoiseBuffer>,
    pub volume: f32,
    audio_ok: bool,
}

impl<F, A, T, R> Session<F, A, T, R>
where
    F: Frontend,
    A: AudioSink,
    T: Timer,
    R: Rng,
{
    pub fn new(
        config: SessionConfig,
        frontend: F,
        audio: A,
        timer: T,
        rng: R,
        noise: Option<NoiseBuffer>,
    ) -> Self {
        let volume = config.initial_volume.clamp(0.0, 1.0);
        Self {
            frontend,
            audio,
            timer,
            rng,
            config,
            phase: SessionPhase::default(),
            state: SessionState::new(),
            noise,
            volume,
            audio_ok: true,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The persistable log under the configured training-attempt policy.
    pub fn log(&self) -> SessionLog {
        self.state.to_log(self.config.persist_all_training_attempts)
    }

    /// Runs the whole session. The log is always handed to `sink` before
    /// this returns with an outcome — including the partial log of an
    /// aborted or training-capped session.
    pub fn run(&mut self, sink: &mut dyn RecordSink) -> Result<SessionOutcome, SessionError> {
        let outcome = match self.run_phases() {
            Ok(outcome) => outcome,
            Err(SessionError::Aborted) => {
                log::info!("abort requested; flushing partial session log");
                SessionOutcome::Aborted
            }
            Err(e) => {
                // Even a fatal frontend failure must not lose the records
                // produced so far.
                if let Err(persist_err) = sink.persist(&self.log()) {
                    log::error!("could not flush partial log: {persist_err}");
                }
                return Err(e);
            }
        };

        sink.persist(&self.log())?;

        match outcome {
            SessionOutcome::Completed => {
                self.frontend.render_text(COMPLETION_TEXT, TextColor::White)?;
                self.frontend.flush_input();
                let _ = self.frontend.wait_key(None, DISMISS_KEYS);
            }
            SessionOutcome::TrainingNotPassed => {
                self.frontend
                    .render_text(TRAINING_NOT_PASSED_TEXT, TextColor::White)?;
                self.timer.sleep(self.config.retry_message());
            }
            SessionOutcome::Aborted => {}
        }

        log::info!("session finished: {:?}", outcome);
        Ok(outcome)
    }

    fn run_phases(&mut self) -> Result<SessionOutcome, SessionError> {
        self.show_and_wait(CONSENT_TEXT, &[KeyInput::Confirm, KeyInput::Abort])?;
        self.advance();

        self.show_and_wait(INSTRUCTIONS_TEXT, &[KeyInput::Advance, KeyInput::Abort])?;
        self.advance();

        if !self.run_training()? {
            return Ok(SessionOutcome::TrainingNotPassed);
        }
        self.advance();

        self.run_calibration()?;
        self.advance();

        self.show_and_wait(TESTING_INTRO_TEXT, &[KeyInput::Advance, KeyInput::Abort])?;
        self.advance();

        let block = self.run_block(self.config.testing_trials, TrialPhase::Testing)?;
        log::info!(
            "testing block done: accuracy {:.2} over {} trials",
            block.accuracy,
            block.len()
        );
        self.state.testing = Some(block);
        self.advance();

        Ok(SessionOutcome::Completed)
    }

    /// Gated retry loop. Returns whether the gate was passed; every attempt
    /// lands in `state.training_attempts` either way.
    fn run_training(&mut self) -> Result<bool, SessionError> {
        let gate = self.config.training_accuracy_gate;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            log::info!("training block, attempt {attempt}");
            let block = self.run_block(self.config.training_trials, TrialPhase::Training)?;
            let accuracy = block.accuracy;
            self.state.training_attempts.push(block);

            if accuracy >= gate {
                log::info!("training passed with accuracy {accuracy:.2}");
                return Ok(true);
            }
            log::info!("training accuracy {accuracy:.2} below gate {gate:.2}");

            if let Some(cap) = self.config.max_training_attempts {
                if attempt >= cap {
                    log::warn!("training attempt cap ({cap}) exhausted");
                    return Ok(false);
                }
            }

            self.frontend
                .render_text(TRAINING_FAILED_TEXT, TextColor::Red)?;
            self.timer.sleep(self.config.retry_message());
        }
    }

    /// Volume calibration. No timeout: the screen stays until the volume is
    /// explicitly confirmed (or the session is aborted).
    fn run_calibration(&mut self) -> Result<(), SessionError> {
        const ALLOWED: &[KeyInput] = &[
            KeyInput::VolumeUp,
            KeyInput::VolumeDown,
            KeyInput::Preview,
            KeyInput::Advance,
            KeyInput::Abort,
        ];

        let step = self.config.volume_step;
        let mut volume = self.volume;
        self.frontend.flush_input();
        loop {
            self.frontend.render_calibration(volume)?;
            let Some((key, _)) = self.frontend.wait_key(None, ALLOWED) else {
                continue;
            };
            match key {
                KeyInput::VolumeUp => volume = (volume + step).min(1.0),
                KeyInput::VolumeDown => volume = (volume - step).max(0.0),
                KeyInput::Preview => self.play_noise(volume),
                KeyInput::Advance | KeyInput::Confirm => break,
                KeyInput::Abort => return Err(SessionError::Aborted),
                _ => {}
            }
        }

        self.volume = volume;
        self.state.calibrated_volume = Some(volume);
        log::info!("calibrated volume fixed at {volume:.2}");
        Ok(())
    }

    /// Plays the disruptor if it is available; a playback failure downgrades
    /// audio for the rest of the session instead of failing the trial.
    pub(crate) fn play_noise(&mut self, volume: f32) {
        if !self.audio_ok {
            return;
        }
        let Some(buffer) = &self.noise else {
            return;
        };
        if let Err(e) = self.audio.play(buffer, volume) {
            log::warn!("audio playback failed, continuing silently: {e}");
            self.audio_ok = false;
        }
    }

    fn show_and_wait(&mut self, text: &str, allowed: &[KeyInput]) -> Result<(), SessionError> {
        self.frontend.render_text(text, TextColor::White)?;
        self.frontend.flush_input();
        loop {
            match self.frontend.wait_key(None, allowed) {
                Some((KeyInput::Abort, _)) => return Err(SessionError::Aborted),
                Some(_) => return Ok(()),
                None => continue,
            }
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.phase.next() {
            log::debug!("phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }
}

/// Any key dismisses the completion screen.
pub(crate) const DISMISS_KEYS: &[KeyInput] = &[
    KeyInput::Category(audrt_core::ResponseKey::Left),
    KeyInput::Category(audrt_core::ResponseKey::Right),
    KeyInput::Advance,
    KeyInput::Confirm,
    KeyInput::Preview,
    KeyInput::VolumeUp,
    KeyInput::VolumeDown,
    KeyInput::Abort,
];

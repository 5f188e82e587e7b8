//! Scripted collaborators for driving whole sessions in tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use audrt_audio::{AudioError, AudioResult, AudioSink, NoiseBuffer};
use audrt_core::{KeyInput, RecordSink, SessionLog, StimulusKind, TextColor};
use audrt_timing::Timer;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SessionConfig;
use crate::frontend::{DisplayError, Frontend};
use crate::session::Session;

/// What the scripted participant does on each trial's response wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Press the key matching the stimulus that was just rendered.
    Correct,
    /// Press the other category key.
    Incorrect,
    /// Let the response window elapse.
    Timeout,
    /// Hit escape mid-trial.
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    Fixation,
    Stimulus(StimulusKind),
    Text(String, TextColor),
    Calibration(f32),
}

/// Frontend double: answers trial waits from a plan list (looking at the
/// stimulus it was shown, like a real participant), drives calibration from
/// a key script, and records every screen it renders.
pub struct ScriptedFrontend {
    pub plans: VecDeque<Plan>,
    pub calibration_keys: VecDeque<KeyInput>,
    pub screen_keys: VecDeque<KeyInput>,
    pub screens: Vec<ScreenEvent>,
    pub flushes: usize,
    trial_index: u64,
}

const PROMPT_LATENCY: Duration = Duration::from_millis(40);

impl ScriptedFrontend {
    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        Self {
            plans: plans.into_iter().collect(),
            calibration_keys: VecDeque::new(),
            screen_keys: VecDeque::new(),
            screens: Vec::new(),
            flushes: 0,
            trial_index: 0,
        }
    }

    pub fn stimulus_count(&self) -> usize {
        self.screens
            .iter()
            .filter(|s| matches!(s, ScreenEvent::Stimulus(_)))
            .count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.screens
            .iter()
            .filter_map(|s| match s {
                ScreenEvent::Text(t, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn last_stimulus(&self) -> Option<StimulusKind> {
        self.screens.iter().rev().find_map(|s| match s {
            ScreenEvent::Stimulus(kind) => Some(*kind),
            _ => None,
        })
    }
}

impl Frontend for ScriptedFrontend {
    fn render_fixation(&mut self) -> Result<(), DisplayError> {
        self.screens.push(ScreenEvent::Fixation);
        Ok(())
    }

    fn render_stimulus(&mut self, kind: StimulusKind) -> Result<(), DisplayError> {
        self.screens.push(ScreenEvent::Stimulus(kind));
        Ok(())
    }

    fn render_text(&mut self, text: &str, color: TextColor) -> Result<(), DisplayError> {
        self.screens.push(ScreenEvent::Text(text.to_owned(), color));
        Ok(())
    }

    fn render_calibration(&mut self, volume: f32) -> Result<(), DisplayError> {
        self.screens.push(ScreenEvent::Calibration(volume));
        Ok(())
    }

    fn flush_input(&mut self) {
        self.flushes += 1;
    }

    fn wait_key(
        &mut self,
        timeout: Option<Duration>,
        allowed: &[KeyInput],
    ) -> Option<(KeyInput, Duration)> {
        // A bounded wait over the category keys is a trial response window;
        // the untimed waits are either the calibration screen or a prompt.
        if timeout.is_some() {
            let plan = self.plans.pop_front().unwrap_or(Plan::Timeout);
            self.trial_index += 1;
            let latency = Duration::from_millis(300 + (self.trial_index % 7) * 50);
            let stimulus = self.last_stimulus();
            return match plan {
                Plan::Correct => {
                    let kind = stimulus.expect("response wait without a stimulus");
                    Some((KeyInput::Category(kind.correct_key()), latency))
                }
                Plan::Incorrect => {
                    let kind = stimulus.expect("response wait without a stimulus");
                    let wrong = match kind {
                        StimulusKind::Square => StimulusKind::Circle,
                        StimulusKind::Circle => StimulusKind::Square,
                    };
                    Some((KeyInput::Category(wrong.correct_key()), latency))
                }
                Plan::Timeout => None,
                Plan::Abort => Some((KeyInput::Abort, latency)),
            };
        }

        let is_calibration =
            allowed.contains(&KeyInput::VolumeUp) && !allowed.contains(&KeyInput::Confirm);
        if is_calibration {
            let key = self
                .calibration_keys
                .pop_front()
                .unwrap_or(KeyInput::Advance);
            return Some((key, PROMPT_LATENCY));
        }

        if let Some(key) = self.screen_keys.pop_front() {
            return Some((key, PROMPT_LATENCY));
        }
        allowed
            .iter()
            .copied()
            .find(|k| *k != KeyInput::Abort)
            .map(|k| (k, PROMPT_LATENCY))
    }
}

/// Audio double that records the volume of every dispatched playback.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub plays: Rc<RefCell<Vec<f32>>>,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, _buffer: &NoiseBuffer, volume: f32) -> AudioResult<()> {
        self.plays.borrow_mut().push(volume);
        Ok(())
    }
}

/// Audio double whose every dispatch fails, for degraded-mode tests.
#[derive(Clone, Default)]
pub struct FailingSink {
    pub attempts: Rc<RefCell<usize>>,
}

impl AudioSink for FailingSink {
    fn play(&mut self, _buffer: &NoiseBuffer, _volume: f32) -> AudioResult<()> {
        *self.attempts.borrow_mut() += 1;
        Err(AudioError::StreamBuildError("scripted failure".into()))
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub logs: Vec<SessionLog>,
}

impl RecordSink for MemorySink {
    fn persist(&mut self, log: &SessionLog) -> std::io::Result<()> {
        self.logs.push(log.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct NoopTimer;

impl Timer for NoopTimer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _d: Duration) {}
}

pub fn short_noise() -> NoiseBuffer {
    NoiseBuffer::from_samples(vec![0.25; 64], 8_000)
}

pub type TestSession = Session<ScriptedFrontend, RecordingSink, NoopTimer, StdRng>;

/// A session over scripted collaborators with a fixed seed and a noise
/// buffer present.
pub fn scripted_session(config: SessionConfig, plans: Vec<Plan>) -> TestSession {
    Session::new(
        config,
        ScriptedFrontend::with_plans(plans),
        RecordingSink::default(),
        NoopTimer,
        StdRng::seed_from_u64(7),
        Some(short_noise()),
    )
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session-scoped knobs. Defaults reproduce the published protocol; a
/// `task.json` next to the binary can override any field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub training_trials: usize,
    pub testing_trials: usize,
    /// Minimum training accuracy before the session may move on.
    pub training_accuracy_gate: f64,
    /// `None` keeps the retry loop unbounded; a cap ends the session with
    /// `SessionOutcome::TrainingNotPassed` once exhausted.
    pub max_training_attempts: Option<u32>,
    /// Keep every training attempt in the persisted log (tagged by attempt
    /// number), or only the final one.
    pub persist_all_training_attempts: bool,

    pub fixation_ms: u64,
    pub response_window_ms: u64,
    pub feedback_ms: u64,
    pub retry_message_ms: u64,

    pub noise_duration_ms: u64,
    /// Generation rate used when the audio sink has no preference.
    pub noise_sample_rate: u32,
    pub initial_volume: f32,
    pub volume_step: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            training_trials: 10,
            testing_trials: 80,
            training_accuracy_gate: 0.7,
            max_training_attempts: None,
            persist_all_training_attempts: true,

            fixation_ms: 500,
            response_window_ms: 2_000,
            feedback_ms: 1_000,
            retry_message_ms: 3_000,

            noise_duration_ms: 500,
            noise_sample_rate: 44_100,
            initial_volume: 0.5,
            volume_step: 0.05,
        }
    }
}

impl SessionConfig {
    pub fn fixation(&self) -> Duration {
        Duration::from_millis(self.fixation_ms)
    }

    pub fn response_window(&self) -> Duration {
        Duration::from_millis(self.response_window_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    pub fn retry_message(&self) -> Duration {
        Duration::from_millis(self.retry_message_ms)
    }

    pub fn noise_duration(&self) -> Duration {
        Duration::from_millis(self.noise_duration_ms)
    }
}

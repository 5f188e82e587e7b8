use std::time::Duration;

use audrt_core::{KeyInput, StimulusKind, TextColor};
use thiserror::Error;

/// A frontend failure is fatal for the session; everything the engine can
/// degrade around (audio, persistence retries) has its own path.
#[derive(Debug, Error)]
#[error("display failure: {0}")]
pub struct DisplayError(pub String);

/// The draw/flip + keyboard boundary the engine drives.
///
/// Render calls present a whole screen (the implementation flips the frame
/// itself). `wait_key` blocks until one of `allowed` arrives or the timeout
/// elapses, returning the key and its latency measured from the call; keys
/// outside `allowed` are discarded, and when several keys are pending the
/// chronologically first allowed one wins. `flush_input` drops anything
/// still queued so stale presses are never attributed to a new wait.
pub trait Frontend {
    fn render_fixation(&mut self) -> Result<(), DisplayError>;
    fn render_stimulus(&mut self, kind: StimulusKind) -> Result<(), DisplayError>;
    fn render_text(&mut self, text: &str, color: TextColor) -> Result<(), DisplayError>;
    fn render_calibration(&mut self, volume: f32) -> Result<(), DisplayError>;

    fn flush_input(&mut self);
    fn wait_key(
        &mut self,
        timeout: Option<Duration>,
        allowed: &[KeyInput],
    ) -> Option<(KeyInput, Duration)>;
}

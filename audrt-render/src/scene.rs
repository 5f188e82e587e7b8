use audrt_core::{StimulusKind, TextColor};

/// A whole screen, as the engine describes it. The engine redraws on
/// discrete transitions only, so a scene is self-contained rather than a
/// diff against the previous frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Scene {
    Blank,
    Fixation,
    Stimulus(StimulusKind),
    Text { content: String, color: TextColor },
    Calibration { volume: f32 },
}

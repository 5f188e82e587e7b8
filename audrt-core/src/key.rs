use serde::Serialize;

/// The two category response keys. Serialized with the physical key labels
/// the task binds them to, matching the recorded data vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseKey {
    #[serde(rename = "z")]
    Left,
    #[serde(rename = "m")]
    Right,
}

impl ResponseKey {
    pub fn key_label(self) -> &'static str {
        match self {
            ResponseKey::Left => "z",
            ResponseKey::Right => "m",
        }
    }
}

/// Everything the keyboard can say to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A category response (`z` / `m`).
    Category(ResponseKey),
    /// Space: advance past an instruction screen, confirm calibration.
    Advance,
    /// Enter: agree on the consent screen.
    Confirm,
    /// `p`: preview the noise at the currently selected volume.
    Preview,
    VolumeUp,
    VolumeDown,
    /// Escape: terminate the session, flushing whatever was recorded.
    Abort,
}

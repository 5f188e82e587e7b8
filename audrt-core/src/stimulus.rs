use serde::Serialize;

use crate::key::ResponseKey;

/// Visual stimulus categories shown during a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusKind {
    Square,
    Circle,
}

impl StimulusKind {
    /// Fixed category mapping: square answers with the left key, circle with
    /// the right key.
    pub fn correct_key(self) -> ResponseKey {
        match self {
            StimulusKind::Square => ResponseKey::Left,
            StimulusKind::Circle => ResponseKey::Right,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StimulusKind::Square => "square",
            StimulusKind::Circle => "circle",
        }
    }
}

/// Text colors the task ever uses on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    White,
    Green,
    Red,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mapping_is_fixed() {
        assert_eq!(StimulusKind::Square.correct_key(), ResponseKey::Left);
        assert_eq!(StimulusKind::Circle.correct_key(), ResponseKey::Right);
    }
}

use serde::Serialize;

/// Phase tag carried by every trial record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialPhase {
    Training,
    Testing,
}

impl TrialPhase {
    pub fn label(self) -> &'static str {
        match self {
            TrialPhase::Training => "training",
            TrialPhase::Testing => "testing",
        }
    }
}

/// Session flow states. Transitions are strictly forward except the
/// training retry loop, which the phase controller drives explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Consent,
    Instructions,
    Training,
    Calibration,
    TestingIntro,
    Testing,
    Complete,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Consent
    }
}

impl SessionPhase {
    pub fn next(self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Consent => Instructions,
            Instructions => Training,
            Training => Calibration,
            Calibration => TestingIntro,
            TestingIntro => Testing,
            Testing => Complete,
            Complete => return None,
        })
    }

    /// The trial phase run while in this state, if it runs blocks at all.
    pub fn trial_phase(self) -> Option<TrialPhase> {
        match self {
            SessionPhase::Training => Some(TrialPhase::Training),
            SessionPhase::Testing => Some(TrialPhase::Testing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_forward_to_completion() {
        let mut phase = SessionPhase::default();
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                SessionPhase::Consent,
                SessionPhase::Instructions,
                SessionPhase::Training,
                SessionPhase::Calibration,
                SessionPhase::TestingIntro,
                SessionPhase::Testing,
                SessionPhase::Complete,
            ]
        );
        assert_eq!(SessionPhase::Complete.next(), None);
    }

    #[test]
    fn only_block_phases_carry_a_trial_phase() {
        assert_eq!(
            SessionPhase::Training.trial_phase(),
            Some(TrialPhase::Training)
        );
        assert_eq!(
            SessionPhase::Testing.trial_phase(),
            Some(TrialPhase::Testing)
        );
        assert_eq!(SessionPhase::Calibration.trial_phase(), None);
        assert_eq!(SessionPhase::Complete.trial_phase(), None);
    }
}

pub mod block;
pub mod key;
pub mod phase;
pub mod session;
pub mod stimulus;
pub mod trial;

pub use block::BlockResult;
pub use key::{KeyInput, ResponseKey};
pub use phase::{SessionPhase, TrialPhase};
pub use session::{LogEntry, RecordSink, SessionLog, SessionState};
pub use stimulus::{StimulusKind, TextColor};
pub use trial::{TrialRecord, TrialSpec};

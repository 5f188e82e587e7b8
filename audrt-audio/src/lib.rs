pub mod device;
pub mod error;
pub mod noise;
pub mod sink;

pub use device::{list_output_devices, OutputDevice};
pub use error::{AudioError, AudioResult};
pub use noise::{NoiseBuffer, NoiseProvider};
pub use sink::{AudioSink, CpalSink, NullSink};

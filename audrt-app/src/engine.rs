use std::path::PathBuf;

use audrt_audio::{AudioSink, CpalSink, NoiseProvider, NullSink};
use audrt_data::{CsvSink, JsonSink};
use audrt_core::RecordSink;
use audrt_experiment::{Session, SessionConfig};
use audrt_timing::HighPrecisionTimer;

use crate::frontend::WinitFrontend;

/// Everything the engine thread needs, gathered before the window opens.
pub struct EngineLaunch {
    pub frontend: WinitFrontend,
    pub config: SessionConfig,
    pub device_selection: Option<usize>,
    pub noise_cache: PathBuf,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

/// Runs the whole session on a dedicated thread. The audio sink is opened
/// here because cpal streams must stay on the thread that built them.
pub fn run_engine(launch: EngineLaunch) {
    let EngineLaunch {
        frontend,
        config,
        device_selection,
        noise_cache,
        csv_path,
        json_path,
    } = launch;

    let (audio, sample_rate): (Box<dyn AudioSink>, u32) =
        match CpalSink::open(device_selection) {
            Ok(sink) => {
                log::info!("audio output: {}", sink.device_name());
                let rate = sink.preferred_sample_rate();
                (Box::new(sink), rate)
            }
            Err(e) => {
                log::warn!("audio device unavailable ({e}); the session runs silently");
                (Box::new(NullSink), config.noise_sample_rate)
            }
        };

    let noise = match NoiseProvider::new(noise_cache)
        .get_or_generate(config.noise_duration(), sample_rate)
    {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            log::warn!("noise unavailable ({e}); noisy trials will run silently");
            None
        }
    };

    let mut session = Session::new(
        config,
        frontend,
        audio,
        HighPrecisionTimer::new(),
        rand::rng(),
        noise,
    );

    let mut csv = CsvSink::new(&csv_path);
    match session.run(&mut csv) {
        Ok(outcome) => {
            log::info!("session outcome: {outcome:?}");
            if let Err(e) = JsonSink::new(&json_path).persist(&session.log()) {
                log::warn!("json export failed: {e}");
            }
        }
        Err(e) => log::error!("session failed: {e}"),
    }

    session.frontend.shutdown();
}

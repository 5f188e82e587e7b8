use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream};

use crate::device::resolve_device;
use crate::error::{AudioError, AudioResult};
use crate::noise::NoiseBuffer;

/// Playback collaborator. `play` dispatches the buffer and returns without
/// waiting for it to finish; the engine never reads completion status.
pub trait AudioSink {
    fn play(&mut self, buffer: &NoiseBuffer, volume: f32) -> AudioResult<()>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn play(&mut self, buffer: &NoiseBuffer, volume: f32) -> AudioResult<()> {
        (**self).play(buffer, volume)
    }
}

/// Degraded mode: swallows playback so noisy trials run silently.
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _buffer: &NoiseBuffer, _volume: f32) -> AudioResult<()> {
        Ok(())
    }
}

/// One-shot playback through a cpal output device.
///
/// Each `play` builds a fresh output stream over the shared buffer and lets
/// it run in the audio callback thread; starting a new playback drops (and
/// thereby stops) the previous one. Not `Send`: it lives on the engine
/// thread that created it.
pub struct CpalSink {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    active: Option<Stream>,
}

impl CpalSink {
    /// Opens the selected output (by enumeration index), or the system
    /// default when no selection was made.
    pub fn open(selection: Option<usize>) -> AudioResult<Self> {
        let device = resolve_device(selection)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?;
        Ok(Self {
            device,
            config,
            active: None,
        })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "<unknown device>".into())
    }

    /// Sample rate the device will run at; the noise provider generates at
    /// this rate so playback needs no resampling.
    pub fn preferred_sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }
}

impl AudioSink for CpalSink {
    fn play(&mut self, buffer: &NoiseBuffer, volume: f32) -> AudioResult<()> {
        if self.config.sample_format() != SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat(format!(
                "{:?}",
                self.config.sample_format()
            )));
        }
        if buffer.sample_rate() != self.preferred_sample_rate() {
            log::debug!(
                "noise buffer at {} Hz, device at {} Hz; playing as-is",
                buffer.sample_rate(),
                self.preferred_sample_rate()
            );
        }

        let samples = buffer.samples().clone();
        let volume = volume.clamp(0.0, 1.0);
        let channels = self.config.channels().max(1) as usize;
        let mut pos = 0usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config.config(),
                move |data: &mut [f32], _| {
                    for frame in data.chunks_mut(channels) {
                        let s = samples.get(pos).copied().unwrap_or(0.0) * volume;
                        for out in frame.iter_mut() {
                            *out = s;
                        }
                        pos += 1;
                    }
                },
                |e| log::warn!("audio stream error: {e}"),
                None,
            )
            .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

        // Fire and continue; replacing the handle stops any prior playback.
        self.active = Some(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_any_buffer() {
        let buffer = NoiseBuffer::from_samples(vec![0.0; 8], 8_000);
        assert!(NullSink.play(&buffer, 0.5).is_ok());
        assert!(Box::new(NullSink).play(&buffer, 2.0).is_ok());
    }
}

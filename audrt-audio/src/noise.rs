use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rand::Rng;

use crate::error::{AudioError, AudioResult};

/// Immutable mono noise waveform, samples normalized to [-1, 1]. Cheap to
/// clone; playback shares the underlying allocation.
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
}

impl NoiseBuffer {
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &Arc<Vec<f32>> {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Produces the white-noise disruptor, generating it once per installation.
///
/// A cache file on disk wins over regeneration so the disruptor stays
/// acoustically identical across runs; within a session the decoded buffer
/// is reused as-is.
pub struct NoiseProvider {
    cache_path: PathBuf,
    cached: Option<NoiseBuffer>,
}

impl NoiseProvider {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            cached: None,
        }
    }

    pub fn get_or_generate(
        &mut self,
        duration: Duration,
        sample_rate: u32,
    ) -> AudioResult<NoiseBuffer> {
        if let Some(buffer) = &self.cached {
            return Ok(buffer.clone());
        }

        let buffer = if self.cache_path.is_file() {
            let buffer = self.load_cache()?;
            log::info!(
                "loaded cached noise buffer from {} ({} samples at {} Hz)",
                self.cache_path.display(),
                buffer.samples.len(),
                buffer.sample_rate
            );
            buffer
        } else {
            let buffer = generate(duration, sample_rate);
            log::info!(
                "generated {} ms of white noise at {} Hz",
                duration.as_millis(),
                sample_rate
            );
            // A failed cache write is not fatal: the buffer is still good for
            // this session, the next run just regenerates.
            if let Err(e) = self.write_cache(&buffer) {
                log::warn!("could not cache noise buffer: {e}");
            }
            buffer
        };

        self.cached = Some(buffer.clone());
        Ok(buffer)
    }

    fn load_cache(&self) -> AudioResult<NoiseBuffer> {
        let mut reader = WavReader::open(&self.cache_path)
            .map_err(|e| AudioError::NoiseUnavailable(e.to_string()))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::NoiseUnavailable(e.to_string()))?,
            SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| AudioError::NoiseUnavailable(e.to_string()))?
            }
        };

        // Fold multi-channel caches down to mono.
        let channels = spec.channels.max(1) as usize;
        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        if samples.is_empty() {
            return Err(AudioError::NoiseUnavailable(format!(
                "{} holds no samples",
                self.cache_path.display()
            )));
        }

        Ok(NoiseBuffer {
            samples: Arc::new(samples),
            sample_rate: spec.sample_rate,
        })
    }

    fn write_cache(&self, buffer: &NoiseBuffer) -> hound::Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&self.cache_path, spec)?;
        for &s in buffer.samples.iter() {
            writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()
    }
}

fn generate(duration: Duration, sample_rate: u32) -> NoiseBuffer {
    let len = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
    let mut rng = rand::rng();
    let samples: Vec<f32> = (0..len).map(|_| rng.random_range(-1.0..=1.0)).collect();
    NoiseBuffer::from_samples(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_SECOND: Duration = Duration::from_millis(500);

    #[test]
    fn generated_noise_is_normalized_mono() {
        let buffer = generate(HALF_SECOND, 44_100);
        assert_eq!(buffer.samples.len(), 22_050);
        assert_eq!(buffer.sample_rate(), 44_100);
        assert!(buffer.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!((buffer.duration().as_secs_f64() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn provider_memoizes_within_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = NoiseProvider::new(dir.path().join("white_noise.wav"));
        let first = provider.get_or_generate(HALF_SECOND, 44_100).unwrap();
        let second = provider.get_or_generate(HALF_SECOND, 44_100).unwrap();
        assert!(Arc::ptr_eq(first.samples(), second.samples()));
    }

    #[test]
    fn cache_file_survives_a_fresh_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white_noise.wav");

        let first = NoiseProvider::new(&path)
            .get_or_generate(HALF_SECOND, 44_100)
            .unwrap();
        assert!(path.is_file());

        let reloaded = NoiseProvider::new(&path)
            .get_or_generate(HALF_SECOND, 44_100)
            .unwrap();
        assert_eq!(reloaded.sample_rate(), first.sample_rate());
        assert_eq!(reloaded.samples().len(), first.samples().len());
        // 16-bit quantization only; the waveform itself must be stable.
        for (a, b) in first.samples().iter().zip(reloaded.samples().iter()) {
            assert!((a - b).abs() < 2.0 / i16::MAX as f32);
        }
    }

    #[test]
    fn unreadable_cache_reports_noise_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white_noise.wav");
        std::fs::write(&path, b"not a wav file").unwrap();

        let err = NoiseProvider::new(&path)
            .get_or_generate(HALF_SECOND, 44_100)
            .unwrap_err();
        assert!(matches!(err, AudioError::NoiseUnavailable(_)));
    }
}

//! Audio file loading and decoding

use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur during track loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("File contains no audio samples")]
    Empty,
}

/// A decoded mono track
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    /// Mono samples (f32, normalized to -1.0 to 1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source file before mixdown
    pub source_channels: u16,
    /// Duration in seconds
    pub duration_secs: f64,
}

/// Audio file loader using Symphonia
#[derive(Debug, Clone, Default)]
pub struct TrackLoader {
    /// Resample to this rate; `None` keeps the file's native rate
    target_sample_rate: Option<u32>,
}

impl TrackLoader {
    /// Create a loader that keeps the file's native sample rate
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader that resamples to a fixed rate
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self {
            target_sample_rate: Some(target_sample_rate),
        }
    }

    /// Load, decode and mix down an audio file
    pub fn load(&self, path: &Path) -> Result<LoadedTrack, LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create hint from file extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::UnsupportedFormat(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let mut sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let mut channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut mono: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    tracing::debug!("Stopping at unreadable packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::debug!("Skipping undecodable packet: {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            sample_rate = spec.rate;
            let frame_channels = spec.channels.count().max(1);
            channels = frame_channels as u16;

            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            // Mix down by averaging channels
            mono.extend(
                sample_buf
                    .samples()
                    .chunks(frame_channels)
                    .map(|frame| frame.iter().sum::<f32>() / frame_channels as f32),
            );
        }

        if mono.is_empty() {
            return Err(LoadError::Empty);
        }

        let duration_secs = mono.len() as f64 / sample_rate as f64;

        let (samples, sample_rate) = match self.target_sample_rate {
            Some(target) if target != sample_rate => (resample(&mono, sample_rate, target)?, target),
            _ => (mono, sample_rate),
        };

        tracing::debug!(
            path = %path.display(),
            sample_rate,
            channels,
            duration_secs,
            "Decoded track"
        );

        Ok(LoadedTrack {
            samples,
            sample_rate,
            source_channels: channels,
            duration_secs,
        })
    }
}

/// Resample mono audio to `target_rate`
fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>, LoadError> {
    use rubato::{FftFixedInOut, Resampler};

    let mut resampler =
        FftFixedInOut::<f32>::new(source_rate as usize, target_rate as usize, 1024, 1)
            .map_err(|e| LoadError::Decode(e.to_string()))?;

    let chunk_size = resampler.input_frames_next();
    let expected_len = (samples.len() as u64 * target_rate as u64 / source_rate as u64) as usize;
    let mut output = Vec::with_capacity(expected_len);

    let mut chunks = samples.chunks_exact(chunk_size);
    for chunk in &mut chunks {
        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| LoadError::Decode(e.to_string()))?;
        output.extend_from_slice(&resampled[0]);
    }

    // Pad the remainder with zeros, then cut the output back to length
    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let mut padded = remainder.to_vec();
        padded.resize(chunk_size, 0.0);
        let resampled = resampler
            .process(&[padded.as_slice()], None)
            .map_err(|e| LoadError::Decode(e.to_string()))?;
        output.extend_from_slice(&resampled[0]);
    }

    output.truncate(expected_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_wav(dir: &Path, name: &str, channels: u16, rate: u32, frames: usize) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            // Left channel at half scale, right channel silent
            let value = if i % 100 < 50 { i16::MAX / 2 } else { -(i16::MAX / 2) };
            writer.write_sample(value).unwrap();
            for _ in 1..channels {
                writer.write_sample(0i16).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_load_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(dir.path(), "tone.wav", 1, 22050, 22050);

        let track = TrackLoader::new().load(&path).unwrap();
        assert_eq!(track.sample_rate, 22050);
        assert_eq!(track.source_channels, 1);
        assert_eq!(track.samples.len(), 22050);
        assert!((track.duration_secs - 1.0).abs() < 1e-9);
        assert!((track.samples[0] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_stereo_is_mixed_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(dir.path(), "stereo.wav", 2, 44100, 44100 / 2);

        let track = TrackLoader::new().load(&path).unwrap();
        assert_eq!(track.source_channels, 2);
        assert_eq!(track.samples.len(), 44100 / 2);
        assert!((track.duration_secs - 0.5).abs() < 1e-9);
        // Half-scale left averaged with a silent right
        assert!((track.samples[0] - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_resample_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(dir.path(), "native.wav", 1, 44100, 44100);

        let track = TrackLoader::with_sample_rate(22050).load(&path).unwrap();
        assert_eq!(track.sample_rate, 22050);
        assert_eq!(track.samples.len(), 22050);
        assert!((track.duration_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file() {
        let result = TrackLoader::new().load(Path::new("/nonexistent/track.wav"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(TrackLoader::new().load(&path).is_err());
    }
}

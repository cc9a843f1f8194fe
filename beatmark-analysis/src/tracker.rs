//! Tempo estimation and beat placement from an onset envelope

use crate::error::AnalysisError;
use crate::frames::{frame_time, frames_per_second};

/// Grid tempo used when nothing could be tracked
const FALLBACK_BPM: f64 = 120.0;

/// Output of the beat tracker
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedBeats {
    /// Estimated tempo
    pub bpm: f64,
    /// Beat positions in seconds, strictly increasing
    pub beats: Vec<f64>,
    /// Autocorrelation strength of the chosen period (0.0 - 1.0)
    pub confidence: f32,
}

impl TrackedBeats {
    fn untracked() -> Self {
        Self {
            bpm: FALLBACK_BPM,
            beats: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Whether the tracker found any beats
    pub fn is_tracked(&self) -> bool {
        !self.beats.is_empty()
    }
}

/// Estimates tempo by autocorrelation and places beats on strong onsets
pub struct BeatTracker {
    sample_rate: u32,
    hop_length: usize,
    min_bpm: f64,
    max_bpm: f64,
    /// Tempo the log-Gaussian prior is centred on
    prior_bpm: f64,
}

impl BeatTracker {
    /// Create a tracker searching 60-200 BPM
    pub fn new(sample_rate: u32, hop_length: usize) -> Self {
        Self {
            sample_rate,
            hop_length,
            min_bpm: 60.0,
            max_bpm: 200.0,
            prior_bpm: 120.0,
        }
    }

    fn frames_per_second(&self) -> f64 {
        frames_per_second(self.sample_rate, self.hop_length)
    }

    /// Lag range in envelope frames covering the tempo search range
    fn lag_range(&self) -> (usize, usize) {
        let fps = self.frames_per_second();
        let min_lag = ((fps * 60.0 / self.max_bpm) as usize).max(1);
        let max_lag = ((fps * 60.0 / self.min_bpm) as usize).max(min_lag + 1);
        (min_lag, max_lag)
    }

    /// Estimate tempo and beat positions.
    ///
    /// An envelope that is silent or shorter than two of the longest lags
    /// yields no beats at the fallback tempo.
    pub fn track(&self, envelope: &[f32]) -> Result<TrackedBeats, AnalysisError> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(self.sample_rate));
        }
        if self.hop_length == 0 {
            return Err(AnalysisError::InvalidHopLength(self.hop_length));
        }

        let (_, max_lag) = self.lag_range();
        let required = 2 * max_lag;
        if envelope.len() < required {
            tracing::debug!(
                frames = envelope.len(),
                required,
                "Onset envelope too short to estimate tempo, no beats tracked"
            );
            return Ok(TrackedBeats::untracked());
        }

        let peak = envelope.iter().copied().fold(0.0f32, f32::max);
        if peak <= 0.0 {
            tracing::debug!("Onset envelope is silent, no beats tracked");
            return Ok(TrackedBeats::untracked());
        }

        // Work on a peak-normalised copy so penalties share one scale
        let normalized: Vec<f32> = envelope.iter().map(|v| v / peak).collect();

        let (bpm, confidence) = self.estimate_tempo(&normalized);
        let frames = self.place_beats(&normalized, bpm);
        let frames = trim_weak_edges(&normalized, frames);

        let beats = frames
            .into_iter()
            .map(|f| frame_time(f, self.sample_rate, self.hop_length))
            .collect();

        Ok(TrackedBeats {
            bpm,
            beats,
            confidence,
        })
    }

    /// Normalised autocorrelation at `lag`
    fn correlation_at_lag(&self, onset_fn: &[f32], lag: usize) -> f32 {
        if lag == 0 || lag >= onset_fn.len() {
            return 0.0;
        }

        let mut correlation: f32 = 0.0;
        let mut norm_a: f32 = 0.0;
        let mut norm_b: f32 = 0.0;

        for i in 0..(onset_fn.len() - lag) {
            correlation += onset_fn[i] * onset_fn[i + lag];
            norm_a += onset_fn[i] * onset_fn[i];
            norm_b += onset_fn[i + lag] * onset_fn[i + lag];
        }

        let norm = (norm_a * norm_b).sqrt();
        if norm > 0.0 {
            correlation / norm
        } else {
            0.0
        }
    }

    /// Pick the lag with the best prior-weighted autocorrelation
    fn estimate_tempo(&self, onset_fn: &[f32]) -> (f64, f32) {
        let fps = self.frames_per_second();
        let (min_lag, max_lag) = self.lag_range();

        let mut best_lag = min_lag;
        let mut best_score = f32::NEG_INFINITY;
        let mut best_correlation = 0.0f32;

        for lag in min_lag..=max_lag {
            let correlation = self.correlation_at_lag(onset_fn, lag);
            let bpm = fps * 60.0 / lag as f64;
            // One-octave standard deviation around the prior tempo
            let octaves = (bpm / self.prior_bpm).log2();
            let weight = (-0.5 * octaves * octaves).exp() as f32;
            let score = correlation * weight;

            if score > best_score {
                best_score = score;
                best_lag = lag;
                best_correlation = correlation;
            }
        }

        let raw_bpm = fps * 60.0 / best_lag as f64;
        let bpm = self.disambiguate_octave(onset_fn, raw_bpm);
        (bpm, best_correlation.clamp(0.0, 1.0))
    }

    /// Fold tempos at the edge of the search range back toward the prior
    /// when the doubled or halved period correlates nearly as well
    fn disambiguate_octave(&self, onset_fn: &[f32], raw_bpm: f64) -> f64 {
        let fps = self.frames_per_second();
        let lag_for = |bpm: f64| (fps * 60.0 / bpm).round() as usize;

        if raw_bpm < 70.0 && raw_bpm * 2.0 <= self.max_bpm {
            let original = self.correlation_at_lag(onset_fn, lag_for(raw_bpm));
            let doubled = self.correlation_at_lag(onset_fn, lag_for(raw_bpm * 2.0));
            if doubled > original * 0.7 {
                return raw_bpm * 2.0;
            }
        }

        if raw_bpm > 180.0 && raw_bpm / 2.0 >= self.min_bpm {
            let original = self.correlation_at_lag(onset_fn, lag_for(raw_bpm));
            let halved = self.correlation_at_lag(onset_fn, lag_for(raw_bpm / 2.0));
            if halved > original * 1.2 {
                return raw_bpm / 2.0;
            }
        }

        raw_bpm
    }

    /// Place beats one period apart, each snapped to the best onset within
    /// a quarter period of where it was expected
    fn place_beats(&self, onset_fn: &[f32], bpm: f64) -> Vec<usize> {
        let period = self.frames_per_second() * 60.0 / bpm;
        let radius = (period * 0.25) as usize;

        // Anchor on the strongest onset in the first two periods
        let search_end = ((period * 2.0) as usize).clamp(1, onset_fn.len());
        let anchor = onset_fn[..search_end]
            .iter()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (i, &v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            })
            .0;

        let mut frames = vec![anchor];
        let mut previous = anchor as f64;
        loop {
            let expected = previous + period;
            if expected >= onset_fn.len() as f64 {
                break;
            }
            let expected_frame = expected.round() as usize;
            let start = expected_frame.saturating_sub(radius);
            let end = (expected_frame + radius + 1).min(onset_fn.len());

            let mut best_frame = expected_frame.min(onset_fn.len() - 1);
            let mut best_score = f64::NEG_INFINITY;
            for frame in start..end {
                let deviation = (frame as f64 - expected) / period;
                let score = onset_fn[frame] as f64 - 2.0 * deviation * deviation;
                if score > best_score {
                    best_score = score;
                    best_frame = frame;
                }
            }

            let last = frames.last().copied().unwrap_or(0);
            if best_frame > last {
                frames.push(best_frame);
                previous = best_frame as f64;
            } else {
                previous = expected;
            }
        }

        frames
    }
}

/// Drop beats at either end whose onset is below half the RMS onset of all
/// placed beats, so untracked silence is left for extrapolation
fn trim_weak_edges(onset_fn: &[f32], frames: Vec<usize>) -> Vec<usize> {
    if frames.is_empty() {
        return frames;
    }

    let mean_square =
        frames.iter().map(|&f| onset_fn[f] * onset_fn[f]).sum::<f32>() / frames.len() as f32;
    let threshold = 0.5 * mean_square.sqrt();

    let strong = |&f: &usize| onset_fn[f] > 0.0 && onset_fn[f] >= threshold;
    let first = frames.iter().position(strong);
    let last = frames.iter().rposition(strong);

    match (first, last) {
        (Some(first), Some(last)) => frames[first..=last].to_vec(),
        _ => Vec::new(),
    }
}

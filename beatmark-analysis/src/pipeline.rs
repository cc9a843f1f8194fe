//! Beat annotation pipeline: classify, add extra beats, extrapolate

use crate::beat::{sort_by_time, Beat};
use crate::classify::classify_beats;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::extra::detect_extra_beats;
use crate::extrapolate::extrapolate_beats;

/// Annotate tracked beats with accent levels and fill the track edges.
///
/// `beat_times` must be ascending. The returned sequence is sorted by time.
pub fn annotate(
    beat_times: &[f64],
    envelope: &[f32],
    sample_rate: u32,
    bpm: f64,
    duration: f64,
    config: &AnalysisConfig,
) -> Result<Vec<Beat>, AnalysisError> {
    config.validate()?;
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }

    let mut beats = classify_beats(beat_times, envelope, sample_rate, config);
    tracing::debug!(count = beats.len(), "Classified tracked beats");

    if config.detect_extra {
        let extra = detect_extra_beats(&beats, envelope, sample_rate, config);
        tracing::debug!(count = extra.len(), "Detected extra beats");
        beats.extend(extra);
        sort_by_time(&mut beats);
    }

    extrapolate_beats(beats, bpm, duration, config.min_gap)
}

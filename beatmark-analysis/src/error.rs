//! Errors raised by the analysis stages

use thiserror::Error;

/// Errors that can occur while analysing or annotating beats
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid tempo: {0} BPM (must be positive and finite)")]
    InvalidTempo(f64),
    #[error("Invalid sensitivity: {0} (must be positive and finite)")]
    InvalidSensitivity(f32),
    #[error("Invalid hop length: {0}")]
    InvalidHopLength(usize),
    #[error("Invalid beats per bar: {0}")]
    InvalidBeatsPerBar(usize),
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("Invalid duration: {0} s (must be finite and non-negative)")]
    InvalidDuration(f64),
    #[error("Invalid beat time: {0} s")]
    InvalidBeatTime(f64),
}

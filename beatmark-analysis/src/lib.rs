//! Beat analysis for beatmark
//!
//! Provides the onset strength envelope, tempo and beat tracking, and the
//! annotation pipeline that classifies beats by accent, picks up extra
//! onset peaks, and extrapolates filler beats over untracked track edges.

mod beat;
mod classify;
mod config;
mod error;
mod extra;
mod extrapolate;
mod frames;
mod onset;
mod pipeline;
mod tracker;

pub use beat::{sort_by_time, AccentLevel, Beat};
pub use classify::{accent_for, classify_beats, window_energy};
pub use config::{AnalysisConfig, WindowNormalization, DEFAULT_HOP_LENGTH};
pub use error::AnalysisError;
pub use extra::detect_extra_beats;
pub use extrapolate::extrapolate_beats;
pub use frames::{frame_index, frame_time, frames_per_second};
pub use onset::OnsetAnalyzer;
pub use pipeline::annotate;
pub use tracker::{BeatTracker, TrackedBeats};

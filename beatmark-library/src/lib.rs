//! Track handling for beatmark - decoding, upload staging, analysis, and config

mod analyzer;
mod config;
mod loader;
mod staging;

pub use analyzer::{AnalyzeError, BeatReport, TrackAnalyzer};
pub use config::Config;
pub use loader::{LoadError, LoadedTrack, TrackLoader};
pub use staging::{StagedUpload, StagingError};

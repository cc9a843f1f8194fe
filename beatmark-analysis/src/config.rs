//! Parameters shared by every annotation stage

use crate::error::AnalysisError;

/// Hop length of the onset envelope in samples
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// How the classifier's energy window is averaged near the envelope edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowNormalization {
    /// Divide by the full window size even when the window is clipped,
    /// which under-weights beats near the track edges.
    #[default]
    FullWindow,
    /// Divide by the number of frames actually inside the envelope
    InRange,
}

/// Configuration for one annotation run
///
/// Classification assumes every bar holds `beats_per_bar` beats and that
/// the first tracked beat starts a bar. Results are meaningless for material
/// in another meter.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Multiplier applied to every energy threshold
    pub sensitivity: f32,
    /// Samples between onset envelope frames
    pub hop_length: usize,
    /// Beats in one bar
    pub beats_per_bar: usize,
    /// Half-width of the classifier energy window, in frames
    pub energy_window: usize,
    /// Extra beats closer than this (seconds) to a tracked beat are dropped
    pub min_beat_distance: f64,
    /// Leading/trailing gaps longer than this (seconds) get filler beats
    pub min_gap: f64,
    pub window_normalization: WindowNormalization,
    /// Run the extra-beat detector
    pub detect_extra: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            hop_length: DEFAULT_HOP_LENGTH,
            beats_per_bar: 4,
            energy_window: 5,
            min_beat_distance: 0.1,
            min_gap: 1.0,
            window_normalization: WindowNormalization::FullWindow,
            detect_extra: false,
        }
    }
}

impl AnalysisConfig {
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }

    pub fn with_beats_per_bar(mut self, beats_per_bar: usize) -> Self {
        self.beats_per_bar = beats_per_bar;
        self
    }

    pub fn with_window_normalization(mut self, normalization: WindowNormalization) -> Self {
        self.window_normalization = normalization;
        self
    }

    pub fn with_detect_extra(mut self, detect_extra: bool) -> Self {
        self.detect_extra = detect_extra;
        self
    }

    /// Check the parameters before a run
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(AnalysisError::InvalidSensitivity(self.sensitivity));
        }
        if self.hop_length == 0 {
            return Err(AnalysisError::InvalidHopLength(self.hop_length));
        }
        if self.beats_per_bar == 0 {
            return Err(AnalysisError::InvalidBeatsPerBar(self.beats_per_bar));
        }
        Ok(())
    }
}

//! Energy-based accent classification of tracked beats

use crate::beat::{AccentLevel, Beat};
use crate::config::{AnalysisConfig, WindowNormalization};
use crate::frames::frame_index;

/// Average onset strength in a window of `config.energy_window` frames
/// either side of the frame containing `time`.
pub fn window_energy(envelope: &[f32], time: f64, sample_rate: u32, config: &AnalysisConfig) -> f32 {
    let center = frame_index(time, sample_rate, config.hop_length);
    let half = config.energy_window as i64;

    let mut sum = 0.0f32;
    let mut in_range = 0usize;
    for idx in center.saturating_sub(half)..=center.saturating_add(half) {
        if idx >= 0 && (idx as usize) < envelope.len() {
            sum += envelope[idx as usize];
            in_range += 1;
        }
    }

    let denominator = match config.window_normalization {
        WindowNormalization::FullWindow => 2 * config.energy_window + 1,
        WindowNormalization::InRange => in_range,
    };

    if denominator == 0 {
        0.0
    } else {
        sum / denominator as f32
    }
}

/// Accent level for the `index`-th tracked beat with the given energy
pub fn accent_for(index: usize, energy: f32, config: &AnalysisConfig) -> AccentLevel {
    let s = config.sensitivity;
    let beat_in_bar = index % config.beats_per_bar;

    if beat_in_bar == 0 && energy > 0.75 * s {
        AccentLevel::Downbeat
    } else if beat_in_bar == 2 && energy > 0.5 * s {
        AccentLevel::Strong
    } else if energy > 0.6 * s {
        AccentLevel::Medium
    } else {
        AccentLevel::Weak
    }
}

/// Classify each tracked beat by its local onset energy and bar position.
///
/// Output has one beat per input time, in input order.
pub fn classify_beats(
    beat_times: &[f64],
    envelope: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Vec<Beat> {
    beat_times
        .iter()
        .enumerate()
        .map(|(i, &time)| {
            let energy = window_energy(envelope, time, sample_rate, config);
            Beat::new(time, accent_for(i, energy, config), energy)
        })
        .collect()
}

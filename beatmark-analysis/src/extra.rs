//! Detection of onset peaks the beat tracker skipped

use crate::beat::{AccentLevel, Beat};
use crate::config::AnalysisConfig;
use crate::frames::frame_time;

/// Find local maxima in the onset envelope that are not near an existing beat.
///
/// A frame is a peak when it is strictly greater than both neighbours.
/// Peaks within `config.min_beat_distance` of any beat in `existing`, or at
/// or below `0.3 * sensitivity`, are skipped. The returned beats are in
/// envelope order and must be merged into the main sequence by the caller.
pub fn detect_extra_beats(
    existing: &[Beat],
    envelope: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Vec<Beat> {
    let s = config.sensitivity;
    let mut extra = Vec::new();

    for i in 1..envelope.len().saturating_sub(1) {
        let value = envelope[i];
        if !(value > envelope[i - 1] && value > envelope[i + 1]) {
            continue;
        }

        let time = frame_time(i, sample_rate, config.hop_length);
        let too_close = existing
            .iter()
            .any(|b| (time - b.time).abs() < config.min_beat_distance);

        if !too_close && value > 0.3 * s {
            let level = if value > 0.8 * s {
                AccentLevel::Downbeat
            } else {
                AccentLevel::Strong
            };
            extra.push(Beat::new(time, level, value));
        }
    }

    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_peak() {
        let extra = detect_extra_beats(&[], &[0.1, 0.9, 0.2], 22050, &AnalysisConfig::default());
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].level, AccentLevel::Downbeat);
        assert_eq!(extra[0].strength, 0.9);
        assert_eq!(extra[0].time, 512.0 / 22050.0);
    }

    #[test]
    fn test_medium_peak_is_strong() {
        let extra = detect_extra_beats(&[], &[0.1, 0.5, 0.2], 22050, &AnalysisConfig::default());
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].level, AccentLevel::Strong);
    }

    #[test]
    fn test_weak_peak_is_dropped() {
        let extra = detect_extra_beats(&[], &[0.0, 0.3, 0.0], 22050, &AnalysisConfig::default());
        assert!(extra.is_empty());
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        let extra = detect_extra_beats(
            &[],
            &[0.0, 0.9, 0.9, 0.0],
            22050,
            &AnalysisConfig::default(),
        );
        assert!(extra.is_empty());
    }

    #[test]
    fn test_short_envelopes() {
        let config = AnalysisConfig::default();
        assert!(detect_extra_beats(&[], &[], 22050, &config).is_empty());
        assert!(detect_extra_beats(&[], &[1.0], 22050, &config).is_empty());
        assert!(detect_extra_beats(&[], &[0.0, 1.0], 22050, &config).is_empty());
    }

    #[test]
    fn test_peak_near_existing_beat_is_dropped() {
        let mut envelope = vec![0.0f32; 100];
        envelope[50] = 1.0;
        envelope[80] = 1.0;
        let sr = 22050;
        // Frame 50 is ~1.161s; frame 80 is ~1.858s
        let existing = [Beat::new(1.2, AccentLevel::Medium, 0.7)];

        let extra = detect_extra_beats(&existing, &envelope, sr, &AnalysisConfig::default());
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].time, frame_time(80, sr, 512));
    }

    #[test]
    fn test_sensitivity_raises_floor() {
        let config = AnalysisConfig::default().with_sensitivity(2.0);
        let extra = detect_extra_beats(&[], &[0.0, 0.5, 0.0, 1.0, 0.0], 22050, &config);
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].strength, 1.0);
        assert_eq!(extra[0].level, AccentLevel::Strong);
    }

    proptest! {
        #[test]
        fn prop_never_near_existing(
            envelope in prop::collection::vec(0.0f32..1.5, 0..500),
            existing_times in prop::collection::vec(0.0f64..6.0, 0..20),
        ) {
            let existing: Vec<Beat> = existing_times
                .iter()
                .map(|&t| Beat::new(t, AccentLevel::Medium, 0.5))
                .collect();
            let config = AnalysisConfig::default();
            let extra = detect_extra_beats(&existing, &envelope, 22050, &config);

            for beat in &extra {
                for e in &existing {
                    prop_assert!((beat.time - e.time).abs() >= 0.1);
                }
                let frame = (beat.time * 22050.0 / 512.0).round() as usize;
                prop_assert_eq!(beat.strength, envelope[frame]);
                prop_assert!(beat.strength > 0.3);
            }
        }
    }
}

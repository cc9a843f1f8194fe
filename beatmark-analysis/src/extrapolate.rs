//! Filler beats for untracked regions at the start and end of a track

use crate::beat::Beat;
use crate::error::AnalysisError;

/// Fastest tempo filler beats are generated at
const MAX_FILL_BPM: f64 = 1000.0;

/// Extend a sorted beat sequence so it spans `[0, duration)`.
///
/// When the first beat is more than `min_gap` seconds into the track, filler
/// beats are stepped backwards at the tempo interval down to zero. When the
/// last beat is more than `min_gap` before `duration`, filler beats are
/// stepped forwards until `duration`. Filler beats are weak with zero
/// strength. The output stays sorted without re-sorting.
///
/// Fails on a tempo that is not finite or not in `(0, MAX_FILL_BPM]`, on a
/// non-finite or negative duration, and on non-finite edge beats.
pub fn extrapolate_beats(
    beats: Vec<Beat>,
    bpm: f64,
    duration: f64,
    min_gap: f64,
) -> Result<Vec<Beat>, AnalysisError> {
    if !bpm.is_finite() || bpm <= 0.0 || bpm > MAX_FILL_BPM {
        return Err(AnalysisError::InvalidTempo(bpm));
    }
    if !duration.is_finite() || duration < 0.0 {
        return Err(AnalysisError::InvalidDuration(duration));
    }

    let (first_time, last_time) = match (beats.first(), beats.last()) {
        (Some(first), Some(last)) => (first.time, last.time),
        _ => return Ok(beats),
    };
    for time in [first_time, last_time] {
        if !time.is_finite() {
            return Err(AnalysisError::InvalidBeatTime(time));
        }
    }

    let interval = 60.0 / bpm;

    // Step counts bound both loops against rounding drift
    let mut leading = Vec::new();
    if first_time > min_gap {
        let steps = (first_time / interval).ceil() as usize;
        let mut t = first_time - interval;
        for _ in 0..steps {
            if t < 0.0 {
                break;
            }
            leading.push(Beat::synthetic(t));
            t -= interval;
        }
        leading.reverse();
    }

    let mut trailing = Vec::new();
    if duration - last_time > min_gap {
        let steps = ((duration - last_time) / interval).ceil() as usize;
        let mut t = last_time + interval;
        for _ in 0..steps {
            if t >= duration {
                break;
            }
            trailing.push(Beat::synthetic(t));
            t += interval;
        }
    }

    if !leading.is_empty() || !trailing.is_empty() {
        tracing::debug!(
            leading = leading.len(),
            trailing = trailing.len(),
            interval,
            "Extrapolated filler beats"
        );
    }

    let mut result = leading;
    result.reserve(beats.len() + trailing.len());
    result.extend(beats);
    result.extend(trailing);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::AccentLevel;
    use proptest::prelude::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn times(beats: &[Beat]) -> Vec<f64> {
        beats.iter().map(|b| b.time).collect()
    }

    #[test]
    fn test_fills_both_sides() {
        let beats = vec![Beat::new(2.5, AccentLevel::Downbeat, 1.0)];
        let result = extrapolate_beats(beats, 120.0, 10.0, 1.0).unwrap();

        let expected_leading = [0.0, 0.5, 1.0, 1.5, 2.0];
        let all = times(&result);
        assert_eq!(&all[..5], &expected_leading);
        assert_eq!(all[5], 2.5);
        assert_eq!(result[5].level, AccentLevel::Downbeat);

        let trailing = &all[6..];
        assert_eq!(trailing.len(), 14);
        assert_eq!(trailing[0], 3.0);
        assert_eq!(*trailing.last().unwrap(), 9.5);
        assert!(trailing.iter().all(|&t| t < 10.0));

        for (i, beat) in result.iter().enumerate() {
            if i != 5 {
                assert_eq!(beat.level, AccentLevel::Weak);
                assert_eq!(beat.strength, 0.0);
            }
        }
    }

    #[test]
    fn test_small_gaps_are_left_alone() {
        let beats = vec![
            Beat::new(0.8, AccentLevel::Downbeat, 1.0),
            Beat::new(9.2, AccentLevel::Weak, 0.1),
        ];
        let result = extrapolate_beats(beats.clone(), 120.0, 10.0, 1.0).unwrap();
        assert_eq!(result, beats);
    }

    #[test]
    fn test_gap_must_exceed_threshold() {
        // Exactly one second on each side is not enough
        let beats = vec![
            Beat::new(1.0, AccentLevel::Downbeat, 1.0),
            Beat::new(9.0, AccentLevel::Weak, 0.1),
        ];
        let result = extrapolate_beats(beats.clone(), 120.0, 10.0, 1.0).unwrap();
        assert_eq!(result, beats);
    }

    #[test]
    fn test_empty_passes_through() {
        assert!(extrapolate_beats(Vec::new(), 120.0, 10.0, 1.0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rejects_bad_tempo() {
        for bpm in [0.0, -90.0, f64::NAN, f64::INFINITY, MAX_FILL_BPM * 2.0] {
            let beats = vec![Beat::new(5.0, AccentLevel::Weak, 0.0)];
            assert!(matches!(
                extrapolate_beats(beats, bpm, 10.0, 1.0),
                Err(AnalysisError::InvalidTempo(_))
            ));
        }
        assert!(extrapolate_beats(Vec::new(), 0.0, 10.0, 1.0).is_err());
    }

    /// Run on a worker thread so a hang fails the test instead of stalling it
    fn extrapolate_within_timeout(
        beats: Vec<Beat>,
        bpm: f64,
        duration: f64,
    ) -> Result<Vec<Beat>, AnalysisError> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(extrapolate_beats(beats, bpm, duration, 1.0));
        });
        rx.recv_timeout(Duration::from_secs(3))
            .expect("extrapolation did not terminate")
    }

    #[test]
    fn test_rejects_bad_duration() {
        for duration in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, -1.0] {
            let beats = vec![Beat::new(2.5, AccentLevel::Weak, 0.0)];
            assert!(matches!(
                extrapolate_within_timeout(beats, 120.0, duration),
                Err(AnalysisError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_runaway_tempo() {
        for first in [2.5, 0.5] {
            let beats = vec![Beat::new(first, AccentLevel::Weak, 0.0)];
            assert!(matches!(
                extrapolate_within_timeout(beats, 1e18, 10.0),
                Err(AnalysisError::InvalidTempo(_))
            ));
        }

        let beats = vec![Beat::new(2.5, AccentLevel::Weak, 0.0)];
        let result = extrapolate_within_timeout(beats, MAX_FILL_BPM, 10.0).unwrap();
        assert!(result.windows(2).all(|w| w[0].time <= w[1].time));
        assert!(result.iter().all(|b| b.time >= 0.0 && b.time < 10.0));
    }

    #[test]
    fn test_rejects_non_finite_beat_times() {
        let beats = vec![
            Beat::new(2.5, AccentLevel::Weak, 0.0),
            Beat::new(f64::INFINITY, AccentLevel::Weak, 0.0),
        ];
        assert!(matches!(
            extrapolate_within_timeout(beats, 120.0, 10.0),
            Err(AnalysisError::InvalidBeatTime(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_synthetic_beats_stay_in_bounds(
            mut beat_times in prop::collection::vec(0.0f64..60.0, 1..32),
            bpm in 40.0f64..220.0,
            tail in 0.0f64..20.0,
        ) {
            beat_times.sort_by(f64::total_cmp);
            let first = beat_times[0];
            let last = *beat_times.last().unwrap();
            let duration = last + tail;
            let beats: Vec<Beat> = beat_times
                .iter()
                .map(|&t| Beat::new(t, AccentLevel::Medium, 0.7))
                .collect();

            let result = extrapolate_beats(beats, bpm, duration, 1.0).unwrap();

            prop_assert!(result.windows(2).all(|w| w[0].time <= w[1].time));
            let originals = result.iter().filter(|b| b.strength > 0.0).count();
            prop_assert_eq!(originals, beat_times.len());

            for beat in result.iter().filter(|b| b.strength == 0.0) {
                prop_assert_eq!(beat.level, AccentLevel::Weak);
                prop_assert!(beat.time >= 0.0);
                prop_assert!(beat.time < first || beat.time > last);
                if beat.time > last {
                    prop_assert!(beat.time < duration);
                }
            }
        }
    }
}

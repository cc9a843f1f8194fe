//! Mapping between time offsets and onset envelope frames

/// Frame index covering `time` seconds, `floor(time * sample_rate / hop_length)`.
///
/// Not clamped: callers must check the result against the envelope length.
/// A negative time maps to a negative frame.
pub fn frame_index(time: f64, sample_rate: u32, hop_length: usize) -> i64 {
    (time * sample_rate as f64 / hop_length as f64).floor() as i64
}

/// Start time of `frame` in seconds
pub fn frame_time(frame: usize, sample_rate: u32, hop_length: usize) -> f64 {
    (frame * hop_length) as f64 / sample_rate as f64
}

/// Number of envelope frames per second of audio
pub fn frames_per_second(sample_rate: u32, hop_length: usize) -> f64 {
    sample_rate as f64 / hop_length as f64
}

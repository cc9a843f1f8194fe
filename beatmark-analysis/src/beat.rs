//! Annotated beat types

use serde::{Serialize, Serializer};

/// Perceptual accent of a beat, from strongest (1) to weakest (4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccentLevel {
    /// Bar-start beat with high energy
    Downbeat = 1,
    /// Mid-bar backbeat, or a strong extra onset
    Strong = 2,
    /// Energetic beat off the main bar positions
    Medium = 3,
    /// Quiet beat or synthetic filler
    Weak = 4,
}

impl AccentLevel {
    /// Numeric level (1-4)
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Serialize for AccentLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// A beat with its accent classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Beat {
    /// Position in seconds from track start
    pub time: f64,
    /// Accent level
    pub level: AccentLevel,
    /// Local onset energy (0.0 for synthetic beats)
    pub strength: f32,
}

impl Beat {
    pub fn new(time: f64, level: AccentLevel, strength: f32) -> Self {
        Self {
            time,
            level,
            strength,
        }
    }

    /// Filler beat placed where the tracker found nothing
    pub fn synthetic(time: f64) -> Self {
        Self::new(time, AccentLevel::Weak, 0.0)
    }
}

/// Sort beats by time (stable, NaN-safe)
pub fn sort_by_time(beats: &mut [Beat]) {
    beats.sort_by(|a, b| a.time.total_cmp(&b.time));
}

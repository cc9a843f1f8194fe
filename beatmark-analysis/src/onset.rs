//! Onset strength envelope via log-power spectral flux
//!
//! Frames are centred on multiples of the hop length, so envelope frame `i`
//! lines up with time `i * hop / sample_rate`.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Dynamic range kept below the loudest bin, in dB
const TOP_DB: f32 = 80.0;

/// Computes a per-frame onset strength envelope from mono samples
pub struct OnsetAnalyzer {
    hop_length: usize,
    fft_size: usize,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
}

impl OnsetAnalyzer {
    /// Create an analyzer with a 2048-point FFT
    pub fn new(hop_length: usize) -> Self {
        Self::with_fft_size(hop_length, 2048)
    }

    pub fn with_fft_size(hop_length: usize, fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            hop_length: hop_length.max(1),
            fft_size,
            fft,
            window,
        }
    }

    /// Number of envelope frames produced for `num_samples` samples
    pub fn frame_count(&self, num_samples: usize) -> usize {
        if num_samples == 0 {
            0
        } else {
            1 + num_samples / self.hop_length
        }
    }

    /// Compute the onset strength envelope.
    ///
    /// Each value is the mean positive change in log power across frequency
    /// bins from the previous frame. The first frame is always 0.
    pub fn envelope(&self, samples: &[f32]) -> Vec<f32> {
        let frames = self.frame_count(samples.len());
        if frames == 0 {
            return Vec::new();
        }

        let spectra = self.log_power_spectra(samples, frames);

        let mut envelope = Vec::with_capacity(frames);
        envelope.push(0.0);
        for pair in spectra.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            // Half-wave rectified: only increases indicate onsets
            let flux: f32 = curr
                .iter()
                .zip(prev)
                .map(|(c, p)| (c - p).max(0.0))
                .sum();
            envelope.push(flux / curr.len() as f32);
        }

        envelope
    }

    /// dB power spectra for every frame, floored at `TOP_DB` below the peak
    fn log_power_spectra(&self, samples: &[f32], frames: usize) -> Vec<Vec<f32>> {
        let half = self.fft_size / 2;
        let bins = half + 1;
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.fft_size];
        let mut spectra = Vec::with_capacity(frames);
        let mut peak_db = f32::NEG_INFINITY;

        for frame in 0..frames {
            let center = frame * self.hop_length;

            for (k, slot) in buffer.iter_mut().enumerate() {
                // Zero-pad outside the signal
                let sample = (center + k)
                    .checked_sub(half)
                    .and_then(|idx| samples.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[k], 0.0);
            }

            self.fft.process(&mut buffer);

            let spectrum: Vec<f32> = buffer[..bins]
                .iter()
                .map(|c| 10.0 * c.norm_sqr().max(1e-10).log10())
                .collect();
            peak_db = spectrum.iter().copied().fold(peak_db, f32::max);
            spectra.push(spectrum);
        }

        let floor = peak_db - TOP_DB;
        for spectrum in &mut spectra {
            for v in spectrum.iter_mut() {
                *v = v.max(floor);
            }
        }

        spectra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: usize = 22050;

    fn click_track(seconds: f32, period: f32) -> Vec<f32> {
        let len = (seconds * SR as f32) as usize;
        let step = (period * SR as f32) as usize;
        let mut samples = vec![0.0f32; len];
        let mut pos = step / 2;
        while pos < len {
            for (i, s) in samples[pos..(pos + 200).min(len)].iter_mut().enumerate() {
                // Decaying burst of alternating polarity
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                *s = sign * (-(i as f32) / 40.0).exp();
            }
            pos += step;
        }
        samples
    }

    #[test]
    fn test_empty_input() {
        let analyzer = OnsetAnalyzer::new(512);
        assert!(analyzer.envelope(&[]).is_empty());
    }

    #[test]
    fn test_frame_count() {
        let analyzer = OnsetAnalyzer::new(512);
        assert_eq!(analyzer.frame_count(0), 0);
        assert_eq!(analyzer.frame_count(1), 1);
        assert_eq!(analyzer.frame_count(512), 2);
        assert_eq!(analyzer.envelope(&vec![0.0; 5000]).len(), 1 + 5000 / 512);
    }

    #[test]
    fn test_silence_is_flat() {
        let analyzer = OnsetAnalyzer::new(512);
        let envelope = analyzer.envelope(&vec![0.0; SR]);
        assert!(envelope.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_clicks_produce_peaks() {
        let analyzer = OnsetAnalyzer::new(512);
        let samples = click_track(4.0, 0.5);
        let envelope = analyzer.envelope(&samples);

        assert!(envelope.iter().all(|&v| v >= 0.0));

        // First click at 0.25s sits in frame ~10; the quiet stretch before
        // it (frames 0-4) must be well below the click response
        let click_frame = (0.25 * SR as f32 / 512.0) as usize;
        let around_click = envelope[click_frame - 2..=click_frame + 2]
            .iter()
            .copied()
            .fold(0.0f32, f32::max);
        let before = envelope[1..5].iter().copied().fold(0.0f32, f32::max);
        assert!(around_click > 0.0);
        assert!(around_click > before * 4.0);
    }
}

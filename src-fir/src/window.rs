//! Symmetric window functions for frequency sampling designs

use std::f64::consts::PI;

/// Window function types for FIR filter design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Rectangular window (no windowing)
    Rectangular,
    /// Hamming window
    #[default]
    Hamming,
    /// Hann (Hanning) window
    Hann,
    /// Blackman window
    Blackman,
}

/// Generates a symmetric window of length `n`.
///
/// A window of length one is `[1.0]` for every type.
pub fn generate_window(n: usize, window_type: WindowType) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / m;
            match window_type {
                WindowType::Rectangular => 1.0,
                WindowType::Hamming => 0.54 - 0.46 * x.cos(),
                WindowType::Hann => 0.5 - 0.5 * x.cos(),
                WindowType::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            }
        })
        .collect()
}

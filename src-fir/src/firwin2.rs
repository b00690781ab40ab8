//! Frequency sampling FIR design

use crate::error::{FirDesignError, Result};
use crate::window::{WindowType, generate_window};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Designs a linear phase FIR filter from a dense gain template.
///
/// The template is sampled on `1 + 2^ceil(log2(numtaps))` evenly spaced
/// points between 0 and Nyquist, given a linear phase, brought back to the
/// time domain with an inverse real FFT, truncated to `numtaps` and windowed.
///
/// # Arguments
/// * `numtaps` - Number of taps
/// * `freq` - Template frequencies normalized to Nyquist = 1, starting at 0 and
///   ending at 1; a frequency may be repeated once to mark a step
/// * `gain` - Template gains, same length as `freq`
/// * `window` - Window applied to the truncated impulse response
pub fn firwin2(
    numtaps: usize,
    freq: &[f64],
    gain: &[f64],
    window: WindowType,
) -> Result<Vec<f64>> {
    if numtaps == 0 {
        return Err(FirDesignError::InvalidTaps {
            numtaps,
            reason: "at least one tap is required".to_string(),
        });
    }
    let freq = check_template(freq, gain)?;
    if numtaps % 2 == 0 && gain[gain.len() - 1] != 0.0 {
        return Err(FirDesignError::InvalidTaps {
            numtaps,
            reason: "an even number of taps needs zero gain at Nyquist".to_string(),
        });
    }

    let nfreqs = 1 + numtaps.next_power_of_two();
    let size = 2 * (nfreqs - 1);
    let delay = (numtaps - 1) as f64 / 2.0;

    let mut spectrum = vec![Complex64::new(0.0, 0.0); size];
    for k in 0..nfreqs {
        let x = k as f64 / (nfreqs - 1) as f64;
        let g = interp(x, &freq, gain);
        spectrum[k] = Complex64::from_polar(g, -delay * PI * x);
    }
    // inverse real FFT: DC and Nyquist bins are real
    spectrum[0].im = 0.0;
    spectrum[nfreqs - 1].im = 0.0;
    for k in 1..(nfreqs - 1) {
        spectrum[size - k] = spectrum[k].conj();
    }

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_inverse(size).process(&mut spectrum);

    let wind = generate_window(numtaps, window);
    Ok(spectrum
        .iter()
        .take(numtaps)
        .zip(wind.iter())
        .map(|(s, w)| s.re / size as f64 * w)
        .collect())
}

/// Linear interpolation of `(xp, fp)` at `x`, clamped to the end values.
///
/// `xp` must be non-decreasing.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let idx = xp.partition_point(|&v| v <= x);
    if idx == 0 {
        fp[0]
    } else if idx == xp.len() {
        fp[xp.len() - 1]
    } else {
        let (x0, x1) = (xp[idx - 1], xp[idx]);
        let (y0, y1) = (fp[idx - 1], fp[idx]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

/// Validates the template and separates repeated frequencies
fn check_template(freq: &[f64], gain: &[f64]) -> Result<Vec<f64>> {
    if freq.len() < 2 || freq.len() != gain.len() {
        return Err(FirDesignError::InvalidTemplate {
            reason: format!(
                "need at least two points and matching lengths (freq {}, gain {})",
                freq.len(),
                gain.len()
            ),
        });
    }
    if freq[0] != 0.0 || freq[freq.len() - 1] != 1.0 {
        return Err(FirDesignError::InvalidTemplate {
            reason: "template must start at 0 and end at 1 (Nyquist)".to_string(),
        });
    }
    if gain.iter().any(|g| !g.is_finite()) {
        return Err(FirDesignError::InvalidTemplate {
            reason: "gains must be finite".to_string(),
        });
    }
    let d: Vec<f64> = freq.windows(2).map(|w| w[1] - w[0]).collect();
    if d.iter().any(|&v| v.is_nan() || v < 0.0) {
        return Err(FirDesignError::InvalidTemplate {
            reason: "frequencies must be non-decreasing".to_string(),
        });
    }
    if d.windows(2).any(|w| w[0] == 0.0 && w[1] == 0.0) {
        return Err(FirDesignError::InvalidTemplate {
            reason: "a frequency may not appear more than twice".to_string(),
        });
    }

    let eps = f64::EPSILON;
    let mut out = freq.to_vec();
    for k in 0..out.len() - 1 {
        if freq[k] == freq[k + 1] {
            out[k] = freq[k] - eps;
            out[k + 1] = freq[k + 1] + eps;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{freqz, is_symmetric};
    use ndarray::array;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_single_tap_identity() {
        let h = firwin2(1, &[0.0, 1.0], &[1.0, 1.0], WindowType::Hamming).unwrap();
        assert_eq!(h.len(), 1);
        assert!(approx_eq(h[0], 1.0, 1e-12));
    }

    #[test]
    fn test_lowpass_step() {
        let h = firwin2(
            129,
            &[0.0, 0.5, 0.5, 1.0],
            &[1.0, 1.0, 0.0, 0.0],
            WindowType::Hamming,
        )
        .unwrap();
        assert_eq!(h.len(), 129);
        assert!(is_symmetric(&h, 1e-12));
        let resp = freqz(&h, &array![0.1, 0.2, 0.8, 0.9], 2.0);
        assert!(approx_eq(resp[0].norm(), 1.0, 0.01));
        assert!(approx_eq(resp[1].norm(), 1.0, 0.01));
        assert!(resp[2].norm() < 0.01);
        assert!(resp[3].norm() < 0.01);
    }

    #[test]
    fn test_zero_edges_template() {
        // the shape used when a measured grid is padded with zero gain
        let freq = [0.0, 0.01, 0.1, 0.5, 0.8, 1.0];
        let gain = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        for window in [WindowType::Hamming, WindowType::Hann, WindowType::Blackman] {
            let h = firwin2(255, &freq, &gain, window).unwrap();
            assert!(is_symmetric(&h, 1e-12));
            let resp = freqz(&h, &array![0.3], 2.0);
            assert!(approx_eq(resp[0].norm(), 1.0, 0.01), "{:?}", window);
        }
    }

    #[test]
    fn test_even_taps() {
        assert!(matches!(
            firwin2(64, &[0.0, 1.0], &[1.0, 1.0], WindowType::Hamming),
            Err(FirDesignError::InvalidTaps { numtaps: 64, .. })
        ));
        let h = firwin2(64, &[0.0, 0.5, 1.0], &[1.0, 1.0, 0.0], WindowType::Hamming).unwrap();
        assert_eq!(h.len(), 64);
        assert!(is_symmetric(&h, 1e-12));
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(
            firwin2(11, &[0.1, 1.0], &[1.0, 1.0], WindowType::Hamming),
            Err(FirDesignError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            firwin2(11, &[0.0, 0.9], &[1.0, 1.0], WindowType::Hamming),
            Err(FirDesignError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            firwin2(11, &[0.0, 0.6, 0.4, 1.0], &[1.0; 4], WindowType::Hamming),
            Err(FirDesignError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            firwin2(11, &[0.0, 0.5, 0.5, 0.5, 1.0], &[1.0; 5], WindowType::Hamming),
            Err(FirDesignError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            firwin2(11, &[0.0, 1.0], &[1.0], WindowType::Hamming),
            Err(FirDesignError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_interp() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 0.0];
        assert_eq!(interp(-1.0, &xp, &fp), 0.0);
        assert_eq!(interp(0.5, &xp, &fp), 5.0);
        assert_eq!(interp(1.0, &xp, &fp), 10.0);
        assert_eq!(interp(1.5, &xp, &fp), 5.0);
        assert_eq!(interp(3.0, &xp, &fp), 0.0);
    }
}

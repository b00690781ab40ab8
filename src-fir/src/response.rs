use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Complex frequency response of a tap sequence on a frequency grid (Hz)
///
/// # Arguments
/// * `coeffs` - Filter taps
/// * `freqs` - Frequencies in Hz
/// * `fs` - Sample rate in Hz
pub fn freqz(coeffs: &[f64], freqs: &Array1<f64>, fs: f64) -> Array1<Complex64> {
    freqs.mapv(|f| {
        let omega = 2.0 * PI * f / fs;
        coeffs
            .iter()
            .enumerate()
            .fold(Complex64::new(0.0, 0.0), |acc, (n, &h)| {
                acc + Complex64::from_polar(h, -omega * n as f64)
            })
    })
}

/// Response of a tap sequence in dB, magnitude floored at 1e-20
pub fn fir_spl(coeffs: &[f64], freqs: &Array1<f64>, fs: f64) -> Array1<f64> {
    freqz(coeffs, freqs, fs).mapv(|h| 20.0 * h.norm().max(1.0e-20).log10())
}

#![doc = include_str!("../README.md")]

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;

/// Q factor of a single second order Butterworth section
pub const DEFAULT_Q_HIGH_LOW_PASS: f64 = 1.0 / std::f64::consts::SQRT_2;

/// Sample rate used when none is configured
pub const SRATE: f64 = 48000.0;

/// Filter types for the sections of a cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadFilterType {
    /// Second order low-pass section
    Lowpass,
    /// Second order high-pass section
    Highpass,
    /// First order low-pass section (real pole)
    LowpassFirstOrder,
    /// First order high-pass section (real pole)
    HighpassFirstOrder,
}

impl BiquadFilterType {
    /// Returns the short string representation of the filter type (e.g., "LP").
    pub fn short_name(&self) -> &'static str {
        match self {
            BiquadFilterType::Lowpass => "LP",
            BiquadFilterType::Highpass => "HP",
            BiquadFilterType::LowpassFirstOrder => "LP1",
            BiquadFilterType::HighpassFirstOrder => "HP1",
        }
    }
}

/// A single IIR section (second order, or first order with `b2 == a2 == 0`).
#[derive(Debug, Clone)]
pub struct Biquad {
    /// The type of filter
    pub filter_type: BiquadFilterType,
    /// Cutoff frequency in Hz
    pub freq: f64,
    /// Sample rate in Hz
    pub srate: f64,
    /// Q factor (ignored by first order sections)
    pub q: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Creates a section and computes its normalized coefficients.
    ///
    /// The second order sections follow the RBJ cookbook, which is the
    /// bilinear transform pre-warped at `freq`. Cascading them with the Q
    /// values of [`butterworth_q`] gives a digital Butterworth filter.
    pub fn new(filter_type: BiquadFilterType, freq: f64, srate: f64, q: f64) -> Self {
        debug_assert!(srate > 0.0, "Sample rate must be positive");
        debug_assert!(
            freq > 0.0 && freq < srate / 2.0,
            "Cutoff must be in (0, {}) Hz, got {} Hz",
            srate / 2.0,
            freq
        );

        let mut biquad = Biquad {
            filter_type,
            freq,
            srate,
            // ensure strictly positive Q to avoid division by zero in alpha = sn/(2*q)
            q: if q > 0.0 { q } else { DEFAULT_Q_HIGH_LOW_PASS },
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        };
        biquad.compute_coeffs();
        biquad
    }

    fn compute_coeffs(&mut self) {
        let omega = 2.0 * PI * self.freq / self.srate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * self.q);
        let k = (PI * self.freq / self.srate).tan();

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            BiquadFilterType::Lowpass => (
                (1.0 - cs) / 2.0,
                1.0 - cs,
                (1.0 - cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
            BiquadFilterType::Highpass => (
                (1.0 + cs) / 2.0,
                -(1.0 + cs),
                (1.0 + cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
            BiquadFilterType::LowpassFirstOrder => (k, k, 0.0, k + 1.0, k - 1.0, 0.0),
            BiquadFilterType::HighpassFirstOrder => (1.0, -1.0, 0.0, k + 1.0, k - 1.0, 0.0),
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Complex frequency response at frequency `f` (Hz).
    pub fn response(&self, f: f64) -> Complex64 {
        let omega = 2.0 * PI * f / self.srate;
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Magnitude response at frequency `f` (Hz).
    pub fn result(&self, f: f64) -> f64 {
        self.response(f).norm()
    }

    /// Response in dB at frequency `f` (Hz).
    pub fn log_result(&self, f: f64) -> f64 {
        let result = self.result(f);
        if result > 0.0 {
            20.0 * result.log10()
        } else {
            -200.0 // silence
        }
    }
}

impl fmt::Display for Biquad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type:{},Freq:{:.1},Rate:{:.1},Q:{:.3}",
            self.filter_type.short_name(),
            self.freq,
            self.srate,
            self.q
        )
    }
}

/// Compute Q values for the second order sections of a Butterworth filter
///
/// # Arguments
/// * `order` - Filter order
///
/// # Returns
/// * One Q value per second order section; an odd order additionally
///   needs a first order section which has no Q and is not listed here.
pub fn butterworth_q(order: usize) -> Vec<f64> {
    (0..order / 2)
        .map(|i| 1.0 / (2.0 * (PI / order as f64 * (i as f64 + 0.5)).sin()))
        .collect()
}

/// A cascade of IIR sections (second order sections plus an optional first order one).
#[derive(Debug, Clone, Default)]
pub struct Sos {
    /// Sections in processing order
    pub sections: Vec<Biquad>,
}

impl Sos {
    /// Butterworth low-pass of the given order.
    pub fn butterworth_lowpass(order: usize, freq: f64, srate: f64) -> Self {
        Self::butterworth(order, freq, srate, false)
    }

    /// Butterworth high-pass of the given order.
    pub fn butterworth_highpass(order: usize, freq: f64, srate: f64) -> Self {
        Self::butterworth(order, freq, srate, true)
    }

    /// Asymmetric band-pass: a high-pass (low cut) cascaded with a low-pass
    /// (high cut), each edge with its own order.
    ///
    /// # Arguments
    /// * `lowcut_order` - Order of the high-pass removing the low end
    /// * `lowcut_freq` - Low cut frequency in Hz
    /// * `highcut_order` - Order of the low-pass removing the high end
    /// * `highcut_freq` - High cut frequency in Hz
    /// * `srate` - Sample rate in Hz
    pub fn butterworth_bandpass(
        lowcut_order: usize,
        lowcut_freq: f64,
        highcut_order: usize,
        highcut_freq: f64,
        srate: f64,
    ) -> Self {
        let mut sos = Self::butterworth_highpass(lowcut_order, lowcut_freq, srate);
        sos.sections
            .extend(Self::butterworth_lowpass(highcut_order, highcut_freq, srate).sections);
        sos
    }

    fn butterworth(order: usize, freq: f64, srate: f64, highpass: bool) -> Self {
        let (second, first) = if highpass {
            (
                BiquadFilterType::Highpass,
                BiquadFilterType::HighpassFirstOrder,
            )
        } else {
            (
                BiquadFilterType::Lowpass,
                BiquadFilterType::LowpassFirstOrder,
            )
        };
        let mut sections: Vec<Biquad> = butterworth_q(order)
            .into_iter()
            .map(|q| Biquad::new(second, freq, srate, q))
            .collect();
        if order % 2 == 1 {
            sections.push(Biquad::new(first, freq, srate, 0.0));
        }
        Sos { sections }
    }

    /// Total order of the cascade.
    pub fn order(&self) -> usize {
        self.sections
            .iter()
            .map(|s| match s.filter_type {
                BiquadFilterType::Lowpass | BiquadFilterType::Highpass => 2,
                BiquadFilterType::LowpassFirstOrder | BiquadFilterType::HighpassFirstOrder => 1,
            })
            .sum()
    }

    /// Complex frequency response of the cascade on a frequency grid (Hz).
    pub fn freqz(&self, freqs: &Array1<f64>) -> Array1<Complex64> {
        freqs.mapv(|f| {
            self.sections
                .iter()
                .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(f))
        })
    }

    /// Magnitude response of the cascade on a frequency grid (Hz).
    pub fn magnitude(&self, freqs: &Array1<f64>) -> Array1<f64> {
        self.freqz(freqs).mapv(|h| h.norm())
    }

    /// Response of the cascade in dB on a frequency grid (Hz).
    pub fn spl(&self, freqs: &Array1<f64>) -> Array1<f64> {
        // Clip to a minimum value to avoid log(0)
        self.magnitude(freqs)
            .mapv(|m| 20.0 * m.max(1.0e-20).log10())
    }
}

use ndarray::Array1;

use crate::error::ConfigError;
use crate::iir::Sos;

/// Default order of the low cut (high-pass) edge, 24 dB/octave
pub const DEFAULT_LOWCUT_ORDER: usize = 4;
/// Default order of the high cut (low-pass) edge, 12 dB/octave
pub const DEFAULT_HIGHCUT_ORDER: usize = 2;

/// Passband shape applied to the flat target
#[derive(Debug, Clone, PartialEq)]
pub enum Bandpass {
    /// No band limitation, the target stays flat
    Null,
    /// Butterworth high-pass at `lowcut_freq` cascaded with a Butterworth
    /// low-pass at `highcut_freq`
    Butterworth {
        lowcut_freq: f64,
        lowcut_order: usize,
        highcut_freq: f64,
        highcut_order: usize,
        fs: f64,
    },
}

impl Bandpass {
    /// Butterworth band-pass with independent edge orders.
    ///
    /// Fails when `lowcut_freq >= highcut_freq`.
    pub fn butterworth(
        lowcut_freq: f64,
        lowcut_order: usize,
        highcut_freq: f64,
        highcut_order: usize,
        fs: f64,
    ) -> Result<Self, ConfigError> {
        if lowcut_freq >= highcut_freq {
            return Err(ConfigError::InvalidFrequencyOrder {
                lowcut: lowcut_freq,
                highcut: highcut_freq,
            });
        }
        Ok(Bandpass::Butterworth {
            lowcut_freq,
            lowcut_order,
            highcut_freq,
            highcut_order,
            fs,
        })
    }

    /// Short identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Bandpass::Null => "null",
            Bandpass::Butterworth { .. } => "butterworth",
        }
    }

    /// Passband edges in Hz, if any
    pub fn edges(&self) -> Option<(f64, f64)> {
        match *self {
            Bandpass::Null => None,
            Bandpass::Butterworth {
                lowcut_freq,
                highcut_freq,
                ..
            } => Some((lowcut_freq, highcut_freq)),
        }
    }

    /// Magnitude of the passband mask on `freqs`
    pub fn frequency_response(&self, freqs: &Array1<f64>) -> Array1<f64> {
        match *self {
            Bandpass::Null => Array1::ones(freqs.len()),
            Bandpass::Butterworth {
                lowcut_freq,
                lowcut_order,
                highcut_freq,
                highcut_order,
                fs,
            } => Sos::butterworth_bandpass(
                lowcut_order,
                lowcut_freq,
                highcut_order,
                highcut_freq,
                fs,
            )
            .magnitude(freqs),
        }
    }

    /// Target magnitude (linear) on `freqs`: flat reference times the
    /// passband mask, normalized so that its maximum is 1.
    pub fn design_target(&self, freqs: &Array1<f64>) -> Array1<f64> {
        let reference = Array1::<f64>::ones(freqs.len());
        let combined = reference * self.frequency_response(freqs);
        let max = combined.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max > 0.0 && max.is_finite() {
            combined / max
        } else {
            combined
        }
    }
}

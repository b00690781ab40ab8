use ndarray::Array1;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::fir::{FirDesignError, WindowType, firls, firwin2};

/// FIR synthesis method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesignMethod {
    /// Least squares fit of the piecewise linear inverse response
    #[default]
    Firls,
    /// Frequency sampling with a Hamming window
    Firwin2,
}

impl DesignMethod {
    /// Accepted configuration names
    pub const NAMES: [&'static str; 2] = ["firls", "firwin2"];

    /// Short identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            DesignMethod::Firls => "firls",
            DesignMethod::Firwin2 => "firwin2",
        }
    }

    /// Synthesizes `numtaps` linear phase taps realizing `response` (linear
    /// magnitude) on the grid `freqs` (Hz).
    ///
    /// `firls` uses consecutive grid points as bands, so the template is
    /// unconstrained below the first and above the last grid point.
    /// `firwin2` pads the template with zero gain at DC and Nyquist.
    pub fn design(
        &self,
        freqs: &Array1<f64>,
        response: &Array1<f64>,
        fs: f64,
        numtaps: usize,
    ) -> Result<Vec<f64>, FirDesignError> {
        let nyquist = fs / 2.0;
        if let Some(f) = freqs.iter().find(|f| **f > nyquist) {
            return Err(FirDesignError::InvalidBands {
                reason: format!("grid point {} Hz is above Nyquist ({} Hz)", f, nyquist),
            });
        }
        let normalized: Vec<f64> = freqs.iter().map(|f| f / nyquist).collect();
        let n = normalized.len();

        match self {
            DesignMethod::Firls => {
                // every grid interval becomes a band with linear desired response
                let mut bands = Vec::with_capacity(2 * n.saturating_sub(1));
                let mut desired = Vec::with_capacity(2 * n.saturating_sub(1));
                for k in 1..n {
                    bands.extend([normalized[k - 1], normalized[k]]);
                    desired.extend([response[k - 1], response[k]]);
                }
                firls(numtaps, &bands, &desired)
            }
            DesignMethod::Firwin2 => {
                let mut freq = Vec::with_capacity(n + 2);
                freq.push(0.0);
                freq.extend_from_slice(&normalized);
                freq.push(1.0);
                let mut gain = Vec::with_capacity(n + 2);
                gain.push(0.0);
                gain.extend(response.iter());
                gain.push(0.0);
                firwin2(numtaps, &freq, &gain, WindowType::Hamming)
            }
        }
    }
}

impl fmt::Display for DesignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DesignMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firls" => Ok(DesignMethod::Firls),
            "firwin2" => Ok(DesignMethod::Firwin2),
            _ => Err(ConfigError::UnsupportedVariant {
                key: "design_method".to_string(),
                value: s.to_string(),
                supported: Self::NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fir::{fir_spl, is_symmetric};

    fn log_grid(n: usize) -> Array1<f64> {
        Array1::logspace(10.0, 20f64.log10(), 20000f64.log10(), n)
    }

    #[test]
    fn test_flat_single_tap() {
        let freqs = log_grid(64);
        let response = Array1::ones(64);
        let h = DesignMethod::Firls
            .design(&freqs, &response, 48000.0, 1)
            .unwrap();
        assert_eq!(h.len(), 1);
        assert!((h[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_both_methods_follow_a_shelf() {
        let freqs = log_grid(256);
        // +6 dB above 2 kHz, smooth transition
        let response = freqs.mapv(|f: f64| 10f64.powf(6.0 / 20.0 / (1.0 + (2000.0 / f).powi(2))));
        for method in [DesignMethod::Firls, DesignMethod::Firwin2] {
            let h = method.design(&freqs, &response, 48000.0, 255).unwrap();
            assert_eq!(h.len(), 255);
            assert!(is_symmetric(&h, 1e-9), "{}", method);
            let spl = fir_spl(&h, &freqs, 48000.0);
            for (i, &f) in freqs.iter().enumerate() {
                if (1000.0..=12000.0).contains(&f) {
                    let expected = 20.0 * response[i].log10();
                    assert!(
                        (spl[i] - expected).abs() < 0.5,
                        "{} at {:.0} Hz: {:.2} vs {:.2}",
                        method,
                        f,
                        spl[i],
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn test_above_nyquist_is_rejected() {
        let freqs = Array1::from(vec![100.0, 1000.0, 30000.0]);
        let response = Array1::ones(3);
        assert!(matches!(
            DesignMethod::Firls.design(&freqs, &response, 48000.0, 11),
            Err(FirDesignError::InvalidBands { .. })
        ));
        assert!(DesignMethod::Firwin2
            .design(&freqs, &response, 48000.0, 11)
            .is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!("FIRLS".parse::<DesignMethod>().unwrap(), DesignMethod::Firls);
        assert_eq!(" firwin2 ".parse::<DesignMethod>().unwrap(), DesignMethod::Firwin2);
        match "remez".parse::<DesignMethod>() {
            Err(ConfigError::UnsupportedVariant { key, supported, .. }) => {
                assert_eq!(key, "design_method");
                assert_eq!(supported, vec!["firls", "firwin2"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

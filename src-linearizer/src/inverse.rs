//! Linearizer - FIR correction filters for loudspeakers
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use ndarray::Array1;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::iir::Sos;

/// Default additive floor of the inversion denominator
pub const DEFAULT_EPSILON: f64 = 1.0e-10;
/// Default Tikhonov damping strength
pub const DEFAULT_BETA: f64 = 1.0e-2;
/// Default order of the regularization filter
pub const DEFAULT_REGULARIZATION_ORDER: usize = 2;

/// Shape of the regularization weight `B(f)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegularizationFilter {
    /// Damp above the cutoff
    #[default]
    Highpass,
    /// Damp below the cutoff
    Lowpass,
}

impl RegularizationFilter {
    /// Accepted configuration names
    pub const NAMES: [&'static str; 2] = ["highpass", "lowpass"];

    /// Short identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            RegularizationFilter::Highpass => "highpass",
            RegularizationFilter::Lowpass => "lowpass",
        }
    }
}

impl fmt::Display for RegularizationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RegularizationFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highpass" => Ok(RegularizationFilter::Highpass),
            "lowpass" => Ok(RegularizationFilter::Lowpass),
            _ => Err(ConfigError::UnsupportedVariant {
                key: "inverse_params.b_filter_type".to_string(),
                value: s.to_string(),
                supported: Self::NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }
}

/// Parameters of the Tikhonov regularized inversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TikhonovParams {
    /// Damping strength
    pub beta: f64,
    /// Additive floor
    pub epsilon: f64,
    /// Shape of `B(f)`
    pub b_filter_type: RegularizationFilter,
    /// Cutoff of `B(f)` in Hz
    pub cutoff_hz: f64,
    /// Butterworth order of `B(f)`
    pub order: usize,
    /// Sample rate used to design `B(f)`
    pub fs: f64,
}

/// Inversion variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inverter {
    /// `target / (measured + epsilon)`
    Simple {
        /// Additive floor
        epsilon: f64,
    },
    /// `target / (measured + beta * B(f) + epsilon)`
    Tikhonov(TikhonovParams),
}

impl Inverter {
    /// Accepted configuration names
    pub const NAMES: [&'static str; 2] = ["simple", "tikhonov"];

    /// Short identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Inverter::Simple { .. } => "simple",
            Inverter::Tikhonov(_) => "tikhonov",
        }
    }

    /// Regularization weight `B(f)` on `freqs`, `None` without regularization
    pub fn regularization_weight(&self, freqs: &Array1<f64>) -> Option<Array1<f64>> {
        match self {
            Inverter::Simple { .. } => None,
            Inverter::Tikhonov(p) => {
                let sos = match p.b_filter_type {
                    RegularizationFilter::Highpass => {
                        Sos::butterworth_highpass(p.order, p.cutoff_hz, p.fs)
                    }
                    RegularizationFilter::Lowpass => {
                        Sos::butterworth_lowpass(p.order, p.cutoff_hz, p.fs)
                    }
                };
                Some(sos.magnitude(freqs))
            }
        }
    }

    /// Inverse magnitude (linear) the correction filter has to realize.
    ///
    /// # Arguments
    /// * `freqs` - Frequency grid in Hz
    /// * `measured_db` - Measured (or conditioned) response in dB
    /// * `target` - Target magnitude (linear)
    ///
    /// All arrays share the same grid.
    pub fn compute(
        &self,
        freqs: &Array1<f64>,
        measured_db: &Array1<f64>,
        target: &Array1<f64>,
    ) -> Array1<f64> {
        debug_assert_eq!(freqs.len(), measured_db.len());
        debug_assert_eq!(freqs.len(), target.len());
        let measured_lin = measured_db.mapv(|db| 10f64.powf(db / 20.0));
        let denominator = match self {
            Inverter::Simple { epsilon } => measured_lin + *epsilon,
            Inverter::Tikhonov(p) => {
                let weight = self
                    .regularization_weight(freqs)
                    .unwrap_or_else(|| Array1::zeros(freqs.len()));
                measured_lin + weight * p.beta + p.epsilon
            }
        };
        target / &denominator
    }
}

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
//!
//! The crate turns a measured magnitude response into a linear phase FIR
//! filter that flattens it inside a usable passband. It integrates:
//!
//! - `linearizer_iir`: Butterworth cascades for target shaping and regularization
//! - `linearizer_fir`: least squares and frequency sampling FIR synthesis

// Re-export external crate functionality
pub use linearizer_fir as fir;
pub use linearizer_iir as iir;

/// Band-pass shaped target curves
pub mod bandpass;
/// Common CLI argument definitions
pub mod cli;
/// Configuration parsing and validation
pub mod config;
/// FIR design dispatch from an inverse response
pub mod design;
/// Error types
pub mod error;
/// FIR coefficient export
pub mod export;
/// Regularized inversion of a measured response
pub mod inverse;
/// Notch detection and filling
pub mod notch;
/// Peak finding with prominence and width
pub mod peaks;
/// Stage ordering and pipeline state
pub mod pipeline;
/// Plotting of the linearization results
pub mod plot;
/// Measurement loading
pub mod read;
/// Fractional octave and ERB smoothing
pub mod smooth;

// Re-export commonly used items
pub use bandpass::Bandpass;
pub use config::{LinearizerConfig, RawConfig};
pub use design::DesignMethod;
pub use error::{
    ConfigError, DataFormatError, ExportError, LinearizerError, PipelineError, PlotError, Result,
};
pub use inverse::{Inverter, RegularizationFilter};
pub use notch::{NotchMasker, ProminenceParams};
pub use pipeline::{Linearizer, PipelineContext, Stage, StageOrder};
pub use read::Measurement;
pub use smooth::Smoother;

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

mod read_csv;
mod read_json;

use crate::error::DataFormatError;
use ndarray::Array1;
use std::path::Path;

pub use read_csv::{load_frequency_response, read_measurement_from_csv};
pub use read_json::read_measurement_from_json;

/// Extensions with a registered loader
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["json", "csv", "txt"];

/// A measured magnitude response: SPL in dB per frequency in Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    freq: Array1<f64>,
    spl: Array1<f64>,
}

impl Measurement {
    /// Builds a measurement after checking shape and ordering.
    pub fn new(freq: Array1<f64>, spl: Array1<f64>) -> Result<Self, DataFormatError> {
        let invalid = |reason: String| Err(DataFormatError::InvalidMeasurement { reason });
        if freq.is_empty() {
            return invalid("no data points".to_string());
        }
        if freq.len() != spl.len() {
            return invalid(format!(
                "{} frequencies but {} magnitudes",
                freq.len(),
                spl.len()
            ));
        }
        if let Some(i) = freq.iter().position(|f| !f.is_finite() || *f <= 0.0) {
            return invalid(format!(
                "frequency {} at index {} must be finite and positive",
                freq[i], i
            ));
        }
        if let Some(i) = spl.iter().position(|v| !v.is_finite()) {
            return invalid(format!("magnitude at index {} is not finite", i));
        }
        if let Some(i) = (1..freq.len()).find(|&i| freq[i] <= freq[i - 1]) {
            return invalid(format!(
                "frequencies must be strictly increasing ({} Hz follows {} Hz at index {})",
                freq[i],
                freq[i - 1],
                i
            ));
        }
        Ok(Measurement { freq, spl })
    }

    /// Frequencies in Hz, strictly increasing
    pub fn freq(&self) -> &Array1<f64> {
        &self.freq
    }

    /// Magnitudes in dB, aligned with [`Measurement::freq`]
    pub fn spl(&self) -> &Array1<f64> {
        &self.spl
    }

    /// Number of points on the frequency grid
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    /// True when the grid is empty (never the case once validated)
    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }
}

/// Loads a measurement, choosing the loader from the file extension.
///
/// # Arguments
/// * `path` - `.json` (`f_hz` / `db` arrays), `.csv` or `.txt` (frequency, spl columns)
pub fn load_measurement(path: &Path) -> Result<Measurement, DataFormatError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let measurement = match ext.as_str() {
        "json" => read_measurement_from_json(path)?,
        "csv" => read_measurement_from_csv(path)?,
        "txt" => {
            let (freq, spl) = load_frequency_response(path)?;
            Measurement::new(freq, spl)?
        }
        _ => {
            return Err(DataFormatError::UnsupportedFormat {
                path: path.display().to_string(),
                supported: SUPPORTED_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect(),
            });
        }
    };
    log::info!(
        "loaded {} points from {} ({:.1} Hz - {:.1} Hz)",
        measurement.len(),
        path.display(),
        measurement.freq()[0],
        measurement.freq()[measurement.len() - 1]
    );
    Ok(measurement)
}

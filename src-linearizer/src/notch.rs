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

use crate::peaks::{PeakCriteria, find_peaks};
use crate::smooth::Smoother;

/// Parameters of prominence based notch detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProminenceParams {
    /// Gain in dB added to the masked bins
    pub attenuation_db: f64,
    /// Minimum depth below the smoothed envelope, in dB
    pub min_depth_db: f64,
    /// Minimum prominence of the depth peak, in dB
    pub prominence: f64,
    /// Relative height at which the notch width is measured
    pub rel_height: f64,
    /// Octave fraction of the reference envelope
    pub smooth_fraction: f64,
}

impl Default for ProminenceParams {
    fn default() -> Self {
        ProminenceParams {
            attenuation_db: 10.0,
            min_depth_db: 6.0,
            prominence: 3.0,
            rel_height: 0.5,
            smooth_fraction: 12.0,
        }
    }
}

/// A detected notch: inclusive bin range and depth at the center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotchRange {
    /// Bin of the deepest point
    pub center: usize,
    /// First masked bin
    pub start: usize,
    /// Last masked bin (inclusive)
    pub end: usize,
    /// Depth below the envelope at `center`, in dB
    pub depth_db: f64,
}

/// Notch masking variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotchMasker {
    /// Pass-through
    Null,
    /// Detect dips against a smoothed envelope and fill them
    Prominence(ProminenceParams),
}

impl NotchMasker {
    /// Short identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            NotchMasker::Null => "null",
            NotchMasker::Prominence(_) => "prominence",
        }
    }

    /// Finds narrow dips of `spl` (dB) below its fractional octave envelope.
    ///
    /// The depth curve `envelope - spl` is searched for peaks taller than
    /// `min_depth_db`, at least `prominence` high and one bin wide. Each peak
    /// masks `[floor(left), ceil(right)]` of its width crossings, clamped
    /// to the grid.
    pub fn detect_notches(&self, freqs: &Array1<f64>, spl: &Array1<f64>) -> Vec<NotchRange> {
        let NotchMasker::Prominence(params) = self else {
            return Vec::new();
        };
        let envelope = Smoother::Octave {
            fraction: params.smooth_fraction,
        }
        .smooth(freqs, spl);
        let depth: Vec<f64> = envelope
            .iter()
            .zip(spl.iter())
            .map(|(e, m)| e - m)
            .collect();

        let criteria = PeakCriteria {
            height: Some(params.min_depth_db),
            prominence: Some(params.prominence),
            width: Some(1.0),
            rel_height: params.rel_height,
        };
        let last = spl.len().saturating_sub(1);
        find_peaks(&depth, &criteria)
            .into_iter()
            .map(|peak| NotchRange {
                center: peak.index,
                start: (peak.left_ip.floor().max(0.0) as usize).min(last),
                end: (peak.right_ip.ceil().max(0.0) as usize).min(last),
                depth_db: peak.height,
            })
            .collect()
    }

    /// Keep mask over the grid, `false` inside every detected notch
    pub fn notch_mask(&self, freqs: &Array1<f64>, spl: &Array1<f64>) -> Array1<bool> {
        let mut mask = Array1::from_elem(spl.len(), true);
        for notch in self.detect_notches(freqs, spl) {
            mask.slice_mut(ndarray::s![notch.start..=notch.end]).fill(false);
        }
        mask
    }

    /// Fills the detected notches of `spl` (dB).
    ///
    /// Masked bins are scaled on a linear scale by `1 / 10^(-attenuation_db / 20)`,
    /// which raises them by `attenuation_db`. Other bins are returned untouched.
    pub fn apply_notch_mask(&self, freqs: &Array1<f64>, spl: &Array1<f64>) -> Array1<f64> {
        let NotchMasker::Prominence(params) = self else {
            return spl.clone();
        };
        let notches = self.detect_notches(freqs, spl);
        for n in &notches {
            log::debug!(
                "notch at {:.1} Hz, {:.1} dB deep, bins {}..={} ({:.1} Hz - {:.1} Hz)",
                freqs[n.center],
                n.depth_db,
                n.start,
                n.end,
                freqs[n.start],
                freqs[n.end]
            );
        }
        log::info!("{} notch(es) detected", notches.len());

        let gain = 1.0 / 10f64.powf(-params.attenuation_db / 20.0);
        let mut out = spl.clone();
        for n in &notches {
            for v in out.slice_mut(ndarray::s![n.start..=n.end]).iter_mut() {
                *v = 20.0 * (10f64.powf(*v / 20.0) * gain).log10();
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_grid(n: usize) -> Array1<f64> {
        Array1::logspace(10.0, 20f64.log10(), 20000f64.log10(), n)
    }

    fn params() -> ProminenceParams {
        ProminenceParams {
            attenuation_db: 10.0,
            min_depth_db: 6.0,
            prominence: 3.0,
            rel_height: 0.5,
            smooth_fraction: 3.0,
        }
    }

    #[test]
    fn test_null_never_modifies() {
        let freqs = log_grid(64);
        let mut spl = Array1::zeros(64);
        spl[30] = -20.0;
        assert_eq!(NotchMasker::Null.apply_notch_mask(&freqs, &spl), spl);
        assert!(NotchMasker::Null.detect_notches(&freqs, &spl).is_empty());
        assert!(NotchMasker::Null.notch_mask(&freqs, &spl).iter().all(|k| *k));
    }

    #[test]
    fn test_single_bin_notch_is_filled() {
        let freqs = log_grid(512);
        let mut spl = Array1::zeros(512);
        spl[256] = -15.0;
        let masker = NotchMasker::Prominence(params());

        let notches = masker.detect_notches(&freqs, &spl);
        assert_eq!(notches.len(), 1);
        assert_eq!(notches[0].center, 256);
        assert!(notches[0].start <= 256 && notches[0].end >= 256);
        assert!(notches[0].end - notches[0].start <= 2);

        let out = masker.apply_notch_mask(&freqs, &spl);
        assert!((out[256] - (-5.0)).abs() < 0.1);
        for i in 0..512 {
            if i < notches[0].start || i > notches[0].end {
                assert!((out[i] - spl[i]).abs() < 0.01, "bin {} changed", i);
            } else {
                assert!((out[i] - spl[i] - 10.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_shallow_dip_is_ignored() {
        let freqs = log_grid(256);
        let mut spl = Array1::zeros(256);
        spl[100] = -4.0;
        let masker = NotchMasker::Prominence(params());
        assert!(masker.detect_notches(&freqs, &spl).is_empty());
        assert_eq!(masker.apply_notch_mask(&freqs, &spl), spl);
    }

    #[test]
    fn test_mask_covers_wide_notch() {
        let freqs = log_grid(512);
        // 5 bin wide, 20 dB deep dip on a gentle slope
        let mut spl = freqs.mapv(|f: f64| 2.0 * (f / 1000.0).log10());
        for i in 298..=302 {
            spl[i] -= 20.0;
        }
        let masker = NotchMasker::Prominence(params());
        let mask = masker.notch_mask(&freqs, &spl);
        for i in 298..=302 {
            assert!(!mask[i], "bin {} should be masked", i);
        }
        assert!(mask[250] && mask[350]);
        let out = masker.apply_notch_mask(&freqs, &spl);
        assert!((out[300] - spl[300] - 10.0).abs() < 1e-9);
        assert_eq!(out[250], spl[250]);
    }

    #[test]
    fn test_bounds_are_clamped() {
        let freqs = log_grid(128);
        let mut spl = Array1::zeros(128);
        spl[126] = -20.0;
        let masker = NotchMasker::Prominence(params());
        let notches = masker.detect_notches(&freqs, &spl);
        assert_eq!(notches.len(), 1);
        assert_eq!(notches[0].center, 126);
        assert_eq!(notches[0].start, 125);
        // right crossing sits in the last bin
        assert_eq!(notches[0].end, 127);
        let out = masker.apply_notch_mask(&freqs, &spl);
        assert!((out[127] - 10.0).abs() < 1e-9);
    }
}

//! Band relative smoothing of magnitude curves.
//!
//! Every output sample is the arithmetic mean of the input samples whose
//! frequency falls inside a band centered on that sample. The band is either
//! a fraction of an octave (constant relative width) or one equivalent
//! rectangular bandwidth (Glasberg and Moore, linear width).

use ndarray::Array1;

/// Smoothing variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoother {
    /// Identity
    Null,
    /// `1/fraction` octave bands
    Octave {
        /// Bands per octave, e.g. 3 for third octave smoothing
        fraction: f64,
    },
    /// Equivalent rectangular bandwidth
    Erb,
}

/// ERB bandwidth in Hz at frequency `f` (Hz)
pub fn erb_bandwidth(f: f64) -> f64 {
    24.7 * (4.37 * f / 1000.0 + 1.0)
}

impl Smoother {
    /// Short identifier used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Smoother::Null => "null",
            Smoother::Octave { .. } => "octave",
            Smoother::Erb => "erb",
        }
    }

    /// Band edges `(lo, hi)` in Hz around `f_center`, or `None` for the identity.
    pub fn band(&self, f_center: f64) -> Option<(f64, f64)> {
        match *self {
            Smoother::Null => None,
            Smoother::Octave { fraction } => {
                let half_win = 2.0_f64.powf(1.0 / (2.0 * fraction));
                Some((f_center / half_win, f_center * half_win))
            }
            Smoother::Erb => {
                let bw = erb_bandwidth(f_center);
                Some((f_center - bw / 2.0, f_center + bw / 2.0))
            }
        }
    }

    /// Smooths `values` sampled on the increasing grid `freqs`.
    ///
    /// Output has the same length as the input. A band that contains no
    /// grid point falls back to the nearest sample.
    pub fn smooth(&self, freqs: &Array1<f64>, values: &Array1<f64>) -> Array1<f64> {
        debug_assert_eq!(freqs.len(), values.len());
        if *self == Smoother::Null {
            return values.clone();
        }
        let grid = freqs.to_vec();
        Array1::from_iter((0..grid.len()).map(|i| {
            let Some((lo, hi)) = self.band(grid[i]) else {
                return values[i];
            };
            // contiguous because the grid is sorted
            let start = grid.partition_point(|&f| f < lo);
            let end = grid.partition_point(|&f| f <= hi);
            if start >= end {
                return values[nearest_index(&grid, grid[i])];
            }
            values.slice(ndarray::s![start..end]).sum() / (end - start) as f64
        }))
    }
}

/// Index of the grid point closest to `f` on an increasing grid
fn nearest_index(grid: &[f64], f: f64) -> usize {
    let idx = grid.partition_point(|&g| g < f);
    if idx == 0 {
        0
    } else if idx == grid.len() {
        grid.len() - 1
    } else if (f - grid[idx - 1]).abs() <= (grid[idx] - f).abs() {
        idx - 1
    } else {
        idx
    }
}

//! Least squares linear phase FIR design

use crate::error::{FirDesignError, Result};
use crate::sinc;
use ndarray::{Array1, Array2};
use std::f64::consts::PI;

/// Relative diagonal load added to the normal equations
const DIAGONAL_LOAD: f64 = 1.0e-10;

/// Designs a type I linear phase FIR filter minimizing the integrated
/// squared error against a piecewise linear magnitude template.
///
/// # Arguments
/// * `numtaps` - Number of taps, must be odd
/// * `bands` - Band edges as consecutive `(f1, f2)` pairs, normalized to Nyquist = 1
/// * `desired` - Desired magnitude at each band edge, same layout as `bands`
///
/// Frequencies not covered by any band are left unconstrained.
///
/// # Returns
/// * The symmetric tap sequence
pub fn firls(numtaps: usize, bands: &[f64], desired: &[f64]) -> Result<Vec<f64>> {
    if numtaps == 0 || numtaps % 2 == 0 {
        return Err(FirDesignError::InvalidTaps {
            numtaps,
            reason: "least squares design needs an odd, positive number of taps".to_string(),
        });
    }
    check_bands(bands, desired)?;

    let m = (numtaps - 1) / 2;
    let edges: Vec<(f64, f64, f64, f64)> = bands
        .chunks_exact(2)
        .zip(desired.chunks_exact(2))
        .map(|(b, d)| (b[0], b[1], d[0], d[1]))
        .collect();

    // q[n] = sum over bands of the integral of cos(pi n f)
    let q: Vec<f64> = (0..numtaps)
        .map(|n| {
            let n = n as f64;
            edges
                .iter()
                .map(|&(f1, f2, _, _)| f2 * sinc(f2 * n) - f1 * sinc(f1 * n))
                .sum()
        })
        .collect();

    // Toeplitz plus Hankel
    let mut normal = Array2::<f64>::zeros((m + 1, m + 1));
    for i in 0..=m {
        for j in 0..=m {
            normal[[i, j]] = q[i.abs_diff(j)] + q[i + j];
        }
    }

    let rhs: Array1<f64> = (0..=m)
        .map(|n| {
            edges
                .iter()
                .map(|&(f1, f2, d1, d2)| {
                    let slope = (d2 - d1) / (f2 - f1);
                    let offset = d1 - f1 * slope;
                    edge_integral(n, f2, slope, offset) - edge_integral(n, f1, slope, offset)
                })
                .sum::<f64>()
        })
        .collect();

    let max_diag = (0..=m).map(|i| normal[[i, i]]).fold(0.0_f64, f64::max);
    for i in 0..=m {
        normal[[i, i]] += DIAGONAL_LOAD * max_diag;
    }

    let a = cholesky_solve(normal, &rhs)?;

    let mut coeffs = Vec::with_capacity(numtaps);
    coeffs.extend((1..=m).rev().map(|k| a[k]));
    coeffs.push(2.0 * a[0]);
    coeffs.extend((1..=m).map(|k| a[k]));
    Ok(coeffs)
}

/// Antiderivative of `(slope f + offset) cos(pi n f)` evaluated at `f`
fn edge_integral(n: usize, f: f64, slope: f64, offset: f64) -> f64 {
    let nf = n as f64;
    let base = f * (slope * f + offset) * sinc(f * nf);
    if n == 0 {
        base - slope * f * f / 2.0
    } else {
        base + slope * (PI * nf * f).cos() / (PI * nf).powi(2)
    }
}

fn check_bands(bands: &[f64], desired: &[f64]) -> Result<()> {
    if bands.is_empty() || bands.len() % 2 != 0 {
        return Err(FirDesignError::InvalidBands {
            reason: format!("expected (f1, f2) pairs, got {} edges", bands.len()),
        });
    }
    if desired.len() != bands.len() {
        return Err(FirDesignError::InvalidBands {
            reason: format!(
                "{} band edges but {} desired values",
                bands.len(),
                desired.len()
            ),
        });
    }
    if let Some(f) = bands
        .iter()
        .find(|f| !f.is_finite() || **f < 0.0 || **f > 1.0)
    {
        return Err(FirDesignError::InvalidBands {
            reason: format!("edge {} is outside [0, 1]", f),
        });
    }
    if let Some(d) = desired.iter().find(|d| !d.is_finite() || **d < 0.0) {
        return Err(FirDesignError::InvalidBands {
            reason: format!("desired value {} must be finite and non-negative", d),
        });
    }
    for (k, pair) in bands.chunks_exact(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(FirDesignError::InvalidBands {
                reason: format!("band {} [{}, {}] has no width", k, pair[0], pair[1]),
            });
        }
    }
    for (k, w) in bands.chunks_exact(2).collect::<Vec<_>>().windows(2).enumerate() {
        if w[1][0] < w[0][1] {
            return Err(FirDesignError::InvalidBands {
                reason: format!("band {} overlaps band {}", k + 1, k),
            });
        }
    }
    Ok(())
}

/// Solves `a x = b` for a symmetric positive definite `a`
fn cholesky_solve(mut a: Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for j in 0..n {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= a[[j, k]] * a[[j, k]];
        }
        if pivot.is_nan() || pivot <= 0.0 {
            return Err(FirDesignError::SingularSystem { row: j, pivot });
        }
        let d = pivot.sqrt();
        a[[j, j]] = d;
        for i in (j + 1)..n {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= a[[i, k]] * a[[j, k]];
            }
            a[[i, j]] = s / d;
        }
    }

    let mut x = b.clone();
    for i in 0..n {
        let mut s = x[i];
        for k in 0..i {
            s -= a[[i, k]] * x[k];
        }
        x[i] = s / a[[i, i]];
    }
    for i in (0..n).rev() {
        let mut s = x[i];
        for k in (i + 1)..n {
            s -= a[[k, i]] * x[k];
        }
        x[i] = s / a[[i, i]];
    }
    Ok(x)
}

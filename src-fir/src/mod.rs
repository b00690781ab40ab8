#![doc = include_str!("../README.md")]

mod error;
mod firls;
mod firwin2;
mod response;
mod wav;
mod window;

pub use error::{FirDesignError, Result};
pub use firls::firls;
pub use firwin2::{firwin2, interp};
pub use response::{fir_spl, freqz};
pub use wav::{load_fir_from_wav, save_fir_to_wav};
pub use window::{WindowType, generate_window};

/// Normalized sinc, `sin(pi x) / (pi x)`
pub(crate) fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Returns true when the tap sequence is symmetric within `tol`.
pub fn is_symmetric(coeffs: &[f64], tol: f64) -> bool {
    let n = coeffs.len();
    (0..n / 2).all(|i| (coeffs[i] - coeffs[n - 1 - i]).abs() <= tol)
}

use thiserror::Error;

/// Errors raised while synthesizing or storing FIR taps
#[derive(Error, Debug)]
pub enum FirDesignError {
    #[error("invalid number of taps {numtaps}: {reason}")]
    InvalidTaps { numtaps: usize, reason: String },

    #[error("invalid bands: {reason}")]
    InvalidBands { reason: String },

    #[error("invalid gain template: {reason}")]
    InvalidTemplate { reason: String },

    #[error("least squares system is not positive definite (pivot {pivot} at row {row})")]
    SingularSystem { row: usize, pivot: f64 },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FirDesignError>;

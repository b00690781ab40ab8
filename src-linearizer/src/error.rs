//! Error types for the linearizer crate.
//!
//! One enum per concern, unified under [`LinearizerError`]. Every failure is
//! a configuration or input problem: nothing here is retried.

use crate::pipeline::Stage;
use linearizer_fir::FirDesignError;
use thiserror::Error;

/// Configuration could not be turned into a valid [`crate::LinearizerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required keys are absent, as dotted paths.
    #[error("missing required config keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// A variant selector names an unknown variant.
    #[error("unsupported {key} '{value}', supported: {}", .supported.join(", "))]
    UnsupportedVariant {
        /// Config key holding the variant name.
        key: String,
        /// The rejected value.
        value: String,
        /// Accepted variant names.
        supported: Vec<String>,
    },

    /// Band-pass edges are not ordered.
    #[error("lowcut frequency {lowcut} Hz must be strictly below highcut frequency {highcut} Hz")]
    InvalidFrequencyOrder {
        /// Low cut frequency in Hz.
        lowcut: f64,
        /// High cut frequency in Hz.
        highcut: f64,
    },

    /// A value is present but out of its valid range.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Dotted config key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The config file extension is not recognised.
    #[error("unsupported config format '{path}', supported: .yaml, .yml, .json")]
    UnsupportedFormat {
        /// Path to the config file.
        path: String,
    },

    /// The config file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Path to the config file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// YAML syntax or type error.
    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or type error.
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A measurement file could not be loaded.
#[derive(Debug, Error)]
pub enum DataFormatError {
    /// No loader handles this extension.
    #[error("unsupported measurement format '{path}', supported: {}", .supported.join(", "))]
    UnsupportedFormat {
        /// Path to the measurement.
        path: String,
        /// Accepted extensions.
        supported: Vec<String>,
    },

    /// The file could not be read.
    #[error("cannot read measurement '{path}': {source}")]
    Io {
        /// Path to the measurement.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The content does not match the expected layout.
    #[error("cannot parse measurement '{path}': {reason}")]
    Parse {
        /// Path to the measurement.
        path: String,
        /// Error message describing the failure.
        reason: String,
    },

    /// Parsed arrays do not form a valid measurement.
    #[error("invalid measurement: {reason}")]
    InvalidMeasurement {
        /// What is wrong with the arrays.
        reason: String,
    },
}

/// A stage was invoked before the stage producing its input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// `stage` reads a field that only `requires` produces.
    #[error("stage '{stage}' requires '{requires}' to run first")]
    StageNotRun {
        /// The stage that was invoked.
        stage: Stage,
        /// The stage that must run before it.
        requires: Stage,
    },
}

/// FIR coefficients could not be exported.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No exporter handles this extension.
    #[error("unsupported export format '{path}', supported: {}", .supported.join(", "))]
    UnsupportedFormat {
        /// Output path.
        path: String,
        /// Accepted extensions.
        supported: Vec<String>,
    },

    /// Writing the WAV container failed.
    #[error("WAV export failed: {0}")]
    Wav(#[from] FirDesignError),

    /// Creating or writing the file failed.
    #[error("cannot write '{path}': {source}")]
    Io {
        /// Output path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// The HTML chart could not be written.
#[derive(Debug, Error)]
pub enum PlotError {
    /// Creating or writing the file failed.
    #[error("cannot write plot '{path}': {source}")]
    Io {
        /// Output path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Error type for all linearizer operations.
#[derive(Debug, Error)]
pub enum LinearizerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataFormatError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("filter design failed: {0}")]
    Design(#[from] FirDesignError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Plot(#[from] PlotError),
}

/// Result type alias for linearizer operations.
pub type Result<T> = std::result::Result<T, LinearizerError>;

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

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::bandpass::{Bandpass, DEFAULT_HIGHCUT_ORDER, DEFAULT_LOWCUT_ORDER};
use crate::design::DesignMethod;
use crate::error::ConfigError;
use crate::inverse::{
    DEFAULT_BETA, DEFAULT_EPSILON, DEFAULT_REGULARIZATION_ORDER, Inverter, RegularizationFilter,
    TikhonovParams,
};
use crate::notch::{NotchMasker, ProminenceParams};
use crate::smooth::Smoother;

/// `bandpass_params` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBandpassParams {
    pub lowcut_freq: Option<f64>,
    pub highcut_freq: Option<f64>,
    pub lowcut_order: Option<i64>,
    pub highcut_order: Option<i64>,
}

/// `smoothing_params` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSmoothingParams {
    pub fraction: Option<f64>,
}

/// `inverse_params` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInverseParams {
    pub epsilon: Option<f64>,
    pub beta: Option<f64>,
    pub b_filter_type: Option<String>,
    pub cutoff_hz: Option<f64>,
    pub order: Option<i64>,
    pub fs: Option<f64>,
}

/// `notch_masking_params` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNotchMaskingParams {
    pub attenuation_db: Option<f64>,
    pub min_depth_db: Option<f64>,
    pub prominence: Option<f64>,
    pub rel_height: Option<f64>,
    pub smooth_fraction: Option<f64>,
}

/// Configuration as read from a file, before validation.
///
/// Every key is optional at this level so that [`RawConfig::validate`] can
/// report all missing keys at once. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    pub fs: Option<f64>,
    pub fir_taps: Option<i64>,
    #[serde(default, deserialize_with = "null_as_variant")]
    pub design_method: Option<String>,
    #[serde(default, deserialize_with = "null_as_variant")]
    pub bandpass_type: Option<String>,
    pub bandpass_params: Option<RawBandpassParams>,
    #[serde(default, deserialize_with = "null_as_variant")]
    pub smoothing_type: Option<String>,
    pub smoothing_params: Option<RawSmoothingParams>,
    #[serde(default, deserialize_with = "null_as_variant")]
    pub inverse_method: Option<String>,
    pub inverse_params: Option<RawInverseParams>,
    #[serde(default, deserialize_with = "null_as_variant")]
    pub notch_masking_type: Option<String>,
    pub notch_masking_params: Option<RawNotchMaskingParams>,
}

/// Variant selectors: an explicit `null` value names the `null` variant,
/// only an absent key counts as missing.
fn null_as_variant<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Some(value.unwrap_or_else(|| "null".to_string())))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BandpassKind {
    Null,
    Butterworth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SmoothingKind {
    Null,
    Octave,
    Erb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InverseKind {
    Simple,
    Tikhonov,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MaskingKind {
    Null,
    Prominence,
}

const BANDPASS_TYPES: [(&str, BandpassKind); 2] = [
    ("null", BandpassKind::Null),
    ("butterworth", BandpassKind::Butterworth),
];
const SMOOTHING_TYPES: [(&str, SmoothingKind); 3] = [
    ("null", SmoothingKind::Null),
    ("octave", SmoothingKind::Octave),
    ("erb", SmoothingKind::Erb),
];
const INVERSE_METHODS: [(&str, InverseKind); 2] = [
    ("simple", InverseKind::Simple),
    ("tikhonov", InverseKind::Tikhonov),
];
const MASKING_TYPES: [(&str, MaskingKind); 2] = [
    ("null", MaskingKind::Null),
    ("prominence", MaskingKind::Prominence),
];

/// Case-insensitive lookup of a variant name
fn parse_variant<T: Copy>(key: &str, value: &str, table: &[(&str, T)]) -> Result<T, ConfigError> {
    let wanted = value.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| ConfigError::UnsupportedVariant {
            key: key.to_string(),
            value: value.to_string(),
            supported: table.iter().map(|(name, _)| name.to_string()).collect(),
        })
}

/// Records absent keys and hands out placeholders so that validation can
/// run to the end before reporting.
#[derive(Default)]
struct Required {
    missing: Vec<String>,
}

impl Required {
    fn take<T: Default>(&mut self, value: Option<T>, key: &str) -> T {
        match value {
            Some(v) => v,
            None => {
                self.missing.push(key.to_string());
                T::default()
            }
        }
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(self.missing))
        }
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn positive(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(key, format!("must be > 0, got {}", value)))
    }
}

fn non_negative(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(key, format!("must be >= 0, got {}", value)))
    }
}

fn finite(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(key, format!("must be finite, got {}", value)))
    }
}

fn order(key: &str, value: i64) -> Result<usize, ConfigError> {
    if value >= 1 {
        Ok(value as usize)
    } else {
        Err(invalid(key, format!("must be >= 1, got {}", value)))
    }
}

fn below_nyquist(key: &str, value: f64, fs: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 && value < fs / 2.0 {
        Ok(value)
    } else {
        Err(invalid(
            key,
            format!("must lie strictly between 0 and {} Hz, got {}", fs / 2.0, value),
        ))
    }
}

impl RawConfig {
    /// Reads a YAML (`.yaml`, `.yml`) or JSON (`.json`) config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let is_json = match ext.as_deref() {
            Some("yaml") | Some("yml") => false,
            Some("json") => true,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.display().to_string(),
                });
            }
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loading config from {}", path.display());
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Checks presence and ranges of every key and builds the typed config.
    ///
    /// Unknown variant names fail first. All missing keys, top level and
    /// variant dependent, are then reported together as dotted paths.
    pub fn validate(&self) -> Result<LinearizerConfig, ConfigError> {
        let design_method = self
            .design_method
            .as_deref()
            .map(str::parse::<DesignMethod>)
            .transpose()?;
        let bandpass_kind = self
            .bandpass_type
            .as_deref()
            .map(|v| parse_variant("bandpass_type", v, &BANDPASS_TYPES))
            .transpose()?;
        let smoothing_kind = self
            .smoothing_type
            .as_deref()
            .map(|v| parse_variant("smoothing_type", v, &SMOOTHING_TYPES))
            .transpose()?;
        let inverse_kind = self
            .inverse_method
            .as_deref()
            .map(|v| parse_variant("inverse_method", v, &INVERSE_METHODS))
            .transpose()?;
        let masking_kind = self
            .notch_masking_type
            .as_deref()
            .map(|v| parse_variant("notch_masking_type", v, &MASKING_TYPES))
            .transpose()?;

        let mut req = Required::default();
        let fs = req.take(self.fs, "fs");
        let fir_taps = req.take(self.fir_taps, "fir_taps");
        let design_method = req.take(design_method, "design_method");
        // a missing variant selector leaves its parameters unchecked
        let bandpass_kind = req.take(bandpass_kind.map(Some), "bandpass_type");
        let smoothing_kind = req.take(smoothing_kind.map(Some), "smoothing_type");
        let inverse_kind = req.take(inverse_kind.map(Some), "inverse_method");
        let masking_kind = req.take(masking_kind.map(Some), "notch_masking_type");

        let bp = self.bandpass_params.clone().unwrap_or_default();
        let bandpass_values = match bandpass_kind {
            Some(BandpassKind::Butterworth) => Some((
                req.take(bp.lowcut_freq, "bandpass_params.lowcut_freq"),
                req.take(bp.highcut_freq, "bandpass_params.highcut_freq"),
            )),
            _ => None,
        };

        let sp = self.smoothing_params.clone().unwrap_or_default();
        let fraction = match smoothing_kind {
            Some(SmoothingKind::Octave) => Some(req.take(sp.fraction, "smoothing_params.fraction")),
            _ => None,
        };

        let ip = self.inverse_params.clone().unwrap_or_default();
        let cutoff_hz = match inverse_kind {
            Some(InverseKind::Tikhonov) => Some(req.take(ip.cutoff_hz, "inverse_params.cutoff_hz")),
            _ => None,
        };

        let np = self.notch_masking_params.clone().unwrap_or_default();
        let notch_values = match masking_kind {
            Some(MaskingKind::Prominence) => Some([
                req.take(np.attenuation_db, "notch_masking_params.attenuation_db"),
                req.take(np.min_depth_db, "notch_masking_params.min_depth_db"),
                req.take(np.prominence, "notch_masking_params.prominence"),
                req.take(np.rel_height, "notch_masking_params.rel_height"),
                req.take(np.smooth_fraction, "notch_masking_params.smooth_fraction"),
            ]),
            _ => None,
        };

        req.finish()?;

        let fs = positive("fs", fs)?;
        if fs.fract() != 0.0 || fs > u32::MAX as f64 {
            return Err(invalid("fs", format!("must be an integral rate in Hz, got {}", fs)));
        }
        if fir_taps < 1 {
            return Err(invalid("fir_taps", format!("must be >= 1, got {}", fir_taps)));
        }
        let fir_taps = fir_taps as usize;
        if design_method == DesignMethod::Firls && fir_taps % 2 == 0 {
            return Err(invalid(
                "fir_taps",
                format!("firls needs an odd number of taps, got {}", fir_taps),
            ));
        }

        let bandpass = match bandpass_values {
            Some((lowcut, highcut)) => {
                let lowcut = below_nyquist("bandpass_params.lowcut_freq", lowcut, fs)?;
                let highcut = below_nyquist("bandpass_params.highcut_freq", highcut, fs)?;
                let lowcut_order = match bp.lowcut_order {
                    Some(o) => order("bandpass_params.lowcut_order", o)?,
                    None => DEFAULT_LOWCUT_ORDER,
                };
                let highcut_order = match bp.highcut_order {
                    Some(o) => order("bandpass_params.highcut_order", o)?,
                    None => DEFAULT_HIGHCUT_ORDER,
                };
                Bandpass::butterworth(lowcut, lowcut_order, highcut, highcut_order, fs)?
            }
            None => Bandpass::Null,
        };

        let smoothing = match (smoothing_kind, fraction) {
            (Some(SmoothingKind::Octave), Some(fraction)) => Smoother::Octave {
                fraction: positive("smoothing_params.fraction", fraction)?,
            },
            (Some(SmoothingKind::Erb), _) => Smoother::Erb,
            _ => Smoother::Null,
        };

        let epsilon = non_negative(
            "inverse_params.epsilon",
            ip.epsilon.unwrap_or(DEFAULT_EPSILON),
        )?;
        let inverse = match cutoff_hz {
            Some(cutoff_hz) => {
                let b_fs = positive("inverse_params.fs", ip.fs.unwrap_or(fs))?;
                Inverter::Tikhonov(TikhonovParams {
                    beta: non_negative("inverse_params.beta", ip.beta.unwrap_or(DEFAULT_BETA))?,
                    epsilon,
                    b_filter_type: match ip.b_filter_type.as_deref() {
                        Some(name) => name.parse::<RegularizationFilter>()?,
                        None => RegularizationFilter::default(),
                    },
                    cutoff_hz: below_nyquist("inverse_params.cutoff_hz", cutoff_hz, b_fs)?,
                    order: match ip.order {
                        Some(o) => order("inverse_params.order", o)?,
                        None => DEFAULT_REGULARIZATION_ORDER,
                    },
                    fs: b_fs,
                })
            }
            None => Inverter::Simple { epsilon },
        };

        let notch_masking = match notch_values {
            Some([attenuation_db, min_depth_db, prominence, rel_height, smooth_fraction]) => {
                if !(rel_height > 0.0 && rel_height <= 1.0) {
                    return Err(invalid(
                        "notch_masking_params.rel_height",
                        format!("must lie in (0, 1], got {}", rel_height),
                    ));
                }
                NotchMasker::Prominence(ProminenceParams {
                    attenuation_db: finite("notch_masking_params.attenuation_db", attenuation_db)?,
                    min_depth_db: finite("notch_masking_params.min_depth_db", min_depth_db)?,
                    prominence: non_negative("notch_masking_params.prominence", prominence)?,
                    rel_height,
                    smooth_fraction: positive(
                        "notch_masking_params.smooth_fraction",
                        smooth_fraction,
                    )?,
                })
            }
            None => NotchMasker::Null,
        };

        Ok(LinearizerConfig {
            fs,
            fir_taps,
            design_method,
            bandpass,
            smoothing,
            inverse,
            notch_masking,
        })
    }
}

/// Validated configuration, one typed variant per processing axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearizerConfig {
    /// Sample rate in Hz
    pub fs: f64,
    /// Number of FIR taps
    pub fir_taps: usize,
    pub design_method: DesignMethod,
    pub bandpass: Bandpass,
    pub smoothing: Smoother,
    pub inverse: Inverter,
    pub notch_masking: NotchMasker,
}

impl LinearizerConfig {
    /// Loads and validates a YAML or JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        RawConfig::from_file(path)?.validate()
    }

    /// Parses and validates a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str::<RawConfig>(content)?.validate()
    }

    /// Parses and validates an in-memory JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value::<RawConfig>(value)?.validate()
    }

    /// Sample rate as written in WAV headers
    pub fn sample_rate_hz(&self) -> u32 {
        self.fs as u32
    }
}

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
use std::path::Path;

use crate::config::{LinearizerConfig, RawConfig};
use crate::error::{ConfigError, LinearizerError, PipelineError};
use crate::fir::fir_spl;
use crate::read::{Measurement, load_measurement};

/// Inversion gain above which a warning is logged, in dB
const LARGE_GAIN_DB: f64 = 24.0;

/// Named pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    TargetCurve,
    MaskNotches,
    Smooth,
    Invert,
    DesignFilter,
    Simulate,
    Export,
    Plot,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::TargetCurve => "target_curve",
            Stage::MaskNotches => "mask_notches",
            Stage::Smooth => "smooth",
            Stage::Invert => "invert",
            Stage::DesignFilter => "design_filter",
            Stage::Simulate => "simulate",
            Stage::Export => "export",
            Stage::Plot => "plot",
        }
    }
}

impl Stage {
    /// Stages whose outputs are derived, directly or not, from this one
    fn downstream(&self) -> &'static [Stage] {
        match self {
            Stage::Load => &[
                Stage::TargetCurve,
                Stage::MaskNotches,
                Stage::Smooth,
                Stage::Invert,
                Stage::DesignFilter,
                Stage::Simulate,
                Stage::Export,
                Stage::Plot,
            ],
            Stage::TargetCurve | Stage::MaskNotches | Stage::Smooth => &[
                Stage::Invert,
                Stage::DesignFilter,
                Stage::Simulate,
                Stage::Export,
                Stage::Plot,
            ],
            Stage::Invert => &[Stage::DesignFilter, Stage::Simulate, Stage::Export, Stage::Plot],
            Stage::DesignFilter => &[Stage::Simulate, Stage::Export, Stage::Plot],
            Stage::Simulate => &[Stage::Plot],
            Stage::Export | Stage::Plot => &[],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Order of the two conditioning stages in [`Linearizer::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageOrder {
    /// Fill notches on the raw response, then smooth the result
    #[default]
    MaskThenSmooth,
    /// Smooth the raw response, then fill notches of the smoothed curve
    SmoothThenMask,
}

impl StageOrder {
    fn stages(&self) -> [Stage; 2] {
        match self {
            StageOrder::MaskThenSmooth => [Stage::MaskNotches, Stage::Smooth],
            StageOrder::SmoothThenMask => [Stage::Smooth, Stage::MaskNotches],
        }
    }
}

/// State threaded through the stages of one pipeline run.
///
/// Each field is produced by exactly one stage. Rerunning a stage clears the
/// fields of every stage downstream of it and removes those stages from the
/// history, so results never outlive their inputs. `conditioned_db` is shared by
/// `mask_notches` and `smooth`: whichever runs second consumes the output of
/// the first. `smoothed_db` is the raw measurement smoothed on its own and is
/// only used for display.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    measurement: Option<Measurement>,
    target_mag: Option<Array1<f64>>,
    conditioned_db: Option<Array1<f64>>,
    smoothed_db: Option<Array1<f64>>,
    inverse: Option<Array1<f64>>,
    coeffs: Option<Vec<f64>>,
    filter_db: Option<Array1<f64>>,
    equalized_db: Option<Array1<f64>>,
    history: Vec<Stage>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages run so far, in invocation order
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn has_run(&self, stage: Stage) -> bool {
        self.history.contains(&stage)
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    /// Target magnitude (linear)
    pub fn target_mag(&self) -> Option<&Array1<f64>> {
        self.target_mag.as_ref()
    }

    /// Notch filled and/or smoothed response (dB)
    pub fn conditioned_db(&self) -> Option<&Array1<f64>> {
        self.conditioned_db.as_ref()
    }

    /// Raw measurement smoothed with the configured smoother (dB)
    pub fn smoothed_db(&self) -> Option<&Array1<f64>> {
        self.smoothed_db.as_ref()
    }

    /// Inverse magnitude (linear) handed to the FIR design
    pub fn inverse(&self) -> Option<&Array1<f64>> {
        self.inverse.as_ref()
    }

    pub fn coeffs(&self) -> Option<&[f64]> {
        self.coeffs.as_deref()
    }

    /// Response of the designed filter alone (dB)
    pub fn filter_db(&self) -> Option<&Array1<f64>> {
        self.filter_db.as_ref()
    }

    /// Simulated response of speaker and filter (dB)
    pub fn equalized_db(&self) -> Option<&Array1<f64>> {
        self.equalized_db.as_ref()
    }

    /// Conditioned response if any conditioning ran, raw measurement otherwise
    pub fn response_db(&self) -> Option<&Array1<f64>> {
        self.conditioned_db
            .as_ref()
            .or(self.measurement.as_ref().map(|m| m.spl()))
    }

    /// Largest absolute difference in dB between the equalized response and
    /// the target inside `[f_lo, f_hi]`. `None` before `simulate` or when no
    /// grid point falls in the band.
    pub fn max_deviation_db(&self, f_lo: f64, f_hi: f64) -> Option<f64> {
        let m = self.measurement.as_ref()?;
        let target = self.target_mag.as_ref()?;
        let equalized = self.equalized_db.as_ref()?;
        m.freq()
            .iter()
            .zip(target.iter().zip(equalized.iter()))
            .filter(|(f, _)| (f_lo..=f_hi).contains(*f))
            .map(|(_, (t, e))| (e - 20.0 * (t + 1e-10).log10()).abs())
            .reduce(f64::max)
    }

    fn measurement_for(&self, stage: Stage) -> Result<&Measurement, PipelineError> {
        self.measurement.as_ref().ok_or(PipelineError::StageNotRun {
            stage,
            requires: Stage::Load,
        })
    }

    /// Records `stage` as complete and drops every result derived from an
    /// earlier run of it.
    fn mark(&mut self, stage: Stage) {
        let stale = stage.downstream();
        for s in stale {
            match s {
                Stage::Invert => self.inverse = None,
                Stage::DesignFilter => self.coeffs = None,
                Stage::Simulate => {
                    self.filter_db = None;
                    self.equalized_db = None;
                }
                _ => {}
            }
        }
        self.history.retain(|s| !stale.contains(s));
        self.history.push(stage);
    }
}

/// Runs the linearization stages for one configuration.
///
/// A `Linearizer` holds only the validated configuration; all intermediate
/// data lives in the [`PipelineContext`] passed to each stage, so one
/// instance can drive any number of independent runs.
#[derive(Debug, Clone)]
pub struct Linearizer {
    config: LinearizerConfig,
}

impl Linearizer {
    pub fn new(config: LinearizerConfig) -> Self {
        Linearizer { config }
    }

    /// Validates a raw config and builds the linearizer
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(raw.validate()?))
    }

    /// Loads a YAML or JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(LinearizerConfig::from_file(path)?))
    }

    pub fn config(&self) -> &LinearizerConfig {
        &self.config
    }

    /// Loads a measurement file into a fresh context state
    pub fn load<'a>(
        &self,
        ctx: &'a mut PipelineContext,
        path: &Path,
    ) -> Result<&'a Measurement, LinearizerError> {
        let measurement = load_measurement(path)?;
        Ok(self.set_measurement(ctx, measurement))
    }

    /// Starts a run from an in-memory measurement, discarding previous results
    pub fn set_measurement<'a>(
        &self,
        ctx: &'a mut PipelineContext,
        measurement: Measurement,
    ) -> &'a Measurement {
        let nyquist = self.config.fs / 2.0;
        let above = measurement.freq().iter().filter(|f| **f > nyquist).count();
        if above > 0 {
            log::warn!(
                "{} grid point(s) above Nyquist ({} Hz), filter design will fail",
                above,
                nyquist
            );
        }
        log::info!(
            "Measurement: {} points, {:.1} Hz - {:.1} Hz",
            measurement.len(),
            measurement.freq()[0],
            measurement.freq()[measurement.len() - 1]
        );
        *ctx = PipelineContext::default();
        ctx.mark(Stage::Load);
        ctx.measurement.insert(measurement)
    }

    /// Builds the band-pass shaped target magnitude on the measurement grid
    pub fn design_target_curve<'a>(
        &self,
        ctx: &'a mut PipelineContext,
    ) -> Result<&'a Array1<f64>, PipelineError> {
        let freqs = &ctx.measurement_for(Stage::TargetCurve)?.freq();
        let target = self.config.bandpass.design_target(freqs);
        log::info!("Target curve: {} band-pass", self.config.bandpass.name());
        ctx.mark(Stage::TargetCurve);
        Ok(ctx.target_mag.insert(target))
    }

    /// Fills narrow notches of the current response
    pub fn mask_notches<'a>(
        &self,
        ctx: &'a mut PipelineContext,
    ) -> Result<&'a Array1<f64>, PipelineError> {
        let m = ctx.measurement_for(Stage::MaskNotches)?;
        let current = ctx.conditioned_db.as_ref().unwrap_or(m.spl());
        let masked = self.config.notch_masking.apply_notch_mask(m.freq(), current);
        log::info!("Notch masking: {}", self.config.notch_masking.name());
        ctx.mark(Stage::MaskNotches);
        Ok(ctx.conditioned_db.insert(masked))
    }

    /// Smooths the current response; the raw measurement is smoothed
    /// separately into `smoothed_db` for display.
    pub fn smooth<'a>(
        &self,
        ctx: &'a mut PipelineContext,
    ) -> Result<&'a Array1<f64>, PipelineError> {
        let m = ctx.measurement_for(Stage::Smooth)?;
        let smoother = &self.config.smoothing;
        let current = ctx.conditioned_db.as_ref().unwrap_or(m.spl());
        let conditioned = smoother.smooth(m.freq(), current);
        let smoothed_raw = smoother.smooth(m.freq(), m.spl());
        log::info!("Smoothing: {}", smoother.name());
        ctx.smoothed_db = Some(smoothed_raw);
        ctx.mark(Stage::Smooth);
        Ok(ctx.conditioned_db.insert(conditioned))
    }

    /// Computes the inverse magnitude of the conditioned (or raw) response
    pub fn invert<'a>(
        &self,
        ctx: &'a mut PipelineContext,
    ) -> Result<&'a Array1<f64>, PipelineError> {
        let m = ctx.measurement_for(Stage::Invert)?;
        let target = ctx.target_mag.as_ref().ok_or(PipelineError::StageNotRun {
            stage: Stage::Invert,
            requires: Stage::TargetCurve,
        })?;
        let response = ctx.conditioned_db.as_ref().unwrap_or(m.spl());
        let inverse = self.config.inverse.compute(m.freq(), response, target);

        let peak = inverse.iter().cloned().fold(0.0_f64, f64::max);
        let peak_db = 20.0 * (peak + 1e-20).log10();
        if peak_db > LARGE_GAIN_DB {
            log::warn!(
                "Inverse response reaches {:+.1} dB, consider regularization",
                peak_db
            );
        }
        log::info!(
            "Inversion: {}, peak gain {:+.1} dB",
            self.config.inverse.name(),
            peak_db
        );
        ctx.mark(Stage::Invert);
        Ok(ctx.inverse.insert(inverse))
    }

    /// Synthesizes the FIR coefficients realizing the inverse response
    pub fn design_filter<'a>(
        &self,
        ctx: &'a mut PipelineContext,
    ) -> Result<&'a [f64], LinearizerError> {
        let m = ctx.measurement_for(Stage::DesignFilter)?;
        let inverse = ctx.inverse.as_ref().ok_or(PipelineError::StageNotRun {
            stage: Stage::DesignFilter,
            requires: Stage::Invert,
        })?;
        let coeffs = self.config.design_method.design(
            m.freq(),
            inverse,
            self.config.fs,
            self.config.fir_taps,
        )?;
        log::info!(
            "FIR design: {}, {} taps",
            self.config.design_method,
            coeffs.len()
        );
        ctx.mark(Stage::DesignFilter);
        Ok(ctx.coeffs.insert(coeffs))
    }

    /// Simulates speaker plus filter: `20 log10|H(f)| + response_db`
    pub fn simulate<'a>(
        &self,
        ctx: &'a mut PipelineContext,
    ) -> Result<&'a Array1<f64>, PipelineError> {
        let m = ctx.measurement_for(Stage::Simulate)?;
        let coeffs = ctx.coeffs.as_ref().ok_or(PipelineError::StageNotRun {
            stage: Stage::Simulate,
            requires: Stage::DesignFilter,
        })?;
        let filter_db = fir_spl(coeffs, m.freq(), self.config.fs);
        let response = ctx.conditioned_db.as_ref().unwrap_or(m.spl());
        let equalized = &filter_db + response;
        ctx.filter_db = Some(filter_db);
        ctx.mark(Stage::Simulate);
        Ok(ctx.equalized_db.insert(equalized))
    }

    /// Writes the coefficients, format chosen by extension
    pub fn export(&self, ctx: &mut PipelineContext, path: &Path) -> Result<(), LinearizerError> {
        let coeffs = ctx.coeffs.as_ref().ok_or(PipelineError::StageNotRun {
            stage: Stage::Export,
            requires: Stage::DesignFilter,
        })?;
        crate::export::export_coefficients(coeffs, self.config.sample_rate_hz(), path)?;
        ctx.mark(Stage::Export);
        Ok(())
    }

    /// Writes the comparison chart as HTML
    pub fn plot(&self, ctx: &mut PipelineContext, path: &Path) -> Result<(), LinearizerError> {
        let missing = PipelineError::StageNotRun {
            stage: Stage::Plot,
            requires: Stage::Simulate,
        };
        let (Some(m), Some(target), Some(equalized)) = (
            ctx.measurement.as_ref(),
            ctx.target_mag.as_ref(),
            ctx.equalized_db.as_ref(),
        ) else {
            return Err(missing.into());
        };
        let plot = crate::plot::plot_results(
            m.freq(),
            m.spl(),
            ctx.smoothed_db.as_ref(),
            ctx.conditioned_db.as_ref(),
            target,
            equalized,
        );
        crate::plot::write_plot(&plot, path)?;
        ctx.mark(Stage::Plot);
        Ok(())
    }

    /// Loads `path` and runs every stage up to `simulate`
    pub fn run(&self, path: &Path, order: StageOrder) -> Result<PipelineContext, LinearizerError> {
        let measurement = load_measurement(path)?;
        self.run_measurement(measurement, order)
    }

    /// Runs every stage up to `simulate` on an in-memory measurement
    pub fn run_measurement(
        &self,
        measurement: Measurement,
        order: StageOrder,
    ) -> Result<PipelineContext, LinearizerError> {
        let mut ctx = PipelineContext::new();
        self.set_measurement(&mut ctx, measurement);
        self.design_target_curve(&mut ctx)?;
        for stage in order.stages() {
            match stage {
                Stage::MaskNotches => self.mask_notches(&mut ctx)?,
                _ => self.smooth(&mut ctx)?,
            };
        }
        self.invert(&mut ctx)?;
        self.design_filter(&mut ctx)?;
        self.simulate(&mut ctx)?;
        Ok(ctx)
    }
}

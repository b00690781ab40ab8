//! Linearizer - FIR correction filters for loudspeakers
//! Command-line interface definitions
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

use crate::pipeline::StageOrder;
use clap::Parser;
use std::path::PathBuf;

/// Designs a linear phase FIR filter that flattens a measured loudspeaker response.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (YAML or JSON).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Measured frequency response (.json with f_hz/db arrays, or .csv/.txt frequency,spl).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file for the coefficients (.wav or .txt).
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional HTML file for the before/after chart.
    #[arg(short, long)]
    pub plot: Option<PathBuf>,

    /// Smooth before filling notches instead of after.
    #[arg(long, default_value_t = false)]
    pub smooth_first: bool,

    /// Lower edge of the band used for the deviation summary, in Hz.
    #[arg(long, default_value_t = 500.0)]
    pub report_min_freq: f64,

    /// Upper edge of the band used for the deviation summary, in Hz.
    #[arg(long, default_value_t = 15000.0)]
    pub report_max_freq: f64,
}

impl Args {
    /// Conditioning order selected on the command line
    pub fn stage_order(&self) -> StageOrder {
        if self.smooth_first {
            StageOrder::SmoothThenMask
        } else {
            StageOrder::MaskThenSmooth
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = Args::parse_from([
            "linearizer",
            "--config",
            "cfg.yaml",
            "-i",
            "spectrum.json",
            "-o",
            "out/fir.wav",
        ]);
        assert_eq!(args.config, PathBuf::from("cfg.yaml"));
        assert!(args.plot.is_none());
        assert_eq!(args.stage_order(), StageOrder::MaskThenSmooth);
        assert_eq!(args.report_min_freq, 500.0);

        let args = Args::parse_from([
            "linearizer",
            "-c",
            "cfg.json",
            "-i",
            "m.csv",
            "-o",
            "fir.txt",
            "--plot",
            "chart.html",
            "--smooth-first",
        ]);
        assert_eq!(args.plot, Some(PathBuf::from("chart.html")));
        assert_eq!(args.stage_order(), StageOrder::SmoothThenMask);
    }

    #[test]
    fn test_required_arguments() {
        assert!(Args::try_parse_from(["linearizer", "-c", "cfg.yaml"]).is_err());
    }
}

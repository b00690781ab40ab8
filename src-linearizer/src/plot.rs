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
use plotly::common::{Line, Mode, Title};
use plotly::layout::{Axis, AxisType};
use plotly::{Layout, Plot, Scatter};
use std::path::Path;

use crate::error::PlotError;

fn curve_trace(
    freqs: &Array1<f64>,
    values: &Array1<f64>,
    name: &str,
    color: &str,
) -> Box<Scatter<f64, f64>> {
    Scatter::new(freqs.to_vec(), values.to_vec())
        .mode(Mode::Lines)
        .name(name)
        .line(Line::new().color(color.to_string()))
}

/// Builds the before/after comparison chart.
///
/// # Arguments
/// * `freqs` - Frequency grid in Hz
/// * `original_db` - Raw measurement
/// * `smoothed_db` - Raw measurement smoothed, if the smoothing stage ran
/// * `conditioned_db` - Response the inversion used, if conditioning ran
/// * `target_mag` - Target magnitude (linear), drawn in dB
/// * `equalized_db` - Simulated speaker plus filter response
pub fn plot_results(
    freqs: &Array1<f64>,
    original_db: &Array1<f64>,
    smoothed_db: Option<&Array1<f64>>,
    conditioned_db: Option<&Array1<f64>>,
    target_mag: &Array1<f64>,
    equalized_db: &Array1<f64>,
) -> Plot {
    let mut plot = Plot::new();

    plot.add_trace(curve_trace(freqs, original_db, "Original", "#1f77b4"));
    if let Some(sm) = smoothed_db {
        plot.add_trace(curve_trace(freqs, sm, "Smoothed", "#ff7f0e"));
    }
    if let Some(cond) = conditioned_db {
        plot.add_trace(curve_trace(freqs, cond, "Conditioned", "#9467bd"));
    }
    let target_db = target_mag.mapv(|t| 20.0 * (t + 1e-10).log10());
    plot.add_trace(
        Scatter::new(freqs.to_vec(), target_db.to_vec())
            .mode(Mode::Lines)
            .name("Target")
            .line(Line::new().color("#000000").width(1.0)),
    );
    plot.add_trace(
        Scatter::new(freqs.to_vec(), equalized_db.to_vec())
            .mode(Mode::Lines)
            .name("Equalized")
            .line(Line::new().color("#2ca02c").width(2.0)),
    );

    let layout = Layout::new()
        .title(Title::with_text("FIR linearization"))
        .x_axis(
            Axis::new()
                .title(Title::with_text("Frequency (Hz)"))
                .type_(AxisType::Log)
                .range(vec![1.301, 4.301]), // log10(20) to log10(20000)
        )
        .y_axis(Axis::new().title(Title::with_text("SPL (dB)")));
    plot.set_layout(layout);
    plot
}

/// Writes `plot` as a standalone HTML page, creating parent directories
pub fn write_plot(plot: &Plot, path: &Path) -> Result<(), PlotError> {
    let io_error = |source: std::io::Error| PlotError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, plot.to_html()).map_err(io_error)?;
    log::info!("Plot saved to {}", path.display());
    Ok(())
}

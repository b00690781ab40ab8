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

use clap::Parser;
use env_logger::{Builder, Env};
use linearizer::cli::Args;
use linearizer::{Linearizer, LinearizerError};
use std::process;

fn run(args: &Args) -> Result<(), LinearizerError> {
    let linearizer = Linearizer::from_file(&args.config)?;
    let config = linearizer.config();
    println!(
        "⚙️  {} taps at {} Hz, {} / {} / {} / {} / {}",
        config.fir_taps,
        config.fs,
        config.design_method,
        config.bandpass.name(),
        config.smoothing.name(),
        config.inverse.name(),
        config.notch_masking.name()
    );

    let mut ctx = linearizer.run(&args.input, args.stage_order())?;
    println!("📈 Processed {}", args.input.display());

    linearizer.export(&mut ctx, &args.output)?;
    println!("💾 Coefficients saved to: {}", args.output.display());

    if let Some(plot_path) = &args.plot {
        linearizer.plot(&mut ctx, plot_path)?;
        println!("📊 Plot saved to: {}", plot_path.display());
    }

    match ctx.max_deviation_db(args.report_min_freq, args.report_max_freq) {
        Some(dev) => println!(
            "✅ Max deviation from target {:.0} Hz - {:.0} Hz: {:.2} dB",
            args.report_min_freq, args.report_max_freq, dev
        ),
        None => println!(
            "⚠️ No grid point between {:.0} Hz and {:.0} Hz",
            args.report_min_freq, args.report_max_freq
        ),
    }
    Ok(())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}

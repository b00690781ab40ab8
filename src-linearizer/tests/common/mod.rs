//! Synthetic measurements and helpers shared by the integration tests

#![allow(dead_code)]

use linearizer::Measurement;
use linearizer::iir::Sos;
use ndarray::Array1;
use std::path::{Path, PathBuf};

pub const FS: f64 = 48000.0;

/// Log spaced grid from 20 Hz to 20 kHz
pub fn log_grid(n: usize) -> Array1<f64> {
    Array1::logspace(10.0, 20f64.log10(), 20000f64.log10(), n)
}

/// Flat 0 dB measurement
pub fn flat_measurement(n: usize) -> Measurement {
    Measurement::new(log_grid(n), Array1::zeros(n)).unwrap()
}

/// Speaker like response: second order roll-off at 80 Hz, slow ripple of
/// +-2 dB and a -1 dB/octave tilt above 1 kHz.
pub fn speaker_response(n: usize) -> Measurement {
    let freqs = log_grid(n);
    let rolloff = Sos::butterworth_highpass(2, 80.0, FS).spl(&freqs);
    let spl = freqs
        .iter()
        .zip(rolloff.iter())
        .map(|(&f, &r)| {
            let ripple = 2.0 * (2.0 * std::f64::consts::PI * (f / 100.0).log2() / 1.5).sin();
            let tilt = if f > 1000.0 { -(f / 1000.0).log2() } else { 0.0 };
            80.0 + r + ripple + tilt
        })
        .collect::<Array1<f64>>();
    // measurements are normalized around 0 dB in the passband
    let offset = 80.0;
    Measurement::new(freqs, spl - offset).unwrap()
}

/// [`speaker_response`] with a 15 dB deep, 2 bin wide notch near 11 kHz
pub fn speaker_with_notch(n: usize) -> (Measurement, usize) {
    let base = speaker_response(n);
    let center = base.freq().iter().position(|&f| f >= 11000.0).unwrap();
    let mut spl = base.spl().clone();
    spl[center] -= 15.0;
    spl[center + 1] -= 15.0;
    let m = Measurement::new(base.freq().clone(), spl).unwrap();
    (m, center)
}

/// Writes `m` as a `{f_hz, db}` JSON file
pub fn write_json_measurement(dir: &Path, name: &str, m: &Measurement) -> PathBuf {
    let path = dir.join(name);
    let value = serde_json::json!({
        "f_hz": m.freq().to_vec(),
        "db": m.spl().to_vec(),
    });
    std::fs::write(&path, value.to_string()).unwrap();
    path
}

/// Writes `m` as a two column CSV file with a header
pub fn write_csv_measurement(dir: &Path, name: &str, m: &Measurement) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from("frequency,spl\n");
    for (f, s) in m.freq().iter().zip(m.spl().iter()) {
        content.push_str(&format!("{},{}\n", f, s));
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Config value for a plain inversion: no smoothing, masking or regularization
pub fn plain_config(fir_taps: usize) -> serde_json::Value {
    serde_json::json!({
        "fs": FS,
        "fir_taps": fir_taps,
        "design_method": "firls",
        "bandpass_type": "butterworth",
        "bandpass_params": {"lowcut_freq": 125, "highcut_freq": 20000},
        "smoothing_type": "null",
        "inverse_method": "simple",
        "notch_masking_type": "null"
    })
}

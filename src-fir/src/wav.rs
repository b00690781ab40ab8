use crate::error::Result;
use std::path::Path;

/// Saves FIR taps as a mono 32-bit float WAV file, one sample per tap
pub fn save_fir_to_wav(coeffs: &[f64], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in coeffs {
        writer.write_sample(sample as f32)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Reads FIR taps back from a mono 32-bit float WAV file
///
/// # Returns
/// * The taps and the sample rate stored in the header
pub fn load_fir_from_wav(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let sample_rate = reader.spec().sample_rate;
    let coeffs = reader
        .samples::<f32>()
        .map(|s| s.map(f64::from))
        .collect::<std::result::Result<Vec<f64>, hound::Error>>()?;
    Ok((coeffs, sample_rate))
}

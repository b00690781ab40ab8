use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use ndarray::Array1;

use super::Measurement;
use crate::error::DataFormatError;

fn io_error(path: &Path, source: std::io::Error) -> DataFormatError {
    DataFormatError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn parse_error(path: &Path, reason: impl Into<String>) -> DataFormatError {
    DataFormatError::Parse {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Turns the numeric fields of one row into `(freq, spl)`.
///
/// 2 columns are `freq, spl`; 4 columns are `freq_l, spl_l, freq_r, spl_r`
/// and the two SPL values are averaged.
fn row_to_point(parts: &[&str], columns: usize) -> Option<(f64, f64)> {
    let values: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();
    let values = values?;
    match columns {
        2 if values.len() >= 2 => Some((values[0], values[1])),
        4 if values.len() >= 4 => Some((values[0], (values[1] + values[3]) / 2.0)),
        _ => None,
    }
}

/// Load frequency response data from a text file
/// Expected formats:
/// - 2 columns: frequency, spl
/// - 4 columns: freq_left, spl_left, freq_right, spl_right (averaged)
///
/// Columns are separated by commas or whitespace. Empty lines, `#` or `//`
/// comments and a text header on the first line are skipped.
pub fn load_frequency_response(path: &Path) -> Result<(Array1<f64>, Array1<f64>), DataFormatError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let reader = BufReader::new(file);

    let mut frequencies = Vec::new();
    let mut spl_values = Vec::new();
    let mut detected_columns = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(path, e))?;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        // Parse line (handle both comma and whitespace separation)
        let parts: Vec<&str> = if line.contains(',') {
            line.split(',').map(|s| s.trim()).collect()
        } else {
            line.split_whitespace().collect()
        };

        // Skip header if it contains text
        if frequencies.is_empty() && parts.first().is_some_and(|p| p.parse::<f64>().is_err()) {
            continue;
        }

        // Detect number of columns on first data line
        if detected_columns == 0 {
            detected_columns = match parts.len() {
                2 | 3 => 2,
                n if n >= 4 => 4,
                n => {
                    return Err(parse_error(
                        path,
                        format!("line {}: expected 2 or 4 columns, got {}", line_num + 1, n),
                    ));
                }
            };
        }

        let (freq, spl) = row_to_point(&parts, detected_columns).ok_or_else(|| {
            parse_error(path, format!("line {}: cannot parse '{}'", line_num + 1, line))
        })?;
        frequencies.push(freq);
        spl_values.push(spl);
    }

    if frequencies.is_empty() {
        return Err(parse_error(path, "no valid frequency response data found"));
    }

    Ok((Array1::from_vec(frequencies), Array1::from_vec(spl_values)))
}

/// Read a measurement from a comma separated file
///
/// # CSV Format
/// An optional header row (e.g. `frequency,spl`) followed by rows of
/// frequency (Hz) and SPL (dB), or the 4 column left/right layout.
pub fn read_measurement_from_csv(path: &Path) -> Result<Measurement, DataFormatError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(file);

    let mut freqs = Vec::new();
    let mut spls = Vec::new();
    let mut columns = 0;

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| parse_error(path, e.to_string()))?;
        let parts: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
        if parts.is_empty() {
            continue;
        }
        if freqs.is_empty() && parts[0].parse::<f64>().is_err() {
            // header
            continue;
        }
        if columns == 0 {
            columns = if parts.len() >= 4 { 4 } else { 2 };
        }
        let (freq, spl) = row_to_point(&parts, columns)
            .ok_or_else(|| parse_error(path, format!("row {}: cannot parse", row + 1)))?;
        freqs.push(freq);
        spls.push(spl);
    }

    if freqs.is_empty() {
        return Err(parse_error(path, "no valid frequency response data found"));
    }

    Measurement::new(Array1::from(freqs), Array1::from(spls))
}

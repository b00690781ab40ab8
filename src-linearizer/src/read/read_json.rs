use super::Measurement;
use crate::error::DataFormatError;
use ndarray::Array1;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct JsonSpectrum {
    f_hz: Vec<f64>,
    db: Vec<f64>,
}

/// Read a measurement from a JSON object with `f_hz` and `db` arrays
pub fn read_measurement_from_json(path: &Path) -> Result<Measurement, DataFormatError> {
    let content = std::fs::read_to_string(path).map_err(|source| DataFormatError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let spectrum: JsonSpectrum =
        serde_json::from_str(&content).map_err(|e| DataFormatError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Measurement::new(Array1::from(spectrum.f_hz), Array1::from(spectrum.db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"f_hz": [20, 200]}"#).unwrap();
        match read_measurement_from_json(&path) {
            Err(DataFormatError::Parse { reason, .. }) => assert!(reason.contains("db")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.json");
        fs::write(&path, r#"{"f_hz": [20, 200], "db": [0.0]}"#).unwrap();
        assert!(matches!(
            read_measurement_from_json(&path),
            Err(DataFormatError::InvalidMeasurement { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_measurement_from_json(&dir.path().join("none.json")),
            Err(DataFormatError::Io { .. })
        ));
    }
}

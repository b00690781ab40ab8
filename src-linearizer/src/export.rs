use std::fmt::Write as _;
use std::path::Path;

use crate::error::ExportError;
use crate::fir::save_fir_to_wav;

/// Extensions handled by [`export_coefficients`]
pub const SUPPORTED_EXTENSIONS: [&str; 2] = [".wav", ".txt"];

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes FIR coefficients to `path`, format chosen by extension.
///
/// * `.wav` - mono 32-bit float, one sample per coefficient
/// * `.txt` - one coefficient per line in scientific notation
///
/// Missing parent directories are created.
pub fn export_coefficients(coeffs: &[f64], fs: u32, path: &Path) -> Result<(), ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if !matches!(ext.as_deref(), Some("wav") | Some("txt")) {
        return Err(ExportError::UnsupportedFormat {
            path: path.display().to_string(),
            supported: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
    }

    if ext.as_deref() == Some("wav") {
        save_fir_to_wav(coeffs, fs, path)?;
    } else {
        let mut content = String::with_capacity(coeffs.len() * 20);
        for c in coeffs {
            // writing into a String cannot fail
            let _ = writeln!(content, "{:.12e}", c);
        }
        std::fs::write(path, content).map_err(|e| io_error(path, e))?;
    }
    log::info!("Exported {} coefficients to {}", coeffs.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fir::load_fir_from_wav;
    use tempfile::tempdir;

    #[test]
    fn test_wav_export_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports").join("fir.wav");
        let coeffs = [0.25, -0.5, 1.0, -0.5, 0.25];
        export_coefficients(&coeffs, 44100, &path).unwrap();
        let (read, fs) = load_fir_from_wav(&path).unwrap();
        assert_eq!(fs, 44100);
        assert_eq!(read, coeffs.to_vec());
    }

    #[test]
    fn test_txt_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fir.TXT");
        export_coefficients(&[1.0, -0.001], 48000, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let values: Vec<f64> = content.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(values, vec![1.0, -0.001]);
        assert_eq!(content.lines().next(), Some("1.000000000000e0"));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fir.flac");
        match export_coefficients(&[1.0], 48000, &path) {
            Err(ExportError::UnsupportedFormat { supported, .. }) => {
                assert_eq!(supported, vec![".wav", ".txt"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!path.exists());
    }
}

use linearizer::{
    Bandpass, ConfigError, Inverter, Linearizer, LinearizerConfig, NotchMasker, RawConfig,
    Smoother,
};
use std::fs;
use tempfile::tempdir;

const DEMO: &str = include_str!("../../demos/linearizer.yaml");

#[test]
fn test_demo_config_is_valid() {
    let cfg = LinearizerConfig::from_yaml_str(DEMO).unwrap();
    assert_eq!(cfg.fir_taps, 255);
    assert_eq!(cfg.smoothing, Smoother::Erb);
    assert_eq!(cfg.bandpass.edges(), Some((125.0, 20000.0)));
    match cfg.inverse {
        Inverter::Tikhonov(p) => {
            assert_eq!(p.cutoff_hz, 8000.0);
            assert_eq!(p.beta, 0.1);
        }
        other => panic!("unexpected {:?}", other),
    }
    match cfg.notch_masking {
        NotchMasker::Prominence(p) => assert_eq!(p.smooth_fraction, 3.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_yaml_and_json_files_agree() {
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("cfg.yml");
    fs::write(&yaml, DEMO).unwrap();
    let raw: RawConfig = serde_yaml::from_str(DEMO).unwrap();
    let json = dir.path().join("cfg.json");
    fs::write(&json, serde_json::to_string_pretty(&raw).unwrap()).unwrap();

    let a = LinearizerConfig::from_file(&yaml).unwrap();
    let b = LinearizerConfig::from_file(&json).unwrap();
    assert_eq!(a, b);
    assert!(Linearizer::from_file(&json).is_ok());
}

#[test]
fn test_missing_nested_keys_use_dotted_paths() {
    let yaml = r#"
fs: 48000
fir_taps: 255
design_method: firwin2
bandpass_type: butterworth
smoothing_type: octave
inverse_method: tikhonov
notch_masking_type: prominence
notch_masking_params:
  attenuation_db: 10.0
  min_depth_db: 6.0
  prominence: 3.0
"#;
    match LinearizerConfig::from_yaml_str(yaml).unwrap_err() {
        ConfigError::MissingKeys(keys) => assert_eq!(
            keys,
            vec![
                "bandpass_params.lowcut_freq",
                "bandpass_params.highcut_freq",
                "smoothing_params.fraction",
                "inverse_params.cutoff_hz",
                "notch_masking_params.rel_height",
                "notch_masking_params.smooth_fraction",
            ]
        ),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_null_variants_need_no_params() {
    let yaml = r#"
fs: 44100
fir_taps: 101
design_method: FIRLS
bandpass_type: "null"
smoothing_type: "null"
inverse_method: simple
notch_masking_type: "null"
"#;
    let cfg = LinearizerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(cfg.bandpass, Bandpass::Null);
    assert_eq!(cfg.smoothing, Smoother::Null);
    assert_eq!(cfg.inverse, Inverter::Simple { epsilon: 1e-10 });
    assert_eq!(cfg.notch_masking, NotchMasker::Null);
    assert_eq!(cfg.sample_rate_hz(), 44100);
}

#[test]
fn test_frequency_order_and_ranges() {
    let swapped = DEMO.replace("lowcut_freq: 125", "lowcut_freq: 20000")
        .replace("highcut_freq: 20000", "highcut_freq: 125");
    match LinearizerConfig::from_yaml_str(&swapped).unwrap_err() {
        ConfigError::InvalidFrequencyOrder { lowcut, highcut } => {
            assert_eq!((lowcut, highcut), (20000.0, 125.0));
        }
        other => panic!("unexpected {:?}", other),
    }

    let fractional_rate = DEMO.replacen("fs: 48000", "fs: 48000.5", 1);
    assert!(matches!(
        LinearizerConfig::from_yaml_str(&fractional_rate),
        Err(ConfigError::InvalidValue { key, .. }) if key == "fs"
    ));

    let zero_order = DEMO.replace("lowcut_order: 4", "lowcut_order: 0");
    assert!(matches!(
        LinearizerConfig::from_yaml_str(&zero_order),
        Err(ConfigError::InvalidValue { key, .. }) if key == "bandpass_params.lowcut_order"
    ));

    let negative_beta = DEMO.replace("beta: 0.1", "beta: -0.1");
    assert!(matches!(
        LinearizerConfig::from_yaml_str(&negative_beta),
        Err(ConfigError::InvalidValue { key, .. }) if key == "inverse_params.beta"
    ));
}

#[test]
fn test_file_errors() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        LinearizerConfig::from_file(&dir.path().join("absent.yaml")),
        Err(ConfigError::Io { .. })
    ));

    let broken = dir.path().join("broken.yaml");
    fs::write(&broken, "fs: [48000\n").unwrap();
    assert!(matches!(
        LinearizerConfig::from_file(&broken),
        Err(ConfigError::Yaml(_))
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"fs\": 48000,").unwrap();
    assert!(matches!(
        LinearizerConfig::from_file(&broken),
        Err(ConfigError::Json(_))
    ));

    let wrong_type = dir.path().join("wrong.json");
    fs::write(&wrong_type, r#"{"fir_taps": "many"}"#).unwrap();
    assert!(LinearizerConfig::from_file(&wrong_type).is_err());
}

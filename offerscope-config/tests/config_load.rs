use offerscope_config::{LogFormatConfig, NormalizationModeConfig, OffersConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
board:
  base_url: "https://isa.example.test/imoniteur_ISAP/"
  timeout_secs: 10
scrape:
  max_in_flight: 8
normalization:
  mode: split
  api_base: "https://normalizer.example.test/"
  api_key: "${OFFERSCOPE_TEST_API_KEY}"
store:
  path: "/var/lib/offerscope/offers.json"
logging:
  format: json
  emit_stderr: true
"#;

#[test]
#[serial]
fn file_values_and_env_expansion() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "offerscope.yaml", FILE_YAML);

    temp_env::with_var("OFFERSCOPE_TEST_API_KEY", Some("k-from-env"), || {
        let config = OffersConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load offerscope config");

        assert_eq!(
            config.board.base_url,
            "https://isa.example.test/imoniteur_ISAP/"
        );
        assert_eq!(config.board.timeout_secs, 10);
        // untouched keys keep their defaults
        assert_eq!(config.board.listing_cell, "308197177");
        assert_eq!(config.scrape.max_in_flight, Some(8));
        assert_eq!(config.normalization.mode, NormalizationModeConfig::Split);
        assert_eq!(config.normalization.api_key.as_deref(), Some("k-from-env"));
        assert_eq!(
            config.store.path,
            Some(PathBuf::from("/var/lib/offerscope/offers.json"))
        );
        assert_eq!(config.logging.format, LogFormatConfig::Json);
        assert!(config.logging.emit_stderr);
    });
}

#[test]
#[serial]
fn env_overrides_win_over_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "offerscope.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("OFFERSCOPE__SCRAPE__MAX_IN_FLIGHT", Some("2")),
            ("OFFERSCOPE__NORMALIZATION__MODE", Some("combined")),
            ("OFFERSCOPE__NORMALIZATION__EMAIL", Some("student@epfl.ch")),
        ],
        || {
            let config = OffersConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load offerscope config");

            assert_eq!(config.scrape.max_in_flight, Some(2));
            assert_eq!(config.normalization.mode, NormalizationModeConfig::Combined);
            assert_eq!(
                config.normalization.email.as_deref(),
                Some("student@epfl.ch")
            );
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let config = OffersConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults only");
    assert_eq!(config.board.detail_cell, "2742535167");
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let result = OffersConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

//! Configuration and catalog files on disk

use framesense::{
    alignment::MirrorMode,
    catalog::Catalog,
    config::{Config, EXAMPLE_CONFIG},
    Error,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_round_trip() {
    let mut config = Config::default();
    config.tracking.source = "replay:/data/session.json".to_string();
    config.tracking.reference_ipd = 0.06;
    config.display.mirror = MirrorMode::None;
    config.smoothing.filter = "median".to_string();
    config.catalog.default_selection = Some("round-02".to_string());

    let file = NamedTempFile::new().unwrap();
    config.to_file(file.path()).unwrap();
    let loaded = Config::from_file(file.path()).unwrap();

    assert_eq!(loaded, config);
    loaded.validate().unwrap();
}

#[test]
fn test_example_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(EXAMPLE_CONFIG.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.display.width, 1280);
    assert_eq!(config.fit.shape_penalty, 15.0);
}

#[test]
fn test_malformed_config_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"display: [not, a, mapping]\n").unwrap();
    assert!(matches!(Config::from_file(file.path()), Err(Error::ConfigError(_))));
}

#[test]
fn test_missing_config_is_io_error() {
    assert!(matches!(
        Config::from_file("/nonexistent/framesense.yaml"),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_unknown_mirror_mode_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"display:\n  mirror: diagonal\n").unwrap();
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_demo_catalog_loads() {
    let catalog = Catalog::from_file("demos/catalog.json").unwrap();
    assert!(catalog.len() >= 2);
    let config = Config::default();
    assert_eq!(config.catalog.path.to_str(), Some("demos/catalog.json"));

    let example: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
    let selection = example.catalog.default_selection.unwrap();
    assert!(catalog.get(&selection).is_some());
}

#[test]
fn test_catalog_file_errors() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{\"id\": \"not-an-array\"}").unwrap();
    assert!(matches!(Catalog::from_file(file.path()), Err(Error::Json(_))));

    assert!(matches!(Catalog::from_file("/nonexistent/catalog.json"), Err(Error::Io(_))));
}

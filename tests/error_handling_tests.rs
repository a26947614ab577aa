//! Error handling tests for all modules

use framesense::{
    alignment::{OverlayAligner, Viewport},
    catalog::Catalog,
    filters::create_filter,
    fit_scoring::FitScorer,
    landmark_source::{ReplaySource, SourceKind},
    pose_estimation::TransformMatrix,
    types::{LandmarkSet, Point3D},
    Error,
};

#[test]
fn test_filter_creation_errors() {
    // Test invalid filter type
    let result = create_filter("invalid_filter");
    assert!(result.is_err());

    // Test invalid window size for moving average
    let result = create_filter("movingaverage:0");
    match result {
        Err(Error::FilterError(msg)) => assert!(msg.contains("Window size")),
        _ => panic!("Expected FilterError"),
    }

    // Test invalid alpha for exponential filter
    let result = create_filter("exponential:2.0");
    match result {
        Err(Error::FilterError(msg)) => assert!(msg.contains("Alpha")),
        _ => panic!("Expected FilterError"),
    }

    // Test invalid alpha for exponential filter (negative)
    assert!(create_filter("exponential:-0.1").is_err());

    // Test invalid window size for median filter
    assert!(create_filter("median:0").is_err());
}

#[test]
fn test_invalid_filter_parameters() {
    let test_cases = vec![
        "movingaverage:-5", // Negative window size
        "median:abc",       // Non-numeric parameter
        "median:6",         // Even window
        "exponential:10",   // Alpha > 1
        "kalman",           // Not offered
    ];

    for filter_str in test_cases {
        let result = create_filter(filter_str);
        assert!(result.is_err(), "Expected error for {}", filter_str);
    }
}

#[test]
fn test_landmark_set_length_errors() {
    for len in [0, 1, 68, 467, 469, 477, 479] {
        let result = LandmarkSet::new(vec![Point3D::default(); len]);
        assert!(
            matches!(result, Err(Error::InvalidInput(_))),
            "Expected InvalidInput for {len} landmarks"
        );
    }
}

#[test]
fn test_matrix_length_errors() {
    match TransformMatrix::from_slice(&[1.0; 12]) {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("12")),
        _ => panic!("Expected InvalidInput"),
    }
}

#[test]
fn test_viewport_and_aligner_errors() {
    assert!(matches!(Viewport::new(0, 0), Err(Error::InvalidInput(_))));
    assert!(matches!(OverlayAligner::new(0.0), Err(Error::InvalidInput(_))));
    assert!(OverlayAligner::new(f64::INFINITY).is_err());
}

#[test]
fn test_catalog_errors() {
    assert!(matches!(Catalog::from_json("not json"), Err(Error::Json(_))));
    assert!(matches!(
        Catalog::from_json("[]").unwrap().resolve("aviator-01"),
        Err(Error::Catalog(_))
    ));
}

#[test]
fn test_replay_errors() {
    assert!(matches!(ReplaySource::from_json("{}", false), Err(Error::Json(_))));
    assert!(matches!(
        ReplaySource::from_json(r#"[null, {"landmarks": []}]"#, false),
        Err(Error::InvalidInput(msg)) if msg.contains("frame 1")
    ));
}

#[test]
fn test_source_kind_errors() {
    assert!("".parse::<SourceKind>().is_err());
    assert!("webcam:0".parse::<SourceKind>().is_err());
}

#[test]
fn test_fit_scorer_errors() {
    assert!(matches!(FitScorer::new(f64::NAN, 1.0, 1.0), Err(Error::InvalidInput(_))));
}

#[test]
fn test_error_messages() {
    let err = Error::Source("camera busy".to_string());
    assert_eq!(err.to_string(), "Landmark source error: camera busy");

    let err = Error::Catalog("Unknown glasses id: x".to_string());
    assert_eq!(err.to_string(), "Catalog error: Unknown glasses id: x");
}

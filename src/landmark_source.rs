//! Landmark sources: the boundary to the camera and face landmark detector.
//!
//! A source owns both the capture device and the detector. They are acquired
//! together when the source is opened and released together by
//! [`LandmarkSource::close`].

use crate::{
    constants::{
        CHIN_INDEX, FOREHEAD_TOP_INDEX, LEFT_CHEEK_INDEX, LEFT_FOREHEAD_INDEX, LEFT_JAW_INDEX,
        LEFT_PUPIL_INDEX, NOSE_BRIDGE_INDEX, NUM_FACE_LANDMARKS, RIGHT_CHEEK_INDEX,
        RIGHT_FOREHEAD_INDEX, RIGHT_JAW_INDEX, RIGHT_PUPIL_INDEX,
    },
    pose_estimation::TransformMatrix,
    types::{Detection, LandmarkSet, Point3D},
    Error, Result,
};
use log::{debug, info};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

/// Produces at most one face per call
pub trait LandmarkSource: Send {
    /// Run detection for the frame captured at `timestamp_ms`.
    ///
    /// `Ok(None)` means no face in this frame, which is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the device or detector failed
    fn detect(&mut self, timestamp_ms: f64) -> Result<Option<Detection>>;

    /// Release the device and detector. Safe to call more than once.
    fn close(&mut self);

    fn name(&self) -> &str;
}

/// Yaw advance per detection, in radians of the oscillation phase
const MOCK_PHASE_STEP: f64 = 0.05;

/// Peak yaw of the mock head, in degrees
const MOCK_YAW_AMPLITUDE: f64 = 15.0;

/// Synthetic face for running without a camera.
///
/// A fixed landmark set with the head swinging left and right. The face outline
/// is laid out for a 16:9 frame.
pub struct MockLandmarkSource {
    landmarks: LandmarkSet,
    phase: f64,
    closed: bool,
}

impl MockLandmarkSource {
    /// # Errors
    ///
    /// Returns an error if the synthetic landmark set cannot be built
    pub fn new() -> Result<Self> {
        let mut points = vec![Point3D::default(); NUM_FACE_LANDMARKS];
        points[NOSE_BRIDGE_INDEX] = Point3D::new(0.50, 0.50, 0.00);
        points[LEFT_PUPIL_INDEX] = Point3D::new(0.42, 0.42, -0.01);
        points[RIGHT_PUPIL_INDEX] = Point3D::new(0.58, 0.42, -0.01);
        points[LEFT_CHEEK_INDEX] = Point3D::new(0.325, 0.50, 0.05);
        points[RIGHT_CHEEK_INDEX] = Point3D::new(0.675, 0.50, 0.05);
        points[LEFT_FOREHEAD_INDEX] = Point3D::new(0.3425, 0.25, 0.03);
        points[RIGHT_FOREHEAD_INDEX] = Point3D::new(0.6575, 0.25, 0.03);
        points[LEFT_JAW_INDEX] = Point3D::new(0.36, 0.75, 0.04);
        points[RIGHT_JAW_INDEX] = Point3D::new(0.64, 0.75, 0.04);
        points[FOREHEAD_TOP_INDEX] = Point3D::new(0.50, 0.10, 0.02);
        points[CHIN_INDEX] = Point3D::new(0.50, 0.91, 0.02);

        Ok(Self {
            landmarks: LandmarkSet::new(points)?,
            phase: 0.0,
            closed: false,
        })
    }

    /// Yaw in degrees that the next detection will report
    pub fn next_yaw(&self) -> f64 {
        (self.phase + MOCK_PHASE_STEP).sin() * MOCK_YAW_AMPLITUDE
    }
}

impl LandmarkSource for MockLandmarkSource {
    fn detect(&mut self, _timestamp_ms: f64) -> Result<Option<Detection>> {
        if self.closed {
            return Err(Error::Source("Mock source is closed".to_string()));
        }
        let yaw = self.next_yaw();
        self.phase += MOCK_PHASE_STEP;

        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw.to_radians());
        Ok(Some(Detection::new(
            self.landmarks.clone(),
            Some(TransformMatrix::from_rotation(&rotation)),
        )))
    }

    fn close(&mut self) {
        if !self.closed {
            debug!("Closing mock landmark source");
            self.closed = true;
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// One recorded frame as stored in a replay file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub landmarks: Vec<[f64; 3]>,
    #[serde(default)]
    pub matrix: Option<Vec<f64>>,
}

impl ReplayFrame {
    pub fn from_detection(detection: &Detection) -> Self {
        Self {
            landmarks: detection
                .landmarks
                .points()
                .iter()
                .map(|p| [p.x, p.y, p.z])
                .collect(),
            matrix: detection.transform.map(|m| m.as_slice().to_vec()),
        }
    }

    fn to_detection(&self) -> Result<Detection> {
        let points = self.landmarks.iter().copied().map(Point3D::from).collect();
        let transform = self
            .matrix
            .as_deref()
            .map(TransformMatrix::from_slice)
            .transpose()?;
        Ok(Detection::new(LandmarkSet::new(points)?, transform))
    }
}

/// Plays back detections recorded to a JSON file.
///
/// The file is an array with one entry per frame: `null` for a frame without a
/// face, otherwise a [`ReplayFrame`]. Every entry is validated on load.
pub struct ReplaySource {
    frames: Vec<Option<Detection>>,
    cursor: usize,
    looping: bool,
    closed: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<Option<Detection>>, looping: bool) -> Self {
        Self {
            frames,
            cursor: 0,
            looping,
            closed: false,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or an entry is malformed
    pub fn from_file<P: AsRef<Path>>(path: P, looping: bool) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let source = Self::from_json(&content, looping)?;
        info!(
            "Loaded {} replay frames from {}",
            source.len(),
            path.as_ref().display()
        );
        Ok(source)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an entry is invalid
    pub fn from_json(content: &str, looping: bool) -> Result<Self> {
        let raw: Vec<Option<ReplayFrame>> = serde_json::from_str(content)?;
        let frames = raw
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                frame
                    .as_ref()
                    .map(ReplayFrame::to_detection)
                    .transpose()
                    .map_err(|e| Error::InvalidInput(format!("Replay frame {i}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(frames, looping))
    }

    /// Write detections in the replay file format
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn save<P: AsRef<Path>>(detections: &[Option<Detection>], path: P) -> Result<()> {
        let raw: Vec<Option<ReplayFrame>> = detections
            .iter()
            .map(|d| d.as_ref().map(ReplayFrame::from_detection))
            .collect();
        let content = serde_json::to_string(&raw)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl LandmarkSource for ReplaySource {
    fn detect(&mut self, _timestamp_ms: f64) -> Result<Option<Detection>> {
        if self.closed {
            return Err(Error::Source("Replay source is closed".to_string()));
        }
        if self.cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(frame)
    }

    fn close(&mut self) {
        if !self.closed {
            debug!("Closing replay source after {} frames", self.cursor);
            self.closed = true;
            self.frames.clear();
        }
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// Which source to open, as written on the command line or in the config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Mock,
    Replay(String),
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            None if s.eq_ignore_ascii_case("mock") => Ok(Self::Mock),
            Some((kind, path)) if kind.eq_ignore_ascii_case("replay") && !path.is_empty() => {
                Ok(Self::Replay(path.to_string()))
            }
            _ => Err(Error::InvalidInput(format!(
                "Unknown landmark source '{s}'. Use 'mock' or 'replay:<path>'"
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => f.write_str("mock"),
            Self::Replay(path) => write!(f, "replay:{path}"),
        }
    }
}

/// Acquire a landmark source.
///
/// # Errors
///
/// Returns [`Error::Source`] if the source cannot be acquired
pub fn open_source(kind: &SourceKind) -> Result<Box<dyn LandmarkSource>> {
    info!("Opening landmark source {kind}");
    let source: Box<dyn LandmarkSource> = match kind {
        SourceKind::Mock => Box::new(MockLandmarkSource::new()?),
        SourceKind::Replay(path) => Box::new(
            ReplaySource::from_file(path, true)
                .map_err(|e| Error::Source(format!("Failed to open replay {path}: {e}")))?,
        ),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose_estimation::extract_head_pose;

    #[test]
    fn test_mock_yaw_oscillates() {
        let mut source = MockLandmarkSource::new().unwrap();
        let mut yaws = Vec::new();
        for i in 0..200 {
            let detection = source.detect(f64::from(i) * 33.0).unwrap().unwrap();
            let pose = extract_head_pose(&detection.transform.unwrap());
            assert!(pose.pitch.abs() < 1e-9);
            assert!(pose.roll.abs() < 1e-9);
            yaws.push(pose.yaw);
        }
        assert!((yaws[0] - 0.05f64.sin() * 15.0).abs() < 1e-9);
        assert!(yaws.iter().all(|yaw| yaw.abs() <= 15.0 + 1e-9));
        assert!(yaws.iter().any(|yaw| *yaw > 14.0));
        assert!(yaws.iter().any(|yaw| *yaw < -14.0));
    }

    #[test]
    fn test_mock_reference_points() {
        let mut source = MockLandmarkSource::new().unwrap();
        let detection = source.detect(0.0).unwrap().unwrap();
        let refs = detection.landmarks.reference_points().unwrap();
        assert_eq!(refs.nose_bridge, Point3D::new(0.5, 0.5, 0.0));
        assert!((refs.interpupillary_distance().unwrap() - 0.16).abs() < 1e-12);
    }

    #[test]
    fn test_closed_source_errors() {
        let mut source = MockLandmarkSource::new().unwrap();
        source.close();
        source.close();
        assert!(matches!(source.detect(0.0), Err(Error::Source(_))));
    }

    #[test]
    fn test_replay_null_frames_and_looping() {
        let mut mock = MockLandmarkSource::new().unwrap();
        let detection = mock.detect(0.0).unwrap();
        let mut replay = ReplaySource::new(vec![None, detection], true);

        assert!(replay.detect(0.0).unwrap().is_none());
        assert!(replay.detect(33.0).unwrap().is_some());
        assert!(replay.detect(66.0).unwrap().is_none());
    }

    #[test]
    fn test_replay_exhausted_without_looping() {
        let mut replay = ReplaySource::new(vec![None], false);
        assert!(replay.detect(0.0).unwrap().is_none());
        assert!(replay.detect(33.0).unwrap().is_none());
    }

    #[test]
    fn test_replay_rejects_bad_matrix() {
        let landmarks = vec![[0.5, 0.5, 0.0]; NUM_FACE_LANDMARKS];
        let json = serde_json::to_string(&vec![Some(ReplayFrame {
            landmarks,
            matrix: Some(vec![1.0; 9]),
        })])
        .unwrap();
        assert!(matches!(
            ReplaySource::from_json(&json, false),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_replay_rejects_short_landmark_list() {
        let json = r#"[{"landmarks": [[0.5, 0.5, 0.0]], "matrix": null}]"#;
        assert!(ReplaySource::from_json(json, false).is_err());
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("mock".parse::<SourceKind>().unwrap(), SourceKind::Mock);
        assert_eq!(
            "replay:/tmp/a.json".parse::<SourceKind>().unwrap(),
            SourceKind::Replay("/tmp/a.json".to_string())
        );
        assert!("replay:".parse::<SourceKind>().is_err());
        assert!("camera".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_missing_replay_file_is_source_error() {
        let kind = SourceKind::Replay("/nonexistent/replay.json".to_string());
        assert!(matches!(open_source(&kind), Err(Error::Source(_))));
    }
}

//! Read-only landmark debug report.

use crate::{
    tracking_state::TrackingSnapshot,
    types::{HeadPose, Point3D},
};
use std::fmt;

/// What the tracker currently sees, for the debug panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticsReport {
    pub sequence: u64,
    pub landmark_count: usize,
    pub nose_bridge: Option<Point3D>,
    pub left_pupil: Option<Point3D>,
    pub right_pupil: Option<Point3D>,
    pub interpupillary_distance: Option<f64>,
    pub head_pose: Option<HeadPose>,
}

impl DiagnosticsReport {
    pub fn from_snapshot(snapshot: &TrackingSnapshot) -> Self {
        let refs = snapshot.reference_points;
        Self {
            sequence: snapshot.sequence,
            landmark_count: snapshot.landmark_count(),
            nose_bridge: refs.map(|r| r.nose_bridge),
            left_pupil: refs.and_then(|r| r.left_pupil),
            right_pupil: refs.and_then(|r| r.right_pupil),
            interpupillary_distance: refs.and_then(|r| r.interpupillary_distance()),
            head_pose: snapshot.head_pose,
        }
    }

    pub fn has_face(&self) -> bool {
        self.nose_bridge.is_some()
    }
}

fn write_point(f: &mut fmt::Formatter<'_>, label: &str, point: Option<Point3D>) -> fmt::Result {
    match point {
        Some(p) => writeln!(f, "{label}: ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z),
        None => writeln!(f, "{label}: -"),
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_face() {
            return write!(f, "No face detected");
        }
        write_point(f, "Nose bridge", self.nose_bridge)?;
        write_point(f, "Left pupil", self.left_pupil)?;
        write_point(f, "Right pupil", self.right_pupil)?;
        match self.interpupillary_distance {
            Some(ipd) => writeln!(f, "IPD: {ipd:.4}")?,
            None => writeln!(f, "IPD: -")?,
        }
        match self.head_pose {
            Some(pose) => writeln!(
                f,
                "Pose: pitch {:.1}° yaw {:.1}° roll {:.1}°",
                pose.pitch, pose.yaw, pose.roll
            )?,
            None => writeln!(f, "Pose: -")?,
        }
        write!(f, "Landmarks: {}", self.landmark_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReferencePoints;

    #[test]
    fn test_empty_snapshot_reports_no_face() {
        let report = DiagnosticsReport::from_snapshot(&TrackingSnapshot::default());
        assert!(!report.has_face());
        assert_eq!(report.landmark_count, 0);
        assert_eq!(report.to_string(), "No face detected");
    }

    #[test]
    fn test_report_lists_reference_points() {
        let snapshot = TrackingSnapshot {
            sequence: 3,
            reference_points: Some(ReferencePoints {
                nose_bridge: Point3D::new(0.5, 0.5, 0.0),
                left_pupil: Some(Point3D::new(0.42, 0.42, -0.01)),
                right_pupil: Some(Point3D::new(0.58, 0.42, -0.01)),
            }),
            head_pose: Some(HeadPose::new(1.0, 15.0, -2.0)),
            ..TrackingSnapshot::default()
        };
        let report = DiagnosticsReport::from_snapshot(&snapshot);
        assert!((report.interpupillary_distance.unwrap() - 0.16).abs() < 1e-12);

        let text = report.to_string();
        assert!(text.contains("Nose bridge: (0.500, 0.500, 0.000)"));
        assert!(text.contains("IPD: 0.1600"));
        assert!(text.contains("yaw 15.0°"));
    }

    #[test]
    fn test_missing_pupils_and_pose() {
        let snapshot = TrackingSnapshot {
            reference_points: Some(ReferencePoints {
                nose_bridge: Point3D::new(0.5, 0.5, 0.0),
                left_pupil: None,
                right_pupil: None,
            }),
            ..TrackingSnapshot::default()
        };
        let text = DiagnosticsReport::from_snapshot(&snapshot).to_string();
        assert!(text.contains("Left pupil: -"));
        assert!(text.contains("IPD: -"));
        assert!(text.contains("Pose: -"));
    }
}

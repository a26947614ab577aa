//! Optional smoothing stage between the tracking state and the alignment engine.
//!
//! Head pose angles are filtered as a plain 3-vector. Angles are not unwrapped,
//! so a yaw crossing the +/-180 degree boundary averages towards zero. Faces
//! facing the camera stay far from that boundary.

use crate::{
    filters::{create_filter, TrackingFilter},
    tracking_state::TrackingSnapshot,
    types::{HeadPose, Point3D, ReferencePoints},
    Result,
};
use log::debug;

/// One filter per tracked signal, all built from the same description
pub struct SmoothingStage {
    nose_bridge: Box<dyn TrackingFilter>,
    left_pupil: Box<dyn TrackingFilter>,
    right_pupil: Box<dyn TrackingFilter>,
    head_pose: Box<dyn TrackingFilter>,
    last_sequence: Option<u64>,
    last_output: Option<TrackingSnapshot>,
}

impl SmoothingStage {
    /// # Errors
    ///
    /// Returns an error if the filter description is invalid
    pub fn new(filter: &str) -> Result<Self> {
        Ok(Self {
            nose_bridge: create_filter(filter)?,
            left_pupil: create_filter(filter)?,
            right_pupil: create_filter(filter)?,
            head_pose: create_filter(filter)?,
            last_sequence: None,
            last_output: None,
        })
    }

    /// Pass-through stage
    pub fn disabled() -> Self {
        use crate::filters::NoFilter;
        Self {
            nose_bridge: Box::new(NoFilter),
            left_pupil: Box::new(NoFilter),
            right_pupil: Box::new(NoFilter),
            head_pose: Box::new(NoFilter),
            last_sequence: None,
            last_output: None,
        }
    }

    pub fn filter_name(&self) -> &str {
        self.nose_bridge.name()
    }

    /// Smooth the reference points and head pose of `snapshot`.
    ///
    /// Filters advance once per published snapshot; rendering the same snapshot
    /// again returns the cached result. A snapshot without a face resets every
    /// filter so a reacquired face starts fresh. A missing pupil or head pose
    /// resets only its own filter.
    pub fn process(&mut self, snapshot: &TrackingSnapshot) -> TrackingSnapshot {
        if self.last_sequence == Some(snapshot.sequence) {
            if let Some(cached) = &self.last_output {
                return cached.clone();
            }
        }

        let output = match snapshot.reference_points {
            None => {
                if self.last_output.as_ref().is_some_and(TrackingSnapshot::has_face) {
                    debug!("Face lost; resetting {} filters", self.filter_name());
                }
                self.reset();
                snapshot.clone()
            }
            Some(refs) => {
                let reference_points = ReferencePoints {
                    nose_bridge: smooth_point(self.nose_bridge.as_mut(), refs.nose_bridge),
                    left_pupil: smooth_optional(self.left_pupil.as_mut(), refs.left_pupil),
                    right_pupil: smooth_optional(self.right_pupil.as_mut(), refs.right_pupil),
                };
                let head_pose = match snapshot.head_pose {
                    Some(pose) => Some(HeadPose::from_vector(&self.head_pose.apply(pose.to_vector()))),
                    None => {
                        self.head_pose.reset();
                        None
                    }
                };
                TrackingSnapshot {
                    reference_points: Some(reference_points),
                    head_pose,
                    ..snapshot.clone()
                }
            }
        };

        self.last_sequence = Some(snapshot.sequence);
        self.last_output = Some(output.clone());
        output
    }

    pub fn reset(&mut self) {
        self.nose_bridge.reset();
        self.left_pupil.reset();
        self.right_pupil.reset();
        self.head_pose.reset();
    }
}

fn smooth_point(filter: &mut dyn TrackingFilter, point: Point3D) -> Point3D {
    Point3D::from_vector(&filter.apply(point.to_vector()))
}

fn smooth_optional(filter: &mut dyn TrackingFilter, point: Option<Point3D>) -> Option<Point3D> {
    match point {
        Some(point) => Some(smooth_point(filter, point)),
        None => {
            filter.reset();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sequence: u64, nose_x: f64, yaw: f64) -> TrackingSnapshot {
        TrackingSnapshot {
            sequence,
            reference_points: Some(ReferencePoints {
                nose_bridge: Point3D::new(nose_x, 0.5, 0.0),
                left_pupil: Some(Point3D::new(0.42, 0.42, 0.0)),
                right_pupil: Some(Point3D::new(0.58, 0.42, 0.0)),
            }),
            head_pose: Some(HeadPose::new(0.0, yaw, 0.0)),
            ..TrackingSnapshot::default()
        }
    }

    #[test]
    fn test_disabled_stage_passes_through() {
        let mut stage = SmoothingStage::disabled();
        let input = snapshot(1, 0.3, 12.0);
        assert_eq!(stage.process(&input), input);
    }

    #[test]
    fn test_exponential_stage_smooths_each_signal() {
        let mut stage = SmoothingStage::new("exponential:0.5").unwrap();
        stage.process(&snapshot(1, 0.4, 0.0));
        let out = stage.process(&snapshot(2, 0.6, 10.0));

        let refs = out.reference_points.unwrap();
        assert!((refs.nose_bridge.x - 0.5).abs() < 1e-12);
        assert!((out.head_pose.unwrap().yaw - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_snapshot_does_not_advance_filters() {
        let mut stage = SmoothingStage::new("exponential:0.5").unwrap();
        stage.process(&snapshot(1, 0.4, 0.0));
        let first = stage.process(&snapshot(2, 0.6, 0.0));
        let again = stage.process(&snapshot(2, 0.6, 0.0));
        assert_eq!(first, again);
    }

    #[test]
    fn test_dropout_resets_filters() {
        let mut stage = SmoothingStage::new("exponential:0.5").unwrap();
        stage.process(&snapshot(1, 0.2, 0.0));
        stage.process(&TrackingSnapshot {
            sequence: 2,
            ..TrackingSnapshot::default()
        });
        let out = stage.process(&snapshot(3, 0.8, 0.0));
        assert!((out.reference_points.unwrap().nose_bridge.x - 0.8).abs() < 1e-12);
    }

    fn pupils_lost(sequence: u64) -> TrackingSnapshot {
        TrackingSnapshot {
            sequence,
            reference_points: Some(ReferencePoints {
                nose_bridge: Point3D::new(0.5, 0.5, 0.0),
                left_pupil: None,
                right_pupil: None,
            }),
            head_pose: None,
            ..TrackingSnapshot::default()
        }
    }

    #[test]
    fn test_pupil_dropout_resets_pupil_filters() {
        let mut stage = SmoothingStage::new("exponential:0.5").unwrap();
        stage.process(&snapshot(1, 0.5, 0.0));
        for sequence in 2..21 {
            let out = stage.process(&pupils_lost(sequence));
            assert!(out.reference_points.unwrap().left_pupil.is_none());
        }

        let mut narrow = snapshot(21, 0.5, 0.0);
        if let Some(refs) = narrow.reference_points.as_mut() {
            refs.left_pupil = Some(Point3D::new(0.46, 0.42, 0.0));
            refs.right_pupil = Some(Point3D::new(0.54, 0.42, 0.0));
        }
        let refs = stage.process(&narrow).reference_points.unwrap();
        let ipd = refs.right_pupil.unwrap().x - refs.left_pupil.unwrap().x;
        assert!((ipd - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_missing_head_pose_resets_pose_filter() {
        let mut stage = SmoothingStage::new("exponential:0.5").unwrap();
        stage.process(&snapshot(1, 0.5, 30.0));
        let out = stage.process(&pupils_lost(2));
        assert!(out.head_pose.is_none());

        let out = stage.process(&snapshot(3, 0.5, -10.0));
        assert!((out.head_pose.unwrap().yaw + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_pose_is_filtered_without_angle_unwrapping() {
        let mut stage = SmoothingStage::new("moving_average:2").unwrap();
        stage.process(&snapshot(1, 0.5, 170.0));
        let out = stage.process(&snapshot(2, 0.5, -170.0));
        assert!(out.head_pose.unwrap().yaw.abs() < 1e-9);
    }
}

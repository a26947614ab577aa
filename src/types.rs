//! Core tracking data types shared by the pipeline stages.

use crate::{
    constants::{
        LEFT_PUPIL_INDEX, NOSE_BRIDGE_INDEX, NUM_FACE_LANDMARKS, NUM_FACE_MESH_LANDMARKS, RIGHT_PUPIL_INDEX,
    },
    pose_estimation::TransformMatrix,
    Error, Result,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A landmark in normalized camera space.
///
/// `x` and `y` are in `[0, 1]` with the origin at the top-left of the frame and
/// `y` growing downward. `z` is relative depth; more negative is closer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance to `other` in the image plane, ignoring depth
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<[f64; 3]> for Point3D {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// A complete face landmark set.
///
/// Either the bare face mesh ([`NUM_FACE_MESH_LANDMARKS`] points) or the mesh with
/// iris refinement ([`NUM_FACE_LANDMARKS`] points). Partial sets cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point3D>,
}

impl LandmarkSet {
    /// Wrap a detector's landmark vector
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length matches neither landmark layout
    pub fn new(points: Vec<Point3D>) -> Result<Self> {
        if points.len() != NUM_FACE_LANDMARKS && points.len() != NUM_FACE_MESH_LANDMARKS {
            return Err(Error::InvalidInput(format!(
                "Expected {} or {} landmarks, got {}",
                NUM_FACE_LANDMARKS,
                NUM_FACE_MESH_LANDMARKS,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Landmark at a fixed semantic index
    pub fn get(&self, index: usize) -> Option<&Point3D> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    /// Whether the set carries the iris points, and with them the pupils
    pub fn has_iris(&self) -> bool {
        self.points.len() == NUM_FACE_LANDMARKS
    }

    /// Look up the nose bridge and, when present, both pupils
    pub fn reference_points(&self) -> Option<ReferencePoints> {
        Some(ReferencePoints {
            nose_bridge: *self.get(NOSE_BRIDGE_INDEX)?,
            left_pupil: self.get(LEFT_PUPIL_INDEX).copied(),
            right_pupil: self.get(RIGHT_PUPIL_INDEX).copied(),
        })
    }
}

/// Head orientation in degrees. Values are not bounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl HeadPose {
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.pitch, self.yaw, self.roll)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Landmarks the overlay is anchored and scaled by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoints {
    pub nose_bridge: Point3D,
    pub left_pupil: Option<Point3D>,
    pub right_pupil: Option<Point3D>,
}

impl ReferencePoints {
    /// Normalized interpupillary distance, if both pupils are visible
    pub fn interpupillary_distance(&self) -> Option<f64> {
        Some(self.left_pupil?.planar_distance(&self.right_pupil?))
    }
}

/// One face as reported by the landmark source for a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub landmarks: LandmarkSet,
    pub transform: Option<TransformMatrix>,
}

impl Detection {
    pub fn new(landmarks: LandmarkSet, transform: Option<TransformMatrix>) -> Self {
        Self { landmarks, transform }
    }
}

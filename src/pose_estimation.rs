//! Head pose extraction from the landmark source's facial transformation matrix.

use crate::{constants::TRANSFORM_MATRIX_LEN, types::HeadPose, Error, Result};
use nalgebra::{Matrix4, Rotation3};

/// A 4x4 rigid transformation, flattened in column-major order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix([f64; TRANSFORM_MATRIX_LEN]);

impl TransformMatrix {
    pub const fn new(elements: [f64; TRANSFORM_MATRIX_LEN]) -> Self {
        Self(elements)
    }

    /// Build from the detector's flattened output
    ///
    /// # Errors
    ///
    /// Returns an error if the slice does not hold exactly 16 elements
    pub fn from_slice(elements: &[f64]) -> Result<Self> {
        let array: [f64; TRANSFORM_MATRIX_LEN] = elements.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "Expected {} matrix elements, got {}",
                TRANSFORM_MATRIX_LEN,
                elements.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn identity() -> Self {
        Self::from_matrix(&Matrix4::identity())
    }

    /// nalgebra stores matrices column-major, which matches the flattened layout
    pub fn from_matrix(matrix: &Matrix4<f64>) -> Self {
        let mut elements = [0.0; TRANSFORM_MATRIX_LEN];
        elements.copy_from_slice(matrix.as_slice());
        Self(elements)
    }

    pub fn from_rotation(rotation: &Rotation3<f64>) -> Self {
        Self::from_matrix(&rotation.to_homogeneous())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_column_slice(&self.0)
    }
}

/// Convert the facial transformation matrix to Euler angles in degrees.
///
/// Near gimbal lock (pitch close to ±90°) roll degrades to an approximation;
/// the `asin` argument is clamped so the result is never NaN.
pub fn extract_head_pose(matrix: &TransformMatrix) -> HeadPose {
    let m = matrix.as_slice();

    let pitch = (-m[9]).atan2(m[10]);
    let yaw = m[8].atan2(m[0]);
    let roll = m[4].clamp(-1.0, 1.0).asin();

    HeadPose::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use proptest::prelude::*;

    #[test]
    fn test_identity_is_zero_pose() {
        let pose = extract_head_pose(&TransformMatrix::identity());
        assert!(pose.pitch.abs() < 1e-9);
        assert!(pose.yaw.abs() < 1e-9);
        assert!(pose.roll.abs() < 1e-9);
    }

    #[test]
    fn test_single_axis_rotations() {
        let yaw = TransformMatrix::from_rotation(&Rotation3::from_axis_angle(&Vector3::y_axis(), 20f64.to_radians()));
        assert!((extract_head_pose(&yaw).yaw - 20.0).abs() < 1e-9);

        let pitch = TransformMatrix::from_rotation(&Rotation3::from_axis_angle(&Vector3::x_axis(), 15f64.to_radians()));
        assert!((extract_head_pose(&pitch).pitch - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_roll_reads_offset_four() {
        let mut elements = [0.0; TRANSFORM_MATRIX_LEN];
        elements[0] = 1.0;
        elements[10] = 1.0;
        elements[4] = 10f64.to_radians().sin();
        let pose = extract_head_pose(&TransformMatrix::new(elements));
        assert!((pose.roll - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_domain_roll_is_clamped() {
        let mut elements = TransformMatrix::identity().0;
        elements[4] = 1.000_001;
        let pose = extract_head_pose(&TransformMatrix::new(elements));
        assert!((pose.roll - 90.0).abs() < 1e-9);

        elements[4] = -1.5;
        let pose = extract_head_pose(&TransformMatrix::new(elements));
        assert!((pose.roll + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_slice_validates_length() {
        assert!(TransformMatrix::from_slice(&[0.0; 16]).is_ok());
        assert!(TransformMatrix::from_slice(&[0.0; 9]).is_err());
        assert!(TransformMatrix::from_slice(&[]).is_err());
    }

    #[test]
    fn test_matrix_round_trip_keeps_layout() {
        let m = TransformMatrix::from_rotation(&Rotation3::from_euler_angles(0.1, 0.2, 0.3));
        assert_eq!(TransformMatrix::from_matrix(&m.to_matrix()), m);
    }

    proptest! {
        #[test]
        fn prop_valid_rotations_give_finite_closed_form_angles(
            roll in -3.1f64..3.1,
            pitch in -1.5f64..1.5,
            yaw in -3.1f64..3.1,
        ) {
            let matrix = TransformMatrix::from_rotation(&Rotation3::from_euler_angles(roll, pitch, yaw));
            let m = matrix.as_slice();
            let pose = extract_head_pose(&matrix);

            prop_assert!(pose.pitch.is_finite() && pose.yaw.is_finite() && pose.roll.is_finite());
            prop_assert!((pose.pitch - (-m[9]).atan2(m[10]).to_degrees()).abs() < 1e-9);
            prop_assert!((pose.yaw - m[8].atan2(m[0]).to_degrees()).abs() < 1e-9);
            prop_assert!((pose.roll - m[4].clamp(-1.0, 1.0).asin().to_degrees()).abs() < 1e-9);
        }
    }
}

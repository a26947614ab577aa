//! Overlay alignment: tracked face to a per-frame 3D transform for the glasses model.
//!
//! Landmark space is normalized to the camera frame (origin top-left, y down).
//! The rendering camera is centered with y up, so the nose bridge is shifted to
//! the center, scaled by the viewport aspect ratio and flipped vertically. Both
//! the video and the scene are shown mirrored, which is why the applied roll is
//! the negated extracted roll.

use crate::{
    catalog::GlassesFrame,
    constants::{INITIAL_OVERLAY_SCALE, NORMALIZED_CENTER},
    tracking_state::TrackingSnapshot,
    types::{HeadPose, Point3D},
    Error, Result,
};
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "Viewport dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// How the video and the scene are flipped for presentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorMode {
    /// Selfie view: the user's left appears on the left of the screen
    #[default]
    Horizontal,
    /// Raw camera orientation
    None,
}

impl MirrorMode {
    /// Where a normalized video point lands on screen, in normalized screen coordinates
    pub fn present_video_point(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Horizontal => (1.0 - x, y),
            Self::None => (x, y),
        }
    }
}

/// Position, rotation and scale for the glasses object in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    /// Camera-space position
    pub position: Vector3<f64>,
    /// Euler rotation in radians: pitch, yaw, negated roll
    pub rotation: Vector3<f64>,
    /// Uniform scale relative to the model's authored size
    pub scale: f64,
}

impl OverlayTransform {
    /// Where the object's anchor lands on screen, in normalized screen coordinates.
    ///
    /// Inverts the camera-space mapping and applies the same flip as the video,
    /// so a mirrored overlay stays on top of the mirrored face.
    pub fn present_anchor(&self, viewport: Viewport, mirror: MirrorMode) -> (f64, f64) {
        let aspect = viewport.aspect();
        let scene_x = match mirror {
            MirrorMode::Horizontal => -self.position.x,
            MirrorMode::None => self.position.x,
        };
        (
            scene_x / aspect + NORMALIZED_CENTER,
            NORMALIZED_CENTER - self.position.y / aspect,
        )
    }
}

/// Map the nose bridge from landmark space into rendering camera space.
///
/// The vertical offset is scaled by the aspect ratio as well. Glasses models
/// are authored against this mapping, so it is not a symmetric projection.
#[must_use]
pub fn map_position(nose_bridge: &Point3D, viewport: Viewport) -> Vector3<f64> {
    let aspect = viewport.aspect();
    Vector3::new(
        (nose_bridge.x - NORMALIZED_CENTER) * aspect,
        -(nose_bridge.y - NORMALIZED_CENTER) * aspect,
        nose_bridge.z,
    )
}

/// Head pose in degrees to object rotation in radians, roll negated for the mirrored view
pub fn map_rotation(pose: &HeadPose) -> Vector3<f64> {
    Vector3::new(pose.pitch.to_radians(), pose.yaw.to_radians(), -pose.roll.to_radians())
}

/// Stateful per-frame alignment engine.
///
/// The only state carried between frames is the last computed scale, which is
/// kept whenever the pupils are not visible.
#[derive(Debug, Clone)]
pub struct OverlayAligner {
    reference_ipd: f64,
    scale: f64,
}

impl OverlayAligner {
    /// # Errors
    ///
    /// Returns an error if `reference_ipd` is not a positive finite number
    pub fn new(reference_ipd: f64) -> Result<Self> {
        if !reference_ipd.is_finite() || reference_ipd <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Reference IPD must be positive, got {reference_ipd}"
            )));
        }
        Ok(Self {
            reference_ipd,
            scale: INITIAL_OVERLAY_SCALE,
        })
    }

    pub fn reference_ipd(&self) -> f64 {
        self.reference_ipd
    }

    /// Scale that will be used if the next frame has no pupils
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Compute this frame's transform, or `None` to hide the overlay.
    ///
    /// The overlay is hidden when no frame is selected or no nose bridge is tracked.
    /// A tracked face without a head pose is drawn unrotated.
    pub fn align(
        &mut self,
        snapshot: &TrackingSnapshot,
        selected: Option<&GlassesFrame>,
        viewport: Viewport,
    ) -> Option<OverlayTransform> {
        let frame = selected?;
        let refs = snapshot.reference_points?;

        if let Some(ipd) = refs.interpupillary_distance().filter(|ipd| ipd.is_finite()) {
            self.scale = ipd / self.reference_ipd;
        }

        let transform = OverlayTransform {
            position: map_position(&refs.nose_bridge, viewport),
            rotation: map_rotation(&snapshot.head_pose.unwrap_or_default()),
            scale: self.scale,
        };

        debug!(
            "Frame {} '{}': pos=({:.3}, {:.3}, {:.3}) scale={:.3}",
            snapshot.sequence,
            frame.id,
            transform.position.x,
            transform.position.y,
            transform.position.z,
            transform.scale
        );

        Some(transform)
    }
}

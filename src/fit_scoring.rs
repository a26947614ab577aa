//! Fit scoring: how well a glasses frame suits the tracked face.
//!
//! Landmarks are normalized per axis, so distances are taken after scaling `x`
//! by the camera aspect ratio. Physical sizes use the interpupillary distance as
//! a ruler against the population mean.

use crate::{
    catalog::{FaceShape, GlassesFrame},
    constants::{
        AVERAGE_IPD_MM, CHIN_INDEX, DEFAULT_SHAPE_PENALTY, DEFAULT_WIDTH_PENALTY_PER_MM,
        DEFAULT_WIDTH_TOLERANCE_MM, EPSILON, FIT_GOOD_THRESHOLD, FIT_OK_THRESHOLD, FIT_SCORE_MAX,
        FIT_SCORE_MIN, FIT_SCORE_NEUTRAL, FOREHEAD_TOP_INDEX, LEFT_CHEEK_INDEX, LEFT_FOREHEAD_INDEX,
        LEFT_JAW_INDEX, LEFT_PUPIL_INDEX, RIGHT_CHEEK_INDEX, RIGHT_FOREHEAD_INDEX, RIGHT_JAW_INDEX,
        RIGHT_PUPIL_INDEX,
    },
    types::LandmarkSet,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score in `0..=100` with human-readable explanations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitScore {
    pub score: u8,
    pub notes: Vec<String>,
}

impl FitScore {
    pub fn rating(&self) -> FitRating {
        FitRating::from_score(self.score)
    }
}

/// Badge shown next to the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitRating {
    Good,
    Ok,
    Poor,
}

impl FitRating {
    pub fn from_score(score: u8) -> Self {
        if score >= FIT_GOOD_THRESHOLD {
            Self::Good
        } else if score >= FIT_OK_THRESHOLD {
            Self::Ok
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for FitRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => f.write_str("good"),
            Self::Ok => f.write_str("ok"),
            Self::Poor => f.write_str("poor"),
        }
    }
}

/// What could be measured from one landmark set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceMeasurements {
    /// Cheek-to-cheek width in millimeters
    pub face_width_mm: Option<f64>,
    pub face_shape: Option<FaceShape>,
}

impl FaceMeasurements {
    /// Measure a face. `aspect` is the camera frame's width over height.
    pub fn from_landmarks(landmarks: &LandmarkSet, aspect: f64) -> Self {
        Self {
            face_width_mm: estimate_face_width_mm(landmarks, aspect),
            face_shape: classify_face_shape(landmarks, aspect),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.face_width_mm.is_none() && self.face_shape.is_none()
    }
}

fn span(landmarks: &LandmarkSet, a: usize, b: usize, aspect: f64) -> Option<f64> {
    let p = landmarks.get(a)?;
    let q = landmarks.get(b)?;
    Some(((q.x - p.x) * aspect).hypot(q.y - p.y))
}

/// Cheek-to-cheek width scaled by the average IPD.
///
/// Needs the iris points and a non-degenerate outline.
pub fn estimate_face_width_mm(landmarks: &LandmarkSet, aspect: f64) -> Option<f64> {
    let ipd = span(landmarks, LEFT_PUPIL_INDEX, RIGHT_PUPIL_INDEX, aspect)?;
    if ipd < EPSILON {
        return None;
    }
    let width = span(landmarks, LEFT_CHEEK_INDEX, RIGHT_CHEEK_INDEX, aspect)?;
    if width < EPSILON {
        return None;
    }
    Some(width / ipd * AVERAGE_IPD_MM)
}

/// Rough face shape from proportions of the face outline.
///
/// Uses face length over cheek width, plus forehead and jaw widths relative to
/// the cheeks. Returns `None` for degenerate sets.
pub fn classify_face_shape(landmarks: &LandmarkSet, aspect: f64) -> Option<FaceShape> {
    let cheeks = span(landmarks, LEFT_CHEEK_INDEX, RIGHT_CHEEK_INDEX, aspect)?;
    if cheeks < EPSILON {
        return None;
    }
    let length = span(landmarks, FOREHEAD_TOP_INDEX, CHIN_INDEX, aspect)? / cheeks;
    let forehead = span(landmarks, LEFT_FOREHEAD_INDEX, RIGHT_FOREHEAD_INDEX, aspect)? / cheeks;
    let jaw = span(landmarks, LEFT_JAW_INDEX, RIGHT_JAW_INDEX, aspect)? / cheeks;

    let shape = if forehead < 0.8 && jaw < 0.8 {
        FaceShape::Diamond
    } else if forehead - jaw > 0.15 {
        FaceShape::Heart
    } else if length < 1.25 && jaw >= 0.9 {
        FaceShape::Square
    } else if length < 1.25 {
        FaceShape::Round
    } else {
        FaceShape::Oval
    };
    Some(shape)
}

/// Dimension and shape based rule set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitScorer {
    width_tolerance_mm: f64,
    width_penalty_per_mm: f64,
    shape_penalty: f64,
}

impl Default for FitScorer {
    fn default() -> Self {
        Self {
            width_tolerance_mm: DEFAULT_WIDTH_TOLERANCE_MM,
            width_penalty_per_mm: DEFAULT_WIDTH_PENALTY_PER_MM,
            shape_penalty: DEFAULT_SHAPE_PENALTY,
        }
    }
}

impl FitScorer {
    /// # Errors
    ///
    /// Returns an error if any parameter is negative or not finite
    pub fn new(width_tolerance_mm: f64, width_penalty_per_mm: f64, shape_penalty: f64) -> Result<Self> {
        for (name, value) in [
            ("width tolerance", width_tolerance_mm),
            ("width penalty", width_penalty_per_mm),
            ("shape penalty", shape_penalty),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "Fit {name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(Self {
            width_tolerance_mm,
            width_penalty_per_mm,
            shape_penalty,
        })
    }

    /// Score `frame` against whatever could be measured
    pub fn score(&self, frame: &GlassesFrame, measurements: &FaceMeasurements) -> FitScore {
        if measurements.is_empty() {
            return FitScore {
                score: FIT_SCORE_NEUTRAL,
                notes: vec!["Face measurements unavailable; showing a neutral score".to_string()],
            };
        }

        let mut score = f64::from(FIT_SCORE_MAX);
        let mut notes = Vec::new();

        if let Some(face_width) = measurements.face_width_mm {
            let deviation = frame.frame_width_mm - face_width;
            let excess = deviation.abs() - self.width_tolerance_mm;
            if excess > 0.0 {
                score -= excess * self.width_penalty_per_mm;
                let direction = if deviation > 0.0 { "wide" } else { "narrow" };
                notes.push(format!(
                    "Frame width is {:.0}mm too {direction}",
                    deviation.abs()
                ));
            } else {
                notes.push("Frame width matches your face".to_string());
            }
        }

        if let Some(shape) = measurements.face_shape {
            if frame.recommended_shapes.contains(&shape) {
                notes.push(format!("Recommended for {shape} faces"));
            } else {
                score -= self.shape_penalty;
                notes.push(format!("Not usually recommended for {shape} faces"));
            }
        }

        // clamped to the u8 score range before the cast
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = score
            .round()
            .clamp(f64::from(FIT_SCORE_MIN), f64::from(FIT_SCORE_MAX)) as u8;
        FitScore { score, notes }
    }
}

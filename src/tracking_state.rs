//! Latest-value tracking store shared between the detection worker and the frame loop.
//!
//! The store holds one immutable [`TrackingSnapshot`] behind an `Arc`. Publishing
//! builds a complete new snapshot and swaps it in under the write lock, so a reader
//! sees either the previous frame or the new one, never a mix of the two.

use crate::{
    pose_estimation::extract_head_pose,
    types::{Detection, HeadPose, LandmarkSet, ReferencePoints},
};
use log::warn;
use std::sync::{Arc, RwLock};

/// Everything known about the face at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingSnapshot {
    /// Number of publishes before this snapshot; 0 for the initial empty state
    pub sequence: u64,
    /// Detection timestamp in milliseconds
    pub timestamp_ms: f64,
    pub landmarks: Option<Arc<LandmarkSet>>,
    pub head_pose: Option<HeadPose>,
    pub reference_points: Option<ReferencePoints>,
}

impl TrackingSnapshot {
    /// Build a snapshot from one detection result.
    ///
    /// A present detection whose reference points cannot be resolved is treated
    /// as no face for that frame.
    pub fn from_detection(detection: Option<Detection>, sequence: u64, timestamp_ms: f64) -> Self {
        let Some(detection) = detection else {
            return Self::empty(sequence, timestamp_ms);
        };

        let Some(reference_points) = detection.landmarks.reference_points() else {
            warn!("Detection without reference points at {timestamp_ms:.1}ms; treating as no face");
            return Self::empty(sequence, timestamp_ms);
        };

        Self {
            sequence,
            timestamp_ms,
            head_pose: detection.transform.as_ref().map(extract_head_pose),
            landmarks: Some(Arc::new(detection.landmarks)),
            reference_points: Some(reference_points),
        }
    }

    fn empty(sequence: u64, timestamp_ms: f64) -> Self {
        Self {
            sequence,
            timestamp_ms,
            ..Self::default()
        }
    }

    pub fn has_face(&self) -> bool {
        self.landmarks.is_some()
    }

    pub fn landmark_count(&self) -> usize {
        self.landmarks.as_ref().map_or(0, |set| set.len())
    }
}

/// Single-writer, many-reader snapshot store
#[derive(Debug, Default)]
pub struct TrackingState {
    current: RwLock<Arc<TrackingSnapshot>>,
}

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot with one built from `detection`
    pub fn publish(&self, detection: Option<Detection>, timestamp_ms: f64) -> Arc<TrackingSnapshot> {
        let mut guard = self.current.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = Arc::new(TrackingSnapshot::from_detection(
            detection,
            guard.sequence + 1,
            timestamp_ms,
        ));
        *guard = Arc::clone(&next);
        next
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<TrackingSnapshot> {
        let guard = self.current.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }
}

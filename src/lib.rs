//! Glasses try-on overlay library: face landmarks in, 3D object transforms out.
//!
//! Each display refresh turns the most recent face landmark detection into the
//! position, rotation and scale of a glasses model drawn over the camera feed.
//!
//! The pipeline consists of:
//! 1. A [`landmark_source::LandmarkSource`] producing at most one face per frame
//! 2. Head pose extraction from the detector's facial transformation matrix
//! 3. A shared [`tracking_state::TrackingState`] holding the latest snapshot
//! 4. Optional smoothing of the tracked signals
//! 5. Overlay alignment against the viewport and the selected catalog frame
//!
//! # Examples
//!
//! ## Aligning a single detection
//!
//! ```no_run
//! use framesense::{
//!     alignment::{OverlayAligner, Viewport},
//!     catalog::Catalog,
//!     landmark_source::{LandmarkSource, MockLandmarkSource},
//!     tracking_state::TrackingState,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::from_file("demos/catalog.json")?;
//! let frame = catalog.resolve("aviator-01")?;
//!
//! let mut source = MockLandmarkSource::new()?;
//! let state = TrackingState::new();
//! state.publish(source.detect(0.0)?, 0.0);
//!
//! let mut aligner = OverlayAligner::new(0.05)?;
//! let viewport = Viewport::new(1280, 720)?;
//! if let Some(transform) = aligner.align(&state.snapshot(), Some(frame), viewport) {
//!     println!("Scale: {:.2}", transform.scale);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the full application headless
//!
//! ```no_run
//! use framesense::{
//!     app::{LogRenderer, OverlayApp},
//!     catalog::Catalog,
//!     config::Config,
//!     landmark_source::{open_source, SourceKind},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let catalog = Catalog::from_file(&config.catalog.path)?;
//! let mut app = OverlayApp::new(&config, catalog)?;
//! app.select("aviator-01")?;
//! app.start_tracking(|| open_source(&SourceKind::Mock), config.detection_interval());
//!
//! let mut renderer = LogRenderer::new(config.viewport()?);
//! app.run(&mut renderer, 90, config.frame_interval())?;
//! app.shutdown();
//! # Ok(())
//! # }
//! ```

/// Core tracking data types
pub mod types;

/// Landmark sources: detector boundary, mock and replay
pub mod landmark_source;

/// Head pose extraction from the facial transformation matrix
pub mod pose_estimation;

/// Latest-value store shared by the detection worker and the frame loop
pub mod tracking_state;

/// Signal filtering algorithms for optional smoothing
pub mod filters;

/// Smoothing stage applying filters to a tracking snapshot
pub mod smoothing;

/// Overlay alignment engine
pub mod alignment;

/// Glasses frame catalog
pub mod catalog;

/// Fit scoring rules
pub mod fit_scoring;

/// Landmark debug report
pub mod diagnostics;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};

//! Configuration management for the overlay application

use crate::{
    alignment::{MirrorMode, Viewport},
    constants::{
        DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_FPS, DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW,
        DEFAULT_REFERENCE_IPD, DEFAULT_SHAPE_PENALTY, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH,
        DEFAULT_WIDTH_PENALTY_PER_MM, DEFAULT_WIDTH_TOLERANCE_MM,
    },
    fit_scoring::FitScorer,
    landmark_source::SourceKind,
    smoothing::SmoothingStage,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmark source and alignment parameters
    pub tracking: TrackingConfig,

    /// Display configuration
    pub display: DisplayConfig,

    /// Optional smoothing between tracking and alignment
    pub smoothing: SmoothingConfig,

    /// Glasses catalog
    pub catalog: CatalogConfig,

    /// Fit scoring rules
    pub fit: FitConfig,
}

/// Landmark source and alignment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// `mock` or `replay:<path>`
    pub source: String,

    /// Detection rate of the worker thread
    pub detection_fps: f64,

    /// Normalized IPD at which the glasses model is drawn at its authored size
    pub reference_ipd: f64,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Viewport width in pixels
    pub width: u32,

    /// Viewport height in pixels
    pub height: u32,

    /// Target framerate of the render loop
    pub target_fps: f64,

    /// Video and scene flip
    pub mirror: MirrorMode,
}

/// Smoothing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter name, optionally with a parameter (`exponential:0.3`)
    pub filter: String,

    /// Moving average window size
    pub moving_average_window: usize,

    /// Median filter window size
    pub median_window: usize,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the catalog JSON file
    pub path: PathBuf,

    /// Frame selected at startup
    pub default_selection: Option<String>,
}

/// Fit scoring rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Frame width deviation allowed without penalty
    pub width_tolerance_mm: f64,

    /// Points lost per millimeter beyond the tolerance
    pub width_penalty_per_mm: f64,

    /// Points lost when the face shape is not recommended
    pub shape_penalty: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            source: "mock".to_string(),
            detection_fps: DEFAULT_FPS,
            reference_ipd: DEFAULT_REFERENCE_IPD,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
            target_fps: DEFAULT_FPS,
            mirror: MirrorMode::default(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "none".to_string(),
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            median_window: DEFAULT_MEDIAN_WINDOW,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("demos/catalog.json"),
            default_selection: None,
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            width_tolerance_mm: DEFAULT_WIDTH_TOLERANCE_MM,
            width_penalty_per_mm: DEFAULT_WIDTH_PENALTY_PER_MM,
            shape_penalty: DEFAULT_SHAPE_PENALTY,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Filter description with the configured parameter filled in when none is given
    pub fn filter_description(&self) -> String {
        let filter = self.smoothing.filter.trim().to_lowercase();
        match filter.as_str() {
            "moving_average" | "movingaverage" => {
                format!("moving_average:{}", self.smoothing.moving_average_window)
            }
            "median" => format!("median:{}", self.smoothing.median_window),
            "exponential" => format!("exponential:{}", self.smoothing.exponential_alpha),
            _ => filter,
        }
    }

    /// Create the smoothing stage from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the filter description is invalid
    pub fn create_smoothing_stage(&self) -> Result<SmoothingStage> {
        SmoothingStage::new(&self.filter_description())
    }

    /// # Errors
    ///
    /// Returns an error if a fit parameter is invalid
    pub fn create_fit_scorer(&self) -> Result<FitScorer> {
        FitScorer::new(
            self.fit.width_tolerance_mm,
            self.fit.width_penalty_per_mm,
            self.fit.shape_penalty,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the source string is not recognized
    pub fn source_kind(&self) -> Result<SourceKind> {
        self.tracking.source.parse()
    }

    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn viewport(&self) -> Result<Viewport> {
        Viewport::new(self.display.width, self.display.height)
    }

    /// Time between detections of the worker thread
    pub fn detection_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tracking.detection_fps)
    }

    /// Time between rendered frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.display.target_fps)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        // Validate tracking
        self.source_kind()
            .map_err(|e| Error::ConfigError(format!("Invalid tracking source: {e}")))?;
        if !self.tracking.detection_fps.is_finite() || self.tracking.detection_fps <= 0.0 {
            return Err(Error::ConfigError("Detection FPS must be greater than 0".to_string()));
        }
        if !self.tracking.reference_ipd.is_finite() || self.tracking.reference_ipd <= 0.0 {
            return Err(Error::ConfigError("Reference IPD must be greater than 0".to_string()));
        }

        // Validate display settings
        if self.display.width == 0 || self.display.height == 0 {
            return Err(Error::ConfigError("Viewport dimensions must be greater than 0".to_string()));
        }
        if !self.display.target_fps.is_finite() || self.display.target_fps <= 0.0 {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }

        // Validate filter parameters
        if self.smoothing.moving_average_window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if self.smoothing.median_window == 0 || self.smoothing.median_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Median window size must be odd and greater than 0".to_string(),
            ));
        }
        if !(self.smoothing.exponential_alpha > 0.0 && self.smoothing.exponential_alpha <= 1.0) {
            return Err(Error::ConfigError(
                "Exponential alpha must be in (0, 1]".to_string(),
            ));
        }
        crate::filters::create_filter(&self.filter_description())
            .map_err(|e| Error::ConfigError(format!("Invalid smoothing filter: {e}")))?;

        // Validate fit rules
        self.create_fit_scorer()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# FrameSense Configuration

# Landmark source and alignment
tracking:
  source: "mock"
  detection_fps: 30.0
  reference_ipd: 0.05

# Display settings
display:
  width: 1280
  height: 720
  target_fps: 30.0
  mirror: "horizontal"

# Optional smoothing ("none", "exponential", "moving_average", "median")
smoothing:
  filter: "none"
  moving_average_window: 5
  median_window: 5
  exponential_alpha: 0.5

# Glasses catalog
catalog:
  path: "demos/catalog.json"
  default_selection: "aviator-01"

# Fit scoring rules
fit:
  width_tolerance_mm: 4.0
  width_penalty_per_mm: 3.0
  shape_penalty: 15.0
"#;

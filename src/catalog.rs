//! Glasses frame catalog: immutable descriptors loaded once at startup.

use crate::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, path::Path};

/// Face shape classes used for frame recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceShape {
    Oval,
    Round,
    Square,
    Heart,
    Diamond,
}

impl fmt::Display for FaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Oval => "oval",
            Self::Round => "round",
            Self::Square => "square",
            Self::Heart => "heart",
            Self::Diamond => "diamond",
        };
        f.write_str(name)
    }
}

/// One glasses frame as listed in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlassesFrame {
    pub id: String,
    pub name: String,
    pub style: String,
    pub frame_width_mm: f64,
    pub bridge_width_mm: f64,
    pub temple_length_mm: f64,
    pub colors: Vec<String>,
    pub recommended_shapes: Vec<FaceShape>,
    /// Opaque reference resolved by the renderer
    pub model_path: String,
    /// Opaque reference resolved by the UI
    pub thumbnail_path: String,
}

impl GlassesFrame {
    /// "style · first color" summary shown next to the thumbnail
    pub fn summary(&self) -> String {
        match self.colors.first() {
            Some(color) => format!("{} · {}", self.style, color),
            None => self.style.clone(),
        }
    }
}

/// Ordered collection of glasses frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    frames: Vec<GlassesFrame>,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns an error if identifiers repeat or a dimension is not positive
    pub fn new(frames: Vec<GlassesFrame>) -> Result<Self> {
        let catalog = Self { frames };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON array file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let catalog = Self::from_json(&content)?;
        info!(
            "Loaded {} glasses frames from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the catalog is invalid
    pub fn from_json(content: &str) -> Result<Self> {
        let frames: Vec<GlassesFrame> = serde_json::from_str(content)?;
        Self::new(frames)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for frame in &self.frames {
            if frame.id.is_empty() {
                return Err(Error::Catalog("Frame with empty id".to_string()));
            }
            if !seen.insert(frame.id.as_str()) {
                return Err(Error::Catalog(format!("Duplicate frame id: {}", frame.id)));
            }
            let dimensions = [frame.frame_width_mm, frame.bridge_width_mm, frame.temple_length_mm];
            if dimensions.iter().any(|d| !d.is_finite() || *d <= 0.0) {
                return Err(Error::Catalog(format!(
                    "Frame {} has non-positive dimensions",
                    frame.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&GlassesFrame> {
        self.frames.iter().find(|frame| frame.id == id)
    }

    /// Look up a frame that must exist
    ///
    /// # Errors
    ///
    /// Returns an error if no frame has this id
    pub fn resolve(&self, id: &str) -> Result<&GlassesFrame> {
        self.get(id)
            .ok_or_else(|| Error::Catalog(format!("Unknown glasses id: {id}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlassesFrame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

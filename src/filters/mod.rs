//! Signal filtering algorithms for optional smoothing of tracked signals.
//!
//! Tracked landmarks and head pose are passed through raw by default, so the
//! overlay follows sensor noise directly. These filters can be placed between
//! the tracking state and the alignment engine to trade latency for stability.
//! Every filter works on a 3-vector: a landmark position or a pitch/yaw/roll triple.

/// Exponential filter for responsive smoothing
pub mod exponential;

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

use crate::{
    constants::{DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW},
    Error, Result,
};
use nalgebra::Vector3;

/// Trait for all tracking filters
pub trait TrackingFilter: Send + Sync {
    /// Apply filter to one sample
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64>;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl TrackingFilter for NoFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        sample
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a filter from a `name[:param]` description, e.g. `exponential:0.3` or `median:5`
///
/// # Errors
///
/// Returns an error if the name is unknown or the parameter is missing its valid range
pub fn create_filter(description: &str) -> Result<Box<dyn TrackingFilter>> {
    let lowered = description.trim().to_lowercase();
    let (name, param) = match lowered.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (lowered.as_str(), None),
    };

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" => {
            let alpha = parse_param(param, DEFAULT_EXPONENTIAL_ALPHA)?;
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        "moving_average" | "movingaverage" => {
            let window = parse_param(param, DEFAULT_MOVING_AVERAGE_WINDOW)?;
            if window == 0 {
                return Err(Error::FilterError("Window size must be greater than 0".to_string()));
            }
            Ok(Box::new(moving_average::MovingAverageFilter::new(window)))
        }
        "median" => {
            let window = parse_param(param, DEFAULT_MEDIAN_WINDOW)?;
            if window == 0 || window % 2 == 0 {
                return Err(Error::FilterError(format!(
                    "Window size must be odd and greater than 0, got {window}"
                )));
            }
            Ok(Box::new(median::MedianFilter::new(window)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {description}"))),
    }
}

fn parse_param<T: std::str::FromStr>(param: Option<&str>, default: T) -> Result<T> {
    match param {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::FilterError(format!("Invalid filter parameter: {raw}"))),
    }
}

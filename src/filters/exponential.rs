use super::TrackingFilter;
use nalgebra::Vector3;

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<Vector3<f64>>,
}

impl ExponentialFilter {
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }
}

impl TrackingFilter for ExponentialFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        let filtered = match self.last {
            Some(last) => sample * self.alpha + last * (1.0 - self.alpha),
            None => sample,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);

        // First value passes through
        let first = filter.apply(Vector3::new(10.0, 20.0, 0.0));
        assert_eq!(first, Vector3::new(10.0, 20.0, 0.0));

        let second = filter.apply(Vector3::new(20.0, 30.0, 4.0));
        assert_eq!(second, Vector3::new(15.0, 25.0, 2.0));
    }

    #[test]
    fn test_alpha_bounds() {
        // High alpha = less smoothing
        let mut filter = ExponentialFilter::new(0.9);
        filter.apply(Vector3::new(10.0, 0.0, 0.0));
        let out = filter.apply(Vector3::new(20.0, 0.0, 0.0));
        assert!((out.x - 19.0).abs() < 0.001);

        // Low alpha = more smoothing
        let mut filter = ExponentialFilter::new(0.1);
        filter.apply(Vector3::new(10.0, 0.0, 0.0));
        let out = filter.apply(Vector3::new(20.0, 0.0, 0.0));
        assert!((out.x - 11.0).abs() < 0.001);
    }

    #[test]
    #[should_panic(expected = "Alpha must be in (0, 1]")]
    fn test_zero_alpha_panics() {
        let _ = ExponentialFilter::new(0.0);
    }
}

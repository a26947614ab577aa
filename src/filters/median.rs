use super::TrackingFilter;
use nalgebra::Vector3;
use std::collections::VecDeque;

/// Per-component median filter
pub struct MedianFilter {
    window_size: usize,
    buffer: VecDeque<Vector3<f64>>,
}

impl MedianFilter {
    /// # Panics
    ///
    /// Panics if the window size is zero or even
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(window_size % 2 == 1, "Median filter window size must be odd");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    fn calculate_median(&self, component: usize) -> f64 {
        let mut sorted: Vec<f64> = self.buffer.iter().map(|v| v[component]).collect();
        sorted.sort_by(f64::total_cmp);

        let len = sorted.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        }
    }
}

impl TrackingFilter for MedianFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(sample);

        Vector3::new(self.calculate_median(0), self.calculate_median(1), self.calculate_median(2))
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter() {
        let mut filter = MedianFilter::new(3);

        assert_eq!(filter.apply(Vector3::new(10.0, 20.0, 0.0)).x, 10.0);
        assert_eq!(filter.apply(Vector3::new(20.0, 30.0, 0.0)).x, 15.0); // median of [10, 20]
        assert_eq!(filter.apply(Vector3::new(30.0, 40.0, 0.0)).x, 20.0);
    }

    #[test]
    fn test_median_with_outliers() {
        let mut filter = MedianFilter::new(3);

        filter.apply(Vector3::new(10.0, 20.0, 1.0));
        filter.apply(Vector3::new(11.0, 21.0, 1.0));
        let out = filter.apply(Vector3::new(100.0, 200.0, 1.0)); // outlier

        assert_eq!(out, Vector3::new(11.0, 21.0, 1.0));
    }

    #[test]
    #[should_panic(expected = "Median filter window size must be odd")]
    fn test_even_window_panics() {
        let _ = MedianFilter::new(4);
    }
}

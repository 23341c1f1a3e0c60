//! Shared fixtures for the OWS workspace tests.
//!
//! Capabilities documents for every supported dialect, WFS request bodies,
//! and allowed areas as GeoJSON. Documents live under
//! `testdata/` and are compiled in, so tests need no filesystem setup.

pub mod fixtures;

pub use fixtures::*;

/// Assert two numbers differ by at most `epsilon`.
///
/// ```ignore
/// assert_approx_eq!(bbox.min().x, 5.5, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "{} is not within {} of {}",
            left,
            epsilon,
            right
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_within_epsilon() {
        assert_approx_eq!(50.7000001, 50.7, 1e-6);
        assert_approx_eq!(-7, -7.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_approx_eq_outside_epsilon() {
        assert_approx_eq!(7.2, 7.0, 0.1);
    }
}

/// Assert that a decoded scalar is within `tolerance` of what was sent
#[macro_export]
macro_rules! assert_within {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let (actual, expected, tolerance) = ($actual as f64, $expected as f64, $tolerance as f64);
        assert!(
            (actual - expected).abs() <= tolerance,
            "{} is not within {} of {}",
            actual,
            tolerance,
            expected
        );
    };
}

/// Assert that every axis of a decoded vector is within `tolerance`
#[macro_export]
macro_rules! assert_vector_within {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let (actual, expected): ([f32; 3], [f32; 3]) = ($actual, $expected);
        for axis in 0..3 {
            $crate::assert_within!(actual[axis], expected[axis], $tolerance);
        }
    };
}

/// Circular distance between two angles in degrees
pub fn angle_distance(a: f32, b: f32) -> f32 {
    let difference = (a - b).rem_euclid(360.0);
    difference.min(360.0 - difference)
}

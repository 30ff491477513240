use super::ring_primitives::remove_duplicates_preserve_order;
use crate::geometry::Coordinate;

/// Closed loops recovered from one chained point list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedRings {
    /// Deduplicated and re-closed coordinate lists, in chain order.
    pub rings: Vec<Vec<Coordinate>>,
    /// Trailing points after the last closure; these never formed a loop.
    pub dropped: usize,
}

/// Splits a chained point list wherever it returns to the start of the
/// current loop. Whatever follows the last closure is dropped and counted.
pub fn detect_rings(points: &[Coordinate]) -> DetectedRings {
    let mut rings = Vec::new();
    let mut start = 0;

    for end in 0..points.len() {
        if end > start && points[end] == points[start] {
            rings.push(remove_duplicates_preserve_order(&points[start..=end]));
            start = end + 1;
        }
    }

    DetectedRings {
        rings,
        dropped: points.len() - start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::{c, square};

    #[test]
    fn test_two_loops_back_to_back() {
        let mut points = square(0., 0., 1.);
        points.extend(square(3., 3., 2.));

        let detected = detect_rings(&points);
        assert_eq!(detected.rings, vec![square(0., 0., 1.), square(3., 3., 2.)]);
        assert_eq!(detected.dropped, 0);
    }

    #[test]
    fn test_interior_duplicates_removed() {
        let points = vec![
            c(0., 0.),
            c(0., 1.),
            c(0., 1.),
            c(1., 1.),
            c(1., 0.),
            c(1., 0.),
            c(0., 0.),
        ];
        let detected = detect_rings(&points);
        assert_eq!(detected.rings, vec![square(0., 0., 1.)]);
    }

    #[test]
    fn test_trailing_points_are_dropped() {
        let mut points = square(0., 0., 1.);
        points.extend([c(5., 5.), c(6., 6.), c(7., 5.)]);

        let detected = detect_rings(&points);
        assert_eq!(detected.rings, vec![square(0., 0., 1.)]);
        assert_eq!(detected.dropped, 3);
    }

    #[test]
    fn test_no_closure() {
        let points = vec![c(0., 0.), c(1., 0.), c(1., 1.)];
        let detected = detect_rings(&points);
        assert!(detected.rings.is_empty());
        assert_eq!(detected.dropped, 3);
    }

    #[test]
    fn test_empty() {
        assert_eq!(detect_rings(&[]), DetectedRings::default());
    }
}

use crate::geometry::{coord_key, Arc, Coordinate};
use fnv::FnvHashSet;

/// True when every arc starts where its predecessor ends, wrapping the last
/// arc around to the first. An empty list has no valid predecessor chain.
pub fn are_all_connected(arcs: &[Arc]) -> bool {
    if arcs.is_empty() {
        return false;
    }

    let len = arcs.len();
    (0..len).all(|i| arcs[i].head() == arcs[(i + len - 1) % len].tail())
}

pub fn are_all_closed(arcs: &[Arc]) -> bool {
    arcs.iter().all(Arc::is_closed)
}

/// Drops later repeats of a coordinate, keeping first occurrences in order,
/// then re-closes the list with its first coordinate.
pub fn remove_duplicates_preserve_order(coords: &[Coordinate]) -> Vec<Coordinate> {
    let Some(&first) = coords.first() else {
        return Vec::new();
    };

    let mut seen: FnvHashSet<(u64, u64)> = FnvHashSet::default();
    let mut deduped: Vec<Coordinate> = coords
        .iter()
        .filter(|coord| seen.insert(coord_key(coord)))
        .copied()
        .collect();
    deduped.push(first);
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::{arc, c, square};

    #[test]
    fn test_connected_in_cyclic_order() {
        let arcs = vec![
            arc(&[(0., 0.), (0., 1.)]),
            arc(&[(0., 1.), (1., 1.), (1., 0.)]),
            arc(&[(1., 0.), (0., 0.)]),
        ];
        assert!(are_all_connected(&arcs));
    }

    #[test]
    fn test_connected_requires_wraparound() {
        let arcs = vec![
            arc(&[(0., 0.), (0., 1.)]),
            arc(&[(0., 1.), (1., 1.)]),
        ];
        assert!(!are_all_connected(&arcs));
    }

    #[test]
    fn test_connected_empty_and_single() {
        assert!(!are_all_connected(&[]));
        assert!(!are_all_connected(&[arc(&[(0., 0.), (1., 0.)])]));

        let closed = Arc::new(square(0., 0., 1.)).unwrap();
        assert!(are_all_connected(&[closed]));
    }

    #[test]
    fn test_closed() {
        let closed = Arc::new(square(0., 0., 1.)).unwrap();
        let open = arc(&[(0., 0.), (1., 0.)]);

        assert!(are_all_closed(&[]));
        assert!(are_all_closed(std::slice::from_ref(&closed)));
        assert!(!are_all_closed(&[closed, open]));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let coords = vec![c(0., 0.), c(0., 1.), c(0., 1.), c(1., 1.), c(0., 1.), c(1., 0.)];
        assert_eq!(
            remove_duplicates_preserve_order(&coords),
            vec![c(0., 0.), c(0., 1.), c(1., 1.), c(1., 0.), c(0., 0.)]
        );
    }

    #[test]
    fn test_dedup_of_simple_ring_only_appends_closing_point() {
        let ring = square(0., 0., 1.);
        let deduped = remove_duplicates_preserve_order(&ring);

        // the closing point of the input is itself a repeat
        assert_eq!(deduped, ring);

        let open = &ring[..ring.len() - 1];
        let mut expected = open.to_vec();
        expected.push(open[0]);
        assert_eq!(remove_duplicates_preserve_order(open), expected);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(remove_duplicates_preserve_order(&[]).is_empty());
    }

    #[test]
    fn test_dedup_treats_signed_zero_as_equal() {
        let coords = vec![c(0.0, 1.0), c(1.0, 1.0), c(-0.0, 1.0)];
        assert_eq!(
            remove_duplicates_preserve_order(&coords),
            vec![c(0.0, 1.0), c(1.0, 1.0), c(0.0, 1.0)]
        );
    }
}

use crate::geometry::{Coordinate, Ring, Role};
use itertools::Itertools;

/// Planar shoelace area over (lon, lat). Clockwise rings come out negative.
pub fn signed_area(coords: &[Coordinate]) -> f64 {
    let twice_area: f64 = coords
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice_area / 2.0
}

/// Sign a ring of the given role must have after normalization.
pub fn expected_sign(role: Role) -> f64 {
    match role {
        Role::Outer => -1.0,
        Role::Inner => 1.0,
    }
}

/// Reverses `ring` when its winding disagrees with `role`: outer rings end
/// up with negative signed area, holes with positive. Zero-area rings are
/// left alone. Returns whether the ring was reversed.
pub fn normalize_orientation(ring: &mut Ring, role: Role) -> bool {
    let area = signed_area(ring.coords());
    if area == 0.0 || area.signum() == expected_sign(role) {
        return false;
    }
    ring.reverse();
    true
}

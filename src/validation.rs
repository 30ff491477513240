//! Construction-time geometry checks applied before a feature is accepted.

use crate::error::GeometryError;
use crate::geometry::{Coordinate, Geometry, Polygon, Ring};
use geo::{Area, Intersects, LineString, Point};

pub fn check_geometry(geometry: &Geometry) -> Result<(), GeometryError> {
    match geometry {
        Geometry::Point(coordinate) => check_finite(std::slice::from_ref(coordinate)),
        Geometry::Line(coords) => check_line(coords),
        Geometry::Polygon(polygon) => check_polygon(polygon),
    }
}

fn check_finite(coords: &[Coordinate]) -> Result<(), GeometryError> {
    match coords
        .iter()
        .find(|coord| !coord.x.is_finite() || !coord.y.is_finite())
    {
        Some(coord) => Err(GeometryError::NonFinite {
            x: coord.x,
            y: coord.y,
        }),
        None => Ok(()),
    }
}

fn check_line(coords: &[Coordinate]) -> Result<(), GeometryError> {
    check_finite(coords)?;
    let Some(first) = coords.first() else {
        return Err(GeometryError::DegenerateLine);
    };
    if !coords.iter().any(|coord| coord != first) {
        return Err(GeometryError::DegenerateLine);
    }
    Ok(())
}

fn check_polygon(polygon: &Polygon) -> Result<(), GeometryError> {
    if polygon.outers().is_empty() {
        return Err(GeometryError::NoOuterRing);
    }

    for (index, (_, ring)) in polygon.rings().enumerate() {
        check_ring(index, ring)?;
    }

    let shells: Vec<geo::Polygon<f64>> = polygon
        .outers()
        .iter()
        .map(|ring| geo::Polygon::new(LineString::new(ring.coords().to_vec()), vec![]))
        .collect();

    let first_hole = polygon.outers().len();
    for (offset, hole) in polygon.inners().iter().enumerate() {
        let covered = shells.iter().any(|shell| {
            hole.coords()
                .iter()
                .all(|coord| shell.intersects(&Point::from(*coord)))
        });
        if !covered {
            return Err(GeometryError::HoleOutside {
                ring: first_hole + offset,
            });
        }
    }

    Ok(())
}

fn check_ring(index: usize, ring: &Ring) -> Result<(), GeometryError> {
    let coords = ring.coords();
    check_finite(coords)?;

    if coords.len() < Ring::MIN_COORDS {
        return Err(GeometryError::TooFewPoints {
            ring: index,
            count: coords.len(),
        });
    }
    if coords.first() != coords.last() {
        return Err(GeometryError::NotClosed { ring: index });
    }

    let linestring = LineString::new(coords.to_vec());

    // find any intersections between non-adjacent segments
    let segments: Vec<_> = linestring.lines().collect();
    let total_segments = segments.len();
    let self_intersects = segments.iter().enumerate().any(|(i, seg1)| {
        segments
            .iter()
            .skip(i + 2) // skip self-self and self-neighbor (they must intersect)
            .take(total_segments - 3) // avoid start-last (they form a loop so must intersect)
            .any(|seg2| seg1.intersects(seg2))
    });
    if self_intersects {
        return Err(GeometryError::SelfIntersection { ring: index });
    }

    let area = geo::Polygon::new(linestring, vec![]).unsigned_area();
    if area <= 0.0 {
        return Err(GeometryError::ZeroArea { ring: index });
    }

    Ok(())
}

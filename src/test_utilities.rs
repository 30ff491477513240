use crate::geometry::{Arc, Coordinate};
use crate::osm_parser::OsmData;
use std::fs;

pub fn c(x: f64, y: f64) -> Coordinate {
    Coordinate { x, y }
}

pub fn arc(points: &[(f64, f64)]) -> Arc {
    Arc::new(points.iter().map(|&(x, y)| c(x, y)).collect()).expect("arc needs a point")
}

/// Closed clockwise square, negative signed area.
pub fn square(x0: f64, y0: f64, size: f64) -> Vec<Coordinate> {
    vec![
        c(x0, y0),
        c(x0, y0 + size),
        c(x0 + size, y0 + size),
        c(x0 + size, y0),
        c(x0, y0),
    ]
}

/// Closed counter-clockwise square, positive signed area.
pub fn square_ccw(x0: f64, y0: f64, size: f64) -> Vec<Coordinate> {
    let mut coords = square(x0, y0, size);
    coords.reverse();
    coords
}

pub fn load_fixture(name: &str) -> OsmData {
    let json = fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"));
    serde_json::from_str(&json).expect("Failed to parse fixture")
}

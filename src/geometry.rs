//! Geometry value types flowing through assembly.
//!
//! Coordinates are `geo::Coord<f64>` with `x` = longitude and `y` = latitude.
//! Equality is exact value equality; no snapping or tolerance is applied when
//! arc endpoints are matched.

use crate::error::MalformedRing;
use geo::Coord;
use std::fmt;

pub type Coordinate = Coord<f64>;

/// Hash key matching coordinate `==`: `-0.0` folds onto `0.0`.
pub(crate) fn coord_key(coordinate: &Coordinate) -> (u64, u64) {
    fn bits(value: f64) -> u64 {
        if value == 0.0 {
            0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
    (bits(coordinate.x), bits(coordinate.y))
}

/// Outer boundary or hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Outer,
    Inner,
}

impl Role {
    /// Maps an OSM member role; anything but `outer`/`inner` is not a ring role.
    pub fn from_osm(role: &str) -> Option<Self> {
        match role {
            "outer" => Some(Role::Outer),
            "inner" => Some(Role::Inner),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Outer => "outer",
            Role::Inner => "inner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, non-empty run of coordinates contributed by one way.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    coords: Vec<Coordinate>,
}

impl Arc {
    /// Returns `None` for an empty coordinate list.
    pub fn new(coords: Vec<Coordinate>) -> Option<Self> {
        if coords.is_empty() {
            return None;
        }
        Some(Self { coords })
    }

    pub fn head(&self) -> Coordinate {
        self.coords[0]
    }

    pub fn tail(&self) -> Coordinate {
        self.coords[self.coords.len() - 1]
    }

    pub fn is_closed(&self) -> bool {
        self.head() == self.tail()
    }

    pub fn reverse(&mut self) {
        self.coords.reverse();
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn into_coords(self) -> Vec<Coordinate> {
        self.coords
    }
}

/// An arc tagged with the role its way plays in a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberArc {
    pub way_id: u64,
    pub role: Role,
    pub arc: Arc,
}

/// A closed boundary loop: head equals tail and there are at least
/// three distinct coordinates plus the closing one.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    coords: Vec<Coordinate>,
}

impl Ring {
    pub const MIN_COORDS: usize = 4;

    pub fn new(coords: Vec<Coordinate>) -> Result<Self, MalformedRing> {
        if coords.len() < Self::MIN_COORDS {
            return Err(MalformedRing::TooFewPoints(coords.len()));
        }
        if coords.first() != coords.last() {
            return Err(MalformedRing::NotClosed);
        }
        Ok(Self { coords })
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    /// Reverses vertex order; closure is preserved.
    pub fn reverse(&mut self) {
        self.coords.reverse();
    }

    pub fn into_coords(self) -> Vec<Coordinate> {
        self.coords
    }
}

/// Rings sharing one role, in the order chaining produced them.
pub type RingSet = Vec<Ring>;

/// Outer rings followed by inner rings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    outers: RingSet,
    inners: RingSet,
}

impl Polygon {
    pub fn new(outers: RingSet, inners: RingSet) -> Self {
        Self { outers, inners }
    }

    pub fn outers(&self) -> &[Ring] {
        &self.outers
    }

    pub fn inners(&self) -> &[Ring] {
        &self.inners
    }

    /// All rings, outers first.
    pub fn rings(&self) -> impl Iterator<Item = (Role, &Ring)> + '_ {
        self.outers
            .iter()
            .map(|ring| (Role::Outer, ring))
            .chain(self.inners.iter().map(|ring| (Role::Inner, ring)))
    }

    pub fn ring_count(&self) -> usize {
        self.outers.len() + self.inners.len()
    }
}

/// A finished geometry handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    Line(Vec<Coordinate>),
    Polygon(Polygon),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::Line(_) => "line",
            Geometry::Polygon(_) => "polygon",
        }
    }
}

//! Polygon reconstruction from OSM relation members and closed ways.
//!
//! Member ways arrive as arcs in arbitrary order and direction. The arc
//! chainer joins them at shared endpoints, the ring splitter separates the
//! loops it walked, and the orientation normalizer fixes each ring's winding
//! for its role. The assembler drives these steps per relation.

pub mod arc_chainer;
pub mod assembler;
pub mod orientation;
pub mod ring_primitives;
pub mod ring_splitter;

pub use arc_chainer::{chain_arcs, Chain};
pub use assembler::{
    assemble_relation, assemble_ring_set, assemble_way_polygon, collect_members, AssemblyStage,
    RelationMembers, RingSetError,
};
pub use orientation::{normalize_orientation, signed_area};
pub use ring_primitives::{are_all_closed, are_all_connected, remove_duplicates_preserve_order};
pub use ring_splitter::{detect_rings, DetectedRings};

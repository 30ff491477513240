//! Assembles OpenStreetMap points, lines and multipolygon relations into
//! feature records.
//!
//! Elements are fetched per category from Overpass (or a saved response),
//! relation member arcs are chained into closed rings, and every finished
//! geometry is handed to a [`sink::GeometrySink`] together with its tag
//! attributes.

#![allow(clippy::module_inception)]

pub mod args;
pub mod config;
pub mod coordinate_system;
pub mod data_processing;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod osm_parser;
pub mod polygon_assembly;
pub mod record_builder;
pub mod retrieve_data;
pub mod sink;
#[cfg(test)]
pub mod test_utilities;
pub mod validation;

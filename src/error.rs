//! Error types shared across the crate.
//!
//! Per-feature problems ([`Rejection`]) are collected in batch outputs and
//! never abort a run. Only [`FetchError`], surfaced through [`BatchError`],
//! stops the surrounding run.

use crate::geometry::Role;
use crate::osm_parser::ElementRef;
use crate::polygon_assembly::AssemblyStage;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a chained ring set could not become closed rings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRing {
    #[error("ring has {0} coordinates, at least 4 are required")]
    TooFewPoints(usize),
    #[error("ring is not closed")]
    NotClosed,
    #[error("chaining stalled with {unused} arcs left unused")]
    Stalled { unused: usize },
    #[error("{dropped} trailing coordinates never closed a ring")]
    UnclosedTail { dropped: usize },
}

/// Rejections raised by a sink's geometry construction step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
    #[error("line needs at least two distinct coordinates")]
    DegenerateLine,
    #[error("polygon has no outer ring")]
    NoOuterRing,
    #[error("ring {ring} has {count} coordinates, at least 4 are required")]
    TooFewPoints { ring: usize, count: usize },
    #[error("ring {ring} is not closed")]
    NotClosed { ring: usize },
    #[error("ring {ring} intersects itself")]
    SelfIntersection { ring: usize },
    #[error("ring {ring} degenerates to zero area")]
    ZeroArea { ring: usize },
    #[error("hole {ring} is not covered by any outer ring")]
    HoleOutside { ring: usize },
}

/// Why one element produced no feature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("no resolvable outer member")]
    NoOuterMembers,
    #[error("geometry could not be resolved from the batch")]
    Unresolved,
    #[error("{role} ring set is malformed: {source}")]
    MalformedRing {
        role: Role,
        #[source]
        source: MalformedRing,
    },
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
}

/// A per-feature failure, excluded from output and logged with its source id.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{element} rejected while {stage}: {reason}")]
pub struct Rejection {
    pub element: ElementRef,
    pub stage: AssemblyStage,
    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(element: ElementRef, stage: AssemblyStage, reason: RejectReason) -> Self {
        Self {
            element,
            stage,
            reason,
        }
    }
}

fn remark_suffix(remark: &Option<String>) -> String {
    remark
        .as_deref()
        .map(|remark| format!(" (remark: {remark})"))
        .unwrap_or_default()
}

/// Feature Source failures. These make the whole batch unusable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("could not reach {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {endpoint} timed out, try selecting a smaller area")]
    Timeout { endpoint: String },
    #[error("request limit reached on {endpoint}, try again in a few minutes")]
    RateLimited { endpoint: String },
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("query returned no elements{}", remark_suffix(.remark))]
    EmptyResult { remark: Option<String> },
    #[error("failed to decode Overpass response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// True when the source answered but had nothing for the query.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, FetchError::EmptyResult { .. })
    }
}

/// A category whose fetch failed; aborts [`crate::data_processing::run_categories`].
#[derive(Debug, Error)]
#[error("category {category}: {source}")]
pub struct BatchError {
    pub category: String,
    #[source]
    pub source: FetchError,
}

/// Configuration problems, numbered like the configuration file documentation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {path:?} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("[1001] invalid bounding box: {0}")]
    InvalidBoundingBox(String),
    #[error("[1002] invalid category name {0:?}")]
    InvalidCategory(String),
    #[error("[1003] invalid excluded attribute {attribute:?} in category {category}")]
    InvalidExclude { category: String, attribute: String },
    #[error("[1004] invalid category value {value:?} in category {category}")]
    InvalidCategoryValue { category: String, value: String },
    #[error(
        "[1005] invalid geometry type {value:?} in category {category}, expected point, line or polygon"
    )]
    InvalidGeometryType { category: String, value: String },
    #[error("invalid isEnabled value {value:?} in category {category}, expected yes or no")]
    InvalidFlag { category: String, value: String },
    #[error("no category is enabled")]
    NoEnabledCategory,
}

impl ConfigError {
    pub fn code(&self) -> Option<u16> {
        match self {
            ConfigError::InvalidBoundingBox(_) => Some(1001),
            ConfigError::InvalidCategory(_) => Some(1002),
            ConfigError::InvalidExclude { .. } => Some(1003),
            ConfigError::InvalidCategoryValue { .. } => Some(1004),
            ConfigError::InvalidGeometryType { .. } => Some(1005),
            _ => None,
        }
    }
}

/// Failures while handing a feature to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize feature {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write feature {id}: {source}")]
    Write {
        id: String,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_distinct() {
        let empty = FetchError::EmptyResult {
            remark: Some("runtime error: out of memory".to_string()),
        };
        assert!(empty.is_empty_result());
        assert!(empty.to_string().contains("out of memory"));

        let limited = FetchError::RateLimited {
            endpoint: "https://example.org".to_string(),
        };
        assert!(!limited.is_empty_result());
    }

    #[test]
    fn test_empty_result_without_remark() {
        let empty = FetchError::EmptyResult { remark: None };
        assert_eq!(empty.to_string(), "query returned no elements");
    }

    #[test]
    fn test_config_codes() {
        assert_eq!(
            ConfigError::InvalidBoundingBox("x".to_string()).code(),
            Some(1001)
        );
        assert_eq!(
            ConfigError::InvalidGeometryType {
                category: "building".to_string(),
                value: "area".to_string()
            }
            .code(),
            Some(1005)
        );
        assert_eq!(ConfigError::NoEnabledCategory.code(), None);
    }
}

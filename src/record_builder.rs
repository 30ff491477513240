use crate::geometry::Geometry;
use crate::osm_parser::ElementRef;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub const ID_FIELD: &str = "osm_id";
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// OSM metadata timestamp layout, e.g. `2018-03-01T10:00:00Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// An accepted geometry still carrying its raw element tags.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFeature {
    pub element: ElementRef,
    pub geometry: Geometry,
    pub tags: HashMap<String, String>,
    pub timestamp: Option<String>,
}

/// One output row: geometry plus a value for every column of its batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub attributes: BTreeMap<String, String>,
    pub geometry: Geometry,
}

/// Turns the features of one category batch into uniform records.
///
/// Columns are `osm_id`, `timestamp`, then the sorted union of tag keys
/// minus the excluded ones. Tags named like the two reserved columns are
/// shadowed by them.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    excluded: HashSet<String>,
}

impl RecordBuilder {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self, features: &[AssembledFeature]) -> Vec<String> {
        let tag_columns: BTreeSet<&str> = features
            .iter()
            .flat_map(|feature| feature.tags.keys())
            .map(String::as_str)
            .filter(|key| !self.excluded.contains(*key))
            .filter(|key| *key != ID_FIELD && *key != TIMESTAMP_FIELD)
            .collect();

        [ID_FIELD, TIMESTAMP_FIELD]
            .into_iter()
            .chain(tag_columns)
            .map(str::to_string)
            .collect()
    }

    /// Returns the column set and one record per feature, in input order.
    pub fn build(&self, features: Vec<AssembledFeature>) -> (Vec<String>, Vec<FeatureRecord>) {
        let columns = self.columns(&features);

        let records = features
            .into_iter()
            .map(|feature| {
                let id = feature.element.id.to_string();
                let timestamp = feature.timestamp.as_deref().and_then(parse_timestamp);

                let mut attributes: BTreeMap<String, String> = columns
                    .iter()
                    .map(|column| {
                        let value = feature.tags.get(column).cloned().unwrap_or_default();
                        (column.clone(), value)
                    })
                    .collect();
                attributes.insert(ID_FIELD.to_string(), id.clone());
                attributes.insert(
                    TIMESTAMP_FIELD.to_string(),
                    timestamp.as_ref().map(format_timestamp).unwrap_or_default(),
                );

                FeatureRecord {
                    id,
                    timestamp,
                    attributes,
                    geometry: feature.geometry,
                }
            })
            .collect();

        (columns, records)
    }
}

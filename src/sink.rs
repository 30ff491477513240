use crate::error::{GeometryError, SinkError};
use crate::geometry::{Coordinate, Geometry};
use crate::record_builder::{format_timestamp, FeatureRecord};
use crate::validation;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Destination for finished features.
///
/// `check_geometry` is the construction step run before a feature is
/// accepted; assembly rejects whatever it refuses.
pub trait GeometrySink {
    fn check_geometry(&self, geometry: &Geometry) -> Result<(), GeometryError> {
        validation::check_geometry(geometry)
    }

    fn accept_feature(
        &mut self,
        geometry: &Geometry,
        attributes: &BTreeMap<String, String>,
        id: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), SinkError>;
}

/// Hands records to `sink` in order. Returns how many were accepted.
pub fn emit_records<S>(sink: &mut S, records: &[FeatureRecord]) -> Result<usize, SinkError>
where
    S: GeometrySink + ?Sized,
{
    for record in records {
        sink.accept_feature(
            &record.geometry,
            &record.attributes,
            &record.id,
            record.timestamp,
        )?;
    }
    Ok(records.len())
}

/// Keeps every accepted feature in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<FeatureRecord>,
}

impl MemorySink {
    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FeatureRecord> {
        self.records
    }
}

impl GeometrySink for MemorySink {
    fn accept_feature(
        &mut self,
        geometry: &Geometry,
        attributes: &BTreeMap<String, String>,
        id: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), SinkError> {
        self.records.push(FeatureRecord {
            id: id.to_string(),
            timestamp,
            attributes: attributes.clone(),
            geometry: geometry.clone(),
        });
        Ok(())
    }
}

const WGS84_WKID: u32 = 4326;

fn path(coords: &[Coordinate]) -> Vec<[f64; 2]> {
    coords.iter().map(|coord| [coord.x, coord.y]).collect()
}

/// Esri JSON geometry in WGS84.
pub fn esri_geometry(geometry: &Geometry) -> Value {
    let spatial_reference = json!({ "wkid": WGS84_WKID });
    match geometry {
        Geometry::Point(coord) => json!({
            "x": coord.x,
            "y": coord.y,
            "spatialReference": spatial_reference,
        }),
        Geometry::Line(coords) => json!({
            "paths": [path(coords)],
            "spatialReference": spatial_reference,
        }),
        Geometry::Polygon(polygon) => {
            let rings: Vec<_> = polygon.rings().map(|(_, ring)| path(ring.coords())).collect();
            json!({
                "rings": rings,
                "spatialReference": spatial_reference,
            })
        }
    }
}

/// Writes one JSON object per feature and line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and hands the writer back.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> GeometrySink for JsonLinesSink<W> {
    fn accept_feature(
        &mut self,
        geometry: &Geometry,
        attributes: &BTreeMap<String, String>,
        id: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), SinkError> {
        let line = json!({
            "id": id,
            "timestamp": timestamp.as_ref().map(format_timestamp),
            "geometryType": geometry.kind(),
            "geometry": esri_geometry(geometry),
            "attributes": attributes,
        });

        serde_json::to_writer(&mut self.writer, &line).map_err(|source| SinkError::Serialize {
            id: id.to_string(),
            source,
        })?;
        self.writer
            .write_all(b"\n")
            .map_err(|source| SinkError::Write {
                id: id.to_string(),
                source,
            })?;

        self.written += 1;
        Ok(())
    }
}

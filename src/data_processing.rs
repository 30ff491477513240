use crate::config::{Category, GeometryType};
use crate::coordinate_system::geographic::LLBBox;
use crate::error::{BatchError, RejectReason, Rejection};
use crate::geometry::Geometry;
use crate::osm_parser::{
    parse_osm_data, ElementKind, ElementLookup, ElementRef, ParsedBatch, ProcessedElement,
    ProcessedNode, ProcessedWay,
};
use crate::polygon_assembly::{assemble_relation, assemble_way_polygon, AssemblyStage};
use crate::record_builder::{AssembledFeature, FeatureRecord, RecordBuilder};
use crate::retrieve_data::FeatureSource;
use crate::sink::GeometrySink;
use log::{info, warn};
use rayon::prelude::*;

/// Everything one category batch produced. Owned by the caller; nothing is
/// shared between batches.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOutput {
    pub category: String,
    pub geometry_type: GeometryType,
    pub columns: Vec<String>,
    pub records: Vec<FeatureRecord>,
    pub rejections: Vec<Rejection>,
}

fn point_geometry<S>(node: &ProcessedNode, sink: &S) -> Result<Geometry, Rejection>
where
    S: GeometrySink + ?Sized,
{
    let geometry = Geometry::Point(node.coordinate);
    sink.check_geometry(&geometry).map_err(|e| {
        Rejection::new(
            ElementRef::new(ElementKind::Node, node.id),
            AssemblyStage::Validating,
            e.into(),
        )
    })?;
    Ok(geometry)
}

fn line_geometry<L, S>(way: &ProcessedWay, lookup: &L, sink: &S) -> Result<Geometry, Rejection>
where
    L: ElementLookup + ?Sized,
    S: GeometrySink + ?Sized,
{
    let element = ElementRef::new(ElementKind::Way, way.id);
    let coords = lookup.way_coordinates(way).ok_or_else(|| {
        Rejection::new(
            element,
            AssemblyStage::CollectingMembers,
            RejectReason::Unresolved,
        )
    })?;

    let geometry = Geometry::Line(coords);
    sink.check_geometry(&geometry)
        .map_err(|e| Rejection::new(element, AssemblyStage::Validating, e.into()))?;
    Ok(geometry)
}

/// Geometry for `element` under `geometry_type`, or `None` when the element
/// does not belong to that type.
fn element_geometry<S>(
    geometry_type: GeometryType,
    element: &ProcessedElement,
    batch: &ParsedBatch,
    sink: &S,
) -> Option<Result<Geometry, Rejection>>
where
    S: GeometrySink + ?Sized,
{
    match (geometry_type, element) {
        (GeometryType::Point, ProcessedElement::Node(node)) => Some(point_geometry(node, sink)),
        (GeometryType::Line, ProcessedElement::Way(way)) if !way.is_closed() => {
            Some(line_geometry(way, &batch.index, sink))
        }
        (GeometryType::Polygon, ProcessedElement::Way(way)) if way.is_closed() => {
            Some(assemble_way_polygon(way, &batch.index, sink))
        }
        (GeometryType::Polygon, ProcessedElement::Relation(rel)) => {
            Some(assemble_relation(rel, &batch.index, sink))
        }
        _ => None,
    }
}

/// Assembles every element of `batch` matching `category`, in batch order.
/// Failed elements are logged and collected as rejections.
pub fn assemble_batch<S>(category: &Category, batch: &ParsedBatch, sink: &S) -> CategoryOutput
where
    S: GeometrySink + ?Sized,
{
    let mut features: Vec<AssembledFeature> = Vec::new();
    let mut rejections: Vec<Rejection> = Vec::new();

    for element in &batch.elements {
        if !category.geometry_type.accepts(element.kind()) || !category.matches(element.tags()) {
            continue;
        }

        match element_geometry(category.geometry_type, element, batch, sink) {
            Some(Ok(geometry)) => features.push(AssembledFeature {
                element: element.element_ref(),
                geometry,
                tags: element.tags().clone(),
                timestamp: element.timestamp().map(str::to_string),
            }),
            Some(Err(rejection)) => {
                warn!("{rejection}");
                rejections.push(rejection);
            }
            None => {}
        }
    }

    let builder = RecordBuilder::new(category.excluded_attributes.iter().cloned());
    let (columns, records) = builder.build(features);

    info!(
        "Category {}: {} {} features, {} rejected",
        category.name,
        records.len(),
        category.geometry_type,
        rejections.len()
    );

    CategoryOutput {
        category: category.name.clone(),
        geometry_type: category.geometry_type,
        columns,
        records,
        rejections,
    }
}

/// Fetches, parses and assembles one category.
pub fn process_category<F, S>(
    source: &F,
    category: &Category,
    bbox: &LLBBox,
    sink: &S,
) -> Result<CategoryOutput, BatchError>
where
    F: FeatureSource + ?Sized,
    S: GeometrySink + ?Sized,
{
    let data = source
        .fetch_category(category, bbox)
        .map_err(|source| BatchError {
            category: category.name.clone(),
            source,
        })?;

    let batch = parse_osm_data(data);
    Ok(assemble_batch(category, &batch, sink))
}

/// Processes categories on the rayon pool. Outputs come back in the order
/// of `categories`; the first fetch failure aborts the run.
pub fn run_categories<F, S>(
    source: &F,
    categories: &[Category],
    bbox: &LLBBox,
    sink: &S,
) -> Result<Vec<CategoryOutput>, BatchError>
where
    F: FeatureSource + ?Sized,
    S: GeometrySink + Sync + ?Sized,
{
    categories
        .par_iter()
        .map(|category| process_category(source, category, bbox, sink))
        .collect()
}

use crate::coordinate_system::geographic::LLPoint;
use crate::geometry::Coordinate;
use fnv::FnvHashSet;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

// Raw data from Overpass

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmMember {
    pub r#type: String,
    pub r#ref: u64,
    #[serde(default)]
    pub role: String,
    /// Inline member geometry from `out geom`; entries are null for nodes the
    /// server left out.
    pub geometry: Option<Vec<Option<LatLon>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmElement {
    pub r#type: String,
    pub id: u64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub nodes: Option<Vec<u64>>,
    pub geometry: Option<Vec<Option<LatLon>>>,
    pub tags: Option<HashMap<String, String>>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub members: Vec<OsmMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsmData {
    #[serde(default)]
    pub elements: Vec<OsmElement>,
    #[serde(default)]
    pub remark: Option<String>,
}

impl OsmData {
    /// Appends another response, keeping element order.
    pub fn extend(&mut self, other: OsmData) {
        self.elements.extend(other.elements);
        if self.remark.is_none() {
            self.remark = other.remark;
        }
    }
}

struct SplitOsmData {
    pub nodes: Vec<OsmElement>,
    pub ways: Vec<OsmElement>,
    pub relations: Vec<OsmElement>,
    pub others: Vec<OsmElement>,
}

impl SplitOsmData {
    fn total_count(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len() + self.others.len()
    }

    fn from_raw_osm_data(osm_data: OsmData) -> Self {
        let mut nodes = Vec::new();
        let mut ways = Vec::new();
        let mut relations = Vec::new();
        let mut others = Vec::new();
        for element in osm_data.elements {
            match ElementKind::from_osm(&element.r#type) {
                Some(ElementKind::Node) => nodes.push(element),
                Some(ElementKind::Way) => ways.push(element),
                Some(ElementKind::Relation) => relations.push(element),
                None => others.push(element),
            }
        }
        SplitOsmData {
            nodes,
            ways,
            relations,
            others,
        }
    }
}

fn to_coordinate(lat: f64, lon: f64) -> Option<Coordinate> {
    LLPoint::new(lat, lon).ok().map(|point| point.coordinate())
}

/// All-or-nothing conversion of an inline geometry list.
fn inline_geometry(geometry: &Option<Vec<Option<LatLon>>>) -> Option<Vec<Coordinate>> {
    geometry
        .as_ref()?
        .iter()
        .map(|point| point.and_then(|p| to_coordinate(p.lat, p.lon)))
        .collect()
}

// End raw data

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn from_osm(kind: &str) -> Option<Self> {
        match kind {
            "node" => Some(ElementKind::Node),
            "way" => Some(ElementKind::Way),
            "relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind and id of a source element, used to attribute rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: u64,
}

impl ElementRef {
    pub fn new(kind: ElementKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

// Normalized data that we can use

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedNode {
    pub id: u64,
    pub coordinate: Coordinate,
    pub tags: HashMap<String, String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedWay {
    pub id: u64,
    pub node_ids: Vec<u64>,
    /// Inline geometry when the response carried a complete one.
    pub geometry: Option<Vec<Coordinate>>,
    pub tags: HashMap<String, String>,
    pub timestamp: Option<String>,
}

impl ProcessedWay {
    /// A way is closed when its first node id is its last one.
    pub fn is_closed(&self) -> bool {
        if self.node_ids.len() > 1 {
            return self.node_ids.first() == self.node_ids.last();
        }
        match &self.geometry {
            Some(coords) if coords.len() > 1 => coords.first() == coords.last(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMember {
    pub kind: ElementKind,
    pub ref_id: u64,
    pub role: String,
    pub geometry: Option<Vec<Coordinate>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRelation {
    pub id: u64,
    pub members: Vec<ProcessedMember>,
    pub tags: HashMap<String, String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedElement {
    Node(ProcessedNode),
    Way(ProcessedWay),
    Relation(ProcessedRelation),
}

impl ProcessedElement {
    pub fn tags(&self) -> &HashMap<String, String> {
        match self {
            ProcessedElement::Node(n) => &n.tags,
            ProcessedElement::Way(w) => &w.tags,
            ProcessedElement::Relation(r) => &r.tags,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            ProcessedElement::Node(n) => n.id,
            ProcessedElement::Way(w) => w.id,
            ProcessedElement::Relation(r) => r.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ProcessedElement::Node(_) => ElementKind::Node,
            ProcessedElement::Way(_) => ElementKind::Way,
            ProcessedElement::Relation(_) => ElementKind::Relation,
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            ProcessedElement::Node(n) => n.timestamp.as_deref(),
            ProcessedElement::Way(w) => w.timestamp.as_deref(),
            ProcessedElement::Relation(r) => r.timestamp.as_deref(),
        }
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef::new(self.kind(), self.id())
    }
}

/// Resolves member references within one batch. Absent ids yield `None`.
pub trait ElementLookup {
    fn node(&self, id: u64) -> Option<&ProcessedNode>;

    fn way(&self, id: u64) -> Option<&ProcessedWay>;

    /// Inline geometry if present, otherwise every node looked up in order.
    fn way_coordinates(&self, way: &ProcessedWay) -> Option<Vec<Coordinate>> {
        if let Some(coords) = &way.geometry {
            return Some(coords.clone());
        }
        if way.node_ids.is_empty() {
            return None;
        }
        way.node_ids
            .iter()
            .map(|&id| self.node(id).map(|node| node.coordinate))
            .collect()
    }
}

/// Every node and way of a batch, tagged or not, by id.
#[derive(Debug, Clone, Default)]
pub struct ElementIndex {
    nodes: HashMap<u64, ProcessedNode>,
    ways: HashMap<u64, ProcessedWay>,
}

impl ElementIndex {
    pub fn insert_node(&mut self, node: ProcessedNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn insert_way(&mut self, way: ProcessedWay) {
        self.ways.insert(way.id, way);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }
}

impl ElementLookup for ElementIndex {
    fn node(&self, id: u64) -> Option<&ProcessedNode> {
        self.nodes.get(&id)
    }

    fn way(&self, id: u64) -> Option<&ProcessedWay> {
        self.ways.get(&id)
    }
}

/// Elements of one category query in response order, plus the lookup index
/// used to resolve their references.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub elements: Vec<ProcessedElement>,
    pub index: ElementIndex,
}

pub fn parse_osm_data(data: OsmData) -> ParsedBatch {
    let data = SplitOsmData::from_raw_osm_data(data);
    debug!(
        "Parsing {} elements ({} nodes, {} ways, {} relations)",
        data.total_count(),
        data.nodes.len(),
        data.ways.len(),
        data.relations.len()
    );
    if !data.others.is_empty() {
        debug!("Ignoring {} elements of unknown type", data.others.len());
    }

    let mut index = ElementIndex::default();
    let mut processed_elements: Vec<ProcessedElement> = Vec::new();
    // Concatenated responses repeat elements; the first copy wins.
    let mut seen: FnvHashSet<ElementRef> = FnvHashSet::default();

    // First pass: index all nodes and keep the tagged ones
    for element in data.nodes {
        let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
            warn!("Skipping node {} without coordinates", element.id);
            continue;
        };
        let coordinate = match LLPoint::new(lat, lon) {
            Ok(point) => point.coordinate(),
            Err(e) => {
                warn!("Skipping node {}: {e}", element.id);
                continue;
            }
        };

        let processed = ProcessedNode {
            id: element.id,
            coordinate,
            tags: element.tags.unwrap_or_default(),
            timestamp: element.timestamp,
        };

        let tagged = !processed.tags.is_empty();
        if tagged && seen.insert(ElementRef::new(ElementKind::Node, processed.id)) {
            processed_elements.push(ProcessedElement::Node(processed.clone()));
        }
        index.insert_node(processed);
    }

    // Second pass: ways
    for element in data.ways {
        let processed = ProcessedWay {
            id: element.id,
            node_ids: element.nodes.unwrap_or_default(),
            geometry: inline_geometry(&element.geometry),
            tags: element.tags.unwrap_or_default(),
            timestamp: element.timestamp,
        };

        let has_shape = !processed.node_ids.is_empty() || processed.geometry.is_some();
        if has_shape && seen.insert(ElementRef::new(ElementKind::Way, processed.id)) {
            processed_elements.push(ProcessedElement::Way(processed.clone()));
        }
        index.insert_way(processed);
    }

    // Third pass: relations
    for element in data.relations {
        if !seen.insert(ElementRef::new(ElementKind::Relation, element.id)) {
            continue;
        }

        let members: Vec<ProcessedMember> = element
            .members
            .iter()
            .filter_map(|mem: &OsmMember| {
                let Some(kind) = ElementKind::from_osm(&mem.r#type) else {
                    warn!(
                        "Relation {}: unknown member type \"{}\"",
                        element.id, mem.r#type
                    );
                    return None;
                };

                Some(ProcessedMember {
                    kind,
                    ref_id: mem.r#ref,
                    role: mem.role.clone(),
                    geometry: inline_geometry(&mem.geometry),
                })
            })
            .collect();

        processed_elements.push(ProcessedElement::Relation(ProcessedRelation {
            id: element.id,
            members,
            tags: element.tags.unwrap_or_default(),
            timestamp: element.timestamp,
        }));
    }

    ParsedBatch {
        elements: processed_elements,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::{c, load_fixture};

    #[test]
    fn test_parse_fixture() {
        let batch = parse_osm_data(load_fixture("multipolygon.json"));

        let refs: Vec<String> = batch
            .elements
            .iter()
            .map(|element| element.element_ref().to_string())
            .collect();
        assert_eq!(
            refs,
            vec![
                "node 700",
                "way 500",
                "way 600",
                "way 11",
                "way 12",
                "way 13",
                "relation 100",
                "relation 200",
                "relation 300",
                "relation 400",
            ]
        );

        // untagged nodes are indexed but not emitted
        assert_eq!(batch.index.node_count(), 5);
        assert_eq!(batch.index.way_count(), 5);
    }

    #[test]
    fn test_lookup_resolves_way_through_nodes() {
        let batch = parse_osm_data(load_fixture("multipolygon.json"));
        let way = batch.index.way(12).unwrap();
        assert!(way.geometry.is_none());
        assert_eq!(
            batch.index.way_coordinates(way),
            Some(vec![c(2., 50.), c(2., 51.), c(3., 51.)])
        );
        assert!(batch.index.way(99).is_none());
        assert!(batch.index.node(99).is_none());
    }

    #[test]
    fn test_missing_node_leaves_way_unresolved() {
        let way = ProcessedWay {
            id: 1,
            node_ids: vec![1, 2],
            geometry: None,
            tags: HashMap::new(),
            timestamp: None,
        };
        assert_eq!(ElementIndex::default().way_coordinates(&way), None);
    }

    #[test]
    fn test_inline_geometry_with_gap_is_dropped() {
        let json = r#"{"elements": [
            {"type": "relation", "id": 1, "tags": {"building": "yes"}, "members": [
                {"type": "way", "ref": 5, "role": "outer",
                 "geometry": [{"lat": 1.0, "lon": 2.0}, null]},
                {"type": "way", "ref": 6, "role": "outer",
                 "geometry": [{"lat": 1.0, "lon": 2.0}, {"lat": 1.5, "lon": 2.5}]},
                {"type": "area", "ref": 7, "role": "outer"}
            ]}
        ]}"#;
        let data: OsmData = serde_json::from_str(json).unwrap();
        let batch = parse_osm_data(data);

        let ProcessedElement::Relation(relation) = &batch.elements[0] else {
            panic!("expected a relation");
        };
        assert_eq!(relation.members.len(), 2);
        assert_eq!(relation.members[0].geometry, None);
        assert_eq!(
            relation.members[1].geometry,
            Some(vec![c(2.0, 1.0), c(2.5, 1.5)])
        );
    }

    #[test]
    fn test_duplicate_elements_kept_once() {
        let json = r#"{"elements": [
            {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "cafe"}},
            {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "cafe"}},
            {"type": "node", "id": 2, "lat": 95.0, "lon": 1.0, "tags": {"amenity": "bar"}}
        ]}"#;
        let batch = parse_osm_data(serde_json::from_str(json).unwrap());
        assert_eq!(batch.elements.len(), 1);
        assert_eq!(batch.index.node_count(), 1);
    }

    #[test]
    fn test_way_closure_by_node_ids() {
        let mut way = ProcessedWay {
            id: 1,
            node_ids: vec![1, 2, 3, 1],
            geometry: None,
            tags: HashMap::new(),
            timestamp: None,
        };
        assert!(way.is_closed());

        way.node_ids = vec![1, 2, 3];
        assert!(!way.is_closed());
    }
}

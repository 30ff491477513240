use crate::config::{Category, GeometryType, OverpassConfig, DEFAULT_ENDPOINTS};
use crate::coordinate_system::geographic::LLBBox;
use crate::error::FetchError;
use crate::osm_parser::{ElementKind, OsmData};
use log::{debug, info};
use rand::seq::SliceRandom;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Recursion and output clause shared by every category query.
const OUTPUT: &str = "(._;>;);out meta geom qt;";

/// Supplies the raw elements of one category inside a bounding box.
pub trait FeatureSource: Sync {
    fn fetch_category(&self, category: &Category, bbox: &LLBBox) -> Result<OsmData, FetchError>;
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Overpass QL for one element type of a category.
pub fn build_query(
    kind: ElementKind,
    category: &Category,
    bbox: &LLBBox,
    timeout_secs: u64,
) -> String {
    let key = escape(&category.name.to_lowercase());
    let filter = if category.values.is_empty() {
        format!(r#"["{key}"]"#)
    } else {
        let values: Vec<String> = category
            .values
            .iter()
            .map(|value| escape(&value.to_lowercase()))
            .collect();
        format!(r#"["{key}"~"{}"]"#, values.join("|"))
    };

    format!(
        "[out:json][timeout:{timeout_secs}];{kind}{filter}{};{OUTPUT}",
        bbox.to_overpass()
    )
}

/// Element types queried for a geometry type, in query order.
pub fn query_kinds(geometry_type: GeometryType) -> &'static [ElementKind] {
    match geometry_type {
        GeometryType::Point => &[ElementKind::Node],
        GeometryType::Line => &[ElementKind::Way],
        GeometryType::Polygon => &[ElementKind::Way, ElementKind::Relation],
    }
}

fn ensure_not_empty(data: OsmData) -> Result<OsmData, FetchError> {
    if data.elements.is_empty() {
        return Err(FetchError::EmptyResult {
            remark: data.remark,
        });
    }
    Ok(data)
}

/// Public Overpass API servers.
pub struct OverpassSource {
    client: Client,
    endpoints: Vec<String>,
    timeout_secs: u64,
}

impl OverpassSource {
    pub fn new(config: &OverpassConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn pick_endpoint(&self) -> &str {
        self.endpoints
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_ENDPOINTS[0])
    }

    fn download(&self, endpoint: &str, query: &str) -> Result<OsmData, FetchError> {
        debug!("Querying {endpoint}: {query}");

        let response = self
            .client
            .get(endpoint)
            .query(&[("data", query)])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        endpoint: endpoint.to_string(),
                    }
                } else {
                    FetchError::Unreachable {
                        endpoint: endpoint.to_string(),
                        source: e,
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().map_err(|e| FetchError::Unreachable {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl FeatureSource for OverpassSource {
    fn fetch_category(&self, category: &Category, bbox: &LLBBox) -> Result<OsmData, FetchError> {
        let mut data = OsmData::default();

        for &kind in query_kinds(category.geometry_type) {
            let endpoint = self.pick_endpoint();
            let query = build_query(kind, category, bbox, self.timeout_secs);
            info!("Fetching {kind}s for category {} from {endpoint}", category.name);
            data.extend(self.download(endpoint, &query)?);
        }

        ensure_not_empty(data)
    }
}

/// A saved Overpass JSON response, used for offline runs.
///
/// The whole document is returned for every category; category filtering
/// happens during assembly.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn fetch_data_from_file(path: &Path) -> Result<OsmData, FetchError> {
    let io_error = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let reader = BufReader::new(file);
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let data = OsmData::deserialize(&mut deserializer)?;
    Ok(data)
}

impl FeatureSource for FileSource {
    fn fetch_category(&self, category: &Category, _bbox: &LLBBox) -> Result<OsmData, FetchError> {
        info!(
            "Loading category {} from {}",
            category.name,
            self.path.display()
        );
        ensure_not_empty(fetch_data_from_file(&self.path)?)
    }
}

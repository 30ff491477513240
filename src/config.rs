//! `osmconfig.json`: bounding box, Overpass settings and feature categories.

use crate::coordinate_system::geographic::{LLBBox, MAX_AREA_SQ_DEGREES};
use crate::error::ConfigError;
use crate::osm_parser::ElementKind;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "osmconfig.json";

/// List of Overpass API servers
pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://overpass-api.de/api/interpreter",
    "https://lz4.overpass-api.de/api/interpreter",
    "https://z.overpass-api.de/api/interpreter",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 360;

// Raw file layout

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn value(&self, field: &str) -> Result<f64, ConfigError> {
        match self {
            NumberOrString::Number(value) => Ok(*value),
            NumberOrString::Text(text) => text.trim().parse().map_err(|_| {
                ConfigError::InvalidBoundingBox(format!("{field} is not a number: {text:?}"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundingBox {
    min_lat_init: NumberOrString,
    min_lon_init: NumberOrString,
    max_lat_init: NumberOrString,
    max_lon_init: NumberOrString,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOverpass {
    #[serde(default)]
    endpoints: Vec<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    category_name: String,
    #[serde(default)]
    category_values: Vec<String>,
    geometry_type: String,
    is_enabled: Flag,
    #[serde(default)]
    attribute_fields_to_exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    bounding_box: RawBoundingBox,
    #[serde(default)]
    overpass: RawOverpass,
    categories: Vec<RawCategory>,
}

// Validated configuration

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    Line,
    Polygon,
}

impl GeometryType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "point" => Some(GeometryType::Point),
            "line" => Some(GeometryType::Line),
            "polygon" => Some(GeometryType::Polygon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "point",
            GeometryType::Line => "line",
            GeometryType::Polygon => "polygon",
        }
    }

    /// Whether elements of `kind` can yield this geometry type.
    pub fn accepts(&self, kind: ElementKind) -> bool {
        matches!(
            (self, kind),
            (GeometryType::Point, ElementKind::Node)
                | (GeometryType::Line, ElementKind::Way)
                | (GeometryType::Polygon, ElementKind::Way | ElementKind::Relation)
        )
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OSM tag key to extract, optionally narrowed to a set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub values: Vec<String>,
    pub geometry_type: GeometryType,
    pub enabled: bool,
    pub excluded_attributes: Vec<String>,
}

impl Category {
    /// Tag key present and, when values are configured, its value among
    /// them. Values compare case-insensitively.
    pub fn matches(&self, tags: &HashMap<String, String>) -> bool {
        let Some(value) = tags.get(&self.name) else {
            return false;
        };
        self.values.is_empty()
            || self
                .values
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverpassConfig {
    pub endpoints: Vec<String>,
    pub timeout: Duration,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bbox: LLBBox,
    pub categories: Vec<Category>,
    pub overpass: OverpassConfig,
}

fn has_quotes(value: &str) -> bool {
    value.contains(['"', '\''])
}

/// Checks the bounds and the extent the public servers accept.
pub fn validate_bbox(bbox: LLBBox) -> Result<LLBBox, ConfigError> {
    let area = bbox.area_sq_degrees();
    if area > MAX_AREA_SQ_DEGREES {
        return Err(ConfigError::InvalidBoundingBox(format!(
            "area of {area:.3} square degrees exceeds the limit of {MAX_AREA_SQ_DEGREES}"
        )));
    }
    Ok(bbox)
}

fn parse_bbox(raw: &RawBoundingBox) -> Result<LLBBox, ConfigError> {
    let bbox = LLBBox::new(
        raw.min_lat_init.value("minLatInit")?,
        raw.min_lon_init.value("minLonInit")?,
        raw.max_lat_init.value("maxLatInit")?,
        raw.max_lon_init.value("maxLonInit")?,
    )
    .map_err(ConfigError::InvalidBoundingBox)?;
    validate_bbox(bbox)
}

fn parse_category(raw: RawCategory) -> Result<Category, ConfigError> {
    let name = raw.category_name.trim().to_lowercase();
    if name.is_empty() || has_quotes(&name) {
        return Err(ConfigError::InvalidCategory(raw.category_name));
    }

    if let Some(value) = raw
        .category_values
        .iter()
        .find(|value| value.trim().is_empty() || has_quotes(value))
    {
        return Err(ConfigError::InvalidCategoryValue {
            category: name,
            value: value.clone(),
        });
    }

    if let Some(attribute) = raw
        .attribute_fields_to_exclude
        .iter()
        .find(|attribute| attribute.trim().is_empty())
    {
        return Err(ConfigError::InvalidExclude {
            category: name,
            attribute: attribute.clone(),
        });
    }

    let Some(geometry_type) = GeometryType::parse(&raw.geometry_type) else {
        return Err(ConfigError::InvalidGeometryType {
            category: name,
            value: raw.geometry_type,
        });
    };

    let enabled = match raw.is_enabled {
        Flag::Bool(enabled) => enabled,
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => true,
            "no" | "false" => false,
            _ => {
                return Err(ConfigError::InvalidFlag {
                    category: name,
                    value: text,
                })
            }
        },
    };

    Ok(Category {
        name,
        values: raw.category_values,
        geometry_type,
        enabled,
        excluded_attributes: raw.attribute_fields_to_exclude,
    })
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let bbox = parse_bbox(&raw.bounding_box)?;
        let categories = raw
            .categories
            .into_iter()
            .map(parse_category)
            .collect::<Result<Vec<_>, _>>()?;
        if !categories.iter().any(|category| category.enabled) {
            return Err(ConfigError::NoEnabledCategory);
        }

        let mut overpass = OverpassConfig::default();
        if !raw.overpass.endpoints.is_empty() {
            overpass.endpoints = raw.overpass.endpoints;
        }
        if let Some(secs) = raw.overpass.timeout_secs {
            overpass.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            bbox,
            categories,
            overpass,
        })
    }

    /// Enabled categories in file order.
    pub fn enabled_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|category| category.enabled)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "boundingBox": {"minLatInit": 52.5, "minLonInit": "13.3", "maxLatInit": "52.6", "maxLonInit": 13.4},
        "categories": [
            {"categoryName": "building", "categoryValues": ["yes", "house"], "geometryType": "polygon",
             "isEnabled": "yes", "attributeFieldsToExclude": ["source"]},
            {"categoryName": "highway", "categoryValues": [], "geometryType": "line",
             "isEnabled": "no", "attributeFieldsToExclude": []},
            {"categoryName": "amenity", "geometryType": "Point", "isEnabled": true}
        ]
    }"#;

    fn with_category(category: &str) -> String {
        format!(
            r#"{{"boundingBox": {{"minLatInit": 1, "minLonInit": 1, "maxLatInit": 1.5, "maxLonInit": 1.5}},
                "categories": [{category}]}}"#
        )
    }

    #[test]
    fn test_load_valid() {
        let config = Config::from_json_str(VALID).unwrap();
        assert_eq!(config.bbox, LLBBox::new(52.5, 13.3, 52.6, 13.4).unwrap());
        assert_eq!(config.categories.len(), 3);
        assert_eq!(config.overpass, OverpassConfig::default());

        let enabled: Vec<String> = config
            .enabled_categories()
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(enabled, vec!["building", "amenity"]);

        assert_eq!(config.categories[0].geometry_type, GeometryType::Polygon);
        assert_eq!(config.categories[0].excluded_attributes, vec!["source"]);
        assert_eq!(config.categories[2].geometry_type, GeometryType::Point);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        assert!(Config::load(file.path()).is_ok());

        let err = Config::load(Path::new("missing/osmconfig.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_overpass_overrides() {
        let json = r#"{
            "boundingBox": {"minLatInit": 1, "minLonInit": 1, "maxLatInit": 1.5, "maxLonInit": 1.5},
            "overpass": {"endpoints": ["http://localhost:12345/api/interpreter"], "timeoutSecs": 30},
            "categories": [{"categoryName": "shop", "geometryType": "point", "isEnabled": "yes"}]
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(
            config.overpass.endpoints,
            vec!["http://localhost:12345/api/interpreter"]
        );
        assert_eq!(config.overpass.timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case::inverted(r#"{"minLatInit": 2, "minLonInit": 1, "maxLatInit": 1, "maxLonInit": 2}"#)]
    #[case::out_of_range(r#"{"minLatInit": 1, "minLonInit": 179, "maxLatInit": 1.5, "maxLonInit": 181}"#)]
    #[case::too_large(r#"{"minLatInit": 0, "minLonInit": 0, "maxLatInit": 2, "maxLonInit": 2}"#)]
    #[case::not_a_number(r#"{"minLatInit": "north", "minLonInit": 0, "maxLatInit": 1, "maxLonInit": 1}"#)]
    fn test_invalid_bbox(#[case] bbox: &str) {
        let json = format!(
            r#"{{"boundingBox": {bbox},
                "categories": [{{"categoryName": "shop", "geometryType": "point", "isEnabled": "yes"}}]}}"#
        );
        let err = Config::from_json_str(&json).unwrap_err();
        assert_eq!(err.code(), Some(1001), "{err}");
    }

    #[rstest]
    #[case::empty_name(r#"{"categoryName": " ", "geometryType": "point", "isEnabled": "yes"}"#, 1002)]
    #[case::quoted_name(r#"{"categoryName": "sh\"op", "geometryType": "point", "isEnabled": "yes"}"#, 1002)]
    #[case::empty_exclude(r#"{"categoryName": "shop", "geometryType": "point", "isEnabled": "yes", "attributeFieldsToExclude": [""]}"#, 1003)]
    #[case::empty_value(r#"{"categoryName": "shop", "categoryValues": [""], "geometryType": "point", "isEnabled": "yes"}"#, 1004)]
    #[case::quoted_value(r#"{"categoryName": "shop", "categoryValues": ["a'b"], "geometryType": "point", "isEnabled": "yes"}"#, 1004)]
    #[case::geometry_type(r#"{"categoryName": "shop", "geometryType": "area", "isEnabled": "yes"}"#, 1005)]
    fn test_invalid_category(#[case] category: &str, #[case] code: u16) {
        let err = Config::from_json_str(&with_category(category)).unwrap_err();
        assert_eq!(err.code(), Some(code), "{err}");
    }

    #[test]
    fn test_no_enabled_category() {
        let json = with_category(r#"{"categoryName": "shop", "geometryType": "point", "isEnabled": "no"}"#);
        assert!(matches!(
            Config::from_json_str(&json),
            Err(ConfigError::NoEnabledCategory)
        ));
    }

    #[test]
    fn test_invalid_flag() {
        let json = with_category(r#"{"categoryName": "shop", "geometryType": "point", "isEnabled": "maybe"}"#);
        assert!(matches!(
            Config::from_json_str(&json),
            Err(ConfigError::InvalidFlag { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Config::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_category_matches() {
        let category = Category {
            name: "building".to_string(),
            values: vec!["Yes".to_string(), "house".to_string()],
            geometry_type: GeometryType::Polygon,
            enabled: true,
            excluded_attributes: vec![],
        };
        let tags = |k: &str, v: &str| HashMap::from([(k.to_string(), v.to_string())]);

        assert!(category.matches(&tags("building", "yes")));
        assert!(category.matches(&tags("building", "HOUSE")));
        assert!(!category.matches(&tags("building", "garage")));
        assert!(!category.matches(&tags("amenity", "yes")));

        let any_value = Category {
            values: vec![],
            ..category
        };
        assert!(any_value.matches(&tags("building", "garage")));
    }

    #[test]
    fn test_geometry_type_accepts() {
        assert!(GeometryType::Point.accepts(ElementKind::Node));
        assert!(!GeometryType::Point.accepts(ElementKind::Way));
        assert!(GeometryType::Line.accepts(ElementKind::Way));
        assert!(GeometryType::Polygon.accepts(ElementKind::Relation));
        assert!(!GeometryType::Polygon.accepts(ElementKind::Node));
    }
}

use crate::point::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column holding the place name in the canonical location table.
pub const NAME: &str = "name";
/// Column holding the first-level administrative division name.
pub const ADMIN1: &str = "admin1";
/// Column holding the second-level administrative division name.
pub const ADMIN2: &str = "admin2";
/// Column holding the ISO 3166-1 alpha-2 country code.
pub const COUNTRY_CODE: &str = "cc";

/// A known place: a coordinate plus free-form descriptive attributes.
///
/// The canonical gazetteer table carries `name`, `admin1`, `admin2` and `cc`
/// columns, but any string-keyed attributes are accepted so that custom
/// tables can flow through unchanged. Attributes are kept in a sorted map,
/// so serialization and equality do not depend on insertion order.
///
/// # Examples
///
/// ```
/// use revgeo_types::record::LocationRecord;
///
/// let record = LocationRecord::new(41.85003, -87.65005)
///     .with_attribute("name", "Chicago")
///     .with_attribute("admin1", "Illinois")
///     .with_attribute("admin2", "Cook County")
///     .with_attribute("cc", "US");
///
/// assert_eq!(record.admin1(), Some("Illinois"));
/// assert_eq!(record.attribute("population"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Descriptive fields keyed by column name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl LocationRecord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            attributes: BTreeMap::new(),
        }
    }

    /// Add or replace a descriptive attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute(NAME)
    }

    pub fn admin1(&self) -> Option<&str> {
        self.attribute(ADMIN1)
    }

    pub fn admin2(&self) -> Option<&str> {
        self.attribute(ADMIN2)
    }

    pub fn country_code(&self) -> Option<&str> {
        self.attribute(COUNTRY_CODE)
    }
}

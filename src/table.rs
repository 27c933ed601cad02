//! Tabular ingestion of location records.
//!
//! A `RecordTable` is the hand-off point from whatever reads the gazetteer
//! (a CSV reader, a database cursor, a test fixture) into the geocoder: a
//! header plus rows of strings. Converting it to records checks the schema
//! and parses coordinates, so any problem aborts the build before an index
//! exists.

use crate::compute::validation::parse_degrees;
use crate::error::{GeocodeError, Result};
use revgeo_types::record::LocationRecord;
use rustc_hash::FxHashMap;

/// Default latitude column of the canonical table.
pub const LAT_COLUMN: &str = "lat";
/// Default longitude column of the canonical table.
pub const LON_COLUMN: &str = "lon";

/// Columns of the canonical location table, in order.
pub const CANONICAL_COLUMNS: [&str; 6] = ["lat", "lon", "name", "admin1", "admin2", "cc"];

/// An ordered table of string rows under a shared header.
///
/// # Examples
///
/// ```
/// use revgeo::RecordTable;
///
/// let mut table = RecordTable::new(["lat", "lon", "name", "cc"]);
/// table.push_row(["40.71427", "-74.00597", "New York City", "US"]);
/// table.push_row(["51.50853", "-0.12574", "London", "GB"]);
///
/// let records = table.into_records().unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].name(), Some("London"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    lat_column: String,
    lon_column: String,
    expected_columns: Option<Vec<String>>,
}

impl RecordTable {
    /// Create an empty table with the given header.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            lat_column: LAT_COLUMN.to_string(),
            lon_column: LON_COLUMN.to_string(),
            expected_columns: None,
        }
    }

    /// Create an empty table with the canonical header.
    pub fn canonical() -> Self {
        Self::new(CANONICAL_COLUMNS)
    }

    /// Use different column names for latitude and longitude.
    pub fn with_coordinate_columns(
        mut self,
        lat: impl Into<String>,
        lon: impl Into<String>,
    ) -> Self {
        self.lat_column = lat.into();
        self.lon_column = lon.into();
        self
    }

    /// Require the header to match `columns` exactly.
    pub fn with_expected_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Append the rows of `other`, which must carry an identical header.
    ///
    /// The header is kept once; rows keep their relative order, `self`
    /// first.
    pub fn append(&mut self, other: RecordTable) -> Result<()> {
        if self.header != other.header {
            return Err(GeocodeError::SchemaMismatch(format!(
                "cannot append table with a different header. Expected header = {:?}, found = {:?}",
                self.header, other.header
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check the header against the coordinate and expected columns.
    ///
    /// Returns the positions of the latitude and longitude columns.
    pub fn check_schema(&self) -> Result<(usize, usize)> {
        if let Some(expected) = &self.expected_columns
            && expected != &self.header
        {
            return Err(GeocodeError::SchemaMismatch(format!(
                "input must have a header containing the following columns - {}. Found header - {}",
                expected.join(","),
                self.header.join(",")
            )));
        }

        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
        for (idx, column) in self.header.iter().enumerate() {
            if positions.insert(column.as_str(), idx).is_some() {
                return Err(GeocodeError::SchemaMismatch(format!(
                    "duplicate column {:?} in header",
                    column
                )));
            }
        }

        let locate = |column: &str| {
            positions.get(column).copied().ok_or_else(|| {
                GeocodeError::SchemaMismatch(format!(
                    "missing required coordinate column {:?}. Found header - {}",
                    column,
                    self.header.join(",")
                ))
            })
        };

        Ok((
            locate(self.lat_column.as_str())?,
            locate(self.lon_column.as_str())?,
        ))
    }

    /// Convert every row into a [`LocationRecord`], in row order.
    ///
    /// Non-coordinate columns become record attributes. The first schema or
    /// parse problem aborts the conversion.
    pub fn into_records(self) -> Result<Vec<LocationRecord>> {
        let (lat_idx, lon_idx) = self.check_schema()?;
        let width = self.header.len();

        let mut records = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(GeocodeError::SchemaMismatch(format!(
                    "row {} has {} fields, header has {}",
                    row_idx,
                    row.len(),
                    width
                )));
            }

            let lat_field = format!("{} (row {})", self.lat_column, row_idx);
            let lon_field = format!("{} (row {})", self.lon_column, row_idx);
            let lat = parse_degrees(&lat_field, &row[lat_idx])?;
            let lon = parse_degrees(&lon_field, &row[lon_idx])?;

            let mut record = LocationRecord::new(lat, lon);
            for (idx, value) in row.into_iter().enumerate() {
                if idx != lat_idx && idx != lon_idx {
                    record.attributes.insert(self.header[idx].clone(), value);
                }
            }
            records.push(record);
        }

        Ok(records)
    }
}

//! Geocoder builder for flexible configuration
//!
//! This module provides a builder pattern for creating geocoders from
//! records or tables, with optional snapshot caching of the built index.

use crate::config::{Config, QueryMode};
use crate::error::Result;
use crate::geocoder::Geocoder;
use crate::table::RecordTable;
use revgeo_types::record::LocationRecord;
#[cfg(feature = "snapshot")]
use std::path::PathBuf;

/// Builder for geocoder configuration and input data.
#[derive(Debug)]
pub struct GeocoderBuilder {
    records: Vec<LocationRecord>,
    tables: Vec<RecordTable>,
    #[cfg(feature = "snapshot")]
    snapshot_path: Option<PathBuf>,
    config: Config,
}

impl GeocoderBuilder {
    /// Create a new builder with no records and default configuration.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            tables: Vec::new(),
            #[cfg(feature = "snapshot")]
            snapshot_path: None,
            config: Config::default(),
        }
    }

    /// Add records to index. Repeated calls append in call order.
    pub fn records(mut self, records: impl IntoIterator<Item = LocationRecord>) -> Self {
        self.records.extend(records);
        self
    }

    /// Add a table whose rows are indexed after any records added directly.
    pub fn table(mut self, table: RecordTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the worker count. Zero is rejected when the geocoder is built.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the k-d tree leaf size. Zero is rejected when the geocoder is built.
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.config.leaf_size = leaf_size;
        self
    }

    /// Cache the built index at `path`.
    ///
    /// If the file exists, the geocoder is restored from it and any records
    /// given to this builder are ignored. Otherwise the index is built from
    /// the records and the snapshot is written.
    #[cfg(feature = "snapshot")]
    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Build the geocoder.
    pub fn build(self) -> Result<Geocoder> {
        #[cfg(feature = "snapshot")]
        if let Some(path) = &self.snapshot_path
            && path.exists()
        {
            log::debug!("Loading geocoder snapshot from {}", path.display());
            return Geocoder::load_snapshot(path, self.config);
        }

        let mut records = self.records;
        for table in self.tables {
            records.extend(table.into_records()?);
        }

        let geocoder = Geocoder::new(records, self.config)?;

        #[cfg(feature = "snapshot")]
        if let Some(path) = &self.snapshot_path {
            geocoder.save_snapshot(path)?;
        }

        Ok(geocoder)
    }
}

impl Default for GeocoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Reverse-geocoding service.
//!
//! A [`Geocoder`] owns the location records, the k-d tree built over their
//! projected coordinates, and the worker pool used for batch queries. It is
//! immutable once constructed; every query borrows it read-only, so a single
//! instance can be shared across threads without locking.

use crate::builder::GeocoderBuilder;
use crate::compute::kdtree::{KdTree, Neighbor};
use crate::compute::parallel::QueryCoordinator;
use crate::compute::projection::{project, project_all};
use crate::config::{Config, QueryMode};
use crate::error::{GeocodeError, Result};
use crate::table::RecordTable;
use revgeo_types::point::{Coordinate, ProjectedPoint};
use revgeo_types::record::LocationRecord;
use std::fmt;
use std::time::Instant;

/// The nearest record to a query coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a> {
    /// Position of the record in the build sequence
    pub index: usize,
    /// Euclidean distance in kilometers between the projected query and
    /// record. This is a chord through the ellipsoid, not a surface
    /// (geodesic) distance, and is only meant for ranking and rough scale.
    pub distance: f64,
    pub record: &'a LocationRecord,
}

/// Offline reverse geocoder over a fixed set of location records.
///
/// # Examples
///
/// ```rust
/// use revgeo::{Config, Coordinate, Geocoder, LocationRecord};
///
/// let records = vec![
///     LocationRecord::new(0.0, 0.0).with_attribute("name", "A"),
///     LocationRecord::new(0.0, 10.0).with_attribute("name", "B"),
///     LocationRecord::new(0.0, -10.0).with_attribute("name", "C"),
/// ];
/// let geocoder = Geocoder::new(records, Config::single())?;
///
/// assert_eq!(geocoder.query_one((0.0, 6.0))?.name(), Some("B"));
///
/// let hits = geocoder.query_many(&[Coordinate::new(0.0, 1.0), Coordinate::new(0.0, -9.0)])?;
/// assert_eq!(hits[0].name(), Some("A"));
/// assert_eq!(hits[1].name(), Some("C"));
/// # Ok::<(), revgeo::GeocodeError>(())
/// ```
pub struct Geocoder {
    pub(crate) records: Vec<LocationRecord>,
    pub(crate) tree: KdTree,
    coordinator: QueryCoordinator,
    config: Config,
}

impl Geocoder {
    /// Start configuring a geocoder.
    pub fn builder() -> GeocoderBuilder {
        GeocoderBuilder::new()
    }

    /// Build a geocoder over `records`.
    ///
    /// Projects every record, builds the index on the calling thread and
    /// starts the worker pool if the configuration asks for one. Any invalid
    /// coordinate aborts the build.
    pub fn new(records: Vec<LocationRecord>, config: Config) -> Result<Self> {
        config.validate().map_err(GeocodeError::InvalidConfig)?;

        let started = Instant::now();
        let points = project_records(&records)?;
        let tree = KdTree::with_leaf_size(points, config.leaf_size);

        log::info!(
            "Built index over {} records in {:?} (depth {}, mode {:?}, {} workers)",
            records.len(),
            started.elapsed(),
            tree.depth(),
            config.mode,
            config.workers
        );

        Self::from_parts(records, tree, config)
    }

    /// Build a geocoder from a table, checking its schema first.
    pub fn from_table(table: RecordTable, config: Config) -> Result<Self> {
        Self::new(table.into_records()?, config)
    }

    /// Assemble a geocoder around an already built tree.
    pub(crate) fn from_parts(
        records: Vec<LocationRecord>,
        tree: KdTree,
        config: Config,
    ) -> Result<Self> {
        config.validate().map_err(GeocodeError::InvalidConfig)?;

        if tree.len() != records.len() {
            return Err(GeocodeError::SchemaMismatch(format!(
                "index holds {} points but {} records were supplied",
                tree.len(),
                records.len()
            )));
        }

        let coordinator = if config.is_parallel() {
            QueryCoordinator::new(config.workers)?
        } else {
            QueryCoordinator::single()
        };

        Ok(Self {
            records,
            tree,
            coordinator,
            config,
        })
    }

    /// Nearest record to a single coordinate.
    ///
    /// Always runs on the calling thread.
    pub fn query_one(&self, coord: impl Into<Coordinate>) -> Result<&LocationRecord> {
        Ok(self.query_one_with_distance(coord)?.record)
    }

    /// Nearest record to a single coordinate, with its distance.
    pub fn query_one_with_distance(&self, coord: impl Into<Coordinate>) -> Result<Nearest<'_>> {
        if self.tree.is_empty() {
            return Err(GeocodeError::EmptyIndex);
        }

        let point = project(&coord.into())?;
        let neighbor = self.tree.nearest(&point)?;
        Ok(self.resolve(neighbor))
    }

    /// Nearest record for every coordinate, in input order.
    pub fn query_many(&self, coords: &[Coordinate]) -> Result<Vec<&LocationRecord>> {
        Ok(self
            .nearest_neighbors(coords)?
            .into_iter()
            .map(|n| &self.records[n.index])
            .collect())
    }

    /// Nearest record and distance for every coordinate, in input order.
    pub fn query_many_with_distance(&self, coords: &[Coordinate]) -> Result<Vec<Nearest<'_>>> {
        Ok(self
            .nearest_neighbors(coords)?
            .into_iter()
            .map(|n| self.resolve(n))
            .collect())
    }

    /// Raw index/distance pairs for a batch.
    ///
    /// In parallel mode the batch is split across the worker pool, and a
    /// failing sub-batch surfaces as [`GeocodeError::WorkerFailure`].
    pub fn nearest_neighbors(&self, coords: &[Coordinate]) -> Result<Vec<Neighbor>> {
        if self.tree.is_empty() {
            return Err(GeocodeError::EmptyIndex);
        }

        let tree = &self.tree;
        self.coordinator.run(coords, |chunk| {
            let points = project_all(chunk)?;
            tree.nearest_batch(&points)
        })
    }

    fn resolve(&self, neighbor: Neighbor) -> Nearest<'_> {
        Nearest {
            index: neighbor.index,
            distance: neighbor.distance,
            record: &self.records[neighbor.index],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in build order; a result's `index` points into this slice.
    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&LocationRecord> {
        self.records.get(index)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> QueryMode {
        self.config.mode
    }

    /// Number of workers actually used for batches.
    pub fn workers(&self) -> usize {
        self.coordinator.workers()
    }
}

impl fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geocoder")
            .field("records", &self.records.len())
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

fn project_records(records: &[LocationRecord]) -> Result<Vec<ProjectedPoint>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            project(&record.coordinate()).map_err(|e| match e {
                GeocodeError::Parse { field, value } => GeocodeError::Parse {
                    field: format!("{} of record {}", field, idx),
                    value,
                },
                other => other,
            })
        })
        .collect()
}

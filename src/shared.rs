//! Lazily built, thread-safe geocoder handle.
//!
//! `SharedGeocoder` is for applications that want one geocoder per process
//! without a global: the application creates the handle, clones it wherever
//! it is needed, and builds it once. Before the build every query fails with
//! [`GeocodeError::NotBuilt`]. A failed build leaves the handle unbuilt so it
//! can be retried; a successful one is final.
//!
//! # Examples
//!
//! ```rust
//! use revgeo::{Config, LocationRecord, SharedGeocoder, GeocodeError};
//! use std::thread;
//!
//! # fn main() -> Result<(), GeocodeError> {
//! let shared = SharedGeocoder::new();
//! assert!(matches!(shared.query_one((1.0, 1.0)), Err(GeocodeError::NotBuilt)));
//!
//! shared.build(vec![LocationRecord::new(1.0, 1.0)], Config::single())?;
//!
//! let handle = shared.clone();
//! thread::spawn(move || {
//!     assert!(handle.query_one((1.5, 1.5)).is_ok());
//! })
//! .join()
//! .unwrap();
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::{GeocodeError, Result};
use crate::geocoder::{Geocoder, Nearest};
use once_cell::sync::OnceCell;
use revgeo_types::point::Coordinate;
use revgeo_types::record::LocationRecord;
use std::sync::Arc;

/// Cloneable handle to a geocoder that is built at most once.
#[derive(Clone, Default)]
pub struct SharedGeocoder {
    inner: Arc<OnceCell<Geocoder>>,
}

impl SharedGeocoder {
    /// Create an unbuilt handle.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_built(&self) -> bool {
        self.inner.get().is_some()
    }

    /// Build the geocoder from `records`.
    pub fn build(&self, records: Vec<LocationRecord>, config: Config) -> Result<()> {
        self.build_with(|| Geocoder::new(records, config))
    }

    /// Build the geocoder with `init`.
    ///
    /// Fails with [`GeocodeError::AlreadyBuilt`] if a build has already
    /// succeeded, including one that completed concurrently. An error from
    /// `init` is returned as is and the handle stays unbuilt.
    pub fn build_with<F>(&self, init: F) -> Result<()>
    where
        F: FnOnce() -> Result<Geocoder>,
    {
        if self.is_built() {
            return Err(GeocodeError::AlreadyBuilt);
        }

        let mut ran = false;
        self.inner.get_or_try_init(|| {
            ran = true;
            init()
        })?;

        if ran {
            Ok(())
        } else {
            Err(GeocodeError::AlreadyBuilt)
        }
    }

    /// The built geocoder, or [`GeocodeError::NotBuilt`].
    pub fn get(&self) -> Result<&Geocoder> {
        self.inner.get().ok_or(GeocodeError::NotBuilt)
    }

    /// The built geocoder, building it with `init` on first use.
    pub fn get_or_build<F>(&self, init: F) -> Result<&Geocoder>
    where
        F: FnOnce() -> Result<Geocoder>,
    {
        self.inner.get_or_try_init(init)
    }

    pub fn query_one(&self, coord: impl Into<Coordinate>) -> Result<&LocationRecord> {
        self.get()?.query_one(coord)
    }

    pub fn query_one_with_distance(&self, coord: impl Into<Coordinate>) -> Result<Nearest<'_>> {
        self.get()?.query_one_with_distance(coord)
    }

    pub fn query_many(&self, coords: &[Coordinate]) -> Result<Vec<&LocationRecord>> {
        self.get()?.query_many(coords)
    }

    pub fn query_many_with_distance(&self, coords: &[Coordinate]) -> Result<Vec<Nearest<'_>>> {
        self.get()?.query_many_with_distance(coords)
    }
}

impl std::fmt::Debug for SharedGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedGeocoder")
            .field("built", &self.is_built())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn records() -> Vec<LocationRecord> {
        vec![
            LocationRecord::new(0.0, 0.0).with_attribute("name", "A"),
            LocationRecord::new(0.0, 10.0).with_attribute("name", "B"),
        ]
    }

    #[test]
    fn test_not_built() {
        let shared = SharedGeocoder::new();
        assert!(!shared.is_built());
        assert!(matches!(shared.get(), Err(GeocodeError::NotBuilt)));
        assert!(matches!(
            shared.query_many(&[Coordinate::new(0.0, 0.0)]),
            Err(GeocodeError::NotBuilt)
        ));
        assert!(matches!(
            shared.query_one_with_distance((0.0, 0.0)),
            Err(GeocodeError::NotBuilt)
        ));
    }

    #[test]
    fn test_build_then_query() {
        let shared = SharedGeocoder::new();
        shared.build(records(), Config::single()).unwrap();
        assert!(shared.is_built());
        assert_eq!(shared.query_one((0.0, 7.0)).unwrap().name(), Some("B"));
    }

    #[test]
    fn test_failed_build_can_be_retried() {
        let shared = SharedGeocoder::new();
        let bad = vec![LocationRecord::new(f64::NAN, 0.0)];
        assert!(shared.build(bad, Config::single()).is_err());
        assert!(!shared.is_built());

        shared.build(records(), Config::single()).unwrap();
        assert!(shared.is_built());
    }

    #[test]
    fn test_second_build_rejected() {
        let shared = SharedGeocoder::new();
        shared.build(records(), Config::single()).unwrap();
        assert!(matches!(
            shared.build(Vec::new(), Config::single()),
            Err(GeocodeError::AlreadyBuilt)
        ));
        // The first geocoder is untouched.
        assert_eq!(shared.get().unwrap().len(), 2);
    }

    #[test]
    fn test_get_or_build_runs_once() {
        let shared = SharedGeocoder::new();
        let first = shared
            .get_or_build(|| Geocoder::new(records(), Config::single()))
            .unwrap()
            .len();
        let second = shared
            .get_or_build(|| Geocoder::new(Vec::new(), Config::single()))
            .unwrap()
            .len();
        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_concurrent_builds_have_one_winner() {
        let shared = SharedGeocoder::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.build(records(), Config::single()).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedGeocoder::new();
        let clone = shared.clone();
        shared.build(records(), Config::single()).unwrap();
        assert!(clone.is_built());
        assert_eq!(clone.query_one((0.0, 1.0)).unwrap().name(), Some("A"));
    }
}

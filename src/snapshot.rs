//! Snapshot persistence for built geocoders.
//!
//! A snapshot stores the record sequence together with the built k-d tree so
//! a process can skip projection and tree construction on start-up. Files
//! are written to a temporary path and renamed into place, so a reader never
//! sees a half-written snapshot.
//!
//! Layout: magic bytes, one version byte, then a bincode body.

use crate::compute::kdtree::KdTree;
use crate::config::Config;
use crate::error::{GeocodeError, Result};
use crate::geocoder::Geocoder;
use revgeo_types::record::LocationRecord;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const SNAPSHOT_MAGIC: &[u8] = b"REVGEO_SNAPSHOT";
const SNAPSHOT_VERSION: u8 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    records: &'a [LocationRecord],
    tree: &'a KdTree,
}

#[derive(Deserialize)]
struct SnapshotBody {
    records: Vec<LocationRecord>,
    tree: KdTree,
}

impl Geocoder {
    /// Write the records and built index to `path`.
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let temp_path = temp_path(path);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_all(&[SNAPSHOT_VERSION])?;

        let body = SnapshotRef {
            records: &self.records,
            tree: &self.tree,
        };
        bincode::serialize_into(&mut writer, &body)
            .map_err(|e| GeocodeError::Serialization(e.to_string()))?;

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, path)?;

        log::debug!(
            "Wrote snapshot of {} records to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Restore a geocoder from a snapshot written by [`Geocoder::save_snapshot`].
    ///
    /// The tree keeps the leaf size it was built with; the rest of `config`
    /// (mode, workers) applies as usual.
    pub fn load_snapshot<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let path = path.as_ref();
        let started = Instant::now();
        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = vec![0u8; SNAPSHOT_MAGIC.len()];
        reader
            .read_exact(&mut magic)
            .map_err(|_| GeocodeError::InvalidFormat)?;
        if magic != SNAPSHOT_MAGIC {
            return Err(GeocodeError::InvalidFormat);
        }

        let mut version = [0u8; 1];
        reader
            .read_exact(&mut version)
            .map_err(|_| GeocodeError::InvalidFormat)?;
        if version[0] != SNAPSHOT_VERSION {
            return Err(GeocodeError::InvalidFormat);
        }

        let body: SnapshotBody = bincode::deserialize_from(&mut reader)
            .map_err(|e| GeocodeError::Serialization(e.to_string()))?;

        if body.tree.len() != body.records.len() {
            return Err(GeocodeError::InvalidFormat);
        }
        body.tree.check_invariants().map_err(|reason| {
            log::warn!("Rejecting snapshot {}: {}", path.display(), reason);
            GeocodeError::InvalidFormat
        })?;

        log::info!(
            "Loaded snapshot of {} records from {} in {:?}",
            body.records.len(),
            path.display(),
            started.elapsed()
        );

        Geocoder::from_parts(body.records, body.tree, config)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    if let Some(name) = temp.file_name() {
        let mut new_name = name.to_string_lossy().into_owned();
        new_name.push_str(".tmp");
        temp.set_file_name(new_name);
    }
    temp
}

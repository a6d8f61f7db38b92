//! File-backed store at ~/.dobity/store.json.
//!
//! Holds a [`MemoryStore`] and rewrites the whole file after every write.
//! A missing file is an empty store; an unreadable one is an error.

use super::{MemoryStore, PointStore, ZoneStore};
use crate::entity::{Point, PointId, PointRecord};
use crate::error::StoreError;
use crate::geo::Coordinates;
use crate::zone::{Zone, ZoneId};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Default location (~/.dobity/store.json).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dobity")
            .join("store.json")
    }

    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(Self::default_path())
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                warn!(path = %path.display(), error = %e, "store file is not valid JSON");
                StoreError::Serde(e)
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store file yet, starting empty");
                MemoryStore::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Write to a sibling temp file, then rename over the store file.
    fn persist(&self, data: &MemoryStore) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    /// Apply `change` to a copy of the store and keep it only once it is on disk.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.inner.clone();
        let out = change(&mut next)?;
        if let Err(e) = self.persist(&next) {
            warn!(path = %self.path.display(), error = %e, "store write failed, change discarded");
            return Err(e);
        }
        self.inner = next;
        Ok(out)
    }
}

impl PointStore for JsonStore {
    fn create(&mut self, point: Point) -> Result<PointRecord, StoreError> {
        self.commit(|store| store.create(point))
    }

    fn get(&self, id: PointId) -> Result<Option<PointRecord>, StoreError> {
        self.inner.get(id)
    }

    fn update_point(&mut self, id: PointId, point: Point) -> Result<PointRecord, StoreError> {
        self.commit(|store| store.update_point(id, point))
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<PointRecord>, StoreError> {
        self.inner.find_by_external_id(external_id)
    }

    fn within_radius(&self, center: &Coordinates, radius_m: f64) -> Result<Vec<PointRecord>, StoreError> {
        self.inner.within_radius(center, radius_m)
    }

    fn all_points(&self) -> Result<Vec<PointRecord>, StoreError> {
        self.inner.all_points()
    }
}

impl ZoneStore for JsonStore {
    fn find_zone(&self, slug: &str) -> Result<Option<Zone>, StoreError> {
        self.inner.find_zone(slug)
    }

    fn create_zone(&mut self, slug: &str) -> Result<Zone, StoreError> {
        if let Some(zone) = self.inner.find_zone(slug)? {
            return Ok(zone);
        }
        self.commit(|store| store.create_zone(slug))
    }

    fn replace_zone(&mut self, point: PointId, zone: &ZoneId) -> Result<bool, StoreError> {
        let current = self.inner.zone_of(point)?;
        if current.as_ref() == Some(zone) && self.inner.find_zone(zone.as_str())?.is_some() {
            return Ok(false);
        }
        self.commit(|store| store.replace_zone(point, zone))
    }

    fn zone_of(&self, point: PointId) -> Result<Option<ZoneId>, StoreError> {
        self.inner.zone_of(point)
    }

    fn points_in_zone(&self, zone: &ZoneId) -> Result<Vec<PointId>, StoreError> {
        self.inner.points_in_zone(zone)
    }

    fn zones(&self) -> Result<Vec<Zone>, StoreError> {
        self.inner.zones()
    }
}

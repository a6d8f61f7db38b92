//! In-memory store. Also the serialized shape of [`super::JsonStore`].

use super::{PointStore, ZoneStore};
use crate::entity::{Point, PointEntity, PointId, PointRecord};
use crate::error::StoreError;
use crate::geo::{BoundingBox, Coordinates};
use crate::zone::{Zone, ZoneId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    points: BTreeMap<PointId, PointRecord>,
    #[serde(default)]
    zones: BTreeMap<ZoneId, Zone>,
    /// point -> its single zone
    #[serde(default)]
    assignments: BTreeMap<PointId, ZoneId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn external_id_taken(&self, external_id: &str, except: Option<PointId>) -> bool {
        self.points
            .values()
            .any(|r| Some(r.id) != except && r.external_id() == Some(external_id))
    }
}

impl PointStore for MemoryStore {
    fn create(&mut self, point: Point) -> Result<PointRecord, StoreError> {
        if let Some(ext) = point.external_id() {
            if self.external_id_taken(ext, None) {
                return Err(StoreError::DuplicateExternalId(ext.to_string()));
            }
        }
        self.next_id = self.next_id.max(self.points.keys().last().map_or(0, |id| id.0)) + 1;
        let now = Utc::now();
        let record = PointRecord {
            id: PointId(self.next_id),
            point,
            created_at: now,
            updated_at: now,
        };
        self.points.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: PointId) -> Result<Option<PointRecord>, StoreError> {
        Ok(self.points.get(&id).cloned())
    }

    fn update_point(&mut self, id: PointId, point: Point) -> Result<PointRecord, StoreError> {
        if !self.points.contains_key(&id) {
            return Err(StoreError::PointNotFound(id.to_string()));
        }
        if let Some(ext) = point.external_id() {
            if self.external_id_taken(ext, Some(id)) {
                return Err(StoreError::DuplicateExternalId(ext.to_string()));
            }
        }
        let record = self
            .points
            .get_mut(&id)
            .ok_or_else(|| StoreError::PointNotFound(id.to_string()))?;
        record.point = point;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<PointRecord>, StoreError> {
        let external_id = external_id.trim();
        Ok(self
            .points
            .values()
            .find(|r| r.external_id() == Some(external_id))
            .cloned())
    }

    fn within_radius(&self, center: &Coordinates, radius_m: f64) -> Result<Vec<PointRecord>, StoreError> {
        let bbox = BoundingBox::around(center, radius_m);
        Ok(self
            .points
            .values()
            .filter(|r| r.coordinates().is_ok_and(|c| bbox.contains(&c)))
            .cloned()
            .collect())
    }

    fn all_points(&self) -> Result<Vec<PointRecord>, StoreError> {
        Ok(self.points.values().cloned().collect())
    }
}

impl ZoneStore for MemoryStore {
    fn find_zone(&self, slug: &str) -> Result<Option<Zone>, StoreError> {
        Ok(self.zones.get(&ZoneId(slug.to_string())).cloned())
    }

    fn create_zone(&mut self, slug: &str) -> Result<Zone, StoreError> {
        let id = ZoneId(slug.to_string());
        Ok(self
            .zones
            .entry(id.clone())
            .or_insert_with(|| Zone::new(id))
            .clone())
    }

    fn replace_zone(&mut self, point: PointId, zone: &ZoneId) -> Result<bool, StoreError> {
        if !self.zones.contains_key(zone) {
            return Err(StoreError::ZoneNotFound(zone.to_string()));
        }
        let previous = self.assignments.insert(point, zone.clone());
        Ok(previous.as_ref() != Some(zone))
    }

    fn zone_of(&self, point: PointId) -> Result<Option<ZoneId>, StoreError> {
        Ok(self.assignments.get(&point).cloned())
    }

    fn points_in_zone(&self, zone: &ZoneId) -> Result<Vec<PointId>, StoreError> {
        Ok(self
            .assignments
            .iter()
            .filter(|(_, z)| *z == zone)
            .map(|(p, _)| *p)
            .collect())
    }

    fn zones(&self) -> Result<Vec<Zone>, StoreError> {
        Ok(self.zones.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PointKind;

    fn poi(name: &str, lat: f64, lng: f64, ext: Option<&str>) -> Point {
        Point::new(PointKind::Poi, name, Some(lat), Some(lng), ext.map(String::from))
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut store = MemoryStore::new();
        let a = store.create(poi("A", 50.0, 14.0, None)).unwrap();
        let b = store.create(poi("B", 50.1, 14.1, None)).unwrap();
        assert_eq!(a.id, PointId(1));
        assert_eq!(b.id, PointId(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a.id).unwrap().unwrap().name(), "A");
    }

    #[test]
    fn test_duplicate_external_id_rejected() {
        let mut store = MemoryStore::new();
        store.create(poi("A", 50.0, 14.0, Some("gp-1"))).unwrap();
        let err = store.create(poi("B", 50.0, 14.0, Some("gp-1"))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateExternalId(ref e) if e == "gp-1"));
    }

    #[test]
    fn test_update_keeps_own_external_id() {
        let mut store = MemoryStore::new();
        let a = store.create(poi("A", 50.0, 14.0, Some("gp-1"))).unwrap();
        let updated = store.update_point(a.id, poi("A2", 50.0, 14.0, Some("gp-1"))).unwrap();
        assert_eq!(updated.name(), "A2");
        assert!(updated.updated_at >= a.updated_at);
        assert!(matches!(
            store.update_point(PointId(99), poi("X", 1.0, 1.0, None)),
            Err(StoreError::PointNotFound(_))
        ));
    }

    #[test]
    fn test_update_unknown_id_is_not_found_even_with_taken_external_id() {
        let mut store = MemoryStore::new();
        store.create(poi("A", 50.0, 14.0, Some("gp-1"))).unwrap();
        assert!(matches!(
            store.update_point(PointId(42), poi("B", 50.0, 14.0, Some("gp-1"))),
            Err(StoreError::PointNotFound(ref id)) if id == "42"
        ));
    }

    #[test]
    fn test_find_by_external_id() {
        let mut store = MemoryStore::new();
        let a = store.create(poi("A", 50.0, 14.0, Some("ocm-77"))).unwrap();
        assert_eq!(store.find_by_external_id("ocm-77").unwrap().map(|r| r.id), Some(a.id));
        assert!(store.find_by_external_id("ocm-78").unwrap().is_none());
    }

    #[test]
    fn test_within_radius_is_coarse_window() {
        let mut store = MemoryStore::new();
        let near = store.create(poi("Near", 50.0881, 14.4201, None)).unwrap();
        store.create(poi("Far", 50.0950, 14.4200, None)).unwrap();
        store
            .create(Point::new(PointKind::Poi, "NoCoords", None, None, None))
            .unwrap();

        let center = Coordinates::new(50.0880, 14.4200).unwrap();
        let found = store.within_radius(&center, 50.0).unwrap();
        assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![near.id]);
    }

    #[test]
    fn test_replace_zone_requires_zone() {
        let mut store = MemoryStore::new();
        let zone = ZoneId("u2fkbhu".into());
        assert!(matches!(
            store.replace_zone(PointId(1), &zone),
            Err(StoreError::ZoneNotFound(_))
        ));
        store.create_zone("u2fkbhu").unwrap();
        assert!(store.replace_zone(PointId(1), &zone).unwrap());
        assert!(!store.replace_zone(PointId(1), &zone).unwrap());
    }

    #[test]
    fn test_create_zone_is_create_if_absent() {
        let mut store = MemoryStore::new();
        let first = store.create_zone("u2fkbhu").unwrap();
        let second = store.create_zone("u2fkbhu").unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.zones().unwrap().len(), 1);
    }
}

//! Zone assignment: one geohash cell per point.
//!
//! Zones are created lazily the first time a point hashes into them and are
//! never deleted here. Assigning a point replaces its previous zone.

use crate::entity::{PointEntity, PointRecord};
use crate::error::{GeoError, StoreError};
use crate::geo::{self, BoundingBox, SkipReason};
use crate::store::{PointStore, ZoneStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Longest supported zone precision (~3.7 cm cells).
pub const MAX_PRECISION: usize = 12;

/// A zone identifier: the geohash string itself, also used as its slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub created_at: DateTime<Utc>,
}

impl Zone {
    pub fn new(id: ZoneId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
        }
    }

    pub fn precision(&self) -> usize {
        self.id.0.chars().count()
    }

    /// The cell this zone covers.
    pub fn bbox(&self) -> Result<BoundingBox, GeoError> {
        geo::decode_bbox(&self.id.0)
    }
}

/// Result of one assignment attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ZoneAssignment {
    Assigned {
        zone: ZoneId,
        /// The zone did not exist before this call.
        created: bool,
        /// The point's association actually changed.
        changed: bool,
    },
    Skipped { reason: SkipReason },
}

impl ZoneAssignment {
    pub fn zone(&self) -> Option<&ZoneId> {
        match self {
            Self::Assigned { zone, .. } => Some(zone),
            Self::Skipped { .. } => None,
        }
    }
}

/// Counters from a [`ZoneAssigner::backfill`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub assigned: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub zones_created: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneAssigner {
    precision: usize,
}

impl ZoneAssigner {
    pub fn new(precision: usize) -> Result<Self, GeoError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(GeoError::InvalidPrecision);
        }
        Ok(Self { precision })
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// The zone `entity` belongs in, without touching any store.
    pub fn zone_for(&self, entity: &impl PointEntity) -> Result<ZoneId, SkipReason> {
        let coords = entity.coordinates()?;
        Ok(ZoneId(geo::geohash::encode_coordinates(&coords, self.precision)))
    }

    /// Find or create the point's zone and make it the point's only zone.
    ///
    /// Points without usable coordinates are skipped and nothing is written.
    pub fn assign<S>(&self, record: &PointRecord, store: &mut S) -> Result<ZoneAssignment, StoreError>
    where
        S: ZoneStore + ?Sized,
    {
        let zone_id = match self.zone_for(record) {
            Ok(z) => z,
            Err(reason) => {
                debug!(point = %record.id, %reason, "zone assignment skipped");
                return Ok(ZoneAssignment::Skipped { reason });
            }
        };

        let created = match store.find_zone(zone_id.as_str())? {
            Some(_) => false,
            None => {
                store.create_zone(zone_id.as_str())?;
                info!(zone = %zone_id, "created zone");
                true
            }
        };

        let changed = store.replace_zone(record.id, &zone_id)?;
        if changed {
            debug!(point = %record.id, zone = %zone_id, "zone assigned");
        }

        Ok(ZoneAssignment::Assigned {
            zone: zone_id,
            created,
            changed,
        })
    }

    /// Re-run assignment for every stored point.
    pub fn backfill<S>(&self, store: &mut S) -> Result<BackfillReport, StoreError>
    where
        S: PointStore + ZoneStore + ?Sized,
    {
        let mut report = BackfillReport::default();
        for record in store.all_points()? {
            match self.assign(&record, store)? {
                ZoneAssignment::Assigned { created, changed, .. } => {
                    if created {
                        report.zones_created += 1;
                    }
                    if changed {
                        report.assigned += 1;
                    } else {
                        report.unchanged += 1;
                    }
                }
                ZoneAssignment::Skipped { .. } => report.skipped += 1,
            }
        }
        info!(
            assigned = report.assigned,
            unchanged = report.unchanged,
            skipped = report.skipped,
            zones_created = report.zones_created,
            "zone backfill finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Point, PointKind};
    use crate::store::MemoryStore;

    fn stored(store: &mut MemoryStore, name: &str, lat: Option<f64>, lng: Option<f64>) -> PointRecord {
        store
            .create(Point::new(PointKind::ChargingLocation, name, lat, lng, None))
            .unwrap()
    }

    #[test]
    fn test_assign_creates_zone_lazily() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(7).unwrap();
        let rec = stored(&mut store, "Ionity", Some(50.08), Some(14.42));

        let result = assigner.assign(&rec, &mut store).unwrap();
        assert_eq!(
            result,
            ZoneAssignment::Assigned {
                zone: ZoneId("u2fkbhu".into()),
                created: true,
                changed: true,
            }
        );
        assert!(store.find_zone("u2fkbhu").unwrap().is_some());
        assert_eq!(store.zone_of(rec.id).unwrap(), Some(ZoneId("u2fkbhu".into())));
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(7).unwrap();
        let rec = stored(&mut store, "Ionity", Some(50.08), Some(14.42));

        assigner.assign(&rec, &mut store).unwrap();
        let again = assigner.assign(&rec, &mut store).unwrap();
        assert_eq!(
            again,
            ZoneAssignment::Assigned {
                zone: ZoneId("u2fkbhu".into()),
                created: false,
                changed: false,
            }
        );
        assert_eq!(store.zones().unwrap().len(), 1);
    }

    #[test]
    fn test_shared_zone() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(7).unwrap();
        let a = stored(&mut store, "A", Some(50.0880), Some(14.4200));
        let b = stored(&mut store, "B", Some(50.0879), Some(14.4203));

        assigner.assign(&a, &mut store).unwrap();
        let second = assigner.assign(&b, &mut store).unwrap();
        assert!(matches!(second, ZoneAssignment::Assigned { created: false, .. }));

        let members = store.points_in_zone(&ZoneId("u2fkbnh".into())).unwrap();
        assert_eq!(members, vec![a.id, b.id]);
    }

    #[test]
    fn test_move_replaces_zone() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(7).unwrap();
        let rec = stored(&mut store, "Mobile", Some(50.08), Some(14.42));
        assigner.assign(&rec, &mut store).unwrap();

        let moved = store
            .update_point(rec.id, Point::new(PointKind::ChargingLocation, "Mobile", Some(49.1951), Some(16.6068), None))
            .unwrap();
        let result = assigner.assign(&moved, &mut store).unwrap();
        let new_zone = result.zone().unwrap().clone();
        assert_ne!(new_zone.as_str(), "u2fkbhu");
        assert_eq!(store.zone_of(rec.id).unwrap(), Some(new_zone));
        // old zone survives but no longer lists the point
        assert!(store.find_zone("u2fkbhu").unwrap().is_some());
        assert!(store.points_in_zone(&ZoneId("u2fkbhu".into())).unwrap().is_empty());
    }

    #[test]
    fn test_zero_coordinates_skipped() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(7).unwrap();
        let rec = stored(&mut store, "Null Island", Some(0.0), Some(0.0));

        let result = assigner.assign(&rec, &mut store).unwrap();
        assert_eq!(result, ZoneAssignment::Skipped { reason: SkipReason::ZeroSentinel });
        assert!(store.zones().unwrap().is_empty());
        assert_eq!(store.zone_of(rec.id).unwrap(), None);
    }

    #[test]
    fn test_skip_keeps_previous_zone() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(7).unwrap();
        let rec = stored(&mut store, "Spot", Some(50.08), Some(14.42));
        assigner.assign(&rec, &mut store).unwrap();

        let cleared = store
            .update_point(rec.id, Point::new(PointKind::ChargingLocation, "Spot", None, None, None))
            .unwrap();
        let result = assigner.assign(&cleared, &mut store).unwrap();
        assert_eq!(result, ZoneAssignment::Skipped { reason: SkipReason::Missing });
        assert_eq!(store.zone_of(rec.id).unwrap(), Some(ZoneId("u2fkbhu".into())));
    }

    #[test]
    fn test_precision_bounds() {
        assert!(ZoneAssigner::new(0).is_err());
        assert!(ZoneAssigner::new(13).is_err());
        assert_eq!(ZoneAssigner::new(5).unwrap().precision(), 5);
    }

    #[test]
    fn test_backfill() {
        let mut store = MemoryStore::new();
        let assigner = ZoneAssigner::new(6).unwrap();
        stored(&mut store, "A", Some(50.08), Some(14.42));
        stored(&mut store, "B", Some(50.0801), Some(14.4201));
        stored(&mut store, "C", None, None);
        stored(&mut store, "D", Some(49.1951), Some(16.6068));

        let report = assigner.backfill(&mut store).unwrap();
        assert_eq!(
            report,
            BackfillReport { assigned: 3, unchanged: 0, skipped: 1, zones_created: 2 }
        );

        let rerun = assigner.backfill(&mut store).unwrap();
        assert_eq!(
            rerun,
            BackfillReport { assigned: 0, unchanged: 3, skipped: 1, zones_created: 0 }
        );
    }

    #[test]
    fn test_zone_bbox() {
        let zone = Zone::new(ZoneId("u2fkbhu".into()));
        assert_eq!(zone.precision(), 7);
        let bbox = zone.bbox().unwrap();
        assert!(bbox.contains(&crate::geo::Coordinates::new(50.08, 14.42).unwrap()));
    }
}

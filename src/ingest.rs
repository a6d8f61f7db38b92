//! Ingest pipeline: dedup check, then create, then zone assignment.
//!
//! Updates go through [`Ingestor::update`] so the zone follows the point.

use crate::config::Config;
use crate::dedup::{DedupMatch, DedupMatcher};
use crate::entity::{Point, PointEntity, PointId};
use crate::error::{GeoError, StoreError};
use crate::store::{PointStore, ZoneStore};
use crate::zone::{ZoneAssigner, ZoneAssignment};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The point already exists; nothing was written.
    Existing {
        id: PointId,
        #[serde(rename = "match")]
        matched: DedupMatch,
    },
    Created {
        id: PointId,
        zone: ZoneAssignment,
    },
}

impl IngestOutcome {
    pub fn id(&self) -> PointId {
        match self {
            Self::Existing { id, .. } | Self::Created { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
    matcher: DedupMatcher,
    assigner: ZoneAssigner,
}

impl Ingestor {
    pub fn new(matcher: DedupMatcher, assigner: ZoneAssigner) -> Self {
        Self { matcher, assigner }
    }

    pub fn from_config(config: &Config) -> Result<Self, GeoError> {
        Ok(Self {
            matcher: DedupMatcher::new(config.dedup_radius_m, config.min_similarity),
            assigner: ZoneAssigner::new(config.zone_precision)?,
        })
    }

    pub fn matcher(&self) -> &DedupMatcher {
        &self.matcher
    }

    pub fn assigner(&self) -> &ZoneAssigner {
        &self.assigner
    }

    /// Insert `point` unless it duplicates a stored one.
    pub fn ingest<S>(&self, point: Point, store: &mut S) -> Result<IngestOutcome, StoreError>
    where
        S: PointStore + ZoneStore + ?Sized,
    {
        if let Some(matched) = self.matcher.find_match(&point, &*store)? {
            info!(name = point.name(), id = %matched.id, reason = ?matched.reason, "point already known");
            return Ok(IngestOutcome::Existing {
                id: matched.id,
                matched,
            });
        }

        let record = store.create(point)?;
        let zone = self.assigner.assign(&record, store)?;
        info!(
            id = %record.id,
            kind = %record.kind(),
            name = record.name(),
            zone = ?zone.zone(),
            "point created"
        );
        Ok(IngestOutcome::Created { id: record.id, zone })
    }

    /// Replace a stored point and re-run zone assignment for it.
    pub fn update<S>(&self, id: PointId, point: Point, store: &mut S) -> Result<ZoneAssignment, StoreError>
    where
        S: PointStore + ZoneStore + ?Sized,
    {
        let record = store.update_point(id, point)?;
        self.assigner.assign(&record, store)
    }

    /// Re-run zone assignment for one stored point.
    pub fn reassign<S>(&self, id: PointId, store: &mut S) -> Result<ZoneAssignment, StoreError>
    where
        S: PointStore + ZoneStore + ?Sized,
    {
        let record = store
            .get(id)?
            .ok_or_else(|| StoreError::PointNotFound(id.to_string()))?;
        self.assigner.assign(&record, store)
    }
}

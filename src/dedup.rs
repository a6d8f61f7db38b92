//! Duplicate detection for incoming points.
//!
//! Matching order:
//! 1. External id: an exact hit is authoritative and skips everything else.
//! 2. Proximity: coarse store query, then exact haversine `<= radius_m`
//!    AND name similarity `> min_similarity`.
//!
//! Several proximity hits resolve to the closest one, then the lowest id.
//! Matching is best-effort: two concurrent ingests of the same place can both
//! see "no match". The external-id uniqueness check in the stores is the
//! backstop for that.

use crate::entity::{PointEntity, PointId};
use crate::error::StoreError;
use crate::geo::similarity;
use crate::store::PointStore;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_RADIUS_M: f64 = 50.0;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    ExternalId,
    Proximity,
}

/// An existing point the candidate duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupMatch {
    pub id: PointId,
    pub reason: MatchReason,
    /// Meters; absent for external-id matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct DedupMatcher {
    pub radius_m: f64,
    pub min_similarity: f64,
}

impl Default for DedupMatcher {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

impl DedupMatcher {
    pub fn new(radius_m: f64, min_similarity: f64) -> Self {
        Self {
            radius_m,
            min_similarity,
        }
    }

    /// Find the stored point `candidate` duplicates, if any. Never writes.
    pub fn find_match<S>(
        &self,
        candidate: &impl PointEntity,
        store: &S,
    ) -> Result<Option<DedupMatch>, StoreError>
    where
        S: PointStore + ?Sized,
    {
        if let Some(ext) = candidate.external_id() {
            if let Some(existing) = store.find_by_external_id(ext)? {
                debug!(external_id = ext, id = %existing.id, "matched by external id");
                return Ok(Some(DedupMatch {
                    id: existing.id,
                    reason: MatchReason::ExternalId,
                    distance_m: None,
                    similarity: None,
                }));
            }
        }

        let origin = match candidate.coordinates() {
            Ok(c) => c,
            Err(reason) => {
                debug!(name = candidate.name(), %reason, "no proximity match possible");
                return Ok(None);
            }
        };

        let mut best: Option<DedupMatch> = None;
        for existing in store.within_radius(&origin, self.radius_m)? {
            let Ok(coords) = existing.coordinates() else {
                continue;
            };
            let distance = origin.distance_to(&coords);
            if distance > self.radius_m {
                continue;
            }
            let score = similarity(candidate.name(), existing.name());
            if score <= self.min_similarity {
                debug!(
                    id = %existing.id,
                    distance_m = distance,
                    similarity = score,
                    "nearby point rejected on name"
                );
                continue;
            }

            let hit = DedupMatch {
                id: existing.id,
                reason: MatchReason::Proximity,
                distance_m: Some(distance),
                similarity: Some(score),
            };
            best = match best {
                Some(current) if !is_closer(&hit, &current) => Some(current),
                _ => Some(hit),
            };
        }

        if let Some(ref m) = best {
            debug!(id = %m.id, distance_m = ?m.distance_m, "matched by proximity");
        }
        Ok(best)
    }
}

fn is_closer(a: &DedupMatch, b: &DedupMatch) -> bool {
    let da = a.distance_m.unwrap_or(f64::INFINITY);
    let db = b.distance_m.unwrap_or(f64::INFINITY);
    da.total_cmp(&db).then(a.id.cmp(&b.id)).is_lt()
}

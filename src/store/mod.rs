//! Point and zone record stores.
//!
//! The matcher and the zone assigner only talk to these traits. Two
//! implementations ship with the crate: [`MemoryStore`] and the
//! file-backed [`JsonStore`].

pub mod json;
pub mod memory;

use crate::entity::{Point, PointId, PointRecord};
use crate::error::StoreError;
use crate::geo::Coordinates;
use crate::zone::{Zone, ZoneId};

pub use json::JsonStore;
pub use memory::MemoryStore;

pub trait PointStore {
    /// Insert a new point and return it with its assigned id.
    /// Fails with [`StoreError::DuplicateExternalId`] if the external id is taken.
    fn create(&mut self, point: Point) -> Result<PointRecord, StoreError>;

    fn get(&self, id: PointId) -> Result<Option<PointRecord>, StoreError>;

    /// Replace the stored representation of an existing point.
    fn update_point(&mut self, id: PointId, point: Point) -> Result<PointRecord, StoreError>;

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<PointRecord>, StoreError>;

    /// Coarse proximity query. May return points slightly outside
    /// `radius_m`; callers verify with an exact distance.
    fn within_radius(&self, center: &Coordinates, radius_m: f64) -> Result<Vec<PointRecord>, StoreError>;

    fn all_points(&self) -> Result<Vec<PointRecord>, StoreError>;
}

pub trait ZoneStore {
    fn find_zone(&self, slug: &str) -> Result<Option<Zone>, StoreError>;

    /// Create the zone if it does not exist yet; returns the stored zone.
    fn create_zone(&mut self, slug: &str) -> Result<Zone, StoreError>;

    /// Make `zone` the only zone of `point`. Returns whether anything changed.
    fn replace_zone(&mut self, point: PointId, zone: &ZoneId) -> Result<bool, StoreError>;

    fn zone_of(&self, point: PointId) -> Result<Option<ZoneId>, StoreError>;

    fn points_in_zone(&self, zone: &ZoneId) -> Result<Vec<PointId>, StoreError>;

    fn zones(&self) -> Result<Vec<Zone>, StoreError>;
}

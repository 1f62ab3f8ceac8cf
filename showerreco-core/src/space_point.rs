//! Space points and their hit associations.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::hit::Hit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identity of a space point within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpacePointId(pub u64);

/// A reconstructed 3D position built from hits on several planes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpacePoint {
    /// Identity of the space point.
    pub id: SpacePointId,
    /// Position in cm.
    pub position: Point3<f64>,
}

impl SpacePoint {
    /// Creates a new space point.
    #[inline]
    #[must_use]
    pub fn new(id: u64, x: f64, y: f64, z: f64) -> Self {
        Self {
            id: SpacePointId(id),
            position: Point3::new(x, y, z),
        }
    }
}

/// Lookup of the hits a space point was built from.
///
/// An empty slice means the association is missing upstream; callers treat
/// that as a skip rather than an error.
pub trait HitAssociations: Send + Sync {
    /// Returns the hits associated with the space point.
    fn hits_for(&self, space_point: &SpacePoint) -> &[Hit];
}

impl HitAssociations for HashMap<SpacePointId, Vec<Hit>> {
    fn hits_for(&self, space_point: &SpacePoint) -> &[Hit] {
        self.get(&space_point.id).map_or(&[], Vec::as_slice)
    }
}

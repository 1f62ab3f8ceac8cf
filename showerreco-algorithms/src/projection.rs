//! Projections of space points and hits onto a shower axis.

use nalgebra::{Point3, Vector2, Vector3};
use showerreco_core::{Geometry, Hit, SpacePoint};

/// Signed distance of a point along `direction` from `start`.
#[inline]
#[must_use]
pub fn space_point_projection(
    space_point: &SpacePoint,
    start: &Point3<f64>,
    direction: &Vector3<f64>,
) -> f64 {
    (space_point.position - start).dot(direction)
}

/// Distance of a point from the axis through `start` along `direction`.
#[inline]
#[must_use]
pub fn space_point_perpendicular(
    space_point: &SpacePoint,
    start: &Point3<f64>,
    direction: &Vector3<f64>,
) -> f64 {
    let proj = space_point_projection(space_point, start, direction);
    space_point_perpendicular_with_projection(space_point, start, direction, proj)
}

/// Same as [`space_point_perpendicular`] when the projection is already known.
#[inline]
#[must_use]
pub fn space_point_perpendicular_with_projection(
    space_point: &SpacePoint,
    start: &Point3<f64>,
    direction: &Vector3<f64>,
    projection: f64,
) -> f64 {
    ((space_point.position - start) - projection * direction).norm()
}

/// Euclidean distance between two space points.
#[inline]
#[must_use]
pub fn distance_between_space_points(a: &SpacePoint, b: &SpacePoint) -> f64 {
    (a.position - b.position).norm()
}

/// Position of a hit in its plane's 2D coordinate system, in cm.
///
/// The first coordinate is along the wire-increasing direction, the second is
/// the drift coordinate.
#[must_use]
pub fn hit_coordinates(geometry: &dyn Geometry, hit: &Hit) -> Vector2<f64> {
    let plane = hit.plane_id();
    let pitch = geometry.wire_pitch(plane);
    Vector2::new(
        f64::from(hit.wire.wire) * pitch,
        geometry.ticks_to_x(hit.peak_time, plane),
    )
}

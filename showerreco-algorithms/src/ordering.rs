//! Ordering of hits and space points along a shower axis.
//!
//! All orderings are stable sorts over `(key, original index)`: entries with
//! equal keys keep their input order and nothing is dropped on collision.

use log::debug;
use nalgebra::{Point3, Vector2, Vector3};
use showerreco_core::{CandidateError, Geometry, Hit, SpacePoint};

use crate::projection::{hit_coordinates, space_point_perpendicular, space_point_projection};

/// Sorts `items` ascending by `key`, keeping the input order for ties.
fn stable_sort_by_key<T: Copy>(items: &mut [T], key: impl Fn(&T) -> f64) {
    // Adding 0.0 folds -0.0 into 0.0 so both compare as a tie.
    let mut keyed: Vec<(f64, T)> = items.iter().map(|item| (key(item) + 0.0, *item)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (slot, (_, item)) in items.iter_mut().zip(keyed) {
        *slot = item;
    }
}

/// Orders hits on a single plane by their projection onto the shower
/// direction in the plane's (wire, drift) coordinate system.
///
/// Only hits on the same plane as the first hit are considered; ordering
/// stops at the first hit from another plane. If the last hit ends up closer
/// to the start than the first, the order is reversed so the sequence runs
/// away from the start.
///
/// # Errors
/// Returns [`CandidateError::NoHits`] if `hits` is empty.
pub fn order_shower_hits(
    geometry: &dyn Geometry,
    hits: &[Hit],
    start: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Result<Vec<Hit>, CandidateError> {
    let first = hits.first().ok_or(CandidateError::NoHits)?;
    let plane = first.plane_id();
    let pitch = geometry.wire_pitch(plane);

    let start_2d = Vector2::new(geometry.wire_coordinate(start, plane) * pitch, start.x);
    let plane_direction = geometry.increasing_wire_direction(plane);
    let direction_2d = Vector2::new(direction.dot(&plane_direction), direction.x);
    let direction_2d = direction_2d.try_normalize(0.0).unwrap_or(direction_2d);

    let projection = |hit: &Hit| (hit_coordinates(geometry, hit) - start_2d).dot(&direction_2d);

    let mut ordered: Vec<Hit> = hits
        .iter()
        .take_while(|hit| hit.plane_id() == plane)
        .copied()
        .collect();
    if ordered.len() < hits.len() {
        debug!(
            "ordering stopped at a plane change after {} of {} hits",
            ordered.len(),
            hits.len()
        );
    }
    stable_sort_by_key(&mut ordered, projection);

    // The 2D direction sign can disagree with the natural hit order.
    if let (Some(front), Some(back)) = (ordered.first(), ordered.last()) {
        if projection(back).abs() < projection(front).abs() {
            ordered.reverse();
        }
    }

    Ok(ordered)
}

/// Orders space points by signed projection along `direction` from `start`.
pub fn order_shower_space_points(
    space_points: &mut [SpacePoint],
    start: &Point3<f64>,
    direction: &Vector3<f64>,
) {
    stable_sort_by_key(space_points, |sp| {
        space_point_projection(sp, start, direction)
    });
}

/// Orders space points by distance from `start`.
pub fn order_shower_space_points_by_distance(space_points: &mut [SpacePoint], start: &Point3<f64>) {
    stable_sort_by_key(space_points, |sp| (sp.position - start).norm());
}

/// Orders space points by perpendicular distance from the shower axis.
pub fn order_shower_space_points_perpendicular(
    space_points: &mut [SpacePoint],
    start: &Point3<f64>,
    direction: &Vector3<f64>,
) {
    stable_sort_by_key(space_points, |sp| {
        space_point_perpendicular(sp, start, direction)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(space_points: &[SpacePoint]) -> Vec<u64> {
        space_points.iter().map(|sp| sp.id.0).collect()
    }

    #[test]
    fn test_order_by_projection() {
        let mut sps = vec![
            SpacePoint::new(0, 5.0, 0.0, 0.0),
            SpacePoint::new(1, -1.0, 3.0, 0.0),
            SpacePoint::new(2, 2.0, -7.0, 0.0),
        ];
        order_shower_space_points(&mut sps, &Point3::origin(), &Vector3::x());
        assert_eq!(ids(&sps), vec![1, 2, 0]);
    }

    #[test]
    fn test_equal_projections_keep_input_order() {
        let mut sps = vec![
            SpacePoint::new(0, 1.0, 1.0, 0.0),
            SpacePoint::new(1, 1.0, -1.0, 0.0),
            SpacePoint::new(2, 0.0, 0.0, 0.0),
            SpacePoint::new(3, 1.0, 5.0, 0.0),
        ];
        order_shower_space_points(&mut sps, &Point3::origin(), &Vector3::x());
        assert_eq!(ids(&sps), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_signed_zero_is_a_tie() {
        let mut sps = vec![
            SpacePoint::new(0, 0.0, 1.0, 0.0),
            SpacePoint::new(1, -0.0, 2.0, 0.0),
        ];
        order_shower_space_points(&mut sps, &Point3::origin(), &Vector3::x());
        assert_eq!(ids(&sps), vec![0, 1]);
    }

    #[test]
    fn test_order_empty_is_noop() {
        let mut sps: Vec<SpacePoint> = Vec::new();
        order_shower_space_points(&mut sps, &Point3::origin(), &Vector3::z());
        order_shower_space_points_by_distance(&mut sps, &Point3::origin());
        assert!(sps.is_empty());
    }

    #[test]
    fn test_order_by_distance() {
        let mut sps = vec![
            SpacePoint::new(0, 0.0, 0.0, -4.0),
            SpacePoint::new(1, 1.0, 0.0, 0.0),
            SpacePoint::new(2, 0.0, 2.0, 0.0),
        ];
        order_shower_space_points_by_distance(&mut sps, &Point3::origin());
        assert_eq!(ids(&sps), vec![1, 2, 0]);
    }

    #[test]
    fn test_order_perpendicular() {
        let mut sps = vec![
            SpacePoint::new(0, 10.0, 3.0, 0.0),
            SpacePoint::new(1, 1.0, 0.5, 0.0),
            SpacePoint::new(2, 5.0, 0.0, -1.0),
        ];
        order_shower_space_points_perpendicular(&mut sps, &Point3::origin(), &Vector3::x());
        assert_eq!(ids(&sps), vec![1, 2, 0]);
    }
}

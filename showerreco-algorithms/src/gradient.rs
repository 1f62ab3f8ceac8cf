//! Direction validity from the growth of the shower's transverse spread.
//!
//! An electromagnetic shower widens as it develops, so the RMS of the
//! perpendicular distance from the axis should grow along the true
//! direction. A negative gradient suggests the candidate direction is
//! reversed.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use showerreco_core::{ConfigError, SpacePoint};

use crate::ordering::order_shower_space_points;
use crate::projection::{space_point_perpendicular_with_projection, space_point_projection};

/// Root mean square of the values about zero with an `n - 1` denominator.
///
/// Returns `None` for fewer than two values.
#[must_use]
pub fn calculate_rms(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum: f64 = values.iter().map(|v| v * v).sum();
    Some((sum / (values.len() - 1) as f64).sqrt())
}

/// Gradient of the perpendicular RMS per segment along the shower direction.
///
/// The space points are reordered in place by projection along `direction`.
/// Points are split into `n_segments` equal length segments, the RMS of each
/// segment with at least two points is computed, and the slope of a linear
/// fit of RMS against segment index is returned.
///
/// Returns 0 for fewer than three points, a negligible shower length, or a
/// degenerate fit.
///
/// # Errors
/// Returns [`ConfigError::ZeroSegments`] if `n_segments` is zero.
pub fn rms_shower_gradient(
    space_points: &mut [SpacePoint],
    centre: &Point3<f64>,
    direction: &Vector3<f64>,
    n_segments: u32,
) -> Result<f64, ConfigError> {
    if n_segments == 0 {
        return Err(ConfigError::ZeroSegments);
    }
    if space_points.len() < 3 {
        return Ok(0.0);
    }

    order_shower_space_points(space_points, centre, direction);

    let (Some(first), Some(last)) = (space_points.first(), space_points.last()) else {
        return Ok(0.0);
    };
    let min_proj = space_point_projection(first, centre, direction);
    let max_proj = space_point_projection(last, centre, direction);
    let segment_size = (max_proj - min_proj) / f64::from(n_segments);

    if segment_size < f64::EPSILON {
        return Ok(0.0);
    }

    let mut segments: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for sp in space_points.iter() {
        let len = space_point_projection(sp, centre, direction);
        let perp = space_point_perpendicular_with_projection(sp, centre, direction, len);
        let segment = (len / segment_size).round() as i64;
        segments.entry(segment).or_default().push(perp);
    }

    let mut n = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_xy = 0.0;

    for (&segment, perps) in &segments {
        let Some(rms) = calculate_rms(perps) else {
            continue;
        };
        let x = segment as f64;
        sum_x += x;
        sum_y += rms;
        sum_x2 += x * x;
        sum_xy += x * rms;
        n += 1.0;
    }

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return Ok(0.0);
    }
    Ok((n * sum_xy - sum_x * sum_y) / denom)
}

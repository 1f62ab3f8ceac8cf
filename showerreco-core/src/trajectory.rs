//! Initial track trajectories.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single sample along a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectoryPoint {
    /// Position in cm.
    pub position: Point3<f64>,
    /// Unit direction at this sample.
    pub direction: Vector3<f64>,
    /// False when the sample carries no usable geometric information.
    pub valid: bool,
}

impl TrajectoryPoint {
    /// Creates a valid trajectory point.
    #[must_use]
    pub fn new(position: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            position,
            direction,
            valid: true,
        }
    }

    /// Creates a sample flagged as having no point.
    #[must_use]
    pub fn invalid(position: Point3<f64>) -> Self {
        Self {
            position,
            direction: Vector3::zeros(),
            valid: false,
        }
    }
}

/// Ordered sequence of trajectory samples describing an initial track.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    /// Samples ordered from the track start.
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    /// Creates a trajectory from ordered samples.
    #[must_use]
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    /// Returns the number of samples, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the first sample.
    #[must_use]
    pub fn start(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    /// Iterates over valid samples together with their index.
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, &TrajectoryPoint)> {
        self.points.iter().enumerate().filter(|(_, p)| p.valid)
    }
}

impl FromIterator<TrajectoryPoint> for Trajectory {
    fn from_iter<I: IntoIterator<Item = TrajectoryPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_valid_skips_flagged_points() {
        let dir = Vector3::new(0.0, 0.0, 1.0);
        let traj: Trajectory = vec![
            TrajectoryPoint::new(Point3::new(0.0, 0.0, 0.0), dir),
            TrajectoryPoint::invalid(Point3::new(0.0, 0.0, 1.0)),
            TrajectoryPoint::new(Point3::new(0.0, 0.0, 2.0), dir),
        ]
        .into_iter()
        .collect();

        assert_eq!(traj.len(), 3);
        let indices: Vec<usize> = traj.iter_valid().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(traj.start().map(|p| p.position.z), Some(0.0));
    }
}

//! Charge weighted shower centroids.
#![allow(
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::float_cmp
)]

use log::warn;
use nalgebra::{Point3, Vector3};
use showerreco_core::{
    CandidateError, DetectorProperties, Hit, HitAssociations, SignalType, SpacePoint,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for space point charge estimation.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChargeConfig {
    /// Use only the collection plane hit of each space point.
    pub use_collection_only: bool,
}

impl ChargeConfig {
    /// Set collection-only charge.
    #[must_use]
    pub fn with_use_collection_only(mut self, collection_only: bool) -> Self {
        self.use_collection_only = collection_only;
        self
    }
}

/// Charge weighted centre of a set of space points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChargeCentroid {
    /// Weighted position.
    pub position: Point3<f64>,
    /// Sum of the per space point charges.
    pub total_charge: f64,
}

/// Computes lifetime corrected, outlier trimmed charges for space points.
#[derive(Clone, Debug)]
pub struct ChargeCentroidEstimator<'a> {
    detector: &'a DetectorProperties,
    config: ChargeConfig,
}

impl<'a> ChargeCentroidEstimator<'a> {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(detector: &'a DetectorProperties, config: ChargeConfig) -> Self {
        Self { detector, config }
    }

    /// Get current configuration.
    #[must_use]
    pub fn config(&self) -> &ChargeConfig {
        &self.config
    }

    /// Charge of a single space point from its hits.
    ///
    /// In collection-only mode this is the first collection hit's corrected
    /// integral. Otherwise it is the mean corrected integral of the hits within
    /// two standard deviations of the mean of all hits.
    #[must_use]
    pub fn space_point_charge(&self, hits: &[Hit]) -> f64 {
        if self.config.use_collection_only {
            return hits
                .iter()
                .find(|hit| hit.signal_type == SignalType::Collection)
                .map_or(0.0, |hit| self.corrected_charge(hit));
        }

        if hits.is_empty() {
            warn!("space point has no hits, using zero charge");
            return 0.0;
        }

        let charges: Vec<f64> = hits.iter().map(|hit| self.corrected_charge(hit)).collect();
        let n = charges.len() as f64;
        let mean = charges.iter().sum::<f64>() / n;

        let rms = if charges.len() > 1 {
            let sum2: f64 = charges.iter().map(|q| (q - mean).powi(2)).sum();
            (sum2 / (n - 1.0)).sqrt()
        } else {
            1.0
        };

        let (lo, hi) = (mean - 2.0 * rms, mean + 2.0 * rms);
        let (kept_sum, kept) = charges
            .iter()
            .filter(|&&q| q >= lo && q <= hi)
            .fold((0.0, 0_usize), |(s, k), q| (s + q, k + 1));

        if kept == 0 {
            warn!("no hits within two sigma of the mean charge, using zero charge");
            return 0.0;
        }
        kept_sum / kept as f64
    }

    /// Charge weighted centroid and total charge of the space points.
    ///
    /// # Errors
    /// Returns [`CandidateError::ZeroTotalCharge`] if the summed charge is
    /// zero, which includes an empty input.
    pub fn shower_centre(
        &self,
        space_points: &[SpacePoint],
        associations: &dyn HitAssociations,
    ) -> Result<ChargeCentroid, CandidateError> {
        let mut weighted = Vector3::zeros();
        let mut total_charge = 0.0;

        for sp in space_points {
            let charge = self.space_point_charge(associations.hits_for(sp));
            if charge == 0.0 {
                warn!(
                    "averaged charge within two sigma for space point {} is zero",
                    sp.id.0
                );
            }
            weighted += charge * sp.position.coords;
            total_charge += charge;
        }

        if total_charge.abs() < f64::EPSILON {
            return Err(CandidateError::ZeroTotalCharge);
        }

        Ok(ChargeCentroid {
            position: Point3::from(weighted / total_charge),
            total_charge,
        })
    }

    fn corrected_charge(&self, hit: &Hit) -> f64 {
        hit.integral * self.detector.lifetime_correction(hit.peak_time)
    }
}

/// Unweighted geometric centre of the space points, `None` when empty.
#[must_use]
pub fn shower_centre(space_points: &[SpacePoint]) -> Option<Point3<f64>> {
    if space_points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = space_points.iter().map(|sp| sp.position.coords).sum();
    Some(Point3::from(sum / space_points.len() as f64))
}

/// Mean raw integral of the hits, zero when there are none.
#[must_use]
pub fn space_point_charge(hits: &[Hit]) -> f64 {
    if hits.is_empty() {
        warn!("no hits to average the space point charge over");
        return 0.0;
    }
    hits.iter().map(|hit| hit.integral).sum::<f64>() / hits.len() as f64
}

/// Mean peak time of the hits, zero when there are none.
#[must_use]
pub fn space_point_time(hits: &[Hit]) -> f64 {
    if hits.is_empty() {
        warn!("no hits to average the space point time over");
        return 0.0;
    }
    hits.iter().map(|hit| hit.peak_time).sum::<f64>() / hits.len() as f64
}

//! Detector collaborator interfaces.
//!
//! Geometry, space charge and calorimetry are provided by the surrounding
//! framework. They are injected into the algorithms as trait objects so that
//! tests can substitute deterministic fakes.

use nalgebra::{Point3, Vector3};

use crate::hit::{PlaneId, TpcId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wire plane geometry.
pub trait Geometry: Send + Sync {
    /// Distance between adjacent wires on the plane, in cm.
    fn wire_pitch(&self, plane: PlaneId) -> f64;

    /// Unit vector along which wire indices increase on the plane.
    fn increasing_wire_direction(&self, plane: PlaneId) -> Vector3<f64>;

    /// Fractional wire coordinate of a position projected onto the plane.
    fn wire_coordinate(&self, position: &Point3<f64>, plane: PlaneId) -> f64;

    /// Converts a hit time in ticks to a drift coordinate in cm.
    fn ticks_to_x(&self, ticks: f64, plane: PlaneId) -> f64;

    /// TPC containing the position, if any.
    fn tpc_at(&self, position: &Point3<f64>) -> Option<TpcId>;

    /// All planes in the detector.
    fn planes(&self) -> Vec<PlaneId>;

    /// Maximum number of planes in any TPC.
    fn max_planes(&self) -> usize;
}

/// Space charge distortion provider.
pub trait SpaceCharge: Send + Sync {
    /// True if calibration spatial offsets are available.
    fn spatial_enabled(&self) -> bool;

    /// True if E-field offsets are available.
    fn efield_enabled(&self) -> bool;

    /// Offset from a true position to where its charge is reconstructed.
    fn position_offsets(&self, position: &Point3<f64>, tpc: TpcId) -> Vector3<f64>;

    /// Calibration offset from a reconstructed position back to the true one.
    fn cal_position_offsets(&self, position: &Point3<f64>, tpc: TpcId) -> Vector3<f64>;

    /// Relative E-field distortion at a position.
    fn efield_offsets(&self, position: &Point3<f64>, tpc: TpcId) -> Vector3<f64>;

    /// Unit vector of the nominal drift field.
    fn nominal_efield_direction(&self, _tpc: TpcId) -> Vector3<f64> {
        Vector3::x()
    }
}

/// Conversion from charge per unit length to energy per unit length.
pub trait Calorimetry: Send + Sync {
    /// Returns dE/dx in MeV/cm.
    ///
    /// # Arguments
    /// * `dqdx` - Charge per unit length (ADC/cm)
    /// * `peak_time` - Hit peak time in ticks
    /// * `plane` - Plane index
    /// * `t0` - Reference time of the particle
    /// * `efield` - Local electric field in kV/cm
    fn dedx(&self, dqdx: f64, peak_time: f64, plane: u32, t0: f64, efield: f64) -> f64;
}

impl<F> Calorimetry for F
where
    F: Fn(f64, f64, u32, f64, f64) -> f64 + Send + Sync,
{
    fn dedx(&self, dqdx: f64, peak_time: f64, plane: u32, t0: f64, efield: f64) -> f64 {
        self(dqdx, peak_time, plane, t0, efield)
    }
}

/// Scalar detector properties.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorProperties {
    /// Electron drift velocity (cm/us).
    pub drift_velocity: f64,
    /// Nominal drift field (kV/cm).
    pub efield: f64,
    /// Electron lifetime (us).
    pub electron_lifetime: f64,
    /// Sampling interval of the readout (ns per tick).
    pub sampling_interval: f64,
}

impl Default for DetectorProperties {
    fn default() -> Self {
        Self {
            drift_velocity: 0.1565,
            efield: 0.5,
            electron_lifetime: 3000.0,
            sampling_interval: 500.0,
        }
    }
}

impl DetectorProperties {
    /// Set drift velocity.
    #[must_use]
    pub fn with_drift_velocity(mut self, velocity: f64) -> Self {
        self.drift_velocity = velocity;
        self
    }

    /// Set nominal drift field.
    #[must_use]
    pub fn with_efield(mut self, efield: f64) -> Self {
        self.efield = efield;
        self
    }

    /// Set electron lifetime.
    #[must_use]
    pub fn with_electron_lifetime(mut self, lifetime: f64) -> Self {
        self.electron_lifetime = lifetime;
        self
    }

    /// Set sampling interval.
    #[must_use]
    pub fn with_sampling_interval(mut self, interval: f64) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Multiplicative correction for charge lost to attachment while
    /// drifting for `peak_time` ticks.
    #[must_use]
    pub fn lifetime_correction(&self, peak_time: f64) -> f64 {
        ((self.sampling_interval * peak_time) / (self.electron_lifetime * 1e3)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lifetime_correction() {
        let props = DetectorProperties::default()
            .with_sampling_interval(500.0)
            .with_electron_lifetime(1000.0);

        assert_relative_eq!(props.lifetime_correction(0.0), 1.0);
        // 2000 ticks * 500 ns = 1 ms = one lifetime
        assert_relative_eq!(props.lifetime_correction(2000.0), std::f64::consts::E);
    }

    #[test]
    fn test_closure_calorimetry() {
        let calo = |dqdx: f64, _t: f64, _p: u32, _t0: f64, _e: f64| dqdx * 0.01;
        assert_relative_eq!(calo.dedx(200.0, 0.0, 2, 0.0, 0.5), 2.0);
    }
}

//! Space charge corrections to pitch and drift field.

use nalgebra::{Point3, Vector3};
use showerreco_core::{ConfigError, SpaceCharge, TpcId};

/// Applies local space charge distortions to pitch and electric field.
///
/// Positions passed in are expected to be already corrected for spatial
/// distortions.
#[derive(Clone, Copy)]
pub struct SpaceChargeCorrector<'a> {
    provider: Option<&'a dyn SpaceCharge>,
}

impl<'a> SpaceChargeCorrector<'a> {
    /// Create a corrector. `None` means no space charge provider is
    /// configured; any correction request is then a configuration error.
    #[must_use]
    pub fn new(provider: Option<&'a dyn SpaceCharge>) -> Self {
        Self { provider }
    }

    /// Checks the provider can supply spatial corrections.
    ///
    /// # Errors
    /// Returns [`ConfigError::SpatialCorrectionDisabled`] otherwise.
    pub fn require_spatial(&self) -> Result<&'a dyn SpaceCharge, ConfigError> {
        self.provider
            .filter(|sce| sce.spatial_enabled())
            .ok_or(ConfigError::SpatialCorrectionDisabled)
    }

    /// Checks the provider can supply E-field corrections.
    ///
    /// # Errors
    /// Returns [`ConfigError::EFieldCorrectionDisabled`] otherwise.
    pub fn require_efield(&self) -> Result<&'a dyn SpaceCharge, ConfigError> {
        self.provider
            .filter(|sce| sce.efield_enabled())
            .ok_or(ConfigError::EFieldCorrectionDisabled)
    }

    /// Corrects a pitch for the squeezing or stretching of the track by
    /// spatial distortions.
    ///
    /// The uncorrected position is recovered, calibration offsets are sampled
    /// there and one pitch further along `direction`, and the pitch vector is
    /// adjusted by the difference between the two offsets.
    ///
    /// # Errors
    /// Returns [`ConfigError::SpatialCorrectionDisabled`] if spatial
    /// corrections are unavailable.
    pub fn correct_pitch(
        &self,
        pitch: f64,
        position: &Point3<f64>,
        direction: &Vector3<f64>,
        tpc: TpcId,
    ) -> Result<f64, ConfigError> {
        let sce = self.require_spatial()?;

        let uncorrected = position + sce.position_offsets(position, tpc);
        let offset = sce.cal_position_offsets(&uncorrected, tpc);

        let next = uncorrected + pitch * direction;
        let next_offset = sce.cal_position_offsets(&next, tpc);

        let pitch_vec = pitch * direction + (next_offset - offset);
        Ok(pitch_vec.norm())
    }

    /// Magnitude of the local drift field including distortions.
    ///
    /// # Errors
    /// Returns [`ConfigError::EFieldCorrectionDisabled`] if E-field
    /// corrections are unavailable.
    pub fn correct_efield(
        &self,
        efield: f64,
        position: &Point3<f64>,
        tpc: TpcId,
    ) -> Result<f64, ConfigError> {
        let sce = self.require_efield()?;

        let relative = sce.efield_offsets(position, tpc) + sce.nominal_efield_direction(tpc);
        Ok((relative * efield).norm())
    }
}

impl std::fmt::Debug for SpaceChargeCorrector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceChargeCorrector")
            .field("configured", &self.provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Uniform stretch along z proportional to z.
    struct LinearStretch {
        spatial: bool,
        efield: bool,
    }

    impl SpaceCharge for LinearStretch {
        fn spatial_enabled(&self) -> bool {
            self.spatial
        }

        fn efield_enabled(&self) -> bool {
            self.efield
        }

        fn position_offsets(&self, _position: &Point3<f64>, _tpc: TpcId) -> Vector3<f64> {
            Vector3::zeros()
        }

        fn cal_position_offsets(&self, position: &Point3<f64>, _tpc: TpcId) -> Vector3<f64> {
            Vector3::new(0.0, 0.0, 0.1 * position.z)
        }

        fn efield_offsets(&self, _position: &Point3<f64>, _tpc: TpcId) -> Vector3<f64> {
            Vector3::new(0.0, 0.1, 0.0)
        }
    }

    #[test]
    fn test_no_provider_is_fatal() {
        let corrector = SpaceChargeCorrector::new(None);
        assert_eq!(
            corrector.correct_pitch(0.3, &Point3::origin(), &Vector3::z(), TpcId(0)),
            Err(ConfigError::SpatialCorrectionDisabled)
        );
        assert_eq!(
            corrector.correct_efield(0.5, &Point3::origin(), TpcId(0)),
            Err(ConfigError::EFieldCorrectionDisabled)
        );
    }

    #[test]
    fn test_disabled_modes_are_fatal() {
        let sce = LinearStretch {
            spatial: false,
            efield: true,
        };
        let corrector = SpaceChargeCorrector::new(Some(&sce));
        assert!(corrector
            .correct_pitch(0.3, &Point3::origin(), &Vector3::z(), TpcId(0))
            .is_err());
        assert!(corrector
            .correct_efield(0.5, &Point3::origin(), TpcId(0))
            .is_ok());
    }

    #[test]
    fn test_pitch_stretch() {
        let sce = LinearStretch {
            spatial: true,
            efield: true,
        };
        let corrector = SpaceChargeCorrector::new(Some(&sce));

        let along_z = corrector
            .correct_pitch(0.3, &Point3::new(0.0, 0.0, 50.0), &Vector3::z(), TpcId(0))
            .unwrap();
        assert_relative_eq!(along_z, 0.33, epsilon = 1e-12);

        // No offset gradient transverse to z
        let along_y = corrector
            .correct_pitch(0.3, &Point3::new(0.0, 0.0, 50.0), &Vector3::y(), TpcId(0))
            .unwrap();
        assert_relative_eq!(along_y, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_efield_magnitude() {
        let sce = LinearStretch {
            spatial: true,
            efield: true,
        };
        let corrector = SpaceChargeCorrector::new(Some(&sce));
        let field = corrector
            .correct_efield(0.5, &Point3::new(10.0, 0.0, 0.0), TpcId(0))
            .unwrap();
        assert_relative_eq!(field, 0.5 * (1.0_f64 + 0.01).sqrt(), epsilon = 1e-12);
    }
}

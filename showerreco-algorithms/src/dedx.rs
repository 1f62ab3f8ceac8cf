//! dE/dx of the initial track of a shower from its trajectory points.
//!
//! Each space point of the initial track is matched to the closest
//! trajectory point, which provides the local direction and hence the 3D
//! pitch seen by the wire of the space point's hit. Points where the pitch or
//! collected charge is unreliable are rejected. The surviving values are
//! trimmed per plane at the onset of pair production and summarised by the
//! median or mean.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc,
    clippy::float_cmp
)]

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use log::{debug, error, trace, warn};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use showerreco_core::{
    Calorimetry, CandidateError, ConfigError, DetectorProperties, Geometry, Hit,
    HitAssociations, Result, ShowerElementHolder, SpaceCharge, SpacePoint, Trajectory,
};

use crate::snippets::{organize_hits, HitSnippets};
use crate::space_charge::SpaceChargeCorrector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `dedx_cut` above this value disables trimming.
pub const DEDX_CUT_DISABLED_ABOVE: f64 = 10.0;

/// Value reported for planes with no usable dE/dx.
pub const NO_DEDX: f64 = -999.0;

/// Values outside `[0, MAX_PLAUSIBLE_DEDX]` are ignored by the mean.
pub const MAX_PLAUSIBLE_DEDX: f64 = 10.0;

/// Minimum number of values needed to trim a sequence.
const MIN_VALUES_FOR_TRIM: usize = 4;

/// Configuration for the trajectory point dE/dx estimator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct DedxConfig {
    /// Minimum angle between the track and the wire direction (radians).
    pub min_angle_to_wire: f64,
    /// Electronics shaping time (us).
    pub shaping_time: f64,
    /// Minimum distance from the start, in wire pitches.
    pub min_dist_cut_off: f64,
    /// Maximum space point to trajectory point distance, in wire pitches.
    pub max_dist: f64,
    /// Maximum distance along the track to use (cm).
    pub dedx_track_length: f64,
    /// dE/dx threshold used to find pair production (MeV/cm).
    pub dedx_cut: f64,
    /// Summarise with the median rather than the mean.
    pub use_median: bool,
    /// Also apply the distance cuts relative to the shower start position.
    pub cut_start_position: bool,
    /// Use the particle T0 as the reference time.
    pub t0_correct: bool,
    /// Correct the pitch for space charge.
    pub sce_correct_pitch: bool,
    /// Use the local E-field from space charge in the calorimetry.
    pub sce_correct_efield: bool,
    /// Input positions are already corrected for space charge.
    pub sce_input_corrected: bool,
    /// Sum all hits on a readout snippet instead of using one.
    pub sum_hit_snippets: bool,
}

impl Default for DedxConfig {
    fn default() -> Self {
        Self {
            min_angle_to_wire: 0.0,
            shaping_time: 10_000.0,
            min_dist_cut_off: 2.0,
            max_dist: 2.0,
            dedx_track_length: 3.0,
            dedx_cut: 999.0,
            use_median: true,
            cut_start_position: false,
            t0_correct: false,
            sce_correct_pitch: false,
            sce_correct_efield: false,
            sce_input_corrected: false,
            sum_hit_snippets: false,
        }
    }
}

impl DedxConfig {
    /// Set minimum angle to the wire direction.
    #[must_use]
    pub fn with_min_angle_to_wire(mut self, radians: f64) -> Self {
        self.min_angle_to_wire = radians;
        self
    }

    /// Set shaping time.
    #[must_use]
    pub fn with_shaping_time(mut self, us: f64) -> Self {
        self.shaping_time = us;
        self
    }

    /// Set minimum distance cut in wire pitches.
    #[must_use]
    pub fn with_min_dist_cut_off(mut self, wires: f64) -> Self {
        self.min_dist_cut_off = wires;
        self
    }

    /// Set maximum matching distance in wire pitches.
    #[must_use]
    pub fn with_max_dist(mut self, wires: f64) -> Self {
        self.max_dist = wires;
        self
    }

    /// Set the track length to use.
    #[must_use]
    pub fn with_dedx_track_length(mut self, cm: f64) -> Self {
        self.dedx_track_length = cm;
        self
    }

    /// Set the pair production cut.
    #[must_use]
    pub fn with_dedx_cut(mut self, cut: f64) -> Self {
        self.dedx_cut = cut;
        self
    }

    /// Set median or mean summary.
    #[must_use]
    pub fn with_use_median(mut self, median: bool) -> Self {
        self.use_median = median;
        self
    }

    /// Set start position cuts.
    #[must_use]
    pub fn with_cut_start_position(mut self, cut: bool) -> Self {
        self.cut_start_position = cut;
        self
    }

    /// Set T0 correction.
    #[must_use]
    pub fn with_t0_correct(mut self, correct: bool) -> Self {
        self.t0_correct = correct;
        self
    }

    /// Set space charge corrections. Both require corrected input.
    #[must_use]
    pub fn with_sce(mut self, pitch: bool, efield: bool, input_corrected: bool) -> Self {
        self.sce_correct_pitch = pitch;
        self.sce_correct_efield = efield;
        self.sce_input_corrected = input_corrected;
        self
    }

    /// Set snippet summing.
    #[must_use]
    pub fn with_sum_hit_snippets(mut self, sum: bool) -> Self {
        self.sum_hit_snippets = sum;
        self
    }

    /// Checks the configuration is consistent.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if (self.sce_correct_pitch || self.sce_correct_efield) && !self.sce_input_corrected {
            return Err(ConfigError::UncorrectedInput);
        }
        let non_negative = [
            ("min_angle_to_wire", self.min_angle_to_wire),
            ("shaping_time", self.shaping_time),
            ("min_dist_cut_off", self.min_dist_cut_off),
            ("max_dist", self.max_dist),
            ("dedx_track_length", self.dedx_track_length),
        ];
        for (name, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if self.dedx_cut.is_nan() {
            return Err(ConfigError::InvalidParameter {
                name: "dedx_cut",
                value: self.dedx_cut,
            });
        }
        Ok(())
    }
}

/// Element store labels read and written by [`TrajPointDedx::calculate_element`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DedxLabels {
    /// Shower start position (point).
    pub shower_start_position_input: String,
    /// Initial track hits (hit list), read only when summing snippets.
    pub initial_track_hits_input: String,
    /// Initial track space points (space point list).
    pub initial_track_space_points_input: String,
    /// Initial track (trajectory).
    pub initial_track_input: String,
    /// Summary dE/dx per plane (value list).
    pub shower_dedx_output: String,
    /// dE/dx uncertainty per plane (value list).
    pub shower_dedx_err_output: String,
    /// Best plane (integer).
    pub shower_best_plane_output: String,
    /// Trimmed dE/dx sequences (plane value map).
    pub shower_dedx_vec_output: String,
}

impl Default for DedxLabels {
    fn default() -> Self {
        Self {
            shower_start_position_input: "ShowerStartPosition".into(),
            initial_track_hits_input: "InitialTrackHits".into(),
            initial_track_space_points_input: "InitialTrackSpacePoints".into(),
            initial_track_input: "InitialTrack".into(),
            shower_dedx_output: "ShowerdEdx".into(),
            shower_dedx_err_output: "ShowerdEdxErr".into(),
            shower_best_plane_output: "ShowerBestPlane".into(),
            shower_dedx_vec_output: "ShowerdEdxVec".into(),
        }
    }
}

/// Inputs for one shower candidate.
#[derive(Clone, Copy)]
pub struct DedxInput<'a> {
    /// Shower start position.
    pub start_position: Point3<f64>,
    /// Initial track trajectory, ordered from its start.
    pub trajectory: &'a Trajectory,
    /// Space points of the initial track.
    pub space_points: &'a [SpacePoint],
    /// Hits of the initial track, used when summing snippets.
    pub track_hits: &'a [Hit],
    /// Space point to hit lookup.
    pub associations: &'a dyn HitAssociations,
    /// Particle T0, if one was found.
    pub t0: Option<f64>,
}

/// dE/dx of one shower candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct DedxResult {
    /// Summary dE/dx per plane index in the detector, [`NO_DEDX`] where
    /// there is none.
    pub dedx: Vec<f64>,
    /// Uncertainty per plane. Not estimated, always empty.
    pub dedx_err: Vec<f64>,
    /// Plane with the most accepted space points.
    pub best_plane: u32,
    /// Trimmed dE/dx sequence per plane, in track order.
    pub dedx_per_plane: BTreeMap<u32, Vec<f64>>,
    /// Number of accepted space points per plane before trimming.
    pub hits_per_plane: BTreeMap<u32, usize>,
}

impl DedxResult {
    /// Summary dE/dx of the best plane.
    #[must_use]
    pub fn best_plane_dedx(&self) -> f64 {
        self.dedx
            .get(self.best_plane as usize)
            .copied()
            .unwrap_or(NO_DEDX)
    }
}

/// Trajectory point dE/dx estimator.
pub struct TrajPointDedx<'a> {
    geometry: &'a dyn Geometry,
    detector: &'a DetectorProperties,
    calorimetry: &'a dyn Calorimetry,
    space_charge: SpaceChargeCorrector<'a>,
    config: DedxConfig,
    labels: DedxLabels,
}

impl<'a> TrajPointDedx<'a> {
    /// Create an estimator.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the configuration is inconsistent or asks
    /// for a space charge correction the provider cannot supply.
    pub fn new(
        geometry: &'a dyn Geometry,
        detector: &'a DetectorProperties,
        calorimetry: &'a dyn Calorimetry,
        space_charge: Option<&'a dyn SpaceCharge>,
        config: DedxConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let space_charge = SpaceChargeCorrector::new(space_charge);
        if config.sce_correct_pitch {
            space_charge.require_spatial()?;
        }
        if config.sce_correct_efield {
            space_charge.require_efield()?;
        }
        Ok(Self {
            geometry,
            detector,
            calorimetry,
            space_charge,
            config,
            labels: DedxLabels::default(),
        })
    }

    /// Set the element store labels.
    #[must_use]
    pub fn with_labels(mut self, labels: DedxLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Get current configuration.
    #[must_use]
    pub fn config(&self) -> &DedxConfig {
        &self.config
    }

    /// Get current labels.
    #[must_use]
    pub fn labels(&self) -> &DedxLabels {
        &self.labels
    }

    /// Computes the dE/dx of one candidate.
    pub fn calculate(&self, input: &DedxInput<'_>) -> Result<DedxResult> {
        if input.space_points.is_empty() {
            warn!("no space points in the initial track");
            return Err(CandidateError::NoSpacePoints.into());
        }

        let t0 = if self.config.t0_correct {
            input.t0.unwrap_or(0.0)
        } else {
            0.0
        };

        let snippets = self
            .config
            .sum_hit_snippets
            .then(|| organize_hits(input.track_hits));

        let n_planes = self.geometry.max_planes() as u32;
        let mut values: BTreeMap<u32, Vec<f64>> = (0..n_planes).map(|p| (p, Vec::new())).collect();
        let mut hits_per_plane: BTreeMap<u32, usize> = (0..n_planes).map(|p| (p, 0)).collect();

        for sp in input.space_points {
            if let Some((plane, dedx)) = self.space_point_dedx(sp, input, snippets.as_ref(), t0)? {
                trace!("adding dE/dx {dedx} on plane {plane}");
                *hits_per_plane.entry(plane).or_default() += 1;
                values.entry(plane).or_default().push(dedx);
            }
        }

        let mut best_plane = None;
        let mut max_hits = 0;
        for (&plane, &n_hits) in &hits_per_plane {
            debug!("plane {plane} has {n_hits} accepted hits");
            if n_hits > max_hits {
                best_plane = Some(plane);
                max_hits = n_hits;
            }
        }
        let Some(best_plane) = best_plane else {
            error!("no hits in any plane");
            return Err(CandidateError::NoHitsInAnyPlane.into());
        };

        let mut dedx_per_plane: BTreeMap<u32, Vec<f64>> = self
            .geometry
            .planes()
            .into_iter()
            .map(|plane_id| (plane_id.plane, Vec::new()))
            .collect();
        for (&plane, seq) in &values {
            dedx_per_plane.insert(plane, find_dedx_length(seq, self.config.dedx_cut));
        }

        let dedx = dedx_per_plane
            .values()
            .map(|seq| summarise(seq, self.config.use_median))
            .collect();

        debug!("best plane {best_plane}");
        Ok(DedxResult {
            dedx,
            dedx_err: Vec::new(),
            best_plane,
            dedx_per_plane,
            hits_per_plane,
        })
    }

    /// Reads the candidate from the element store, computes its dE/dx and
    /// writes the results back.
    pub fn calculate_element(
        &self,
        holder: &mut ShowerElementHolder,
        associations: &dyn HitAssociations,
        t0: Option<f64>,
    ) -> Result<()> {
        let labels = &self.labels;
        let result = {
            let start_position = *holder
                .get_element::<Point3<f64>>(&labels.shower_start_position_input)
                .inspect_err(|e| error!("{e}, returning"))?;
            let space_points: &Vec<SpacePoint> = holder
                .get_element(&labels.initial_track_space_points_input)
                .inspect_err(|e| error!("{e}, returning"))?;
            let trajectory: &Trajectory = holder
                .get_element(&labels.initial_track_input)
                .inspect_err(|e| error!("{e}, returning"))?;
            let track_hits: &[Hit] = if self.config.sum_hit_snippets {
                holder
                    .get_element::<Vec<Hit>>(&labels.initial_track_hits_input)?
                    .as_slice()
            } else {
                &[]
            };

            self.calculate(&DedxInput {
                start_position,
                trajectory,
                space_points,
                track_hits,
                associations,
                t0,
            })?
        };

        holder.set_element(result.dedx, &labels.shower_dedx_output);
        holder.set_element(result.dedx_err, &labels.shower_dedx_err_output);
        holder.set_element(i64::from(result.best_plane), &labels.shower_best_plane_output);
        holder.set_element(result.dedx_per_plane, &labels.shower_dedx_vec_output);
        Ok(())
    }

    /// Computes independent candidates in parallel.
    pub fn calculate_batch(&self, candidates: &[DedxInput<'_>]) -> Vec<Result<DedxResult>> {
        candidates
            .par_iter()
            .map(|candidate| self.calculate(candidate))
            .collect()
    }

    /// dE/dx of a single space point, `None` if the point is rejected.
    fn space_point_dedx(
        &self,
        sp: &SpacePoint,
        input: &DedxInput<'_>,
        snippets: Option<&HitSnippets>,
        t0: f64,
    ) -> Result<Option<(u32, f64)>> {
        let Some(hit) = input.associations.hits_for(sp).first() else {
            warn!(
                "no hit for space point {}, the association is probably wrong",
                sp.id.0
            );
            return Ok(None);
        };

        if snippets.is_some_and(|s| !s.is_primary(hit)) {
            return Ok(None);
        }

        let plane_id = hit.plane_id();
        let wire_pitch = self.geometry.wire_pitch(plane_id);

        if self.geometry.tpc_at(&input.start_position) != Some(hit.wire.tpc()) {
            return Ok(None);
        }

        let min_dist = self.config.min_dist_cut_off * wire_pitch;
        let track_length = self.config.dedx_track_length;
        let position = sp.position;

        if self.config.cut_start_position {
            let dist_from_start = (position - input.start_position).norm();
            if dist_from_start < min_dist || dist_from_start > track_length {
                return Ok(None);
            }
        }

        let Some(index) = self.closest_trajectory_point(&position, wire_pitch, input.trajectory)
        else {
            return Ok(None);
        };
        let traj_point = &input.trajectory.points[index];
        let traj_start = input.trajectory.points[0].position;

        let from_traj_start = (traj_point.position - traj_start).norm();
        let from_shower_start = (traj_point.position - input.start_position).norm();
        if from_traj_start == 0.0 || from_shower_start == 0.0 || from_traj_start < min_dist {
            return Ok(None);
        }

        // Project into YZ so the angle into the wire planes is left to the
        // shaping time cut.
        let direction = traj_point.direction;
        let direction_yz = Vector3::new(0.0, direction.y, direction.z);
        let plane_direction = self.geometry.increasing_wire_direction(plane_id);

        if (FRAC_PI_2 - direction_yz.angle(&plane_direction)).abs() < self.config.min_angle_to_wire
        {
            debug!("space point {} removed by the angle cut", sp.id.0);
            return Ok(None);
        }

        let along_plane = direction.dot(&plane_direction);
        let distance_in_x = direction.x * (wire_pitch / along_plane);
        let time_taken = (distance_in_x / self.detector.drift_velocity).abs();
        if time_taken.is_nan() || time_taken > self.config.shaping_time {
            debug!("space point {} removed by the shaping time cut", sp.id.0);
            return Ok(None);
        }

        if from_traj_start > track_length {
            return Ok(None);
        }

        let mut pitch = (direction * (wire_pitch / along_plane)).norm();
        if self.config.sce_correct_pitch {
            pitch = self.space_charge.correct_pitch(
                pitch,
                &position,
                &direction.normalize(),
                hit.wire.tpc(),
            )?;
        }

        let charge = snippets
            .and_then(|s| s.get(hit))
            .map_or(hit.integral, |snippet| snippet.total_integral());
        let dqdx = charge / pitch;

        let mut efield = self.detector.efield;
        if self.config.sce_correct_efield {
            efield = self
                .space_charge
                .correct_efield(efield, &position, hit.wire.tpc())?;
        }

        let plane = plane_id.plane;
        let dedx = self
            .calorimetry
            .dedx(dqdx, hit.peak_time, plane, t0, efield);
        Ok(Some((plane, dedx)))
    }

    /// Index of the closest valid trajectory point within the matching
    /// distance.
    fn closest_trajectory_point(
        &self,
        position: &Point3<f64>,
        wire_pitch: f64,
        trajectory: &Trajectory,
    ) -> Option<usize> {
        let max_dist = self.config.max_dist * wire_pitch;
        trajectory
            .iter_valid()
            .map(|(index, point)| (index, (position - point.position).norm()))
            .filter(|&(_, dist)| dist < max_dist)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

impl std::fmt::Debug for TrajPointDedx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrajPointDedx")
            .field("detector", self.detector)
            .field("space_charge", &self.space_charge)
            .field("config", &self.config)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

/// Trims a dE/dx sequence at the onset of pair production.
///
/// Electrons have a flat dE/dx above ~10 MeV, so a sustained jump across
/// `dedx_cut` means the electron has pair produced or the shower has
/// started. The first three values decide by majority whether the sequence
/// sits above or below the cut. They are always kept; later values are kept
/// while they stay on the same side. A value on the wrong side is dropped as
/// a Landau fluctuation if either of the next two values is above the cut,
/// whichever side is expected, otherwise the sequence ends there.
///
/// Sequences shorter than four values, or a cut above
/// [`DEDX_CUT_DISABLED_ABOVE`], are returned unchanged.
#[must_use]
pub fn find_dedx_length(values: &[f64], dedx_cut: f64) -> Vec<f64> {
    if dedx_cut > DEDX_CUT_DISABLED_ABOVE || values.len() < MIN_VALUES_FOR_TRIM {
        return values.to_vec();
    }

    let upper_bound = values[..3].iter().filter(|&&v| v > dedx_cut).count() > 1;
    let expected = |v: f64| {
        if upper_bound {
            v > dedx_cut
        } else {
            v < dedx_cut
        }
    };

    // Index 2 is already kept and is not revisited.
    let mut kept = values[..3].to_vec();
    for (i, &value) in values.iter().enumerate().skip(3) {
        if expected(value) {
            kept.push(value);
            continue;
        }
        // The lookahead looks for values above the cut in both modes.
        let next_above = values
            .iter()
            .skip(i + 1)
            .take(2)
            .any(|&next| next > dedx_cut);
        if next_above {
            trace!("dropping fluctuation {value}");
            continue;
        }
        break;
    }
    kept
}

/// Median of the values, averaging the middle pair for even lengths.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Mean of the plausible values divided by the full length of the sequence.
#[must_use]
pub fn filtered_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values
        .iter()
        .filter(|&&v| (0.0..=MAX_PLAUSIBLE_DEDX).contains(&v))
        .sum();
    Some(sum / values.len() as f64)
}

fn summarise(values: &[f64], use_median: bool) -> f64 {
    let summary = if use_median {
        median(values)
    } else {
        filtered_mean(values)
    };
    summary.unwrap_or(NO_DEDX)
}

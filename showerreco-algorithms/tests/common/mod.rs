#![allow(dead_code)]
//! Deterministic detector fakes shared by the integration tests.

use std::collections::HashMap;

use showerreco_core::{
    Geometry, Hit, PlaneId, Point3, SpaceCharge, SpacePoint, SpacePointId, TpcId, Trajectory,
    TrajectoryPoint, Vector3, WireId,
};

pub const PITCH: f64 = 0.3;
pub const CM_PER_TICK: f64 = 0.08;

/// Two TPCs split at x = 0, three planes each. Plane 2 wires increase
/// along z, planes 0 and 1 at +-60 degrees.
pub struct TwoTpcGeometry;

impl TwoTpcGeometry {
    pub fn plane_direction(plane: u32) -> Vector3<f64> {
        let (s, c) = 60.0_f64.to_radians().sin_cos();
        match plane {
            0 => Vector3::new(0.0, s, c),
            1 => Vector3::new(0.0, -s, c),
            _ => Vector3::z(),
        }
    }
}

impl Geometry for TwoTpcGeometry {
    fn wire_pitch(&self, _plane: PlaneId) -> f64 {
        PITCH
    }

    fn increasing_wire_direction(&self, plane: PlaneId) -> Vector3<f64> {
        Self::plane_direction(plane.plane)
    }

    fn wire_coordinate(&self, position: &Point3<f64>, plane: PlaneId) -> f64 {
        position.coords.dot(&Self::plane_direction(plane.plane)) / PITCH
    }

    fn ticks_to_x(&self, ticks: f64, _plane: PlaneId) -> f64 {
        ticks * CM_PER_TICK
    }

    fn tpc_at(&self, position: &Point3<f64>) -> Option<TpcId> {
        if position.x.abs() > 250.0 || position.y.abs() > 120.0 {
            return None;
        }
        if position.z < 0.0 || position.z > 1000.0 {
            return None;
        }
        Some(if position.x >= 0.0 { TpcId(0) } else { TpcId(1) })
    }

    fn planes(&self) -> Vec<PlaneId> {
        (0..2)
            .flat_map(|tpc| (0..3).map(move |plane| PlaneId::new(tpc, plane)))
            .collect()
    }

    fn max_planes(&self) -> usize {
        3
    }
}

/// Space charge with fixed relative field distortion and no spatial offsets.
pub struct FieldOnlySpaceCharge {
    pub spatial: bool,
    pub efield: bool,
    pub field_offset: Vector3<f64>,
}

impl SpaceCharge for FieldOnlySpaceCharge {
    fn spatial_enabled(&self) -> bool {
        self.spatial
    }

    fn efield_enabled(&self) -> bool {
        self.efield
    }

    fn position_offsets(&self, _position: &Point3<f64>, _tpc: TpcId) -> Vector3<f64> {
        Vector3::zeros()
    }

    fn cal_position_offsets(&self, _position: &Point3<f64>, _tpc: TpcId) -> Vector3<f64> {
        Vector3::zeros()
    }

    fn efield_offsets(&self, _position: &Point3<f64>, _tpc: TpcId) -> Vector3<f64> {
        self.field_offset
    }
}

/// Calorimetry of dE/dx = dQ/dx / 100, ignoring time and field.
pub fn linear_calo(dqdx: f64, _peak_time: f64, _plane: u32, _t0: f64, _efield: f64) -> f64 {
    dqdx / 100.0
}

/// A straight initial track with one space point per trajectory point.
pub struct StraightTrack {
    pub start: Point3<f64>,
    pub trajectory: Trajectory,
    pub space_points: Vec<SpacePoint>,
    pub associations: HashMap<SpacePointId, Vec<Hit>>,
    pub hits: Vec<Hit>,
}

impl StraightTrack {
    /// `n` points spaced by one pitch along `direction` from `start`, each
    /// with a single hit of `integral` on `tpc`/`plane`.
    pub fn new(
        start: Point3<f64>,
        direction: Vector3<f64>,
        n: u32,
        tpc: u32,
        plane: u32,
        integral: f64,
    ) -> Self {
        let direction = direction.normalize();
        let mut trajectory = Trajectory::default();
        let mut space_points = Vec::new();
        let mut associations = HashMap::new();
        let mut hits = Vec::new();

        for k in 0..n {
            let position = start + f64::from(k) * PITCH * direction;
            trajectory
                .points
                .push(TrajectoryPoint::new(position, direction));

            let sp = SpacePoint {
                id: SpacePointId(u64::from(k)),
                position,
            };
            let hit = Hit::new(
                u64::from(k),
                WireId::new(tpc, plane, 100 + k),
                200.0 + f64::from(k),
                integral,
            );
            space_points.push(sp);
            associations.insert(sp.id, vec![hit]);
            hits.push(hit);
        }

        Self {
            start,
            trajectory,
            space_points,
            associations,
            hits,
        }
    }

    /// Replaces the integral of the hit on space point `k`.
    pub fn set_integral(&mut self, k: usize, integral: f64) {
        let id = self.space_points[k].id;
        if let Some(hits) = self.associations.get_mut(&id) {
            hits[0].integral = integral;
        }
        self.hits[k].integral = integral;
    }
}

//! showerreco-algorithms: Shower reconstruction algorithms.
//!
//! This crate provides the geometric and calorimetric building blocks:
//! - **Projection & ordering** of hits and space points along a shower axis
//! - **Charge centroid** with lifetime correction and outlier trimming
//! - **RMS gradient** to check the shower direction
//! - **Space charge** corrections to pitch and drift field
//! - **Snippet grouping** of hits fitted to the same readout pulse
//! - **Trajectory point dE/dx** of the initial track
//!
#![warn(missing_docs)]

pub mod centroid;
pub mod dedx;
pub mod gradient;
pub mod ordering;
pub mod projection;
pub mod snippets;
pub mod space_charge;

pub use centroid::{shower_centre, ChargeCentroid, ChargeCentroidEstimator, ChargeConfig};
pub use dedx::{
    find_dedx_length, DedxConfig, DedxInput, DedxLabels, DedxResult, TrajPointDedx, NO_DEDX,
};
pub use gradient::{calculate_rms, rms_shower_gradient};
pub use ordering::{
    order_shower_hits, order_shower_space_points, order_shower_space_points_by_distance,
    order_shower_space_points_perpendicular,
};
pub use projection::{
    distance_between_space_points, hit_coordinates, space_point_perpendicular,
    space_point_projection,
};
pub use snippets::{organize_hits, HitSnippets, Snippet};
pub use space_charge::SpaceChargeCorrector;

// Re-export core types
pub use showerreco_core::{Error, Result};

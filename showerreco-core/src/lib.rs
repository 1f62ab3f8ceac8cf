//! showerreco-core: Core types and interfaces for shower reconstruction.
//!
//! This crate provides the data model shared by the reconstruction
//! algorithms: hits, space points and trajectories, the detector
//! collaborator traits, the labelled element store, and the error tiers.
//!

pub mod detector;
pub mod element;
pub mod error;
pub mod hit;
pub mod space_point;
pub mod trajectory;

pub use detector::{Calorimetry, DetectorProperties, Geometry, SpaceCharge};
pub use element::{Element, ElementValue, ShowerElementHolder};
pub use error::{CandidateError, ConfigError, Error, Result};
pub use hit::{Hit, HitId, PlaneId, SignalType, SnippetKey, TpcId, WireId};
pub use space_point::{HitAssociations, SpacePoint, SpacePointId};
pub use trajectory::{Trajectory, TrajectoryPoint};

pub use nalgebra::{Point3, Vector2, Vector3};

//! Level-of-detail control for GPU-instanced geometry: distance-driven target
//! instance counts, per-frame smoothed convergence, and screen-ratio calibration.

mod calibrate;
mod converge;
mod manager;
mod object;
mod renderable;
mod target;

pub use calibrate::{Aabb, CalibrationError, calibrate, tan_half_fov};
pub use converge::{ConvergeStep, MIN_PROGRESS, VALUE_FLOOR, advance};
pub use manager::{LodManager, LodObjectId, ManagerSettings};
pub use object::{LodSettings, MultiMeshLod};
pub use renderable::InstancedRenderable;
pub use target::{CountRange, LodDistances, camera_distance, compute_target};

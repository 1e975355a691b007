//! The capability a host renderable must provide to be driven by LOD.

use glam::DVec3;

use crate::calibrate::Aabb;

/// A batched-instance renderable whose visible instance count can be adjusted.
pub trait InstancedRenderable {
    /// Total number of instances in the instance buffer.
    fn instance_count(&self) -> i64;

    /// Number of instances currently drawn.
    fn visible_instance_count(&self) -> i64;

    /// Set how many instances are drawn.
    fn set_visible_instance_count(&mut self, count: i64);

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// World-space bounds of all instances.
    fn world_aabb(&self) -> Aabb;

    /// World-space origin used for the camera distance.
    fn world_origin(&self) -> DVec3;

    /// Whether the renderable is part of the live render graph. Detached
    /// renderables are skipped for the frame.
    fn is_attached(&self) -> bool {
        true
    }
}

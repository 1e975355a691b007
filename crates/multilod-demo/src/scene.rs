//! Simulated instanced patches scattered over a field.

use glam::DVec3;
use multilod_config::DemoConfig;
use multilod_lod::{Aabb, InstancedRenderable};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// A patch of instanced foliage standing in for a GPU multimesh.
#[derive(Debug, Clone)]
pub(crate) struct FieldPatch {
    origin: DVec3,
    half_extents: DVec3,
    total: i64,
    visible_count: i64,
    visible: bool,
}

impl FieldPatch {
    pub(crate) fn new(origin: DVec3, half_extents: DVec3, total: i64) -> Self {
        Self {
            origin,
            half_extents,
            total,
            visible_count: total,
            visible: total > 0,
        }
    }
}

impl InstancedRenderable for FieldPatch {
    fn instance_count(&self) -> i64 {
        self.total
    }

    fn visible_instance_count(&self) -> i64 {
        self.visible_count
    }

    fn set_visible_instance_count(&mut self, count: i64) {
        self.visible_count = count.clamp(0, self.total);
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn world_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.origin, self.half_extents)
    }

    fn world_origin(&self) -> DVec3 {
        self.origin
    }
}

/// Scatter `object_count` patches over the field with a fixed seed.
pub(crate) fn scatter_patches(config: &DemoConfig) -> Vec<FieldPatch> {
    let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);
    let extent = config.field_half_extent_m.max(1.0);

    (0..config.object_count)
        .map(|_| {
            let origin = DVec3::new(
                rng.gen_range(-extent..extent),
                0.0,
                rng.gen_range(-extent..extent),
            );
            let half_extents = DVec3::new(
                rng.gen_range(2.0..6.0),
                rng.gen_range(0.3..1.5),
                rng.gen_range(2.0..6.0),
            );
            FieldPatch::new(origin, half_extents, config.instances_per_object)
        })
        .collect()
}

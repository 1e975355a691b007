//! Per-object LOD driver: owns an instanced renderable and steers its visible
//! instance count from camera distance every frame.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::calibrate::{CalibrationError, calibrate};
use crate::converge::{ConvergeStep, advance};
use crate::manager::{LodManager, LodObjectId};
use crate::renderable::InstancedRenderable;
use crate::target::{CountRange, LodDistances, camera_distance, compute_target};

/// Tunables for a single LOD-driven object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodSettings {
    /// Disabled objects are never updated.
    pub enabled: bool,
    /// Use the manager's global distance multiplier instead of 1.0.
    pub affected_by_distance_multipliers: bool,
    /// Derive the distance band from screen ratios and the object's bounds.
    pub use_screen_percentage: bool,
    /// Distance (m) at or below which all instances show. Overwritten by calibration.
    pub min_distance: f64,
    /// Distance (m) at or beyond which `min_count` instances show. Overwritten by calibration.
    pub max_distance: f64,
    /// Screen height percentage at which the object is at `max_distance`.
    pub min_ratio: f64,
    /// Screen height percentage at which the object is at `min_distance`.
    pub max_ratio: f64,
    pub min_count: i64,
    /// Negative means "all instances in the buffer".
    pub max_count: i64,
    /// Fraction of the remaining gap closed per second.
    pub fade_speed: f64,
    /// Shapes the distance curve; above 1 holds the maximum count longer.
    pub fade_exponent: f64,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            affected_by_distance_multipliers: true,
            use_screen_percentage: true,
            min_distance: 5.0,
            max_distance: 80.0,
            min_ratio: 2.0,
            max_ratio: 5.0,
            min_count: 0,
            max_count: -1,
            fade_speed: 1.0,
            fade_exponent: 1.0,
        }
    }
}

/// LOD state for one instanced renderable.
///
/// Lifecycle: [`new`](Self::new), then [`activate`](Self::activate) once the
/// object enters the scene. Each frame the host calls
/// [`process_data`](Self::process_data) with the camera position and
/// [`process`](Self::process) with the frame time.
/// [`deactivate`](Self::deactivate) stops all per-frame work.
pub struct MultiMeshLod<R: InstancedRenderable> {
    id: LodObjectId,
    renderable: R,
    settings: LodSettings,
    distances: LodDistances,
    target_count: i64,
    global_distance_multiplier: f64,
    registered: bool,
    active: bool,
    ready_finished: bool,
}

impl<R: InstancedRenderable> MultiMeshLod<R> {
    /// Wrap a renderable. A negative `max_count` resolves to the renderable's
    /// full instance count, and the object starts targeting that maximum.
    pub fn new(id: LodObjectId, renderable: R, mut settings: LodSettings) -> Self {
        if settings.max_count < 0 {
            settings.max_count = renderable.instance_count();
        }
        let distances = LodDistances::new(settings.min_distance, settings.max_distance);
        let target_count = settings.max_count;
        Self {
            id,
            renderable,
            settings,
            distances,
            target_count,
            global_distance_multiplier: 1.0,
            registered: false,
            active: false,
            ready_finished: false,
        }
    }

    /// Bring the object under LOD control.
    ///
    /// The first activation calibrates distances; a calibration failure is
    /// logged and the configured distances are kept. Every activation pulls the
    /// currently published multiplier and registers with the manager if not
    /// already registered.
    pub fn activate(&mut self, manager: &mut LodManager) {
        if !self.ready_finished {
            manager.debug_level_print(1, format_args!("{}: initializing", self.id));
            if let Err(err) = self.update_lod_aabb(manager) {
                error!(object = %self.id, "invalid bounds for instanced renderable: {err}");
            }
            self.ready_finished = true;
        }
        self.update_multiplier_from_manager(manager);
        self.active = true;
        self.try_register(manager);
    }

    /// Leave LOD control. No per-frame work happens until the next activation.
    pub fn deactivate(&mut self, manager: &mut LodManager) {
        manager.unregister(self.id);
        self.registered = false;
        self.active = false;
    }

    fn try_register(&mut self, manager: &mut LodManager) {
        if !self.registered || !manager.is_registered(self.id) {
            manager.register(self.id);
            self.registered = true;
        }
    }

    /// Recompute the distance band from the renderable's world bounds.
    ///
    /// Does nothing unless screen-percentage mode is on. On error the previous
    /// distances are left untouched.
    pub fn update_lod_aabb(&mut self, manager: &LodManager) -> Result<(), CalibrationError> {
        if !self.settings.use_screen_percentage {
            return Ok(());
        }
        let distances = calibrate(
            &self.renderable.world_aabb(),
            self.settings.min_ratio,
            self.settings.max_ratio,
            manager.tan_theta(),
        )?;
        debug!(
            object = %self.id,
            min = distances.min,
            max = distances.max,
            "calibrated LOD distances"
        );
        self.set_distances(distances);
        Ok(())
    }

    /// Pull the manager's published multiplier, or reset to 1.0 when opted out.
    pub fn update_multiplier_from_manager(&mut self, manager: &LodManager) {
        self.global_distance_multiplier = if self.settings.affected_by_distance_multipliers {
            manager.global_distance_multiplier()
        } else {
            1.0
        };
    }

    /// Recompute the target count for the given camera position.
    ///
    /// Returns the new target, or `None` when the object is disabled, inactive,
    /// or detached this frame.
    pub fn process_data(&mut self, camera_position: DVec3) -> Option<i64> {
        if !self.should_update() {
            return None;
        }
        let distance = camera_distance(camera_position, self.renderable.world_origin());
        self.target_count = compute_target(
            distance,
            self.distances,
            CountRange::new(self.settings.min_count, self.settings.max_count),
            self.settings.fade_exponent,
            self.global_distance_multiplier,
        );
        Some(self.target_count)
    }

    /// Move the visible count one frame toward the target and write it back.
    ///
    /// Returns the step taken, or `None` when nothing needed to change or the
    /// object was skipped. The step's visibility flags report the toggle that
    /// was applied to the renderable, which follows the renderable's own
    /// visibility rather than the previous count.
    pub fn process(&mut self, delta_time: f64, manager: &mut LodManager) -> Option<ConvergeStep> {
        if !self.should_update() {
            return None;
        }
        self.try_register(manager);

        let current = self.renderable.visible_instance_count();
        if current == self.target_count {
            return None;
        }

        let mut step = advance(
            current,
            self.target_count,
            delta_time,
            self.settings.fade_speed,
            self.settings.max_count,
        );
        self.renderable.set_visible_instance_count(step.next);

        step.became_hidden = step.next == 0 && self.renderable.is_visible();
        step.became_visible = step.next > 0 && !self.renderable.is_visible();
        if step.became_hidden {
            self.renderable.set_visible(false);
            manager.debug_level_print(3, format_args!("{}: hidden", self.id));
        } else if step.became_visible {
            self.renderable.set_visible(true);
            manager.debug_level_print(3, format_args!("{}: shown", self.id));
        }
        Some(step)
    }

    fn should_update(&self) -> bool {
        self.settings.enabled && self.active && self.renderable.is_attached()
    }

    pub fn id(&self) -> LodObjectId {
        self.id
    }

    pub fn renderable(&self) -> &R {
        &self.renderable
    }

    pub fn renderable_mut(&mut self) -> &mut R {
        &mut self.renderable
    }

    /// Settings with `max_count` resolved and `min_distance`/`max_distance`
    /// kept in sync with [`distances`](Self::distances).
    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// Current (unscaled) distance band.
    pub fn distances(&self) -> LodDistances {
        self.distances
    }

    /// Override the distance band. Screen-percentage calibration replaces it again.
    pub fn set_distances(&mut self, distances: LodDistances) {
        self.distances = distances;
        self.settings.min_distance = distances.min;
        self.settings.max_distance = distances.max;
    }

    pub fn target_count(&self) -> i64 {
        self.target_count
    }

    pub fn visible_count(&self) -> i64 {
        self.renderable.visible_instance_count()
    }

    pub fn is_visible(&self) -> bool {
        self.renderable.is_visible()
    }

    pub fn global_distance_multiplier(&self) -> f64 {
        self.global_distance_multiplier
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::Aabb;
    use crate::manager::ManagerSettings;

    struct TestPatch {
        total: i64,
        visible_count: i64,
        visible: bool,
        origin: DVec3,
        half_extents: DVec3,
        attached: bool,
    }

    impl TestPatch {
        fn new(total: i64) -> Self {
            Self {
                total,
                visible_count: total,
                visible: true,
                origin: DVec3::ZERO,
                half_extents: DVec3::splat(1.0),
                attached: true,
            }
        }
    }

    impl InstancedRenderable for TestPatch {
        fn instance_count(&self) -> i64 {
            self.total
        }

        fn visible_instance_count(&self) -> i64 {
            self.visible_count
        }

        fn set_visible_instance_count(&mut self, count: i64) {
            self.visible_count = count;
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

        fn is_attached(&self) -> bool {
            self.attached
        }
    }

    fn manual_settings() -> LodSettings {
        LodSettings {
            use_screen_percentage: false,
            ..Default::default()
        }
    }

    /// A negative maximum resolves to the full instance buffer and becomes the first target.
    #[test]
    fn test_negative_max_count_uses_all_instances() {
        let lod =
            MultiMeshLod::new(LodObjectId(1), TestPatch::new(250), LodSettings::default());
        assert_eq!(lod.settings().max_count, 250);
        assert_eq!(lod.target_count(), 250);
    }

    #[test]
    fn test_explicit_max_count_kept() {
        let settings = LodSettings {
            max_count: 40,
            ..manual_settings()
        };
        let lod = MultiMeshLod::new(LodObjectId(1), TestPatch::new(250), settings);
        assert_eq!(lod.settings().max_count, 40);
    }

    /// Activation calibrates from bounds when screen-percentage mode is on.
    #[test]
    fn test_activate_calibrates_distances() {
        let mut manager = LodManager::new(ManagerSettings {
            fov_y_degrees: 90.0,
            ..Default::default()
        });
        let mut lod =
            MultiMeshLod::new(LodObjectId(1), TestPatch::new(100), LodSettings::default());
        lod.activate(&mut manager);
        // 2 m cube, tan = 1: 5% -> 20 m, 2% -> 50 m
        assert!((lod.distances().min - 20.0).abs() < 1e-9);
        assert!((lod.distances().max - 50.0).abs() < 1e-9);
        assert_eq!(lod.settings().min_distance, lod.distances().min);
        assert_eq!(lod.settings().max_distance, lod.distances().max);
        assert!(lod.is_registered());
        assert!(manager.is_registered(LodObjectId(1)));
    }

    /// Degenerate bounds keep the configured distances and leave the object usable.
    #[test]
    fn test_degenerate_bounds_keep_configured_distances() {
        let mut manager = LodManager::default();
        let mut patch = TestPatch::new(100);
        patch.half_extents = DVec3::new(1.0, 0.0, 1.0);
        let mut lod = MultiMeshLod::new(LodObjectId(1), patch, LodSettings::default());
        lod.activate(&mut manager);
        assert_eq!(lod.distances(), LodDistances::new(5.0, 80.0));
        assert!(lod.is_active());
        assert!(matches!(
            lod.update_lod_aabb(&manager),
            Err(CalibrationError::DegenerateBounds { .. })
        ));
    }

    /// Activating twice never double-registers.
    #[test]
    fn test_activate_twice_registers_once() {
        let mut manager = LodManager::default();
        let mut lod = MultiMeshLod::new(LodObjectId(3), TestPatch::new(10), manual_settings());
        lod.activate(&mut manager);
        lod.activate(&mut manager);
        assert_eq!(manager.registered_count(), 1);
    }

    /// Opting out of multipliers pins the multiplier at 1.0.
    #[test]
    fn test_multiplier_opt_out() {
        let mut manager = LodManager::new(ManagerSettings {
            global_distance_multiplier: 3.0,
            ..Default::default()
        });
        let mut opted_in =
            MultiMeshLod::new(LodObjectId(1), TestPatch::new(10), manual_settings());
        let mut opted_out = MultiMeshLod::new(
            LodObjectId(2),
            TestPatch::new(10),
            LodSettings {
                affected_by_distance_multipliers: false,
                ..manual_settings()
            },
        );
        opted_in.activate(&mut manager);
        opted_out.activate(&mut manager);
        assert_eq!(opted_in.global_distance_multiplier(), 3.0);
        assert_eq!(opted_out.global_distance_multiplier(), 1.0);
    }

    #[test]
    fn test_process_data_computes_target() {
        let mut manager = LodManager::default();
        let settings = LodSettings {
            max_count: 100,
            ..manual_settings()
        };
        let mut lod = MultiMeshLod::new(LodObjectId(1), TestPatch::new(100), settings);
        lod.activate(&mut manager);
        assert_eq!(lod.process_data(DVec3::new(42.5, 0.0, 0.0)), Some(50));
        assert_eq!(lod.target_count(), 50);
    }

    /// Detached renderables are skipped without touching state.
    #[test]
    fn test_detached_is_skipped() {
        let mut manager = LodManager::default();
        let mut lod = MultiMeshLod::new(LodObjectId(1), TestPatch::new(100), manual_settings());
        lod.activate(&mut manager);
        lod.renderable_mut().attached = false;
        assert_eq!(lod.process_data(DVec3::new(500.0, 0.0, 0.0)), None);
        assert_eq!(lod.target_count(), 100);
        assert_eq!(lod.process(1.0, &mut manager), None);
    }

    /// Inactive or disabled objects do no per-frame work.
    #[test]
    fn test_inactive_and_disabled_are_skipped() {
        let mut manager = LodManager::default();
        let mut lod = MultiMeshLod::new(LodObjectId(1), TestPatch::new(100), manual_settings());
        assert_eq!(lod.process_data(DVec3::ZERO), None);

        lod.activate(&mut manager);
        lod.set_enabled(false);
        assert_eq!(lod.process_data(DVec3::new(500.0, 0.0, 0.0)), None);
        assert_eq!(lod.process(1.0, &mut manager), None);
        assert_eq!(lod.visible_count(), 100);
    }

    /// Moving far away drains the count to zero and hides the renderable.
    #[test]
    fn test_far_camera_hides_object() {
        let mut manager = LodManager::default();
        let mut lod = MultiMeshLod::new(LodObjectId(1), TestPatch::new(100), manual_settings());
        lod.activate(&mut manager);
        lod.process_data(DVec3::new(1000.0, 0.0, 0.0));
        assert_eq!(lod.target_count(), 0);

        let step = lod.process(1.0, &mut manager).unwrap();
        assert_eq!(step.next, 0);
        assert!(step.became_hidden);
        assert!(!lod.is_visible());
    }

    /// Coming back from hidden shows the renderable again.
    #[test]
    fn test_approach_shows_object() {
        let mut manager = LodManager::default();
        let mut patch = TestPatch::new(100);
        patch.visible_count = 0;
        patch.visible = false;
        let mut lod = MultiMeshLod::new(LodObjectId(1), patch, manual_settings());
        lod.activate(&mut manager);
        lod.process_data(DVec3::ZERO);

        let step = lod.process(0.5, &mut manager).unwrap();
        assert_eq!(step.next, 50);
        assert!(lod.is_visible());
        assert_eq!(lod.visible_count(), 50);
    }

    /// At the target nothing is written.
    #[test]
    fn test_process_at_target_is_noop() {
        let mut manager = LodManager::default();
        let mut lod = MultiMeshLod::new(LodObjectId(1), TestPatch::new(100), manual_settings());
        lod.activate(&mut manager);
        lod.process_data(DVec3::ZERO);
        assert_eq!(lod.process(1.0, &mut manager), None);
        assert_eq!(lod.visible_count(), 100);
    }

    /// Deactivation unregisters and stops updates; reactivation re-registers.
    #[test]
    fn test_deactivate_then_reactivate() {
        let mut manager = LodManager::default();
        let id = LodObjectId(9);
        let mut lod = MultiMeshLod::new(id, TestPatch::new(100), manual_settings());
        lod.activate(&mut manager);
        lod.deactivate(&mut manager);
        assert!(!manager.is_registered(id));
        assert!(!lod.is_registered());
        assert_eq!(lod.process_data(DVec3::new(1000.0, 0.0, 0.0)), None);
        assert_eq!(lod.process(1.0, &mut manager), None);
        assert!(!manager.is_registered(id));

        lod.activate(&mut manager);
        assert!(manager.is_registered(id));
        assert_eq!(manager.registered_count(), 1);
    }

    /// A multiplier published while the object was away is picked up on reactivation.
    #[test]
    fn test_reactivation_pulls_published_multiplier() {
        let mut manager = LodManager::default();
        let mut lod = MultiMeshLod::new(LodObjectId(2), TestPatch::new(100), manual_settings());
        lod.activate(&mut manager);
        assert_eq!(lod.global_distance_multiplier(), 1.0);

        lod.deactivate(&mut manager);
        manager.set_global_distance_multiplier(0.5);
        assert_eq!(lod.global_distance_multiplier(), 1.0);

        lod.activate(&mut manager);
        assert_eq!(lod.global_distance_multiplier(), 0.5);
        // 40 m with a halved band (2.5..40) is the far edge.
        assert_eq!(lod.process_data(DVec3::new(40.0, 0.0, 0.0)), Some(0));
    }

    /// A hidden renderable that still has instances is shown, and the step says so.
    #[test]
    fn test_step_reports_applied_visibility_toggle() {
        let mut manager = LodManager::default();
        let mut patch = TestPatch::new(100);
        patch.visible_count = 40;
        patch.visible = false;
        let mut lod = MultiMeshLod::new(LodObjectId(1), patch, manual_settings());
        lod.activate(&mut manager);
        lod.process_data(DVec3::ZERO);

        let step = lod.process(0.5, &mut manager).unwrap();
        assert_eq!(step.next, 70);
        assert!(step.became_visible);
        assert!(!step.became_hidden);
        assert!(lod.is_visible());
    }

    /// A manager-side unregistration is repaired on the next processed frame.
    #[test]
    fn test_process_retries_registration() {
        let mut manager = LodManager::default();
        let id = LodObjectId(4);
        let mut lod = MultiMeshLod::new(id, TestPatch::new(100), manual_settings());
        lod.activate(&mut manager);
        manager.unregister(id);
        lod.process(0.016, &mut manager);
        assert!(lod.is_registered());
        assert!(manager.is_registered(id));
    }
}

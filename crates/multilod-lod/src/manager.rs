//! Shared LOD state: the published distance multiplier, camera field of view,
//! and the set of registered objects.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibrate::tan_half_fov;

/// Identifier of an object driven by the LOD manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LodObjectId(pub u64);

impl LodObjectId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for LodObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lod#{}", self.0)
    }
}

/// Manager-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManagerSettings {
    /// Scalar applied to every opted-in object's distance band.
    pub global_distance_multiplier: f64,
    /// Vertical field of view of the LOD camera, in degrees.
    pub fov_y_degrees: f64,
    /// Verbosity of manager diagnostics (0 = silent).
    pub debug_level: u8,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            global_distance_multiplier: 1.0,
            fov_y_degrees: 70.0,
            debug_level: 0,
        }
    }
}

/// Collaborator that publishes global LOD parameters and tracks registrations.
///
/// Objects read the published values; only the host writes them.
#[derive(Debug)]
pub struct LodManager {
    global_distance_multiplier: f64,
    fov_y_degrees: f64,
    tan_theta: f64,
    debug_level: u8,
    registered: FxHashSet<LodObjectId>,
}

impl LodManager {
    pub fn new(settings: ManagerSettings) -> Self {
        Self {
            global_distance_multiplier: settings.global_distance_multiplier,
            fov_y_degrees: settings.fov_y_degrees,
            tan_theta: tan_half_fov(settings.fov_y_degrees),
            debug_level: settings.debug_level,
            registered: FxHashSet::default(),
        }
    }

    /// Register an object. Returns `false` if it was already registered.
    pub fn register(&mut self, id: LodObjectId) -> bool {
        let inserted = self.registered.insert(id);
        if inserted {
            self.debug_level_print(2, format_args!("{id} registered"));
        }
        inserted
    }

    /// Unregister an object. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: LodObjectId) -> bool {
        let removed = self.registered.remove(&id);
        if removed {
            self.debug_level_print(2, format_args!("{id} unregistered"));
        }
        removed
    }

    pub fn is_registered(&self, id: LodObjectId) -> bool {
        self.registered.contains(&id)
    }

    /// Registered object ids in ascending order.
    pub fn registered_ids(&self) -> Vec<LodObjectId> {
        let mut ids: Vec<_> = self.registered.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn global_distance_multiplier(&self) -> f64 {
        self.global_distance_multiplier
    }

    /// Publish a new global distance multiplier. Objects pick it up on their
    /// next `update_multiplier_from_manager`.
    pub fn set_global_distance_multiplier(&mut self, multiplier: f64) {
        self.debug_level_print(
            1,
            format_args!(
                "global distance multiplier {} -> {}",
                self.global_distance_multiplier, multiplier
            ),
        );
        self.global_distance_multiplier = multiplier;
    }

    pub fn fov_y_degrees(&self) -> f64 {
        self.fov_y_degrees
    }

    /// Tangent of half the vertical field of view.
    pub fn tan_theta(&self) -> f64 {
        self.tan_theta
    }

    pub fn set_fov_degrees(&mut self, fov_y_degrees: f64) {
        self.fov_y_degrees = fov_y_degrees;
        self.tan_theta = tan_half_fov(fov_y_degrees);
    }

    pub fn debug_level(&self) -> u8 {
        self.debug_level
    }

    pub fn set_debug_level(&mut self, level: u8) {
        self.debug_level = level;
    }

    /// Emit a diagnostic if `level` is within the configured verbosity.
    pub fn debug_level_print(&self, level: u8, message: fmt::Arguments<'_>) {
        if level <= self.debug_level {
            debug!(target: "multilod::manager", verbosity = level, "{message}");
        }
    }
}

impl Default for LodManager {
    fn default() -> Self {
        Self::new(ManagerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Registering twice is a no-op the second time.
    #[test]
    fn test_register_is_idempotent() {
        let mut manager = LodManager::default();
        let id = LodObjectId::new(7);
        assert!(manager.register(id));
        assert!(!manager.register(id));
        assert_eq!(manager.registered_count(), 1);
        assert!(manager.is_registered(id));
    }

    #[test]
    fn test_unregister() {
        let mut manager = LodManager::default();
        let id = LodObjectId::new(1);
        assert!(!manager.unregister(id));
        manager.register(id);
        assert!(manager.unregister(id));
        assert!(!manager.is_registered(id));
        assert_eq!(manager.registered_count(), 0);
    }

    #[test]
    fn test_registered_ids_sorted() {
        let mut manager = LodManager::default();
        for id in [5, 1, 3] {
            manager.register(LodObjectId::new(id));
        }
        assert_eq!(
            manager.registered_ids(),
            vec![LodObjectId(1), LodObjectId(3), LodObjectId(5)]
        );
    }

    #[test]
    fn test_default_settings() {
        let manager = LodManager::default();
        assert_eq!(manager.global_distance_multiplier(), 1.0);
        assert_eq!(manager.fov_y_degrees(), 70.0);
        assert!((manager.tan_theta() - 35.0f64.to_radians().tan()).abs() < 1e-12);
    }

    /// Changing the field of view refreshes the cached tangent.
    #[test]
    fn test_set_fov_updates_tan_theta() {
        let mut manager = LodManager::default();
        manager.set_fov_degrees(90.0);
        assert!((manager.tan_theta() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_publish_multiplier() {
        let mut manager = LodManager::default();
        manager.set_global_distance_multiplier(2.5);
        assert_eq!(manager.global_distance_multiplier(), 2.5);
    }

    #[test]
    fn test_object_id_display() {
        assert_eq!(LodObjectId::new(42).to_string(), "lod#42");
    }
}

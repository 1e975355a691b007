//! Distance-to-count mapping: how many instances an object should show at a given camera distance.

use glam::DVec3;

/// Distance band, in meters, over which the visible instance count scales.
///
/// Nearer than `min` the object shows its maximum count, farther than `max`
/// its minimum. The mapping is only monotonic when `max > min`; this is not
/// validated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodDistances {
    /// Distance at or below which the maximum count is shown.
    pub min: f64,
    /// Distance at or beyond which the minimum count is shown.
    pub max: f64,
}

impl LodDistances {
    /// Create a distance band.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Scale both bounds by a distance multiplier.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            min: self.min * multiplier,
            max: self.max * multiplier,
        }
    }

    /// Normalized proximity in `[0.0, 1.0]`: 1 at or nearer than `min`, 0 at or beyond `max`.
    ///
    /// A zero-width band degenerates to a step at `min`.
    pub fn proximity(&self, distance: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return if distance <= self.min { 1.0 } else { 0.0 };
        }
        ((self.max - distance) / span).clamp(0.0, 1.0)
    }
}

/// Inclusive bounds on the visible instance count. Callers keep `max >= min`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountRange {
    pub min: i64,
    pub max: i64,
}

impl CountRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Number of instances the range spans.
    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

/// Compute the target instance count for an object `distance` meters from the camera.
///
/// The distance band is scaled by `multiplier`, the clamped proximity is raised
/// to `fade_exponent`, and the shaped ratio is floored over the count span before
/// `counts.min` is added.
pub fn compute_target(
    distance: f64,
    distances: LodDistances,
    counts: CountRange,
    fade_exponent: f64,
    multiplier: f64,
) -> i64 {
    let proximity = distances.scaled(multiplier).proximity(distance);
    let ratio = proximity.powf(fade_exponent);
    (ratio * counts.span() as f64).floor() as i64 + counts.min
}

/// Euclidean distance from the camera to an object's world origin.
pub fn camera_distance(camera: DVec3, origin: DVec3) -> f64 {
    camera.distance(origin)
}

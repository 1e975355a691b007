//! Screen-ratio calibration: derive the distance band from object size and field of view.

use glam::DVec3;

use crate::target::LodDistances;

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: DVec3,
    /// Maximum corner of the bounding box.
    pub max: DVec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from a center point and half-extents.
    pub fn from_center_half_extents(center: DVec3, half: DVec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns the center point of the AABB.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Size along each axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the longest axis.
    pub fn longest_axis_size(&self) -> f64 {
        self.size().max_element()
    }

    /// Returns true if the box is flat, inverted, or NaN on at least one axis.
    pub fn has_no_area(&self) -> bool {
        let size = self.size();
        !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0)
    }
}

/// Reasons a distance band cannot be derived from screen ratios.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// The object's bounds have zero extent on some axis.
    #[error("bounding box has no area (size {size})")]
    DegenerateBounds { size: DVec3 },

    /// A screen ratio is zero, negative, or not finite.
    #[error("screen ratio must be a positive percentage, got {0}")]
    InvalidRatio(f64),

    /// The half field-of-view tangent is zero, negative, or not finite.
    #[error("tan(fov / 2) must be positive, got {0}")]
    InvalidFieldOfView(f64),
}

/// Tangent of half the vertical field of view given in degrees.
pub fn tan_half_fov(fov_y_degrees: f64) -> f64 {
    (fov_y_degrees.to_radians() * 0.5).tan()
}

/// Compute the distance band at which an object covers `max_ratio` and
/// `min_ratio` percent of the vertical screen height.
///
/// The longest axis of `bounds` is used as a conservative size estimate. A
/// larger ratio means the object is closer, so `max_ratio` yields the near
/// bound and `min_ratio` the far bound.
pub fn calibrate(
    bounds: &Aabb,
    min_ratio: f64,
    max_ratio: f64,
    tan_half_fov: f64,
) -> Result<LodDistances, CalibrationError> {
    if bounds.has_no_area() {
        return Err(CalibrationError::DegenerateBounds {
            size: bounds.size(),
        });
    }
    for ratio in [min_ratio, max_ratio] {
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(CalibrationError::InvalidRatio(ratio));
        }
    }
    if !(tan_half_fov.is_finite() && tan_half_fov > 0.0) {
        return Err(CalibrationError::InvalidFieldOfView(tan_half_fov));
    }

    let longest_axis = bounds.longest_axis_size();
    let distance_for = |ratio: f64| (longest_axis / (ratio / 100.0)) / (2.0 * tan_half_fov);

    Ok(LodDistances::new(
        distance_for(max_ratio),
        distance_for(min_ratio),
    ))
}

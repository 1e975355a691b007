//! Per-frame convergence of the visible instance count toward its target.

/// Lower clamp for the interpolated value, so upward moves from zero never
/// floor-stall on an exact `0.0`.
pub const VALUE_FLOOR: f64 = 0.1;

/// Upward progress beyond this amount always advances the count by at least one.
pub const MIN_PROGRESS: f64 = 0.001;

/// Result of advancing the visible count by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvergeStep {
    /// Visible instance count after this frame.
    pub next: i64,
    /// The count went from zero to positive.
    pub became_visible: bool,
    /// The count dropped to zero.
    pub became_hidden: bool,
}

impl ConvergeStep {
    fn unchanged(current: i64) -> Self {
        Self {
            next: current,
            became_visible: false,
            became_hidden: false,
        }
    }
}

/// Advance `current` one frame toward `target`.
///
/// The count moves by `(target - current) * fade_speed * delta_time`, clamped to
/// `[VALUE_FLOOR, count_cap]` and floored. When the step is upward and larger
/// than [`MIN_PROGRESS`] but flooring would leave the count unchanged, the count
/// is bumped by one so slow fades still reach their target. Downward steps get
/// no such bump.
pub fn advance(
    current: i64,
    target: i64,
    delta_time: f64,
    fade_speed: f64,
    count_cap: i64,
) -> ConvergeStep {
    if current == target {
        return ConvergeStep::unchanged(current);
    }

    let raw = current as f64 + (target - current) as f64 * fade_speed * delta_time;
    // Lower bound first: a cap below the floor must not panic, it resolves to the cap.
    let next_value = if raw < VALUE_FLOOR {
        VALUE_FLOOR
    } else if raw > count_cap as f64 {
        count_cap as f64
    } else {
        raw
    };

    let mut next = next_value.floor() as i64;
    if exceeds_min_progress(next_value - current as f64) && next == current {
        next += 1;
    }
    let next = next.clamp(0, count_cap.max(0));

    let was_visible = current > 0;
    ConvergeStep {
        next,
        became_visible: next > 0 && !was_visible,
        became_hidden: next == 0 && was_visible,
    }
}

/// Whether an upward step is large enough to guarantee a one-instance increment.
fn exceeds_min_progress(step: f64) -> bool {
    step > MIN_PROGRESS
}

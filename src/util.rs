//! Small helpers shared by the hook and the translator.

#[inline(always)]
#[cold]
fn cold() {}

/// Branch hint: `b` is expected to be false.
///
/// Used on the hook path, where the common case must stay cheap.
#[inline(always)]
pub fn unlikely(b: bool) -> bool {
    if b {
        cold()
    }
    b
}

/// Scales a per-tick step, rounding halves to even and never going
/// below one pixel.
#[inline]
pub fn scaled_step(step: i32, factor: f32) -> i32 {
    ((step as f32 * factor).round_ties_even() as i32).max(1)
}

//! Wraparound-safe ordering for frame ids and millisecond timestamps

/// Monotonic milliseconds, wrapping at 2^32 (~49.7 days).
pub type Millis = u32;

/// Compare frame ids in u32 space with wraparound.
/// Returns true if `a` is strictly newer than `b`, i.e. `(a - b) as i32 > 0`.
///
/// The relation is only meaningful when the two ids are less than half the
/// id space apart.
pub fn frame_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

/// Milliseconds elapsed from `since` to `now`, tolerating clock wraparound.
pub fn elapsed_ms(now: Millis, since: Millis) -> u32 {
    now.wrapping_sub(since)
}

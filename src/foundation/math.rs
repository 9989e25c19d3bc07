/// Map an 8-bit channel to normalized `[0, 1]`.
#[inline]
pub(crate) fn u8_to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// Clamp a normalized channel to `[0, 1]` and convert it back to 8 bits with rounding.
#[inline]
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (clamp01(v) * 255.0).round() as u8
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[inline]
pub(crate) fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Mirror an out-of-range sample coordinate back into `[0, len)`.
///
/// Symmetric reflection repeats the edge sample: `-1 -> 0`, `len -> len - 1`.
pub(crate) fn reflect_index(i: i64, len: u32) -> u32 {
    let n = i64::from(len.max(1));
    let period = 2 * n;
    let m = i.rem_euclid(period);
    let r = if m < n { m } else { period - 1 - m };
    r as u32
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

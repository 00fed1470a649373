/// Convert a raw 16-bit angle reading to degrees in `[0, 360)`
pub fn raw_to_degrees(raw: u16) -> f32 {
    f32::from(raw) * (360.0 / 65536.0)
}

/// Convert degrees to the sensor's 16-bit count domain, wrapping at 360°
///
/// The input is expected in `[0, 360)`; the result is rounded to the nearest
/// count
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn degrees_to_raw(degrees: f32) -> u16 {
    let counts = degrees * (65536.0 / 360.0) + 0.5;
    (counts as u32 & 0xFFFF) as u16
}

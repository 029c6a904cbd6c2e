/// Every declared vertex property occupies one 4-byte float.
pub const FIELD_SIZE: usize = 4;

/// Position, opacity, scale, rotation and DC colour.
pub const SCALAR_FIELDS: usize = 14;
/// Spherical-harmonic coefficients per colour channel (degree 3, minus the DC term).
pub const SH_COEFFS_PER_CHANNEL: usize = 15;
pub const SH_CHANNELS: usize = 3;
pub const SH_REST_FIELDS: usize = SH_COEFFS_PER_CHANNEL * SH_CHANNELS;

/// Zeroth-order SH basis constant, maps `f_dc_*` to linear colour.
pub const SH_C0: f32 = 0.282_094_8;

pub const PITCH_LIMIT_DEG: f32 = 89.0;
pub const FOV_MIN_DEG: f32 = 10.0;
pub const FOV_MAX_DEG: f32 = 120.0;

pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Clamp to [0, 1], scale to [0, 255] and truncate.
#[inline]
pub(crate) fn unit_to_u8(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0) as u8
}

#[inline]
pub(crate) fn sh_dc_to_color(dc: f32) -> f32 {
    0.5 + SH_C0 * dc
}

#[inline]
pub(crate) fn is_zstd(data: &[u8]) -> bool {
    data.starts_with(&ZSTD_MAGIC)
}

//! Fixed-point encodings for positions and headings.
//!
//! Positions use a linear half-unit encoding: one byte holds `value * 2`.
//! Headings use a byte magnitude of [`ANGLE_SCALE`] radians per unit plus a
//! separate sign flag, so a full byte spans roughly `0..=π`.
//!
//! Encoders never produce a byte above [`MAX_ENCODED`], which keeps the sync
//! marker (`0xFF`) out of every payload written by this crate.

/// Units per encoded linear step.
pub const LINEAR_SCALE: f32 = 0.5;

/// Radians per encoded angular step (≈ π / 254).
pub const ANGLE_SCALE: f32 = 0.012_368_475;

/// Largest byte value any encoder in this crate will emit.
pub const MAX_ENCODED: u8 = 0xFE;

/// Decodes a linearly encoded coordinate. Maps `0..=255` onto `0.0..=127.5`.
pub fn decode_linear(byte: u8) -> f32 {
    f32::from(byte) * LINEAR_SCALE
}

/// Decodes an angular magnitude with its out-of-band sign flag into radians.
pub fn decode_angle(byte: u8, negative: bool) -> f32 {
    let sign = if negative { -1.0 } else { 1.0 };
    sign * f32::from(byte) * ANGLE_SCALE
}

/// Encodes a coordinate, rounding to the nearest half unit.
///
/// Values below zero (and NaN) become `0`, values above `127.0` saturate at
/// [`MAX_ENCODED`].
pub fn encode_linear(value: f32) -> u8 {
    quantize(value / LINEAR_SCALE)
}

/// Encodes a heading in radians as `(magnitude, negative)`.
///
/// A heading that rounds to a zero magnitude is never flagged negative.
pub fn encode_angle(radians: f32) -> (u8, bool) {
    let negative = radians < 0.0;
    let absolute = if negative { -radians } else { radians };
    let magnitude = quantize(absolute / ANGLE_SCALE);
    (magnitude, negative && magnitude != 0)
}

/// Encodes an entity count or id, saturating at [`MAX_ENCODED`].
pub fn encode_count(count: usize) -> u8 {
    count.min(usize::from(MAX_ENCODED)) as u8
}

fn quantize(scaled: f32) -> u8 {
    // Negated comparison so NaN lands here too
    if !(scaled > 0.0) {
        return 0;
    }
    if scaled >= f32::from(MAX_ENCODED) {
        return MAX_ENCODED;
    }
    (scaled + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_bounds() {
        assert_eq!(decode_linear(0), 0.0);
        assert_eq!(decode_linear(15), 7.5);
        assert_eq!(decode_linear(255), 127.5);
    }

    #[test]
    fn linear_is_monotonic() {
        for b in 0..u8::MAX {
            assert!(decode_linear(b) < decode_linear(b + 1));
        }
    }

    #[test]
    fn angle_sign_is_odd() {
        for b in 0..=u8::MAX {
            assert_eq!(decode_angle(b, true), -decode_angle(b, false));
        }
    }

    #[test]
    fn encode_linear_rounds_and_caps() {
        assert_eq!(encode_linear(5.0), 10);
        assert_eq!(encode_linear(2.5), 5);
        assert_eq!(encode_linear(3.3), 7);
        assert_eq!(encode_linear(127.5), MAX_ENCODED);
        assert_eq!(encode_linear(1000.0), MAX_ENCODED);
        assert_eq!(encode_linear(-4.0), 0);
        assert_eq!(encode_linear(f32::NAN), 0);
    }

    #[test]
    fn encode_angle_splits_sign() {
        assert_eq!(encode_angle(100.0 * ANGLE_SCALE), (100, false));
        assert_eq!(encode_angle(-50.0 * ANGLE_SCALE), (50, true));
        assert_eq!(encode_angle(-0.001), (0, false));
        assert_eq!(encode_angle(core::f32::consts::PI), (MAX_ENCODED, false));
    }

    #[test]
    fn encode_count_saturates() {
        assert_eq!(encode_count(5), 5);
        assert_eq!(encode_count(255), 254);
        assert_eq!(encode_count(655), 254);
    }
}

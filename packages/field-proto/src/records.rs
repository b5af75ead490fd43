use bitflags::bitflags;

use crate::{
    decode::{Decode, DecodeError},
    encode::Encode,
    fixed::{MAX_ENCODED, decode_angle, decode_linear, encode_angle, encode_linear},
};

/// A point on the field plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    /// Encoded size of a position, which is also the size of a ball record.
    pub const SIZE: usize = 2;

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Both coordinates use the linear encoding, one byte each.
impl Decode for Vector2D {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let [x, y] = <[u8; 2]>::decode(data)?;
        Ok(Self {
            x: decode_linear(x),
            y: decode_linear(y),
        })
    }
}

impl Encode for Vector2D {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        data[0] = encode_linear(self.x);
        data[1] = encode_linear(self.y);
    }
}

bitflags! {
    /// Flag byte carried in every robot record.
    ///
    /// Only the heading sign is defined. Reserved bits are ignored when
    /// decoding and written as zero.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RobotFlags: u8 {
        /// The heading magnitude is to be negated.
        const HEADING_NEGATIVE = 1 << 0;
    }
}

/// Pose of a single robot on the field.
///
/// # Encoding
///
/// | Field      | Size | Description |
/// |------------|------|-------------|
/// | `id`       | 1    | Robot identifier. |
/// | `heading`  | 1    | Heading magnitude, see [`decode_angle`]. |
/// | `flags`    | 1    | [`RobotFlags`], bit 0 is the heading sign. |
/// | `pos`      | 2    | Position as a [`Vector2D`]. |
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobotInfo {
    pub id: u8,
    /// Heading in radians.
    pub heading: f32,
    pub pos: Vector2D,
}

impl RobotInfo {
    pub const SIZE: usize = 5;

    pub const fn new(id: u8, heading: f32, pos: Vector2D) -> Self {
        Self { id, heading, pos }
    }
}

impl Decode for RobotInfo {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let [id, heading, flags] = <[u8; 3]>::decode(data)?;
        let flags = RobotFlags::from_bits_truncate(flags);

        Ok(Self {
            id,
            heading: decode_angle(heading, flags.contains(RobotFlags::HEADING_NEGATIVE)),
            pos: Vector2D::decode(data)?,
        })
    }
}

impl Encode for RobotInfo {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        let (heading, negative) = encode_angle(self.heading);
        let mut flags = RobotFlags::empty();
        flags.set(RobotFlags::HEADING_NEGATIVE, negative);

        data[0] = self.id.min(MAX_ENCODED);
        data[1] = heading;
        data[2] = flags.bits();
        self.pos.encode(&mut data[3..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::ANGLE_SCALE;

    #[test]
    fn decode_robot_record() {
        let mut data = &[2, 50, 0x01, 0, 255][..];
        let robot = RobotInfo::decode(&mut data).unwrap();

        assert_eq!(robot.id, 2);
        assert_eq!(robot.heading, -50.0 * ANGLE_SCALE);
        assert_eq!(robot.pos, Vector2D::new(0.0, 127.5));
        assert!(data.is_empty());
    }

    #[test]
    fn reserved_flag_bits_are_ignored() {
        let mut plain = &[1, 100, 0x00, 10, 20][..];
        let mut noisy = &[1, 100, 0xFE, 10, 20][..];

        assert_eq!(
            RobotInfo::decode(&mut plain).unwrap(),
            RobotInfo::decode(&mut noisy).unwrap()
        );
    }

    #[test]
    fn truncated_robot_record() {
        let mut data = &[1, 100, 0, 10][..];
        assert!(RobotInfo::decode(&mut data).is_err());
    }

    #[test]
    fn encode_robot_record() {
        let robot = RobotInfo::new(255, -50.0 * ANGLE_SCALE, Vector2D::new(0.0, 127.5));
        let mut buf = [0; RobotInfo::SIZE];
        robot.encode(&mut buf);

        // Ids and coordinates saturate below the sync marker
        assert_eq!(buf, [254, 50, 0x01, 0, 254]);
    }

    #[test]
    fn decode_ball_record() {
        let mut data = &[4, 6][..];
        assert_eq!(Vector2D::decode(&mut data).unwrap(), Vector2D::new(2.0, 3.0));
    }
}

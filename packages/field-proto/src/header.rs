use core::fmt;

use thiserror::Error;

use crate::{
    decode::{Decode, DecodeError},
    encode::Encode,
};

/// Frame header carrying the number of robot and ball records that follow.
///
/// # Encoding
///
/// | Field        | Size | Description |
/// |--------------|------|-------------|
/// | `num_robots` | 1    | Number of 5-byte robot records. |
/// | `num_balls`  | 1    | Number of 2-byte ball records. |
///
/// Counts straight off the wire are untrusted. [`PosInfoHeader::clamp_to`] must
/// be applied before either count is used as a loop bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PosInfoHeader {
    pub num_robots: u8,
    pub num_balls: u8,
}

impl PosInfoHeader {
    pub const SIZE: usize = 2;

    pub const fn new(num_robots: u8, num_balls: u8) -> Self {
        Self {
            num_robots,
            num_balls,
        }
    }

    /// Reduces each count to its capacity. Counts already within capacity are
    /// left untouched.
    pub fn clamp_to(self, max_robots: usize, max_balls: usize) -> Self {
        Self {
            num_robots: clamp_count(self.num_robots, max_robots),
            num_balls: clamp_count(self.num_balls, max_balls),
        }
    }

    /// Yields an [`OversizeCount`] for every count that exceeds its capacity.
    pub fn check_capacity(
        &self,
        max_robots: usize,
        max_balls: usize,
    ) -> impl Iterator<Item = OversizeCount> {
        [
            OversizeCount::check(CountField::Robots, self.num_robots, max_robots),
            OversizeCount::check(CountField::Balls, self.num_balls, max_balls),
        ]
        .into_iter()
        .flatten()
    }

    /// Number of payload bytes the robot records of this header occupy.
    pub const fn robot_bytes(&self) -> usize {
        self.num_robots as usize * crate::RobotInfo::SIZE
    }

    /// Number of payload bytes the ball records of this header occupy.
    pub const fn ball_bytes(&self) -> usize {
        self.num_balls as usize * crate::Vector2D::SIZE
    }
}

fn clamp_count(declared: u8, capacity: usize) -> u8 {
    if usize::from(declared) > capacity {
        // capacity < declared <= u8::MAX here
        capacity as u8
    } else {
        declared
    }
}

impl Decode for PosInfoHeader {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let [num_robots, num_balls] = <[u8; 2]>::decode(data)?;
        Ok(Self {
            num_robots,
            num_balls,
        })
    }
}

impl Encode for PosInfoHeader {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        data[0] = self.num_robots;
        data[1] = self.num_balls;
    }
}

/// Which header count an [`OversizeCount`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountField {
    Robots,
    Balls,
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Robots => "robots",
            Self::Balls => "balls",
        })
    }
}

/// A header count exceeded the static list capacity.
///
/// This is recovered locally by clamping and never aborts a frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Header declared {declared} {field}, but capacity is {capacity}.")]
pub struct OversizeCount {
    pub field: CountField,
    pub declared: u8,
    pub capacity: usize,
}

impl OversizeCount {
    fn check(field: CountField, declared: u8, capacity: usize) -> Option<Self> {
        (usize::from(declared) > capacity).then_some(Self {
            field,
            declared,
            capacity,
        })
    }
}

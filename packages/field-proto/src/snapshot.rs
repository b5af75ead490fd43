use crate::{
    MAX_ROBOTS,
    decode::{Decode, DecodeError},
    encode::Encode,
    fixed::{MAX_ENCODED, encode_count},
    header::PosInfoHeader,
    list::{BallPositionList, RobotInfoList},
    records::{RobotInfo, Vector2D},
};

/// Snapshot type for the profile with room for 60 balls.
pub type CompactSnapshot = FieldSnapshot<MAX_ROBOTS, { crate::COMPACT_MAX_BALLS }>;

/// Snapshot type for the profile with room for 256 balls.
pub type StandardSnapshot = FieldSnapshot<MAX_ROBOTS, { crate::STANDARD_MAX_BALLS }>;

/// The decoded contents of one frame.
///
/// The header always matches the list lengths: `header().num_robots ==
/// robots().len()` and `header().num_balls == balls().len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot<const ROBOTS: usize, const BALLS: usize> {
    header: PosInfoHeader,
    robots: RobotInfoList<ROBOTS>,
    balls: BallPositionList<BALLS>,
}

impl<const ROBOTS: usize, const BALLS: usize> Default for FieldSnapshot<ROBOTS, BALLS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROBOTS: usize, const BALLS: usize> FieldSnapshot<ROBOTS, BALLS> {
    pub const MAX_ROBOTS: usize = ROBOTS;
    pub const MAX_BALLS: usize = BALLS;

    /// Largest number of record bytes a single list read can need.
    pub const SCRATCH_SIZE: usize = {
        let robots = ROBOTS * RobotInfo::SIZE;
        let balls = BALLS * Vector2D::SIZE;
        if robots > balls { robots } else { balls }
    };

    pub fn new() -> Self {
        Self {
            header: PosInfoHeader::default(),
            robots: RobotInfoList::new(),
            balls: BallPositionList::new(),
        }
    }

    pub const fn header(&self) -> PosInfoHeader {
        self.header
    }

    pub fn robots(&self) -> &[RobotInfo] {
        &self.robots
    }

    pub fn balls(&self) -> &[Vector2D] {
        &self.balls
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty() && self.balls.is_empty()
    }

    pub fn clear(&mut self) {
        self.robots.clear();
        self.balls.clear();
        self.header = PosInfoHeader::default();
    }

    /// Decodes `count` robot records, replacing the robot list.
    pub fn read_robots(&mut self, count: u8, data: &mut &[u8]) -> Result<(), DecodeError> {
        let result = self.robots.decode_from(data, usize::from(count));
        self.header.num_robots = self.robots.len() as u8;
        result
    }

    /// Decodes `count` ball records, replacing the ball list.
    pub fn read_balls(&mut self, count: u8, data: &mut &[u8]) -> Result<(), DecodeError> {
        let result = self.balls.decode_from(data, usize::from(count));
        self.header.num_balls = self.balls.len() as u8;
        result
    }

    /// Appends a robot, handing it back if the snapshot cannot hold or encode
    /// another one.
    pub fn push_robot(&mut self, robot: RobotInfo) -> Result<(), RobotInfo> {
        if self.robots.len() >= usize::from(MAX_ENCODED) {
            return Err(robot);
        }
        self.robots.push(robot)?;
        self.header.num_robots = self.robots.len() as u8;
        Ok(())
    }

    /// Appends a ball, handing it back if the snapshot cannot hold or encode
    /// another one.
    pub fn push_ball(&mut self, ball: Vector2D) -> Result<(), Vector2D> {
        if self.balls.len() >= usize::from(MAX_ENCODED) {
            return Err(ball);
        }
        self.balls.push(ball)?;
        self.header.num_balls = self.balls.len() as u8;
        Ok(())
    }

    fn encoded_counts(&self) -> (usize, usize) {
        (
            usize::from(encode_count(self.robots.len())),
            usize::from(encode_count(self.balls.len())),
        )
    }
}

/// Decodes a frame body (header and records, without the sync marker),
/// clamping the header counts to this snapshot's capacities.
impl<const ROBOTS: usize, const BALLS: usize> Decode for FieldSnapshot<ROBOTS, BALLS> {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let header = PosInfoHeader::decode(data)?.clamp_to(ROBOTS, BALLS);
        let mut snapshot = Self::new();
        snapshot.read_robots(header.num_robots, data)?;
        snapshot.read_balls(header.num_balls, data)?;
        Ok(snapshot)
    }
}

/// Encodes a frame body without the sync marker. Lists longer than a count
/// byte can carry are truncated so the header always matches the records.
impl<const ROBOTS: usize, const BALLS: usize> Encode for FieldSnapshot<ROBOTS, BALLS> {
    fn size(&self) -> usize {
        let (robots, balls) = self.encoded_counts();
        PosInfoHeader::SIZE + robots * RobotInfo::SIZE + balls * Vector2D::SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        let (robots, balls) = self.encoded_counts();
        PosInfoHeader::new(robots as u8, balls as u8).encode(data);

        let mut offset = PosInfoHeader::SIZE;
        for robot in &self.robots[..robots] {
            robot.encode(&mut data[offset..]);
            offset += RobotInfo::SIZE;
        }
        for ball in &self.balls[..balls] {
            ball.encode(&mut data[offset..]);
            offset += Vector2D::SIZE;
        }
    }
}

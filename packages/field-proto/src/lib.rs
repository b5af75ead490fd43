//! Wire format of the field telemetry protocol.
//!
//! A host streams snapshots of a playing field (robot poses and ball positions)
//! to a robot controller as an endless byte stream. Every frame looks like this:
//!
//! | Field          | Size              | Description |
//! |----------------|-------------------|-------------|
//! | sync marker    | 2                 | [`SYNC_SEQUENCE`] (`0xFF 0xFF`). |
//! | header         | 2                 | [`PosInfoHeader`]: robot count, ball count. |
//! | robot records  | 5 × `num_robots`  | [`RobotInfo`] records. |
//! | ball records   | 2 × `num_balls`   | [`Vector2D`] records. |
//!
//! There is no length prefix and no checksum. A receiver that joins mid-stream
//! finds the next frame with a [`Synchronizer`] and then decodes the header and
//! records into a preallocated [`FieldSnapshot`].
//!
//! This crate performs no I/O and never allocates.

#![no_std]

mod decode;
mod encode;
mod fixed;
mod header;
mod list;
mod records;
mod snapshot;
mod sync;

pub use decode::{Decode, DecodeError, DecodeErrorKind};
pub use encode::Encode;
pub use fixed::{
    ANGLE_SCALE, LINEAR_SCALE, MAX_ENCODED, decode_angle, decode_linear, encode_angle,
    encode_count, encode_linear,
};
pub use header::{CountField, OversizeCount, PosInfoHeader};
pub use list::{BallPositionList, FixedList, RobotInfoList};
pub use records::{RobotFlags, RobotInfo, Vector2D};
pub use snapshot::{CompactSnapshot, FieldSnapshot, StandardSnapshot};
pub use sync::Synchronizer;

/// Value of each byte of the frame boundary marker.
pub const SYNC_MARKER: u8 = 0xFF;

/// Byte sequence that starts every frame.
pub const SYNC_SEQUENCE: [u8; 2] = [SYNC_MARKER, SYNC_MARKER];

/// Robot capacity shared by every profile.
pub const MAX_ROBOTS: usize = 10;

/// Ball capacity of the compact profile.
pub const COMPACT_MAX_BALLS: usize = 60;

/// Ball capacity of the standard profile.
pub const STANDARD_MAX_BALLS: usize = 256;

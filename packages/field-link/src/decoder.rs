//! The individual decoding steps of a frame, each pulling exactly the bytes it
//! needs from a [`ByteSource`].
//!
//! [`FrameEngine`](crate::FrameEngine) strings these together. They hold no
//! state of their own: the synchronizer, scratch buffer and output snapshot
//! are all borrowed from the caller.

use field_proto::{
    Decode, FieldSnapshot, PosInfoHeader, RobotInfo, Synchronizer, Vector2D, SYNC_SEQUENCE,
};
use log::{debug, warn};

use crate::{ByteSource, LinkError};

/// Reusable buffer that record bytes are read into before decoding.
#[derive(Debug, Clone, Default)]
pub struct ScratchBuffer {
    bytes: Vec<u8>,
}

impl ScratchBuffer {
    pub fn with_len(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
        }
    }

    /// A buffer large enough for any record list of the given snapshot type.
    pub fn for_snapshot<const ROBOTS: usize, const BALLS: usize>() -> Self {
        Self::with_len(FieldSnapshot::<ROBOTS, BALLS>::SCRATCH_SIZE)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn window(&mut self, len: usize) -> &mut [u8] {
        if self.bytes.len() < len {
            self.bytes.resize(len, 0);
        }
        &mut self.bytes[..len]
    }
}

/// A header as read from the wire, alongside the clamped copy that is safe to
/// use as a loop bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHeader {
    pub raw: PosInfoHeader,
    pub header: PosInfoHeader,
}

impl DecodedHeader {
    pub fn was_clamped(&self) -> bool {
        self.raw != self.header
    }
}

/// Consumes bytes until two consecutive sync markers have been read.
///
/// Returns the number of bytes consumed, including the marker pair. The next
/// byte in the stream is the first header byte. This never gives up on its own;
/// wrap it in a timeout to bound the wait.
pub async fn sync_to_frame<S: ByteSource>(
    source: &mut S,
    sync: &mut Synchronizer,
) -> Result<u64, LinkError> {
    sync.reset();

    let mut consumed = 0u64;
    loop {
        let byte = source.read_byte().await?;
        consumed += 1;

        if sync.push(byte) {
            debug!("Synchronized after {} bytes", consumed);
            return Ok(consumed);
        }
    }
}

/// Reads a frame header and clamps its counts to the given capacities.
///
/// Unless `just_synced` is set, the two sync bytes that open every frame are
/// skipped first. Those bytes are only checked when `verify_sync_pair` is set,
/// in which case a mismatch fails with [`LinkError::SyncLost`] before any
/// header byte is read.
pub async fn read_header<S: ByteSource>(
    source: &mut S,
    just_synced: bool,
    verify_sync_pair: bool,
    max_robots: usize,
    max_balls: usize,
) -> Result<DecodedHeader, LinkError> {
    if !just_synced {
        let mut pair = [0; SYNC_SEQUENCE.len()];
        source.read_bytes(&mut pair).await?;

        if pair != SYNC_SEQUENCE {
            if verify_sync_pair {
                return Err(LinkError::SyncLost(pair));
            }
            warn!("Skipped {:02x?} in place of a sync marker pair", pair);
        }
    }

    let mut bytes = [0; PosInfoHeader::SIZE];
    source.read_bytes(&mut bytes).await?;
    let raw = PosInfoHeader::decode(&mut bytes.as_slice())?;

    for oversize in raw.check_capacity(max_robots, max_balls) {
        warn!("{} Clamping to capacity.", oversize);
    }

    Ok(DecodedHeader {
        raw,
        header: raw.clamp_to(max_robots, max_balls),
    })
}

/// Reads `count` robot records into `out`, replacing its robot list.
///
/// At most `ROBOTS` records are read regardless of `count`.
pub async fn read_robots<S: ByteSource, const ROBOTS: usize, const BALLS: usize>(
    source: &mut S,
    scratch: &mut ScratchBuffer,
    count: u8,
    out: &mut FieldSnapshot<ROBOTS, BALLS>,
) -> Result<(), LinkError> {
    let bytes = scratch.window(usize::from(count).min(ROBOTS) * RobotInfo::SIZE);
    source.read_bytes(bytes).await?;
    out.read_robots(count, &mut &*bytes)?;
    Ok(())
}

/// Reads `count` ball records into `out`, replacing its ball list.
///
/// At most `BALLS` records are read regardless of `count`.
pub async fn read_balls<S: ByteSource, const ROBOTS: usize, const BALLS: usize>(
    source: &mut S,
    scratch: &mut ScratchBuffer,
    count: u8,
    out: &mut FieldSnapshot<ROBOTS, BALLS>,
) -> Result<(), LinkError> {
    let bytes = scratch.window(usize::from(count).min(BALLS) * Vector2D::SIZE);
    source.read_bytes(bytes).await?;
    out.read_balls(count, &mut &*bytes)?;
    Ok(())
}

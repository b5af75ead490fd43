//! Host side of the link: framing snapshots onto a byte stream.

use field_proto::{Encode, FieldSnapshot, SYNC_SEQUENCE};
use log::trace;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::LinkError;

/// Writes snapshots as complete frames, each opened by the sync marker pair.
///
/// Counts above 254 are truncated together with the records they describe, so
/// the header always matches the payload that follows it.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
    buffer: Vec<u8>,
    frames_sent: u64,
}

impl<W> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::new(),
            frames_sent: 0,
        }
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Encodes and writes one frame, then flushes the writer.
    pub async fn send<const ROBOTS: usize, const BALLS: usize>(
        &mut self,
        snapshot: &FieldSnapshot<ROBOTS, BALLS>,
    ) -> Result<(), LinkError> {
        let marker = SYNC_SEQUENCE.len();
        self.buffer.clear();
        self.buffer.resize(marker + snapshot.size(), 0);
        self.buffer[..marker].copy_from_slice(&SYNC_SEQUENCE);
        snapshot.encode(&mut self.buffer[marker..]);

        trace!("sent frame: {:x?}", self.buffer);

        self.writer.write_all(&self.buffer).await?;
        self.writer.flush().await?;
        self.frames_sent += 1;

        Ok(())
    }
}

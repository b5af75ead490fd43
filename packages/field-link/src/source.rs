//! Transport abstraction the frame engine pulls bytes from.

use std::future::Future;

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::LinkError;

/// A byte-oriented transport delivering the telemetry stream.
///
/// Bytes arrive in order and are never dropped while the link is up. Any error
/// returned by a source is treated as loss of the link.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    /// Switches the transport into raw byte mode, resolving once the mode is
    /// confirmed.
    fn enable_raw_mode(&mut self) -> impl Future<Output = Result<(), LinkError>>;

    /// Fills `buf` completely, waiting as long as it takes.
    ///
    /// On error the contents of `buf` are unspecified and must be discarded.
    fn read_bytes(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), LinkError>>;

    /// Reads a single byte.
    async fn read_byte(&mut self) -> Result<u8, LinkError> {
        let mut byte = [0; 1];
        self.read_bytes(&mut byte).await?;
        Ok(byte[0])
    }
}

/// A [`ByteSource`] over any [`AsyncRead`], such as a pipe, socket or an
/// in-memory buffer. End of stream counts as loss of the link.
#[derive(Debug)]
pub struct StreamSource<R> {
    reader: R,
    bytes_read: u64,
}

impl<R> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
        }
    }

    /// Total number of bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead + Unpin> ByteSource for StreamSource<R> {
    async fn enable_raw_mode(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        self.reader.read_exact(buf).await?;
        self.bytes_read += buf.len() as u64;
        trace!("read bytes: {:x?}", buf);
        Ok(())
    }
}

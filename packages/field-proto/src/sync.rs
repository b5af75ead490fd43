use crate::SYNC_MARKER;

/// Byte-at-a-time detector for the two-byte frame boundary.
///
/// Tracks only the previous byte. Once a pair of [`SYNC_MARKER`] bytes is seen
/// the window is reset, so a run of three or more markers reports a single
/// sync and the byte after the pair is left for the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Synchronizer {
    previous: Option<u8>,
}

impl Synchronizer {
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Feeds the next byte from the stream.
    ///
    /// Returns `true` when `byte` completes a marker pair.
    pub fn push(&mut self, byte: u8) -> bool {
        let synced = byte == SYNC_MARKER && self.previous == Some(SYNC_MARKER);
        self.previous = if synced { None } else { Some(byte) };
        synced
    }

    /// Forgets the last byte seen.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Feeds bytes from `data` until a marker pair completes.
    ///
    /// Returns how many bytes were consumed, including both markers, or `None`
    /// if `data` ran out first. The window carries over between calls.
    pub fn scan(&mut self, data: &[u8]) -> Option<usize> {
        data.iter()
            .position(|&byte| self.push(byte))
            .map(|index| index + 1)
    }
}

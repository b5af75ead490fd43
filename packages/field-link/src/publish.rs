//! Hand-off of decoded snapshots from the engine to any number of readers.
//!
//! A snapshot is swapped into the channel as one value, so a reader only ever
//! sees complete frames. Readers never block the engine.

use field_proto::FieldSnapshot;
use log::trace;
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};

use crate::LinkError;

/// Write side of the snapshot channel, owned by the engine.
#[derive(Debug)]
pub struct SnapshotPublisher<const ROBOTS: usize, const BALLS: usize> {
    tx: watch::Sender<Option<FieldSnapshot<ROBOTS, BALLS>>>,
}

impl<const ROBOTS: usize, const BALLS: usize> Default for SnapshotPublisher<ROBOTS, BALLS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROBOTS: usize, const BALLS: usize> SnapshotPublisher<ROBOTS, BALLS> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> SnapshotReader<ROBOTS, BALLS> {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Makes `snapshot` the latest snapshot and hands back the one it replaced.
    ///
    /// Works whether or not anyone is subscribed.
    pub fn publish(
        &self,
        snapshot: FieldSnapshot<ROBOTS, BALLS>,
    ) -> Option<FieldSnapshot<ROBOTS, BALLS>> {
        trace!(
            "Publishing snapshot with {} robots and {} balls",
            snapshot.robots().len(),
            snapshot.balls().len()
        );
        self.tx.send_replace(Some(snapshot))
    }

    pub fn reader_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Read-only handle onto the most recently published snapshot.
///
/// Readers that fall behind skip straight to the newest snapshot; there is no
/// history.
#[derive(Debug, Clone)]
pub struct SnapshotReader<const ROBOTS: usize, const BALLS: usize> {
    rx: watch::Receiver<Option<FieldSnapshot<ROBOTS, BALLS>>>,
}

impl<const ROBOTS: usize, const BALLS: usize> SnapshotReader<ROBOTS, BALLS> {
    /// A copy of the latest snapshot, or `None` if no frame has been published
    /// yet.
    pub fn latest(&self) -> Option<FieldSnapshot<ROBOTS, BALLS>> {
        self.rx.borrow().clone()
    }

    /// Whether a snapshot has been published since this reader last looked.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for a snapshot newer than the last one this reader returned.
    ///
    /// # Errors
    ///
    /// Fails with [`LinkError::PublisherClosed`] once the engine is dropped.
    pub async fn changed(&mut self) -> Result<FieldSnapshot<ROBOTS, BALLS>, LinkError> {
        loop {
            self.rx
                .changed()
                .await
                .map_err(|_| LinkError::PublisherClosed)?;

            let latest = self.rx.borrow_and_update().clone();
            if let Some(snapshot) = latest {
                return Ok(snapshot);
            }
        }
    }

    /// Turns the reader into a stream that yields the current snapshot, if any,
    /// and then every newly published one. Ends when the engine is dropped.
    pub fn into_stream(self) -> impl Stream<Item = FieldSnapshot<ROBOTS, BALLS>> {
        WatchStream::new(self.rx).filter_map(|snapshot| snapshot)
    }
}

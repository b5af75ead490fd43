//! The receive state machine tying sync, header and record decoding together.

use std::{mem, time::Duration};

use field_proto::{
    FieldSnapshot, PosInfoHeader, Synchronizer, COMPACT_MAX_BALLS, MAX_ROBOTS, STANDARD_MAX_BALLS,
    SYNC_SEQUENCE,
};
use log::{debug, error, warn};
use tokio::time::timeout;

use crate::{
    decoder::{read_balls, read_header, read_robots, sync_to_frame, ScratchBuffer},
    ByteSource, EngineOptions, LinkError, SnapshotPublisher, SnapshotReader,
};

/// Where the engine is within the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Frame boundaries are unknown. The next frame starts with a byte-level
    /// search for the sync marker.
    Unsynced,
    /// Positioned at a frame boundary.
    Synced,
    /// Part way through the records of a frame.
    Decoding,
    /// The transport failed. Nothing more is read until
    /// [`FrameEngine::restart`] supplies a new one.
    Faulted,
}

impl EngineState {
    pub fn is_faulted(&self) -> bool {
        matches!(self, EngineState::Faulted)
    }
}

/// Running counters kept by a [`FrameEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameStats {
    pub frames_published: u64,
    /// Number of byte-level searches for the sync marker that succeeded.
    pub syncs: u64,
    /// Bytes thrown away while searching for the sync marker.
    pub bytes_skipped: u64,
    /// Headers whose counts had to be reduced to fit.
    pub clamped_headers: u64,
    /// Frames dropped part way through without being published.
    pub abandoned_frames: u64,
}

pub type CompactEngine<S> = FrameEngine<S, MAX_ROBOTS, COMPACT_MAX_BALLS>;
pub type StandardEngine<S> = FrameEngine<S, MAX_ROBOTS, STANDARD_MAX_BALLS>;

/// Decodes frames from a [`ByteSource`] and publishes each complete one.
///
/// The engine owns its scratch buffer and a working snapshot that records are
/// decoded into. A snapshot only leaves the engine once its header and every
/// record decoded, so subscribers never see a partial frame.
///
/// ```no_run
/// # async fn demo(source: field_link::StreamSource<&[u8]>) {
/// use field_link::StandardEngine;
///
/// let mut engine = StandardEngine::new(source);
/// let mut reader = engine.subscribe();
///
/// tokio::join!(engine.run(), async {
///     while let Ok(snapshot) = reader.changed().await {
///         println!("{} robots", snapshot.robots().len());
///     }
/// });
/// # }
/// ```
#[derive(Debug)]
pub struct FrameEngine<S, const ROBOTS: usize = MAX_ROBOTS, const BALLS: usize = STANDARD_MAX_BALLS>
{
    source: S,
    options: EngineOptions,
    state: EngineState,
    /// The sync pair of the next frame was consumed by the synchronizer.
    just_synced: bool,
    raw_mode: bool,
    /// A frame was started but neither finished nor failed, which happens when
    /// a caller drops the future mid-read.
    in_progress: bool,
    synchronizer: Synchronizer,
    scratch: ScratchBuffer,
    working: FieldSnapshot<ROBOTS, BALLS>,
    publisher: SnapshotPublisher<ROBOTS, BALLS>,
    stats: FrameStats,
}

impl<S: ByteSource, const ROBOTS: usize, const BALLS: usize> FrameEngine<S, ROBOTS, BALLS> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, EngineOptions::default())
    }

    pub fn with_options(source: S, options: EngineOptions) -> Self {
        Self {
            source,
            options,
            state: EngineState::Unsynced,
            just_synced: false,
            raw_mode: false,
            in_progress: false,
            synchronizer: Synchronizer::new(),
            scratch: ScratchBuffer::for_snapshot::<ROBOTS, BALLS>(),
            working: FieldSnapshot::new(),
            publisher: SnapshotPublisher::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Creates a new reader of the snapshots this engine publishes.
    pub fn subscribe(&self) -> SnapshotReader<ROBOTS, BALLS> {
        self.publisher.subscribe()
    }

    /// Decodes and publishes the next complete frame, returning its header.
    ///
    /// Applies the configured frame timeout, if any. See
    /// [`FrameEngine::next_frame_within`].
    pub async fn next_frame(&mut self) -> Result<PosInfoHeader, LinkError> {
        match self.options.frame_timeout {
            Some(deadline) => self.next_frame_within(deadline).await,
            None => self.decode_frame().await,
        }
    }

    /// Like [`FrameEngine::next_frame`], but gives up after `deadline`.
    ///
    /// On expiry the partial frame is dropped, nothing is published and the
    /// engine resynchronizes on the next call.
    pub async fn next_frame_within(
        &mut self,
        deadline: Duration,
    ) -> Result<PosInfoHeader, LinkError> {
        let result = timeout(deadline, self.decode_frame()).await;

        match result {
            Ok(result) => result,
            Err(_) => {
                warn!("No complete frame within {:?}", deadline);
                self.abandon();
                Err(LinkError::Timeout(deadline))
            }
        }
    }

    /// Publishes frames until the link is lost, then returns the error that
    /// ended the session. The engine is left [`EngineState::Faulted`].
    pub async fn run(&mut self) -> LinkError {
        loop {
            match self.next_frame().await {
                Ok(_) => {}
                Err(err) if err.is_link_lost() => return err,
                Err(err) => debug!("Frame dropped: {}", err),
            }
        }
    }

    /// Replaces the transport and starts over from [`EngineState::Unsynced`].
    /// Returns the old transport.
    ///
    /// Statistics and subscribers carry over.
    pub fn restart(&mut self, source: S) -> S {
        let old = mem::replace(&mut self.source, source);
        self.raw_mode = false;
        self.just_synced = false;
        self.in_progress = false;
        self.synchronizer.reset();
        self.transition(EngineState::Unsynced);
        old
    }

    async fn decode_frame(&mut self) -> Result<PosInfoHeader, LinkError> {
        if self.state.is_faulted() {
            return Err(LinkError::Faulted);
        }
        if self.in_progress {
            debug!("Previous frame was cancelled mid-read");
            self.abandon();
        }

        self.in_progress = true;
        let result = self.step_frame().await;
        self.in_progress = false;

        if let Err(err) = &result {
            self.handle_error(err);
        }
        result
    }

    async fn step_frame(&mut self) -> Result<PosInfoHeader, LinkError> {
        if self.state == EngineState::Unsynced {
            if !self.raw_mode {
                self.source.enable_raw_mode().await?;
                self.raw_mode = true;
                debug!("Raw mode enabled");
            }

            let consumed = sync_to_frame(&mut self.source, &mut self.synchronizer).await?;
            self.stats.syncs += 1;
            self.stats.bytes_skipped += consumed.saturating_sub(SYNC_SEQUENCE.len() as u64);
            self.just_synced = true;
            self.transition(EngineState::Synced);
        }

        let decoded = read_header(
            &mut self.source,
            self.just_synced,
            self.options.verify_sync_pair,
            ROBOTS,
            BALLS,
        )
        .await?;
        self.just_synced = false;
        if decoded.was_clamped() {
            self.stats.clamped_headers += 1;
        }
        self.transition(EngineState::Decoding);

        let header = decoded.header;
        read_robots(
            &mut self.source,
            &mut self.scratch,
            header.num_robots,
            &mut self.working,
        )
        .await?;
        read_balls(
            &mut self.source,
            &mut self.scratch,
            header.num_balls,
            &mut self.working,
        )
        .await?;

        // Reuse the replaced snapshot as the next working buffer
        let replaced = self.publisher.publish(mem::take(&mut self.working));
        self.working = replaced.unwrap_or_default();
        self.stats.frames_published += 1;

        self.transition(EngineState::Synced);
        Ok(header)
    }

    fn handle_error(&mut self, err: &LinkError) {
        if err.is_link_lost() {
            error!("Link lost: {}", err);
            self.just_synced = false;
            self.transition(EngineState::Faulted);
        } else {
            warn!("Abandoning frame: {}", err);
            self.abandon();
        }
    }

    /// Drops whatever frame was in progress and returns to byte-level search.
    fn abandon(&mut self) {
        if self.state != EngineState::Unsynced {
            self.stats.abandoned_frames += 1;
        }
        self.in_progress = false;
        self.just_synced = false;
        self.transition(EngineState::Unsynced);
    }

    fn transition(&mut self, next: EngineState) {
        if self.state != next {
            debug!("Engine state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

//! Receiving end of the field telemetry link.
//!
//! A [`FrameEngine`] pulls bytes from a [`ByteSource`], finds frame boundaries,
//! decodes each frame into a preallocated snapshot and publishes it to any
//! number of [`SnapshotReader`]s. [`FrameWriter`] is the matching sender, used
//! by field hosts and in tests.
//!
//! The wire format itself lives in the [`protocol`] crate.

pub use field_proto as protocol;

mod config;
pub mod decoder;
mod engine;
mod error;
mod publish;
mod source;
mod writer;

#[cfg(feature = "serial")]
pub mod serial;

pub use config::{EngineOptions, EngineSection, LinkConfig, LinkIniConfig, LinkSection};
pub use engine::{CompactEngine, EngineState, FrameEngine, FrameStats, StandardEngine};
pub use error::LinkError;
pub use publish::{SnapshotPublisher, SnapshotReader};
pub use source::{ByteSource, StreamSource};
pub use writer::FrameWriter;

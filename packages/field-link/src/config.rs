//! Link and engine configuration, loadable from an INI document.
//!
//! ```ini
//! [link]
//! device=/dev/rfcomm0
//! baud_rate=9600
//! raw_mode_timeout_ms=5000
//! require_carrier=false
//!
//! [engine]
//! frame_timeout_ms=250
//! verify_sync_pair=true
//! ```
//!
//! Every key is optional. A `frame_timeout_ms` of `0` disables the deadline.
//! Keys outside a section, unknown sections and unknown keys are rejected.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::LinkError;

/// INI carries every value as text, so flags are parsed by hand.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    value.trim().parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSection {
    pub device: String,
    pub baud_rate: u32,
    pub raw_mode_timeout_ms: u64,
    /// Fail with [`LinkError::RawModeTimeout`] when carrier detect never goes
    /// high, instead of assuming raw mode once the timeout passes.
    #[serde(deserialize_with = "deserialize_flag")]
    pub require_carrier: bool,
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            device: String::from("/dev/rfcomm0"),
            baud_rate: 9600,
            raw_mode_timeout_ms: 5000,
            require_carrier: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub frame_timeout_ms: u64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub verify_sync_pair: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkIniConfig {
    pub link: LinkSection,
    pub engine: EngineSection,
}

/// Options controlling how a [`FrameEngine`](crate::FrameEngine) treats the
/// stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Deadline for decoding one frame. On expiry the partial frame is dropped
    /// and the engine resynchronizes.
    pub frame_timeout: Option<Duration>,

    /// Check that the two bytes skipped before each mid-stream header really
    /// are the sync marker, and resynchronize if not.
    pub verify_sync_pair: bool,
}

/// Flattened configuration for opening a link and running an engine on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub device: String,
    pub baud_rate: u32,
    pub raw_mode_timeout_ms: u64,
    pub require_carrier: bool,
    pub frame_timeout_ms: u64,
    pub verify_sync_pair: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkIniConfig::default().into()
    }
}

impl From<LinkIniConfig> for LinkConfig {
    fn from(ini: LinkIniConfig) -> Self {
        Self {
            device: ini.link.device,
            baud_rate: ini.link.baud_rate,
            raw_mode_timeout_ms: ini.link.raw_mode_timeout_ms,
            require_carrier: ini.link.require_carrier,
            frame_timeout_ms: ini.engine.frame_timeout_ms,
            verify_sync_pair: ini.engine.verify_sync_pair,
        }
    }
}

impl LinkConfig {
    /// Parses an INI document. Missing keys keep their defaults.
    pub fn from_ini(ini: &str) -> Result<Self, LinkError> {
        let parsed: LinkIniConfig = serde_ini::from_str(ini)?;
        Ok(parsed.into())
    }

    pub fn raw_mode_timeout(&self) -> Duration {
        Duration::from_millis(self.raw_mode_timeout_ms)
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        (self.frame_timeout_ms > 0).then(|| Duration::from_millis(self.frame_timeout_ms))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            frame_timeout: self.frame_timeout(),
            verify_sync_pair: self.verify_sync_pair,
        }
    }
}

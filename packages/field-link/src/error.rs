use std::time::Duration;

use field_proto::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Link lost: {0}")]
    LinkLost(#[from] std::io::Error),

    #[error("Raw mode was not confirmed within {0:?}")]
    RawModeTimeout(Duration),

    #[cfg(feature = "serial")]
    #[error("Serialport Error")]
    SerialportError(#[from] tokio_serial::Error),

    #[error("No complete frame within {0:?}")]
    Timeout(Duration),

    #[error("Engine is faulted and must be restarted with a new transport")]
    Faulted,

    #[error("Expected a sync marker pair, found {0:02x?}")]
    SyncLost([u8; 2]),

    #[error("Snapshot publisher was dropped")]
    PublisherClosed,

    #[error("Frame decoding error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_ini::de::Error),
}

impl LinkError {
    /// Whether this error ends the session and requires a fresh transport.
    pub fn is_link_lost(&self) -> bool {
        match self {
            Self::LinkLost(_) | Self::RawModeTimeout(_) | Self::Faulted => true,
            #[cfg(feature = "serial")]
            Self::SerialportError(_) => true,
            _ => false,
        }
    }
}

//! Implements discovering and reading from Bluetooth serial (RFCOMM) ports.

use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use serialport::{ClearBuffer, SerialPort, SerialPortInfo, SerialPortType};
use tokio::{io::AsyncReadExt, time::sleep};
use tokio_serial::SerialStream;

use crate::{ByteSource, FrameWriter, LinkConfig, LinkError};

/// Baud rate the field host uses for the serial profile.
pub const SPP_BAUD_RATE: u32 = 9600;

/// How often raw mode confirmation is polled.
const RAW_MODE_POLL: Duration = Duration::from_millis(5);

/// Finds serial ports backed by a Bluetooth link.
pub fn find_ports() -> Result<Vec<SerialPortInfo>, LinkError> {
    let ports = tokio_serial::available_ports()?;

    let ports: Vec<_> = ports
        .into_iter()
        .filter(|port| {
            // RFCOMM bindings on Linux are usually reported as plain ports
            matches!(port.port_type, SerialPortType::BluetoothPort)
                || port.port_name.contains("rfcomm")
        })
        .collect();

    debug!("Found {} Bluetooth serial ports", ports.len());
    Ok(ports)
}

fn open_stream(config: &LinkConfig) -> Result<SerialStream, LinkError> {
    let stream = SerialStream::open(
        &tokio_serial::new(&config.device, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One),
    )?;

    info!("Opened {} at {} baud", config.device, config.baud_rate);
    Ok(stream)
}

/// Opens the device named in `config` for sending frames, as the field host
/// does.
pub fn open_writer(config: &LinkConfig) -> Result<FrameWriter<SerialStream>, LinkError> {
    Ok(FrameWriter::new(open_stream(config)?))
}

/// What to do when carrier detect is still low once the raw mode timeout has
/// passed.
fn carrier_timeout(
    port_name: &str,
    timeout: Duration,
    require_carrier: bool,
) -> Result<(), LinkError> {
    if require_carrier {
        return Err(LinkError::RawModeTimeout(timeout));
    }
    warn!(
        "Carrier detect still low on {} after {:?}. Assuming raw mode.",
        port_name, timeout
    );
    Ok(())
}

/// A [`ByteSource`] reading from a serial device.
///
/// Raw mode is requested by raising DTR and confirmed by carrier detect. Many
/// RFCOMM bindings never raise carrier detect, so unless
/// [`LinkConfig::require_carrier`] is set, a low carrier after
/// `raw_mode_timeout_ms` only logs a warning and the link is used anyway.
#[derive(Debug)]
pub struct SerialSource {
    port_name: String,
    stream: SerialStream,
    raw_mode_timeout: Duration,
    require_carrier: bool,
}

impl SerialSource {
    /// Opens the device named in `config`, 8N1 at the configured baud rate.
    pub fn open(config: &LinkConfig) -> Result<Self, LinkError> {
        Ok(Self {
            port_name: config.device.clone(),
            stream: open_stream(config)?,
            raw_mode_timeout: config.raw_mode_timeout(),
            require_carrier: config.require_carrier,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ByteSource for SerialSource {
    async fn enable_raw_mode(&mut self) -> Result<(), LinkError> {
        // Bytes buffered before the switch may be half of a frame
        self.stream.clear(ClearBuffer::Input)?;
        self.stream.write_data_terminal_ready(true)?;

        let start = Instant::now();
        loop {
            match self.stream.read_carrier_detect() {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => {
                    debug!(
                        "Carrier detect unavailable on {}: {}. Assuming raw mode.",
                        self.port_name, e
                    );
                    break;
                }
            }

            if start.elapsed() > self.raw_mode_timeout {
                return carrier_timeout(
                    &self.port_name,
                    self.raw_mode_timeout,
                    self.require_carrier,
                );
            }
            sleep(RAW_MODE_POLL).await;
        }

        debug!(
            "Raw mode confirmed on {} after {:?}",
            self.port_name,
            start.elapsed()
        );
        Ok(())
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        self.stream.read_exact(buf).await?;
        trace!("read bytes: {:x?}", buf);
        Ok(())
    }
}

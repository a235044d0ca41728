//! Serial ports via the `serialport` crate.
//!
//! [`SerialLink`] adapts a [`serialport::SerialPort`] to [embedded_io::Read] &
//! [embedded_io::Write] and holds back each write until [`LinkConfig::min_command_interval`]
//! has passed since the link was last active.

use std::{
    io, thread,
    time::{Duration, Instant},
};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::{
    error::{Error, Result},
    psu::Ps2000,
    relay::{RELAY_BAUD_RATE, RelayBoard},
    transport::{MIN_COMMAND_INTERVAL, READ_TIMEOUT},
};

/// Default baud rate of the power supply.
pub const PSU_BAUD_RATE: u32 = 115200;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Read timeout. Also marks the end of each response.
    pub timeout: Duration,
    /// Minimum gap between the end of one exchange and the next write.
    pub min_command_interval: Duration,
}

impl Default for LinkConfig {
    /// Power supply settings: 115200 baud, 8O1, no flow control.
    fn default() -> Self {
        Self {
            baud_rate: PSU_BAUD_RATE,
            parity: Parity::Odd,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(READ_TIMEOUT.to_millis() as u64),
            min_command_interval: Duration::from_millis(MIN_COMMAND_INTERVAL.to_millis() as u64),
        }
    }
}

impl LinkConfig {
    /// Relay board settings: 9600 baud, 8N1.
    pub fn relay() -> Self {
        Self {
            baud_rate: RELAY_BAUD_RATE,
            parity: Parity::None,
            min_command_interval: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct IoError(pub io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<serialport::Error> for IoError {
    fn from(err: serialport::Error) -> Self {
        IoError(err.into())
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// An open serial port.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    min_command_interval: Duration,
    last_activity: Option<Instant>,
}

impl SerialLink {
    /// Open the port at `path`, e.g. `/dev/ttyACM0` or `COM3`.
    pub fn open(path: &str, config: &LinkConfig) -> core::result::Result<Self, IoError> {
        log::debug!("Opening {} at {} baud", path, config.baud_rate);
        let port = serialport::new(path, config.baud_rate)
            .parity(config.parity)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()?;
        Ok(Self::from_port(port, config.min_command_interval))
    }

    /// Wrap a port that has already been opened and configured.
    pub fn from_port(port: Box<dyn SerialPort>, min_command_interval: Duration) -> Self {
        Self {
            port,
            min_command_interval,
            last_activity: None,
        }
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

    /// Sleep until the device is ready for the next command.
    fn pace(&self) {
        let Some(last) = self.last_activity else {
            return;
        };
        let elapsed = last.elapsed();
        if elapsed < self.min_command_interval {
            thread::sleep(self.min_command_interval - elapsed);
        }
    }
}

impl embedded_io::ErrorType for SerialLink {
    type Error = IoError;
}

impl embedded_io::Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        let result = io::Read::read(&mut self.port, buf).map_err(IoError);
        self.last_activity = Some(Instant::now());
        result
    }
}

impl embedded_io::Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        self.pace();
        let result = io::Write::write(&mut self.port, buf).map_err(IoError);
        self.last_activity = Some(Instant::now());
        result
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        io::Write::flush(&mut self.port).map_err(IoError)
    }
}

/// Open the power supply on `path` with the default settings.
pub fn open_psu(path: &str) -> Result<Ps2000<SerialLink>, IoError> {
    let link = SerialLink::open(path, &LinkConfig::default()).map_err(Error::SerialError)?;
    Ps2000::open(link)
}

/// Open the relay board on `path`.
pub fn open_relay_board(path: &str) -> Result<RelayBoard<SerialLink>, IoError> {
    let link = SerialLink::open(path, &LinkConfig::relay()).map_err(Error::SerialError)?;
    Ok(RelayBoard::new(link))
}

//! Our error types for the PS 2000 driver.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for EA PS 2000 communications.
///
/// `I` is the error type of the serial interface the driver was built on.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    /// Nothing came back before the read timed out. Usually means the device is absent or the
    /// port is misconfigured.
    #[error("No response from device")]
    NoResponse,
    #[error("Checksum mismatch: calculated {calculated:#06X}, received {received:#06X}")]
    ChecksumMismatch { calculated: u16, received: u16 },
    /// The device answered with an error telegram carrying a non-zero code.
    ///
    /// See [`DeviceErrorCode`](crate::types::DeviceErrorCode) for the known codes.
    #[error("Device reported error code {0:#04X}")]
    DeviceError(u8),
    #[error("Device is not connected")]
    NotConnected,
    /// A setpoint conversion was attempted against a zero or non-finite nominal rating.
    #[error("Nominal rating unavailable for scaling")]
    DivisionGuard,
    #[error("Invalid range")]
    InvalidRange,
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Telegram payload too long")]
    PayloadTooLong,
}

impl<I: embedded_io::Error> Error<I> {
    /// Whether this error came from the link itself rather than from protocol content.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::SerialError(_) | Error::NoResponse)
    }
}

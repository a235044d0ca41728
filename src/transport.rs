//! One telegram out, one response back.
//!
//! The transport owns the serial interface. Every transfer writes a single telegram and then
//! reads until the interface times out or [`MAX_RESPONSE_LEN`] bytes have arrived. Responses
//! carry no explicit length, so the read timeout is what bounds each transfer.

use embedded_io::{Error as _, ErrorKind};
use fugit::MillisDurationU32;

use crate::{
    error::{Error, Result},
    telegram::{self, MAX_RESPONSE_LEN, RawResponse, Response, TelegramKind},
};

/// Minimum time the device needs between two commands.
pub const MIN_COMMAND_INTERVAL: MillisDurationU32 = MillisDurationU32::from_ticks(50);

/// Read timeout to configure on the port. Must exceed [`MIN_COMMAND_INTERVAL`], so that waiting
/// out the timeout also spaces consecutive commands.
pub const READ_TIMEOUT: MillisDurationU32 = MillisDurationU32::from_ticks(60);

/// Node address of a single device on a point-to-point link.
pub const DEFAULT_NODE: u8 = 0x00;

/// Bytes requested from the interface per read call.
const READ_CHUNK: usize = 32;

/// Synchronous request/response transport over any [embedded_io::Read] & [embedded_io::Write]
/// interface.
///
/// The interface should be configured with a read timeout of [`READ_TIMEOUT`] and report it
/// as [`ErrorKind::TimedOut`].
pub struct Transport<S: embedded_io::Read + embedded_io::Write> {
    interface: Option<S>,
    node: u8,
}

impl<S: embedded_io::Read + embedded_io::Write> Transport<S> {
    pub fn new(interface: S) -> Self {
        Self {
            interface: Some(interface),
            node: DEFAULT_NODE,
        }
    }

    /// Address a different node. Only needed on shared buses.
    pub fn with_node(mut self, node: u8) -> Self {
        self.node = node;
        self
    }

    pub fn node(&self) -> u8 {
        self.node
    }

    pub fn is_open(&self) -> bool {
        self.interface.is_some()
    }

    /// Release the interface. Every later transfer fails with [`Error::NotConnected`].
    pub fn close(&mut self) -> Option<S> {
        if self.interface.is_some() {
            log::debug!("Closing transport");
        }
        self.interface.take()
    }

    /// Send one telegram and return the raw response.
    ///
    /// Checksum and device errors are only logged here; use [`Self::transfer`] to have them
    /// reported as errors.
    pub fn transfer_raw(
        &mut self,
        kind: TelegramKind,
        object: impl Into<u8>,
        data: &[u8],
    ) -> Result<RawResponse, S::Error> {
        let object = object.into();
        let request = telegram::encode(kind, self.node, object, data)?;
        let interface = self.interface.as_mut().ok_or(Error::NotConnected)?;

        log::trace!("TX {:02X?}", request.as_slice());
        interface
            .write_all(&request)
            .map_err(Error::SerialError)?;
        interface.flush().map_err(Error::SerialError)?;

        let mut response = RawResponse::new();
        let mut chunk = [0u8; READ_CHUNK];
        while response.len() < MAX_RESPONSE_LEN {
            let wanted = (MAX_RESPONSE_LEN - response.len()).min(READ_CHUNK);
            match interface.read(&mut chunk[..wanted]) {
                Ok(0) => break,
                Ok(bytes_read) => response
                    .extend_from_slice(&chunk[..bytes_read])
                    .map_err(|_| Error::InvalidResponse)?,
                // The timeout is the end of the response.
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(Error::SerialError(e)),
            }
        }

        if response.is_empty() {
            log::debug!("No response to object {}", object);
            return Err(Error::NoResponse);
        }
        log::trace!("RX {:02X?}", response.as_slice());

        if !telegram::verify_checksum(&response) {
            log::warn!("Checksum mismatch in response to object {}", object);
        }
        if let Some(code) = telegram::is_error(&response) {
            log::warn!("Object {} answered with error code {:#04X}", object, code);
        }

        Ok(response)
    }

    /// Send one telegram and return the checked response.
    ///
    /// Fails with [`Error::ChecksumMismatch`] or [`Error::DeviceError`] rather than handing a
    /// corrupted or refused response back. Nothing is retried.
    pub fn transfer(
        &mut self,
        kind: TelegramKind,
        object: impl Into<u8>,
        data: &[u8],
    ) -> Result<Response, S::Error> {
        let raw = self.transfer_raw(kind, object, data)?;
        Ok(Response::new(raw)?)
    }
}

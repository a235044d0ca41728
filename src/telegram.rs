//! Framing and checksums for PS 2000 telegrams.
//!
//! A telegram is laid out as:
//!
//! | Byte    | Field                                              |
//! |---------|----------------------------------------------------|
//! | 0       | Start delimiter (SD). Type, plus data length - 1.  |
//! | 1       | Device node (DN). Always `0` for a single device.  |
//! | 2       | Object (OBJ), or `0xFF` for an error/ack telegram. |
//! | 3..n-2  | Data.                                              |
//! | n-2..n  | 16 bit checksum over all preceding bytes, BE.      |

use thiserror::Error;

/// Largest response we ever ask the link for.
pub const MAX_RESPONSE_LEN: usize = 100;

/// Most data bytes a single telegram can describe with the 4 bit length field of the delimiter.
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Header (SD, DN, OBJ) plus trailing checksum.
const FRAMING_LEN: usize = 5;

/// Largest request telegram the codec can build.
pub const MAX_TELEGRAM_LEN: usize = FRAMING_LEN + MAX_PAYLOAD_LEN;

/// Base value of the start delimiter for telegrams sent from the host.
const DELIMITER_BASE: u8 = 0x30;

/// Object byte marking an error (or acknowledge) telegram.
pub const ERROR_OBJECT: u8 = 0xFF;

/// Error code the device uses as a plain acknowledge.
pub const ACK_CODE: u8 = 0x00;

/// A request telegram ready to be written out.
pub type Telegram = heapless::Vec<u8, MAX_TELEGRAM_LEN>;

/// What a telegram asks of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelegramKind {
    /// Read an object.
    Query = 0x40,
    /// Write an object.
    Send = 0xC0,
}

impl From<TelegramKind> for u8 {
    fn from(value: TelegramKind) -> Self {
        value as u8
    }
}

/// Failures found while building or checking a telegram.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramError {
    #[error("Payload of {0} bytes does not fit in a telegram")]
    PayloadTooLong(usize),
    #[error("Telegram truncated")]
    Truncated,
    #[error("Checksum mismatch: calculated {calculated:#06X}, received {received:#06X}")]
    ChecksumMismatch { calculated: u16, received: u16 },
    #[error("Device reported error code {0:#04X}")]
    DeviceError(u8),
}

impl<I: embedded_io::Error> From<TelegramError> for crate::error::Error<I> {
    fn from(err: TelegramError) -> Self {
        use crate::error::Error;
        match err {
            TelegramError::PayloadTooLong(_) => Error::PayloadTooLong,
            TelegramError::Truncated => Error::InvalidResponse,
            TelegramError::ChecksumMismatch {
                calculated,
                received,
            } => Error::ChecksumMismatch {
                calculated,
                received,
            },
            TelegramError::DeviceError(code) => Error::DeviceError(code),
        }
    }
}

/// A response that passed the checksum and error checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// The device acknowledged a send ("error 0").
    Ack,
    /// The device answered with object data.
    Data {
        node: u8,
        object: u8,
        payload: &'a [u8],
    },
}

impl<'a> Reply<'a> {
    /// Data bytes carried by the reply. Empty for an acknowledge.
    pub fn payload(&self) -> &'a [u8] {
        match *self {
            Reply::Ack => &[],
            Reply::Data { payload, .. } => payload,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Reply::Ack)
    }
}

/// Bytes as read back from the link, before any checks.
pub type RawResponse = heapless::Vec<u8, MAX_RESPONSE_LEN>;

/// An owned response that has already passed [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    bytes: RawResponse,
    ack: bool,
}

impl Response {
    /// Check `bytes` and keep them if they form a valid reply.
    pub fn new(bytes: RawResponse) -> Result<Self, TelegramError> {
        let ack = decode(&bytes)?.is_ack();
        Ok(Self { bytes, ack })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reply(&self) -> Reply<'_> {
        if self.ack {
            Reply::Ack
        } else {
            // Length was checked by `decode`.
            Reply::Data {
                node: self.bytes[1],
                object: self.bytes[2],
                payload: &self.bytes[3..self.bytes.len() - 2],
            }
        }
    }
}

/// 16 bit sum of `bytes`. Carries beyond 16 bits are dropped.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

/// Append the checksum of everything already in `buffer`.
pub fn append_checksum<const N: usize>(
    buffer: &mut heapless::Vec<u8, N>,
) -> Result<(), TelegramError> {
    let sum = checksum(buffer.as_slice());
    buffer
        .extend_from_slice(&sum.to_be_bytes())
        .map_err(|_| TelegramError::PayloadTooLong(buffer.len()))
}

/// Build a request telegram.
///
/// An empty `data` leaves the delimiter at `0x30 + kind`; otherwise the delimiter carries
/// `data.len() - 1` in its low nibble.
pub fn encode(
    kind: TelegramKind,
    node: u8,
    object: u8,
    data: &[u8],
) -> Result<Telegram, TelegramError> {
    if data.len() > MAX_PAYLOAD_LEN {
        return Err(TelegramError::PayloadTooLong(data.len()));
    }

    let mut delimiter = DELIMITER_BASE + u8::from(kind);
    if !data.is_empty() {
        // Bounded by MAX_PAYLOAD_LEN, so this stays within the low nibble.
        delimiter += (data.len() - 1) as u8;
    }

    let mut telegram = Telegram::new();
    telegram
        .extend_from_slice(&[delimiter, node, object])
        .map_err(|_| TelegramError::PayloadTooLong(data.len()))?;
    telegram
        .extend_from_slice(data)
        .map_err(|_| TelegramError::PayloadTooLong(data.len()))?;
    append_checksum(&mut telegram)?;

    Ok(telegram)
}

/// Recompute the checksum over everything but the last two bytes and compare.
pub fn verify_checksum(response: &[u8]) -> bool {
    split_checksum(response).is_some_and(|(body, received)| checksum(body) == received)
}

fn split_checksum(response: &[u8]) -> Option<(&[u8], u16)> {
    if response.len() < 3 {
        return None;
    }
    let (body, tail) = response.split_at(response.len() - 2);
    Some((body, u16::from_be_bytes([tail[0], tail[1]])))
}

/// Return the device error code carried by `response`, if any.
///
/// An error telegram with code `0x00` is the device's acknowledge and yields `None`.
pub fn is_error(response: &[u8]) -> Option<u8> {
    if response.get(2) != Some(&ERROR_OBJECT) {
        return None;
    }
    match response.get(3) {
        Some(&ACK_CODE) | None => None,
        Some(&code) => Some(code),
    }
}

/// Check a complete response and split it into its parts.
pub fn decode(response: &[u8]) -> Result<Reply<'_>, TelegramError> {
    if response.len() < FRAMING_LEN {
        return Err(TelegramError::Truncated);
    }

    let (body, received) = split_checksum(response).ok_or(TelegramError::Truncated)?;
    let calculated = checksum(body);
    if calculated != received {
        log::warn!(
            "Invalid checksum - calculated={:04X} received={:04X} telegram={:02X?}",
            calculated,
            received,
            response
        );
        return Err(TelegramError::ChecksumMismatch {
            calculated,
            received,
        });
    }

    let payload = &body[3..];
    if body[2] == ERROR_OBJECT {
        if payload.is_empty() {
            return Err(TelegramError::Truncated);
        }
        return match is_error(response) {
            None => Ok(Reply::Ack),
            Some(code) => {
                log::warn!("Device reported error code {:#04X}", code);
                Err(TelegramError::DeviceError(code))
            }
        };
    }

    Ok(Reply::Data {
        node: body[1],
        object: body[2],
        payload,
    })
}

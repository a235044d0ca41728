//! This crate provides an interface for communicating with and controlling the Elektro-Automatik
//! PS 2000 B series of programmable laboratory power supplies.
//!
//! It supports `no-std` environments by use of the `no-std` feature flag. The `serialport`
//! feature (on by default) adds [`link`], a ready made serial port for desktop use.
//!
//! Example PSU models which this should work with:
//! * PS 2042-06B
//! * PS 2042-10B
//! * PS 2084-03B
//! * PS 2084-05B
//!
//! Only single-channel models are supported. Triple models address their outputs through a
//! different node scheme.
//!
//! It speaks the binary telegram protocol of the device over its USB virtual COM port. The
//! serial port used for PSU comms should be configured like so:
//! * Baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: Odd
//! * Read timeout: 60 ms
//!
//! The device needs at least 50 ms between commands.
//!
//! The [`relay`] module drives a simple 8-channel serial relay board, often used next to the
//! supply to switch loads.

#![cfg_attr(feature = "no-std", no_std)]

pub mod access;
pub mod error;
pub mod objects;
pub mod psu;
pub mod relay;
pub mod scaling;
pub mod telegram;
pub mod transport;
pub mod types;

#[cfg(all(feature = "serialport", not(feature = "no-std")))]
pub mod link;

#[cfg(test)]
mod mock_device;
#[cfg(test)]
mod mock_serial;

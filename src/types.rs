//! This module contains types relevant to the PS 2000 object data.

use modular_bitfield::prelude::*;

use crate::scaling::{NominalRatings, ScalingError};

/// Length of the status object (71) payload.
pub const STATUS_LEN: usize = 6;

/// Control register (54) bit that selects remote control.
pub const CONTROL_REMOTE: u8 = 0x10;

/// Control register (54) bit that switches the output.
pub const CONTROL_OUTPUT_ON: u8 = 0x01;

/// Used to be less ambiguous and whether something is on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Disabled.
    #[default]
    Off,
    /// Enabled.
    On,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Represents the two possible power supply regulation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulationMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

/// Error codes the device reports in an error telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorCode {
    /// 0x03: Checksum of the request was incorrect.
    ChecksumIncorrect,
    /// 0x04: Start delimiter was incorrect.
    StartDelimiterIncorrect,
    /// 0x05: Wrong address for the output.
    WrongAddress,
    /// 0x07: Object is not defined.
    UndefinedObject,
    /// 0x08: Object length was incorrect.
    ObjectLengthIncorrect,
    /// 0x09: Read/write permission violated.
    AccessDenied,
    /// 0x0F: Device is locked.
    DeviceLocked,
    /// 0x30: Upper limit of the object exceeded.
    UpperLimitExceeded,
    /// 0x31: Lower limit of the object exceeded.
    LowerLimitExceeded,
    /// Any code not listed above.
    Unknown(u8),
}

impl From<u8> for DeviceErrorCode {
    fn from(value: u8) -> Self {
        use DeviceErrorCode as DEC;
        match value {
            0x03 => DEC::ChecksumIncorrect,
            0x04 => DEC::StartDelimiterIncorrect,
            0x05 => DEC::WrongAddress,
            0x07 => DEC::UndefinedObject,
            0x08 => DEC::ObjectLengthIncorrect,
            0x09 => DEC::AccessDenied,
            0x0F => DEC::DeviceLocked,
            0x30 => DEC::UpperLimitExceeded,
            0x31 => DEC::LowerLimitExceeded,
            other => DEC::Unknown(other),
        }
    }
}

impl From<DeviceErrorCode> for u8 {
    fn from(value: DeviceErrorCode) -> Self {
        use DeviceErrorCode as DEC;
        match value {
            DEC::ChecksumIncorrect => 0x03,
            DEC::StartDelimiterIncorrect => 0x04,
            DEC::WrongAddress => 0x05,
            DEC::UndefinedObject => 0x07,
            DEC::ObjectLengthIncorrect => 0x08,
            DEC::AccessDenied => 0x09,
            DEC::DeviceLocked => 0x0F,
            DEC::UpperLimitExceeded => 0x30,
            DEC::LowerLimitExceeded => 0x31,
            DEC::Unknown(code) => code,
        }
    }
}

/// First status byte.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlags {
    /// Non-zero when the device is under remote control.
    pub location: B2,
    #[skip]
    __: B6,
}

/// Second status byte.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFlags {
    pub output_on: bool,
    /// Non-zero while regulating current.
    pub regulation: B2,
    #[skip]
    __: B1,
    pub over_voltage: bool,
    pub over_current: bool,
    pub over_power: bool,
    pub over_temperature: bool,
}

/// Decoded status object (71).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStatus {
    /// `true` when under remote control, `false` when local.
    pub remote: bool,
    pub output: State,
    pub mode: RegulationMode,
    /// OVP tripped.
    pub over_voltage: bool,
    /// OCP tripped.
    pub over_current: bool,
    /// OPP tripped.
    pub over_power: bool,
    /// OTP tripped.
    pub over_temperature: bool,
    /// Actual voltage in volts.
    pub voltage: f32,
    /// Actual current in amps.
    pub current: f32,
}

impl DeviceStatus {
    /// Decode the status payload, scaling the actual values by `ratings`.
    ///
    /// | Byte | Content                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Control location, see [`ControlFlags`].   |
    /// | 1    | Output and protection, see [`OutputFlags`]. |
    /// | 2-3  | Actual voltage, BE, 25600 = nominal.      |
    /// | 4-5  | Actual current, BE, 25600 = nominal.      |
    pub fn decode(
        bytes: &[u8; STATUS_LEN],
        ratings: &NominalRatings,
    ) -> Result<Self, ScalingError> {
        let control = ControlFlags::from_bytes([bytes[0]]);
        let output = OutputFlags::from_bytes([bytes[1]]);
        let voltage_raw = u16::from_be_bytes([bytes[2], bytes[3]]);
        let current_raw = u16::from_be_bytes([bytes[4], bytes[5]]);

        Ok(Self {
            remote: control.location() != 0,
            output: State::from(output.output_on()),
            mode: if output.regulation() != 0 {
                RegulationMode::Cc
            } else {
                RegulationMode::Cv
            },
            over_voltage: output.over_voltage(),
            over_current: output.over_current(),
            over_power: output.over_power(),
            over_temperature: output.over_temperature(),
            voltage: ratings.raw_to_voltage(voltage_raw)?,
            current: ratings.raw_to_current(current_raw)?,
        })
    }

    /// `true` when under local (front panel) control.
    pub fn local(&self) -> bool {
        !self.remote
    }

    /// Whether any of the protections has tripped.
    pub fn any_fault(&self) -> bool {
        self.over_voltage || self.over_current || self.over_power || self.over_temperature
    }
}

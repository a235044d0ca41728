//! A small PS 2000 emulator for unit tests.
//!
//! It answers query and send telegrams from an in-memory object store, applies mask/value
//! writes to the control register and mirrors them into the status object.

use crate::{
    objects::Object,
    telegram::{self, ERROR_OBJECT, MAX_RESPONSE_LEN, RawResponse},
    types::{CONTROL_OUTPUT_ON, CONTROL_REMOTE, DeviceErrorCode, STATUS_LEN},
};

/// Delimiter type bits of an answer telegram.
const ANSWER: u8 = 0x80;

pub struct MockDevice {
    pub device_type: &'static str,
    pub serial_no: &'static str,
    pub article_no: &'static str,
    pub manufacturer: &'static str,
    pub software_version: &'static str,
    pub nominal_voltage: f32,
    pub nominal_current: f32,
    pub nominal_power: f32,
    pub device_class: u16,
    pub ovp_threshold: u16,
    pub ocp_threshold: u16,
    pub voltage_setpoint: u16,
    pub current_setpoint: u16,
    /// Control register bits.
    pub control: u8,
    /// Actual values reported in the status object, raw.
    pub actual_voltage: u16,
    pub actual_current: u16,
    /// Extra status bits (regulation mode, protections) on top of the output bit.
    pub output_flags: u8,
    /// Answer nothing at all.
    pub silent: bool,
    /// Corrupt the checksum of every answer.
    pub corrupt_checksum: bool,
    /// Last telegram received.
    last_request: heapless::Vec<u8, 32>,
    /// Number of telegrams received.
    requests: usize,
    pending: RawResponse,
    read_position: usize,
}

#[derive(Debug)]
pub struct MockDeviceError;

impl core::fmt::Display for MockDeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "read timed out")
    }
}

impl core::error::Error for MockDeviceError {}

impl embedded_io::Error for MockDeviceError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::TimedOut
    }
}

impl embedded_io::ErrorType for MockDevice {
    type Error = MockDeviceError;
}

impl embedded_io::Write for MockDevice {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.last_request.clear();
        let _ = self.last_request.extend_from_slice(buf);
        self.requests += 1;

        self.pending = if self.silent {
            RawResponse::new()
        } else {
            self.answer(buf)
        };
        if self.corrupt_checksum && !self.pending.is_empty() {
            let last = self.pending.len() - 1;
            self.pending[last] ^= 0xFF;
        }
        self.read_position = 0;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.pending[self.read_position..];
        if remaining.is_empty() {
            return Err(MockDeviceError);
        }
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.read_position += count;
        Ok(count)
    }
}

impl MockDevice {
    /// A 30V / 5A supply in local mode with the output off.
    pub fn new() -> Self {
        Self {
            device_type: "PS 2042-06B",
            serial_no: "1234567890",
            article_no: "39200112",
            manufacturer: "EA Elektro-Automatik",
            software_version: "V2.03 30.05.11",
            nominal_voltage: 30.0,
            nominal_current: 5.0,
            nominal_power: 160.0,
            device_class: 0x0010,
            ovp_threshold: 28160,
            ocp_threshold: 28160,
            voltage_setpoint: 0,
            current_setpoint: 0,
            control: 0,
            actual_voltage: 0,
            actual_current: 0,
            output_flags: 0,
            silent: false,
            corrupt_checksum: false,
            last_request: heapless::Vec::new(),
            requests: 0,
            pending: RawResponse::new(),
            read_position: 0,
        }
    }

    pub fn with_nominal(mut self, voltage: f32, current: f32) -> Self {
        self.nominal_voltage = voltage;
        self.nominal_current = current;
        self
    }

    pub fn last_request(&self) -> &[u8] {
        &self.last_request
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    fn status(&self) -> [u8; STATUS_LEN] {
        let location = if self.control & CONTROL_REMOTE != 0 { 0x01 } else { 0x00 };
        let output = (self.control & CONTROL_OUTPUT_ON) | self.output_flags;
        let [v_hi, v_lo] = self.actual_voltage.to_be_bytes();
        let [i_hi, i_lo] = self.actual_current.to_be_bytes();
        [location, output, v_hi, v_lo, i_hi, i_lo]
    }

    fn answer(&mut self, request: &[u8]) -> RawResponse {
        if !telegram::verify_checksum(request) || request.len() < 5 {
            return error(DeviceErrorCode::ChecksumIncorrect);
        }
        let delimiter = request[0];
        if delimiter & 0x30 != 0x30 {
            return error(DeviceErrorCode::StartDelimiterIncorrect);
        }
        let id = request[2];
        let data = &request[3..request.len() - 2];
        let Ok(object) = Object::try_from(id) else {
            return error(DeviceErrorCode::UndefinedObject);
        };

        match delimiter & 0xC0 {
            0x40 => self.query(object),
            0xC0 => self.send(object, data),
            _ => error(DeviceErrorCode::StartDelimiterIncorrect),
        }
    }

    fn query(&self, object: Object) -> RawResponse {
        if !object.access().readable() {
            return error(DeviceErrorCode::AccessDenied);
        }
        let id = object as u8;
        match object {
            Object::DeviceType => text(id, self.device_type),
            Object::SerialNo => text(id, self.serial_no),
            Object::ArticleNo => text(id, self.article_no),
            Object::Manufacturer => text(id, self.manufacturer),
            Object::SoftwareVersion => text(id, self.software_version),
            Object::NominalVoltage => frame(id, &self.nominal_voltage.to_be_bytes()),
            Object::NominalCurrent => frame(id, &self.nominal_current.to_be_bytes()),
            Object::NominalPower => frame(id, &self.nominal_power.to_be_bytes()),
            Object::DeviceClass => frame(id, &self.device_class.to_be_bytes()),
            Object::OvpThreshold => frame(id, &self.ovp_threshold.to_be_bytes()),
            Object::OcpThreshold => frame(id, &self.ocp_threshold.to_be_bytes()),
            Object::VoltageSetpoint => frame(id, &self.voltage_setpoint.to_be_bytes()),
            Object::CurrentSetpoint => frame(id, &self.current_setpoint.to_be_bytes()),
            Object::Control => frame(id, &[0x00, self.control]),
            Object::Status => frame(id, &self.status()),
        }
    }

    fn send(&mut self, object: Object, payload: &[u8]) -> RawResponse {
        if !object.access().writable() {
            return error(DeviceErrorCode::AccessDenied);
        }
        let [first, second] = match payload {
            [first, second] => [*first, *second],
            _ => return error(DeviceErrorCode::ObjectLengthIncorrect),
        };
        let value = u16::from_be_bytes([first, second]);
        match object {
            Object::OvpThreshold => self.ovp_threshold = value,
            Object::OcpThreshold => self.ocp_threshold = value,
            Object::VoltageSetpoint | Object::CurrentSetpoint if value > 25600 => {
                return error(DeviceErrorCode::UpperLimitExceeded);
            }
            Object::VoltageSetpoint => self.voltage_setpoint = value,
            Object::CurrentSetpoint => self.current_setpoint = value,
            Object::Control => {
                let (mask, bits) = (first, second);
                self.control = (self.control & !mask) | (bits & mask);
            }
            _ => return error(DeviceErrorCode::AccessDenied),
        }
        error_code(0x00)
    }
}

fn frame(object: u8, payload: &[u8]) -> RawResponse {
    let mut response = RawResponse::new();
    let length = payload.len().saturating_sub(1) as u8 & 0x0F;
    let _ = response.extend_from_slice(&[ANSWER | length, 0x00, object]);
    let _ = response.extend_from_slice(payload);
    let _ = telegram::append_checksum(&mut response);
    response
}

fn text(object: u8, value: &str) -> RawResponse {
    let mut payload: heapless::Vec<u8, MAX_RESPONSE_LEN> = heapless::Vec::new();
    let _ = payload.extend_from_slice(value.as_bytes());
    let _ = payload.push(0x00);
    frame(object, &payload)
}

fn error_code(code: u8) -> RawResponse {
    frame(ERROR_OBJECT, &[code])
}

fn error(code: DeviceErrorCode) -> RawResponse {
    error_code(code.into())
}

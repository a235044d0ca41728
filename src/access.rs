//! Typed object access on top of [`Transport`].
//!
//! There is one accessor per [`Encoding`], plus [`Transport::read_object`] which picks the
//! accessor from the object table.

use crate::{
    error::{Error, Result},
    objects::{Encoding, Object},
    telegram::{MAX_RESPONSE_LEN, Reply, Response, TelegramKind},
    transport::Transport,
    types::{CONTROL_OUTPUT_ON, CONTROL_REMOTE},
};

/// Text read from a string object.
pub type Text = heapless::String<MAX_RESPONSE_LEN>;

/// Bytes read from a binary object.
pub type Bytes = heapless::Vec<u8, MAX_RESPONSE_LEN>;

/// Value of any object, typed by its table encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    Text(Text),
    Float(f32),
    Integer(u16),
    Binary(Bytes),
}

impl<S: embedded_io::Read + embedded_io::Write> Transport<S> {
    /// Query `object` and make sure the answer carries its data.
    fn query(&mut self, object: u8) -> Result<Response, S::Error> {
        let response = self.transfer(TelegramKind::Query, object, &[])?;
        let echoed = match response.reply() {
            Reply::Data { object: echoed, .. } => Some(echoed),
            Reply::Ack => None,
        };
        if echoed != Some(object) {
            log::warn!("Query of object {} answered by {:?}", object, echoed);
            return Err(Error::InvalidResponse);
        }
        Ok(response)
    }

    /// Read a string object.
    pub fn get_string(&mut self, object: impl Into<u8>) -> Result<Text, S::Error> {
        let object = object.into();
        let response = self.query(object)?;
        let payload = response.reply().payload();

        // Drop the NUL terminator.
        let (_, chars) = payload.split_last().ok_or(Error::InvalidResponse)?;
        if !chars.is_ascii() {
            return Err(Error::InvalidResponse);
        }
        let chars = core::str::from_utf8(chars).map_err(|_| Error::InvalidResponse)?;

        let mut text = Text::new();
        text.push_str(chars).map_err(|_| Error::InvalidResponse)?;
        log::debug!("Object {} = {:?}", object, chars);
        Ok(text)
    }

    /// Read a big-endian `f32` object.
    pub fn get_float(&mut self, object: impl Into<u8>) -> Result<f32, S::Error> {
        let object = object.into();
        let response = self.query(object)?;
        let bytes: [u8; 4] = response
            .reply()
            .payload()
            .try_into()
            .map_err(|_| Error::InvalidResponse)?;
        let value = f32::from_be_bytes(bytes);
        log::debug!("Object {} = {}", object, value);
        Ok(value)
    }

    /// Read a big-endian `u16` object.
    pub fn get_integer(&mut self, object: impl Into<u8>) -> Result<u16, S::Error> {
        let object = object.into();
        let response = self.query(object)?;
        let value = leading_u16(response.reply().payload())?;
        log::debug!("Object {} = {}", object, value);
        Ok(value)
    }

    /// Write a `u16` object and return the value the device reports back.
    ///
    /// A device that only acknowledges the write is taken to hold `value`.
    pub fn set_integer(&mut self, object: impl Into<u8>, value: u16) -> Result<u16, S::Error> {
        let object = object.into();
        log::debug!("Object {} <- {}", object, value);
        let response = self.transfer(TelegramKind::Send, object, &value.to_be_bytes())?;
        match response.reply() {
            Reply::Ack => Ok(value),
            Reply::Data { payload, .. } => leading_u16(payload),
        }
    }

    /// Read a binary object.
    pub fn get_binary(&mut self, object: impl Into<u8>) -> Result<Bytes, S::Error> {
        let object = object.into();
        let response = self.query(object)?;
        let bytes =
            Bytes::from_slice(response.reply().payload()).map_err(|_| Error::InvalidResponse)?;
        log::debug!("Object {} = {:02X?}", object, bytes.as_slice());
        Ok(bytes)
    }

    /// Change the bits of a binary object selected by `mask` to those in `value`.
    ///
    /// Returns the device's answer, normally a bare acknowledge.
    pub fn set_binary(
        &mut self,
        object: impl Into<u8>,
        mask: u8,
        value: u8,
    ) -> Result<Response, S::Error> {
        let object = object.into();
        log::debug!("Object {} <- mask {:#04X} value {:#04X}", object, mask, value);
        self.transfer(TelegramKind::Send, object, &[mask, value])
    }

    /// Read the raw power supply control register.
    pub fn get_control(&mut self) -> Result<Bytes, S::Error> {
        self.get_binary(Object::Control)
    }

    fn set_control(&mut self, mask: u8, enable: bool) -> Result<bool, S::Error> {
        let value = if enable { mask } else { 0x00 };
        let response = self.set_binary(Object::Control, mask, value)?;
        Ok(response.reply().is_ack())
    }

    /// Switch between remote and local control.
    pub fn set_remote(&mut self, remote: bool) -> Result<bool, S::Error> {
        self.set_control(CONTROL_REMOTE, remote)
    }

    pub fn set_local(&mut self, local: bool) -> Result<bool, S::Error> {
        self.set_remote(!local)
    }

    /// Switch the output on or off. Only accepted under remote control.
    pub fn set_output_on(&mut self, on: bool) -> Result<bool, S::Error> {
        self.set_control(CONTROL_OUTPUT_ON, on)
    }

    pub fn set_output_off(&mut self, off: bool) -> Result<bool, S::Error> {
        self.set_output_on(!off)
    }

    /// Read any known object, decoded according to its table encoding.
    pub fn read_object(&mut self, object: Object) -> Result<ObjectValue, S::Error> {
        Ok(match object.encoding() {
            Encoding::String => ObjectValue::Text(self.get_string(object)?),
            Encoding::Float => ObjectValue::Float(self.get_float(object)?),
            Encoding::Integer => ObjectValue::Integer(self.get_integer(object)?),
            Encoding::Binary => ObjectValue::Binary(self.get_binary(object)?),
        })
    }
}

fn leading_u16<I: embedded_io::Error>(payload: &[u8]) -> Result<u16, I> {
    match payload {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(Error::InvalidResponse),
    }
}

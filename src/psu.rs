use crate::{
    access::{Bytes, ObjectValue, Text},
    error::{Error, Result},
    objects::Object,
    scaling::NominalRatings,
    transport::Transport,
    types::{DeviceStatus, STATUS_LEN},
};

/// You can create a Ps2000 using any interface which implements [embedded_io::Read] &
/// [embedded_io::Write].
///
/// The nominal voltage and current are read once by [`Ps2000::open`] and used to scale every
/// setpoint and actual value. After [`Ps2000::close`] every method fails with
/// [`Error::NotConnected`].
pub struct Ps2000<S: embedded_io::Read + embedded_io::Write> {
    transport: Transport<S>,
    ratings: NominalRatings,
}

impl<S: embedded_io::Read + embedded_io::Write> Ps2000<S> {
    /// Connect to the device on `interface` and read its nominal ratings.
    pub fn open(interface: S) -> Result<Self, S::Error> {
        Self::open_transport(Transport::new(interface))
    }

    /// Like [`Self::open`], for an already configured transport.
    pub fn open_transport(mut transport: Transport<S>) -> Result<Self, S::Error> {
        let ratings = match Self::read_ratings(&mut transport) {
            Ok(ratings) => ratings,
            Err(err) => {
                log::warn!("Could not read nominal ratings: {}", err);
                return Err(err);
            }
        };
        log::debug!(
            "Connected, nominal {}V / {}A",
            ratings.u_nom,
            ratings.i_nom
        );
        Ok(Self { transport, ratings })
    }

    fn read_ratings(transport: &mut Transport<S>) -> Result<NominalRatings, S::Error> {
        let u_nom = transport.get_float(Object::NominalVoltage)?;
        let i_nom = transport.get_float(Object::NominalCurrent)?;
        Ok(NominalRatings::new(u_nom, i_nom))
    }

    /// Release the interface and hand it back.
    pub fn close(&mut self) -> Option<S> {
        self.transport.close()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Nominal ratings read when the connection was opened.
    pub fn nominal_ratings(&self) -> NominalRatings {
        self.ratings
    }

    /// Direct access to the object layer.
    pub fn transport(&mut self) -> &mut Transport<S> {
        &mut self.transport
    }

    fn ensure_open(&self) -> Result<(), S::Error> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Read any known object.
    pub fn read_object(&mut self, object: Object) -> Result<ObjectValue, S::Error> {
        self.transport.read_object(object)
    }

    /// Device type, e.g. `PS 2042-06B`.
    pub fn get_type(&mut self) -> Result<Text, S::Error> {
        self.transport.get_string(Object::DeviceType)
    }

    pub fn get_serial(&mut self) -> Result<Text, S::Error> {
        self.transport.get_string(Object::SerialNo)
    }

    /// Nominal voltage in volts, read from the device.
    pub fn get_nominal_voltage(&mut self) -> Result<f32, S::Error> {
        self.transport.get_float(Object::NominalVoltage)
    }

    /// Nominal current in amps, read from the device.
    pub fn get_nominal_current(&mut self) -> Result<f32, S::Error> {
        self.transport.get_float(Object::NominalCurrent)
    }

    /// Nominal power in watts.
    pub fn get_nominal_power(&mut self) -> Result<f32, S::Error> {
        self.transport.get_float(Object::NominalPower)
    }

    pub fn get_article(&mut self) -> Result<Text, S::Error> {
        self.transport.get_string(Object::ArticleNo)
    }

    pub fn get_manufacturer(&mut self) -> Result<Text, S::Error> {
        self.transport.get_string(Object::Manufacturer)
    }

    /// Firmware version string.
    pub fn get_version(&mut self) -> Result<Text, S::Error> {
        self.transport.get_string(Object::SoftwareVersion)
    }

    pub fn get_device_class(&mut self) -> Result<u16, S::Error> {
        self.transport.get_integer(Object::DeviceClass)
    }

    /// Raw over voltage protection threshold.
    pub fn get_ovp_threshold(&mut self) -> Result<u16, S::Error> {
        self.transport.get_integer(Object::OvpThreshold)
    }

    pub fn set_ovp_threshold(&mut self, threshold: u16) -> Result<u16, S::Error> {
        self.transport.set_integer(Object::OvpThreshold, threshold)
    }

    /// Raw over current protection threshold.
    pub fn get_ocp_threshold(&mut self) -> Result<u16, S::Error> {
        self.transport.get_integer(Object::OcpThreshold)
    }

    pub fn set_ocp_threshold(&mut self, threshold: u16) -> Result<u16, S::Error> {
        self.transport.set_integer(Object::OcpThreshold, threshold)
    }

    /// Voltage setpoint in volts.
    pub fn get_voltage_setpoint(&mut self) -> Result<f32, S::Error> {
        let raw = self.transport.get_integer(Object::VoltageSetpoint)?;
        Ok(self.ratings.raw_to_voltage(raw)?)
    }

    /// Set the output voltage in volts. Returns the raw value the device reports back.
    pub fn set_voltage(&mut self, volts: f32) -> Result<u16, S::Error> {
        self.ensure_open()?;
        let raw = self.ratings.voltage_to_raw(volts)?;
        log::debug!("Setting voltage {}V (raw {})", volts, raw);
        self.transport.set_integer(Object::VoltageSetpoint, raw)
    }

    /// Current setpoint in amps.
    pub fn get_current_setpoint(&mut self) -> Result<f32, S::Error> {
        let raw = self.transport.get_integer(Object::CurrentSetpoint)?;
        Ok(self.ratings.raw_to_current(raw)?)
    }

    /// Set the current limit in amps. Returns the raw value the device reports back.
    pub fn set_current(&mut self, amps: f32) -> Result<u16, S::Error> {
        self.ensure_open()?;
        let raw = self.ratings.current_to_raw(amps)?;
        log::debug!("Setting current {}A (raw {})", amps, raw);
        self.transport.set_integer(Object::CurrentSetpoint, raw)
    }

    /// Raw control register.
    pub fn get_control(&mut self) -> Result<Bytes, S::Error> {
        self.transport.get_control()
    }

    /// Take (or give up) remote control. Returns whether the device acknowledged.
    pub fn set_remote(&mut self, remote: bool) -> Result<bool, S::Error> {
        self.transport.set_remote(remote)
    }

    pub fn set_local(&mut self, local: bool) -> Result<bool, S::Error> {
        self.transport.set_local(local)
    }

    /// Switch the output. Returns whether the device acknowledged.
    pub fn set_output_on(&mut self, on: bool) -> Result<bool, S::Error> {
        self.transport.set_output_on(on)
    }

    pub fn set_output_off(&mut self, off: bool) -> Result<bool, S::Error> {
        self.transport.set_output_off(off)
    }

    /// Read the status flags and actual output voltage and current.
    pub fn get_actual(&mut self) -> Result<DeviceStatus, S::Error> {
        let bytes = self.transport.get_binary(Object::Status)?;
        let status: &[u8; STATUS_LEN] = bytes
            .get(..STATUS_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(Error::InvalidResponse)?;
        Ok(DeviceStatus::decode(status, &self.ratings)?)
    }
}

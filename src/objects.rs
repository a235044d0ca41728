//! This module is used to define the objects on the PS 2000 B series.
//!
//! Each object has a fixed encoding, described by [`OBJECTS`]. Access modes are recorded for
//! reference only; the driver does not stop you writing a read-only object, the device will
//! answer with an error code instead.

use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, EnumCountMacro)]
#[repr(u8)]
pub enum Object {
    /// __R__ - Device type, e.g. `PS 2042-06B`.
    DeviceType = 0,
    /// __R__ - Serial number.
    SerialNo = 1,
    /// __R__ - Nominal voltage in volts.
    NominalVoltage = 2,
    /// __R__ - Nominal current in amps.
    NominalCurrent = 3,
    /// __R__ - Nominal power in watts.
    NominalPower = 4,
    /// __R__ - Article number.
    ArticleNo = 6,
    /// __R__ - Manufacturer.
    Manufacturer = 8,
    /// __R__ - Firmware version.
    SoftwareVersion = 9,
    /// __R__ - Device class.
    DeviceClass = 19,
    /// __R/W__ - Over voltage protection threshold.
    OvpThreshold = 38,
    /// __R/W__ - Over current protection threshold.
    OcpThreshold = 39,
    /// __R/W__ - Voltage setpoint.
    ///
    /// Value is a percentage of the nominal voltage, where `25600` is 100%.
    VoltageSetpoint = 50,
    /// __R/W__ - Current setpoint.
    ///
    /// Value is a percentage of the nominal current, where `25600` is 100%.
    CurrentSetpoint = 51,
    /// __R/W__ - Power supply control.
    ///
    /// Written as `[mask, value]`, only the bits set in `mask` are changed.
    /// * `0x01` - Output on.
    /// * `0x10` - Remote control.
    Control = 54,
    /// __R__ - Status and actual values.
    ///
    /// See [`DeviceStatus`](crate::types::DeviceStatus) for the layout.
    Status = 71,
}

impl From<Object> for u8 {
    fn from(value: Object) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Object {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OBJECTS
            .iter()
            .map(|spec| spec.object)
            .find(|object| *object as u8 == value)
            .ok_or(())
    }
}

/// How an object's data is laid out on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// NUL terminated ASCII.
    String,
    /// Big-endian IEEE-754 `f32`.
    Float,
    /// Big-endian `u16`.
    Integer,
    /// Raw bytes. Written as a mask/value pair.
    Binary,
}

/// Whether the device lets an object be read, written or both.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub const fn readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub const fn writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// One row of the object table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ObjectSpec {
    pub object: Object,
    pub encoding: Encoding,
    pub access: Access,
}

impl ObjectSpec {
    const fn new(object: Object, encoding: Encoding, access: Access) -> Self {
        Self {
            object,
            encoding,
            access,
        }
    }
}

/// Every object the driver knows about.
pub const OBJECTS: [ObjectSpec; Object::COUNT] = {
    use Access::*;
    use Encoding::*;
    [
        ObjectSpec::new(Object::DeviceType, String, Read),
        ObjectSpec::new(Object::SerialNo, String, Read),
        ObjectSpec::new(Object::NominalVoltage, Float, Read),
        ObjectSpec::new(Object::NominalCurrent, Float, Read),
        ObjectSpec::new(Object::NominalPower, Float, Read),
        ObjectSpec::new(Object::ArticleNo, String, Read),
        ObjectSpec::new(Object::Manufacturer, String, Read),
        ObjectSpec::new(Object::SoftwareVersion, String, Read),
        ObjectSpec::new(Object::DeviceClass, Integer, Read),
        ObjectSpec::new(Object::OvpThreshold, Integer, ReadWrite),
        ObjectSpec::new(Object::OcpThreshold, Integer, ReadWrite),
        ObjectSpec::new(Object::VoltageSetpoint, Integer, ReadWrite),
        ObjectSpec::new(Object::CurrentSetpoint, Integer, ReadWrite),
        ObjectSpec::new(Object::Control, Binary, ReadWrite),
        ObjectSpec::new(Object::Status, Binary, Read),
    ]
};

impl Object {
    /// Look up this object's row in [`OBJECTS`].
    pub fn spec(self) -> &'static ObjectSpec {
        // Every variant has a row, checked by `every_object_has_one_spec`.
        OBJECTS
            .iter()
            .find(|spec| spec.object == self)
            .unwrap_or(&OBJECTS[0])
    }

    pub fn encoding(self) -> Encoding {
        self.spec().encoding
    }

    pub fn access(self) -> Access {
        self.spec().access
    }
}

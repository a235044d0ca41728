//! Fixed-point scaling against the device's nominal ratings.
//!
//! Setpoints and actual values are exchanged as a fraction of the nominal quantity, where
//! `0` is 0% and [`FULL_SCALE`] is 100%. The nominal voltage and current are read once when
//! the connection is opened.

use thiserror::Error;

/// Raw value representing 100% of a nominal quantity.
pub const FULL_SCALE: u16 = 25600;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingError {
    /// Nominal rating is zero, negative or not a number.
    #[error("Nominal rating unavailable for scaling")]
    DivisionGuard,
    /// Requested value is negative, above nominal or not a number.
    #[error("Value outside of nominal range")]
    OutOfRange,
}

impl<I: embedded_io::Error> From<ScalingError> for crate::error::Error<I> {
    fn from(err: ScalingError) -> Self {
        match err {
            ScalingError::DivisionGuard => crate::error::Error::DivisionGuard,
            ScalingError::OutOfRange => crate::error::Error::InvalidRange,
        }
    }
}

/// Nominal voltage and current of the connected device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NominalRatings {
    /// Nominal voltage in volts.
    pub u_nom: f32,
    /// Nominal current in amps.
    pub i_nom: f32,
}

impl NominalRatings {
    pub const fn new(u_nom: f32, i_nom: f32) -> Self {
        Self { u_nom, i_nom }
    }

    /// Convert volts to a raw setpoint.
    pub fn voltage_to_raw(&self, volts: f32) -> Result<u16, ScalingError> {
        physical_to_raw(self.u_nom, volts)
    }

    /// Convert a raw voltage value to volts.
    pub fn raw_to_voltage(&self, raw: u16) -> Result<f32, ScalingError> {
        raw_to_physical(self.u_nom, raw)
    }

    /// Convert amps to a raw setpoint.
    pub fn current_to_raw(&self, amps: f32) -> Result<u16, ScalingError> {
        physical_to_raw(self.i_nom, amps)
    }

    /// Convert a raw current value to amps.
    pub fn raw_to_current(&self, raw: u16) -> Result<f32, ScalingError> {
        raw_to_physical(self.i_nom, raw)
    }
}

fn check_nominal(nominal: f32) -> Result<(), ScalingError> {
    if nominal.is_finite() && nominal > 0.0 {
        Ok(())
    } else {
        Err(ScalingError::DivisionGuard)
    }
}

/// Scale `value` (0..=`nominal`) to 0..=[`FULL_SCALE`], rounding to the nearest step.
pub fn physical_to_raw(nominal: f32, value: f32) -> Result<u16, ScalingError> {
    check_nominal(nominal)?;

    let scaled = value * FULL_SCALE as f32 / nominal;
    if !scaled.is_finite() || scaled < 0.0 {
        return Err(ScalingError::OutOfRange);
    }
    // Non-negative, so adding a half and truncating rounds to nearest.
    let rounded = scaled + 0.5;
    if rounded >= FULL_SCALE as f32 + 1.0 {
        return Err(ScalingError::OutOfRange);
    }
    Ok(rounded as u16)
}

/// Scale a raw value back to physical units.
pub fn raw_to_physical(nominal: f32, raw: u16) -> Result<f32, ScalingError> {
    check_nominal(nominal)?;
    Ok(nominal * raw as f32 / FULL_SCALE as f32)
}

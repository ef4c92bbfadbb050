//! This module is used to define the objects addressed by telegrams.
//!
//! Only the objects the driver uses are listed. Values are fixed by the device firmware.

use strum_macros::EnumIter;

/// How the contents of an object are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWidth {
    /// 16 bit register scaled to [`FULL_SCALE`](crate::scaling::FULL_SCALE), high byte first.
    Full,
    /// Only the high byte of the scaled register is transmitted.
    HighByteOnly,
    /// Raw bytes, not register-scaled.
    Raw,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum ObjectId {
    /// __W__ - Over-voltage protection threshold.
    OvpThreshold = 38,
    /// __W__ - Over-current protection threshold.
    OcpThreshold = 39,
    /// __W__ - Voltage setpoint.
    ///
    /// E.g. 21V on a 42V device => `12800` => `[0x32, 0x00]`.
    VoltageSetpoint = 50,
    /// __W__ - Current setpoint.
    CurrentSetpoint = 51,
    /// __W__ - Power setpoint.
    PowerSetpoint = 52,
    /// __W__ - Device control.
    ///
    /// Written as a mask/value byte pair, see [`ControlMask`].
    Control = 54,
    /// __R__ - Device status on PSI 8000 and EL 9000. Two bytes of bitfields.
    Status = 70,
    /// __R__ - Actual values.
    ///
    /// PSI 8000 and EL 9000 answer with voltage, current and power as full registers.
    /// PS 2000 B answers with two status bytes followed by voltage and current, of which
    /// only the high bytes are meaningful.
    ActualValues = 71,
}

impl ObjectId {
    pub const fn register_width(&self) -> RegisterWidth {
        match self {
            ObjectId::Control | ObjectId::Status => RegisterWidth::Raw,
            // ActualValues differs per family, see `DeviceFamily::actual_values`.
            _ => RegisterWidth::Full,
        }
    }
}

impl From<ObjectId> for u8 {
    fn from(value: ObjectId) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for ObjectId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            38 => Ok(ObjectId::OvpThreshold),
            39 => Ok(ObjectId::OcpThreshold),
            50 => Ok(ObjectId::VoltageSetpoint),
            51 => Ok(ObjectId::CurrentSetpoint),
            52 => Ok(ObjectId::PowerSetpoint),
            54 => Ok(ObjectId::Control),
            70 => Ok(ObjectId::Status),
            71 => Ok(ObjectId::ActualValues),
            other => Err(other),
        }
    }
}

/// A mask/value pair written to [`ObjectId::Control`].
///
/// Byte 0 selects the bits being changed, byte 1 carries their new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMask {
    pub mask: u8,
    pub value: u8,
}

impl ControlMask {
    /// Remote control on/off.
    pub const REMOTE: u8 = 0x10;
    /// Output (or input, on loads) on/off.
    pub const OUTPUT: u8 = 0x01;
    /// PS 2000 B channel tracking. `0xF0` enables it, `0xE0` disables it.
    pub const TRACKING: u8 = 0xF0;

    pub const fn remote(on: bool) -> Self {
        Self {
            mask: Self::REMOTE,
            value: if on { Self::REMOTE } else { 0x00 },
        }
    }

    pub const fn output(on: bool) -> Self {
        Self {
            mask: Self::OUTPUT,
            value: if on { Self::OUTPUT } else { 0x00 },
        }
    }

    pub const fn tracking(on: bool) -> Self {
        Self {
            mask: Self::TRACKING,
            value: if on { 0xF0 } else { 0xE0 },
        }
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        [self.mask, self.value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn object_id_conversions() {
        // Converting to u8 and back should give the same object.
        for object in ObjectId::iter() {
            assert_eq!(ObjectId::try_from(u8::from(object)), Ok(object));
        }
        assert_eq!(ObjectId::try_from(0), Err(0));
    }

    #[test]
    fn control_masks() {
        assert_eq!(ControlMask::remote(true).to_bytes(), [0x10, 0x10]);
        assert_eq!(ControlMask::remote(false).to_bytes(), [0x10, 0x00]);
        assert_eq!(ControlMask::output(true).to_bytes(), [0x01, 0x01]);
        assert_eq!(ControlMask::output(false).to_bytes(), [0x01, 0x00]);
        assert_eq!(ControlMask::tracking(true).to_bytes(), [0xF0, 0xF0]);
        assert_eq!(ControlMask::tracking(false).to_bytes(), [0xF0, 0xE0]);
    }

    #[test]
    fn setpoints_are_full_registers() {
        assert_eq!(ObjectId::VoltageSetpoint.register_width(), RegisterWidth::Full);
        assert_eq!(ObjectId::Control.register_width(), RegisterWidth::Raw);
    }
}

//! Conversion between physical units and the protocol's register representation.
//!
//! EA devices express setpoints and actual values as a percentage of the device's nominal
//! rating, where [`FULL_SCALE`] (`25600`) is 100%. A 42V device asked for 21V is therefore
//! sent `12800`. The nominal ratings differ per model, see
//! [`DeviceProfile`](crate::profile::DeviceProfile).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::ScalingError;

/// Register value representing 100% of a nominal rating.
pub const FULL_SCALE: u16 = 25600;

/// The physical quantities a device is rated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum Quantity {
    Voltage,
    Current,
    Power,
}

/// Convert a physical value into a register.
///
/// Returns `None` when `value` is outside `0..=nominal`. Out of range values are never clamped.
pub fn to_register(value: f32, nominal: f32) -> Option<u16> {
    if nominal.is_nan() || nominal <= 0.0 || !(0.0..=nominal).contains(&value) {
        return None;
    }
    // Rounded to the nearest count, value is never negative here.
    Some((FULL_SCALE as f32 * value / nominal + 0.5) as u16)
}

/// Register in wire order, high byte first.
#[inline]
pub const fn register_bytes(register: u16) -> [u8; 2] {
    register.to_be_bytes()
}

/// Convert a received register back into a physical value.
///
/// Pass `None` for `lo` when the object only carries the register's high byte.
pub fn from_register(hi: u8, lo: Option<u8>, nominal: f32) -> f32 {
    let raw = ((hi as u32) << 8) | lo.unwrap_or(0) as u32;
    nominal * raw as f32 / FULL_SCALE as f32
}

/// Nominal ratings of a device. A rating is absent if the device has no such setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nominals {
    pub voltage: Option<f32>,
    pub current: Option<f32>,
    pub power: Option<f32>,
}

impl Nominals {
    pub const fn new(voltage: f32, current: f32, power: f32) -> Self {
        Self {
            voltage: Some(voltage),
            current: Some(current),
            power: Some(power),
        }
    }

    pub const fn nominal(&self, quantity: Quantity) -> Option<f32> {
        match quantity {
            Quantity::Voltage => self.voltage,
            Quantity::Current => self.current,
            Quantity::Power => self.power,
        }
    }

    /// Convert a physical value of `quantity` into a register.
    pub fn to_register(&self, quantity: Quantity, value: f32) -> Result<u16, ScalingError> {
        let nominal = self
            .nominal(quantity)
            .ok_or(ScalingError::NoNominal(quantity))?;
        to_register(value, nominal).ok_or(ScalingError::OutOfRange {
            quantity,
            value,
            nominal,
        })
    }

    /// Convert a received register of `quantity` into a physical value.
    pub fn from_register(
        &self,
        quantity: Quantity,
        hi: u8,
        lo: Option<u8>,
    ) -> Result<f32, ScalingError> {
        let nominal = self
            .nominal(quantity)
            .ok_or(ScalingError::NoNominal(quantity))?;
        Ok(from_register(hi, lo, nominal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_scaling() {
        // Half of a 42V rating is half of full scale.
        assert_eq!(to_register(21.0, 42.0), Some(12800));
        assert_eq!(register_bytes(12800), [0x32, 0x00]);
        assert_eq!(from_register(0x32, Some(0x00), 42.0), 21.0);
    }

    #[test]
    fn test_limits() {
        assert_eq!(to_register(0.0, 720.0), Some(0));
        assert_eq!(to_register(720.0, 720.0), Some(FULL_SCALE));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(to_register(42.01, 42.0), None);
        assert_eq!(to_register(-0.1, 42.0), None);
        assert_eq!(to_register(f32::NAN, 42.0), None);
        assert_eq!(to_register(1.0, 0.0), None);
    }

    #[test]
    fn test_rounds_to_nearest_count() {
        // 1V of 720V is 35.55 counts.
        assert_eq!(to_register(1.0, 720.0), Some(36));
    }

    #[test]
    fn test_high_byte_only() {
        // 0x80 high byte alone is half scale.
        assert_eq!(from_register(0x80, None, 10.0), 10.0 * 32768.0 / 25600.0);
        assert_eq!(from_register(0x32, None, 42.0), 21.0);
    }

    #[test]
    fn test_quantization_bound() {
        for nominal in [10.0f32, 42.0, 160.0, 720.0, 3000.0] {
            for step in 0..=1000 {
                let value = nominal * step as f32 / 1000.0;
                let register = to_register(value, nominal).unwrap();
                let [hi, lo] = register_bytes(register);
                let back = from_register(hi, Some(lo), nominal);
                assert!(
                    (back - value).abs() <= nominal / FULL_SCALE as f32,
                    "{value} of {nominal} came back as {back}"
                );
            }
        }
    }

    #[test]
    fn test_nominals() {
        let nominals = Nominals {
            voltage: Some(42.0),
            current: Some(10.0),
            power: None,
        };
        assert_eq!(nominals.to_register(Quantity::Current, 5.0), Ok(12800));
        assert_eq!(
            nominals.to_register(Quantity::Voltage, 50.0),
            Err(ScalingError::OutOfRange {
                quantity: Quantity::Voltage,
                value: 50.0,
                nominal: 42.0
            })
        );
        assert_eq!(
            nominals.to_register(Quantity::Power, 1.0),
            Err(ScalingError::NoNominal(Quantity::Power))
        );
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(format!("{}", Quantity::Voltage), "voltage");
    }
}

//! Per-family layouts of the status and actual value objects.
//!
//! The device families speak the same telegram protocol but pack their status bits and
//! measurements differently. [`DeviceFamily`] captures those differences so a single
//! [`EaDevice`](crate::device::EaDevice) can drive all of them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use self::layout::{ControlByte, ElStatus, Ps2000Status, PsiStatus};
use crate::{
    error::ScalingError,
    objects::{ObjectId, RegisterWidth},
    scaling::{Nominals, Quantity},
    types::{ControllerState, DeviceState, OutputReading, ProtectionFlags, RegulationMode},
};

/// Length of the actual values answer on every family.
pub const ACTUAL_VALUES_LEN: usize = 6;

/// Raw status byte layouts. Only ever built through `from_bytes`.
#[allow(dead_code)]
mod layout {
    use modular_bitfield::prelude::*;

    /// Status byte 0, shared by all families.
    #[bitfield]
    pub(super) struct ControlByte {
        pub(super) remote: B2,
        #[skip]
        __: B3,
        pub(super) analogue_control: bool,
        pub(super) function_manager: bool,
        #[skip]
        __: B1,
    }

    /// PSI 8000 status byte 1.
    #[bitfield]
    pub(super) struct PsiStatus {
        pub(super) output_on: bool,
        pub(super) controller_state: B2,
        #[skip]
        __: B1,
        pub(super) alarm_active: bool,
        #[skip]
        __: B3,
    }

    /// EL 9000 status byte 1.
    #[bitfield]
    pub(super) struct ElStatus {
        pub(super) input_on: bool,
        pub(super) controller_state: B2,
        pub(super) regulation_mode: B3,
        #[skip]
        __: B2,
    }

    /// PS 2000 B status byte 1.
    #[bitfield]
    pub(super) struct Ps2000Status {
        pub(super) output_on: bool,
        pub(super) controller_state: B2,
        pub(super) tracking: bool,
        pub(super) ovp: bool,
        pub(super) ocp: bool,
        pub(super) opp: bool,
        pub(super) otp: bool,
    }
}

/// Where the measurements sit in an actual values answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActualValuesLayout {
    pub voltage_at: usize,
    pub current_at: usize,
    pub power_at: Option<usize>,
    pub width: RegisterWidth,
}

/// The protocol-compatible device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceFamily {
    /// PSI 8000 power supplies.
    Psi8000,
    /// EL 9000 electronic loads.
    El9000,
    /// PS 2000 B single and dual output power supplies.
    Ps2000,
}

impl DeviceFamily {
    /// Object holding the status bytes.
    pub const fn status_object(&self) -> ObjectId {
        match self {
            DeviceFamily::Psi8000 | DeviceFamily::El9000 => ObjectId::Status,
            DeviceFamily::Ps2000 => ObjectId::ActualValues,
        }
    }

    /// Payload length of the answer to a status query.
    pub const fn status_reply_length(&self) -> usize {
        match self {
            DeviceFamily::Psi8000 | DeviceFamily::El9000 => 2,
            DeviceFamily::Ps2000 => ACTUAL_VALUES_LEN,
        }
    }

    /// Whether setpoint writes carry the broadcast flag.
    pub const fn setpoint_broadcast(&self) -> bool {
        matches!(self, DeviceFamily::Ps2000)
    }

    pub const fn actual_values(&self) -> ActualValuesLayout {
        match self {
            DeviceFamily::Psi8000 | DeviceFamily::El9000 => ActualValuesLayout {
                voltage_at: 0,
                current_at: 2,
                power_at: Some(4),
                width: RegisterWidth::Full,
            },
            // Bytes 0 and 1 hold the status, the low bytes of the values are not meaningful.
            DeviceFamily::Ps2000 => ActualValuesLayout {
                voltage_at: 2,
                current_at: 4,
                power_at: None,
                width: RegisterWidth::HighByteOnly,
            },
        }
    }

    /// Decode the two status bytes of a status answer.
    pub fn decode_state(&self, bytes: [u8; 2]) -> DeviceState {
        let control = ControlByte::from_bytes([bytes[0]]);
        let mut state = DeviceState {
            remote: control.remote(),
            output_on: false,
            controller_state: ControllerState::Cv,
            regulation_mode: None,
            tracking: None,
            protection: ProtectionFlags::default(),
            alarm_active: false,
            analogue_control: false,
            function_manager: false,
        };

        match self {
            DeviceFamily::Psi8000 => {
                let status = PsiStatus::from_bytes([bytes[1]]);
                state.output_on = status.output_on();
                state.controller_state = ControllerState::from(status.controller_state());
                state.alarm_active = status.alarm_active();
                state.analogue_control = control.analogue_control();
                state.function_manager = control.function_manager();
            }
            DeviceFamily::El9000 => {
                let status = ElStatus::from_bytes([bytes[1]]);
                state.output_on = status.input_on();
                state.controller_state = ControllerState::from(status.controller_state());
                state.regulation_mode = Some(RegulationMode::from(status.regulation_mode()));
            }
            DeviceFamily::Ps2000 => {
                let status = Ps2000Status::from_bytes([bytes[1]]);
                state.output_on = status.output_on();
                state.controller_state = ControllerState::from(status.controller_state());
                state.tracking = Some(status.tracking());
                state.protection = ProtectionFlags {
                    ovp: status.ovp(),
                    ocp: status.ocp(),
                    opp: status.opp(),
                    otp: status.otp(),
                };
            }
        }
        state
    }

    /// Decode the measurements of an actual values answer.
    ///
    /// Power is only reported when both the layout and the nominal ratings have it.
    pub fn decode_output(
        &self,
        payload: &[u8; ACTUAL_VALUES_LEN],
        nominals: &Nominals,
    ) -> Result<OutputReading, ScalingError> {
        let layout = self.actual_values();
        let register = |at: usize| {
            let lo = match layout.width {
                RegisterWidth::HighByteOnly => None,
                _ => Some(payload[at + 1]),
            };
            (payload[at], lo)
        };

        let (hi, lo) = register(layout.voltage_at);
        let voltage = nominals.from_register(Quantity::Voltage, hi, lo)?;
        let (hi, lo) = register(layout.current_at);
        let current = nominals.from_register(Quantity::Current, hi, lo)?;
        let power = layout.power_at.and_then(|at| {
            let (hi, lo) = register(at);
            nominals.from_register(Quantity::Power, hi, lo).ok()
        });

        Ok(OutputReading {
            voltage,
            current,
            power,
        })
    }
}

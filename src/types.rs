//! This module contains the values decoded from, or tracked for, EA devices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// The regulation a device's controller is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ControllerState {
    /// Constant voltage.
    #[strum(serialize = "CV")]
    Cv = 0,
    /// Constant resistance.
    #[strum(serialize = "CR")]
    Cr = 1,
    /// Constant current.
    #[strum(serialize = "CC")]
    Cc = 2,
    /// Constant power.
    #[strum(serialize = "CP")]
    Cp = 3,
}

impl From<u8> for ControllerState {
    /// Only the two least significant bits are used.
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0 => ControllerState::Cv,
            1 => ControllerState::Cr,
            2 => ControllerState::Cc,
            _ => ControllerState::Cp,
        }
    }
}

/// Regulation mode chosen on an EL 9000 load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegulationMode {
    Cr1,
    Cr2,
    Cp,
    Cc,
    /// Codes the firmware documentation does not name.
    Unknown(u8),
}

impl core::fmt::Display for RegulationMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegulationMode::Cr1 => f.write_str("CR1"),
            RegulationMode::Cr2 => f.write_str("CR2"),
            RegulationMode::Cp => f.write_str("CP"),
            RegulationMode::Cc => f.write_str("CC"),
            RegulationMode::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

impl From<u8> for RegulationMode {
    fn from(value: u8) -> Self {
        match value {
            0 => RegulationMode::Cr1,
            1 => RegulationMode::Cr2,
            // The firmware reports constant power as either 2 or 4.
            2 | 4 => RegulationMode::Cp,
            3 => RegulationMode::Cc,
            other => RegulationMode::Unknown(other),
        }
    }
}

/// Protections which have tripped. Read only, the device sets these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtectionFlags {
    /// Over-voltage protection.
    pub ovp: bool,
    /// Over-current protection.
    pub ocp: bool,
    /// Over-power protection.
    pub opp: bool,
    /// Over-temperature protection.
    pub otp: bool,
}

impl ProtectionFlags {
    pub fn any(&self) -> bool {
        self.ovp || self.ocp || self.opp || self.otp
    }
}

/// Snapshot of a device's status object.
///
/// Fields a family does not report are left at their defaults, or `None` where
/// the absence matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceState {
    /// Raw remote control bits, non-zero while under remote control.
    pub remote: u8,
    /// Output on for supplies, input on for loads.
    pub output_on: bool,
    pub controller_state: ControllerState,
    /// EL 9000 only.
    pub regulation_mode: Option<RegulationMode>,
    /// PS 2000 B only.
    pub tracking: Option<bool>,
    pub protection: ProtectionFlags,
    pub alarm_active: bool,
    /// Controlled by the analogue interface (PSI 8000).
    pub analogue_control: bool,
    /// Function manager running (PSI 8000).
    pub function_manager: bool,
}

impl DeviceState {
    pub fn is_remote(&self) -> bool {
        self.remote != 0
    }
}

/// Last measured output (or input, on loads) values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputReading {
    /// Volts.
    pub voltage: f32,
    /// Amps.
    pub current: f32,
    /// Watts, if the device reports it.
    pub power: Option<f32>,
}

/// What we know about a connected channel's control state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelMode {
    /// Front panel control. Setpoint writes are ignored by the firmware.
    #[default]
    Local,
    /// Remote control, output off.
    Remote,
    /// Remote control with the output switched on.
    RemoteOutputOn,
}

impl ChannelMode {
    pub fn is_remote(&self) -> bool {
        !matches!(self, ChannelMode::Local)
    }

    pub(crate) fn with_remote(self, remote: bool) -> Self {
        match (remote, self) {
            (false, _) => ChannelMode::Local,
            (true, ChannelMode::Local) => ChannelMode::Remote,
            (true, mode) => mode,
        }
    }

    pub(crate) fn with_output(self, on: bool) -> Self {
        match (self, on) {
            (ChannelMode::Local, _) => ChannelMode::Local,
            (_, true) => ChannelMode::RemoteOutputOn,
            (_, false) => ChannelMode::Remote,
        }
    }
}

impl From<&DeviceState> for ChannelMode {
    fn from(state: &DeviceState) -> Self {
        ChannelMode::Local
            .with_remote(state.is_remote())
            .with_output(state.output_on)
    }
}

/// Used to be less ambiguous about whether something is on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
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

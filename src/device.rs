use embedded_io::{Read, ReadReady, Write};
use log::{debug, warn};

use crate::{
    error::{Error, Result},
    link::{Delay, Link, RetryPolicy},
    objects::{ControlMask, ObjectId},
    profile::{DeviceProfile, MAX_CHANNELS},
    scaling::{Quantity, register_bytes},
    status::ACTUAL_VALUES_LEN,
    telegram::Telegram,
    types::{ChannelMode, DeviceState, OutputReading, State},
};

/// Queries and control writes always carry the broadcast flag.
const QUERY_BROADCAST: bool = true;
const CONTROL_BROADCAST: bool = true;
/// Protection thresholds never do.
const THRESHOLD_BROADCAST: bool = false;

/// You can create an EaDevice using any interface which implements [embedded_io::Read],
/// [embedded_io::Write] & [embedded_io::ReadReady].
///
/// Channels are numbered from 1. Methods starting with "set" write to the device without
/// waiting for an answer, methods starting with "query" ask the device and remember what
/// it said. A failed query leaves the last remembered values untouched.
///
/// Setpoints are accepted by the firmware only while the channel is under remote control.
/// This is not checked here, out of state writes are silently dropped by the device.
pub struct EaDevice<S, D> {
    link: Link<S, D>,
    profile: DeviceProfile,
    modes: [ChannelMode; MAX_CHANNELS],
    states: [Option<DeviceState>; MAX_CHANNELS],
    outputs: [Option<OutputReading>; MAX_CHANNELS],
}

impl<S, D> EaDevice<S, D>
where
    S: Read + Write + ReadReady,
    D: Delay,
{
    /// Create a new EaDevice on an already opened interface.
    ///
    /// See [`DeviceProfile::serial`] for how the interface should be configured.
    pub fn new(interface: S, delay: D, profile: DeviceProfile) -> Self {
        Self {
            link: Link::new(interface, delay),
            profile,
            modes: [ChannelMode::Local; MAX_CHANNELS],
            states: [None; MAX_CHANNELS],
            outputs: [None; MAX_CHANNELS],
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.link = self.link.with_policy(policy);
        self
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Hand the interface back so it can be closed.
    pub fn release(self) -> S {
        self.link.release()
    }

    /// Device node addressing `channel`.
    pub fn device_node(&self, channel: u8) -> Result<u8, S::Error> {
        self.profile
            .device_node(channel)
            .ok_or(Error::InvalidChannel(channel))
    }

    /// Enable/disable remote control of a channel.
    pub fn set_remote(
        &mut self,
        remote: impl Into<State>,
        channel: u8,
    ) -> Result<(), S::Error> {
        let remote: bool = remote.into().into();
        let node = self.device_node(channel)?;
        debug!("{}: remote {} on channel {channel}", self.profile.name, remote);

        self.write_control(node, ControlMask::remote(remote))?;
        let slot = Self::slot(channel);
        self.modes[slot] = self.modes[slot].with_remote(remote);
        Ok(())
    }

    /// Switch the output of a channel on or off.
    pub fn output_on(&mut self, on: impl Into<State>, channel: u8) -> Result<(), S::Error> {
        let on: bool = on.into().into();
        let node = self.device_node(channel)?;
        let slot = Self::slot(channel);
        if on && !self.modes[slot].is_remote() {
            warn!(
                "{}: channel {channel} is not under remote control, output on may be ignored",
                self.profile.name
            );
        }
        debug!("{}: output {} on channel {channel}", self.profile.name, on);

        self.write_control(node, ControlMask::output(on))?;
        self.modes[slot] = self.modes[slot].with_output(on);
        Ok(())
    }

    /// Switch the input of an electronic load on or off.
    pub fn input_on(&mut self, on: impl Into<State>, channel: u8) -> Result<(), S::Error> {
        self.output_on(on, channel)
    }

    /// Enable/disable tracking of both outputs on a dual channel PS 2000 B.
    ///
    /// Fails with [`Error::InvalidChannel`] on single channel models.
    pub fn set_tracking(&mut self, tracking: impl Into<State>) -> Result<(), S::Error> {
        let tracking: bool = tracking.into().into();
        let node = self.device_node(2)?;
        debug!("{}: tracking {}", self.profile.name, tracking);
        self.write_control(node, ControlMask::tracking(tracking))
    }

    /// Set the voltage of a channel in volts. Returns the register value sent.
    pub fn set_voltage(&mut self, volts: f32, channel: u8) -> Result<u16, S::Error> {
        let broadcast = self.profile.family.setpoint_broadcast();
        self.write_setpoint(
            ObjectId::VoltageSetpoint,
            Quantity::Voltage,
            volts,
            channel,
            broadcast,
        )
    }

    /// Set the current of a channel in amps. Returns the register value sent.
    pub fn set_current(&mut self, amps: f32, channel: u8) -> Result<u16, S::Error> {
        let broadcast = self.profile.family.setpoint_broadcast();
        self.write_setpoint(
            ObjectId::CurrentSetpoint,
            Quantity::Current,
            amps,
            channel,
            broadcast,
        )
    }

    /// Set the power of a channel in watts. Returns the register value sent.
    pub fn set_power(&mut self, watts: f32, channel: u8) -> Result<u16, S::Error> {
        let broadcast = self.profile.family.setpoint_broadcast();
        self.write_setpoint(
            ObjectId::PowerSetpoint,
            Quantity::Power,
            watts,
            channel,
            broadcast,
        )
    }

    /// Set the over-voltage protection threshold of a channel in volts.
    pub fn set_ovp_threshold(&mut self, volts: f32, channel: u8) -> Result<u16, S::Error> {
        self.write_setpoint(
            ObjectId::OvpThreshold,
            Quantity::Voltage,
            volts,
            channel,
            THRESHOLD_BROADCAST,
        )
    }

    /// Set the over-current protection threshold of a channel in amps.
    pub fn set_ocp_threshold(&mut self, amps: f32, channel: u8) -> Result<u16, S::Error> {
        self.write_setpoint(
            ObjectId::OcpThreshold,
            Quantity::Current,
            amps,
            channel,
            THRESHOLD_BROADCAST,
        )
    }

    /// Measure the output of a channel.
    pub fn query_output(&mut self, channel: u8) -> Result<OutputReading, S::Error> {
        let node = self.device_node(channel)?;
        let request = Telegram::query(
            node,
            ObjectId::ActualValues,
            ACTUAL_VALUES_LEN,
            QUERY_BROADCAST,
        )?;
        let reply = self.link.query(&request)?;

        let payload: &[u8; ACTUAL_VALUES_LEN] = reply
            .payload()
            .try_into()
            .map_err(|_| Error::InvalidResponse)?;
        let reading = self
            .profile
            .family
            .decode_output(payload, &self.profile.nominals)?;
        debug!("{}: channel {channel} reads {reading:?}", self.profile.name);

        self.outputs[Self::slot(channel)] = Some(reading);
        Ok(reading)
    }

    /// Measure the input of an electronic load.
    pub fn query_input(&mut self, channel: u8) -> Result<OutputReading, S::Error> {
        self.query_output(channel)
    }

    /// Read the status of a channel.
    pub fn query_state(&mut self, channel: u8) -> Result<DeviceState, S::Error> {
        let node = self.device_node(channel)?;
        let family = self.profile.family;
        let request = Telegram::query(
            node,
            family.status_object(),
            family.status_reply_length(),
            QUERY_BROADCAST,
        )?;
        let reply = self.link.query(&request)?;

        let status: [u8; 2] = reply
            .payload()
            .get(..2)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(Error::InvalidResponse)?;
        let state = family.decode_state(status);
        debug!("{}: channel {channel} state {state:?}", self.profile.name);

        let slot = Self::slot(channel);
        self.states[slot] = Some(state);
        self.modes[slot] = ChannelMode::from(&state);
        Ok(state)
    }

    /// Last successfully queried output of a channel.
    pub fn output(&self, channel: u8) -> Option<&OutputReading> {
        self.profile.device_node(channel)?;
        self.outputs[Self::slot(channel)].as_ref()
    }

    /// Last successfully queried state of a channel.
    pub fn state(&self, channel: u8) -> Option<&DeviceState> {
        self.profile.device_node(channel)?;
        self.states[Self::slot(channel)].as_ref()
    }

    /// What we believe the channel's control state is.
    pub fn mode(&self, channel: u8) -> Option<ChannelMode> {
        self.profile.device_node(channel)?;
        Some(self.modes[Self::slot(channel)])
    }

    /// Index into the per channel arrays. Only call with a validated channel.
    fn slot(channel: u8) -> usize {
        channel as usize - 1
    }

    fn write_control(&mut self, node: u8, control: ControlMask) -> Result<(), S::Error> {
        let telegram = Telegram::send(
            node,
            ObjectId::Control,
            &control.to_bytes(),
            CONTROL_BROADCAST,
        )?;
        self.link.send(&telegram)
    }

    /// Scale and write a setpoint. Nothing is sent if the channel or value is invalid.
    fn write_setpoint(
        &mut self,
        object: ObjectId,
        quantity: Quantity,
        value: f32,
        channel: u8,
        broadcast: bool,
    ) -> Result<u16, S::Error> {
        let node = self.device_node(channel)?;
        let register = self.profile.nominals.to_register(quantity, value)?;
        debug!(
            "{}: {object:?} {value} on channel {channel} => {register}",
            self.profile.name
        );

        let telegram = Telegram::send(node, object, &register_bytes(register), broadcast)?;
        self.link.send(&telegram)?;
        Ok(register)
    }
}

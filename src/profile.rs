//! Device profiles for the supported models.
//!
//! A profile bundles everything the driver needs to know about a model: its family,
//! nominal ratings, channel to device node mapping and serial settings. Profiles for the
//! models we have used are provided as constants, others can be described with
//! [`DeviceProfile::new`].

use fugit::MillisDurationU32;

use crate::{scaling::Nominals, status::DeviceFamily};

/// Most channels a single link addresses.
pub const MAX_CHANNELS: usize = 2;

/// Serial parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// How the serial port used for a device should be configured.
///
/// The driver does not open ports itself, these are for whoever does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Per read timeout.
    pub timeout: MillisDurationU32,
}

impl SerialSettings {
    /// 8 data bits, odd parity, 1 stop bit and a 2s timeout.
    pub const fn odd_parity(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: 8,
            parity: Parity::Odd,
            stop_bits: 1,
            timeout: MillisDurationU32::millis(2000),
        }
    }
}

/// Static description of a device model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub family: DeviceFamily,
    pub nominals: Nominals,
    /// Number of channels, 1 or 2.
    pub channels: u8,
    /// Device node of each channel, channel 1 first.
    pub channel_nodes: [u8; MAX_CHANNELS],
    pub serial: SerialSettings,
}

impl DeviceProfile {
    /// PSI 8720-15: 720V, 15A, 3000W.
    ///
    /// Everything is addressed to device node 1. Some host software sends status
    /// queries to node 0 instead, if status queries go unanswered try
    /// `.with_channels(1, [0, 0])`.
    pub const PSI_8720_15: Self = Self::new(
        "PSI 8720-15",
        DeviceFamily::Psi8000,
        Nominals::new(720.0, 15.0, 3000.0),
    )
    .with_serial(SerialSettings::odd_parity(57600));

    /// EL 9750-25: 750V, 25A, 2400W.
    ///
    /// Addressed like [`DeviceProfile::PSI_8720_15`], see there for the status query node.
    pub const EL_9750_25: Self = Self::new(
        "EL 9750-25",
        DeviceFamily::El9000,
        Nominals::new(750.0, 25.0, 2400.0),
    )
    .with_serial(SerialSettings::odd_parity(57600));

    /// PS 2042-10B: two outputs of 42V, 10A, 160W on device nodes 0 and 1.
    pub const PS_2042_10B: Self = Self::new(
        "PS 2042-10B",
        DeviceFamily::Ps2000,
        Nominals::new(42.0, 10.0, 160.0),
    )
    .with_channels(2, [0, 1])
    .with_serial(SerialSettings::odd_parity(115200));

    /// A single channel profile on device node 1 at 57600 baud.
    pub const fn new(name: &'static str, family: DeviceFamily, nominals: Nominals) -> Self {
        Self {
            name,
            family,
            nominals,
            channels: 1,
            channel_nodes: [1, 0],
            serial: SerialSettings::odd_parity(57600),
        }
    }

    /// Set the channel count and their device nodes. Nodes past `channels` are ignored.
    pub const fn with_channels(mut self, channels: u8, nodes: [u8; MAX_CHANNELS]) -> Self {
        self.channels = channels;
        self.channel_nodes = nodes;
        self
    }

    pub const fn with_serial(mut self, serial: SerialSettings) -> Self {
        self.serial = serial;
        self
    }

    /// Device node for a 1-based channel number, `None` if the model has no such channel.
    pub fn device_node(&self, channel: u8) -> Option<u8> {
        if channel == 0 || channel > self.channels.min(MAX_CHANNELS as u8) {
            return None;
        }
        self.channel_nodes.get(channel as usize - 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_channel_mapping() {
        let profile = DeviceProfile::PS_2042_10B;
        assert_eq!(profile.device_node(1), Some(0));
        assert_eq!(profile.device_node(2), Some(1));
        assert_eq!(profile.device_node(3), None);
        assert_eq!(profile.device_node(0), None);
    }

    #[test]
    fn single_channel_mapping() {
        let profile = DeviceProfile::PSI_8720_15;
        assert_eq!(profile.device_node(1), Some(1));
        assert_eq!(profile.device_node(2), None);
    }

    #[test]
    fn channel_count_is_capped() {
        let profile = DeviceProfile::PSI_8720_15.with_channels(5, [3, 4]);
        assert_eq!(profile.device_node(2), Some(4));
        assert_eq!(profile.device_node(3), None);
    }

    #[test]
    fn single_channel_node_override() {
        let profile = DeviceProfile::EL_9750_25.with_channels(1, [0, 0]);
        assert_eq!(profile.device_node(1), Some(0));
        assert_eq!(profile.device_node(2), None);
    }

    #[test]
    fn serial_settings() {
        assert_eq!(DeviceProfile::PS_2042_10B.serial.baud_rate, 115200);
        assert_eq!(DeviceProfile::EL_9750_25.serial.baud_rate, 57600);
        assert_eq!(DeviceProfile::EL_9750_25.serial.parity, Parity::Odd);
        assert_eq!(DeviceProfile::EL_9750_25.serial.timeout.to_millis(), 2000);
    }
}

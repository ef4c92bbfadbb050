//! This crate provides an interface for communicating with and controlling Elektro-Automatik
//! power supplies and electronic loads which speak the EA binary telegram protocol.
//!
//! It supports `no_std` environments by use of the `no_std` feature flag. The optional
//! `serde` feature derives serialisation for the status and measurement types.
//!
//! Device families and the models profiles are provided for:
//!
//! | Family    | Profile                             | Nominals            | Channels | Baud   |
//! |-----------|-------------------------------------|---------------------|----------|--------|
//! | PSI 8000  | [`DeviceProfile::PSI_8720_15`]      | 720V, 15A, 3000W    | 1        | 57600  |
//! | EL 9000   | [`DeviceProfile::EL_9750_25`]       | 750V, 25A, 2400W    | 1        | 57600  |
//! | PS 2000 B | [`DeviceProfile::PS_2042_10B`]      | 42V, 10A, 160W      | 2        | 115200 |
//!
//! Other models of the same families work with a profile built by [`DeviceProfile::new`].
//!
//! It is suitable for interfacing with the devices over their USB or RS232 interface cards,
//! which appear as a plain serial port. The serial port should be configured like so:
//! * Baud rate: see [`SerialSettings::baud_rate`] of the profile
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: Odd
//!
//! [`DeviceProfile::PSI_8720_15`]: profile::DeviceProfile::PSI_8720_15
//! [`DeviceProfile::EL_9750_25`]: profile::DeviceProfile::EL_9750_25
//! [`DeviceProfile::PS_2042_10B`]: profile::DeviceProfile::PS_2042_10B
//! [`DeviceProfile::new`]: profile::DeviceProfile::new
//! [`SerialSettings::baud_rate`]: profile::SerialSettings::baud_rate

#![cfg_attr(feature = "no_std", no_std)]

pub mod checksum;
pub mod device;
pub mod error;
pub mod link;
pub mod objects;
pub mod profile;
pub mod scaling;
pub mod status;
pub mod telegram;
pub mod types;

#[cfg(test)]
mod mock_serial;

pub use device::EaDevice;
pub use profile::DeviceProfile;

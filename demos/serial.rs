use std::env;

use ea_psu::{
    DeviceProfile, EaDevice,
    link::StdDelay,
    profile::{Parity, SerialSettings},
    types::State,
};
use inquire::Select;
use log::info;
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const PROFILE: DeviceProfile = DeviceProfile::PS_2042_10B;
const CHANNEL: u8 = 1;
const OUTPUT_VOLTAGE: f32 = 5.0;
const CURRENT_LIMIT: f32 = 0.1;
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::ReadReady for PortWrapper {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.0
            .bytes_to_read()
            .map(|pending| pending > 0)
            .map_err(|e| IoError(e.into()))
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn open(port_name: &str, settings: &SerialSettings) -> Box<dyn SerialPort> {
    let parity = match settings.parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    };
    let stop_bits = match settings.stop_bits {
        2 => serialport::StopBits::Two,
        _ => serialport::StopBits::One,
    };

    serialport::new(port_name, settings.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(parity)
        .stop_bits(stop_bits)
        .timeout(std::time::Duration::from_millis(
            settings.timeout.to_millis() as u64,
        ))
        .open()
        .expect("Failed to open serial port")
}

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {} for a {}", port_name, PROFILE.name);

    let port = PortWrapper(open(&port_name, &PROFILE.serial));
    let mut psu = EaDevice::new(port, StdDelay, PROFILE);

    // Setpoints are ignored unless the device is under remote control
    psu.set_remote(State::On, CHANNEL).unwrap();
    info!("Remote control enabled");

    let state = psu.query_state(CHANNEL).unwrap();
    println!("Device state: {:#?}", state);

    let register = psu.set_voltage(OUTPUT_VOLTAGE, CHANNEL).unwrap();
    println!("Set output voltage to {}V (register {})", OUTPUT_VOLTAGE, register);

    let register = psu.set_current(CURRENT_LIMIT, CHANNEL).unwrap();
    println!("Set current limit to {}A (register {})", CURRENT_LIMIT, register);

    psu.output_on(State::On, CHANNEL).unwrap();
    println!("Output enabled");

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    let reading = psu.query_output(CHANNEL).unwrap();
    println!(
        "Measured output: {:.3}V {:.3}A",
        reading.voltage, reading.current
    );
    if let Some(power) = reading.power {
        println!("Measured power: {:.1}W", power);
    }

    let state = psu.query_state(CHANNEL).unwrap();
    println!("Controller state: {}", state.controller_state);
    if state.protection.any() {
        println!("Protection tripped: {:#?}", state.protection);
    }

    psu.output_on(State::Off, CHANNEL).unwrap();
    psu.set_remote(State::Off, CHANNEL).unwrap();
    println!("Output disabled, back to local control");

    drop(psu.release());
}

//! Encoding and decoding of telegrams, the frames exchanged with EA devices.
//!
//! A telegram on the wire looks like:
//!
//! | Byte    | Content                                   |
//! |---------|-------------------------------------------|
//! | 0       | Start delimiter, see [`StartDelimiter`]   |
//! | 1       | Device node (channel/unit on the link)    |
//! | 2       | Object ID, see [`ObjectId`](crate::objects::ObjectId) |
//! | 3..n-2  | Payload, 0-16 bytes                       |
//! | n-2..n  | Checksum, high byte first                 |
//!
//! Nothing in here performs I/O.

use modular_bitfield::prelude::*;

use crate::{
    checksum::{self, CHECKSUM_LEN},
    error::FrameError,
};

/// Largest payload the 4 bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 16;
/// Start delimiter, device node and object ID.
pub const HEADER_LEN: usize = 3;
pub const MAX_TELEGRAM_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CHECKSUM_LEN;

pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_LEN>;
/// An encoded telegram.
pub type Frame = heapless::Vec<u8, MAX_TELEGRAM_LEN>;

/// Length on the wire of a telegram carrying `data_length` payload bytes.
pub const fn frame_len(data_length: usize) -> usize {
    HEADER_LEN + data_length + CHECKSUM_LEN
}

/// The "transmission type" held in the top two bits of the start delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransmissionType {
    Reserved = 0b00,
    /// Request for an object's contents.
    Query = 0b01,
    /// A device's reply to a query.
    QueryAnswer = 0b10,
    /// Write to an object. Devices do not answer these.
    SendData = 0b11,
}

impl From<u8> for TransmissionType {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b01 => TransmissionType::Query,
            0b10 => TransmissionType::QueryAnswer,
            0b11 => TransmissionType::SendData,
            _ => TransmissionType::Reserved,
        }
    }
}

/// Which way a telegram travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    DeviceToHost,
    HostToDevice,
}

/// First byte of every telegram.
///
/// Bits 0-3 hold `data_length - 1`, bit 4 the direction, bit 5 the broadcast flag
/// and bits 6-7 the [`TransmissionType`].
#[bitfield]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StartDelimiter {
    length_code: B4,
    direction_bit: bool,
    broadcast_bit: bool,
    type_code: B2,
}

impl StartDelimiter {
    /// Build a start delimiter. `data_length` must be within 1-16.
    pub fn build(
        data_length: usize,
        direction: Direction,
        broadcast: bool,
        transmission_type: TransmissionType,
    ) -> Result<Self, FrameError> {
        if !(1..=MAX_PAYLOAD_LEN).contains(&data_length) {
            return Err(FrameError::InvalidDataLength(data_length));
        }
        Ok(Self::new()
            .with_length_code((data_length - 1) as u8)
            .with_direction_bit(direction == Direction::HostToDevice)
            .with_broadcast_bit(broadcast)
            .with_type_code(transmission_type as u8))
    }

    /// Parse a received start delimiter byte. Every byte value is valid.
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bytes([byte])
    }

    pub fn to_byte(self) -> u8 {
        self.into_bytes()[0]
    }

    /// Number of payload bytes announced by this delimiter (1-16).
    ///
    /// For a query this is the length of the expected answer.
    pub fn data_length(&self) -> usize {
        self.length_code() as usize + 1
    }

    pub fn direction(&self) -> Direction {
        if self.direction_bit() {
            Direction::HostToDevice
        } else {
            Direction::DeviceToHost
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.broadcast_bit()
    }

    pub fn transmission_type(&self) -> TransmissionType {
        TransmissionType::from(self.type_code())
    }
}

impl core::fmt::Debug for StartDelimiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StartDelimiter")
            .field("data_length", &self.data_length())
            .field("direction", &self.direction())
            .field("broadcast", &self.is_broadcast())
            .field("transmission_type", &self.transmission_type())
            .finish()
    }
}

/// Encode a telegram from its raw parts.
///
/// A query carries no payload, its delimiter announces the answer length instead.
/// Every other transmission type must carry exactly the announced number of bytes.
pub fn encode(
    delimiter: StartDelimiter,
    device_node: u8,
    object_id: u8,
    payload: &[u8],
) -> Result<Frame, FrameError> {
    let declared = delimiter.data_length();
    let query = delimiter.transmission_type() == TransmissionType::Query;
    if (query && !payload.is_empty()) || (!query && payload.len() != declared) {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    let overflow = |_| FrameError::InvalidDataLength(payload.len());
    let mut frame = Frame::new();
    frame
        .extend_from_slice(&[delimiter.to_byte(), device_node, object_id])
        .map_err(overflow)?;
    frame.extend_from_slice(payload).map_err(overflow)?;
    let sum = checksum::checksum(&frame);
    frame
        .extend_from_slice(&checksum::split(sum))
        .map_err(overflow)?;
    Ok(frame)
}

/// One telegram, either built for sending or decoded from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    delimiter: StartDelimiter,
    device_node: u8,
    object_id: u8,
    payload: Payload,
}

impl Telegram {
    /// A "send data" telegram writing `payload` to an object.
    pub fn send(
        device_node: u8,
        object_id: impl Into<u8>,
        payload: &[u8],
        broadcast: bool,
    ) -> Result<Self, FrameError> {
        let delimiter = StartDelimiter::build(
            payload.len(),
            Direction::HostToDevice,
            broadcast,
            TransmissionType::SendData,
        )?;
        let payload = Payload::from_slice(payload)
            .map_err(|_| FrameError::InvalidDataLength(payload.len()))?;
        Ok(Self {
            delimiter,
            device_node,
            object_id: object_id.into(),
            payload,
        })
    }

    /// A query for an object whose answer carries `reply_length` bytes.
    pub fn query(
        device_node: u8,
        object_id: impl Into<u8>,
        reply_length: usize,
        broadcast: bool,
    ) -> Result<Self, FrameError> {
        let delimiter = StartDelimiter::build(
            reply_length,
            Direction::HostToDevice,
            broadcast,
            TransmissionType::Query,
        )?;
        Ok(Self {
            delimiter,
            device_node,
            object_id: object_id.into(),
            payload: Payload::new(),
        })
    }

    pub fn encode(&self) -> Result<Frame, FrameError> {
        encode(
            self.delimiter,
            self.device_node,
            self.object_id,
            &self.payload,
        )
    }

    /// Decode and validate a received telegram.
    ///
    /// The checksum is checked before anything else is trusted.
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() < frame_len(0) {
            return Err(FrameError::TooShort(raw.len()));
        }
        checksum::verify(raw)?;

        let delimiter = StartDelimiter::from_byte(raw[0]);
        let data = &raw[HEADER_LEN..raw.len() - CHECKSUM_LEN];
        let declared = delimiter.data_length();
        if data.len() != declared {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }
        let payload = Payload::from_slice(data).map_err(|_| FrameError::LengthMismatch {
            declared,
            actual: data.len(),
        })?;

        Ok(Self {
            delimiter,
            device_node: raw[1],
            object_id: raw[2],
            payload,
        })
    }

    pub fn delimiter(&self) -> StartDelimiter {
        self.delimiter
    }

    pub fn device_node(&self) -> u8 {
        self.device_node
    }

    pub fn object_id(&self) -> u8 {
        self.object_id
    }

    pub fn transmission_type(&self) -> TransmissionType {
        self.delimiter.transmission_type()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the answer this telegram expects, if it is a query.
    pub fn expected_reply_length(&self) -> Option<usize> {
        (self.transmission_type() == TransmissionType::Query)
            .then(|| self.delimiter.data_length())
    }
}

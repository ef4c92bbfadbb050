//! We use this mocking module in unit tests to emulate a serial port and a delay source.

use fugit::MillisDurationU32;
use thiserror::Error;

use crate::{
    link::Delay,
    telegram::{self, Direction, Frame, StartDelimiter, TransmissionType},
};

/// Largest reply we script.
const MAX_REPLY: usize = 32;

/// Our mock type used to emulate a serial port with a device on the other end.
///
/// Replies queued with [`MockSerial::queue_reply`] become readable one per write, the way
/// a device only answers once it has received a request.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing data ready to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Replies released one per write
    replies: heapless::Deque<heapless::Vec<u8, MAX_REPLY>, 8>,
    /// Number of write calls
    writes: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Error, Debug)]
pub enum MockSerialError {
    /// Simulated timeout, no data arrived in time
    #[error("Simulated timeout")]
    Timeout,
    /// Simulated buffer overflow
    #[error("Simulated buffer overflow")]
    BufferOverflow,
    /// Generic simulated error for testing
    #[error("Simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        self.writes += 1;

        // The device answers the request.
        if let Some(reply) = self.replies.pop_front() {
            self.read_buffer
                .extend_from_slice(&reply)
                .map_err(|_| MockSerialError::BufferOverflow)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::Timeout);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(self.read_position < self.read_buffer.len())
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            replies: heapless::Deque::new(),
            writes: 0,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Make data readable straight away, without waiting for a write.
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Queue a reply which becomes readable after the next unanswered write.
    pub fn queue_reply(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        let reply =
            heapless::Vec::from_slice(data).map_err(|_| MockSerialError::BufferOverflow)?;
        self.replies
            .push_back(reply)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Number of writes seen so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Bytes still waiting to be read.
    pub fn unread(&self) -> usize {
        self.read_buffer.len() - self.read_position
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

/// Delay source which only records what it was asked to wait.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: usize,
    pub total_ms: u32,
}

impl Delay for MockDelay {
    fn delay(&mut self, duration: MillisDurationU32) {
        self.calls += 1;
        self.total_ms += duration.to_millis();
    }
}

/// A valid answer from the device at `node`.
pub fn answer(node: u8, object: u8, payload: &[u8]) -> Frame {
    let sd = StartDelimiter::build(
        payload.len(),
        Direction::DeviceToHost,
        false,
        TransmissionType::QueryAnswer,
    )
    .unwrap();
    telegram::encode(sd, node, object, payload).unwrap()
}

/// The same answer with its last checksum byte broken.
pub fn corrupted(node: u8, object: u8, payload: &[u8]) -> Frame {
    let mut frame = answer(node, object, payload);
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, ReadReady, Write};

    #[test]
    fn test_write_data() {
        let mut mock = MockSerial::new();
        let test_data = b"Hello, World!";

        let result = mock.write(test_data);
        assert_eq!(result.unwrap(), test_data.len());
        assert_eq!(mock.written_data(), test_data);
        assert_eq!(mock.write_count(), 1);
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = [0u8; 300]; // Larger than 256 byte capacity

        let result = mock.write(&large_data);
        assert!(matches!(result.unwrap_err(), MockSerialError::BufferOverflow));
    }

    #[test]
    fn test_reply_released_by_write() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"first").unwrap();
        mock.queue_reply(b"second").unwrap();

        // Nothing to read before the request.
        assert!(!mock.read_ready().unwrap());
        let mut buffer = [0u8; 10];
        assert!(matches!(
            mock.read(&mut buffer).unwrap_err(),
            MockSerialError::Timeout
        ));

        mock.write(b"req").unwrap();
        assert!(mock.read_ready().unwrap());
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer[..5], b"first");
        assert!(!mock.read_ready().unwrap());

        mock.write(b"req").unwrap();
        assert_eq!(mock.read(&mut buffer).unwrap(), 6);
        assert_eq!(&buffer[..6], b"second");
    }

    #[test]
    fn test_read_partial_data() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"Long response data").unwrap();

        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"Long ");
        assert_eq!(mock.unread(), 13);
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert_eq!(mock.written_data().len(), 0); // Nothing should be written

        mock.set_read_data(b"data").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert!(mock.read(&mut buffer).is_err());
        assert!(mock.read_ready().is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::Timeout.kind(),
            embedded_io::ErrorKind::TimedOut
        ));
        assert!(matches!(
            MockSerialError::BufferOverflow.kind(),
            embedded_io::ErrorKind::OutOfMemory
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_error_display() {
        // Interface errors end up in our own error messages.
        assert_eq!(format!("{}", MockSerialError::Timeout), "Simulated timeout");
        let err: crate::error::Error<MockSerialError> =
            crate::error::Error::SerialError(MockSerialError::SimulatedError);
        assert_eq!(format!("{err}"), "Serial communication error");
    }

    #[test]
    fn test_mock_delay() {
        let mut delay = MockDelay::default();
        delay.delay(MillisDurationU32::millis(10));
        delay.delay(MillisDurationU32::millis(5));
        assert_eq!(delay.calls, 2);
        assert_eq!(delay.total_ms, 15);
    }
}

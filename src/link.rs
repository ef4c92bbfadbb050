//! Request/response handling over the serial link.
//!
//! Every exchange writes one telegram, reads the answer if one is expected, waits a short
//! settle time and then discards any bytes the device sent that nobody asked for.
//! Queries whose answer arrives corrupted, truncated or not at all are repeated with the
//! identical request telegram, up to [`RetryPolicy::max_retries`] times.
//!
//! Only one exchange is ever in flight. Callers sharing a [`Link`] between threads must
//! serialise access themselves.

use embedded_io::{ErrorKind, Read, ReadReady, Write};
use fugit::MillisDurationU32;
use log::{error, trace, warn};

use crate::{
    error::{Error, Result},
    telegram::{Frame, MAX_TELEGRAM_LEN, Telegram, frame_len},
};

/// Most stray bytes discarded after one exchange.
pub const MAX_DRAIN: usize = 64;

/// Something that can block for a while.
pub trait Delay {
    fn delay(&mut self, duration: MillisDurationU32);
}

/// Sleeps the current thread.
#[cfg(not(feature = "no_std"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(not(feature = "no_std"))]
impl Delay for StdDelay {
    fn delay(&mut self, duration: MillisDurationU32) {
        std::thread::sleep(std::time::Duration::from_millis(duration.to_millis() as u64));
    }
}

/// Never waits. Suitable when the interface's own read timeout already paces the link.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay(&mut self, _duration: MillisDurationU32) {}
}

/// How hard to try before declaring the link broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one failed.
    pub max_retries: u8,
    /// Wait after every exchange before draining stray bytes.
    pub settle: MillisDurationU32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u8 = 2;
    pub const DEFAULT_SETTLE: MillisDurationU32 = MillisDurationU32::millis(10);
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            settle: Self::DEFAULT_SETTLE,
        }
    }
}

/// Run a query with bounded retries.
///
/// `exchange` sends `request` and returns the raw answer. It is called with the same
/// request bytes up to `max_retries + 1` times, as long as the answers fail to decode or
/// time out. Any other failure is returned straight away.
pub fn execute_query<I, F>(request: &[u8], max_retries: u8, mut exchange: F) -> Result<Telegram, I>
where
    I: embedded_io::Error,
    F: FnMut(&[u8]) -> Result<Frame, I>,
{
    let attempts = u16::from(max_retries) + 1;
    for attempt in 1..=attempts {
        let outcome = exchange(request).and_then(|raw| Ok(Telegram::decode(&raw)?));
        match outcome {
            Ok(reply) => return Ok(reply),
            Err(err) if err.is_retryable() => {
                warn!("Query attempt {attempt}/{attempts} failed: {err}");
            }
            Err(err) => return Err(err),
        }
    }
    error!("No valid answer after {attempts} attempts, giving up");
    Err(Error::ConnectionLost { attempts })
}

/// Owns the serial interface of one physical link.
pub struct Link<S, D> {
    interface: S,
    delay: D,
    policy: RetryPolicy,
}

impl<S, D> Link<S, D>
where
    S: Read + Write + ReadReady,
    D: Delay,
{
    pub fn new(interface: S, delay: D) -> Self {
        Self {
            interface,
            delay,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn interface(&self) -> &S {
        &self.interface
    }

    /// Give the interface back, e.g. to close the port.
    pub fn release(self) -> S {
        self.interface
    }

    /// Write a telegram which gets no answer. This is never retried.
    pub fn send(&mut self, telegram: &Telegram) -> Result<(), S::Error> {
        let frame = telegram.encode()?;
        trace!("-> {:02X?}", frame.as_slice());
        self.write_frame(&frame)?;
        self.settle_and_drain();
        Ok(())
    }

    /// Send a query and return the validated answer.
    ///
    /// The answer must come from the queried device node and be for the queried object.
    /// Its length is already fixed by the query, an answer announcing a different length
    /// fails to decode and is retried like any other corrupted answer.
    pub fn query(&mut self, request: &Telegram) -> Result<Telegram, S::Error> {
        let reply_len = frame_len(request.delimiter().data_length());
        let frame = request.encode()?;
        let reply = execute_query(&frame, self.policy.max_retries, |bytes| {
            self.exchange(bytes, reply_len)
        })?;

        if reply.device_node() != request.device_node()
            || reply.object_id() != request.object_id()
        {
            warn!(
                "Answer from node {} for object {} does not match query to node {} for object {}",
                reply.device_node(),
                reply.object_id(),
                request.device_node(),
                request.object_id()
            );
            return Err(Error::InvalidResponse);
        }
        Ok(reply)
    }

    /// One write/read round trip, always followed by the settle and drain.
    fn exchange(&mut self, request: &[u8], reply_len: usize) -> Result<Frame, S::Error> {
        trace!("-> {:02X?}", request);
        self.write_frame(request)?;
        let reply = self.read_reply(reply_len);
        self.settle_and_drain();
        let reply = reply?;
        trace!("<- {:02X?}", reply.as_slice());
        Ok(reply)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), S::Error> {
        self.interface.write_all(frame).map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)
    }

    /// Read exactly `len` bytes, or fail with [`Error::Timeout`] if they stop coming.
    fn read_reply(&mut self, len: usize) -> Result<Frame, S::Error> {
        let mut buff = [0u8; MAX_TELEGRAM_LEN];
        let reply = buff.get_mut(..len).ok_or(Error::BufferError)?;

        let mut filled = 0;
        while filled < reply.len() {
            match self.interface.read(&mut reply[filled..]) {
                Ok(0) => return Err(Error::Timeout),
                Ok(bytes_read) => filled += bytes_read,
                Err(e) if matches!(embedded_io::Error::kind(&e), ErrorKind::TimedOut) => {
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::SerialError(e)),
            }
        }

        Frame::from_slice(reply).map_err(|_| Error::BufferError)
    }

    /// Wait for the link to settle, then throw away anything left on it.
    ///
    /// At most [`MAX_DRAIN`] bytes are discarded per call. Returns the number of bytes
    /// discarded. Failures here are logged, not returned.
    fn settle_and_drain(&mut self) -> usize {
        self.delay.delay(self.policy.settle);

        let mut scratch = [0u8; 32];
        let mut drained = 0;
        loop {
            if drained >= MAX_DRAIN {
                warn!("Gave up draining the link after {drained} bytes");
                break;
            }
            match self.interface.read_ready() {
                Ok(true) => match self.interface.read(&mut scratch) {
                    Ok(0) => break,
                    Ok(bytes_read) => {
                        warn!("Unexpected data received: {:02X?}", &scratch[..bytes_read]);
                        drained += bytes_read;
                    }
                    Err(e) => {
                        warn!("Could not drain link: {:?}", embedded_io::Error::kind(&e));
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    warn!("Could not poll link: {:?}", embedded_io::Error::kind(&e));
                    break;
                }
            }
        }
        drained
    }
}

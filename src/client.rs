#![deny(unsafe_code)]
#![deny(warnings)]
//! Capability traits implemented by the socket variants
//!
//! Instead of one deep stream hierarchy, each socket type implements the
//! small capabilities it actually has: the connection-oriented client is
//! `Readable + Writable + Connectable`, the datagram endpoint is
//! `Readable + Writable`. Code generic over "something I can poll bytes
//! from" takes the capability it needs and nothing more.

use crate::driver::Host;
use crate::error::NetError;

/// Non-blocking byte input.
pub trait Readable {
    /// Bytes ready to read right now. Never waits for more to arrive.
    fn available(&mut self) -> usize;

    /// Pull one byte, or `None` when nothing is buffered.
    fn read_byte(&mut self) -> Option<u8>;

    /// Pull up to `buf.len()` bytes, or `None` when nothing is buffered.
    fn read(&mut self, buf: &mut [u8]) -> Option<usize>;

    /// Look at the next byte without consuming it.
    fn peek(&mut self) -> Option<u8>;
}

/// Byte output.
pub trait Writable {
    /// Write the whole buffer or fail; short writes are never reported as
    /// success.
    fn write(&mut self, buf: &[u8]) -> Result<usize, NetError>;

    fn write_byte(&mut self, byte: u8) -> Result<usize, NetError> {
        self.write(&[byte])
    }
}

/// Connection lifecycle of a stream socket.
pub trait Connectable {
    fn connect(&mut self, host: Host<'_>, port: u16) -> Result<(), NetError>;

    fn disconnect(&mut self);

    fn is_connected(&mut self) -> bool;
}

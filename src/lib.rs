#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]
//! Socket layer for SPI-attached ESP32 WiFi co-processors
//!
//! The co-processor owns the WiFi, TCP/IP and TLS machinery; this crate is
//! the host-side bookkeeping that multiplexes logical connections onto the
//! small set of sockets the module exposes over SPI:
//! - **`client`**: capability traits implemented by the socket variants
//! - **`config`**: configuration structs with `Default` implementations
//! - **`driver`**: the co-processor command interface consumed by the core
//! - **`error`**: error enum shared by all socket operations
//! - **`socket`**: fixed-size socket slot pool
//! - **`stack`**: shared driver and pool handle that clients borrow
//! - **`tcp`**: connection-oriented client (plain TCP or TLS)
//! - **`udp`**: datagram endpoint (listener, peer and multicast modes)
//!
//! ## Model
//!
//! Everything is single-threaded, cooperative and non-blocking: reads return
//! immediately with whatever the co-processor has buffered, and callers poll
//! from their own loop. Remote closure is detected lazily by `status()`
//! rather than signalled, so a client that never polls status and never calls
//! `stop()` keeps its slot even after the peer hangs up.
//!
//! ## Example
//!
//! ```ignore
//! let stack = Stack::new(driver);
//! let mut client = TcpClient::new(&stack, delay);
//! client.connect("example.com", 80)?;
//! client.write(b"GET / HTTP/1.0\r\n\r\n")?;
//! while client.connected() {
//!     if let Some(byte) = client.read_byte() {
//!         handle(byte);
//!     }
//! }
//! client.stop();
//! ```

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod socket;
pub mod stack;
pub mod tcp;
pub mod udp;

pub use client::{Connectable, Readable, Writable};
pub use config::{TcpConfig, TlsIdentity};
pub use driver::{DriverError, Host, SocketDriver, SocketStatus, TransportMode};
pub use error::NetError;
pub use socket::{Socket, SocketPool, SOCKET_COUNT};
pub use stack::Stack;
pub use tcp::TcpClient;
pub use udp::{PeerAddr, UdpEndpoint};

#![deny(unsafe_code)]
#![deny(warnings)]
//! Connection-oriented client (plain TCP or TLS)
//!
//! One client drives one co-processor socket slot: claim a slot on
//! `connect`, shovel bytes with `write`/`read`, give the slot back on
//! `stop`. Whether the stream is plain TCP or TLS only changes the mode
//! requested from the co-processor; the handshake itself happens on the
//! module.
//!
//! Connection state is never cached. `status()` asks the co-processor every
//! time and doubles as the reconciliation point: when it discovers the peer
//! has gone away it releases the slot back to the pool as a logged
//! transition. A client that neither polls `status()` nor calls `stop()`
//! holds its slot indefinitely.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;

use crate::client::{Connectable, Readable, Writable};
use crate::config::{TcpConfig, TlsIdentity};
use crate::driver::{Host, SocketDriver, SocketStatus, TransportMode};
use crate::error::NetError;
use crate::socket::Socket;
use crate::stack::Stack;

pub struct TcpClient<'a, D: SocketDriver, DL: DelayNs> {
    stack: &'a Stack<D>,
    delay: DL,
    config: TcpConfig,
    sock: Option<Socket>,
    /// One byte of lookahead. The co-processor's read is destructive, so
    /// `peek` parks the byte here and `available`/`read` surface it again.
    peeked: Option<u8>,
}

impl<'a, D: SocketDriver, DL: DelayNs> TcpClient<'a, D, DL> {
    pub fn new(stack: &'a Stack<D>, delay: DL) -> Self {
        Self::with_config(stack, delay, TcpConfig::default())
    }

    pub fn with_config(stack: &'a Stack<D>, delay: DL, config: TcpConfig) -> Self {
        Self {
            stack,
            delay,
            config,
            sock: None,
            peeked: None,
        }
    }

    /// Open a plain TCP connection.
    ///
    /// Claims a slot from the pool unless one is already held from an
    /// earlier connection. Pool exhaustion fails the attempt immediately
    /// with [`NetError::NoSocketAvailable`]; nothing is retried.
    pub fn connect<'h>(&mut self, host: impl Into<Host<'h>>, port: u16) -> Result<(), NetError> {
        self.connect_with_mode(host.into(), port, TransportMode::Tcp)
    }

    /// Open a TLS connection. The co-processor performs the handshake.
    pub fn connect_secure<'h>(
        &mut self,
        host: impl Into<Host<'h>>,
        port: u16,
    ) -> Result<(), NetError> {
        self.connect_with_mode(host.into(), port, TransportMode::Tls)
    }

    /// Install a client certificate and key, then open a TLS connection.
    ///
    /// The identity is module-wide: it also applies to every later TLS
    /// connect, until something overwrites it.
    pub fn connect_secure_with_identity<'h>(
        &mut self,
        host: impl Into<Host<'h>>,
        port: u16,
        identity: &TlsIdentity<'_>,
    ) -> Result<(), NetError> {
        self.stack.with(|driver, _| {
            driver.set_certificate(identity.certificate);
            driver.set_private_key(identity.private_key);
        });
        self.connect_with_mode(host.into(), port, TransportMode::Tls)
    }

    fn connect_with_mode(
        &mut self,
        host: Host<'_>,
        port: u16,
        mode: TransportMode,
    ) -> Result<(), NetError> {
        match host {
            Host::Name(name) => info!("connecting to {}:{}", name, port),
            Host::Ip(ip) => {
                let o = ip.octets();
                info!("connecting to {}.{}.{}.{}:{}", o[0], o[1], o[2], o[3], port);
            }
        }

        let held = self.sock.take();
        self.peeked = None;
        let outcome = self.stack.with(|driver, pool| {
            let sock = match held {
                Some(sock) => sock,
                None => pool.take().ok_or(NetError::NoSocketAvailable)?,
            };
            match driver.connect(&sock, host, port, mode) {
                Ok(()) => Ok(sock),
                Err(_) => {
                    // A refused connect must not keep holding a slot; close
                    // the module side in case it was left half-open.
                    driver.close(&sock);
                    pool.release(sock);
                    Err(NetError::ConnectFailed)
                }
            }
        });

        match outcome {
            Ok(sock) => {
                info!("socket {}: connected", sock.index());
                self.sock = Some(sock);
                Ok(())
            }
            Err(NetError::NoSocketAvailable) => {
                warn!("no socket available");
                Err(NetError::NoSocketAvailable)
            }
            Err(err) => {
                warn!("connect refused by co-processor");
                Err(err)
            }
        }
    }

    /// Write the whole buffer, all-or-nothing.
    ///
    /// A rejected or truncated write is fatal: the error is logged, the
    /// control thread sits out the configured settle delay, and the socket
    /// is force-closed so the slot returns to the pool.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        let Some(sock) = self.sock.as_ref() else {
            return Err(NetError::NotConnected);
        };
        if buf.is_empty() {
            return Err(NetError::WriteFailed);
        }

        let written = self.stack.with(|driver, _| driver.write(sock, buf));
        if matches!(written, Ok(count) if count == buf.len()) {
            return Ok(buf.len());
        }

        error!("socket {}: write failed", sock.index());
        let still_established =
            self.stack.with(|driver, _| driver.status(sock) == SocketStatus::Established);
        self.delay.delay_ms(self.config.write_failure_settle_ms);
        self.stop();
        Err(if still_established {
            NetError::WriteFailed
        } else {
            NetError::RemoteClosed
        })
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<usize, NetError> {
        self.write(&[byte])
    }

    /// Bytes ready to read right now, including a pending peeked byte.
    pub fn available(&mut self) -> usize {
        let pushback = usize::from(self.peeked.is_some());
        match self.sock.as_ref() {
            Some(sock) => pushback + self.stack.with(|driver, _| driver.available(sock)),
            None => pushback,
        }
    }

    /// Pull one byte, or `None` when nothing is buffered. Never blocks.
    pub fn read_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.peeked.take() {
            return Some(byte);
        }
        let sock = self.sock.as_ref()?;
        self.stack.with(|driver, _| {
            if driver.available(sock) == 0 {
                None
            } else {
                driver.read_byte(sock)
            }
        })
    }

    /// Pull up to `buf.len()` bytes, or `None` when nothing is buffered.
    pub fn read(&mut self, buf: &mut [u8]) -> Option<usize> {
        if self.available() == 0 {
            return None;
        }
        let mut count = 0;
        if !buf.is_empty() {
            if let Some(byte) = self.peeked.take() {
                buf[0] = byte;
                count = 1;
            }
        }
        if let Some(sock) = self.sock.as_ref() {
            count += self.stack.with(|driver, _| driver.read(sock, &mut buf[count..]));
        }
        Some(count)
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        if let Some(byte) = self.peeked {
            return Some(byte);
        }
        let sock = self.sock.as_ref()?;
        let byte = self.stack.with(|driver, _| {
            if driver.available(sock) == 0 {
                None
            } else {
                driver.read_byte(sock)
            }
        })?;
        self.peeked = Some(byte);
        Some(byte)
    }

    /// Drain and discard everything currently buffered for this socket.
    pub fn flush_input(&mut self) {
        let mut pending = self.available();
        while pending > 0 {
            if self.read_byte().is_none() {
                break;
            }
            pending -= 1;
        }
    }

    /// Close the connection and give the slot back. No-op without a slot.
    pub fn stop(&mut self) {
        let Some(sock) = self.sock.take() else {
            return;
        };
        info!("socket {}: closing", sock.index());
        self.stack.with(|driver, pool| {
            driver.close(&sock);
            pool.release(sock);
        });
        self.peeked = None;
    }

    /// Reconcile this client's view with the co-processor's.
    ///
    /// No slot means `Closed`. With a slot held, zero buffered bytes are
    /// read as an idle-but-alive connection (a live peer that has nothing
    /// to say looks exactly like this), so the answer is `Established`
    /// without a status query. Only when data is buffered is the module's
    /// own socket state consulted; any state other than established is
    /// taken as remote closure, releasing the slot before reporting
    /// `Closed`.
    pub fn status(&mut self) -> SocketStatus {
        let Some(sock) = self.sock.as_ref() else {
            return SocketStatus::Closed;
        };
        let established = self.stack.with(|driver, _| {
            driver.available(sock) == 0 || driver.status(sock) == SocketStatus::Established
        });
        if established {
            return SocketStatus::Established;
        }
        if let Some(sock) = self.sock.take() {
            info!("socket {}: remote closed, releasing", sock.index());
            self.stack.with(|_, pool| pool.release(sock));
        }
        self.peeked = None;
        SocketStatus::Closed
    }

    pub fn connected(&mut self) -> bool {
        self.status() == SocketStatus::Established
    }

    /// Whether a socket slot is held, regardless of whether the peer is
    /// still there.
    pub fn has_socket(&self) -> bool {
        self.sock.is_some()
    }

    pub fn remote_ip(&mut self) -> Option<Ipv4Addr> {
        let sock = self.sock.as_ref()?;
        Some(self.stack.with(|driver, _| driver.remote_info(sock).0))
    }

    pub fn remote_port(&mut self) -> Option<u16> {
        let sock = self.sock.as_ref()?;
        Some(self.stack.with(|driver, _| driver.remote_info(sock).1))
    }
}

impl<D: SocketDriver, DL: DelayNs> Readable for TcpClient<'_, D, DL> {
    fn available(&mut self) -> usize {
        TcpClient::available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        TcpClient::read_byte(self)
    }

    fn read(&mut self, buf: &mut [u8]) -> Option<usize> {
        TcpClient::read(self, buf)
    }

    fn peek(&mut self) -> Option<u8> {
        TcpClient::peek(self)
    }
}

impl<D: SocketDriver, DL: DelayNs> Writable for TcpClient<'_, D, DL> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        TcpClient::write(self, buf)
    }
}

impl<D: SocketDriver, DL: DelayNs> Connectable for TcpClient<'_, D, DL> {
    fn connect(&mut self, host: Host<'_>, port: u16) -> Result<(), NetError> {
        self.connect_with_mode(host, port, TransportMode::Tcp)
    }

    fn disconnect(&mut self) {
        self.stop();
    }

    fn is_connected(&mut self) -> bool {
        self.connected()
    }
}

impl<D: SocketDriver, DL: DelayNs> embedded_io::ErrorType for TcpClient<'_, D, DL> {
    type Error = NetError;
}

impl<D: SocketDriver, DL: DelayNs> embedded_io::ReadReady for TcpClient<'_, D, DL> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(TcpClient::available(self) > 0)
    }
}

impl<D: SocketDriver, DL: DelayNs> embedded_io::WriteReady for TcpClient<'_, D, DL> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.has_socket())
    }
}

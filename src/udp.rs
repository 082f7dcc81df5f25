#![deny(unsafe_code)]
#![deny(warnings)]
//! Datagram endpoint (listener, peer and multicast modes)
//!
//! A UDP "connection" on the co-processor is nothing more than a socket
//! slot plus the peer filter installed on it, so the endpoint carries no
//! connection state of its own. It can be bound as a listener with
//! [`begin`](UdpEndpoint::begin), pointed at a single default peer with
//! [`begin_packet`](UdpEndpoint::begin_packet), or joined to a multicast
//! group with [`begin_multicast`](UdpEndpoint::begin_multicast).
//!
//! Outgoing datagrams are assembled on the module: every `write` appends to
//! the pending datagram and [`end_packet`](UdpEndpoint::end_packet)
//! triggers the single send, so several writes between `begin_packet` and
//! `end_packet` become one datagram on the wire.

use core::net::Ipv4Addr;

use heapless::String;

use crate::client::{Readable, Writable};
use crate::driver::{Host, SocketDriver, TransportMode};
use crate::error::NetError;
use crate::socket::Socket;
use crate::stack::Stack;

/// Longest hostname the endpoint will cache for a datagram peer.
pub const MAX_PEER_HOST_LEN: usize = 64;

/// Cached remote peer of a datagram endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddr {
    Name(String<MAX_PEER_HOST_LEN>),
    Ip(Ipv4Addr),
}

impl PeerAddr {
    pub fn as_host(&self) -> Host<'_> {
        match self {
            PeerAddr::Name(name) => Host::Name(name.as_str()),
            PeerAddr::Ip(ip) => Host::Ip(*ip),
        }
    }
}

pub struct UdpEndpoint<'a, D: SocketDriver> {
    stack: &'a Stack<D>,
    sock: Option<Socket>,
    local_port: u16,
    peer: Option<(PeerAddr, u16)>,
    /// One byte of lookahead, same scheme as the stream client.
    peeked: Option<u8>,
}

impl<'a, D: SocketDriver> UdpEndpoint<'a, D> {
    pub fn new(stack: &'a Stack<D>) -> Self {
        Self {
            stack,
            sock: None,
            local_port: 0,
            peer: None,
            peeked: None,
        }
    }

    /// Bind a listener on `port`, recording the port in the slot table.
    ///
    /// An endpoint that was already open is stopped first, so rebinding
    /// cannot leak a slot.
    pub fn begin(&mut self, port: u16) -> Result<(), NetError> {
        if self.sock.is_some() {
            self.stop();
        }
        let outcome = self.stack.with(|driver, pool| {
            let sock = pool.take().ok_or(NetError::NoSocketAvailable)?;
            if driver
                .open_listener(&sock, port, TransportMode::Udp)
                .is_err()
            {
                pool.release(sock);
                return Err(NetError::ConnectFailed);
            }
            pool.bind_port(&sock, port);
            Ok(sock)
        });
        match outcome {
            Ok(sock) => {
                info!("socket {}: listening on udp port {}", sock.index(), port);
                self.sock = Some(sock);
                self.local_port = port;
                Ok(())
            }
            Err(err) => {
                warn!("udp listen on port {} failed", port);
                Err(err)
            }
        }
    }

    /// Point the endpoint at a default peer by hostname and start a fresh
    /// outgoing datagram.
    pub fn begin_packet(&mut self, host: &str, port: u16) -> Result<(), NetError> {
        let mut name: String<MAX_PEER_HOST_LEN> = String::new();
        if name.push_str(host).is_err() {
            warn!("peer hostname too long: {}", host);
            return Err(NetError::ConnectFailed);
        }
        self.begin_packet_to(PeerAddr::Name(name), port)
    }

    /// Point the endpoint at a default peer by address and start a fresh
    /// outgoing datagram.
    pub fn begin_packet_ip(&mut self, ip: Ipv4Addr, port: u16) -> Result<(), NetError> {
        self.begin_packet_to(PeerAddr::Ip(ip), port)
    }

    fn begin_packet_to(&mut self, peer: PeerAddr, port: u16) -> Result<(), NetError> {
        let held = self.sock.take();
        let host = peer.as_host();
        let outcome = self.stack.with(|driver, pool| {
            let sock = match held {
                Some(sock) => sock,
                None => pool.take().ok_or(NetError::NoSocketAvailable)?,
            };
            match driver.connect(&sock, host, port, TransportMode::Udp) {
                Ok(()) => Ok(sock),
                Err(_) => {
                    pool.release(sock);
                    Err(NetError::ConnectFailed)
                }
            }
        });
        match outcome {
            Ok(sock) => {
                debug!("socket {}: datagram peer set, port {}", sock.index(), port);
                self.sock = Some(sock);
                self.peer = Some((peer, port));
                Ok(())
            }
            Err(err) => {
                warn!("udp peer setup failed");
                self.peer = None;
                Err(err)
            }
        }
    }

    /// Join a multicast group as a server-style datagram socket.
    pub fn begin_multicast(&mut self, group: Ipv4Addr, port: u16) -> Result<(), NetError> {
        let held = self.sock.take();
        let outcome = self.stack.with(|driver, pool| {
            let sock = match held {
                Some(sock) => sock,
                None => pool.take().ok_or(NetError::NoSocketAvailable)?,
            };
            match driver.start_server(&sock, group, port, TransportMode::UdpMulticast) {
                Ok(()) => Ok(sock),
                Err(_) => {
                    pool.release(sock);
                    Err(NetError::ConnectFailed)
                }
            }
        });
        match outcome {
            Ok(sock) => {
                let o = group.octets();
                info!(
                    "socket {}: joined multicast {}.{}.{}.{}:{}",
                    sock.index(),
                    o[0],
                    o[1],
                    o[2],
                    o[3],
                    port
                );
                self.sock = Some(sock);
                self.peer = Some((PeerAddr::Ip(group), port));
                Ok(())
            }
            Err(err) => {
                warn!("multicast setup failed");
                Err(err)
            }
        }
    }

    /// Append bytes to the outgoing datagram being assembled on the module.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        let Some(sock) = self.sock.as_ref() else {
            return Err(NetError::NotConnected);
        };
        self.stack
            .with(|driver, _| driver.udp_append(sock, buf))
            .map_err(|_| {
                error!("socket {}: datagram append failed", sock.index());
                NetError::WriteFailed
            })?;
        Ok(buf.len())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<usize, NetError> {
        self.write(&[byte])
    }

    /// Send the datagram assembled since `begin_packet`.
    pub fn end_packet(&mut self) -> Result<(), NetError> {
        let Some(sock) = self.sock.as_ref() else {
            return Err(NetError::NotConnected);
        };
        self.stack
            .with(|driver, _| driver.udp_send(sock))
            .map_err(|_| {
                error!("socket {}: datagram send failed", sock.index());
                NetError::WriteFailed
            })
    }

    /// Bytes ready to read from the current packet. The co-processor does
    /// not report packet boundaries, so this is simply what it has
    /// buffered.
    pub fn parse_packet(&mut self) -> usize {
        self.available()
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
    pub fn flush(&mut self) {
        let mut pending = self.available();
        while pending > 0 {
            if self.read_byte().is_none() {
                break;
            }
            pending -= 1;
        }
    }

    /// Drain pending input, close the socket and give the slot back,
    /// clearing the bound-port entry. No-op without a slot.
    pub fn stop(&mut self) {
        if self.sock.is_none() {
            return;
        }
        self.flush();
        if let Some(sock) = self.sock.take() {
            info!("socket {}: closing", sock.index());
            self.stack.with(|driver, pool| {
                driver.close(&sock);
                pool.release(sock);
            });
        }
        self.local_port = 0;
        self.peer = None;
        self.peeked = None;
    }

    /// Local port this endpoint listens on, or 0 when unbound.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Cached default peer, when one was set with `begin_packet` or
    /// `begin_multicast`.
    pub fn peer(&self) -> Option<(&PeerAddr, u16)> {
        self.peer.as_ref().map(|(addr, port)| (addr, *port))
    }

    /// Whether a socket slot is held.
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

impl<D: SocketDriver> Readable for UdpEndpoint<'_, D> {
    fn available(&mut self) -> usize {
        UdpEndpoint::available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        UdpEndpoint::read_byte(self)
    }

    fn read(&mut self, buf: &mut [u8]) -> Option<usize> {
        UdpEndpoint::read(self, buf)
    }

    fn peek(&mut self) -> Option<u8> {
        UdpEndpoint::peek(self)
    }
}

impl<D: SocketDriver> Writable for UdpEndpoint<'_, D> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        UdpEndpoint::write(self, buf)
    }
}

impl<D: SocketDriver> embedded_io::ErrorType for UdpEndpoint<'_, D> {
    type Error = NetError;
}

impl<D: SocketDriver> embedded_io::ReadReady for UdpEndpoint<'_, D> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(UdpEndpoint::available(self) > 0)
    }
}

impl<D: SocketDriver> embedded_io::WriteReady for UdpEndpoint<'_, D> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.has_socket())
    }
}

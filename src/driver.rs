#![deny(unsafe_code)]
#![deny(warnings)]
//! Co-processor command interface
//!
//! The WiFi module on the other side of the SPI bus runs the whole TCP/IP
//! and TLS stack; the host addresses it through a small set of per-socket
//! primitives keyed by a [`Socket`] handle. This module defines that
//! contract. Implementations translate each call into the module's SPI
//! command protocol and are out of scope here.

use core::net::Ipv4Addr;

use crate::socket::Socket;

/// Transport mode requested when a socket is opened on the co-processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportMode {
    /// Plain TCP stream.
    Tcp,
    /// Datagram socket.
    Udp,
    /// TCP stream with the co-processor performing the TLS handshake.
    Tls,
    /// Datagram socket joined to a multicast group.
    UdpMulticast,
}

/// TCP state of a co-processor socket, as reported by the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketStatus {
    Closed,
    Listening,
    SynSent,
    SynReceived,
    Established,
    FinWait1,
    FinWait2,
    CloseWait,
    Closing,
    LastAck,
    TimeWait,
}

/// Failure reported by the co-processor for a primitive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The SPI transfer itself failed.
    Bus,
    /// The co-processor understood the request and refused it.
    Rejected,
}

/// Remote or local address in the form the co-processor accepts.
///
/// The module resolves hostnames itself, so both spellings travel to it
/// as-is rather than being resolved on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host<'a> {
    Name(&'a str),
    Ip(Ipv4Addr),
}

impl<'a> From<&'a str> for Host<'a> {
    fn from(name: &'a str) -> Self {
        Host::Name(name)
    }
}

impl<'a> From<Ipv4Addr> for Host<'a> {
    fn from(ip: Ipv4Addr) -> Self {
        Host::Ip(ip)
    }
}

/// Per-socket primitives exposed by the co-processor.
///
/// All calls are non-blocking commands: the module answers from what it has
/// already buffered, and nothing here waits for network progress.
pub trait SocketDriver {
    /// Open `sock` towards a remote endpoint in the given transport mode.
    ///
    /// For datagram sockets this installs the peer filter used by
    /// subsequent sends rather than performing a handshake.
    fn connect(
        &mut self,
        sock: &Socket,
        host: Host<'_>,
        port: u16,
        mode: TransportMode,
    ) -> Result<(), DriverError>;

    /// Open `sock` listening on a local port (wildcard bind address).
    fn open_listener(
        &mut self,
        sock: &Socket,
        port: u16,
        mode: TransportMode,
    ) -> Result<(), DriverError>;

    /// Start a server-style socket bound to a multicast group.
    fn start_server(
        &mut self,
        sock: &Socket,
        group: Ipv4Addr,
        port: u16,
        mode: TransportMode,
    ) -> Result<(), DriverError>;

    /// Queue `buf` for transmission on a stream socket.
    ///
    /// Returns the number of bytes the module accepted; a short count means
    /// a partial write.
    fn write(&mut self, sock: &Socket, buf: &[u8]) -> Result<usize, DriverError>;

    /// Bytes the module has buffered for `sock`, ready to read.
    fn available(&mut self, sock: &Socket) -> usize;

    /// Pull one buffered byte. Destructive: the module discards the byte.
    fn read_byte(&mut self, sock: &Socket) -> Option<u8>;

    /// Pull up to `buf.len()` buffered bytes, returning how many were read.
    fn read(&mut self, sock: &Socket, buf: &mut [u8]) -> usize;

    /// Close the module side of `sock`.
    fn close(&mut self, sock: &Socket);

    /// Query the module's TCP state for `sock`.
    fn status(&mut self, sock: &Socket) -> SocketStatus;

    /// Remote address and port currently bound to `sock`.
    fn remote_info(&mut self, sock: &Socket) -> (Ipv4Addr, u16);

    /// Append bytes to the pending outgoing datagram for `sock`.
    fn udp_append(&mut self, sock: &Socket, buf: &[u8]) -> Result<(), DriverError>;

    /// Transmit the pending datagram assembled by [`udp_append`].
    ///
    /// [`udp_append`]: SocketDriver::udp_append
    fn udp_send(&mut self, sock: &Socket) -> Result<(), DriverError>;

    /// Install the client certificate used for TLS connects.
    ///
    /// Module-wide, not per-connection: the latest call wins.
    fn set_certificate(&mut self, pem: &str);

    /// Install the client private key used for TLS connects.
    ///
    /// Module-wide, not per-connection: the latest call wins.
    fn set_private_key(&mut self, pem: &str);
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::string::String;
    use std::vec::Vec;

    use core::cell::Cell;

    use super::*;
    use crate::socket::SOCKET_COUNT;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Connect { sock: usize, host: String, port: u16, mode: TransportMode },
        OpenListener { sock: usize, port: u16, mode: TransportMode },
        StartServer { sock: usize, group: Ipv4Addr, port: u16, mode: TransportMode },
        Close { sock: usize },
        UdpSend { sock: usize },
        SetCertificate,
        SetPrivateKey,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum WriteBehavior {
        Accept,
        Short(usize),
        Fail,
    }

    /// Scripted in-memory driver for exercising the socket layer.
    pub struct MockDriver {
        pub connect_result: Result<(), DriverError>,
        pub listen_result: Result<(), DriverError>,
        pub write_behavior: WriteBehavior,
        pub append_result: Result<(), DriverError>,
        pub send_result: Result<(), DriverError>,
        pub statuses: [SocketStatus; SOCKET_COUNT],
        pub remote: (Ipv4Addr, u16),
        pub rx: [VecDeque<u8>; SOCKET_COUNT],
        pub pending_datagram: [Vec<u8>; SOCKET_COUNT],
        pub sent_datagrams: [Vec<Vec<u8>>; SOCKET_COUNT],
        pub written: Vec<u8>,
        pub certificate: Option<String>,
        pub private_key: Option<String>,
        pub calls: Vec<Call>,
    }

    impl MockDriver {
        pub fn new() -> Self {
            Self {
                connect_result: Ok(()),
                listen_result: Ok(()),
                write_behavior: WriteBehavior::Accept,
                append_result: Ok(()),
                send_result: Ok(()),
                statuses: [SocketStatus::Established; SOCKET_COUNT],
                remote: (Ipv4Addr::UNSPECIFIED, 0),
                rx: core::array::from_fn(|_| VecDeque::new()),
                pending_datagram: core::array::from_fn(|_| Vec::new()),
                sent_datagrams: core::array::from_fn(|_| Vec::new()),
                written: Vec::new(),
                certificate: None,
                private_key: None,
                calls: Vec::new(),
            }
        }

        pub fn push_rx(&mut self, sock: usize, data: &[u8]) {
            self.rx[sock].extend(data.iter().copied());
        }

        pub fn closed(&self, sock: usize) -> bool {
            self.calls.contains(&Call::Close { sock })
        }

        fn host_repr(host: Host<'_>) -> String {
            match host {
                Host::Name(name) => name.into(),
                Host::Ip(ip) => ip.to_string(),
            }
        }
    }

    impl Default for MockDriver {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SocketDriver for MockDriver {
        fn connect(
            &mut self,
            sock: &Socket,
            host: Host<'_>,
            port: u16,
            mode: TransportMode,
        ) -> Result<(), DriverError> {
            self.calls.push(Call::Connect {
                sock: sock.index(),
                host: Self::host_repr(host),
                port,
                mode,
            });
            self.connect_result
        }

        fn open_listener(
            &mut self,
            sock: &Socket,
            port: u16,
            mode: TransportMode,
        ) -> Result<(), DriverError> {
            self.calls.push(Call::OpenListener { sock: sock.index(), port, mode });
            self.listen_result
        }

        fn start_server(
            &mut self,
            sock: &Socket,
            group: Ipv4Addr,
            port: u16,
            mode: TransportMode,
        ) -> Result<(), DriverError> {
            self.calls.push(Call::StartServer { sock: sock.index(), group, port, mode });
            self.listen_result
        }

        fn write(&mut self, _sock: &Socket, buf: &[u8]) -> Result<usize, DriverError> {
            match self.write_behavior {
                WriteBehavior::Accept => {
                    self.written.extend_from_slice(buf);
                    Ok(buf.len())
                }
                WriteBehavior::Short(count) => Ok(count.min(buf.len())),
                WriteBehavior::Fail => Err(DriverError::Rejected),
            }
        }

        fn available(&mut self, sock: &Socket) -> usize {
            self.rx[sock.index()].len()
        }

        fn read_byte(&mut self, sock: &Socket) -> Option<u8> {
            self.rx[sock.index()].pop_front()
        }

        fn read(&mut self, sock: &Socket, buf: &mut [u8]) -> usize {
            let queue = &mut self.rx[sock.index()];
            let mut count = 0;
            while count < buf.len() {
                match queue.pop_front() {
                    Some(byte) => {
                        buf[count] = byte;
                        count += 1;
                    }
                    None => break,
                }
            }
            count
        }

        fn close(&mut self, sock: &Socket) {
            self.calls.push(Call::Close { sock: sock.index() });
        }

        fn status(&mut self, sock: &Socket) -> SocketStatus {
            self.statuses[sock.index()]
        }

        fn remote_info(&mut self, _sock: &Socket) -> (Ipv4Addr, u16) {
            self.remote
        }

        fn udp_append(&mut self, sock: &Socket, buf: &[u8]) -> Result<(), DriverError> {
            self.append_result?;
            self.pending_datagram[sock.index()].extend_from_slice(buf);
            Ok(())
        }

        fn udp_send(&mut self, sock: &Socket) -> Result<(), DriverError> {
            self.calls.push(Call::UdpSend { sock: sock.index() });
            self.send_result?;
            let datagram = core::mem::take(&mut self.pending_datagram[sock.index()]);
            self.sent_datagrams[sock.index()].push(datagram);
            Ok(())
        }

        fn set_certificate(&mut self, pem: &str) {
            self.calls.push(Call::SetCertificate);
            self.certificate = Some(pem.into());
        }

        fn set_private_key(&mut self, pem: &str) {
            self.calls.push(Call::SetPrivateKey);
            self.private_key = Some(pem.into());
        }
    }

    /// `DelayNs` stub that records the total requested delay.
    #[derive(Clone)]
    pub struct RecordingDelay {
        total_ns: Rc<Cell<u64>>,
    }

    impl RecordingDelay {
        pub fn new() -> Self {
            Self { total_ns: Rc::new(Cell::new(0)) }
        }

        pub fn total_ns(&self) -> u64 {
            self.total_ns.get()
        }
    }

    impl embedded_hal::delay::DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns.set(self.total_ns.get() + u64::from(ns));
        }
    }
}

#![deny(unsafe_code)]
#![deny(warnings)]
//! Socket layer error types

/// Errors reported by the socket clients.
///
/// Lazy closure detection is a state transition reported through
/// [`status`](crate::tcp::TcpClient::status), not an error; the variants
/// here cover the operations that can actively fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetError {
    /// Every socket slot is taken.
    NoSocketAvailable,
    /// The co-processor refused to open or bind the socket.
    ConnectFailed,
    /// Operation attempted with no socket slot held.
    NotConnected,
    /// Zero-length write, or the co-processor rejected or truncated a
    /// write. Fatal to the connection: the socket is force-closed.
    WriteFailed,
    /// The peer had already closed the connection when a write failed.
    RemoteClosed,
}

impl core::fmt::Display for NetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoSocketAvailable => write!(f, "No socket available"),
            Self::ConnectFailed => write!(f, "Connect failed"),
            Self::NotConnected => write!(f, "Not connected"),
            Self::WriteFailed => write!(f, "Write failed"),
            Self::RemoteClosed => write!(f, "Remote closed"),
        }
    }
}

impl core::error::Error for NetError {}

impl embedded_io::Error for NetError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NoSocketAvailable => embedded_io::ErrorKind::Other,
            Self::ConnectFailed => embedded_io::ErrorKind::ConnectionRefused,
            Self::NotConnected => embedded_io::ErrorKind::NotConnected,
            Self::WriteFailed => embedded_io::ErrorKind::BrokenPipe,
            Self::RemoteClosed => embedded_io::ErrorKind::ConnectionReset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error;

    #[test]
    fn test_display() {
        assert_eq!(NetError::NoSocketAvailable.to_string(), "No socket available");
        assert_eq!(NetError::WriteFailed.to_string(), "Write failed");
    }

    #[test]
    fn test_io_error_kinds() {
        assert_eq!(
            NetError::NotConnected.kind(),
            embedded_io::ErrorKind::NotConnected
        );
        assert_eq!(
            NetError::RemoteClosed.kind(),
            embedded_io::ErrorKind::ConnectionReset
        );
    }
}

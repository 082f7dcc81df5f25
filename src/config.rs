#![deny(unsafe_code)]
#![deny(warnings)]
//! Configuration structures

/// Tuning for the connection-oriented client.
#[derive(Debug, Clone, Copy)]
pub struct TcpConfig {
    /// How long to sit still after a failed write before force-closing the
    /// socket, giving the co-processor time to settle. Blocks the control
    /// thread for the whole duration.
    pub write_failure_settle_ms: u32,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            write_failure_settle_ms: 4000,
        }
    }
}

/// Client certificate and private key handed to the co-processor before a
/// TLS connect.
///
/// Installed module-wide: a second identity overwrites the first for every
/// subsequent connection. No `Debug` impl, to keep key material out of log
/// output.
#[derive(Clone, Copy)]
pub struct TlsIdentity<'a> {
    /// Certificate in PEM form.
    pub certificate: &'a str,
    /// Private key in PEM form.
    pub private_key: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TcpConfig::default();
        assert_eq!(config.write_failure_settle_ms, 4000);
    }
}

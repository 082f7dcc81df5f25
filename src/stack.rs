#![deny(unsafe_code)]
#![deny(warnings)]
//! Shared driver and slot-pool handle
//!
//! One [`Stack`] wraps the co-processor driver together with the socket
//! slot pool. Clients borrow it and reach both through short exclusive
//! sections; the `RefCell` inside encodes the single-control-thread model
//! this crate assumes.

use core::cell::RefCell;

use crate::driver::SocketDriver;
use crate::socket::SocketPool;

pub struct Stack<D: SocketDriver> {
    shared: RefCell<Shared<D>>,
}

struct Shared<D> {
    driver: D,
    pool: SocketPool,
}

impl<D: SocketDriver> Stack<D> {
    pub fn new(driver: D) -> Self {
        Self {
            shared: RefCell::new(Shared {
                driver,
                pool: SocketPool::new(),
            }),
        }
    }

    /// Run `f` with exclusive access to the driver and the slot pool.
    ///
    /// Must not be re-entered from inside `f`.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut D, &mut SocketPool) -> R) -> R {
        let shared = &mut *self.shared.borrow_mut();
        f(&mut shared.driver, &mut shared.pool)
    }

    /// Run `f` with exclusive access to the raw driver, for co-processor
    /// operations that live outside the socket layer.
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        self.with(|driver, _| f(driver))
    }

    /// Install the module-wide TLS client certificate. The latest call
    /// wins, for every connection.
    pub fn set_certificate(&self, pem: &str) {
        self.with(|driver, _| driver.set_certificate(pem));
    }

    /// Install the module-wide TLS private key. The latest call wins, for
    /// every connection.
    pub fn set_private_key(&self, pem: &str) {
        self.with(|driver, _| driver.set_private_key(pem));
    }

    /// Number of socket slots currently unclaimed.
    pub fn free_sockets(&self) -> usize {
        self.with(|_, pool| pool.free_count())
    }

    /// Tear the stack apart, handing the driver back.
    pub fn into_driver(self) -> D {
        self.shared.into_inner().driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{Call, MockDriver};
    use crate::socket::SOCKET_COUNT;

    #[test]
    fn test_fresh_stack_has_all_slots_free() {
        let stack = Stack::new(MockDriver::new());
        assert_eq!(stack.free_sockets(), SOCKET_COUNT);
    }

    #[test]
    fn test_tls_identity_setters_reach_driver() {
        let stack = Stack::new(MockDriver::new());
        stack.set_certificate("CERT");
        stack.set_private_key("KEY");
        let driver = stack.into_driver();
        assert_eq!(driver.certificate.as_deref(), Some("CERT"));
        assert_eq!(driver.private_key.as_deref(), Some("KEY"));
        assert_eq!(driver.calls, vec![Call::SetCertificate, Call::SetPrivateKey]);
    }
}

//! Interface traits and implementations

mod spi;
pub use spi::*;

use core::sync::atomic::{fence, AtomicU32, Ordering};

/// Bus transport used by the transfer task queue.
///
/// Implementations frame nothing themselves: `data` is sent exactly as
/// given, after the opcode.
pub trait Interface {
    /// Error type
    type Error: core::fmt::Debug;

    /// Kind of interface
    const KIND: InterfaceKind;

    /// Opens a bus session (chip select asserted, transfer active).
    fn begin_session(&mut self) -> Result<(), Self::Error>;

    /// Closes the bus session after all pending bytes are on the wire.
    fn end_session(&mut self) -> Result<(), Self::Error>;

    /// Sends `opcode` in command mode followed by `data` in data mode.
    ///
    /// Returns once the transport has accepted the bytes, which is not
    /// necessarily once they have left the bus. Call [`flush`](Self::flush)
    /// to wait for the wire.
    fn transfer(&mut self, opcode: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Blocks until every accepted byte has been clocked out.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// The clock divisor shared with the transport.
    fn clock(&self) -> &BusClock;
}

impl<T: Interface + ?Sized> Interface for &mut T {
    type Error = T::Error;
    const KIND: InterfaceKind = T::KIND;

    fn begin_session(&mut self) -> Result<(), Self::Error> {
        T::begin_session(self)
    }

    fn end_session(&mut self) -> Result<(), Self::Error> {
        T::end_session(self)
    }

    fn transfer(&mut self, opcode: u8, data: &[u8]) -> Result<(), Self::Error> {
        T::transfer(self, opcode, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        T::flush(self)
    }

    fn clock(&self) -> &BusClock {
        T::clock(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InterfaceKind {
    Serial4Line,
}

/// Bus clock divisor shared between the driver and whoever schedules
/// transfers after bring-up.
///
/// Every write is surrounded by full memory fences, so a speed change is
/// never observed out of order with transfers issued around it.
#[derive(Debug)]
pub struct BusClock {
    divisor: AtomicU32,
}

impl BusClock {
    /// Creates a clock with the given divisor.
    pub const fn new(divisor: u32) -> Self {
        Self {
            divisor: AtomicU32::new(divisor),
        }
    }

    /// Current divisor.
    pub fn divisor(&self) -> u32 {
        self.divisor.load(Ordering::SeqCst)
    }

    /// Replaces the divisor.
    pub fn set_divisor(&self, divisor: u32) {
        fence(Ordering::SeqCst);
        self.divisor.store(divisor, Ordering::SeqCst);
        fence(Ordering::SeqCst);
    }
}

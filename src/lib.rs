#![no_std]

//! This crate brings up ILI9486 TFT panels attached over SPI and keeps the
//! transfer path open for whatever redraws the screen afterwards.
//!
//! ## Bring-up
//!
//! [`Builder::init`] walks the panel through reset, configuration at a
//! conservative bus clock, a full black clear and the switch to the operating
//! clock. Every transfer on the way goes through the [`task::TransferQueue`],
//! and the same queue is handed to the runtime engine through
//! [`Display::queue_mut`].
//!
//! ## Bezels
//!
//! Panels mounted in an enclosure that hides part of the screen report the
//! hidden edges through [`Display::bezel_margins`] and
//! [`Display::drawable_area`].
//!
//! ## Example
//!
//! ```
//! use ili9486_bezel::{models::Waveshare32b, options::Orientation, Builder};
//!
//! # let di = ili9486_bezel::_mock::MockDisplayInterface::new();
//! # let mut delay = ili9486_bezel::_mock::MockDelay;
//! # let rst = ili9486_bezel::_mock::MockOutputPin;
//! let mut display = Builder::new(Waveshare32b, di)
//!     .reset_pin(rst)
//!     .orientation(Orientation::new().landscape())
//!     .display_size(320, 240)
//!     .operating_divisor(6)
//!     .init(&mut delay)
//!     .unwrap();
//!
//! let area = display.drawable_area();
//! assert_eq!((area.size.width, area.size.height), (302, 202));
//!
//! display.show_raw_data(0, 0, 1, 0, &[0xFF; 4]).unwrap();
//! ```

use embedded_graphics_core::{geometry::Size, primitives::Rectangle};
use embedded_hal::{delay::DelayNs, digital::OutputPin};

pub mod dcs;
pub mod geometry;
pub mod interface;
pub mod models;
pub mod options;
pub mod task;

mod builder;
pub use builder::*;

use dcs::SetAddressMode;
use geometry::BezelMargins;
use models::Model;
use task::{RunError, TransferQueue, MAX_TRANSFER_SIZE};

/// Display driver structure, produced by [`Builder::init`].
pub struct Display<DI, MODEL, RST>
where
    DI: interface::Interface,
    MODEL: Model,
    RST: OutputPin,
{
    /// The display interface.
    di: DI,
    /// The display model instance.
    model: MODEL,
    /// The reset pin.
    rst: Option<RST>,
    /// Transfer tasks shared with the runtime engine.
    queue: TransferQueue,
    /// Display options.
    options: options::ModelOptions,
    /// MADCTL value set by init.
    madctl: SetAddressMode,
    /// Hidden edges.
    bezel: BezelMargins,
    /// Sleep state.
    sleeping: bool,
}

impl<DI, M, RST> Display<DI, M, RST>
where
    DI: interface::Interface,
    M: Model,
    RST: OutputPin,
{
    /// Returns the display orientation.
    pub fn orientation(&self) -> options::Orientation {
        self.options.orientation
    }

    /// Returns the resolved display options.
    pub fn options(&self) -> &options::ModelOptions {
        &self.options
    }

    /// Returns the MADCTL value set during bring-up.
    pub fn madctl(&self) -> SetAddressMode {
        self.madctl
    }

    /// Returns the pixels hidden by the bezel.
    pub fn bezel_margins(&self) -> BezelMargins {
        self.bezel
    }

    /// Returns the part of the display that is not hidden by the bezel.
    pub fn drawable_area(&self) -> Rectangle {
        let (width, height) = self.options.display_size;
        self.bezel
            .drawable_area(Size::new(u32::from(width), u32::from(height)))
    }

    /// Returns the transfer queue.
    pub fn queue(&self) -> &TransferQueue {
        &self.queue
    }

    /// Returns the interface and the transfer queue, for issuing transfers
    /// after bring-up.
    pub fn queue_mut(&mut self) -> (&mut DI, &mut TransferQueue) {
        (&mut self.di, &mut self.queue)
    }

    /// Sets the address window to `sx..=ex`, `sy..=ey`.
    pub fn set_address_window(
        &mut self,
        sx: u16,
        sy: u16,
        ex: u16,
        ey: u16,
    ) -> Result<(), RunError<DI::Error>> {
        M::update_address_window(&mut self.di, &mut self.queue, sx, sy, ex, ey)
    }

    /// Sends raw pixel data to the specified rectangular region of the display.
    ///
    /// Data longer than one transfer is split, the first part starts a memory
    /// write and the rest continue it.
    pub fn show_raw_data(
        &mut self,
        sx: u16,
        sy: u16,
        ex: u16,
        ey: u16,
        pixel_data: &[u8],
    ) -> Result<(), RunError<DI::Error>> {
        self.set_address_window(sx, sy, ex, ey)?;

        let mut opcode = dcs::WRITE_MEMORY_START;
        for chunk in pixel_data.chunks(MAX_TRANSFER_SIZE) {
            self.queue.submit_raw(&mut self.di, opcode, chunk)?;
            opcode = dcs::WRITE_MEMORY_CONTINUE;
        }
        Ok(())
    }

    /// Returns `true` if the display is currently in sleep mode.
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Puts the display into sleep mode.
    pub fn sleep<DLY: DelayNs>(&mut self, delay: &mut DLY) -> Result<(), RunError<DI::Error>> {
        M::sleep(&mut self.di, &mut self.queue, delay)?;
        self.sleeping = true;
        Ok(())
    }

    /// Wakes the display from sleep mode.
    pub fn wake<DLY: DelayNs>(&mut self, delay: &mut DLY) -> Result<(), RunError<DI::Error>> {
        M::wake(&mut self.di, &mut self.queue, delay)?;
        self.sleeping = false;
        Ok(())
    }

    /// Runs the model's teardown hook and releases the parts.
    ///
    /// The ILI9486 defines no deinitialization, the panel keeps showing its
    /// last frame. An overlapped session is left open.
    pub fn deinit(mut self) -> (DI, M, Option<RST>) {
        self.model.deinit();
        self.release()
    }

    /// Releases the display interface, model instance, and reset pin.
    pub fn release(self) -> (DI, M, Option<RST>) {
        (self.di, self.model, self.rst)
    }
}

/// Mock implementations of embedded-hal and interface traits.
///
/// Do not use types in this module outside of doc tests.
#[doc(hidden)]
pub mod _mock {
    use core::convert::Infallible;

    use embedded_hal::{delay::DelayNs, digital};

    use crate::interface::{BusClock, Interface, InterfaceKind};

    pub struct MockOutputPin;

    impl digital::OutputPin for MockOutputPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl digital::ErrorType for MockOutputPin {
        type Error = Infallible;
    }

    pub struct MockDelay;

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    pub struct MockDisplayInterface {
        clock: BusClock,
    }

    impl MockDisplayInterface {
        pub fn new() -> Self {
            Self {
                clock: BusClock::new(crate::options::DEFAULT_OPERATING_DIVISOR),
            }
        }
    }

    impl Default for MockDisplayInterface {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Interface for MockDisplayInterface {
        type Error = Infallible;

        const KIND: InterfaceKind = InterfaceKind::Serial4Line;

        fn begin_session(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn end_session(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn transfer(&mut self, _opcode: u8, _data: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn clock(&self) -> &BusClock {
            &self.clock
        }
    }

    /// Mocks that record everything they are asked to do.
    #[cfg(test)]
    pub(crate) mod recording {
        extern crate std;

        use core::{cell::RefCell, convert::Infallible};
        use std::vec::Vec;

        use embedded_hal::{delay::DelayNs, digital};

        use crate::interface::{BusClock, Interface, InterfaceKind};

        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Event {
            Begin,
            End,
            Flush,
            Transfer {
                opcode: u8,
                data: Vec<u8>,
                divisor: u32,
            },
            Pin(bool),
            Delay(u64),
        }

        impl Event {
            pub fn opcode(&self) -> Option<u8> {
                match self {
                    Self::Transfer { opcode, .. } => Some(*opcode),
                    _ => None,
                }
            }

            pub fn data(&self) -> Option<&[u8]> {
                match self {
                    Self::Transfer { data, .. } => Some(data.as_slice()),
                    _ => None,
                }
            }

            pub fn delay_ns(&self) -> Option<u64> {
                match self {
                    Self::Delay(ns) => Some(*ns),
                    _ => None,
                }
            }
        }

        #[derive(Default)]
        pub struct Recorder(RefCell<Vec<Event>>);

        impl Recorder {
            fn push(&self, event: Event) {
                self.0.borrow_mut().push(event);
            }

            pub fn take(&self) -> Vec<Event> {
                self.0.take()
            }
        }

        pub struct MockInterface<'r> {
            recorder: &'r Recorder,
            clock: &'r BusClock,
        }

        impl<'r> MockInterface<'r> {
            pub fn new(recorder: &'r Recorder, clock: &'r BusClock) -> Self {
                Self { recorder, clock }
            }
        }

        impl Interface for MockInterface<'_> {
            type Error = Infallible;

            const KIND: InterfaceKind = InterfaceKind::Serial4Line;

            fn begin_session(&mut self) -> Result<(), Self::Error> {
                self.recorder.push(Event::Begin);
                Ok(())
            }

            fn end_session(&mut self) -> Result<(), Self::Error> {
                self.recorder.push(Event::End);
                Ok(())
            }

            fn transfer(&mut self, opcode: u8, data: &[u8]) -> Result<(), Self::Error> {
                self.recorder.push(Event::Transfer {
                    opcode,
                    data: data.to_vec(),
                    divisor: self.clock.divisor(),
                });
                Ok(())
            }

            fn flush(&mut self) -> Result<(), Self::Error> {
                self.recorder.push(Event::Flush);
                Ok(())
            }

            fn clock(&self) -> &BusClock {
                self.clock
            }
        }

        /// Error of [`FailingInterface`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct BusFault;

        /// Records like [`MockInterface`], but its first `failures` transfers
        /// fail without reaching the recorder.
        pub struct FailingInterface<'r> {
            inner: MockInterface<'r>,
            failures: usize,
        }

        impl<'r> FailingInterface<'r> {
            pub fn new(recorder: &'r Recorder, clock: &'r BusClock, failures: usize) -> Self {
                Self {
                    inner: MockInterface::new(recorder, clock),
                    failures,
                }
            }
        }

        impl Interface for FailingInterface<'_> {
            type Error = BusFault;

            const KIND: InterfaceKind = InterfaceKind::Serial4Line;

            fn begin_session(&mut self) -> Result<(), Self::Error> {
                self.inner.begin_session().map_err(|e| match e {})
            }

            fn end_session(&mut self) -> Result<(), Self::Error> {
                self.inner.end_session().map_err(|e| match e {})
            }

            fn transfer(&mut self, opcode: u8, data: &[u8]) -> Result<(), Self::Error> {
                if self.failures > 0 {
                    self.failures -= 1;
                    return Err(BusFault);
                }
                self.inner.transfer(opcode, data).map_err(|e| match e {})
            }

            fn flush(&mut self) -> Result<(), Self::Error> {
                self.inner.flush().map_err(|e| match e {})
            }

            fn clock(&self) -> &BusClock {
                self.inner.clock()
            }
        }

        pub struct MockPin<'r>(&'r Recorder);

        impl<'r> MockPin<'r> {
            pub fn new(recorder: &'r Recorder) -> Self {
                Self(recorder)
            }
        }

        impl digital::ErrorType for MockPin<'_> {
            type Error = Infallible;
        }

        impl digital::OutputPin for MockPin<'_> {
            fn set_low(&mut self) -> Result<(), Self::Error> {
                self.0.push(Event::Pin(false));
                Ok(())
            }

            fn set_high(&mut self) -> Result<(), Self::Error> {
                self.0.push(Event::Pin(true));
                Ok(())
            }
        }

        pub struct MockDelay<'r>(&'r Recorder);

        impl<'r> MockDelay<'r> {
            pub fn new(recorder: &'r Recorder) -> Self {
                Self(recorder)
            }
        }

        impl DelayNs for MockDelay<'_> {
            fn delay_ns(&mut self, ns: u32) {
                self.0.push(Event::Delay(u64::from(ns)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use embedded_graphics::{
        pixelcolor::{raw::RawU16, Rgb565},
        prelude::*,
    };

    use crate::{
        _mock::recording::{Event, MockDelay, MockInterface, Recorder},
        interface::BusClock,
        models::{Waveshare32b, ILI9486},
        options::{Orientation, TransferMode},
    };

    use super::*;

    #[test]
    fn drawable_area_of_landscape_waveshare() {
        let recorder = Recorder::default();
        let clock = BusClock::new(6);
        let display = Builder::new(Waveshare32b, MockInterface::new(&recorder, &clock))
            .orientation(Orientation::new().landscape())
            .display_size(320, 240)
            .init(&mut MockDelay::new(&recorder))
            .unwrap();

        let area = display.drawable_area();
        assert_eq!(area, Rectangle::new(Point::new(18, 9), Size::new(302, 202)));
        assert!(!area.contains(Point::new(17, 9)));
        assert!(area.contains(Point::new(319, 210)));
        assert!(!area.contains(Point::new(319, 211)));
    }

    #[test]
    fn clear_rows_are_black() {
        let recorder = Recorder::default();
        let clock = BusClock::new(6);
        Builder::new(ILI9486, MockInterface::new(&recorder, &clock))
            .display_size(3, 2)
            .init(&mut MockDelay::new(&recorder))
            .unwrap();

        let black = RawU16::from(Rgb565::BLACK).into_inner().to_be_bytes();
        let rows: Vec<Vec<u8>> = recorder
            .take()
            .into_iter()
            .filter_map(|e| match e {
                Event::Transfer { opcode, data, .. } if opcode == dcs::WRITE_MEMORY_START => {
                    Some(data)
                }
                _ => None,
            })
            .collect();
        assert_eq!(rows, [black.repeat(3), black.repeat(3)]);
    }

    #[test]
    fn show_raw_data_splits_long_writes() {
        let recorder = Recorder::default();
        let clock = BusClock::new(6);
        let mut display = Builder::new(ILI9486, MockInterface::new(&recorder, &clock))
            .init(&mut MockDelay::new(&recorder))
            .unwrap();
        recorder.take();

        let data = [0xAB; MAX_TRANSFER_SIZE + 10];
        display.show_raw_data(0, 0, 319, 4, &data).unwrap();

        let sent: Vec<(u8, usize)> = recorder
            .take()
            .iter()
            .filter_map(|e| Some((e.opcode()?, e.data()?.len())))
            .collect();
        assert_eq!(
            sent,
            [
                (dcs::SET_COLUMN_ADDRESS, 8),
                (dcs::SET_PAGE_ADDRESS, 8),
                (dcs::WRITE_MEMORY_START, MAX_TRANSFER_SIZE),
                (dcs::WRITE_MEMORY_CONTINUE, 10),
            ]
        );
    }

    #[test]
    fn sleep_and_wake_track_state() {
        let recorder = Recorder::default();
        let clock = BusClock::new(6);
        let mut delay = MockDelay::new(&recorder);
        let mut display = Builder::new(ILI9486, MockInterface::new(&recorder, &clock))
            .display_size(4, 4)
            .init(&mut delay)
            .unwrap();
        recorder.take();

        display.sleep(&mut delay).unwrap();
        assert!(display.is_sleeping());
        display.wake(&mut delay).unwrap();
        assert!(!display.is_sleeping());

        let opcodes: Vec<u8> = recorder.take().iter().filter_map(Event::opcode).collect();
        assert_eq!(opcodes, [dcs::ENTER_SLEEP_MODE, dcs::EXIT_SLEEP_MODE]);
    }

    #[test]
    fn runtime_engine_reuses_the_queue_after_bring_up() {
        let recorder = Recorder::default();
        let clock = BusClock::new(6);
        let mut display = Builder::new(ILI9486, MockInterface::new(&recorder, &clock))
            .transfer_mode(TransferMode::Overlapped)
            .operating_divisor(3)
            .display_size(4, 4)
            .init(&mut MockDelay::new(&recorder))
            .unwrap();
        recorder.take();

        let (di, queue) = display.queue_mut();
        let task = queue.allocate(2).unwrap();
        queue.write(task, &[0x12, 0x34]).unwrap();
        queue.commit(task, dcs::WRITE_MEMORY_START).unwrap();
        queue.run(di, task).unwrap();
        queue.done(task).unwrap();
        queue.close_session(di).unwrap();

        assert_eq!(
            recorder.take(),
            [
                Event::Transfer {
                    opcode: dcs::WRITE_MEMORY_START,
                    data: std::vec![0x12, 0x34],
                    divisor: 3,
                },
                Event::End,
            ]
        );
    }

    #[test]
    fn deinit_returns_parts_without_bus_activity() {
        let recorder = Recorder::default();
        let clock = BusClock::new(6);
        let display = Builder::new(ILI9486, MockInterface::new(&recorder, &clock))
            .display_size(4, 4)
            .init(&mut MockDelay::new(&recorder))
            .unwrap();
        recorder.take();

        let (_di, _model, rst) = display.deinit();
        assert!(rst.is_none());
        assert!(recorder.take().is_empty());
    }
}

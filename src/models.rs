//! Display models.

use embedded_hal::delay::DelayNs;

use crate::{
    dcs::{self, CommandFrame, SetAddressMode},
    geometry::BezelMargins,
    interface::Interface,
    options::{ModelOptions, Orientation},
    task::{RunError, TaskError, TransferQueue},
    ConfigurationError,
};

mod ili9486;
mod waveshare32b;

pub use ili9486::*;
pub use waveshare32b::*;

/// Display model.
pub trait Model {
    /// The framebuffer size in pixels, in the controller's native portrait
    /// orientation.
    const FRAMEBUFFER_SIZE: (u16, u16);

    /// Dwell after each reset pin edge in µs.
    const RESET_DURATION: u32 = 120_000;

    /// Pixels hidden by the enclosure for the given orientation.
    fn bezel_margins(_orientation: &Orientation) -> BezelMargins {
        BezelMargins::NONE
    }

    /// Sends the configuration command sequence, ending with display on,
    /// and returns the MADCTL value it set.
    ///
    /// Called with the bus clock already lowered to the bring-up divisor.
    fn init<DELAY, DI>(
        &mut self,
        di: &mut DI,
        queue: &mut TransferQueue,
        delay: &mut DELAY,
        options: &ModelOptions,
    ) -> Result<SetAddressMode, ModelInitError<DI::Error>>
    where
        DELAY: DelayNs,
        DI: Interface;

    /// Teardown hook. This controller family defines no deinitialization.
    fn deinit(&mut self) {}

    /// Updates the address window of the display.
    fn update_address_window<DI>(
        di: &mut DI,
        queue: &mut TransferQueue,
        sx: u16,
        sy: u16,
        ex: u16,
        ey: u16,
    ) -> Result<(), RunError<DI::Error>>
    where
        DI: Interface,
    {
        let columns = dcs::address_params(sx, ex);
        queue.submit(di, CommandFrame::new(dcs::SET_COLUMN_ADDRESS, &columns))?;
        let rows = dcs::address_params(sy, ey);
        queue.submit(di, CommandFrame::new(dcs::SET_PAGE_ADDRESS, &rows))
    }

    ///
    /// Need to call [Self::wake] before issuing other commands
    ///
    fn sleep<DI, DELAY>(
        di: &mut DI,
        queue: &mut TransferQueue,
        delay: &mut DELAY,
    ) -> Result<(), RunError<DI::Error>>
    where
        DI: Interface,
        DELAY: DelayNs,
    {
        queue.submit(di, CommandFrame::bare(dcs::ENTER_SLEEP_MODE))?;
        delay.delay_us(120_000);
        Ok(())
    }

    ///
    /// Wakes the display after it's been set to sleep via [Self::sleep]
    ///
    fn wake<DI, DELAY>(
        di: &mut DI,
        queue: &mut TransferQueue,
        delay: &mut DELAY,
    ) -> Result<(), RunError<DI::Error>>
    where
        DI: Interface,
        DELAY: DelayNs,
    {
        queue.submit(di, CommandFrame::bare(dcs::EXIT_SLEEP_MODE))?;
        delay.delay_us(120_000);
        Ok(())
    }
}

/// Error returned by [`Model::init`].
///
/// This error type is used internally by implementations of the [`Model`]
/// trait.
#[derive(Debug)]
pub enum ModelInitError<DiError> {
    /// Error caused by the display interface.
    Interface(DiError),

    /// Transfer task contract violation.
    Task(TaskError),

    /// Invalid configuration error.
    InvalidConfiguration(ConfigurationError),
}

impl<DiError> From<RunError<DiError>> for ModelInitError<DiError> {
    fn from(value: RunError<DiError>) -> Self {
        match value {
            RunError::Interface(e) => Self::Interface(e),
            RunError::Task(e) => Self::Task(e),
        }
    }
}

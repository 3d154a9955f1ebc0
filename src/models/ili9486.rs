use embedded_hal::delay::DelayNs;

use crate::{
    dcs::{self, CommandFrame, SetAddressMode},
    interface::Interface,
    models::{Model, ModelInitError},
    options::ModelOptions,
    task::TransferQueue,
};

/// ILI9486 display without an enclosure.
#[derive(Debug, Default, Clone, Copy)]
pub struct ILI9486;

impl Model for ILI9486 {
    const FRAMEBUFFER_SIZE: (u16, u16) = (320, 480);

    fn init<DELAY, DI>(
        &mut self,
        di: &mut DI,
        queue: &mut TransferQueue,
        delay: &mut DELAY,
        options: &ModelOptions,
    ) -> Result<SetAddressMode, ModelInitError<DI::Error>>
    where
        DELAY: DelayNs,
        DI: Interface,
    {
        init_common(di, queue, delay, options)
    }
}

/// Common init for all ILI9486 panels.
pub(crate) fn init_common<DELAY, DI>(
    di: &mut DI,
    queue: &mut TransferQueue,
    delay: &mut DELAY,
    options: &ModelOptions,
) -> Result<SetAddressMode, ModelInitError<DI::Error>>
where
    DELAY: DelayNs,
    DI: Interface,
{
    // DE high enable, PCLK rising edge, HSYNC/VSYNC low level sync
    queue.submit(di, CommandFrame::new(dcs::INTERFACE_MODE_CONTROL, &[0x00]))?;

    queue.submit(di, CommandFrame::bare(dcs::EXIT_SLEEP_MODE))?;
    delay.delay_us(120_000);

    let pixel_format = [options.pixel_format.parameter()];
    queue.submit(di, CommandFrame::new(dcs::SET_PIXEL_FORMAT, &pixel_format))?;
    queue.submit(di, CommandFrame::bare(dcs::ENTER_INVERT_MODE))?;
    queue.submit(di, CommandFrame::new(dcs::POWER_CONTROL_1, &[0x09, 0x09]))?;
    queue.submit(di, CommandFrame::new(dcs::POWER_CONTROL_2, &[0x41, 0x00]))?;
    queue.submit(di, CommandFrame::new(dcs::VCOM_CONTROL, &[0x00, 0x36]))?;

    let madctl = SetAddressMode::from(&options.orientation);
    queue.submit(di, CommandFrame::new(dcs::SET_ADDRESS_MODE, &[madctl.bits()]))?;

    queue.submit(
        di,
        CommandFrame::new(dcs::POSITIVE_GAMMA_CONTROL, &dcs::POSITIVE_GAMMA),
    )?;
    queue.submit(
        di,
        CommandFrame::new(dcs::NEGATIVE_GAMMA_CONTROL, &dcs::NEGATIVE_GAMMA),
    )?;

    queue.submit(di, CommandFrame::bare(dcs::EXIT_SLEEP_MODE))?;
    delay.delay_us(120_000);

    queue.submit(di, CommandFrame::bare(dcs::SET_DISPLAY_ON))?;

    Ok(madctl)
}

use embedded_hal::delay::DelayNs;

use crate::{
    dcs::SetAddressMode,
    geometry::{self, BezelMargins},
    interface::Interface,
    models::{ili9486::init_common, Model, ModelInitError},
    options::{ModelOptions, Orientation},
    task::TransferQueue,
};

/// Waveshare 3.2" ILI9486 panel in a FreePlayTech CM3/Zero enclosure.
///
/// The enclosure was made for a 2.8" screen, so the bezel hides part of the
/// 3.2" panel. See [`geometry::resolve`] for which edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct Waveshare32b;

impl Model for Waveshare32b {
    const FRAMEBUFFER_SIZE: (u16, u16) = (320, 480);

    fn bezel_margins(orientation: &Orientation) -> BezelMargins {
        geometry::resolve(orientation)
    }

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

//! [super::Display] builder module

use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
};

use crate::{
    dcs::{self, CommandFrame},
    interface::Interface,
    models::{Model, ModelInitError},
    options::{ModelOptions, Orientation, PixelFormat, TransferMode, BRING_UP_DIVISOR},
    task::{RunError, TaskError, TransferQueue, MAX_TRANSFER_SIZE},
    Display,
};

/// Builder for [Display] instances.
///
/// Exposes all possible display options.
///
/// # Examples
///
/// ```
/// use ili9486_bezel::{Builder, models::Waveshare32b, options::Orientation};
///
/// # let di = ili9486_bezel::_mock::MockDisplayInterface::new();
/// # let mut delay = ili9486_bezel::_mock::MockDelay;
/// let display = Builder::new(Waveshare32b, di)
///     .orientation(Orientation::new().landscape())
///     .display_size(320, 240)
///     .init(&mut delay)
///     .unwrap();
/// ```
pub struct Builder<DI, MODEL, RST>
where
    DI: Interface,
    MODEL: Model,
{
    di: DI,
    model: MODEL,
    rst: Option<RST>,
    options: ModelOptions,
    display_size: Option<(u16, u16)>,
}

impl<DI, MODEL> Builder<DI, MODEL, NoResetPin>
where
    DI: Interface,
    MODEL: Model,
{
    ///
    /// Constructs a new builder for given [Model].
    ///
    #[must_use]
    pub fn new(model: MODEL, di: DI) -> Self {
        Self {
            di,
            model,
            rst: None,
            options: ModelOptions::full_size::<MODEL>(),
            display_size: None,
        }
    }
}

impl<DI, MODEL, RST> Builder<DI, MODEL, RST>
where
    DI: Interface,
    MODEL: Model,
    RST: OutputPin,
{
    ///
    /// Sets the orientation. Defaults to portrait.
    ///
    #[must_use]
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    ///
    /// Sets the interface pixel format. Defaults to 16 bits per pixel.
    ///
    #[must_use]
    pub fn pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.options.pixel_format = pixel_format;
        self
    }

    ///
    /// Sets how transfer tasks use the bus session.
    ///
    #[must_use]
    pub fn transfer_mode(mut self, transfer_mode: TransferMode) -> Self {
        self.options.transfer_mode = transfer_mode;
        self
    }

    ///
    /// Sets the bus clock divisor used once bring-up is complete.
    ///
    #[must_use]
    pub fn operating_divisor(mut self, divisor: u32) -> Self {
        self.options.operating_divisor = divisor;
        self
    }

    ///
    /// Sets the display size in the configured orientation.
    ///
    /// Defaults to the model's framebuffer size as addressed in that
    /// orientation.
    ///
    #[must_use]
    pub fn display_size(mut self, width: u16, height: u16) -> Self {
        self.display_size = Some((width, height));
        self
    }

    ///
    /// Sets the reset pin.
    ///
    /// ### WARNING
    /// The reset pin needs to be in *high* state in order for the display to operate.
    /// If it wasn't provided the user needs to ensure this is the case.
    ///
    #[must_use]
    pub fn reset_pin<RST2: OutputPin>(self, rst: RST2) -> Builder<DI, MODEL, RST2> {
        Builder {
            di: self.di,
            model: self.model,
            rst: Some(rst),
            options: self.options,
            display_size: self.display_size,
        }
    }

    ///
    /// Brings the panel up and consumes the builder.
    ///
    /// Walks power on, optional reset, configuration at the bring-up clock
    /// divisor, a full black clear and finally the switch to the operating
    /// divisor. A failure part way through leaves the panel in an
    /// unspecified state.
    ///
    pub fn init(
        mut self,
        delay_source: &mut impl DelayNs,
    ) -> Result<Display<DI, MODEL, RST>, InitError<DI::Error, RST::Error>> {
        let mut sequencer = Sequencer::default();

        let display_size = self
            .display_size
            .unwrap_or_else(|| self.options.oriented_framebuffer::<MODEL>());
        self.options.display_size = display_size;
        let bezel = MODEL::bezel_margins(&self.options.orientation);
        validate::<MODEL>(&self.options, &bezel)?;

        let mut queue = TransferQueue::new(self.options.transfer_mode);

        if let Some(ref mut rst_pin) = self.rst {
            sequencer.enter(BringUpState::Reset);
            log::info!("resetting display");
            rst_pin.set_high().map_err(InitError::ResetPin)?;
            delay_source.delay_us(MODEL::RESET_DURATION);
            rst_pin.set_low().map_err(InitError::ResetPin)?;
            delay_source.delay_us(MODEL::RESET_DURATION);
            rst_pin.set_high().map_err(InitError::ResetPin)?;
            delay_source.delay_us(MODEL::RESET_DURATION);
        }

        sequencer.enter(BringUpState::LowSpeedConfig);
        self.di.clock().set_divisor(BRING_UP_DIVISOR);

        sequencer.enter(BringUpState::CommandSequence);
        let madctl = self
            .model
            .init(&mut self.di, &mut queue, delay_source, &self.options)?;

        sequencer.enter(BringUpState::ScreenClear);
        clear_screen::<_, MODEL>(&mut self.di, &mut queue, &self.options)?;

        sequencer.enter(BringUpState::OperatingSpeed);
        self.di.clock().set_divisor(self.options.operating_divisor);

        sequencer.enter(BringUpState::Ready);
        log::info!(
            "display ready: {}x{}, divisor {}",
            self.options.width(),
            self.options.height(),
            self.options.operating_divisor
        );

        Ok(Display {
            di: self.di,
            model: self.model,
            rst: self.rst,
            queue,
            options: self.options,
            madctl,
            bezel,
            sleeping: false,
        })
    }
}

fn validate<MODEL: Model>(
    options: &ModelOptions,
    bezel: &crate::geometry::BezelMargins,
) -> Result<(), ConfigurationError> {
    let (width, height) = options.display_size;
    let (max_width, max_height) = options.oriented_framebuffer::<MODEL>();

    if width == 0 || height == 0 || width > max_width || height > max_height {
        return Err(ConfigurationError::InvalidDisplaySize);
    }
    if !bezel.fits(width, height) {
        return Err(ConfigurationError::BezelExceedsPanel);
    }
    if options.row_bytes() > MAX_TRANSFER_SIZE {
        return Err(ConfigurationError::RowExceedsTransferSize);
    }
    if options.operating_divisor == 0 {
        return Err(ConfigurationError::InvalidDivisor);
    }
    Ok(())
}

/// Clears the whole panel to black, one row per task, and leaves the address
/// window spanning the full panel.
fn clear_screen<DI, MODEL>(
    di: &mut DI,
    queue: &mut TransferQueue,
    options: &ModelOptions,
) -> Result<(), RunError<DI::Error>>
where
    DI: Interface,
    MODEL: Model,
{
    let last_column = options.width() - 1;
    let last_row = options.height() - 1;
    let columns = dcs::address_params(0, last_column);

    for y in 0..options.height() {
        queue.submit(di, CommandFrame::new(dcs::SET_COLUMN_ADDRESS, &columns))?;
        let rows = dcs::address_params(y, y);
        queue.submit(di, CommandFrame::new(dcs::SET_PAGE_ADDRESS, &rows))?;

        let line = queue.allocate(options.row_bytes())?;
        queue.fill(line, 0x00)?;
        queue.commit(line, dcs::WRITE_MEMORY_START)?;
        queue.run(di, line)?;
        queue.done(line)?;
    }

    MODEL::update_address_window(di, queue, 0, 0, last_column, last_row)
}

/// Bring-up phases, strictly in declaration order.
///
/// [`Reset`](Self::Reset) is skipped when no reset pin is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BringUpState {
    #[default]
    PowerOn,
    Reset,
    LowSpeedConfig,
    CommandSequence,
    ScreenClear,
    OperatingSpeed,
    Ready,
}

impl BringUpState {
    /// Returns `true` if `self` may directly follow `previous`.
    pub fn follows(self, previous: Self) -> bool {
        match (previous, self) {
            (Self::PowerOn, Self::Reset | Self::LowSpeedConfig) => true,
            (Self::Reset, Self::LowSpeedConfig) => true,
            (Self::LowSpeedConfig, Self::CommandSequence) => true,
            (Self::CommandSequence, Self::ScreenClear) => true,
            (Self::ScreenClear, Self::OperatingSpeed) => true,
            (Self::OperatingSpeed, Self::Ready) => true,
            _ => false,
        }
    }
}

#[derive(Default)]
struct Sequencer {
    state: BringUpState,
}

impl Sequencer {
    fn enter(&mut self, next: BringUpState) {
        debug_assert!(
            next.follows(self.state),
            "{:?} cannot follow {:?}",
            next,
            self.state
        );
        log::debug!("bring-up: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Error returned by [`Builder::init`].
#[derive(Debug)]
pub enum InitError<DIError, PinError> {
    /// Error caused by the display interface.
    Interface(DIError),

    /// Error caused by the reset pin's
    /// [`OutputPin`](embedded_hal::digital::OutputPin) implementation.
    ResetPin(PinError),

    /// Transfer task contract violation.
    Task(TaskError),

    /// Invalid configuration error.
    ///
    /// This error is returned when the configuration passed to the builder is
    /// invalid, for example a display size larger than the framebuffer.
    InvalidConfiguration(ConfigurationError),
}

/// Specifics of [InitError::InvalidConfiguration] if configuration was found invalid
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Display size is zero or larger than the framebuffer in this orientation.
    InvalidDisplaySize,
    /// The bezel margins leave nothing of the panel visible.
    BezelExceedsPanel,
    /// One display row does not fit in a single transfer task.
    RowExceedsTransferSize,
    /// The operating clock divisor is zero.
    InvalidDivisor,
}

impl<DIError, PinError> From<ConfigurationError> for InitError<DIError, PinError> {
    fn from(value: ConfigurationError) -> Self {
        Self::InvalidConfiguration(value)
    }
}

impl<DIError, PinError> From<ModelInitError<DIError>> for InitError<DIError, PinError> {
    fn from(value: ModelInitError<DIError>) -> Self {
        match value {
            ModelInitError::Interface(e) => Self::Interface(e),
            ModelInitError::Task(e) => Self::Task(e),
            ModelInitError::InvalidConfiguration(ce) => Self::InvalidConfiguration(ce),
        }
    }
}

impl<DIError, PinError> From<RunError<DIError>> for InitError<DIError, PinError> {
    fn from(value: RunError<DIError>) -> Self {
        match value {
            RunError::Interface(e) => Self::Interface(e),
            RunError::Task(e) => Self::Task(e),
        }
    }
}

/// Marker type for no reset pin.
pub enum NoResetPin {}

impl digital::OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl digital::ErrorType for NoResetPin {
    type Error = core::convert::Infallible;
}

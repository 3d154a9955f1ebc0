//! [ModelOptions] and other helper types.
//!
//! Everything in here is resolved once by the [`Builder`](crate::Builder)
//! and stays immutable for the lifetime of the [`Display`](crate::Display).

use crate::models::Model;

/// Clock divisor used while the controller is being configured.
///
/// Low enough that the configuration commands latch even when the operating
/// divisor is too aggressive for the panel.
pub const BRING_UP_DIVISOR: u32 = 34;

/// Operating clock divisor used when none is configured.
pub const DEFAULT_OPERATING_DIVISOR: u32 = 6;

/// Display orientation.
///
/// The controller can exchange rows and columns itself, or the 90 degree
/// transform can be left to software post-processing. Exactly one of the two
/// happens for landscape output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    /// Landscape output requested.
    pub landscape: bool,
    /// The X/Y flip is performed in software instead of by the controller.
    pub software_flip: bool,
    /// Rotate the output by 180 degrees.
    pub rotate_180: bool,
}

impl Orientation {
    /// Portrait orientation, no flip, no rotation.
    pub const fn new() -> Self {
        Self {
            landscape: false,
            software_flip: false,
            rotate_180: false,
        }
    }

    /// Requests landscape output.
    #[must_use]
    pub const fn landscape(self) -> Self {
        Self {
            landscape: true,
            ..self
        }
    }

    /// Leaves the X/Y flip to software.
    #[must_use]
    pub const fn software_flip(self) -> Self {
        Self {
            software_flip: true,
            ..self
        }
    }

    /// Rotates the output by 180 degrees.
    #[must_use]
    pub const fn rotate_180(self) -> Self {
        Self {
            rotate_180: true,
            ..self
        }
    }

    /// Returns `true` if the controller itself must exchange rows and columns.
    pub const fn hardware_exchange(&self) -> bool {
        self.landscape && !self.software_flip
    }
}

/// Interface pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 16 bits per pixel (RGB565).
    #[default]
    Bpp16,
    /// 18 bits per pixel, sent as 3 bytes.
    Bpp18,
}

impl PixelFormat {
    /// Bytes sent on the wire per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bpp16 => 2,
            Self::Bpp18 => 3,
        }
    }

    /// Parameter of the interface pixel format command, same value for the
    /// DPI and DBI halves.
    pub const fn parameter(self) -> u8 {
        match self {
            Self::Bpp16 => 0x55,
            Self::Bpp18 => 0x66,
        }
    }
}

/// How transfer tasks use the bus session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Every task is bracketed by its own session begin/end.
    #[default]
    Synchronous,
    /// The session stays open across consecutive tasks (DMA style).
    Overlapped,
}

/// [ModelOptions] are passed to the [`init`](Model::init) method of [Model]
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct ModelOptions {
    /// Display orientation.
    pub orientation: Orientation,
    /// Interface pixel format.
    pub pixel_format: PixelFormat,
    /// Bus session handling of transfer tasks.
    pub transfer_mode: TransferMode,
    /// Clock divisor restored after bring-up.
    pub operating_divisor: u32,
    /// Logical display size in pixels (width, height).
    pub display_size: (u16, u16),
}

impl ModelOptions {
    /// Creates model options for the entire framebuffer in the default
    /// portrait orientation.
    pub fn full_size<M: Model>() -> Self {
        Self {
            orientation: Orientation::default(),
            pixel_format: PixelFormat::default(),
            transfer_mode: TransferMode::default(),
            operating_divisor: DEFAULT_OPERATING_DIVISOR,
            display_size: M::FRAMEBUFFER_SIZE,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u16 {
        self.display_size.0
    }

    /// Height in pixels.
    pub fn height(&self) -> u16 {
        self.display_size.1
    }

    /// Number of payload bytes in one full display row.
    pub fn row_bytes(&self) -> usize {
        usize::from(self.width()) * self.pixel_format.bytes_per_pixel()
    }

    /// Framebuffer size of the model as addressed by the controller in the
    /// configured orientation.
    pub(crate) fn oriented_framebuffer<M: Model>(&self) -> (u16, u16) {
        let (w, h) = M::FRAMEBUFFER_SIZE;
        if self.orientation.hardware_exchange() {
            (h, w)
        } else {
            (w, h)
        }
    }
}

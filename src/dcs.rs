//! ILI9486 command set and wire framing.
//!
//! The controller sits behind a 16 bit wide shift register, so every
//! parameter byte travels as a `0x00` padding byte followed by the payload
//! byte. Pixel data written with [`WRITE_MEMORY_START`] is sent unframed.

use crate::options::Orientation;

/// Sleep Out.
pub const EXIT_SLEEP_MODE: u8 = 0x11;
/// Sleep In.
pub const ENTER_SLEEP_MODE: u8 = 0x10;
/// Display Inversion ON.
pub const ENTER_INVERT_MODE: u8 = 0x21;
/// Display ON.
pub const SET_DISPLAY_ON: u8 = 0x29;
/// Column Address Set.
pub const SET_COLUMN_ADDRESS: u8 = 0x2A;
/// Page (row) Address Set.
pub const SET_PAGE_ADDRESS: u8 = 0x2B;
/// Memory Write.
pub const WRITE_MEMORY_START: u8 = 0x2C;
/// Memory Write Continue.
pub const WRITE_MEMORY_CONTINUE: u8 = 0x3C;
/// Memory Access Control (MADCTL).
pub const SET_ADDRESS_MODE: u8 = 0x36;
/// Interface Pixel Format.
pub const SET_PIXEL_FORMAT: u8 = 0x3A;
/// Interface Mode Control.
pub const INTERFACE_MODE_CONTROL: u8 = 0xB0;
/// Power Control 1.
pub const POWER_CONTROL_1: u8 = 0xC0;
/// Power Control 2.
pub const POWER_CONTROL_2: u8 = 0xC1;
/// VCOM Control.
pub const VCOM_CONTROL: u8 = 0xC5;
/// Positive Gamma Control.
pub const POSITIVE_GAMMA_CONTROL: u8 = 0xE0;
/// Negative Gamma Control.
pub const NEGATIVE_GAMMA_CONTROL: u8 = 0xE1;

/// Positive gamma table of the panel.
pub const POSITIVE_GAMMA: [u8; 15] = [
    0x00, 0x2C, 0x2C, 0x0B, 0x0C, 0x04, 0x4C, 0x64, 0x36, 0x03, 0x0E, 0x01, 0x10, 0x01, 0x00,
];

/// Negative gamma table of the panel.
pub const NEGATIVE_GAMMA: [u8; 15] = [
    0x0F, 0x37, 0x37, 0x0C, 0x0F, 0x05, 0x50, 0x32, 0x36, 0x04, 0x0B, 0x00, 0x19, 0x14, 0x0F,
];

/// A controller opcode with its unframed parameter bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame<'a> {
    /// Opcode.
    pub opcode: u8,
    /// Parameter bytes before framing.
    pub params: &'a [u8],
}

impl<'a> CommandFrame<'a> {
    /// Creates a frame.
    pub const fn new(opcode: u8, params: &'a [u8]) -> Self {
        Self { opcode, params }
    }

    /// Creates a frame without parameters.
    pub const fn bare(opcode: u8) -> Self {
        Self { opcode, params: &[] }
    }

    /// Number of bytes on the wire after framing.
    pub const fn framed_len(&self) -> usize {
        self.params.len() * 2
    }

    /// Iterates over the framed parameter bytes.
    pub fn framed(&self) -> impl Iterator<Item = u8> + 'a {
        let params = self.params;
        params.iter().flat_map(|&b| [0x00, b])
    }
}

/// Parameters of a column or page address command for the inclusive range
/// `start..=end`.
pub const fn address_params(start: u16, end: u16) -> [u8; 4] {
    let [sh, sl] = start.to_be_bytes();
    let [eh, el] = end.to_be_bytes();
    [sh, sl, eh, el]
}

/// Memory Access Control register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetAddressMode(u8);

impl SetAddressMode {
    /// BGR channel order. The panel is wired BGR, so this is always set.
    pub const BGR: u8 = 1 << 3;
    /// Row/column exchange.
    pub const ROW_COLUMN_EXCHANGE: u8 = 1 << 5;
    /// Column address order swap.
    pub const COLUMN_ADDRESS_ORDER: u8 = 1 << 6;
    /// Row address order swap.
    pub const ROW_ADDRESS_ORDER: u8 = 1 << 7;
    /// Both address orders swapped, which rotates the output by 180 degrees.
    pub const ROTATE_180: u8 = Self::COLUMN_ADDRESS_ORDER | Self::ROW_ADDRESS_ORDER;

    /// Composes the register value for an orientation.
    pub const fn new(orientation: &Orientation) -> Self {
        let mut madctl = Self::BGR;
        if orientation.rotate_180 {
            madctl |= Self::ROTATE_180;
        }
        if orientation.hardware_exchange() {
            madctl |= Self::ROW_COLUMN_EXCHANGE;
        }
        Self(madctl)
    }

    /// The raw register byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if the given bits are all set.
    pub const fn contains(self, bits: u8) -> bool {
        self.0 & bits == bits
    }
}

impl From<&Orientation> for SetAddressMode {
    fn from(orientation: &Orientation) -> Self {
        Self::new(orientation)
    }
}

impl From<SetAddressMode> for u8 {
    fn from(madctl: SetAddressMode) -> Self {
        madctl.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_pad_every_parameter() {
        let frame = CommandFrame::new(SET_PIXEL_FORMAT, &[0x55]);
        let mut out = [0u8; 2];
        for (slot, b) in out.iter_mut().zip(frame.framed()) {
            *slot = b;
        }
        assert_eq!(frame.framed_len(), 2);
        assert_eq!(out, [0x00, 0x55]);
        assert_eq!(CommandFrame::bare(SET_DISPLAY_ON).framed().count(), 0);
    }

    #[test]
    fn address_params_are_big_endian() {
        assert_eq!(address_params(0, 319), [0x00, 0x00, 0x01, 0x3F]);
        assert_eq!(address_params(0x0102, 0x0102), [0x01, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn madctl_bits_follow_orientation() {
        for landscape in [false, true] {
            for software_flip in [false, true] {
                for rotate_180 in [false, true] {
                    let orientation = Orientation {
                        landscape,
                        software_flip,
                        rotate_180,
                    };
                    let madctl = SetAddressMode::new(&orientation);

                    assert!(madctl.contains(SetAddressMode::BGR));
                    assert_eq!(madctl.contains(SetAddressMode::ROTATE_180), rotate_180);
                    assert_eq!(
                        madctl.contains(SetAddressMode::ROW_COLUMN_EXCHANGE),
                        landscape && !software_flip
                    );
                }
            }
        }
    }

    #[test]
    fn portrait_madctl_is_bgr_only() {
        assert_eq!(SetAddressMode::new(&Orientation::new()).bits(), 0x08);
        assert_eq!(
            u8::from(SetAddressMode::new(&Orientation::new().landscape().rotate_180())),
            0xE8
        );
    }
}

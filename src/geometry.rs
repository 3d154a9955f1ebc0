//! Bezel occlusion geometry.

use embedded_graphics_core::{
    geometry::{Point, Size},
    primitives::Rectangle,
};

use crate::options::Orientation;

/// Pixels hidden by the enclosure along each edge of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BezelMargins {
    /// Hidden rows at the top edge.
    pub top: u16,
    /// Hidden columns at the left edge.
    pub left: u16,
    /// Hidden columns at the right edge.
    pub right: u16,
    /// Hidden rows at the bottom edge.
    pub bottom: u16,
}

impl BezelMargins {
    /// Nothing is occluded.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    /// Creates margins in `top, left, right, bottom` order.
    pub const fn new(top: u16, left: u16, right: u16, bottom: u16) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
        }
    }

    /// Returns `true` if some part of a `width` x `height` panel stays visible.
    pub const fn fits(&self, width: u16, height: u16) -> bool {
        (self.left as u32 + self.right as u32) < width as u32
            && (self.top as u32 + self.bottom as u32) < height as u32
    }

    /// The visible part of a panel of the given size.
    ///
    /// Returns a zero sized rectangle if the margins cover the whole panel.
    pub fn drawable_area(&self, size: Size) -> Rectangle {
        let width = size
            .width
            .saturating_sub(u32::from(self.left) + u32::from(self.right));
        let height = size
            .height
            .saturating_sub(u32::from(self.top) + u32::from(self.bottom));

        Rectangle::new(
            Point::new(i32::from(self.left), i32::from(self.top)),
            Size::new(width, height),
        )
    }
}

/// Resolves the bezel margins of the FreePlayTech Waveshare 3.2" enclosure.
///
/// The bezel covers fixed physical edges. When the controller exchanges rows
/// and columns those edges show up as left/top/bottom of the logical frame,
/// otherwise (portrait, or landscape flipped in software) they are
/// top/left/right.
pub const fn resolve(orientation: &Orientation) -> BezelMargins {
    if orientation.hardware_exchange() {
        BezelMargins::new(9, 18, 0, 29)
    } else {
        BezelMargins::new(18, 9, 29, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flag_combination_maps_to_one_of_two_tuples() {
        for landscape in [false, true] {
            for software_flip in [false, true] {
                for rotate_180 in [false, true] {
                    let orientation = Orientation {
                        landscape,
                        software_flip,
                        rotate_180,
                    };
                    let expected = if software_flip || !landscape {
                        BezelMargins::new(18, 9, 29, 0)
                    } else {
                        BezelMargins::new(9, 18, 0, 29)
                    };
                    assert_eq!(resolve(&orientation), expected, "{orientation:?}");
                }
            }
        }
    }

    #[test]
    fn drawable_area_excludes_margins() {
        let margins = resolve(&Orientation::new().landscape());
        let area = margins.drawable_area(Size::new(320, 240));

        assert_eq!(area.top_left, Point::new(18, 9));
        assert_eq!(area.size, Size::new(302, 202));
    }

    #[test]
    fn fits_requires_a_visible_remainder() {
        let margins = BezelMargins::new(18, 9, 29, 0);
        assert!(margins.fits(320, 240));
        assert!(!margins.fits(38, 240));
        assert!(!margins.fits(320, 18));
        assert!(BezelMargins::NONE.fits(1, 1));
    }

    #[test]
    fn drawable_area_saturates() {
        let margins = BezelMargins::new(10, 10, 10, 10);
        let area = margins.drawable_area(Size::new(15, 15));
        assert_eq!(area.size, Size::zero());
    }
}

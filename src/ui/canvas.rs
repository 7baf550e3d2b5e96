//! Off-screen frame buffer the watch face is drawn into

use core::convert::Infallible;

use embedded_graphics::{
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::BinaryColor,
    prelude::DrawTarget,
    Pixel,
};

use super::{ColorMode, SCREEN_HEIGHT, SCREEN_WIDTH};

const ROW_BYTES: usize = SCREEN_WIDTH as usize / 8;
const BUF_LEN: usize = ROW_BYTES * SCREEN_HEIGHT as usize;

/// 1 bit per pixel, rows packed MSB first like the bundled images
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayCanvas {
    buf: [u8; BUF_LEN],
}

impl Default for DisplayCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayCanvas {
    pub const fn new() -> Self {
        Self { buf: [0; BUF_LEN] }
    }

    fn index(point: Point) -> Option<(usize, u8)> {
        let (x, y) = (usize::try_from(point.x).ok()?, usize::try_from(point.y).ok()?);
        if x >= SCREEN_WIDTH as usize || y >= SCREEN_HEIGHT as usize {
            return None;
        }
        Some((y * ROW_BYTES + x / 8, 0x80 >> (x % 8)))
    }

    /// Color at `point`, `None` when off screen
    pub fn pixel(&self, point: Point) -> Option<ColorMode> {
        let (i, mask) = Self::index(point)?;
        Some(BinaryColor::from(self.buf[i] & mask != 0))
    }

    /// Iterate all pixels row by row
    pub fn pixels(&self) -> impl Iterator<Item = ColorMode> + '_ {
        (0..SCREEN_HEIGHT as i32).flat_map(move |y| {
            (0..SCREEN_WIDTH as i32).map(move |x| {
                self.pixel(Point::new(x, y)).unwrap_or(BinaryColor::Off)
            })
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl OriginDimensions for DisplayCanvas {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for DisplayCanvas {
    type Color = ColorMode;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some((i, mask)) = Self::index(point) {
                if color.is_on() {
                    self.buf[i] |= mask;
                } else {
                    self.buf[i] &= !mask;
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(if color.is_on() { 0xff } else { 0x00 });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{
        prelude::*,
        primitives::{PrimitiveStyle, Rectangle},
    };

    #[test]
    fn draws_and_reads_back() {
        let mut canvas = DisplayCanvas::new();
        Rectangle::new(Point::new(10, 20), Size::new(3, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut canvas)
            .unwrap();

        assert_eq!(canvas.pixel(Point::new(10, 20)), Some(BinaryColor::On));
        assert_eq!(canvas.pixel(Point::new(12, 21)), Some(BinaryColor::On));
        assert_eq!(canvas.pixel(Point::new(13, 21)), Some(BinaryColor::Off));
        assert_eq!(canvas.pixels().filter(|c| c.is_on()).count(), 6);
    }

    #[test]
    fn off_screen_pixels_are_clipped() {
        let mut canvas = DisplayCanvas::new();
        canvas
            .draw_iter([Pixel(Point::new(-1, 0), BinaryColor::On), Pixel(Point::new(144, 0), BinaryColor::On)])
            .unwrap();
        assert!(canvas.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(canvas.pixel(Point::new(0, 168)), None);
    }

    #[test]
    fn clear_fills_everything() {
        let mut canvas = DisplayCanvas::new();
        canvas.clear(BinaryColor::On).unwrap();
        assert!(canvas.pixels().all(|c| c == BinaryColor::On));
    }
}

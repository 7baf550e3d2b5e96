//! Screen layers
//!
//! The window only keeps the stacking order of its children; the layers
//! themselves are owned by the watch face and drawn bottom to top.

use core::fmt::{self, Write};

use embedded_graphics::{
    image::{Image, ImageRaw},
    mono_font::{MonoFont, MonoTextStyle},
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use super::ColorMode;
use crate::error::{Error, Result};

/// Children a window can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerId {
    Background,
    TimeDate,
    Weather,
}

const MAX_CHILDREN: usize = 3;

/// Stacking order of the window's children, bottom first
#[derive(Debug, Default)]
pub struct Window {
    children: heapless::Vec<LayerId, MAX_CHILDREN>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `id` on top of all other children.
    ///
    /// A layer that is already attached moves to the top.
    pub fn add_child(&mut self, id: LayerId) {
        self.remove_child(id);
        if self.children.push(id).is_err() {
            crate::error!("Window has no room for another layer");
        }
    }

    pub fn remove_child(&mut self, id: LayerId) {
        self.children.retain(|child| *child != id);
    }

    pub fn children(&self) -> &[LayerId] {
        &self.children
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.children.contains(&id)
    }
}

/// Fixed-capacity text buffer.
///
/// Like a C string buffer of `N` bytes it holds at most `N - 1` bytes of
/// text; longer text is cut at the last char boundary that fits.
pub struct Label<const N: usize> {
    str_buf: [u8; N],
    len: usize,
}

impl<const N: usize> Default for Label<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Label<N> {
    pub const CAPACITY: usize = N.saturating_sub(1);

    /// Create new empty label
    pub const fn new() -> Self {
        Self {
            str_buf: [0; N],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.str_buf[..self.len]).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Replace the text, truncating if needed
    pub fn set_text(&mut self, text: &str) {
        self.clear();
        // Truncating writes cannot fail
        let _ = self.write_str(text);
    }

    /// Replace the text with formatted output that must fit completely
    pub fn set_fmt(&mut self, args: fmt::Arguments) -> Result<()> {
        match format_no_std::show(&mut self.str_buf[..Self::CAPACITY], args) {
            Ok(text) => {
                self.len = text.len();
                Ok(())
            }
            Err(_) => {
                self.len = 0;
                Err(Error::Format)
            }
        }
    }
}

impl<const N: usize> Write for Label<N> {
    /// Append as much of `s` as fits
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = Self::CAPACITY - self.len;
        let mut end = s.len().min(room);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.str_buf[self.len..self.len + end].copy_from_slice(&s.as_bytes()[..end]);
        self.len += end;
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for Label<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Label").field(&self.as_str()).finish()
    }
}

/// Rectangular text region with fixed colors
#[derive(Debug)]
pub struct TextLayer<const N: usize> {
    frame: Rectangle,
    background_color: Option<ColorMode>,
    text_color: ColorMode,
    alignment: Alignment,
    label: Label<N>,
}

impl<const N: usize> TextLayer<N> {
    /// Create new text layer: transparent, left aligned, empty
    pub fn new(frame: Rectangle, text_color: ColorMode) -> Self {
        Self {
            frame,
            background_color: None,
            text_color,
            alignment: Alignment::Left,
            label: Label::new(),
        }
    }

    pub fn set_background_color(&mut self, color: ColorMode) {
        self.background_color = Some(color);
    }

    pub fn set_text_color(&mut self, color: ColorMode) {
        self.text_color = color;
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn set_text(&mut self, text: &str) {
        self.label.set_text(text);
    }

    pub fn label_mut(&mut self) -> &mut Label<N> {
        &mut self.label
    }

    pub fn text(&self) -> &str {
        self.label.as_str()
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    /// Draw the layer with `font`
    pub fn draw<D>(&self, target: &mut D, font: &MonoFont<'_>) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        if let Some(color) = self.background_color {
            self.frame
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(target)?;
        }

        // Styling
        let character_style = MonoTextStyle::new(font, self.text_color);
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Top)
            .build();

        // Anchor point on the top edge of the frame
        let x = match self.alignment {
            Alignment::Left => self.frame.top_left.x,
            Alignment::Center => self.frame.center().x,
            Alignment::Right => self.frame.top_left.x + self.frame.size.width as i32 - 1,
        };
        let anchor = Point::new(x, self.frame.top_left.y);

        // Text beyond the frame is clipped
        Text::with_text_style(self.label.as_str(), anchor, character_style, text_style)
            .draw(&mut target.clipped(&self.frame))?;
        Ok(())
    }
}

/// Full-frame image layer that owns its image
pub struct BitmapLayer<I> {
    frame: Rectangle,
    bitmap: I,
}

impl<I> BitmapLayer<I>
where
    I: AsRef<ImageRaw<'static, ColorMode>>,
{
    pub fn new(frame: Rectangle, bitmap: I) -> Self {
        Self { frame, bitmap }
    }

    pub fn bitmap(&self) -> &I {
        &self.bitmap
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    pub fn draw<D>(&self, target: &mut D) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        Image::new(self.bitmap.as_ref(), self.frame.top_left).draw(&mut target.clipped(&self.frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{DisplayCanvas, BLACK, WHITE};
    use profont::PROFONT_14_POINT;

    #[test]
    fn add_child_moves_layer_to_top() {
        let mut window = Window::new();
        window.add_child(LayerId::Background);
        window.add_child(LayerId::TimeDate);
        window.add_child(LayerId::Weather);
        window.add_child(LayerId::Background);
        assert_eq!(
            window.children(),
            &[LayerId::TimeDate, LayerId::Weather, LayerId::Background]
        );

        window.remove_child(LayerId::Weather);
        assert!(!window.contains(LayerId::Weather));
        assert_eq!(window.children().len(), 2);
    }

    #[test]
    fn label_truncates_like_a_c_buffer() {
        let mut label: Label<8> = Label::new();
        label.set_text("-2147483648F");
        assert_eq!(label.as_str(), "-214748");

        // Never split a multi-byte character
        let mut label: Label<4> = Label::new();
        label.set_text("a°b");
        assert_eq!(label.as_str(), "a°");
        label.set_text("ab°");
        assert_eq!(label.as_str(), "ab");
    }

    #[test]
    fn label_appends_until_full() {
        let mut label: Label<6> = Label::new();
        write!(label, "{}, {}", 1, "abc").unwrap();
        assert_eq!(label.as_str(), "1, ab");
    }

    #[test]
    fn set_fmt_requires_a_fit() {
        let mut label: Label<6> = Label::new();
        label.set_fmt(format_args!("{:02}:{:02}", 9, 5)).unwrap();
        assert_eq!(label.as_str(), "09:05");
        assert_eq!(label.set_fmt(format_args!("{}", "too long")), Err(Error::Format));
        assert_eq!(label.as_str(), "");
    }

    #[test]
    fn text_layer_fills_its_frame() {
        let frame = Rectangle::new(Point::new(0, 2), Size::new(144, 25));
        let mut layer: TextLayer<16> = TextLayer::new(frame, BLACK);
        layer.set_background_color(WHITE);
        layer.set_alignment(Alignment::Center);
        layer.set_text("12:00");

        let mut canvas = DisplayCanvas::new();
        layer.draw(&mut canvas, &PROFONT_14_POINT).unwrap();

        assert_eq!(canvas.pixel(Point::new(0, 2)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(143, 26)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(0, 27)), Some(BLACK));
        // Some glyph pixels land inside the frame
        let inked = (2..27)
            .flat_map(|y| (0..144).map(move |x| Point::new(x, y)))
            .filter(|p| canvas.pixel(*p) == Some(BLACK))
            .count();
        assert!(inked > 0);
    }
}

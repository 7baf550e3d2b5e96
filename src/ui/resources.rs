//! Bundled fonts and background images
//!
//! Resources are handed out as owned handles. Dropping a handle releases the
//! resource, so a screen element that owns its handle can never outlive it.

use embedded_graphics::{image::ImageRaw, mono_font::MonoFont};
use profont::PROFONT_14_POINT;

use super::{ColorMode, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::error::{Error, Result};

/// Size of one full-screen 1 bit image
pub const IMAGE_LEN: usize = (SCREEN_WIDTH as usize / 8) * SCREEN_HEIGHT as usize;

static BACKGROUND_01: &[u8] = include_bytes!("../../assets/backgrounds/background_01.raw");
static BACKGROUND_02: &[u8] = include_bytes!("../../assets/backgrounds/background_02.raw");
static BACKGROUND_03: &[u8] = include_bytes!("../../assets/backgrounds/background_03.raw");
static BACKGROUND_04: &[u8] = include_bytes!("../../assets/backgrounds/background_04.raw");
static BACKGROUND_05: &[u8] = include_bytes!("../../assets/backgrounds/background_05.raw");
static BACKGROUND_06: &[u8] = include_bytes!("../../assets/backgrounds/background_06.raw");
static BACKGROUND_07: &[u8] = include_bytes!("../../assets/backgrounds/background_07.raw");
static BACKGROUND_08: &[u8] = include_bytes!("../../assets/backgrounds/background_08.raw");
static BACKGROUND_09: &[u8] = include_bytes!("../../assets/backgrounds/background_09.raw");
static BACKGROUND_10: &[u8] = include_bytes!("../../assets/backgrounds/background_10.raw");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontId {
    ProFont14,
}

/// Background images, in the order they are cycled through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageId {
    Background01,
    Background02,
    Background03,
    Background04,
    Background05,
    Background06,
    Background07,
    Background08,
    Background09,
    Background10,
}

impl ImageId {
    pub const BACKGROUNDS: [ImageId; 10] = [
        ImageId::Background01,
        ImageId::Background02,
        ImageId::Background03,
        ImageId::Background04,
        ImageId::Background05,
        ImageId::Background06,
        ImageId::Background07,
        ImageId::Background08,
        ImageId::Background09,
        ImageId::Background10,
    ];

    /// Background at `index`, wrapping around the cycle
    pub fn background(index: usize) -> Self {
        Self::BACKGROUNDS[index % Self::BACKGROUNDS.len()]
    }
}

/// Where fonts and images come from
pub trait ResourceStore {
    type Font: AsRef<MonoFont<'static>>;
    type Image: AsRef<ImageRaw<'static, ColorMode>>;

    fn load_font(&self, id: FontId) -> Result<Self::Font>;

    fn load_image(&self, id: ImageId) -> Result<Self::Image>;
}

/// Font compiled into the firmware
pub struct BundledFont(&'static MonoFont<'static>);

impl AsRef<MonoFont<'static>> for BundledFont {
    fn as_ref(&self) -> &MonoFont<'static> {
        self.0
    }
}

/// Image compiled into the firmware
pub struct BundledImage(ImageRaw<'static, ColorMode>);

impl AsRef<ImageRaw<'static, ColorMode>> for BundledImage {
    fn as_ref(&self) -> &ImageRaw<'static, ColorMode> {
        &self.0
    }
}

/// Assets shipped with the watch face
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResources;

impl BundledResources {
    fn image_data(id: ImageId) -> &'static [u8] {
        match id {
            ImageId::Background01 => BACKGROUND_01,
            ImageId::Background02 => BACKGROUND_02,
            ImageId::Background03 => BACKGROUND_03,
            ImageId::Background04 => BACKGROUND_04,
            ImageId::Background05 => BACKGROUND_05,
            ImageId::Background06 => BACKGROUND_06,
            ImageId::Background07 => BACKGROUND_07,
            ImageId::Background08 => BACKGROUND_08,
            ImageId::Background09 => BACKGROUND_09,
            ImageId::Background10 => BACKGROUND_10,
        }
    }
}

impl ResourceStore for BundledResources {
    type Font = BundledFont;
    type Image = BundledImage;

    fn load_font(&self, id: FontId) -> Result<Self::Font> {
        match id {
            FontId::ProFont14 => Ok(BundledFont(&PROFONT_14_POINT)),
        }
    }

    fn load_image(&self, id: ImageId) -> Result<Self::Image> {
        let data = Self::image_data(id);
        if data.len() != IMAGE_LEN {
            return Err(Error::InvalidImage {
                id,
                len: data.len(),
                expected: IMAGE_LEN,
            });
        }
        Ok(BundledImage(ImageRaw::new(data, SCREEN_WIDTH)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::geometry::{OriginDimensions, Size};

    #[test]
    fn every_background_is_full_screen() {
        for id in ImageId::BACKGROUNDS {
            let image = BundledResources.load_image(id).unwrap();
            assert_eq!(image.as_ref().size(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        }
    }

    #[test]
    fn background_index_wraps() {
        assert_eq!(ImageId::background(0), ImageId::Background01);
        assert_eq!(ImageId::background(9), ImageId::Background10);
        assert_eq!(ImageId::background(10), ImageId::Background01);
    }

    #[test]
    fn font_fits_the_time_label() {
        let font = BundledResources.load_font(FontId::ProFont14).unwrap();
        let width = font.as_ref().character_size.width * "00:00 // mm.dd".len() as u32;
        assert!(width <= SCREEN_WIDTH);
    }
}

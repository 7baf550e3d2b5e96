//! UI definitions module

use embedded_graphics::pixelcolor::BinaryColor;

mod canvas;
pub mod layer;
pub mod resources;
pub mod weather;
pub mod weather_watchface;

pub use canvas::DisplayCanvas;

/// Pixel format of the watch face
pub type ColorMode = BinaryColor;

pub const SCREEN_WIDTH: u32 = 144;
pub const SCREEN_HEIGHT: u32 = 168;

pub const WHITE: ColorMode = BinaryColor::On;
pub const BLACK: ColorMode = BinaryColor::Off;

//! Display control module for PineTime

use embassy_nrf::{
    gpio::{AnyPin, Output},
    peripherals::SPI2,
    spim::Spim,
};
use embassy_time::Delay;

use display_interface_spi::SPIInterface;
use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::Rectangle};
use mipidsi::{models::ST7789, Builder, Orientation};

use weather_watchface::{
    ui::{SCREEN_HEIGHT, SCREEN_WIDTH},
    DisplayCanvas,
};

const LCD_W: u16 = 240;
const LCD_H: u16 = 240;

type Lcd = mipidsi::Display<
    SPIInterface<Spim<'static, SPI2>, Output<'static, AnyPin>, Output<'static, AnyPin>>,
    ST7789,
    Output<'static, AnyPin>,
>;

pub struct Display {
    lcd: Lcd,
    /// Area the watch face occupies, centered on the panel
    area: Rectangle,
}

impl Display {
    /// Configure display settings on boot
    pub fn init(
        spim: Spim<'static, SPI2>,
        cs: Output<'static, AnyPin>,
        dc: Output<'static, AnyPin>,
        rst: Output<'static, AnyPin>,
    ) -> Option<Self> {
        let lcd = Builder::st7789(SPIInterface::new(spim, dc, cs))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst))
            .ok()?;

        let offset = Point::new(
            (LCD_W as i32 - SCREEN_WIDTH as i32) / 2,
            (LCD_H as i32 - SCREEN_HEIGHT as i32) / 2,
        );
        let mut display = Self {
            lcd,
            area: Rectangle::new(offset, Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)),
        };
        display.clear().ok()?;
        Some(display)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), mipidsi::Error> {
        self.lcd.clear(Rgb565::BLACK)
    }

    /// Copy a rendered frame to the panel
    pub fn draw_frame(&mut self, frame: &DisplayCanvas) -> Result<(), mipidsi::Error> {
        let colors = frame
            .pixels()
            .map(|color| if color.is_on() { Rgb565::WHITE } else { Rgb565::BLACK });
        self.lcd.fill_contiguous(&self.area, colors)
    }
}

//! Weather watchface
//!
//! Background image that changes every few minutes, a time and date label
//! at the top and the latest weather report at the bottom.

use chrono::{Datelike, NaiveDateTime, Timelike};
use embedded_graphics::{prelude::DrawTarget, text::Alignment};

use super::{
    layer::{BitmapLayer, Label, LayerId, TextLayer, Window},
    resources::{FontId, ImageId, ResourceStore},
    weather::{WeatherField, WeatherReport, KEY_REQUEST, WEATHER_BUF_LEN},
    ColorMode,
};
use crate::{
    error::Result,
    system::{
        config::WatchFaceConfig,
        event::EventHandler,
        message::{Dictionary, DictionaryWriter, Outbox, OUTBOX_SIZE},
        time::{Clock, ClockStyle},
    },
};

/// Shape of the time and date text
pub const TIME_PLACEHOLDER: &str = "00:00 // mm.dd";
const TIME_BUF_LEN: usize = TIME_PLACEHOLDER.len() + 1;

/// Write `time` as `HH:MM // MM.DD` in the given clock style
pub fn format_time<const N: usize>(
    label: &mut Label<N>,
    time: NaiveDateTime,
    style: ClockStyle,
) -> Result<()> {
    let hour = match style {
        ClockStyle::TwentyFourHour => time.hour(),
        ClockStyle::TwelveHour => time.hour12().1,
    };
    label.set_fmt(format_args!(
        "{:02}:{:02} // {:02}.{:02}",
        hour,
        time.minute(),
        time.month(),
        time.day()
    ))
}

/// Everything that exists between window load and unload
struct Screen<R: ResourceStore> {
    font: R::Font,
    window: Window,
    background_index: usize,
    background: Option<BitmapLayer<R::Image>>,
    time_layer: TextLayer<TIME_BUF_LEN>,
    weather_layer: TextLayer<WEATHER_BUF_LEN>,
    weather: WeatherReport,
}

/// The watch face controller
pub struct WeatherWatchface<R, C, O>
where
    R: ResourceStore,
    C: Clock,
    O: Outbox,
{
    config: WatchFaceConfig,
    resources: R,
    clock: C,
    outbox: O,
    screen: Option<Screen<R>>,
}

impl<R, C, O> WeatherWatchface<R, C, O>
where
    R: ResourceStore,
    C: Clock,
    O: Outbox,
{
    /// Create new watchface with the stock configuration
    pub fn new(resources: R, clock: C, outbox: O) -> Self {
        Self::with_config(WatchFaceConfig::default(), resources, clock, outbox)
    }

    pub fn with_config(config: WatchFaceConfig, resources: R, clock: C, outbox: O) -> Self {
        Self {
            config: config.normalized(),
            resources,
            clock,
            outbox,
            screen: None,
        }
    }

    pub fn config(&self) -> &WatchFaceConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn is_loaded(&self) -> bool {
        self.screen.is_some()
    }

    /// Index of the current background in the cycle
    pub fn background_index(&self) -> Option<usize> {
        self.screen.as_ref().map(|screen| screen.background_index)
    }

    /// Currently mounted background image
    pub fn background_image(&self) -> Option<&R::Image> {
        self.screen
            .as_ref()
            .and_then(|screen| screen.background.as_ref())
            .map(|layer| layer.bitmap())
    }

    pub fn time_text(&self) -> Option<&str> {
        self.screen.as_ref().map(|screen| screen.time_layer.text())
    }

    pub fn weather_text(&self) -> Option<&str> {
        self.screen.as_ref().map(|screen| screen.weather_layer.text())
    }

    /// Stacking order of the window, bottom first
    pub fn layer_order(&self) -> Option<&[LayerId]> {
        self.screen.as_ref().map(|screen| screen.window.children())
    }

    /// Build the window contents.
    ///
    /// Nothing is kept when any resource fails to load.
    pub fn load(&mut self) -> Result<()> {
        // Release a previous screen before allocating a new one
        self.screen = None;

        let config = &self.config;
        let font = self.resources.load_font(FontId::ProFont14)?;

        // Create background layer
        let background_index = config.initial_background % ImageId::BACKGROUNDS.len();
        let image = self
            .resources
            .load_image(ImageId::background(background_index))?;
        let background = BitmapLayer::new(config.background_frame, image);

        // Create time layer
        let mut time_layer = TextLayer::new(config.time_frame, config.label_text);
        time_layer.set_background_color(config.label_background);
        time_layer.set_alignment(Alignment::Center);
        time_layer.set_text(TIME_PLACEHOLDER);

        // Create weather layer
        let mut weather_layer = TextLayer::new(config.weather_frame, config.label_text);
        weather_layer.set_background_color(config.label_background);
        weather_layer.set_alignment(Alignment::Center);
        weather_layer.set_text(config.weather_placeholder);

        // Background at the bottom, labels on top
        let mut window = Window::new();
        window.add_child(LayerId::Background);
        window.add_child(LayerId::TimeDate);
        window.add_child(LayerId::Weather);

        self.screen = Some(Screen {
            font,
            window,
            background_index,
            background: Some(background),
            time_layer,
            weather_layer,
            weather: WeatherReport::new(),
        });
        crate::info!("Window loaded");

        // Make sure the time is displayed from the start
        self.update_time();
        Ok(())
    }

    /// Release font, image and layers
    pub fn unload(&mut self) {
        if self.screen.take().is_some() {
            crate::info!("Window unloaded");
        }
    }

    /// Refresh the time and date label from the clock
    pub fn update_time(&mut self) {
        let Some(screen) = self.screen.as_mut() else {
            return;
        };
        let now = self.clock.now();
        let style = self.clock.clock_style();
        if format_time(screen.time_layer.label_mut(), now, style).is_err() {
            crate::error!("Time does not fit its label");
        }
    }

    /// Show the next background image
    pub fn update_background(&mut self) -> Result<()> {
        let Some(screen) = self.screen.as_mut() else {
            crate::warn!("Background update without a window");
            return Ok(());
        };

        screen.background_index = (screen.background_index + 1) % ImageId::BACKGROUNDS.len();

        // Release the old image before loading the next one
        screen.window.remove_child(LayerId::Background);
        screen.background = None;

        let image = self
            .resources
            .load_image(ImageId::background(screen.background_index))?;
        screen.background = Some(BitmapLayer::new(self.config.background_frame, image));
        screen.window.add_child(LayerId::Background);

        // Labels go back on top of the new background
        screen.window.add_child(LayerId::TimeDate);
        screen.window.add_child(LayerId::Weather);

        crate::debug!("Background {}", screen.background_index);
        Ok(())
    }

    /// Ask the companion for a fresh weather report
    pub fn request_weather(&mut self) {
        let mut buf = [0u8; OUTBOX_SIZE];
        let payload = match DictionaryWriter::new(&mut buf).and_then(|mut writer| {
            writer.write_uint8(KEY_REQUEST, 0)?;
            Ok(writer.finish())
        }) {
            Ok(payload) => payload,
            Err(e) => {
                crate::error!("Weather request not encoded: {}", e);
                return;
            }
        };

        if let Err(e) = self.outbox.send(payload) {
            crate::error!("Outbox send failed: {}", e);
        }
    }

    /// Apply a weather report from the companion
    pub fn receive_weather(&mut self, payload: &[u8]) {
        let Some(screen) = self.screen.as_mut() else {
            crate::warn!("Weather report without a window");
            return;
        };

        let tuples = Dictionary::new(payload)
            .inspect_err(|e| crate::error!("Malformed message: {}", e))
            .map(|dict| dict.iter())
            .into_iter()
            .flatten();

        for tuple in tuples {
            let tuple = match tuple {
                Ok(tuple) => tuple,
                Err(e) => {
                    crate::error!("Malformed message: {}", e);
                    break;
                }
            };
            match WeatherField::from(tuple) {
                WeatherField::Unrecognized(key) => {
                    crate::error!("Key {} not recognized!", key);
                }
                WeatherField::Mismatched(key) => {
                    crate::error!("Key {} has an unexpected type", key);
                }
                field => {
                    screen.weather.apply(field);
                }
            }
        }

        // Assemble full string and display
        screen.weather.compose(screen.weather_layer.label_mut());
    }

    /// Draw the window into `target`
    pub fn render<D>(&self, target: &mut D) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        target.clear(self.config.window_color)?;
        let Some(screen) = self.screen.as_ref() else {
            return Ok(());
        };

        for layer in screen.window.children() {
            match layer {
                LayerId::Background => {
                    if let Some(background) = &screen.background {
                        background.draw(target)?;
                    }
                }
                LayerId::TimeDate => screen.time_layer.draw(target, screen.font.as_ref())?,
                LayerId::Weather => screen.weather_layer.draw(target, screen.font.as_ref())?,
            }
        }
        Ok(())
    }
}

impl<R, C, O> EventHandler for WeatherWatchface<R, C, O>
where
    R: ResourceStore,
    C: Clock,
    O: Outbox,
{
    fn on_window_load(&mut self) -> Result<()> {
        self.load()
            .inspect_err(|e| crate::error!("Window load failed: {}", e))
    }

    fn on_window_unload(&mut self) {
        self.unload();
    }

    fn on_tick(&mut self, now: NaiveDateTime) {
        if !self.is_loaded() {
            crate::warn!("Tick without a window");
            return;
        }
        crate::debug!("Tick {}:{}", now.hour(), now.minute());

        self.update_time();

        // Get weather update every 30 minutes
        if self.config.weather_due(now.minute()) {
            self.request_weather();
        }

        // Update the background every 2 minutes
        if self.config.background_due(now.minute()) {
            if let Err(e) = self.update_background() {
                crate::error!("Background not loaded: {}", e);
            }
        }
    }

    fn on_inbox_received(&mut self, payload: &[u8]) {
        self.receive_weather(payload);
    }
}

//! Watch face configuration

use embedded_graphics::{
    geometry::{Point, Size},
    pixelcolor::BinaryColor,
    primitives::Rectangle,
};

use crate::ui::{ColorMode, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Text shown in the weather label until the first report arrives
pub const WEATHER_PLACEHOLDER: &str = "Loading...";

/// Layout, colors and refresh cadence of the watch face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchFaceConfig {
    /// Background shown right after the window loads
    pub initial_background: usize,
    /// Minutes between two weather requests
    pub weather_interval: u32,
    /// Minutes between two background changes
    pub background_interval: u32,
    /// Weather label text before the first report
    pub weather_placeholder: &'static str,
    /// Color behind all layers
    pub window_color: ColorMode,
    /// Frame of the background image
    pub background_frame: Rectangle,
    /// Frame of the time and date label
    pub time_frame: Rectangle,
    /// Frame of the weather label
    pub weather_frame: Rectangle,
    /// Fill color of both labels
    pub label_background: ColorMode,
    /// Text color of both labels
    pub label_text: ColorMode,
}

impl Default for WatchFaceConfig {
    fn default() -> Self {
        Self {
            initial_background: 0,
            weather_interval: 30,
            background_interval: 2,
            weather_placeholder: WEATHER_PLACEHOLDER,
            window_color: BinaryColor::Off,
            background_frame: Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)),
            time_frame: Rectangle::new(Point::new(0, 2), Size::new(SCREEN_WIDTH, 25)),
            weather_frame: Rectangle::new(Point::new(0, 140), Size::new(SCREEN_WIDTH, 25)),
            label_background: BinaryColor::On,
            label_text: BinaryColor::Off,
        }
    }
}

impl WatchFaceConfig {
    /// Create the stock configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp values that would break the tick arithmetic.
    ///
    /// Zero intervals become one minute.
    pub fn normalized(mut self) -> Self {
        self.weather_interval = self.weather_interval.max(1);
        self.background_interval = self.background_interval.max(1);
        self
    }

    /// Whether a weather request is due at `minute`
    pub fn weather_due(&self, minute: u32) -> bool {
        minute.is_multiple_of(self.weather_interval.max(1))
    }

    /// Whether the background changes at `minute`
    pub fn background_due(&self, minute: u32) -> bool {
        minute.is_multiple_of(self.background_interval.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadence() {
        let config = WatchFaceConfig::new();
        assert!(config.weather_due(0));
        assert!(config.weather_due(30));
        assert!(!config.weather_due(15));
        assert!(config.background_due(30));
        assert!(!config.background_due(31));
    }

    #[test]
    fn zero_intervals_are_normalized() {
        let config = WatchFaceConfig {
            weather_interval: 0,
            background_interval: 0,
            ..WatchFaceConfig::default()
        }
        .normalized();
        assert_eq!(config.weather_interval, 1);
        assert_eq!(config.background_interval, 1);
        assert!(config.weather_due(7));
    }
}

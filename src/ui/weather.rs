//! Weather report decoding
//!
//! Temperature and conditions are kept in separate buffers that outlive a
//! single message. A report that carries only one of the two fields is
//! combined with whatever the other buffer last held, so a stale value can
//! show up next to a fresh one. Both buffers start out empty.

use core::fmt::Write;

use crate::system::message::{Tuple, TupleValue};
use crate::ui::layer::Label;

/// Key of the temperature entry (Fahrenheit, signed integer)
pub const KEY_TEMPERATURE: u32 = 0;
/// Key of the conditions entry (short C string)
pub const KEY_CONDITIONS: u32 = 1;
/// Key of the outbound refresh request
pub const KEY_REQUEST: u32 = 0;

pub const TEMPERATURE_BUF_LEN: usize = 8;
pub const CONDITIONS_BUF_LEN: usize = 32;
pub const WEATHER_BUF_LEN: usize = 32;

/// Meaning of one received entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherField<'a> {
    Temperature(i32),
    Conditions(&'a str),
    /// A known key carrying a value of the wrong type
    Mismatched(u32),
    Unrecognized(u32),
}

impl<'a> From<Tuple<'a>> for WeatherField<'a> {
    fn from(tuple: Tuple<'a>) -> Self {
        match (tuple.key, tuple.value) {
            (KEY_TEMPERATURE, value) => match value.as_i32() {
                Some(temperature) => Self::Temperature(temperature),
                None => Self::Mismatched(tuple.key),
            },
            (KEY_CONDITIONS, TupleValue::CString(text)) => Self::Conditions(text),
            (KEY_CONDITIONS, _) => Self::Mismatched(tuple.key),
            (key, _) => Self::Unrecognized(key),
        }
    }
}

/// Last received temperature and conditions
#[derive(Debug, Default)]
pub struct WeatherReport {
    temperature: Label<TEMPERATURE_BUF_LEN>,
    conditions: Label<CONDITIONS_BUF_LEN>,
}

impl WeatherReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one field; entries that are not weather data are ignored
    pub fn apply(&mut self, field: WeatherField<'_>) {
        match field {
            WeatherField::Temperature(value) => {
                self.temperature.clear();
                let _ = write!(self.temperature, "{}F", value);
            }
            WeatherField::Conditions(text) => {
                self.conditions.set_text(text);
            }
            WeatherField::Mismatched(_) | WeatherField::Unrecognized(_) => {}
        }
    }

    pub fn temperature(&self) -> &str {
        self.temperature.as_str()
    }

    pub fn conditions(&self) -> &str {
        self.conditions.as_str()
    }

    /// Render "<temperature>, <conditions>" into `label`
    pub fn compose<const N: usize>(&self, label: &mut Label<N>) {
        label.clear();
        let _ = write!(label, "{}, {}", self.temperature(), self.conditions());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(report: &WeatherReport) -> String {
        let mut label: Label<WEATHER_BUF_LEN> = Label::new();
        report.compose(&mut label);
        label.as_str().to_string()
    }

    #[test]
    fn decodes_known_keys() {
        let field = WeatherField::from(Tuple {
            key: KEY_TEMPERATURE,
            value: TupleValue::Int(72),
        });
        assert_eq!(field, WeatherField::Temperature(72));

        let field = WeatherField::from(Tuple {
            key: KEY_CONDITIONS,
            value: TupleValue::CString("Cloudy"),
        });
        assert_eq!(field, WeatherField::Conditions("Cloudy"));
    }

    #[test]
    fn flags_unknown_and_mistyped_keys() {
        let field = WeatherField::from(Tuple {
            key: 99,
            value: TupleValue::Int(1),
        });
        assert_eq!(field, WeatherField::Unrecognized(99));

        let field = WeatherField::from(Tuple {
            key: KEY_TEMPERATURE,
            value: TupleValue::CString("hot"),
        });
        assert_eq!(field, WeatherField::Mismatched(KEY_TEMPERATURE));
    }

    #[test]
    fn partial_report_keeps_stale_field() {
        let mut report = WeatherReport::new();
        report.apply(WeatherField::Temperature(72));
        report.apply(WeatherField::Conditions("Cloudy"));
        assert_eq!(compose(&report), "72F, Cloudy");

        report.apply(WeatherField::Temperature(50));
        assert_eq!(compose(&report), "50F, Cloudy");
    }

    #[test]
    fn missing_field_renders_empty() {
        let mut report = WeatherReport::new();
        report.apply(WeatherField::Conditions("Rain"));
        assert_eq!(compose(&report), ", Rain");
    }

    #[test]
    fn long_values_are_truncated() {
        let mut report = WeatherReport::new();
        report.apply(WeatherField::Temperature(i32::MIN));
        assert_eq!(report.temperature(), "-214748");

        report.apply(WeatherField::Conditions(
            "Scattered thunderstorms with heavy rain",
        ));
        assert_eq!(report.conditions().len(), CONDITIONS_BUF_LEN - 1);
        assert_eq!(compose(&report).len(), WEATHER_BUF_LEN - 1);
    }
}

//! Weather watch face
//!
//! A rotating background image, the current time and date, and the latest
//! weather report pushed by a paired companion device. Everything is driven
//! from a single-threaded event loop: minute ticks, companion messages and
//! window lifecycle events.

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod system;
pub mod ui;

cfg_if::cfg_if! {
    if #[cfg(feature = "log")] {
        pub use log::{trace, debug, info, warn, error};
    }
    else if #[cfg(feature = "defmt")] {
        pub use defmt::{trace, debug, info, warn, error};
    }
    else {
        // Arguments are still type checked so every build sees the same call sites
        macro_rules! noop_trace {
            ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
        }
        macro_rules! noop_debug {
            ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
        }
        macro_rules! noop_info {
            ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
        }
        macro_rules! noop_warn {
            ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
        }
        macro_rules! noop_error {
            ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
        }
        pub(crate) use {
            noop_debug as debug, noop_error as error, noop_info as info, noop_trace as trace,
            noop_warn as warn,
        };
    }
}

pub use error::{Error, Result};
pub use system::{
    time::{Clock, ClockStyle, MinuteTicker, TimeManager, TimeReference},
    config::WatchFaceConfig,
    event::{Event, EventHandler, EventLoop, EventQueue, LoopState},
    message::{DeliveryError, DictError, Dictionary, DictionaryWriter, Outbox},
};
pub use ui::{
    resources::{BundledResources, FontId, ImageId, ResourceStore},
    weather_watchface::WeatherWatchface,
    DisplayCanvas,
};

#[cfg(test)]
mod tests {
    use crate::system::message::DeliveryError;

    #[test]
    fn log_macros_resolve_from_crate_root() {
        let reason = DeliveryError::Busy;
        crate::trace!("trace {}", 1);
        crate::debug!("debug {}:{}", 13, 5);
        crate::info!("info");
        crate::warn!("warn {}", reason);
        crate::error!("error {}", reason);
    }
}

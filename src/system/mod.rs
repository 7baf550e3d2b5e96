pub mod config;
pub mod event;
pub mod message;
pub mod time;

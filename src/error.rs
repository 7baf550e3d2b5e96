//! Crate error type

use crate::{
    system::message::DictError,
    ui::resources::{FontId, ImageId},
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Font asset could not be loaded
    #[error("font {0:?} is unavailable")]
    FontUnavailable(FontId),
    /// Image asset could not be loaded
    #[error("image {0:?} is unavailable")]
    ImageUnavailable(ImageId),
    /// Image asset does not match the screen geometry
    #[error("image {id:?} has {len} bytes, expected {expected}")]
    InvalidImage {
        id: ImageId,
        len: usize,
        expected: usize,
    },
    /// Companion message could not be encoded or decoded
    #[error("message error: {0}")]
    Message(#[from] DictError),
    /// Text did not fit into its label buffer
    #[error("text does not fit its label")]
    Format,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::Format
    }
}

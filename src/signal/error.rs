use thiserror::Error;

use crate::signal::parser::ChannelTag;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("invalid value {token:?} after {marker} marker")]
    InvalidNumber { marker: ChannelTag, token: String },
    #[error("{marker} marker is not followed by a value")]
    MissingValue { marker: ChannelTag },
    #[error("transport unavailable: {0}")]
    Transport(String),
    #[error("window is empty; statistics need at least one sample")]
    EmptyWindow,
    #[error("window capacity must be greater than zero")]
    InvalidCapacity,
    #[error("sampling rate must be greater than zero")]
    InvalidSampleRate,
    #[error("smoother window must be greater than zero")]
    InvalidSmootherWindow,
    #[error("failed to render plot: {0}")]
    Plot(String),
}

impl ScopeError {
    /// True for errors that reject a single line and leave the pipeline running.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            ScopeError::InvalidNumber { .. } | ScopeError::MissingValue { .. }
        )
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ScopeError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ScopeError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for ScopeError {
    fn from(value: image::ImageError) -> Self {
        ScopeError::Plot(value.to_string())
    }
}

//! Chart rendering error types

use thiserror::Error;

/// Errors that can occur while rendering a chart
#[derive(Error, Debug)]
pub enum ChartError {
    /// Drawing backend failure (layout, series, text)
    #[error("Drawing error: {0}")]
    Draw(String),

    /// PNG encoding of the finished raster failed
    #[error("Image encoding error: {0}")]
    Encode(String),
}

/// Result type alias for chart operations
pub type ChartResult<T> = Result<T, ChartError>;

use lineart_pipeline::{Dimensions, Point};

/// Errors that can occur while building a vector document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExportError {
    /// The document would have no drawable area.
    #[error("invalid document dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A contour point lies outside the document.
    #[error(
        "point ({x}, {y}) lies outside the {width}x{height} document",
        x = .point.x,
        y = .point.y,
        width = .dimensions.width,
        height = .dimensions.height
    )]
    PointOutOfBounds {
        /// The offending point.
        point: Point,
        /// The document dimensions it was checked against.
        dimensions: Dimensions,
    },
}

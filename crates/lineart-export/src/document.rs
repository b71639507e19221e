//! In-memory vector document model.
//!
//! Geometry is assembled here as explicit drawing commands; text
//! rendering is a separate, final step ([`crate::to_svg`]). Keeping the
//! two apart lets the document be inspected and tested without parsing
//! SVG.

use lineart_pipeline::{Contour, Dimensions, Point};
use svg::node::Value;
use svg::node::element::path::Data;

use crate::ExportError;

/// A single drawing command in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCommand {
    /// Start a new subpath at the point.
    MoveTo(Point),
    /// Straight segment from the current position to the point.
    LineTo(Point),
    /// Straight segment back to the start of the current subpath.
    ClosePath,
}

/// The commands for one contour.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathRecord {
    commands: Vec<PathCommand>,
}

impl PathRecord {
    /// Move to the first point, line to each later point, then close.
    ///
    /// An empty contour produces an empty record.
    #[must_use]
    pub fn from_contour(contour: &Contour) -> Self {
        let Some((first, rest)) = contour.points().split_first() else {
            return Self::default();
        };
        let commands = std::iter::once(PathCommand::MoveTo(*first))
            .chain(rest.iter().copied().map(PathCommand::LineTo))
            .chain(std::iter::once(PathCommand::ClosePath))
            .collect();
        Self { commands }
    }

    /// The commands in drawing order.
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }
}

/// A sized document holding one path record per contour, in the order
/// the contours were traced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDocument {
    dimensions: Dimensions,
    records: Vec<PathRecord>,
}

impl VectorDocument {
    /// Build a document from traced contours.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidDimensions`] if either dimension is
    /// zero and [`ExportError::PointOutOfBounds`] if any contour point
    /// lies outside `dimensions`.
    pub fn from_contours(contours: &[Contour], dimensions: Dimensions) -> Result<Self, ExportError> {
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(ExportError::InvalidDimensions {
                width: dimensions.width,
                height: dimensions.height,
            });
        }
        if let Some(&point) = contours
            .iter()
            .flat_map(Contour::points)
            .find(|p| !p.is_within(dimensions))
        {
            return Err(ExportError::PointOutOfBounds { point, dimensions });
        }

        let records = contours.iter().map(PathRecord::from_contour).collect();
        Ok(Self {
            dimensions,
            records,
        })
    }

    /// Document width and height in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Path records in contour discovery order.
    #[must_use]
    pub fn records(&self) -> &[PathRecord] {
        &self.records
    }

    /// `true` if the document draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.iter().all(|r| r.commands.is_empty())
    }

    /// The SVG path `d` attribute for the whole document.
    ///
    /// Records are emitted one after another and never interleave.
    /// Coordinates are whole pixels. An empty document yields an empty
    /// string.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineart_export::VectorDocument;
    /// use lineart_pipeline::{Contour, Dimensions, Point};
    ///
    /// let contour = Contour::new(vec![Point::new(1, 1), Point::new(3, 1), Point::new(3, 2)]);
    /// let dims = Dimensions { width: 4, height: 4 };
    /// let doc = VectorDocument::from_contours(&[contour], dims).unwrap();
    /// assert_eq!(doc.path_data(), "M1,1 L3,1 L3,2 z");
    /// ```
    #[must_use]
    pub fn path_data(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let data = self
            .records
            .iter()
            .flat_map(PathRecord::commands)
            .fold(Data::new(), |data, command| match *command {
                PathCommand::MoveTo(p) => data.move_to(coordinates(p)),
                PathCommand::LineTo(p) => data.line_to(coordinates(p)),
                PathCommand::ClosePath => data.close(),
            });
        String::from(Value::from(data))
    }
}

fn coordinates(p: Point) -> (f64, f64) {
    (f64::from(p.x), f64::from(p.y))
}

//! lineart-export: Vector document model and SVG serializer (sans-IO).
//!
//! Turns traced contours into a [`VectorDocument`] of move/line/close
//! commands, then renders that document as SVG text.

pub mod document;
pub mod error;
pub mod svg;

pub use document::{PathCommand, PathRecord, VectorDocument};
pub use error::ExportError;
pub use svg::{SvgMetadata, to_svg};

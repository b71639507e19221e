//! SVG text serializer.
//!
//! Renders a [`VectorDocument`] as a standalone SVG string: a sized
//! `<svg>` root, optional `<title>` and `<desc>`, and exactly one
//! `<path>` element whose `d` attribute holds every contour.
//!
//! The `<path>` element is built with the [`svg`] crate. The root tag is
//! written by hand so that `width` and `height` lead the attribute list.
//!
//! This is a pure function with no I/O. It returns a `String`.

use svg::node::element::Path;

use crate::VectorDocument;

/// Stroke color of the rendered path.
const STROKE: &str = "black";
/// Stroke width in pixels.
const STROKE_WIDTH: u32 = 1;

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag. Text is
/// XML-escaped.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the pipeline parameters used to produce the document.
    pub description: Option<&'a str>,
}

/// Serialize a document to SVG text.
///
/// The output begins with `<svg width="W" height="H"` and ends with
/// `</svg>` (no XML declaration, no trailing newline). Identical
/// documents always produce identical text.
///
/// # Examples
///
/// ```
/// use lineart_export::{SvgMetadata, VectorDocument, to_svg};
/// use lineart_pipeline::{Contour, Dimensions, Point};
///
/// let contour = Contour::new(vec![Point::new(2, 2), Point::new(7, 2)]);
/// let dims = Dimensions { width: 10, height: 5 };
/// let doc = VectorDocument::from_contours(&[contour], dims).unwrap();
/// let svg = to_svg(&doc, &SvgMetadata::default());
///
/// assert!(svg.starts_with(r#"<svg width="10" height="5" viewBox="0 0 10 5""#));
/// assert!(svg.contains(r#"d="M2,2 L7,2 z""#));
/// assert!(svg.ends_with("</svg>"));
/// ```
#[must_use]
pub fn to_svg(document: &VectorDocument, metadata: &SvgMetadata<'_>) -> String {
    let dims = document.dimensions();
    let mut lines = vec![format!(
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        w = dims.width,
        h = dims.height,
    )];

    if let Some(title) = metadata.title {
        lines.push(format!("<title>{}</title>", xml_escape(title)));
    }
    if let Some(description) = metadata.description {
        lines.push(format!("<desc>{}</desc>", xml_escape(description)));
    }

    let path = Path::new()
        .set("d", document.path_data())
        .set("fill", "none")
        .set("stroke", STROKE)
        .set("stroke-width", STROKE_WIDTH);
    lines.push(path.to_string());

    lines.push("</svg>".to_owned());
    lines.join("\n")
}

/// Escape the five XML special characters for safe embedding in element
/// text content.
///
/// Handles `&` (must be first), `<`, `>`, `"`, and `'`.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

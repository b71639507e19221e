//! Contour tracing: extract ordered boundaries from a binary map.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use at runtime.
//!
//! # Ordering
//!
//! Components are discovered in a single row-major scan (top-to-bottom,
//! left-to-right), so the output order depends only on the input map and
//! is reproducible across runs. It is an absolute order: flipping the
//! image does not flip the contour order.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::types::{Contour, Point};

/// Selects which contour tracing algorithm to use.
///
/// Additional variants can be added without changing the
/// `PipelineConfig` struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Moore-neighbor boundary following of each 8-connected component's
    /// outer border, with collinear runs compressed to their end points.
    #[default]
    BoundaryFollowing,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary map (non-zero = foreground, 0 = background).
/// Output: one contour per foreground component, in discovery order.
pub trait ContourTracer {
    /// Trace contours in the given binary map.
    fn trace(&self, edges: &GrayImage) -> Vec<Contour>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, edges: &GrayImage) -> Vec<Contour> {
        match *self {
            Self::BoundaryFollowing => trace_boundaries(edges),
        }
    }
}

/// Neighbor offsets in clockwise order (image y axis points down),
/// starting east.
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Index of west in [`DIRECTIONS`]. A scan-order start pixel always has
/// background (or the image border) on its west side.
const WEST: usize = 4;

/// Foreground lookup and visited mask for one tracing pass.
struct Grid<'a> {
    image: &'a GrayImage,
    visited: Vec<bool>,
}

impl<'a> Grid<'a> {
    fn new(image: &'a GrayImage) -> Self {
        let len = image.width() as usize * image.height() as usize;
        Self {
            image,
            visited: vec![false; len],
        }
    }

    fn index(&self, p: Point) -> usize {
        p.y as usize * self.image.width() as usize + p.x as usize
    }

    /// The neighbor of `p` in direction `dir`, if it lies on the image.
    fn neighbor(&self, p: Point, dir: usize) -> Option<Point> {
        let (dx, dy) = DIRECTIONS[dir];
        let x = u32::try_from(i64::from(p.x) + dx).ok()?;
        let y = u32::try_from(i64::from(p.y) + dy).ok()?;
        (x < self.image.width() && y < self.image.height()).then_some(Point::new(x, y))
    }

    fn is_foreground(&self, p: Point) -> bool {
        self.image.get_pixel(p.x, p.y).0[0] != 0
    }

    /// One Moore-neighbor step.
    ///
    /// `backtrack` is the direction from `p` to the background pixel the
    /// walk entered from. Neighbors are examined clockwise starting just
    /// after it; the first foreground neighbor is the next boundary pixel.
    /// Returns that pixel with its own backtrack direction (pointing at
    /// the last background position examined), or `None` if `p` has no
    /// foreground neighbor at all.
    fn step(&self, p: Point, backtrack: usize) -> Option<(Point, usize)> {
        for i in 1..8 {
            let dir = (backtrack + i) % 8;
            let Some(q) = self.neighbor(p, dir) else {
                continue;
            };
            if !self.is_foreground(q) {
                continue;
            }
            // The previously examined position (background or off-image)
            // is 8-adjacent to both p and q; express it relative to q.
            let (bx, by) = DIRECTIONS[(dir + 7) % 8];
            let (qx, qy) = DIRECTIONS[dir];
            let rel = (bx - qx, by - qy);
            let next_backtrack = DIRECTIONS
                .iter()
                .position(|&d| d == rel)
                .unwrap_or(WEST);
            return Some((q, next_backtrack));
        }
        None
    }

    /// Walk the outer boundary of the component whose scan-order first
    /// pixel is `start`.
    ///
    /// Stops when the walk is back at `start` and about to repeat its
    /// first move, so boundaries that pass through the start pixel more
    /// than once (thin necks) are followed completely.
    fn follow_boundary(&self, start: Point) -> Vec<Point> {
        let mut path = vec![start];
        let Some((first, first_backtrack)) = self.step(start, WEST) else {
            return path;
        };

        let (mut current, mut backtrack) = (first, first_backtrack);
        loop {
            let Some((next, next_backtrack)) = self.step(current, backtrack) else {
                break;
            };
            if current == start && next == first {
                break;
            }
            path.push(current);
            current = next;
            backtrack = next_backtrack;
        }
        path
    }

    /// Mark every pixel of the 8-connected component containing `seed`.
    fn mark_component(&mut self, seed: Point) {
        let seed_index = self.index(seed);
        self.visited[seed_index] = true;
        let mut stack = vec![seed];
        while let Some(p) = stack.pop() {
            for dir in 0..DIRECTIONS.len() {
                let Some(q) = self.neighbor(p, dir) else {
                    continue;
                };
                let idx = self.index(q);
                if !self.visited[idx] && self.is_foreground(q) {
                    self.visited[idx] = true;
                    stack.push(q);
                }
            }
        }
    }
}

/// Trace the outer boundary of every 8-connected foreground component.
fn trace_boundaries(edges: &GrayImage) -> Vec<Contour> {
    let mut grid = Grid::new(edges);
    let mut contours = Vec::new();

    for y in 0..edges.height() {
        for x in 0..edges.width() {
            let p = Point::new(x, y);
            if grid.visited[grid.index(p)] || !grid.is_foreground(p) {
                continue;
            }
            let boundary = grid.follow_boundary(p);
            grid.mark_component(p);
            contours.push(Contour::new(compress_collinear(&boundary)));
        }
    }
    contours
}

/// Drop points that lie in the middle of a straight run.
///
/// The boundary is treated as closed: the last point's outgoing step
/// leads back to the first. A point is kept when its incoming step
/// differs from its outgoing step. The first point is always kept so
/// the contour still starts at the scan-order start pixel.
fn compress_collinear(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let delta = |a: Point, b: Point| {
        (
            i64::from(b.x) - i64::from(a.x),
            i64::from(b.y) - i64::from(a.y),
        )
    };
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    for i in 1..n {
        let incoming = delta(points[i - 1], points[i]);
        let outgoing = delta(points[i], points[(i + 1) % n]);
        if incoming != outgoing {
            out.push(points[i]);
        }
    }
    out
}

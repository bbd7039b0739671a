//! Stroke-versus-rectangle geometry
//!
//! The hit-test that decides whether a slash eliminated a pig. Everything
//! here is pure: points in, bool out. Coordinates are screen-space, one
//! consistent frame for strokes and target boxes.

use glam::Vec2;

/// Axis-aligned bounding box of a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from a top-left corner and a size.
    pub fn from_origin_size(origin: Vec2, width: f32, height: f32) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            right: origin.x + width,
            bottom: origin.y + height,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Closed containment: boundary points count as inside.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// The four edge segments: top, bottom, left, right.
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let tl = Vec2::new(self.left, self.top);
        let tr = Vec2::new(self.right, self.top);
        let bl = Vec2::new(self.left, self.bottom);
        let br = Vec2::new(self.right, self.bottom);
        [(tl, tr), (bl, br), (tl, bl), (tr, br)]
    }

    /// Overlap test used to keep spawn placements apart.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }
}

/// 2D cross product of (a - o) and (b - o).
#[inline]
fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// True if `p` falls within the axis-aligned bounding range of [q1, q2].
/// Only meaningful once `p` is known to be collinear with that segment.
fn within_segment_bounds(p: Vec2, q1: Vec2, q2: Vec2) -> bool {
    p.x >= q1.x.min(q2.x)
        && p.x <= q1.x.max(q2.x)
        && p.y >= q1.y.min(q2.y)
        && p.y <= q1.y.max(q2.y)
}

/// Segment-segment intersection, counting touching and collinear overlap
/// as hits, not just proper crossings.
pub fn seg_seg_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    // Proper crossing: each segment's endpoints straddle the other's line.
    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }

    // A zero cross product means that endpoint is collinear with the other
    // segment; it intersects iff it rests within the segment's bounds.
    (d1 == 0.0 && within_segment_bounds(a1, b1, b2))
        || (d2 == 0.0 && within_segment_bounds(a2, b1, b2))
        || (d3 == 0.0 && within_segment_bounds(b1, a1, a2))
        || (d4 == 0.0 && within_segment_bounds(b2, a1, a2))
}

/// Whether a finished stroke eliminates a target with this bounding box.
///
/// Interior containment is checked first so a tap with a tiny drag that
/// starts and ends inside the box still counts; otherwise any polyline
/// segment crossing any of the four edges is a hit. Short-circuits on the
/// first hit found.
pub fn slash_hits_rect(points: &[Vec2], rect: &Rect) -> bool {
    if points.len() < 2 {
        return false;
    }
    if points.iter().any(|&p| rect.contains(p)) {
        return true;
    }
    let edges = rect.edges();
    points.windows(2).any(|pair| {
        edges
            .iter()
            .any(|&(e1, e2)| seg_seg_intersect(pair[0], pair[1], e1, e2))
    })
}

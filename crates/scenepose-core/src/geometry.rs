//! Affine transform helpers and distance math for drawable objects.
//!
//! All functions are pure. An object's local space is unscaled, unrotated
//! and centered on its own origin; world space is the shared canvas pixel
//! space that avatar viewports and drawable objects both live in.

use crate::object::{DrawableObject, ObjectKind};
use kurbo::{Point, Rect, Vec2};

/// Map a point from an object's local space into world space.
/// Scale is applied first, then rotation, then translation.
pub fn local_to_world(p: Point, obj: &DrawableObject) -> Point {
    let sx = p.x * obj.scale_x;
    let sy = p.y * obj.scale_y;
    let cos_r = obj.rotation.cos();
    let sin_r = obj.rotation.sin();
    Point::new(
        obj.x + sx * cos_r - sy * sin_r,
        obj.y + sx * sin_r + sy * cos_r,
    )
}

/// Map a world-space point into an object's local space.
/// Exact inverse of [`local_to_world`]: translate, rotate by the negated
/// angle, then divide out the scale (scale is clamped above a positive
/// floor at construction, so the division is safe).
pub fn world_to_local(p: Point, obj: &DrawableObject) -> Point {
    let dx = p.x - obj.x;
    let dy = p.y - obj.y;
    let cos_r = (-obj.rotation).cos();
    let sin_r = (-obj.rotation).sin();
    Point::new(
        (dx * cos_r - dy * sin_r) / obj.scale_x,
        (dx * sin_r + dy * cos_r) / obj.scale_y,
    )
}

/// Axis-aligned bounding box of a point sequence.
/// Returns [`Rect::ZERO`] for an empty sequence.
pub fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    let mut bounds = Rect::new(first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        bounds.x0 = bounds.x0.min(p.x);
        bounds.y0 = bounds.y0.min(p.y);
        bounds.x1 = bounds.x1.max(p.x);
        bounds.y1 = bounds.y1.max(p.y);
    }
    bounds
}

/// Local-space bounding box appropriate to the object's kind.
///
/// Shapes and text are origin-centered half extents from `width`/`height`
/// (text width/height are the metrics measured at commit time). Strokes
/// use the bounding box of their points padded by half the line width.
pub fn local_bounds(obj: &DrawableObject) -> Rect {
    match &obj.kind {
        ObjectKind::Stroke { points } => {
            let pad = obj.line_width / 2.0;
            points_bounds(points).inflate(pad, pad)
        }
        ObjectKind::Shape { width, height, .. } => {
            Rect::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0)
        }
        ObjectKind::Text { width, height, .. } => {
            Rect::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0)
        }
    }
}

/// World-space AABB of the object: the four corners of its local bounds
/// pushed through the full transform.
pub fn world_bounds(obj: &DrawableObject) -> Rect {
    let local = local_bounds(obj);
    let corners = [
        Point::new(local.x0, local.y0),
        Point::new(local.x1, local.y0),
        Point::new(local.x1, local.y1),
        Point::new(local.x0, local.y1),
    ];
    let mut bounds: Option<Rect> = None;
    for corner in corners {
        let w = local_to_world(corner, obj);
        bounds = Some(match bounds {
            Some(b) => Rect::new(b.x0.min(w.x), b.y0.min(w.y), b.x1.max(w.x), b.y1.max(w.y)),
            None => Rect::new(w.x, w.y, w.x, w.y),
        });
    }
    bounds.unwrap_or(Rect::ZERO)
}

/// Distance from a point to a line segment (a→b), projection-clamped.
pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(p.x - a.x, p.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    p.distance(proj)
}

/// Minimum distance from a point to a polyline.
/// A single-point polyline degenerates to point distance; an empty one
/// yields infinity.
pub fn distance_point_to_polyline(p: Point, points: &[Point]) -> f64 {
    if points.len() == 1 {
        return p.distance(points[0]);
    }
    points
        .windows(2)
        .map(|w| distance_point_to_segment(p, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Insert interpolated points along each segment so that consecutive
/// samples are no further apart than `step`. Required before distance
/// testing sparse strokes against the eraser so no gap is missed.
pub fn densify(points: &[Point], step: f64) -> Vec<Point> {
    if points.len() < 2 || step <= 0.0 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let dist = a.distance(b);
        if dist > step {
            let n = (dist / step).ceil() as usize;
            for i in 1..n {
                let t = i as f64 / n as f64;
                out.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
            }
        }
        out.push(b);
    }
    out
}

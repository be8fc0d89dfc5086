//! Off-screen rasterization for the eraser engine.
//!
//! Shapes are rendered into a single-channel [`GrayImage`] coverage mask
//! covering their padded world bounds, then the eraser stroke is
//! subtracted by stamping zero disks along its densified polyline (the
//! destination-out composite with round caps and joins).

use crate::geometry::{densify, world_bounds, world_to_local};
use crate::object::{DrawableObject, ObjectKind, ShapeType};
use image::GrayImage;
use kurbo::Point;

/// Refuse to allocate masks beyond this many pixels; an object scaled to
/// absurd size falls back to being left untouched by the eraser.
const MAX_MASK_PIXELS: u64 = 16_000_000;

/// Coverage mask plus the world position of its pixel (0, 0) corner.
pub(crate) struct Mask {
    pub image: GrayImage,
    pub origin: Point,
}

impl Mask {
    /// World-space coordinates of a pixel's center.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Point {
        Point::new(self.origin.x + x, self.origin.y + y)
    }

    pub fn coverage(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] > 0).count()
    }
}

/// Rasterize a shape object's filled area into a mask over its world
/// bounds inflated by `pad`. Each pixel center is inverse-transformed
/// into local space and containment-tested, so rotation and non-uniform
/// scale are exact. Returns `None` for degenerate or oversized bounds.
pub(crate) fn rasterize_shape(obj: &DrawableObject, pad: f64) -> Option<Mask> {
    let bounds = world_bounds(obj).inflate(pad, pad);
    let width = bounds.width().ceil() as u64;
    let height = bounds.height().ceil() as u64;
    if width == 0 || height == 0 {
        return None;
    }
    if width * height > MAX_MASK_PIXELS {
        log::warn!(
            "skipping erase raster for object {}: mask {}x{} too large",
            obj.id,
            width,
            height
        );
        return None;
    }
    let origin = Point::new(bounds.x0.floor(), bounds.y0.floor());
    let mut image = GrayImage::new(width as u32, height as u32);
    for y in 0..height as u32 {
        for x in 0..width as u32 {
            let world = Point::new(origin.x + x as f64 + 0.5, origin.y + y as f64 + 0.5);
            let local = world_to_local(world, obj);
            if contains_local(obj, local) {
                image.put_pixel(x, y, image::Luma([255]));
            }
        }
    }
    Some(Mask { image, origin })
}

/// Local-space containment test for a shape's filled area.
fn contains_local(obj: &DrawableObject, p: Point) -> bool {
    let ObjectKind::Shape {
        shape,
        width,
        height,
        points,
    } = &obj.kind
    else {
        return false;
    };
    let hw = width / 2.0;
    let hh = height / 2.0;
    match shape {
        // A line is its stroked capsule: the horizontal diameter segment
        // thickened by half the line width.
        ShapeType::Line => {
            let clamped_x = p.x.clamp(-hw, hw);
            let dx = p.x - clamped_x;
            (dx * dx + p.y * p.y).sqrt() <= (obj.line_width / 2.0).max(0.5)
        }
        ShapeType::Rect => p.x.abs() <= hw && p.y.abs() <= hh,
        ShapeType::Circle => {
            if hw <= 0.0 || hh <= 0.0 {
                return false;
            }
            let nx = p.x / hw;
            let ny = p.y / hh;
            nx * nx + ny * ny <= 1.0
        }
        // Isoceles triangle: apex at the top center, base along the
        // bottom edge of the bounds.
        ShapeType::Triangle => {
            point_in_polygon(
                p,
                &[
                    Point::new(0.0, -hh),
                    Point::new(hw, hh),
                    Point::new(-hw, hh),
                ],
            )
        }
        ShapeType::Polygon => point_in_polygon_slice(p, points),
    }
}

fn point_in_polygon(p: Point, vertices: &[Point; 3]) -> bool {
    point_in_polygon_slice(p, vertices)
}

/// Even-odd ray-casting containment test.
fn point_in_polygon_slice(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Subtract an eraser polyline from the mask: stamp a zero-alpha disk of
/// the eraser's radius at samples spaced at most one pixel apart.
/// Returns the number of covered pixels that were cleared.
pub(crate) fn stamp_eraser(mask: &mut Mask, points: &[Point], line_width: f64) -> usize {
    let radius = (line_width / 2.0).max(0.5);
    let (w, h) = mask.image.dimensions();
    let mut cleared = 0usize;
    for sample in densify(points, 1.0) {
        // Into mask pixel space.
        let cx = sample.x - mask.origin.x;
        let cy = sample.y - mask.origin.y;
        let x0 = ((cx - radius).floor().max(0.0)) as u32;
        let y0 = ((cy - radius).floor().max(0.0)) as u32;
        let x1 = ((cx + radius).ceil().min(w as f64 - 1.0)).max(0.0) as u32;
        let y1 = ((cy + radius).ceil().min(h as f64 - 1.0)).max(0.0) as u32;
        if cx + radius < 0.0 || cy + radius < 0.0 || cx - radius > w as f64 || cy - radius > h as f64
        {
            continue;
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    let pixel = mask.image.get_pixel_mut(x, y);
                    if pixel.0[0] > 0 {
                        pixel.0[0] = 0;
                        cleared += 1;
                    }
                }
            }
        }
    }
    cleared
}

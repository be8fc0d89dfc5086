//! Raster eraser engine.
//!
//! An eraser gesture is a world-space polyline with a thickness. Rather
//! than composite it destructively into a bitmap, the engine subtracts it
//! from each overlapping vector object and re-vectorizes what survives:
//! strokes are split analytically into sub-polylines, shapes are
//! rasterized into a coverage mask, the eraser is stamped out of the
//! mask, and the surviving islands come back as polygon objects.

mod raster;
mod trace;

use crate::geometry::{densify, local_bounds, local_to_world, points_bounds, world_bounds};
use crate::object::{DrawableObject, ObjectId, ObjectKind, ShapeType};
use kurbo::{Point, Rect};

/// Tuning knobs for the raster half of the engine. The defaults are the
/// observed sweet spot; nothing downstream depends on the exact values.
#[derive(Debug, Clone)]
pub struct EraserConfig {
    /// Mask pixels at or below this alpha count as erased.
    pub alpha_threshold: u8,
    /// Islands smaller than this many pixels are discarded as noise.
    pub min_island_pixels: usize,
    /// Keep every n-th traced boundary vertex.
    pub boundary_downsample: usize,
    /// Padding around object bounds for the fast-reject test and the
    /// raster mask, so round eraser caps at the rim aren't clipped.
    pub bbox_pad: f64,
}

impl Default for EraserConfig {
    fn default() -> Self {
        EraserConfig {
            alpha_threshold: 50,
            min_island_pixels: 10,
            boundary_downsample: 2,
            bbox_pad: 20.0,
        }
    }
}

/// A committed eraser gesture in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct EraserStroke {
    pub points: Vec<Point>,
    pub line_width: f64,
}

impl EraserStroke {
    pub fn radius(&self) -> f64 {
        (self.line_width / 2.0).max(0.5)
    }

    /// Swept AABB: point extents inflated by the radius.
    pub fn bounds(&self) -> Rect {
        points_bounds(&self.points).inflate(self.radius(), self.radius())
    }
}

enum Split {
    /// The eraser didn't actually touch the object.
    Unchanged,
    /// Nothing survived.
    Removed,
    /// The object is replaced by these fragments, in place.
    Fragments(Vec<DrawableObject>),
}

/// Apply an eraser stroke to the scene's objects.
///
/// Substitution is order-preserving: fragments take their source's slot
/// in the vector, so z-order is stable. If the selected object was
/// removed or split, selection moves to its largest surviving fragment,
/// or clears. Returns whether anything changed.
pub fn erase(
    objects: &mut Vec<DrawableObject>,
    selected: &mut Option<ObjectId>,
    stroke: &EraserStroke,
    cfg: &EraserConfig,
) -> bool {
    if stroke.points.is_empty() {
        return false;
    }
    let erase_bounds = stroke.bounds();
    let mut changed = false;
    let mut selection_hit = false;
    let mut best_fragment: Option<(ObjectId, f64)> = None;
    let mut result: Vec<DrawableObject> = Vec::with_capacity(objects.len());

    for obj in objects.drain(..) {
        let is_text = matches!(obj.kind, ObjectKind::Text { .. });
        let candidate = obj.visible
            && !is_text
            && rects_intersect(world_bounds(&obj).inflate(cfg.bbox_pad, cfg.bbox_pad), erase_bounds);
        if !candidate {
            result.push(obj);
            continue;
        }
        let was_selected = selected.as_ref() == Some(&obj.id);
        let split = match &obj.kind {
            ObjectKind::Stroke { .. } => split_stroke(&obj, stroke),
            ObjectKind::Shape { .. } => split_shape(&obj, stroke, cfg),
            ObjectKind::Text { .. } => Split::Unchanged,
        };
        match split {
            Split::Unchanged => result.push(obj),
            Split::Removed => {
                changed = true;
                if was_selected {
                    selection_hit = true;
                }
                log::debug!("erase removed object {}", obj.id);
            }
            Split::Fragments(fragments) => {
                changed = true;
                if was_selected {
                    selection_hit = true;
                    for fragment in &fragments {
                        let b = local_bounds(fragment);
                        let area = b.width() * b.height();
                        if best_fragment.as_ref().map_or(true, |(_, best)| area > *best) {
                            best_fragment = Some((fragment.id.clone(), area));
                        }
                    }
                }
                log::debug!(
                    "erase split object {} into {} fragment(s)",
                    obj.id,
                    fragments.len()
                );
                result.extend(fragments);
            }
        }
    }
    *objects = result;
    if selection_hit {
        *selected = best_fragment.map(|(id, _)| id);
    }
    changed
}

fn rects_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Analytic split for freehand strokes: densify the stroke in world
/// space, drop every sample within the eraser's radius of its polyline,
/// and turn each surviving run of ≥2 samples into a fresh stroke object
/// recentered on its own bounding box (identity transform).
fn split_stroke(obj: &DrawableObject, stroke: &EraserStroke) -> Split {
    let ObjectKind::Stroke { points } = &obj.kind else {
        return Split::Unchanged;
    };
    if points.len() < 2 {
        return Split::Unchanged;
    }
    let world: Vec<Point> = points.iter().map(|p| local_to_world(*p, obj)).collect();
    let step = (obj.line_width / 2.0).max(1.0);
    let dense = densify(&world, step);
    let radius = stroke.radius();

    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    for p in &dense {
        let erased = crate::geometry::distance_point_to_polyline(*p, &stroke.points) <= radius;
        if erased {
            if current.len() >= 2 {
                runs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push(*p);
        }
    }
    if current.len() >= 2 {
        let untouched = current.len() == dense.len();
        if untouched && runs.is_empty() {
            // The whole stroke survived: keep the original object, its
            // transform included, instead of a resampled copy.
            return Split::Unchanged;
        }
        runs.push(current);
    }
    if runs.is_empty() {
        return Split::Removed;
    }
    let fragments = runs
        .into_iter()
        .map(|run| {
            let bounds = points_bounds(&run);
            let center = bounds.center();
            let local: Vec<Point> = run
                .iter()
                .map(|p| Point::new(p.x - center.x, p.y - center.y))
                .collect();
            let mut fragment = DrawableObject::new_stroke(local);
            fragment.x = center.x;
            fragment.y = center.y;
            inherit_cosmetics(&mut fragment, obj);
            fragment
        })
        .collect();
    Split::Fragments(fragments)
}

/// Raster split for parametric shapes: coverage mask over the padded
/// world bounds, destination-out stamp of the eraser, 4-connected island
/// extraction, Moore boundary tracing, and one polygon object per
/// surviving island.
fn split_shape(obj: &DrawableObject, stroke: &EraserStroke, cfg: &EraserConfig) -> Split {
    let Some(mut mask) = raster::rasterize_shape(obj, cfg.bbox_pad) else {
        return Split::Unchanged;
    };
    let cleared = raster::stamp_eraser(&mut mask, &stroke.points, stroke.line_width);
    if cleared == 0 {
        return Split::Unchanged;
    }
    let (labels, islands) =
        trace::find_islands(&mask.image, cfg.alpha_threshold, cfg.min_island_pixels);
    if islands.is_empty() {
        return Split::Removed;
    }
    let (w, h) = mask.image.dimensions();
    let mut fragments = Vec::with_capacity(islands.len());
    for island in &islands {
        let boundary = trace::trace_boundary(&labels, w, h, island);
        let boundary = trace::downsample_boundary(&boundary, cfg.boundary_downsample);
        if boundary.len() < 3 {
            continue;
        }
        let (cx, cy) = island.center();
        let local: Vec<Point> = boundary
            .iter()
            .map(|&(x, y)| Point::new(x - cx, y - cy))
            .collect();
        let mut fragment = DrawableObject::new_shape(
            ShapeType::Polygon,
            island.width() as f64,
            island.height() as f64,
        );
        if let ObjectKind::Shape { points, .. } = &mut fragment.kind {
            *points = local;
        }
        let world_center = mask.pixel_to_world(cx, cy);
        fragment.x = world_center.x;
        fragment.y = world_center.y;
        inherit_cosmetics(&mut fragment, obj);
        fragments.push(fragment);
    }
    if fragments.is_empty() {
        return Split::Removed;
    }
    Split::Fragments(fragments)
}

/// Fragments keep the source object's appearance and layering; only the
/// geometry and the id are new.
fn inherit_cosmetics(fragment: &mut DrawableObject, source: &DrawableObject) {
    fragment.color = source.color.clone();
    fragment.line_width = source.line_width;
    fragment.layer = source.layer;
    fragment.visible = source.visible;
    fragment.name = source.name.clone();
}

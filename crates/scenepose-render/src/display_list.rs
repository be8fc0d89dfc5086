//! Scene walk producing a backend-neutral display list.
//!
//! The engine never touches a drawing surface directly. Each frame the
//! host asks for a [`DisplayList`] and replays it on whatever backend it
//! owns (a web canvas 2D context in practice). Object geometry is
//! emitted in local space with the object's affine attached; selection
//! chrome is emitted in plain world space so handle rects stay crisp.

use kurbo::{Affine, BezPath, Point, Rect};
use scenepose_core::geometry::{local_bounds, local_to_world};
use scenepose_core::hit_test::handles;
use scenepose_core::object::{DrawableObject, LayerBucket, ObjectKind, ShapeType};
use scenepose_core::scene::SceneState;

/// Stroke color of the selection outline and handle borders.
pub const SELECTION_COLOR: &str = "#4a90e2";

/// Fill color of selection handles.
pub const HANDLE_FILL: &str = "#ffffff";

const SELECTION_OUTLINE_WIDTH: f64 = 1.5;
const HANDLE_BORDER_WIDTH: f64 = 1.0;

/// Curve-flattening tolerance for parametric shapes.
const PATH_TOLERANCE: f64 = 0.1;

/// Extra gap between the text block top and successive line boxes,
/// as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// A single backend drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Reset the surface to fully transparent.
    Clear,
    /// Stroke an open polyline with round caps and joins.
    Polyline {
        points: Vec<Point>,
        transform: Affine,
        color: String,
        width: f64,
    },
    Fill {
        path: BezPath,
        transform: Affine,
        color: String,
    },
    Stroke {
        path: BezPath,
        transform: Affine,
        color: String,
        width: f64,
    },
    /// One line of text, filled left-aligned from `origin` (the top-left
    /// corner of the line box).
    TextLine {
        text: String,
        origin: Point,
        transform: Affine,
        color: String,
        font_size: f64,
        font_family: String,
        font_weight: String,
    },
}

/// An ordered list of draw commands; replay order is z-order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Build the full frame: clear, the back bucket, the front bucket, the
/// in-progress active object, and — unless the scene is exporting — the
/// selection chrome. The host composites its character viewports between
/// the two buckets.
pub fn render_scene(scene: &SceneState) -> DisplayList {
    let mut list = DisplayList::default();
    list.commands.push(DrawCommand::Clear);
    push_bucket(&mut list, scene, LayerBucket::Back);
    push_bucket(&mut list, scene, LayerBucket::Front);
    if let Some(active) = scene.active_object() {
        push_object(&mut list, active);
    }
    if !scene.is_exporting() {
        if let Some(selected) = scene.selected_object() {
            push_selection_chrome(&mut list, selected);
        }
    }
    log::trace!("display list: {} command(s)", list.len());
    list
}

/// Commands for one compositing bucket only, in vector order. No clear,
/// no chrome: this is the piece the host layers around the characters.
pub fn render_bucket(scene: &SceneState, bucket: LayerBucket) -> DisplayList {
    let mut list = DisplayList::default();
    push_bucket(&mut list, scene, bucket);
    list
}

fn push_bucket(list: &mut DisplayList, scene: &SceneState, bucket: LayerBucket) {
    for obj in scene.objects() {
        if obj.visible && obj.layer == bucket {
            push_object(list, obj);
        }
    }
}

fn object_transform(obj: &DrawableObject) -> Affine {
    Affine::translate((obj.x, obj.y))
        * Affine::rotate(obj.rotation)
        * Affine::scale_non_uniform(obj.scale_x, obj.scale_y)
}

fn push_object(list: &mut DisplayList, obj: &DrawableObject) {
    let transform = object_transform(obj);
    match &obj.kind {
        ObjectKind::Stroke { points } => {
            if points.len() < 2 {
                return;
            }
            list.commands.push(DrawCommand::Polyline {
                points: points.clone(),
                transform,
                color: obj.color.clone(),
                width: obj.line_width,
            });
        }
        ObjectKind::Shape {
            shape,
            width,
            height,
            points,
        } => push_shape(list, obj, transform, *shape, *width, *height, points),
        ObjectKind::Text {
            text,
            font_size,
            font_family,
            font_weight,
            width,
            height,
        } => {
            let line_height = font_size * LINE_HEIGHT_FACTOR;
            let left = -width / 2.0;
            let top = -height / 2.0;
            for (i, line) in text.lines().enumerate() {
                list.commands.push(DrawCommand::TextLine {
                    text: line.to_string(),
                    origin: Point::new(left, top + i as f64 * line_height),
                    transform,
                    color: obj.color.clone(),
                    font_size: *font_size,
                    font_family: font_family.clone(),
                    font_weight: font_weight.clone(),
                });
            }
        }
    }
}

fn push_shape(
    list: &mut DisplayList,
    obj: &DrawableObject,
    transform: Affine,
    shape: ShapeType,
    width: f64,
    height: f64,
    points: &[Point],
) {
    use kurbo::Shape as _;
    let hw = width / 2.0;
    let hh = height / 2.0;
    match shape {
        ShapeType::Line => list.commands.push(DrawCommand::Polyline {
            points: vec![Point::new(-hw, 0.0), Point::new(hw, 0.0)],
            transform,
            color: obj.color.clone(),
            width: obj.line_width,
        }),
        ShapeType::Rect => list.commands.push(DrawCommand::Fill {
            path: Rect::new(-hw, -hh, hw, hh).to_path(PATH_TOLERANCE),
            transform,
            color: obj.color.clone(),
        }),
        ShapeType::Circle => list.commands.push(DrawCommand::Fill {
            path: kurbo::Ellipse::new(Point::ZERO, (hw, hh), 0.0).to_path(PATH_TOLERANCE),
            transform,
            color: obj.color.clone(),
        }),
        ShapeType::Triangle => {
            let mut path = BezPath::new();
            path.move_to((0.0, -hh));
            path.line_to((hw, hh));
            path.line_to((-hw, hh));
            path.close_path();
            list.commands.push(DrawCommand::Fill {
                path,
                transform,
                color: obj.color.clone(),
            });
        }
        ShapeType::Polygon => {
            if points.len() < 3 {
                return;
            }
            let mut path = BezPath::new();
            path.move_to(points[0]);
            for p in &points[1..] {
                path.line_to(*p);
            }
            path.close_path();
            list.commands.push(DrawCommand::Fill {
                path,
                transform,
                color: obj.color.clone(),
            });
        }
    }
}

/// Selection outline (the rotated local bounds quad) plus the handles,
/// all in world space with the identity transform.
fn push_selection_chrome(list: &mut DisplayList, obj: &DrawableObject) {
    let b = local_bounds(obj);
    let corners = [
        Point::new(b.x0, b.y0),
        Point::new(b.x1, b.y0),
        Point::new(b.x1, b.y1),
        Point::new(b.x0, b.y1),
    ];
    let mut outline = BezPath::new();
    outline.move_to(local_to_world(corners[0], obj));
    for corner in &corners[1..] {
        outline.line_to(local_to_world(*corner, obj));
    }
    outline.close_path();
    list.commands.push(DrawCommand::Stroke {
        path: outline,
        transform: Affine::IDENTITY,
        color: SELECTION_COLOR.to_string(),
        width: SELECTION_OUTLINE_WIDTH,
    });

    for handle in handles(obj) {
        use kurbo::Shape as _;
        let half = handle.size / 2.0;
        let rect = Rect::new(
            handle.center.x - half,
            handle.center.y - half,
            handle.center.x + half,
            handle.center.y + half,
        );
        let path = rect.to_path(PATH_TOLERANCE);
        list.commands.push(DrawCommand::Fill {
            path: path.clone(),
            transform: Affine::IDENTITY,
            color: HANDLE_FILL.to_string(),
        });
        list.commands.push(DrawCommand::Stroke {
            path,
            transform: Affine::IDENTITY,
            color: SELECTION_COLOR.to_string(),
            width: HANDLE_BORDER_WIDTH,
        });
    }
}

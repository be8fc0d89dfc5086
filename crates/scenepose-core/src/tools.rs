//! Tool selection, brush style and the pointer-gesture state machine.

use crate::hit_test::HandleKind;
use crate::object::{DrawableObject, ShapeType};
use kurbo::Point;

/// The active editing tool. Switching tools cancels any in-flight
/// gesture without committing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Pen,
    Eraser,
    Shape(ShapeType),
    Text,
}

/// What the pointer is currently doing. Every non-idle state returns to
/// `Idle` on commit or cancel.
#[derive(Debug, Clone)]
pub(crate) enum Gesture {
    Idle,
    /// Pen drag; the in-progress stroke lives in the scene's active slot.
    DrawingStroke,
    /// Shape drag anchored at the pointer-down position.
    DrawingShape { start: Point },
    /// Eraser drag, accumulating the world-space gesture polyline.
    Erasing { points: Vec<Point> },
    /// Dragging the selected object. `before` is the object vector at
    /// gesture start, pushed to history only if the drag changed anything.
    Moving {
        start: Point,
        origin: (f64, f64),
        before: Vec<DrawableObject>,
    },
    /// Dragging a selection handle. `half` is the selected object's local
    /// half extents at gesture start.
    Resizing {
        handle: HandleKind,
        half: (f64, f64),
        before: Vec<DrawableObject>,
    },
    /// A text editor is open at `origin`, waiting for commit or cancel.
    EditingText { origin: Point },
}

impl Gesture {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Current drawing style, applied to newly created objects.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushStyle {
    pub color: String,
    pub line_width: f64,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
}

impl Default for BrushStyle {
    fn default() -> Self {
        BrushStyle {
            color: "#000000".to_string(),
            line_width: 3.0,
            font_size: 24.0,
            font_family: "sans-serif".to_string(),
            font_weight: "normal".to_string(),
        }
    }
}

/// Measured size of a committed text block. Text layout happens in the
/// host (it owns the fonts); the engine only stores the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

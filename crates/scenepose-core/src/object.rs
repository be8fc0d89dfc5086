//! Drawable object model and its persisted record form.
//!
//! The in-memory model is strict: `ObjectKind` is a tagged variant, so a
//! stroke has points, a text has font fields, and neither carries the
//! other's baggage. The persisted form ([`ObjectRecord`]) is the loose,
//! camelCase JSON shape that historical saves used; it round-trips through
//! [`DrawableObject::normalize`], which fills defaults, clamps scales and
//! flags legacy eraser records for one-time migration.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Floor for both scale axes. Scaling through zero would make the affine
/// transform non-invertible and flip geometry; the controller clamps here
/// instead.
pub const MIN_SCALE: f64 = 0.1;

/// Opaque object identifier. Freshly generated ids are uuid-v4 hex, but
/// any non-empty string loaded from storage is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh unique id.
    pub fn generate() -> Self {
        ObjectId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        ObjectId(s)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse compositing bucket relative to the avatar characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayerBucket {
    #[default]
    Front,
    Back,
}

/// Geometric shape families the shape tool (and the eraser) can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Line,
    Rect,
    Circle,
    Triangle,
    /// Only produced by the eraser engine when it re-vectorizes surviving
    /// islands of an erased shape.
    Polygon,
}

impl ShapeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Line => "line",
            ShapeType::Rect => "rect",
            ShapeType::Circle => "circle",
            ShapeType::Triangle => "triangle",
            ShapeType::Polygon => "polygon",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "line" => Some(ShapeType::Line),
            "rect" => Some(ShapeType::Rect),
            "circle" => Some(ShapeType::Circle),
            "triangle" => Some(ShapeType::Triangle),
            "polygon" => Some(ShapeType::Polygon),
            _ => None,
        }
    }
}

/// Per-kind payload. Fields only exist where they mean something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Freehand pen stroke; points are local-space, ≥2 once committed.
    Stroke { points: Vec<Point> },
    /// Parametric shape. `points` is empty except for `Polygon`, whose
    /// local-space boundary it holds.
    Shape {
        shape: ShapeType,
        width: f64,
        height: f64,
        points: Vec<Point>,
    },
    /// Committed text block; width/height are the metrics measured by the
    /// text editor at commit time.
    Text {
        text: String,
        font_size: f64,
        font_family: String,
        font_weight: String,
        width: f64,
        height: f64,
    },
}

impl ObjectKind {
    /// Human-readable kind label for auto-generated display names.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Stroke { .. } => "Stroke",
            ObjectKind::Shape { shape, .. } => match shape {
                ShapeType::Line => "Line",
                ShapeType::Rect => "Rectangle",
                ShapeType::Circle => "Circle",
                ShapeType::Triangle => "Triangle",
                ShapeType::Polygon => "Polygon",
            },
            ObjectKind::Text { .. } => "Text",
        }
    }
}

/// A single object on the drawing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableObject {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    /// Radians, applied after scale.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// CSS color string, passed through to the render backend untouched.
    pub color: String,
    pub line_width: f64,
    pub visible: bool,
    pub layer: LayerBucket,
    /// User-assigned name; `None` falls back to an auto label.
    pub name: Option<String>,
    /// Monotonic insertion counter used only for display labels; z-order
    /// lives in the containing vector, never here.
    pub layer_order_index: Option<u64>,
    pub kind: ObjectKind,
}

impl DrawableObject {
    pub fn new_stroke(points: Vec<Point>) -> Self {
        Self::with_kind(ObjectKind::Stroke { points })
    }

    pub fn new_shape(shape: ShapeType, width: f64, height: f64) -> Self {
        Self::with_kind(ObjectKind::Shape {
            shape,
            width,
            height,
            points: Vec::new(),
        })
    }

    pub fn new_text(
        text: String,
        font_size: f64,
        font_family: String,
        font_weight: String,
        width: f64,
        height: f64,
    ) -> Self {
        Self::with_kind(ObjectKind::Text {
            text,
            font_size,
            font_family,
            font_weight,
            width,
            height,
        })
    }

    fn with_kind(kind: ObjectKind) -> Self {
        DrawableObject {
            id: ObjectId::generate(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            color: "#000000".to_string(),
            line_width: 2.0,
            visible: true,
            layer: LayerBucket::Front,
            name: None,
            layer_order_index: None,
            kind,
        }
    }

    /// Assign a fresh id, e.g. for a pasted clone.
    pub fn regenerate_id(&mut self) {
        self.id = ObjectId::generate();
    }

    /// Clamp both scale axes to the floor. Call after any scale mutation.
    pub fn clamp_scale(&mut self) {
        if self.scale_x < MIN_SCALE {
            self.scale_x = MIN_SCALE;
        }
        if self.scale_y < MIN_SCALE {
            self.scale_y = MIN_SCALE;
        }
    }

    /// Name shown in the layer panel: the user-assigned name, or
    /// "{kind} {insertion index}".
    pub fn display_label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!(
                "{} {}",
                self.kind.label(),
                self.layer_order_index.unwrap_or(0)
            ),
        }
    }

    /// Build the strict model from a loose persisted record.
    ///
    /// Total over all inputs: missing fields take defaults, scales are
    /// clamped, unknown types are discarded, and legacy `eraser` records
    /// surface as migration items for the loader to replay once.
    pub fn normalize(record: ObjectRecord) -> NormalizedRecord {
        let points: Vec<Point> = record.points.unwrap_or_default();
        let line_width = record.line_width.unwrap_or(2.0).max(0.0);

        let kind = match record.kind.as_deref() {
            Some("stroke") | None => ObjectKind::Stroke { points },
            Some("eraser") => {
                return NormalizedRecord::LegacyEraser { points, line_width };
            }
            Some("shape") => {
                let shape = record
                    .shape_type
                    .as_deref()
                    .and_then(ShapeType::parse)
                    .unwrap_or(ShapeType::Rect);
                ObjectKind::Shape {
                    shape,
                    width: record.width.unwrap_or(0.0),
                    height: record.height.unwrap_or(0.0),
                    points,
                }
            }
            Some("text") => ObjectKind::Text {
                text: record.text.unwrap_or_default(),
                font_size: record.font_size.unwrap_or(24.0),
                font_family: record.font_family.unwrap_or_else(|| "sans-serif".to_string()),
                font_weight: record.font_weight.unwrap_or_else(|| "normal".to_string()),
                width: record.width.unwrap_or(0.0),
                height: record.height.unwrap_or(0.0),
            },
            Some(_) => return NormalizedRecord::Discard,
        };

        let mut obj = DrawableObject {
            id: match record.id {
                Some(id) if !id.is_empty() => ObjectId::from(id),
                _ => ObjectId::generate(),
            },
            x: record.x.unwrap_or(0.0),
            y: record.y.unwrap_or(0.0),
            rotation: record.rotation.unwrap_or(0.0),
            scale_x: record.scale_x.unwrap_or(1.0),
            scale_y: record.scale_y.unwrap_or(1.0),
            color: record.color.unwrap_or_else(|| "#000000".to_string()),
            line_width,
            visible: record.visible.unwrap_or(true),
            layer: match record.layer.as_deref() {
                Some("back") => LayerBucket::Back,
                _ => LayerBucket::Front,
            },
            name: record.name,
            layer_order_index: record.layer_order_index,
            kind,
        };
        obj.clamp_scale();
        NormalizedRecord::Object(obj)
    }

    /// Flatten back into the loose persisted shape.
    pub fn to_record(&self) -> ObjectRecord {
        let mut record = ObjectRecord {
            id: Some(self.id.as_str().to_string()),
            x: Some(self.x),
            y: Some(self.y),
            rotation: Some(self.rotation),
            scale_x: Some(self.scale_x),
            scale_y: Some(self.scale_y),
            color: Some(self.color.clone()),
            line_width: Some(self.line_width),
            visible: Some(self.visible),
            layer: Some(
                match self.layer {
                    LayerBucket::Front => "front",
                    LayerBucket::Back => "back",
                }
                .to_string(),
            ),
            name: self.name.clone(),
            layer_order_index: self.layer_order_index,
            ..ObjectRecord::default()
        };
        match &self.kind {
            ObjectKind::Stroke { points } => {
                record.kind = Some("stroke".to_string());
                record.points = Some(points.clone());
            }
            ObjectKind::Shape {
                shape,
                width,
                height,
                points,
            } => {
                record.kind = Some("shape".to_string());
                record.shape_type = Some(shape.as_str().to_string());
                record.width = Some(*width);
                record.height = Some(*height);
                if !points.is_empty() {
                    record.points = Some(points.clone());
                }
            }
            ObjectKind::Text {
                text,
                font_size,
                font_family,
                font_weight,
                width,
                height,
            } => {
                record.kind = Some("text".to_string());
                record.text = Some(text.clone());
                record.font_size = Some(*font_size);
                record.font_family = Some(font_family.clone());
                record.font_weight = Some(font_weight.clone());
                record.width = Some(*width);
                record.height = Some(*height);
            }
        }
        record
    }
}

/// Result of normalizing one persisted record.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRecord {
    Object(DrawableObject),
    /// Pre-vectorization saves persisted eraser gestures as records; the
    /// loader replays them through the eraser engine once and drops them.
    LegacyEraser { points: Vec<Point>, line_width: f64 },
    Discard,
}

/// The loose camelCase JSON shape the scene is persisted as. Every field
/// is optional so old and partially-corrupt saves still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectRecord {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub color: Option<String>,
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    pub visible: Option<bool>,
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "_layerOrderIndex", skip_serializing_if = "Option::is_none")]
    pub layer_order_index: Option<u64>,
}

/// Hands out insertion indexes for display labels. Indexes are assigned
/// once per object and never reused, even across deletes.
#[derive(Debug, Clone, Default)]
pub struct LayerOrderCounter {
    next: u64,
}

impl LayerOrderCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an index if the object doesn't have one yet.
    pub fn ensure(&mut self, obj: &mut DrawableObject) {
        match obj.layer_order_index {
            Some(existing) => {
                // Loaded objects keep their saved index; the counter must
                // stay ahead of it.
                if existing >= self.next {
                    self.next = existing + 1;
                }
            }
            None => {
                obj.layer_order_index = Some(self.next);
                self.next += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_unique() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_normalize_empty_record_defaults() {
        let record = ObjectRecord::default();
        let NormalizedRecord::Object(obj) = DrawableObject::normalize(record) else {
            panic!("empty record should normalize to a stroke");
        };
        assert_eq!(obj.x, 0.0);
        assert_eq!(obj.scale_x, 1.0);
        assert!(obj.visible);
        assert_eq!(obj.layer, LayerBucket::Front);
        assert!(matches!(obj.kind, ObjectKind::Stroke { ref points } if points.is_empty()));
    }

    #[test]
    fn test_normalize_clamps_scale() {
        let record = ObjectRecord {
            kind: Some("shape".to_string()),
            shape_type: Some("circle".to_string()),
            scale_x: Some(0.0),
            scale_y: Some(-3.0),
            ..ObjectRecord::default()
        };
        let NormalizedRecord::Object(obj) = DrawableObject::normalize(record) else {
            panic!("shape record should normalize");
        };
        assert_eq!(obj.scale_x, MIN_SCALE);
        assert_eq!(obj.scale_y, MIN_SCALE);
    }

    #[test]
    fn test_normalize_legacy_eraser() {
        let record = ObjectRecord {
            kind: Some("eraser".to_string()),
            points: Some(vec![Point::new(1.0, 2.0)]),
            line_width: Some(30.0),
            ..ObjectRecord::default()
        };
        match DrawableObject::normalize(record) {
            NormalizedRecord::LegacyEraser { points, line_width } => {
                assert_eq!(points.len(), 1);
                assert_eq!(line_width, 30.0);
            }
            other => panic!("expected legacy eraser, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_unknown_type_discarded() {
        let record = ObjectRecord {
            kind: Some("hologram".to_string()),
            ..ObjectRecord::default()
        };
        assert_eq!(DrawableObject::normalize(record), NormalizedRecord::Discard);
    }

    #[test]
    fn test_record_round_trip() {
        let mut obj = DrawableObject::new_text(
            "hi\nthere".to_string(),
            32.0,
            "serif".to_string(),
            "bold".to_string(),
            120.0,
            76.8,
        );
        obj.x = 10.0;
        obj.y = -4.0;
        obj.rotation = 0.3;
        obj.layer = LayerBucket::Back;
        obj.layer_order_index = Some(7);

        let json = serde_json::to_string(&obj.to_record()).unwrap();
        let record: ObjectRecord = serde_json::from_str(&json).unwrap();
        let NormalizedRecord::Object(back) = DrawableObject::normalize(record) else {
            panic!("round trip should stay an object");
        };
        assert_eq!(back, obj);
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let obj = DrawableObject::new_shape(ShapeType::Triangle, 10.0, 20.0);
        let json = serde_json::to_string(&obj.to_record()).unwrap();
        assert!(json.contains("\"shapeType\""));
        assert!(json.contains("\"lineWidth\""));
        assert!(json.contains("\"scaleX\""));
    }

    #[test]
    fn test_order_counter_monotonic_past_loaded() {
        let mut counter = LayerOrderCounter::new();
        let mut a = DrawableObject::new_stroke(vec![]);
        a.layer_order_index = Some(5);
        counter.ensure(&mut a);
        assert_eq!(a.layer_order_index, Some(5));

        let mut b = DrawableObject::new_stroke(vec![]);
        counter.ensure(&mut b);
        assert_eq!(b.layer_order_index, Some(6));

        // Never reassigned.
        counter.ensure(&mut b);
        assert_eq!(b.layer_order_index, Some(6));
    }

    #[test]
    fn test_display_label_fallback() {
        let mut obj = DrawableObject::new_shape(ShapeType::Circle, 5.0, 5.0);
        obj.layer_order_index = Some(3);
        assert_eq!(obj.display_label(), "Circle 3");
        obj.name = Some("moon".to_string());
        assert_eq!(obj.display_label(), "moon");
    }
}

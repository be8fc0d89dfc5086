//! Boundary types for the posable-avatar collaborator.
//!
//! The 3D characters are rendered by an external viewer; the object
//! layer only shares their pixel coordinate space and their clipboard
//! payload. Nothing here is mutated by the engine — these types exist so
//! the host, the persistence layer and the character clipboard agree on
//! one shape.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Euler rotation of one pose joint, radians per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointRotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The five posable joints of the humanoid rig.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseJoints {
    pub head: JointRotation,
    pub right_arm: JointRotation,
    pub left_arm: JointRotation,
    pub right_leg: JointRotation,
    pub left_leg: JointRotation,
}

/// Orbit-camera position of a character viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for CameraPosition {
    fn default() -> Self {
        // Head-on at a comfortable distance.
        CameraPosition { x: 0.0, y: 0.0, z: 40.0 }
    }
}

/// The host-side character viewer the engine coordinates with.
pub trait AvatarViewer {
    /// Swap the character's skin texture by url.
    fn load_skin(&mut self, url: &str);

    fn camera_position(&self) -> CameraPosition;
    fn set_camera_position(&mut self, position: CameraPosition);

    fn pose(&self) -> PoseJoints;
    fn set_pose(&mut self, pose: PoseJoints);
}

/// One character viewport placed on the canvas, in the same pixel space
/// the drawable objects use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterViewport {
    pub id: String,
    pub name: String,
    /// Skin texture url, if one has been applied.
    pub skin: Option<String>,
    /// Placement rect in canvas pixels.
    #[serde(with = "rect_xywh")]
    pub rect: Rect,
    pub visible: bool,
    pub pose: PoseJoints,
    pub camera: CameraPosition,
}

/// Clipboard payload for copying a whole character: everything needed to
/// reproduce it — name, skin, pose, camera and viewport geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterClipboard {
    pub name: String,
    pub skin: Option<String>,
    pub pose: PoseJoints,
    pub camera: CameraPosition,
    pub width: f64,
    pub height: f64,
}

impl CharacterClipboard {
    pub fn from_viewport(viewport: &CharacterViewport) -> Self {
        CharacterClipboard {
            name: viewport.name.clone(),
            skin: viewport.skin.clone(),
            pose: viewport.pose,
            camera: viewport.camera,
            width: viewport.rect.width(),
            height: viewport.rect.height(),
        }
    }
}

/// Persist rects as `{x, y, width, height}` to match the historical
/// viewport JSON rather than kurbo's corner representation.
mod rect_xywh {
    use kurbo::Rect;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Repr {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    }

    pub fn serialize<S: Serializer>(rect: &Rect, serializer: S) -> Result<S::Ok, S::Error> {
        Repr {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rect, D::Error> {
        let repr = Repr::deserialize(deserializer)?;
        Ok(Rect::new(
            repr.x,
            repr.y,
            repr.x + repr.width,
            repr.y + repr.height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> CharacterViewport {
        CharacterViewport {
            id: "c1".to_string(),
            name: "Steve".to_string(),
            skin: Some("skins/steve.png".to_string()),
            rect: Rect::new(100.0, 50.0, 300.0, 450.0),
            visible: true,
            pose: PoseJoints {
                head: JointRotation { x: 0.1, y: -0.2, z: 0.0 },
                ..PoseJoints::default()
            },
            camera: CameraPosition::default(),
        }
    }

    #[test]
    fn test_viewport_json_shape() {
        let json = serde_json::to_string(&viewport()).unwrap();
        assert!(json.contains("\"rightArm\""));
        assert!(json.contains("\"width\":200.0") || json.contains("\"width\":200"));
        let back: CharacterViewport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, viewport());
    }

    #[test]
    fn test_clipboard_captures_geometry() {
        let clip = CharacterClipboard::from_viewport(&viewport());
        assert_eq!(clip.width, 200.0);
        assert_eq!(clip.height, 400.0);
        assert_eq!(clip.pose.head.x, 0.1);
    }
}

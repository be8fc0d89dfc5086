//! Core object-layer engine for the ScenePose scene editor.
//!
//! A scene is a stack of posable avatar viewports with a vector drawing
//! layer over (and under) them. This crate owns that drawing layer:
//! the object model and its persistence format, transform and distance
//! math, hit-testing and selection handles, the raster eraser that
//! splits vector objects, and the scene controller driving gestures,
//! undo/redo, clipboard and z-order.
//!
//! Rendering is deliberately elsewhere: `scenepose-render` walks this
//! crate's state and emits a backend-neutral display list.

pub mod avatar;
pub mod eraser;
pub mod geometry;
pub mod object;
pub mod scene;
pub mod storage;
pub mod tools;

pub use eraser::{EraserConfig, EraserStroke};
pub use hit_test::{Handle, HandleKind};
pub use object::{
    DrawableObject, LayerBucket, ObjectId, ObjectKind, ObjectRecord, ShapeType, MIN_SCALE,
};
pub use scene::{SceneState, MAX_HISTORY, PASTE_OFFSET};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, SCENE_STORAGE_KEY};
pub use tools::{BrushStyle, TextMetrics, Tool};

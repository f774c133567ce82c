//! Sketchboard Core Library
//!
//! Platform-agnostic scene editing engine: shapes, geometry, snapping,
//! connections, the selection tool and undo history.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod connection;
pub mod editor;
pub mod events;
pub mod geometry;
pub mod history;
pub mod input;
pub mod render;
pub mod shapes;
pub mod snap;
pub mod snapshot;
pub mod store;
pub mod tools;

pub use camera::Camera;
pub use canvas::Canvas;
pub use config::{ConfigError, EditorConfig};
pub use connection::{Anchor, Connection, ConnectionSet, Role};
pub use editor::Editor;
pub use events::{EditorEvent, EventBus, Subscription};
pub use geometry::{CursorIcon, ResizeDirection};
pub use history::{History, HistoryRecord};
pub use input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent, Shortcut};
pub use render::{DrawMode, Overlay, Surface, render_scene};
pub use shapes::{Mutation, Shape, ShapeId, ShapeKind, ShapeStyle};
pub use snap::{GuideLine, SnapOutcome, SnapSettings};
pub use snapshot::{ShapeSnapshot, SnapshotError, scene_from_json, scene_to_json};
pub use store::ShapeStore;
pub use tools::{SelectState, Submode, ToolKind};

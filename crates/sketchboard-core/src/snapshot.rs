//! Structural JSON snapshots of shapes and scenes.
//!
//! A snapshot is a flat object per shape: frame, style and kind fields side
//! by side with a `type` discriminator. Transient editor state (the active
//! selection, hover outlines, in-flight gestures) is never part of it.

use crate::shapes::{Shape, ShapeId};
use crate::store::ShapeStore;
use serde_json::{Map, Value};
use thiserror::Error;

/// Flat JSON object describing one shape.
pub type ShapeSnapshot = Value;

/// `type` values [`Shape::from_snapshot`] understands.
pub const KNOWN_TYPES: [&str; 9] = [
    "rectangle", "ellipse", "path", "line", "text", "image", "icon", "group", "selection",
];

/// Errors from whole-scene loading.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot is not a JSON object")]
    NotAnObject,
    #[error("scene is not a JSON array")]
    NotAnArray,
    #[error("unknown shape type: {0}")]
    UnknownType(String),
}

impl Shape {
    /// Serialize into a flat snapshot object.
    pub fn to_snapshot(&self) -> ShapeSnapshot {
        match serde_json::to_value(self) {
            Ok(value) => value,
            Err(err) => {
                log::error!("Failed to snapshot shape {}: {err}", self.id());
                Value::Null
            }
        }
    }

    /// Rebuild a shape from a snapshot. Unknown types and malformed data
    /// yield `None` with a warning; the caller decides whether to skip.
    pub fn from_snapshot(snapshot: &ShapeSnapshot) -> Option<Shape> {
        match Self::try_from_snapshot(snapshot) {
            Ok(shape) => Some(shape),
            Err(err) => {
                log::warn!("Skipping shape snapshot: {err}");
                None
            }
        }
    }

    /// Like [`Shape::from_snapshot`] but reports why reconstruction failed.
    pub fn try_from_snapshot(snapshot: &ShapeSnapshot) -> Result<Shape, SnapshotError> {
        let object = snapshot.as_object().ok_or(SnapshotError::NotAnObject)?;
        let kind = object.get("type").and_then(Value::as_str).unwrap_or_default();
        if !KNOWN_TYPES.contains(&kind) {
            return Err(SnapshotError::UnknownType(kind.to_string()));
        }
        let mut shape: Shape = serde_json::from_value(snapshot.clone())?;
        shape.sync_frame();
        shape.normalize_frame();
        Ok(shape)
    }
}

/// Top-level fields that differ between two snapshots of the same shape.
/// Returns `(before, after)` maps; a field missing on one side is `null`.
pub fn diff_fields(
    before: &ShapeSnapshot,
    after: &ShapeSnapshot,
) -> Option<(Map<String, Value>, Map<String, Value>)> {
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return None;
    };
    let mut old = Map::new();
    let mut new = Map::new();
    for key in before.keys().chain(after.keys()) {
        if old.contains_key(key) {
            continue;
        }
        let a = before.get(key).cloned().unwrap_or(Value::Null);
        let b = after.get(key).cloned().unwrap_or(Value::Null);
        if a != b {
            old.insert(key.clone(), a);
            new.insert(key.clone(), b);
        }
    }
    if old.is_empty() { None } else { Some((old, new)) }
}

/// Overlay `fields` onto a snapshot. `null` removes the field.
pub fn apply_fields(snapshot: &mut ShapeSnapshot, fields: &Map<String, Value>) {
    let Some(object) = snapshot.as_object_mut() else {
        return;
    };
    for (key, value) in fields {
        if value.is_null() {
            object.remove(key);
        } else {
            object.insert(key.clone(), value.clone());
        }
    }
}

/// Serialize every persistent shape in z-order. Selection shapes are left out.
pub fn scene_to_json(store: &ShapeStore) -> Result<String, SnapshotError> {
    let shapes: Vec<ShapeSnapshot> = store
        .iter()
        .filter(|s| !s.is_selection())
        .map(Shape::to_snapshot)
        .collect();
    Ok(serde_json::to_string_pretty(&shapes)?)
}

/// Parse a scene. Unknown or malformed shapes are skipped with a warning;
/// a document that is not an array of objects is an error.
pub fn scene_from_json(json: &str) -> Result<Vec<Shape>, SnapshotError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(SnapshotError::NotAnArray);
    };
    let mut shapes = Vec::with_capacity(items.len());
    let mut seen: Vec<ShapeId> = Vec::with_capacity(items.len());
    for item in &items {
        let Some(shape) = Shape::from_snapshot(item) else {
            continue;
        };
        if shape.is_selection() {
            continue;
        }
        if seen.contains(&shape.id()) {
            log::warn!("Skipping duplicate shape id {}", shape.id());
            continue;
        }
        seen.push(shape.id());
        shapes.push(shape);
    }
    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Anchor, Connection, Role};
    use crate::shapes::{Caption, Icon, Image, PathShape};
    use kurbo::{Point, Rect};
    use serde_json::json;

    #[test]
    fn test_snapshot_is_flat_with_type() {
        let shape = Shape::rectangle(Rect::new(10.0, 20.0, 110.0, 70.0));
        let snapshot = shape.to_snapshot();
        assert_eq!(snapshot["type"], "rectangle");
        assert_eq!(snapshot["left"], 10.0);
        assert_eq!(snapshot["width"], 100.0);
        assert!(snapshot.get("strokeWidth").is_some());
        assert!(snapshot.get("caption").is_none());
    }

    #[test]
    fn test_path_snapshot_carries_path_type() {
        let shape = Shape::polygon(Rect::new(0.0, 0.0, 50.0, 50.0), PathShape::diamond().points);
        let snapshot = shape.to_snapshot();
        assert_eq!(snapshot["type"], "path");
        assert_eq!(snapshot["pathType"], "polygon");
    }

    #[test]
    fn test_every_kind_survives_snapshot() {
        let mut line = Shape::line(Point::ZERO, Point::new(40.0, 40.0));
        line.connections
            .add(Connection::new(uuid::Uuid::new_v4(), Anchor::Top.coords(), Role::Start));
        let shapes = vec![
            Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)).with_caption(Caption::new("hi")),
            Shape::ellipse(Rect::new(0.0, 0.0, 40.0, 40.0)),
            Shape::freehand(&[Point::ZERO, Point::new(30.0, 12.0), Point::new(60.0, 0.0)]),
            line,
            Shape::text(Point::ZERO, "hello"),
            Shape::image(Rect::new(0.0, 0.0, 40.0, 40.0), Image::embedded(&[1, 2, 3], 4, 4)),
            Shape::icon(Rect::new(0.0, 0.0, 24.0, 24.0), Icon::default()),
            Shape::group(vec![Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0))]),
        ];
        for shape in shapes {
            let restored = Shape::from_snapshot(&shape.to_snapshot());
            assert_eq!(restored.as_ref(), Some(&shape), "{} did not survive", shape.kind_name());
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let snapshot = json!({ "type": "hexagon", "left": 0.0 });
        assert!(Shape::from_snapshot(&snapshot).is_none());
        assert!(matches!(
            Shape::try_from_snapshot(&snapshot),
            Err(SnapshotError::UnknownType(kind)) if kind == "hexagon"
        ));
        assert!(matches!(Shape::try_from_snapshot(&json!(3)), Err(SnapshotError::NotAnObject)));
    }

    #[test]
    fn test_snapshot_normalizes_negative_size() {
        let mut snapshot = Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)).to_snapshot();
        snapshot["left"] = json!(100.0);
        snapshot["width"] = json!(-50.0);
        snapshot["height"] = json!(5.0);

        let shape = Shape::from_snapshot(&snapshot).unwrap();
        assert_eq!(shape.rect(), Rect::new(50.0, 0.0, 100.0, 20.0));
    }

    #[test]
    fn test_scene_must_be_an_array() {
        assert!(matches!(scene_from_json("{}"), Err(SnapshotError::NotAnArray)));
        assert!(matches!(scene_from_json("[1"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_scene_skips_unknown_and_selection() {
        let mut store = ShapeStore::new();
        let a = store.insert(Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)));
        store.insert(Shape::selection(vec![a], Rect::new(0.0, 0.0, 40.0, 40.0)));
        let json = scene_to_json(&store).unwrap();

        let mut value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        value
            .as_array_mut()
            .unwrap()
            .push(json!({ "type": "hexagon" }));

        let shapes = scene_from_json(&value.to_string()).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].id(), a);
    }

    #[test]
    fn test_diff_and_apply_fields() {
        let shape = Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0));
        let before = shape.to_snapshot();
        let mut moved = shape.clone();
        moved.translate(kurbo::Vec2::new(5.0, 0.0));
        let after = moved.to_snapshot();

        let (old, new) = diff_fields(&before, &after).unwrap();
        assert_eq!(old.keys().collect::<Vec<_>>(), vec!["left"]);
        assert_eq!(new["left"], 5.0);

        let mut restored = after.clone();
        apply_fields(&mut restored, &old);
        assert_eq!(restored, before);
        assert!(diff_fields(&before, &before).is_none());
    }
}

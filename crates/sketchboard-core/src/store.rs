//! Ordered shape storage with connection bookkeeping.

use crate::connection::{Connection, ConnectionEvent, Role};
use crate::geometry::{contains_rect, union_rects};
use crate::shapes::{Shape, ShapeId, ShapeKind};
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// All shapes of a scene keyed by id, plus their z-order (back to front).
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
    last_inserted: Option<ShapeId>,
    active: Option<ShapeId>,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape on top of the z-order.
    ///
    /// # Panics
    /// Panics if a shape with the same id is already stored.
    pub fn insert(&mut self, shape: Shape) -> ShapeId {
        let index = self.z_order.len();
        self.insert_at(index, shape)
    }

    /// Add a shape at `index` in the z-order (clamped to the end).
    pub fn insert_at(&mut self, index: usize, shape: Shape) -> ShapeId {
        let id = shape.id();
        assert!(!self.shapes.contains_key(&id), "duplicate shape id {id}");
        self.z_order.insert(index.min(self.z_order.len()), id);
        self.shapes.insert(id, shape);
        self.last_inserted = Some(id);
        id
    }

    /// Remove a shape. Peers lose their reciprocal entries; the removed
    /// shape keeps its own so a snapshot of it can be relinked later.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(&id)?;
        self.z_order.retain(|&other| other != id);
        if self.last_inserted == Some(id) {
            self.last_inserted = None;
        }
        if self.active == Some(id) {
            self.active = None;
        }
        for peer in shape.connections.targets() {
            if let Some(peer) = self.shapes.get_mut(&peer) {
                peer.connections.delete(id);
            }
        }
        Some(shape)
    }

    /// Swap in a new version of an existing shape, keeping its z position.
    pub fn replace(&mut self, shape: Shape) -> Option<Shape> {
        match self.shapes.get_mut(&shape.id()) {
            Some(slot) => Some(std::mem::replace(slot, shape)),
            None => {
                log::warn!("Replacing unknown shape {}", shape.id());
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
        self.last_inserted = None;
        self.active = None;
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Shapes in z-order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.z_order
    }

    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.z_order.iter().position(|&other| other == id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn last_inserted(&self) -> Option<ShapeId> {
        self.last_inserted
    }

    /// The active shape: a single selected shape or the live selection.
    pub fn active(&self) -> Option<ShapeId> {
        self.active
    }

    pub fn set_active(&mut self, id: Option<ShapeId>) {
        self.active = id.filter(|id| self.shapes.contains_key(id));
    }

    /// The materialized multi-selection, if one exists.
    pub fn live_selection(&self) -> Option<ShapeId> {
        self.iter().find(|s| s.is_selection()).map(Shape::id)
    }

    /// Ids the user is currently operating on.
    pub fn active_ids(&self) -> Vec<ShapeId> {
        let Some(active) = self.active.and_then(|id| self.shapes.get(&id)) else {
            return Vec::new();
        };
        match &active.kind {
            ShapeKind::Selection(selection) => selection
                .members
                .iter()
                .copied()
                .filter(|id| self.contains(*id))
                .collect(),
            _ => vec![active.id()],
        }
    }

    /// Shapes hit at `point`, front to back. Selection shapes are skipped.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.shapes.get(id))
            .filter(|s| !s.is_selection() && s.hit_test(point, tolerance))
            .map(Shape::id)
            .collect()
    }

    pub fn top_shape_at(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.shapes_at_point(point, tolerance).into_iter().next()
    }

    /// Shapes whose bounds lie completely inside `rect`, in z-order.
    pub fn contained_in(&self, rect: Rect) -> Vec<ShapeId> {
        self.iter()
            .filter(|s| !s.is_selection() && contains_rect(rect, s.bounds()))
            .map(Shape::id)
            .collect()
    }

    /// Bounds of all non-selection shapes.
    pub fn bounds(&self) -> Option<Rect> {
        union_rects(self.iter().filter(|s| !s.is_selection()).map(Shape::bounds))
    }

    /// Attach the `role` end of `line_id` to `target` at fractional `coords`.
    ///
    /// Any previous attachment of that end is dropped on both sides and the
    /// endpoint snaps onto the anchor.
    pub fn connect(&mut self, line_id: ShapeId, role: Role, target: ShapeId, coords: Point) -> bool {
        if line_id == target {
            return false;
        }
        let Some(anchor) = self.shapes.get(&target).map(|t| t.anchor_point(coords)) else {
            return false;
        };
        if !self.shapes.get(&line_id).is_some_and(Shape::is_line) {
            return false;
        }
        self.disconnect(line_id, role);

        if let Some(target_shape) = self.shapes.get_mut(&target) {
            target_shape.connections.add(Connection::new(line_id, coords, role));
        }
        if let Some(line) = self.shapes.get_mut(&line_id) {
            line.connections.add(Connection::new(target, coords, role));
            let event = ConnectionEvent {
                source: target,
                connection: Connection::new(line_id, coords, role),
                new_point: anchor,
            };
            line.on_connection_event(&event);
        }
        log::debug!("Connected {line_id} {role:?} to {target}");
        true
    }

    /// Detach the `role` end of `line_id` from whatever it is attached to.
    pub fn disconnect(&mut self, line_id: ShapeId, role: Role) -> Vec<Connection> {
        let removed = match self.shapes.get_mut(&line_id) {
            Some(line) => line.connections.clear(role, None),
            None => return Vec::new(),
        };
        for connection in &removed {
            if let Some(peer) = self.shapes.get_mut(&connection.target) {
                peer.connections.clear(role, Some(line_id));
            }
        }
        removed
    }

    /// Drop every connection of `id` on both sides.
    pub fn detach_all(&mut self, id: ShapeId) -> Vec<Connection> {
        let removed = match self.shapes.get_mut(&id) {
            Some(shape) => shape.connections.clear_all(),
            None => return Vec::new(),
        };
        for connection in &removed {
            if let Some(peer) = self.shapes.get_mut(&connection.target) {
                peer.connections.delete(id);
            }
        }
        removed
    }

    /// Restore reciprocal entries for a shape that was just reinserted.
    /// Entries whose peer no longer exists are dropped.
    pub fn relink(&mut self, id: ShapeId) {
        let Some(connections) = self
            .shapes
            .get(&id)
            .map(|s| s.connections.iter().copied().collect::<Vec<_>>())
        else {
            return;
        };
        for connection in connections {
            match self.shapes.get_mut(&connection.target) {
                Some(peer) => {
                    peer.connections
                        .add(Connection::new(id, connection.coords, connection.role));
                }
                None => {
                    log::debug!("Dropping dangling connection {id} -> {}", connection.target);
                    if let Some(shape) = self.shapes.get_mut(&id) {
                        shape.connections.delete(connection.target);
                    }
                }
            }
        }
    }

    /// Notify dependents of `id` that it moved. Lines never propagate, so
    /// a notification chain is at most one hop long.
    pub fn propagate_connections(&mut self, id: ShapeId) {
        let events: Vec<(ShapeId, ConnectionEvent)> = match self.shapes.get(&id) {
            Some(source) if !source.is_line() => source
                .connections
                .iter()
                .map(|c| {
                    (
                        c.target,
                        ConnectionEvent {
                            source: id,
                            connection: *c,
                            new_point: source.anchor_point(c.coords),
                        },
                    )
                })
                .collect(),
            _ => return,
        };
        for (dependent, event) in events {
            match self.shapes.get_mut(&dependent) {
                Some(shape) => {
                    shape.on_connection_event(&event);
                }
                None => log::warn!("Connection from {id} points at missing shape {dependent}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Anchor;
    use kurbo::Vec2;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::rectangle(Rect::new(x, y, x + w, y + h))
    }

    #[test]
    fn test_insert_tracks_order_and_last_inserted() {
        let mut store = ShapeStore::new();
        let a = store.insert(rect(0.0, 0.0, 50.0, 50.0));
        let b = store.insert(rect(10.0, 10.0, 50.0, 50.0));
        assert_eq!(store.ids(), &[a, b]);
        assert_eq!(store.last_inserted(), Some(b));
        store.remove(b);
        assert_eq!(store.last_inserted(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    #[should_panic(expected = "duplicate shape id")]
    fn test_insert_duplicate_id_panics() {
        let mut store = ShapeStore::new();
        let shape = rect(0.0, 0.0, 50.0, 50.0);
        store.insert(shape.clone());
        store.insert(shape);
    }

    #[test]
    fn test_shapes_at_point_front_to_back() {
        let mut store = ShapeStore::new();
        let a = store.insert(rect(0.0, 0.0, 100.0, 100.0));
        let b = store.insert(rect(50.0, 50.0, 100.0, 100.0));
        assert_eq!(store.shapes_at_point(Point::new(75.0, 75.0), 0.0), vec![b, a]);
        assert_eq!(store.top_shape_at(Point::new(25.0, 25.0), 0.0), Some(a));
    }

    #[test]
    fn test_contained_in_is_strict() {
        let mut store = ShapeStore::new();
        let inside = store.insert(rect(10.0, 10.0, 50.0, 50.0));
        store.insert(rect(10.0, 10.0, 250.0, 50.0));
        assert_eq!(store.contained_in(Rect::new(0.0, 0.0, 200.0, 200.0)), vec![inside]);
    }

    #[test]
    fn test_connect_is_reciprocal_and_moves_endpoint() {
        let mut store = ShapeStore::new();
        let target = store.insert(rect(100.0, 0.0, 100.0, 100.0));
        let line = store.insert(Shape::line(Point::ZERO, Point::new(90.0, 40.0)));

        assert!(store.connect(line, Role::End, target, Anchor::Left.coords()));
        assert!(store.get(target).unwrap().connections.find(line, Role::End).is_some());
        assert!(store.get(line).unwrap().connections.find(target, Role::End).is_some());
        let end = store.get(line).and_then(Shape::as_line).and_then(|l| l.end());
        assert_eq!(end, Some(Point::new(100.0, 50.0)));
    }

    #[test]
    fn test_moving_target_drags_line_endpoint() {
        let mut store = ShapeStore::new();
        let target = store.insert(rect(100.0, 0.0, 100.0, 100.0));
        let line = store.insert(Shape::line(Point::ZERO, Point::new(90.0, 40.0)));
        store.connect(line, Role::End, target, Anchor::Left.coords());

        store.get_mut(target).unwrap().translate(Vec2::new(20.0, 10.0));
        store.propagate_connections(target);

        let end = store.get(line).and_then(Shape::as_line).and_then(|l| l.end());
        assert_eq!(end, Some(Point::new(120.0, 60.0)));
    }

    #[test]
    fn test_remove_detaches_peer_and_relink_restores() {
        let mut store = ShapeStore::new();
        let target = store.insert(rect(100.0, 0.0, 100.0, 100.0));
        let line = store.insert(Shape::line(Point::ZERO, Point::new(90.0, 40.0)));
        store.connect(line, Role::Start, target, Anchor::Top.coords());

        let removed = store.remove(line).unwrap();
        assert!(store.get(target).unwrap().connections.is_empty());
        assert_eq!(removed.connections.len(), 1);

        store.insert(removed);
        store.relink(line);
        assert!(store.get(target).unwrap().connections.find(line, Role::Start).is_some());
    }

    #[test]
    fn test_disconnect_removes_both_sides() {
        let mut store = ShapeStore::new();
        let target = store.insert(rect(100.0, 0.0, 100.0, 100.0));
        let line = store.insert(Shape::line(Point::ZERO, Point::new(90.0, 40.0)));
        store.connect(line, Role::End, target, Anchor::Left.coords());

        assert_eq!(store.disconnect(line, Role::End).len(), 1);
        assert!(store.get(target).unwrap().connections.is_empty());
        assert!(store.get(line).unwrap().connections.is_empty());
    }

    #[test]
    fn test_active_ids_expand_selection() {
        let mut store = ShapeStore::new();
        let a = store.insert(rect(0.0, 0.0, 50.0, 50.0));
        let b = store.insert(rect(60.0, 0.0, 50.0, 50.0));
        let selection = store.insert(Shape::selection(vec![a, b], Rect::new(0.0, 0.0, 110.0, 50.0)));
        store.set_active(Some(selection));
        assert_eq!(store.active_ids(), vec![a, b]);
        assert_eq!(store.live_selection(), Some(selection));
        // Selections are never hit or contained.
        assert_eq!(store.contained_in(Rect::new(-10.0, -10.0, 500.0, 500.0)), vec![a, b]);
    }
}

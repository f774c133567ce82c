//! Connections between line endpoints and the shapes they are attached to.
//!
//! A line records one connection per endpoint role pointing at the target
//! shape, and the target records the reciprocal entry pointing back at the
//! line. Both entries share the same fractional anchor coordinates, which
//! are expressed in the target's local frame.

use crate::shapes::ShapeId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Which end of a line a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Start,
    End,
}

/// A single directed link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// The peer shape.
    pub target: ShapeId,
    /// Fractional anchor inside the target's local frame, `(0,0)` is top-left.
    pub coords: Point,
    /// Endpoint role of the line side of this link.
    pub role: Role,
}

impl Connection {
    pub fn new(target: ShapeId, coords: Point, role: Role) -> Self {
        Self {
            target,
            coords,
            role,
        }
    }
}

/// Named anchor positions on a shape's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::Top,
        Anchor::Right,
        Anchor::Bottom,
        Anchor::Left,
        Anchor::Center,
    ];

    /// Fractional coordinates of the anchor.
    pub fn coords(self) -> Point {
        match self {
            Anchor::Top => Point::new(0.5, 0.0),
            Anchor::Right => Point::new(1.0, 0.5),
            Anchor::Bottom => Point::new(0.5, 1.0),
            Anchor::Left => Point::new(0.0, 0.5),
            Anchor::Center => Point::new(0.5, 0.5),
        }
    }
}

/// Notification sent to a dependent shape when its connected peer moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionEvent {
    /// The shape that moved.
    pub source: ShapeId,
    /// The moved shape's entry describing the link.
    pub connection: Connection,
    /// World position of the anchor after the move.
    pub new_point: Point,
}

/// Ordered set of connections held by one shape.
///
/// At most one entry exists per `(target, role)` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSet {
    items: Vec<Connection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns false when an entry with the same target
    /// and role already exists.
    pub fn add(&mut self, connection: Connection) -> bool {
        if self
            .items
            .iter()
            .any(|c| c.target == connection.target && c.role == connection.role)
        {
            return false;
        }
        self.items.push(connection);
        true
    }

    /// Visit entries in order until `f` returns true, yielding that entry.
    ///
    /// The closure may update the entry in place.
    pub fn for_each<F>(&mut self, mut f: F) -> Option<Connection>
    where
        F: FnMut(&mut Connection) -> bool,
    {
        for connection in &mut self.items {
            if f(connection) {
                return Some(*connection);
            }
        }
        None
    }

    /// First entry matching `target` and `role`.
    pub fn find(&self, target: ShapeId, role: Role) -> Option<&Connection> {
        self.items
            .iter()
            .find(|c| c.target == target && c.role == role)
    }

    /// First entry with the given role.
    pub fn by_role(&self, role: Role) -> Option<&Connection> {
        self.items.iter().find(|c| c.role == role)
    }

    /// Remove every entry pointing at `target`.
    pub fn delete(&mut self, target: ShapeId) -> Vec<Connection> {
        let (removed, kept) = self.items.drain(..).partition(|c| c.target == target);
        self.items = kept;
        removed
    }

    /// Remove entries with `role`, optionally only those pointing at `target`.
    pub fn clear(&mut self, role: Role, target: Option<ShapeId>) -> Vec<Connection> {
        let (removed, kept) = self
            .items
            .drain(..)
            .partition(|c| c.role == role && target.is_none_or(|t| c.target == t));
        self.items = kept;
        removed
    }

    /// Drop all entries.
    pub fn clear_all(&mut self) -> Vec<Connection> {
        std::mem::take(&mut self.items)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.items.iter()
    }

    /// Distinct peer ids in insertion order.
    pub fn targets(&self) -> Vec<ShapeId> {
        let mut targets: Vec<ShapeId> = Vec::new();
        for connection in &self.items {
            if !targets.contains(&connection.target) {
                targets.push(connection.target);
            }
        }
        targets
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_add_rejects_duplicate_target_and_role() {
        let target = Uuid::new_v4();
        let mut set = ConnectionSet::new();
        assert!(set.add(Connection::new(target, Anchor::Top.coords(), Role::Start)));
        assert!(!set.add(Connection::new(target, Anchor::Left.coords(), Role::Start)));
        assert!(set.add(Connection::new(target, Anchor::Left.coords(), Role::End)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_delete_leaves_others() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut set = ConnectionSet::new();
        set.add(Connection::new(a, Anchor::Top.coords(), Role::Start));
        set.add(Connection::new(b, Anchor::Bottom.coords(), Role::End));

        let removed = set.delete(a);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].target, a);
        assert_eq!(set.len(), 1);
        assert!(set.find(b, Role::End).is_some());
    }

    #[test]
    fn test_for_each_short_circuits_and_updates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut set = ConnectionSet::new();
        set.add(Connection::new(a, Anchor::Top.coords(), Role::Start));
        set.add(Connection::new(b, Anchor::Top.coords(), Role::End));

        let mut visited = 0;
        let hit = set.for_each(|c| {
            visited += 1;
            if c.target == a {
                c.coords = Anchor::Center.coords();
                true
            } else {
                false
            }
        });
        assert_eq!(visited, 1);
        assert_eq!(hit.map(|c| c.coords), Some(Anchor::Center.coords()));
        assert!(set.for_each(|c| c.target == Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_clear_by_role_and_target() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut set = ConnectionSet::new();
        set.add(Connection::new(a, Anchor::Top.coords(), Role::Start));
        set.add(Connection::new(b, Anchor::Top.coords(), Role::Start));
        set.add(Connection::new(b, Anchor::Top.coords(), Role::End));

        assert_eq!(set.clear(Role::Start, Some(b)).len(), 1);
        assert_eq!(set.clear(Role::Start, None).len(), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.targets(), vec![b]);
    }

    #[test]
    fn test_serializes_as_array() {
        let mut set = ConnectionSet::new();
        set.add(Connection::new(Uuid::nil(), Point::new(0.5, 1.0), Role::End));
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["role"], "end");
    }
}

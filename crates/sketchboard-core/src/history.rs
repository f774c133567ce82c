//! Undo/redo built from structural shape snapshots.
//!
//! Every mutating action pushes one step. A step is a list of records so
//! that compound actions (grouping is a delete plus a create) undo as one.

use crate::shapes::{Shape, ShapeId};
use crate::snapshot::{ShapeSnapshot, apply_fields, diff_fields};
use crate::store::ShapeStore;
use serde_json::{Map, Value};

/// Default number of undo steps to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Changed fields of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDiff {
    pub id: ShapeId,
    pub before: Map<String, Value>,
    pub after: Map<String, Value>,
}

impl PropertyDiff {
    /// Diff two snapshots of `id`. `None` when nothing changed.
    pub fn between(id: ShapeId, before: &ShapeSnapshot, after: &ShapeSnapshot) -> Option<Self> {
        diff_fields(before, after).map(|(before, after)| Self { id, before, after })
    }
}

/// A shape snapshot with the z-order slot it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub index: usize,
    pub snapshot: ShapeSnapshot,
}

impl Placed {
    /// Capture a stored shape and its current z position.
    pub fn capture(store: &ShapeStore, id: ShapeId) -> Option<Self> {
        let index = store.index_of(id)?;
        let shape = store.get(id)?;
        Some(Self {
            index,
            snapshot: shape.to_snapshot(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRecord {
    /// Field-level changes to shapes that stayed in the store.
    Default(Vec<PropertyDiff>),
    /// Shapes that were added.
    Create(Vec<Placed>),
    /// Shapes that were removed.
    Delete(Vec<Placed>),
}

impl HistoryRecord {
    pub fn tag(&self) -> &'static str {
        match self {
            HistoryRecord::Default(_) => "default",
            HistoryRecord::Create(_) => "create",
            HistoryRecord::Delete(_) => "delete",
        }
    }

    /// Compare `before` snapshots with the store's current state.
    /// Shapes that no longer exist or did not change are left out.
    pub fn changes(store: &ShapeStore, before: &[(ShapeId, ShapeSnapshot)]) -> Option<Self> {
        let diffs: Vec<PropertyDiff> = before
            .iter()
            .filter_map(|(id, snapshot)| {
                let after = store.get(*id)?.to_snapshot();
                PropertyDiff::between(*id, snapshot, &after)
            })
            .collect();
        if diffs.is_empty() {
            None
        } else {
            Some(HistoryRecord::Default(diffs))
        }
    }

    /// Capture `ids` as they are now, for a create record.
    pub fn created(store: &ShapeStore, ids: &[ShapeId]) -> Option<Self> {
        let placed: Vec<Placed> = ids.iter().filter_map(|id| Placed::capture(store, *id)).collect();
        if placed.is_empty() { None } else { Some(HistoryRecord::Create(placed)) }
    }

    /// Capture `ids` before they are removed, for a delete record.
    pub fn deleted(store: &ShapeStore, ids: &[ShapeId]) -> Option<Self> {
        let placed: Vec<Placed> = ids.iter().filter_map(|id| Placed::capture(store, *id)).collect();
        if placed.is_empty() { None } else { Some(HistoryRecord::Delete(placed)) }
    }

    fn revert(&self, store: &mut ShapeStore) {
        match self {
            HistoryRecord::Default(diffs) => {
                for diff in diffs {
                    overlay(store, diff.id, &diff.before);
                }
            }
            HistoryRecord::Create(placed) => remove_all(store, placed),
            HistoryRecord::Delete(placed) => restore_all(store, placed),
        }
    }

    fn replay(&self, store: &mut ShapeStore) {
        match self {
            HistoryRecord::Default(diffs) => {
                for diff in diffs {
                    overlay(store, diff.id, &diff.after);
                }
            }
            HistoryRecord::Create(placed) => restore_all(store, placed),
            HistoryRecord::Delete(placed) => remove_all(store, placed),
        }
    }
}

fn overlay(store: &mut ShapeStore, id: ShapeId, fields: &Map<String, Value>) {
    let Some(mut snapshot) = store.get(id).map(Shape::to_snapshot) else {
        log::warn!("History refers to missing shape {id}");
        return;
    };
    apply_fields(&mut snapshot, fields);
    match Shape::from_snapshot(&snapshot) {
        Some(shape) => {
            store.replace(shape);
        }
        None => log::warn!("Could not restore fields of shape {id}"),
    }
}

fn restore_all(store: &mut ShapeStore, placed: &[Placed]) {
    let mut sorted: Vec<&Placed> = placed.iter().collect();
    sorted.sort_by_key(|p| p.index);
    let mut restored = Vec::with_capacity(sorted.len());
    for entry in sorted {
        let Some(shape) = Shape::from_snapshot(&entry.snapshot) else {
            continue;
        };
        if store.contains(shape.id()) {
            log::warn!("Shape {} already exists, not restoring", shape.id());
            continue;
        }
        restored.push(store.insert_at(entry.index, shape));
    }
    for id in restored {
        store.relink(id);
    }
}

fn remove_all(store: &mut ShapeStore, placed: &[Placed]) {
    for entry in placed {
        let id = entry
            .snapshot
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<ShapeId>().ok());
        match id {
            Some(id) => {
                store.remove(id);
            }
            None => log::warn!("History snapshot without an id"),
        }
    }
}

/// One undoable action.
pub type HistoryStep = Vec<HistoryRecord>;

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryStep>,
    redo_stack: Vec<HistoryStep>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, record: HistoryRecord) {
        self.push_step(vec![record]);
    }

    /// Record an action. Clears the redo stack; empty steps are ignored.
    pub fn push_step(&mut self, step: HistoryStep) {
        if step.is_empty() {
            return;
        }
        log::debug!(
            "History push: {}",
            step.iter().map(HistoryRecord::tag).collect::<Vec<_>>().join("+")
        );
        self.undo_stack.push(step);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Revert the latest step. Returns false if there was nothing to undo.
    pub fn undo(&mut self, store: &mut ShapeStore) -> bool {
        let Some(step) = self.undo_stack.pop() else {
            return false;
        };
        for record in step.iter().rev() {
            record.revert(store);
        }
        log::debug!("Undo ({} left)", self.undo_stack.len());
        self.redo_stack.push(step);
        true
    }

    /// Replay the latest undone step.
    pub fn redo(&mut self, store: &mut ShapeStore) -> bool {
        let Some(step) = self.redo_stack.pop() else {
            return false;
        };
        for record in &step {
            record.replay(store);
        }
        log::debug!("Redo ({} left)", self.redo_stack.len());
        self.undo_stack.push(step);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Change the limit, dropping the oldest steps if over it.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        let excess = self.undo_stack.len().saturating_sub(self.limit);
        self.undo_stack.drain(..excess);
    }
}

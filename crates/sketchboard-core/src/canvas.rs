//! Scene state shared by the tools: shapes, view, history and clipboard.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::events::{EditorEvent, EventBus};
use crate::geometry::union_rects;
use crate::history::{History, HistoryRecord, Placed};
use crate::render::Overlay;
use crate::shapes::{Image, ImageLoadError, ImageUpload, Mutation, Shape, ShapeId};
use crate::snapshot::ShapeSnapshot;
use crate::store::ShapeStore;
use kurbo::{Point, Rect, Size, Vec2};

/// Largest size an inserted image is given before the user resizes it.
const MAX_IMAGE_SIZE: Size = Size::new(600.0, 600.0);

/// Everything the editor mutates in response to input.
#[derive(Debug)]
pub struct Canvas {
    pub store: ShapeStore,
    pub camera: Camera,
    pub history: History,
    pub config: EditorConfig,
    pub events: EventBus,
    pub overlay: Overlay,
    /// Last pointer position in canvas coordinates.
    pub pointer: Point,
    clipboard: Vec<ShapeSnapshot>,
    paste_count: usize,
    pending_image: Option<Point>,
    pending_text: Option<Point>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Canvas {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: ShapeStore::new(),
            camera: Camera::new(),
            history: History::new(config.history_limit),
            config,
            events: EventBus::new(),
            overlay: Overlay::default(),
            pointer: Point::ZERO,
            clipboard: Vec::new(),
            paste_count: 0,
            pending_image: None,
            pending_text: None,
        }
    }

    /// Ids the user is operating on (members of the live selection, or the
    /// single active shape).
    pub fn active_ids(&self) -> Vec<ShapeId> {
        self.store.active_ids()
    }

    /// Make `ids` the selection: nothing, one active shape, or an Active
    /// Selection over several.
    pub fn select(&mut self, ids: Vec<ShapeId>) {
        self.drop_selection_shapes();
        let ids: Vec<ShapeId> = ids
            .into_iter()
            .filter(|id| self.store.get(*id).is_some_and(|s| !s.is_selection()))
            .collect();
        match ids.len() {
            0 => self.store.set_active(None),
            1 => self.store.set_active(Some(ids[0])),
            _ => {
                self.make_selection(ids.clone());
            }
        }
        self.events.emit(EditorEvent::SelectionChanged(ids));
    }

    /// Materialize an Active Selection over `members` and make it active.
    pub fn make_selection(&mut self, members: Vec<ShapeId>) -> Option<ShapeId> {
        let rect = self.selection_rect(&members)?;
        let id = self.store.insert(Shape::selection(members, rect));
        self.store.set_active(Some(id));
        Some(id)
    }

    /// Padded union of the members' bounds.
    pub fn selection_rect(&self, members: &[ShapeId]) -> Option<Rect> {
        let pad = self.config.selection_padding;
        union_rects(members.iter().filter_map(|id| self.store.get(*id)).map(Shape::bounds))
            .map(|r| r.inflate(pad, pad))
    }

    /// Re-fit the live selection around its members after they moved.
    pub fn refresh_selection(&mut self) {
        let Some(id) = self.store.live_selection() else {
            return;
        };
        let members = self
            .store
            .get(id)
            .and_then(Shape::as_selection)
            .map(|s| s.members.clone())
            .unwrap_or_default();
        if let Some(rect) = self.selection_rect(&members) {
            if let Some(selection) = self.store.get_mut(id) {
                selection.frame.set_rect(rect);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        let had = self.store.active().is_some();
        self.drop_selection_shapes();
        self.store.set_active(None);
        if had {
            self.events.emit(EditorEvent::SelectionChanged(Vec::new()));
        }
    }

    fn drop_selection_shapes(&mut self) {
        let selections: Vec<ShapeId> = self
            .store
            .iter()
            .filter(|s| s.is_selection())
            .map(Shape::id)
            .collect();
        for id in selections {
            self.store.remove(id);
        }
    }

    /// Insert a shape made by the user, record it and announce it.
    pub fn insert_created(&mut self, shape: Shape) -> ShapeId {
        let id = self.store.insert(shape);
        if let Some(record) = HistoryRecord::created(&self.store, &[id]) {
            self.history.push(record);
        }
        self.events.emit(EditorEvent::ShapeCreated(id));
        id
    }

    /// Remove the active shapes as one undoable step.
    pub fn delete_active(&mut self) -> usize {
        let ids = self.active_ids();
        self.clear_selection();
        let Some(record) = HistoryRecord::deleted(&self.store, &ids) else {
            return 0;
        };
        for id in &ids {
            self.store.remove(*id);
        }
        self.history.push(record);
        log::debug!("Deleted {} shape(s)", ids.len());
        ids.len()
    }

    /// Copies of the active shapes, offset and selected.
    pub fn duplicate_active(&mut self) -> Vec<ShapeId> {
        let offset = self.config.duplicate_offset;
        let copies: Vec<ShapeSnapshot> = self
            .active_ids()
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(Shape::to_snapshot)
            .collect();
        self.insert_copies(&copies, Vec2::new(offset, offset))
    }

    pub fn select_all(&mut self) {
        let ids: Vec<ShapeId> = self
            .store
            .iter()
            .filter(|s| !s.is_selection())
            .map(Shape::id)
            .collect();
        self.select(ids);
    }

    /// Put snapshots of the active shapes on the internal clipboard.
    pub fn copy(&mut self) -> usize {
        self.clipboard = self
            .active_ids()
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(Shape::to_snapshot)
            .collect();
        self.paste_count = 0;
        self.clipboard.len()
    }

    /// Paste the internal clipboard, or ask the host for system clipboard
    /// text when it is empty.
    pub fn paste(&mut self) -> Vec<ShapeId> {
        if self.clipboard.is_empty() {
            self.pending_text = Some(self.pointer);
            self.events.emit(EditorEvent::ClipboardTextRequested);
            return Vec::new();
        }
        self.paste_count += 1;
        let step = self.config.duplicate_offset * self.paste_count as f64;
        let clipboard = self.clipboard.clone();
        self.insert_copies(&clipboard, Vec2::new(step, step))
    }

    /// Answer to [`EditorEvent::ClipboardTextRequested`].
    pub fn complete_clipboard_text(&mut self, text: Option<String>) -> Option<ShapeId> {
        let at = self.pending_text.take()?;
        let text = text.filter(|t| !t.trim().is_empty())?;
        let id = self.insert_created(Shape::text(at, text));
        self.select(vec![id]);
        Some(id)
    }

    fn insert_copies(&mut self, snapshots: &[ShapeSnapshot], offset: Vec2) -> Vec<ShapeId> {
        let mut ids = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let Some(mut shape) = Shape::from_snapshot(snapshot) else {
                continue;
            };
            if shape.is_selection() {
                continue;
            }
            shape.regenerate_id();
            shape.connections.clear_all();
            shape.translate(offset);
            ids.push(self.store.insert(shape));
        }
        if let Some(record) = HistoryRecord::created(&self.store, &ids) {
            self.history.push(record);
        }
        for id in &ids {
            self.events.emit(EditorEvent::ShapeCreated(*id));
        }
        self.select(ids.clone());
        ids
    }

    pub fn undo(&mut self) -> bool {
        self.clear_selection();
        self.history.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> bool {
        self.clear_selection();
        self.history.redo(&mut self.store)
    }

    /// Replace the Active Selection with a group owning its members.
    pub fn group_active(&mut self) -> Option<ShapeId> {
        let ids = self.active_ids();
        if ids.len() < 2 || self.store.live_selection().is_none() {
            return None;
        }
        self.clear_selection();
        let deleted = HistoryRecord::deleted(&self.store, &ids)?;
        let index = ids.iter().filter_map(|id| self.store.index_of(*id)).max().unwrap_or(0);
        let mut children: Vec<Shape> = ids.iter().filter_map(|id| self.store.remove(*id)).collect();
        for child in &mut children {
            child.connections.clear_all();
        }
        let index = index.saturating_sub(children.len().saturating_sub(1));
        let group = self.store.insert_at(index, Shape::group(children));
        let created = HistoryRecord::created(&self.store, &[group])?;
        self.history.push_step(vec![deleted, created]);
        self.select(vec![group]);
        Some(group)
    }

    /// Split the active group back into its children.
    pub fn ungroup_active(&mut self) -> Vec<ShapeId> {
        let Some(id) = self.store.active().filter(|id| {
            self.store.get(*id).is_some_and(|s| s.as_group().is_some())
        }) else {
            return Vec::new();
        };
        self.clear_selection();
        let Some(deleted) = Placed::capture(&self.store, id) else {
            return Vec::new();
        };
        let Some(group) = self.store.remove(id) else {
            return Vec::new();
        };
        let children = match group.kind {
            crate::shapes::ShapeKind::Group(group) => group.ungroup(),
            _ => Vec::new(),
        };
        let mut ids = Vec::with_capacity(children.len());
        for (offset, child) in children.into_iter().enumerate() {
            ids.push(self.store.insert_at(deleted.index + offset, child));
        }
        let mut step = vec![HistoryRecord::Delete(vec![deleted])];
        step.extend(HistoryRecord::created(&self.store, &ids));
        self.history.push_step(step);
        self.select(ids.clone());
        ids
    }

    /// Apply a typed edit to one shape as an undoable step.
    pub fn mutate(&mut self, id: ShapeId, mutation: Mutation) -> bool {
        let Some(before) = self.store.get(id).map(Shape::to_snapshot) else {
            return false;
        };
        let applied = self.store.get_mut(id).is_some_and(|s| s.apply(mutation));
        if !applied {
            return false;
        }
        let mut touched = vec![(id, before)];
        touched.extend(self.peer_snapshots(&[id]));
        self.store.propagate_connections(id);
        if let Some(record) = HistoryRecord::changes(&self.store, &touched) {
            self.history.push(record);
        }
        self.refresh_selection();
        true
    }

    /// Snapshots of shapes connected to any of `ids` (not in `ids`).
    pub fn peer_snapshots(&self, ids: &[ShapeId]) -> Vec<(ShapeId, ShapeSnapshot)> {
        let mut peers: Vec<ShapeId> = Vec::new();
        for id in ids {
            if let Some(shape) = self.store.get(*id) {
                for peer in shape.connections.targets() {
                    if !ids.contains(&peer) && !peers.contains(&peer) {
                        peers.push(peer);
                    }
                }
            }
        }
        peers
            .into_iter()
            .filter_map(|id| self.store.get(id).map(|s| (id, s.to_snapshot())))
            .collect()
    }

    /// Ask the host for an image to place at `at`.
    pub fn request_image(&mut self, at: Point) {
        self.pending_image = Some(at);
        self.events.emit(EditorEvent::ImageRequested { at });
    }

    pub fn has_pending_image(&self) -> bool {
        self.pending_image.is_some()
    }

    pub fn cancel_image(&mut self) -> bool {
        self.pending_image.take().is_some()
    }

    /// Answer to [`EditorEvent::ImageRequested`]. The image is inserted only
    /// now. Failed uploads embed the raw bytes; other failures leave a
    /// placeholder.
    pub fn complete_image(&mut self, result: Result<ImageUpload, ImageLoadError>) -> Option<ShapeId> {
        let Some(at) = self.pending_image.take() else {
            log::debug!("Image completed without a pending request");
            return None;
        };
        let image = match result {
            Ok(ImageUpload {
                url: Ok(url),
                source_width,
                source_height,
                ..
            }) => Image::from_url(url, source_width, source_height),
            Ok(ImageUpload {
                url: Err(err),
                bytes,
                source_width,
                source_height,
            }) if !bytes.is_empty() => {
                log::warn!("Image upload failed ({err}), embedding {} bytes", bytes.len());
                Image::embedded(&bytes, source_width, source_height)
            }
            Ok(ImageUpload { url: Err(err), .. }) => {
                log::warn!("Image upload failed with no data: {err}");
                Image::placeholder()
            }
            Err(ImageLoadError::Cancelled) => {
                log::debug!("Image request cancelled");
                return None;
            }
            Err(err) => {
                log::warn!("Image load failed: {err}");
                Image::placeholder()
            }
        };
        let size = image.fit_size(MAX_IMAGE_SIZE);
        let rect = Rect::from_center_size(at, size);
        let id = self.insert_created(Shape::image(rect, image));
        self.select(vec![id]);
        Some(id)
    }
}

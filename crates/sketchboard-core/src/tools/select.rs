//! The selection tool: classifies pointer input into drag, resize, rotate,
//! marquee and text-edit gestures and applies them to the scene.

use super::Submode;
use super::text::{TextKeyOutcome, TextSession};
use crate::canvas::Canvas;
use crate::events::EditorEvent;
use crate::geometry::{CursorIcon, ResizeDirection, resize_cursor};
use crate::history::HistoryRecord;
use crate::input::{KeyEvent, Modifiers, MouseButton};
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::snap::{SnapLines, SnapSettings, align, apply_resize_snap, snap_angle};
use crate::snapshot::ShapeSnapshot;
use kurbo::{Point, Rect, Vec2};

/// A pointer sample in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub world: Point,
    pub screen: Point,
    pub modifiers: Modifiers,
}

impl Pointer {
    /// A sample where screen and canvas coincide (identity camera).
    pub fn at(point: Point) -> Self {
        Self {
            world: point,
            screen: point,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// What part of a shape a resize gesture holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Box(ResizeDirection),
    /// A vertex of a line, by index.
    LinePoint(usize),
}

/// Scratch state of a press-move-release gesture on a shape.
#[derive(Debug, Clone)]
pub struct Gesture {
    /// Shape (or Active Selection) the gesture acts on.
    pub target: ShapeId,
    /// Set when the target is an Alt-drag copy of this shape.
    pub clone_of: Option<ShapeId>,
    origin: Point,
    origin_screen: Point,
    moved: bool,
    applied: Vec2,
    was_active: bool,
    /// Target first, then selection members, as they were at press time.
    originals: Vec<Shape>,
    /// Snapshots for the history diff, including connected peers.
    before: Vec<(ShapeId, ShapeSnapshot)>,
}

impl Gesture {
    fn new(canvas: &Canvas, target: ShapeId, pointer: Pointer, was_active: bool) -> Option<Self> {
        let shape = canvas.store.get(target)?;
        let mut ids = vec![target];
        if let Some(selection) = shape.as_selection() {
            ids.extend(selection.members.iter().copied());
        }
        let originals: Vec<Shape> = ids.iter().filter_map(|id| canvas.store.get(*id)).cloned().collect();
        let tracked: Vec<ShapeId> = originals
            .iter()
            .filter(|s| !s.is_selection())
            .map(Shape::id)
            .collect();
        let mut before: Vec<(ShapeId, ShapeSnapshot)> = originals
            .iter()
            .filter(|s| !s.is_selection())
            .map(|s| (s.id(), s.to_snapshot()))
            .collect();
        before.extend(canvas.peer_snapshots(&tracked));
        Some(Self {
            target,
            clone_of: None,
            origin: pointer.world,
            origin_screen: pointer.screen,
            moved: false,
            applied: Vec2::ZERO,
            was_active,
            originals,
            before,
        })
    }

    /// Whether the press has become a drag. The first call past the
    /// threshold returns `Some(true)`.
    fn drag_started(&mut self, pointer: Pointer, threshold: f64) -> Option<bool> {
        if self.moved {
            return Some(false);
        }
        if (pointer.screen - self.origin_screen).hypot() > threshold {
            self.moved = true;
            return Some(true);
        }
        None
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Ids of real shapes the gesture changes directly.
    fn tracked(&self) -> Vec<ShapeId> {
        self.originals
            .iter()
            .filter(|s| !s.is_selection())
            .map(Shape::id)
            .collect()
    }

    fn remember(&mut self, canvas: &Canvas, id: ShapeId) {
        if self.before.iter().any(|(known, _)| *known == id) {
            return;
        }
        if let Some(shape) = canvas.store.get(id) {
            self.before.push((id, shape.to_snapshot()));
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum SelectState {
    #[default]
    Idle,
    MarqueeSelecting {
        origin: Point,
        marquee: ShapeId,
    },
    DraggingShape(Gesture),
    DraggingSelection(Gesture),
    Resizing {
        gesture: Gesture,
        handle: ResizeHandle,
    },
    Rotating {
        gesture: Gesture,
        /// Pointer angle about the shape center at press time.
        start_angle: f64,
    },
    GrabbingCanvas {
        last: Point,
    },
    TextEditing(TextSession),
}

impl SelectState {
    pub fn name(&self) -> &'static str {
        match self {
            SelectState::Idle => "idle",
            SelectState::MarqueeSelecting { .. } => "marquee-selecting",
            SelectState::DraggingShape(_) => "dragging-shape",
            SelectState::DraggingSelection(_) => "dragging-selection",
            SelectState::Resizing { .. } => "resizing",
            SelectState::Rotating { .. } => "rotating",
            SelectState::GrabbingCanvas { .. } => "grabbing-canvas",
            SelectState::TextEditing(_) => "text-editing",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectTool {
    pub state: SelectState,
    pub submode: Submode,
    cursor: CursorIcon,
    hovered: Option<ShapeId>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SelectState::Idle)
    }

    pub fn editing(&self) -> Option<ShapeId> {
        match &self.state {
            SelectState::TextEditing(session) => Some(session.id),
            _ => None,
        }
    }

    pub fn set_submode(&mut self, submode: Submode) {
        self.submode = submode;
        self.cursor = match submode {
            Submode::Grab => CursorIcon::Grab,
            Submode::Default => CursorIcon::Default,
        };
    }

    pub fn pointer_down(&mut self, canvas: &mut Canvas, pointer: Pointer, button: MouseButton) {
        if !matches!(self.state, SelectState::Idle | SelectState::TextEditing(_)) {
            self.finish(canvas, pointer, false);
        }
        if let Some(id) = self.editing() {
            if canvas.store.get(id).is_some_and(|s| s.is_draggable(pointer.world)) {
                canvas.events.emit(EditorEvent::MouseDown {
                    target: Some(id),
                    point: pointer.world,
                });
                return;
            }
            self.commit_text(canvas);
        }
        canvas.overlay.hover = None;
        let target = self.classify_down(canvas, pointer, button);
        log::debug!("Pointer down -> {}", self.state.name());
        canvas.events.emit(EditorEvent::MouseDown {
            target,
            point: pointer.world,
        });
    }

    fn classify_down(&mut self, canvas: &mut Canvas, pointer: Pointer, button: MouseButton) -> Option<ShapeId> {
        if self.submode == Submode::Grab || button == MouseButton::Middle {
            self.state = SelectState::GrabbingCanvas {
                last: pointer.screen,
            };
            self.cursor = CursorIcon::Grabbing;
            return None;
        }
        if button != MouseButton::Left {
            return None;
        }
        let world = pointer.world;
        let padding = canvas.config.handle_padding;
        let rotation_padding = canvas.config.rotation_padding;
        let active = canvas.store.active();

        if let Some(selection) = active.filter(|id| canvas.store.live_selection() == Some(*id)) {
            let (draggable, handle) = match canvas.store.get(selection) {
                Some(shape) => (shape.is_draggable(world), shape.resize_handle(world, padding)),
                None => (false, None),
            };
            if draggable {
                let gesture = Gesture::new(canvas, selection, pointer, true)?;
                self.state = SelectState::DraggingSelection(gesture);
                return Some(selection);
            }
            if let Some(direction) = handle {
                let gesture = Gesture::new(canvas, selection, pointer, true)?;
                canvas.overlay.resizing = gesture.tracked();
                self.state = SelectState::Resizing {
                    gesture,
                    handle: ResizeHandle::Box(direction),
                };
                return Some(selection);
            }
        }

        if let Some(shape) = active.and_then(|id| canvas.store.get(id)).filter(|s| !s.is_selection()) {
            let id = shape.id();
            let handle = shape
                .line_handle(world, padding)
                .map(ResizeHandle::LinePoint)
                .or_else(|| shape.resize_handle(world, padding).map(ResizeHandle::Box));
            let rotating = handle.is_none() && shape.is_rotate_zone(world, padding, rotation_padding);
            let start_angle = (world - shape.center()).atan2();
            if let Some(handle) = handle {
                let gesture = Gesture::new(canvas, id, pointer, true)?;
                canvas.overlay.resizing = vec![id];
                self.state = SelectState::Resizing { gesture, handle };
                return Some(id);
            }
            if rotating {
                let gesture = Gesture::new(canvas, id, pointer, true)?;
                self.state = SelectState::Rotating { gesture, start_angle };
                self.cursor = CursorIcon::Rotate;
                return Some(id);
            }
        }

        if let Some(hit) = canvas.store.top_shape_at(world, canvas.config.hit_tolerance) {
            let was_active = active == Some(hit);
            let mut target = hit;
            let mut clone_of = None;
            if pointer.modifiers.alt {
                if let Some(mut copy) = canvas.store.get(hit).cloned() {
                    copy.regenerate_id();
                    copy.connections.clear_all();
                    target = canvas.store.insert(copy);
                    clone_of = Some(hit);
                }
            }
            if !was_active || clone_of.is_some() {
                canvas.select(vec![target]);
            }
            let mut gesture = Gesture::new(canvas, target, pointer, was_active)?;
            if clone_of.is_some() {
                gesture.before.retain(|(id, _)| *id != target);
                gesture.clone_of = clone_of;
            }
            self.state = SelectState::DraggingShape(gesture);
            self.cursor = CursorIcon::Move;
            return Some(hit);
        }

        canvas.clear_selection();
        let marquee = canvas
            .store
            .insert(Shape::selection(Vec::new(), Rect::from_points(world, world)));
        canvas.store.set_active(Some(marquee));
        self.state = SelectState::MarqueeSelecting {
            origin: world,
            marquee,
        };
        None
    }

    pub fn pointer_move(&mut self, canvas: &mut Canvas, pointer: Pointer) {
        canvas.pointer = pointer.world;
        if self.is_idle() {
            self.hover(canvas, pointer);
            return;
        }
        let threshold = canvas.config.drag_threshold;
        match &mut self.state {
            SelectState::Idle | SelectState::TextEditing(_) => {}
            SelectState::GrabbingCanvas { last } => {
                canvas.camera.pan(pointer.screen - *last);
                *last = pointer.screen;
            }
            SelectState::MarqueeSelecting { origin, marquee } => {
                if let Some(shape) = canvas.store.get_mut(*marquee) {
                    shape.frame.set_rect(Rect::from_points(*origin, pointer.world));
                }
            }
            SelectState::DraggingShape(gesture) => {
                let Some(started) = gesture.drag_started(pointer, threshold) else {
                    return;
                };
                if started && canvas.store.get(gesture.target).is_some_and(Shape::is_line) {
                    canvas.store.detach_all(gesture.target);
                }
                drag_shape(canvas, gesture, pointer.world);
            }
            SelectState::DraggingSelection(gesture) => {
                let Some(started) = gesture.drag_started(pointer, threshold) else {
                    return;
                };
                if started {
                    detach_outgoing_lines(canvas, gesture);
                }
                drag_selection(canvas, gesture, pointer.world);
            }
            SelectState::Resizing { gesture, handle } => {
                let Some(started) = gesture.drag_started(pointer, threshold) else {
                    return;
                };
                match *handle {
                    ResizeHandle::Box(direction) => resize_box(canvas, gesture, pointer, direction),
                    ResizeHandle::LinePoint(index) => {
                        if started {
                            let role = canvas
                                .store
                                .get(gesture.target)
                                .and_then(Shape::as_line)
                                .and_then(|line| line.role_at(index));
                            if let Some(role) = role {
                                canvas.store.disconnect(gesture.target, role);
                            }
                        }
                        move_line_point(canvas, gesture.target, index, pointer.world);
                    }
                }
            }
            SelectState::Rotating { gesture, start_angle } => {
                if gesture.drag_started(pointer, threshold).is_none() {
                    return;
                }
                rotate(canvas, gesture, *start_angle, pointer);
            }
        }
    }

    pub fn pointer_up(&mut self, canvas: &mut Canvas, pointer: Pointer) {
        canvas.pointer = pointer.world;
        let target = self.finish(canvas, pointer, true);
        canvas.events.emit(EditorEvent::MouseUp {
            target,
            point: pointer.world,
        });
    }

    /// End the in-flight gesture. `click` allows a press without movement
    /// to act as a click (entering text editing).
    fn finish(&mut self, canvas: &mut Canvas, pointer: Pointer, click: bool) -> Option<ShapeId> {
        let state = std::mem::take(&mut self.state);
        let target = match state {
            SelectState::Idle => None,
            SelectState::TextEditing(session) => {
                let id = session.id;
                self.state = SelectState::TextEditing(session);
                Some(id)
            }
            SelectState::GrabbingCanvas { .. } => {
                self.cursor = match self.submode {
                    Submode::Grab => CursorIcon::Grab,
                    Submode::Default => CursorIcon::Default,
                };
                None
            }
            SelectState::MarqueeSelecting { origin, marquee } => {
                canvas.store.remove(marquee);
                let rect = Rect::from_points(origin, pointer.world);
                let ids = canvas.store.contained_in(rect);
                log::debug!("Marquee {rect:?} selected {} shape(s)", ids.len());
                canvas.select(ids);
                None
            }
            SelectState::DraggingShape(gesture) => {
                let target = gesture.clone_of.unwrap_or(gesture.target);
                if gesture.moved {
                    commit(canvas, gesture);
                } else if let Some(source) = gesture.clone_of {
                    canvas.store.remove(gesture.target);
                    canvas.select(vec![source]);
                } else if click && gesture.was_active {
                    if let Some(session) = TextSession::begin(canvas, gesture.target) {
                        self.state = SelectState::TextEditing(session);
                        self.cursor = CursorIcon::Text;
                    }
                }
                Some(target)
            }
            SelectState::DraggingSelection(gesture) => {
                let target = gesture.target;
                if gesture.moved {
                    commit(canvas, gesture);
                }
                Some(target)
            }
            SelectState::Resizing { mut gesture, handle } => {
                let target = gesture.target;
                if gesture.moved {
                    match handle {
                        ResizeHandle::Box(_) => {
                            for id in gesture.tracked() {
                                if let Some(shape) = canvas.store.get_mut(id) {
                                    shape.commit_flip();
                                    shape.reflow_text();
                                }
                            }
                            canvas.refresh_selection();
                        }
                        ResizeHandle::LinePoint(index) => attach_line_point(canvas, &mut gesture, index),
                    }
                    commit(canvas, gesture);
                }
                Some(target)
            }
            SelectState::Rotating { gesture, .. } => {
                let target = gesture.target;
                if gesture.moved {
                    commit(canvas, gesture);
                }
                Some(target)
            }
        };
        if self.is_idle() && self.cursor != CursorIcon::Grab {
            self.cursor = CursorIcon::Default;
        }
        canvas.overlay.guides.clear();
        canvas.overlay.resizing.clear();
        canvas.overlay.hover = None;
        target
    }

    /// Commit whatever is in flight and go idle.
    pub fn reset(&mut self, canvas: &mut Canvas) {
        let pointer = Pointer::at(canvas.pointer);
        self.commit_text(canvas);
        self.finish(canvas, pointer, false);
    }

    /// Enter text editing on `id`. `created` marks a block the text tool
    /// just inserted; its creation is recorded on commit.
    pub fn begin_text(&mut self, canvas: &mut Canvas, id: ShapeId, created: bool) -> bool {
        self.reset(canvas);
        let session = if created {
            TextSession::begin_created(canvas, id)
        } else {
            TextSession::begin(canvas, id)
        };
        match session {
            Some(session) => {
                self.state = SelectState::TextEditing(session);
                self.cursor = CursorIcon::Text;
                true
            }
            None => false,
        }
    }

    /// Route a key to the text session. Returns false when not editing.
    pub fn text_key(&mut self, canvas: &mut Canvas, event: &KeyEvent) -> bool {
        let SelectState::TextEditing(session) = &mut self.state else {
            return false;
        };
        if session.handle_key(canvas, event) == TextKeyOutcome::Commit {
            self.commit_text(canvas);
        }
        true
    }

    /// Leave text editing, recording the edit.
    pub fn commit_text(&mut self, canvas: &mut Canvas) {
        if !matches!(self.state, SelectState::TextEditing(_)) {
            return;
        }
        if let SelectState::TextEditing(session) = std::mem::take(&mut self.state) {
            let id = session.id;
            let created = session.is_new();
            session.commit(canvas);
            if created && canvas.store.contains(id) {
                canvas.events.emit(EditorEvent::ShapeCreated(id));
            }
            self.cursor = CursorIcon::Default;
        }
    }

    fn hover(&mut self, canvas: &mut Canvas, pointer: Pointer) {
        let hit = canvas
            .store
            .top_shape_at(pointer.world, canvas.config.hit_tolerance);
        if hit != self.hovered {
            self.hovered = hit;
            canvas.events.emit(EditorEvent::MouseOver { target: hit });
        }
        let active = canvas.active_ids();
        canvas.overlay.hover = hit
            .filter(|id| !active.contains(id))
            .and_then(|id| canvas.store.get(id))
            .cloned();
        self.cursor = self.cursor_at(canvas, pointer.world, hit);
    }

    fn cursor_at(&self, canvas: &Canvas, world: Point, hit: Option<ShapeId>) -> CursorIcon {
        if self.submode == Submode::Grab {
            return CursorIcon::Grab;
        }
        let padding = canvas.config.handle_padding;
        if let Some(active) = canvas.store.active().and_then(|id| canvas.store.get(id)) {
            if active.is_selection() && active.is_draggable(world) {
                return CursorIcon::Move;
            }
            if active.line_handle(world, padding).is_some() {
                return CursorIcon::Crosshair;
            }
            if let Some(direction) = active.resize_handle(world, padding) {
                return resize_cursor(direction, active.rotation());
            }
            if !active.is_selection()
                && active.is_rotate_zone(world, padding, canvas.config.rotation_padding)
            {
                return CursorIcon::Rotate;
            }
        }
        if hit.is_some() {
            CursorIcon::Move
        } else {
            CursorIcon::Default
        }
    }
}

fn snap_settings(canvas: &Canvas) -> Option<SnapSettings> {
    canvas
        .config
        .snapping_enabled
        .then(|| SnapSettings::from(&canvas.config))
}

fn translate(canvas: &mut Canvas, id: ShapeId, delta: Vec2) {
    if delta == Vec2::ZERO {
        return;
    }
    if let Some(shape) = canvas.store.get_mut(id) {
        shape.translate(delta);
    }
}

fn drag_shape(canvas: &mut Canvas, gesture: &mut Gesture, world: Point) {
    let id = gesture.target;
    let raw = world - gesture.origin;
    translate(canvas, id, raw - gesture.applied);
    gesture.applied = raw;

    if let Some(settings) = snap_settings(canvas) {
        let outcome = match canvas.store.get(id) {
            Some(mover) => align(&canvas.store, mover, &[], SnapLines::ALL, &settings),
            None => return,
        };
        translate(canvas, id, outcome.offset);
        gesture.applied += outcome.offset;
        canvas.overlay.guides = outcome.guides;
    }
    canvas.store.propagate_connections(id);
}

/// Lines in a moving selection let go of shapes that stay behind.
fn detach_outgoing_lines(canvas: &mut Canvas, gesture: &Gesture) {
    let members = gesture.tracked();
    for id in &members {
        let outgoing: Vec<_> = match canvas.store.get(*id) {
            Some(shape) if shape.is_line() => shape
                .connections
                .iter()
                .filter(|c| !members.contains(&c.target))
                .map(|c| c.role)
                .collect(),
            _ => continue,
        };
        for role in outgoing {
            canvas.store.disconnect(*id, role);
        }
    }
}

fn drag_selection(canvas: &mut Canvas, gesture: &mut Gesture, world: Point) {
    let raw = world - gesture.origin;
    let delta = raw - gesture.applied;
    gesture.applied = raw;
    translate(canvas, gesture.target, delta);
    let members = gesture.tracked();
    for id in &members {
        translate(canvas, *id, delta);
    }
    for id in members {
        canvas.store.propagate_connections(id);
    }
}

fn resize_box(canvas: &mut Canvas, gesture: &Gesture, pointer: Pointer, direction: ResizeDirection) {
    let Some(original) = gesture.originals.first() else {
        return;
    };
    let keep_aspect = pointer.modifiers.shift && direction.is_corner();
    let id = gesture.target;
    if let Some(shape) = canvas.store.get_mut(id) {
        shape.resize_from(original, pointer.world, direction, keep_aspect);
    }

    if original.is_selection() {
        let members = &gesture.originals[1..];
        let member_ids: Vec<ShapeId> = members.iter().map(Shape::id).collect();
        snap_resized(canvas, id, direction, &member_ids);
        let from = original.rect();
        let Some(to) = canvas.store.get(id).map(Shape::rect) else {
            return;
        };
        for member in members {
            let mut scaled = member.clone();
            scaled.map_into(from, to);
            canvas.store.replace(scaled);
        }
        for member in members {
            canvas.store.propagate_connections(member.id());
        }
        return;
    }

    snap_resized(canvas, id, direction, &[]);
    canvas.store.propagate_connections(id);
}

/// Pull the edges `direction` moves onto nearby alignment lines.
fn snap_resized(canvas: &mut Canvas, id: ShapeId, direction: ResizeDirection, exclude: &[ShapeId]) {
    let Some(settings) = snap_settings(canvas) else {
        return;
    };
    let outcome = match canvas.store.get(id) {
        Some(mover) => align(&canvas.store, mover, exclude, SnapLines::for_resize(direction), &settings),
        None => return,
    };
    if let Some(shape) = canvas.store.get_mut(id) {
        apply_resize_snap(shape, direction, &outcome);
    }
    canvas.overlay.guides = outcome.guides;
}

fn move_line_point(canvas: &mut Canvas, id: ShapeId, index: usize, world: Point) {
    let Some(shape) = canvas.store.get_mut(id) else {
        return;
    };
    if let ShapeKind::Line(line) = &mut shape.kind {
        if line.set_point(index, world) {
            shape.sync_frame();
        }
    }
}

/// Attach a released line endpoint to the nearest anchor under it.
fn attach_line_point(canvas: &mut Canvas, gesture: &mut Gesture, index: usize) {
    let id = gesture.target;
    let Some((role, point)) = canvas
        .store
        .get(id)
        .and_then(Shape::as_line)
        .and_then(|line| Some((line.role_at(index)?, *line.points.get(index)?)))
    else {
        return;
    };
    let tolerance = canvas.config.anchor_tolerance;
    let found = canvas
        .store
        .shapes_at_point(point, tolerance)
        .into_iter()
        .filter(|other| *other != id)
        .filter_map(|other| canvas.store.get(other))
        .filter(|other| !other.is_line())
        .find_map(|other| other.anchor_near(point, tolerance).map(|anchor| (other.id(), anchor)));
    if let Some((target, anchor)) = found {
        gesture.remember(canvas, target);
        canvas.store.connect(id, role, target, anchor.coords());
    }
}

fn rotate(canvas: &mut Canvas, gesture: &Gesture, start_angle: f64, pointer: Pointer) {
    let Some(original) = gesture.originals.first() else {
        return;
    };
    let swept = (pointer.world - original.center()).atan2() - start_angle;
    let mut angle = original.rotation() + swept;
    if pointer.modifiers.shift {
        angle = snap_angle(angle, canvas.config.rotation_snap_radians());
    }
    if let Some(shape) = canvas.store.get_mut(gesture.target) {
        shape.set_rotation(angle);
    }
    canvas.store.propagate_connections(gesture.target);
}

/// Record a finished gesture as one history step.
fn commit(canvas: &mut Canvas, gesture: Gesture) {
    let mut step = Vec::new();
    if gesture.clone_of.is_some() {
        step.extend(HistoryRecord::created(&canvas.store, &[gesture.target]));
    }
    step.extend(HistoryRecord::changes(&canvas.store, &gesture.before));
    log::debug!("Gesture on {} committed ({} record(s))", gesture.target, step.len());
    canvas.history.push_step(step);
    if gesture.clone_of.is_some() {
        canvas.events.emit(EditorEvent::ShapeCreated(gesture.target));
    }
    canvas.refresh_selection();
}

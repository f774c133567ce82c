//! Host-facing editor: routes input to the active tool and owns the
//! repaint trigger.

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::config::{ConfigError, EditorConfig};
use crate::events::{EditorEvent, Subscription};
use crate::geometry::CursorIcon;
use crate::input::{InputState, KeyEvent, MouseButton, PointerEvent, Shortcut};
use crate::render::{Surface, render_scene};
use crate::shapes::{ImageLoadError, ImageUpload, Mutation, Shape, ShapeId};
use crate::snapshot::{SnapshotError, scene_from_json, scene_to_json};
use crate::store::ShapeStore;
use crate::tools::select::Pointer;
use crate::tools::{CreateTool, SelectState, SelectTool, Submode, ToolKind};
use kurbo::Point;

/// Callback invoked when the scene needs a repaint.
pub type RenderCallback = Box<dyn FnMut()>;

pub struct Editor {
    canvas: Canvas,
    select: SelectTool,
    create: CreateTool,
    mode: ToolKind,
    input: InputState,
    render_callback: Option<RenderCallback>,
    dirty: bool,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("mode", &self.mode)
            .field("state", &self.select.state.name())
            .field("shapes", &self.canvas.store.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            canvas: Canvas::new(config),
            select: SelectTool::new(),
            create: CreateTool::new(),
            mode: ToolKind::Select,
            input: InputState::new(),
            render_callback: None,
            dirty: true,
        }
    }

    /// Switch the active tool. Any gesture or text edit in progress is
    /// committed first.
    pub fn set_mode(&mut self, mode: ToolKind, submode: Submode) {
        log::info!("Mode {mode:?} ({submode:?})");
        self.select.reset(&mut self.canvas);
        self.create.cancel();
        self.canvas.overlay.clear();
        self.mode = mode;
        if mode.creates_shapes() {
            self.create.set_tool(mode);
            self.select.set_submode(Submode::Default);
        } else {
            self.select.set_submode(submode);
        }
        self.request_render();
    }

    pub fn mode(&self) -> ToolKind {
        self.mode
    }

    pub fn submode(&self) -> Submode {
        self.select.submode
    }

    pub fn state(&self) -> &SelectState {
        &self.select.state
    }

    /// Feed a pointer event in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let screen = event.position();
        let world = self.canvas.camera.screen_to_world(screen);
        self.input.track(&event, world);
        let pointer = Pointer {
            world,
            screen,
            modifiers: event.modifiers(),
        };

        match event {
            PointerEvent::Wheel { delta, .. } => {
                if self.canvas.camera.wheel(screen, delta.y) {
                    self.request_render();
                }
                return;
            }
            PointerEvent::Down { button, .. } => {
                if self.mode.creates_shapes() && button == MouseButton::Left {
                    self.create.begin(world);
                    self.canvas.events.emit(EditorEvent::MouseDown { target: None, point: world });
                } else {
                    self.select.pointer_down(&mut self.canvas, pointer, button);
                }
            }
            PointerEvent::Move { .. } => {
                if self.create.is_active() {
                    self.canvas.pointer = world;
                    self.create.update(world);
                    self.canvas.overlay.preview = self.create.preview_shape();
                } else {
                    self.select.pointer_move(&mut self.canvas, pointer);
                }
            }
            PointerEvent::Up { .. } => {
                if self.create.is_active() {
                    self.finish_creation(world);
                } else {
                    self.select.pointer_up(&mut self.canvas, pointer);
                }
            }
        }
        self.request_render();
    }

    fn finish_creation(&mut self, world: Point) {
        self.canvas.pointer = world;
        self.canvas.overlay.preview = None;
        let min_drag = self
            .canvas
            .camera
            .screen_to_world_len(self.canvas.config.drag_threshold);
        let created = self.create.end(world, min_drag);
        let target = created.map(|shape| {
            if shape.is_text() {
                // Recorded when editing commits; empty blocks vanish.
                let id = self.canvas.store.insert(shape);
                self.canvas.select(vec![id]);
                self.select.begin_text(&mut self.canvas, id, true);
                id
            } else {
                let id = self.canvas.insert_created(shape);
                self.canvas.select(vec![id]);
                id
            }
        });
        log::debug!("Creation with {:?} finished: {target:?}", self.mode);
        self.mode = ToolKind::Select;
        self.canvas.events.emit(EditorEvent::MouseUp { target, point: world });
    }

    /// Feed a key event. Returns true when the key was consumed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if self.select.text_key(&mut self.canvas, event) {
            self.request_render();
            return true;
        }
        let Some(shortcut) = Shortcut::from_key_event(event) else {
            return false;
        };
        if !self.select.is_idle() || (self.create.is_active() && shortcut != Shortcut::Cancel) {
            log::debug!("Ignoring {shortcut:?} mid-gesture");
            return false;
        }
        let handled = match shortcut {
            Shortcut::Delete => self.canvas.delete_active() > 0,
            Shortcut::Duplicate => !self.canvas.duplicate_active().is_empty(),
            Shortcut::SelectAll => {
                self.canvas.select_all();
                true
            }
            Shortcut::Copy => self.canvas.copy() > 0,
            Shortcut::Paste => {
                self.canvas.paste();
                true
            }
            Shortcut::Undo => self.canvas.undo(),
            Shortcut::Redo => self.canvas.redo(),
            Shortcut::Group => self.canvas.group_active().is_some(),
            Shortcut::Ungroup => !self.canvas.ungroup_active().is_empty(),
            Shortcut::Cancel => self.cancel(),
        };
        if handled {
            self.request_render();
        }
        handled
    }

    fn cancel(&mut self) -> bool {
        if self.canvas.cancel_image() {
            return true;
        }
        if self.create.is_active() {
            self.create.cancel();
            self.canvas.overlay.preview = None;
            return true;
        }
        if self.mode != ToolKind::Select {
            self.set_mode(ToolKind::Select, Submode::Default);
            return true;
        }
        let had_selection = self.canvas.store.active().is_some();
        self.canvas.clear_selection();
        had_selection
    }

    pub fn cursor(&self) -> CursorIcon {
        match self.mode {
            ToolKind::Select => self.select.cursor(),
            ToolKind::Text => CursorIcon::Text,
            _ => CursorIcon::Crosshair,
        }
    }

    /// Paint the scene and overlay onto `surface`.
    pub fn render(&mut self, surface: &mut dyn Surface) {
        render_scene(surface, &self.canvas.store, &self.canvas.overlay, &self.canvas.camera);
        self.dirty = false;
    }

    pub fn set_render_callback(&mut self, callback: impl FnMut() + 'static) {
        self.render_callback = Some(Box::new(callback));
    }

    /// Mark the scene dirty and ask the host to repaint.
    pub fn request_render(&mut self) {
        self.dirty = true;
        if let Some(callback) = self.render_callback.as_mut() {
            callback();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: impl Fn(&EditorEvent) + 'static) -> Subscription {
        self.canvas.events.subscribe(listener)
    }

    /// Shapes the user is operating on: the single active shape or the
    /// members of the Active Selection.
    pub fn get_active_shapes(&self) -> Vec<&Shape> {
        self.canvas
            .active_ids()
            .into_iter()
            .filter_map(|id| self.canvas.store.get(id))
            .collect()
    }

    /// Insert a shape without recording history.
    ///
    /// # Panics
    ///
    /// Panics if a shape with the same id is already in the store.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = self.canvas.store.insert(shape);
        self.canvas.store.relink(id);
        self.request_render();
        id
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        if self.canvas.active_ids().contains(&id) {
            self.canvas.clear_selection();
        }
        let removed = self.canvas.store.remove(id);
        if removed.is_some() {
            self.request_render();
        }
        removed
    }

    /// Apply a typed edit as one undoable step.
    pub fn apply(&mut self, id: ShapeId, mutation: Mutation) -> bool {
        let changed = self.canvas.mutate(id, mutation);
        if changed {
            self.canvas.refresh_selection();
            self.request_render();
        }
        changed
    }

    pub fn undo(&mut self) -> bool {
        self.select.reset(&mut self.canvas);
        let undone = self.canvas.undo();
        self.request_render();
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.select.reset(&mut self.canvas);
        let redone = self.canvas.redo();
        self.request_render();
        redone
    }

    /// Ask the host for an image to place at `at` (canvas coordinates).
    pub fn request_image(&mut self, at: Point) {
        self.canvas.request_image(at);
    }

    /// Deliver the host's image result.
    pub fn complete_image(&mut self, result: Result<ImageUpload, ImageLoadError>) -> Option<ShapeId> {
        let id = self.canvas.complete_image(result);
        self.request_render();
        id
    }

    /// Deliver system clipboard text after a paste with nothing copied.
    pub fn complete_clipboard_text(&mut self, text: Option<String>) -> Option<ShapeId> {
        let id = self.canvas.complete_clipboard_text(text);
        self.request_render();
        id
    }

    /// Replace the scene with the shapes in `json`. Clears history.
    pub fn load_scene(&mut self, json: &str) -> Result<usize, SnapshotError> {
        let shapes = scene_from_json(json)?;
        self.select.reset(&mut self.canvas);
        self.canvas.store.clear();
        self.canvas.history.clear();
        self.canvas.overlay.clear();
        let ids: Vec<ShapeId> = shapes
            .into_iter()
            .map(|shape| self.canvas.store.insert(shape))
            .collect();
        for id in &ids {
            self.canvas.store.relink(*id);
        }
        log::info!("Loaded scene with {} shape(s)", ids.len());
        self.request_render();
        Ok(ids.len())
    }

    pub fn save_scene(&self) -> Result<String, SnapshotError> {
        scene_to_json(&self.canvas.store)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.canvas.config
    }

    pub fn set_config(&mut self, config: EditorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.canvas.history.set_limit(config.history_limit);
        self.canvas.config = config;
        Ok(())
    }

    pub fn store(&self) -> &ShapeStore {
        &self.canvas.store
    }

    pub fn camera(&self) -> &Camera {
        &self.canvas.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.canvas.camera
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, Modifiers};
    use kurbo::Rect;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    #[should_panic(expected = "duplicate shape id")]
    fn test_add_shape_rejects_duplicate_id() {
        let mut editor = Editor::default();
        let shape = Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0));
        editor.add_shape(shape.clone());
        editor.add_shape(shape);
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.handle_pointer(PointerEvent::down(from));
        editor.handle_pointer(PointerEvent::moved(from.midpoint(to)));
        editor.handle_pointer(PointerEvent::moved(to));
        editor.handle_pointer(PointerEvent::up(to));
    }

    #[test]
    fn test_rectangle_tool_creates_and_returns_to_select() {
        let mut editor = Editor::default();
        let created = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&created);
        let _sub = editor.subscribe(move |event| {
            if let EditorEvent::ShapeCreated(id) = event {
                sink.borrow_mut().push(*id);
            }
        });

        editor.set_mode(ToolKind::Rectangle, Submode::Default);
        assert_eq!(editor.cursor(), CursorIcon::Crosshair);
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(110.0, 60.0));

        assert_eq!(editor.mode(), ToolKind::Select);
        let active = editor.get_active_shapes();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].rect(), Rect::new(10.0, 10.0, 110.0, 60.0));
        assert_eq!(*created.borrow(), vec![active[0].id()]);
        assert!(editor.canvas().overlay.preview.is_none());
    }

    #[test]
    fn test_text_tool_enters_editing() {
        let mut editor = Editor::default();
        editor.set_mode(ToolKind::Text, Submode::Default);
        editor.handle_pointer(PointerEvent::down(Point::new(20.0, 20.0)));
        editor.handle_pointer(PointerEvent::up(Point::new(20.0, 20.0)));
        assert!(matches!(editor.state(), SelectState::TextEditing(_)));

        for ch in ["h", "i"] {
            assert!(editor.handle_key(&KeyEvent::character(ch)));
        }
        editor.handle_key(&KeyEvent::plain(Key::Escape));
        assert!(matches!(editor.state(), SelectState::Idle));
        assert_eq!(editor.store().len(), 1);

        editor.undo();
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_shortcuts_ignored_mid_gesture() {
        let mut editor = Editor::default();
        let id = editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)));
        editor.handle_pointer(PointerEvent::down(Point::new(50.0, 50.0)));
        editor.handle_pointer(PointerEvent::moved(Point::new(80.0, 50.0)));
        assert!(!editor.handle_key(&KeyEvent::plain(Key::Delete)));
        editor.handle_pointer(PointerEvent::up(Point::new(80.0, 50.0)));

        assert!(editor.handle_key(&KeyEvent::plain(Key::Delete)));
        assert!(!editor.store().contains(id));
        assert!(editor.handle_key(&KeyEvent::action('z')));
        assert!(editor.store().contains(id));
    }

    #[test]
    fn test_render_callback_fires_on_input() {
        let mut editor = Editor::default();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        editor.set_render_callback(move || counter.set(counter.get() + 1));
        editor.handle_pointer(PointerEvent::moved(Point::new(5.0, 5.0)));
        assert_eq!(calls.get(), 1);
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_wheel_zooms_about_pointer() {
        let mut editor = Editor::default();
        let at = Point::new(200.0, 100.0);
        let before = editor.camera().screen_to_world(at);
        editor.handle_pointer(PointerEvent::Wheel {
            position: at,
            delta: kurbo::Vec2::new(0.0, -1.0),
            modifiers: Modifiers::NONE,
        });
        assert!(editor.camera().zoom > 1.0);
        let after = editor.camera().screen_to_world(at);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_pointer_maps_through_camera() {
        let mut editor = Editor::default();
        editor.camera_mut().pan(kurbo::Vec2::new(100.0, 0.0));
        let id = editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        editor.handle_pointer(PointerEvent::down(Point::new(125.0, 25.0)));
        editor.handle_pointer(PointerEvent::up(Point::new(125.0, 25.0)));
        assert_eq!(editor.canvas().store.active(), Some(id));
    }

    #[test]
    fn test_escape_cancels_pending_image_then_selection() {
        let mut editor = Editor::default();
        let id = editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        editor.handle_pointer(PointerEvent::down(Point::new(25.0, 25.0)));
        editor.handle_pointer(PointerEvent::up(Point::new(25.0, 25.0)));
        editor.request_image(Point::new(300.0, 300.0));

        let escape = KeyEvent::plain(Key::Escape);
        assert!(editor.handle_key(&escape));
        assert!(!editor.canvas().has_pending_image());
        assert_eq!(editor.canvas().store.active(), Some(id));
        assert!(editor.handle_key(&escape));
        assert_eq!(editor.canvas().store.active(), None);
    }

    #[test]
    fn test_scene_save_and_load() {
        let mut editor = Editor::default();
        editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        editor.add_shape(Shape::text(Point::new(100.0, 0.0), "note"));
        let json = editor.save_scene().unwrap();

        let mut other = Editor::default();
        assert_eq!(other.load_scene(&json).unwrap(), 2);
        assert_eq!(other.store().ids(), editor.store().ids());
        assert!(!other.canvas().history.can_undo());
        assert!(other.load_scene("{}").is_err());
    }

    #[test]
    fn test_set_config_validates() {
        let mut editor = Editor::default();
        let mut config = EditorConfig::default();
        config.history_limit = 0;
        assert!(editor.set_config(config).is_err());

        let mut config = EditorConfig::default();
        config.snapping_enabled = false;
        assert!(editor.set_config(config).is_ok());
        assert!(!editor.config().snapping_enabled);
    }
}

//! In-place caption editing.

use crate::canvas::Canvas;
use crate::history::{HistoryRecord, Placed, PropertyDiff};
use crate::input::{Key, KeyEvent};
use crate::shapes::{Caption, ShapeId, TextAlign};
use crate::snapshot::ShapeSnapshot;

/// What the editor should do after a key went to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKeyOutcome {
    /// The key edited the caption (or was swallowed).
    Handled,
    /// Editing ends; call [`TextSession::commit`].
    Commit,
}

/// Editing state for one shape's caption.
#[derive(Debug, Clone)]
pub struct TextSession {
    pub id: ShapeId,
    /// State before editing started, with its z position. `None` for a text
    /// block the text tool just created.
    before: Option<Placed>,
}

impl TextSession {
    /// Start editing `id`. Shapes without a caption get an empty one.
    pub fn begin(canvas: &mut Canvas, id: ShapeId) -> Option<Self> {
        let before = Placed::capture(&canvas.store, id)?;
        Self::start(canvas, id, Some(before))
    }

    /// Start editing a text block that is not yet in history.
    pub fn begin_created(canvas: &mut Canvas, id: ShapeId) -> Option<Self> {
        Self::start(canvas, id, None)
    }

    fn start(canvas: &mut Canvas, id: ShapeId, before: Option<Placed>) -> Option<Self> {
        let shape = canvas.store.get_mut(id)?;
        if !shape.supports_caption() {
            return None;
        }
        if shape.caption.is_none() {
            let align = if shape.is_text() { TextAlign::Left } else { TextAlign::Center };
            shape.caption = Some(Caption::new("").with_align(align));
        }
        log::debug!("Editing text of {id}");
        Some(Self { id, before })
    }

    pub fn is_new(&self) -> bool {
        self.before.is_none()
    }

    /// Apply a key to the caption, reflowing after every change.
    pub fn handle_key(&mut self, canvas: &mut Canvas, event: &KeyEvent) -> TextKeyOutcome {
        if event.key == Key::Escape {
            return TextKeyOutcome::Commit;
        }
        let Some(shape) = canvas.store.get_mut(self.id) else {
            return TextKeyOutcome::Commit;
        };
        let Some(caption) = shape.caption.as_mut() else {
            return TextKeyOutcome::Commit;
        };
        match &event.key {
            Key::Character(text) if !event.modifiers.action() => caption.text.push_str(text),
            Key::Enter => caption.text.push('\n'),
            Key::Backspace => {
                caption.text.pop();
            }
            _ => return TextKeyOutcome::Handled,
        }
        shape.reflow_text();
        TextKeyOutcome::Handled
    }

    /// Finish editing and record the result as one undoable step.
    ///
    /// An emptied text block is removed: silently when it was new, as a
    /// delete otherwise. Other shapes just lose an empty caption.
    pub fn commit(self, canvas: &mut Canvas) {
        let Some(shape) = canvas.store.get_mut(self.id) else {
            return;
        };
        let empty = shape.caption.as_ref().is_none_or(Caption::is_empty);
        if empty && !shape.is_text() {
            shape.caption = None;
            shape.reflow_text();
        }
        let removes = empty && shape.is_text();

        match (self.before, removes) {
            (None, true) => {
                canvas.store.remove(self.id);
                log::debug!("Dropped empty new text {}", self.id);
            }
            (None, false) => {
                if let Some(record) = HistoryRecord::created(&canvas.store, &[self.id]) {
                    canvas.history.push(record);
                }
            }
            (Some(before), true) => {
                canvas.store.remove(self.id);
                canvas.history.push(HistoryRecord::Delete(vec![before]));
            }
            (Some(before), false) => {
                let after: ShapeSnapshot = match canvas.store.get(self.id) {
                    Some(shape) => shape.to_snapshot(),
                    None => return,
                };
                if let Some(diff) = PropertyDiff::between(self.id, &before.snapshot, &after) {
                    canvas.history.push(HistoryRecord::Default(vec![diff]));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::shapes::Shape;
    use kurbo::{Point, Rect};

    fn type_text(session: &mut TextSession, canvas: &mut Canvas, text: &str) {
        for ch in text.chars() {
            let key = if ch == '\n' {
                KeyEvent::plain(Key::Enter)
            } else {
                KeyEvent::character(ch.to_string())
            };
            assert_eq!(session.handle_key(canvas, &key), TextKeyOutcome::Handled);
        }
    }

    fn caption_of(canvas: &Canvas, id: ShapeId) -> Option<String> {
        canvas.store.get(id)?.caption.as_ref().map(|c| c.text.clone())
    }

    #[test]
    fn test_typing_reflows_and_commit_records_diff() {
        let mut canvas = Canvas::default();
        let id = canvas.store.insert(Shape::text(Point::ZERO, "a"));
        let height = canvas.store.get(id).unwrap().frame.height;

        let mut session = TextSession::begin(&mut canvas, id).unwrap();
        type_text(&mut session, &mut canvas, "b\nc");
        assert_eq!(caption_of(&canvas, id).as_deref(), Some("ab\nc"));
        assert!(canvas.store.get(id).unwrap().frame.height > height);

        let backspace = KeyEvent::plain(Key::Backspace);
        session.handle_key(&mut canvas, &backspace);
        assert_eq!(caption_of(&canvas, id).as_deref(), Some("ab\n"));

        let escape = KeyEvent::plain(Key::Escape);
        assert_eq!(session.handle_key(&mut canvas, &escape), TextKeyOutcome::Commit);
        session.commit(&mut canvas);

        canvas.undo();
        assert_eq!(caption_of(&canvas, id).as_deref(), Some("a"));
    }

    #[test]
    fn test_action_chords_do_not_type() {
        let mut canvas = Canvas::default();
        let id = canvas.store.insert(Shape::text(Point::ZERO, ""));
        let mut session = TextSession::begin_created(&mut canvas, id).unwrap();
        let copy = KeyEvent::new(Key::Character("c".into()), Modifiers::ctrl());
        session.handle_key(&mut canvas, &copy);
        assert_eq!(caption_of(&canvas, id).as_deref(), Some(""));
    }

    #[test]
    fn test_new_empty_text_is_dropped_without_history() {
        let mut canvas = Canvas::default();
        let id = canvas.store.insert(Shape::text(Point::ZERO, ""));
        let session = TextSession::begin_created(&mut canvas, id).unwrap();
        assert!(session.is_new());
        session.commit(&mut canvas);
        assert!(!canvas.store.contains(id));
        assert!(!canvas.history.can_undo());
    }

    #[test]
    fn test_new_text_commit_is_a_create() {
        let mut canvas = Canvas::default();
        let id = canvas.store.insert(Shape::text(Point::ZERO, ""));
        let mut session = TextSession::begin_created(&mut canvas, id).unwrap();
        type_text(&mut session, &mut canvas, "hi");
        session.commit(&mut canvas);
        canvas.undo();
        assert!(!canvas.store.contains(id));
        canvas.redo();
        assert_eq!(caption_of(&canvas, id).as_deref(), Some("hi"));
    }

    #[test]
    fn test_emptied_existing_text_is_deleted_undoably() {
        let mut canvas = Canvas::default();
        let id = canvas.store.insert(Shape::text(Point::ZERO, "x"));
        let mut session = TextSession::begin(&mut canvas, id).unwrap();
        session.handle_key(&mut canvas, &KeyEvent::plain(Key::Backspace));
        session.commit(&mut canvas);
        assert!(!canvas.store.contains(id));
        canvas.undo();
        assert_eq!(caption_of(&canvas, id).as_deref(), Some("x"));
    }

    #[test]
    fn test_shape_caption_added_and_cleared() {
        let mut canvas = Canvas::default();
        let id = canvas.store.insert(Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 60.0)));
        let session = TextSession::begin(&mut canvas, id).unwrap();
        assert_eq!(caption_of(&canvas, id).as_deref(), Some(""));
        session.commit(&mut canvas);
        assert!(canvas.store.get(id).unwrap().caption.is_none());
        assert!(!canvas.history.can_undo());

        let line = canvas.store.insert(Shape::line(Point::ZERO, Point::new(40.0, 0.0)));
        assert!(TextSession::begin(&mut canvas, line).is_none());
    }
}

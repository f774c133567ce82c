//! Lifecycle events the host's UI chrome subscribes to.

use crate::shapes::ShapeId;
use kurbo::Point;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A shape was created by a tool, paste or async completion.
    ShapeCreated(ShapeId),
    MouseDown { target: Option<ShapeId>, point: Point },
    MouseUp { target: Option<ShapeId>, point: Point },
    /// The pointer moved over a different shape (or off all shapes).
    MouseOver { target: Option<ShapeId> },
    SelectionChanged(Vec<ShapeId>),
    /// The host should open a picker and answer with `Editor::complete_image`.
    ImageRequested { at: Point },
    /// The host should read the system clipboard and answer with
    /// `Editor::complete_clipboard_text`.
    ClipboardTextRequested,
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::ShapeCreated(_) => "shape:created",
            EditorEvent::MouseDown { .. } => "mousedown",
            EditorEvent::MouseUp { .. } => "mouseup",
            EditorEvent::MouseOver { .. } => "mouseover",
            EditorEvent::SelectionChanged(_) => "selection:changed",
            EditorEvent::ImageRequested { .. } => "image:requested",
            EditorEvent::ClipboardTextRequested => "clipboard:text-requested",
        }
    }
}

pub type Listener = Rc<dyn Fn(&EditorEvent)>;

/// Fan-out of editor events to registered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for as long as the returned handle lives.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: impl Fn(&EditorEvent) + 'static) -> Subscription {
        let listener: Listener = Rc::new(listener);
        self.listeners.borrow_mut().push(Rc::clone(&listener));
        Subscription {
            listener,
            listeners: Rc::clone(&self.listeners),
        }
    }

    /// Deliver `event` to every listener. Listeners may subscribe or drop
    /// subscriptions while being called; changes apply from the next event.
    pub fn emit(&self, event: EditorEvent) {
        log::trace!("Event {}", event.name());
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Keeps a listener registered; unregisters it on drop.
pub struct Subscription {
    listener: Listener,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listeners
            .borrow_mut()
            .retain(|item| !Rc::ptr_eq(item, &self.listener));
    }
}

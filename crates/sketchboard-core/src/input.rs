//! Pointer and keyboard events as the host delivers them.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn action(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer input in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Wheel {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

impl PointerEvent {
    pub fn down(position: Point) -> Self {
        PointerEvent::Down {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(position: Point) -> Self {
        PointerEvent::Move {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(position: Point) -> Self {
        PointerEvent::Up {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    /// Same event with different modifiers.
    pub fn with_modifiers(mut self, mods: Modifiers) -> Self {
        match &mut self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. }
            | PointerEvent::Wheel { modifiers, .. } => *modifiers = mods,
        }
        self
    }

    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Wheel { position, .. } => *position,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. }
            | PointerEvent::Wheel { modifiers, .. } => *modifiers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Printable text, already composed by the host.
    Character(String),
    Enter,
    Backspace,
    Delete,
    Escape,
    Tab,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn character(text: impl Into<String>) -> Self {
        Self::plain(Key::Character(text.into()))
    }

    pub fn action(letter: char) -> Self {
        Self::new(Key::Character(letter.to_string()), Modifiers::ctrl())
    }
}

/// Editor commands bound to keys outside of text editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Delete,
    Duplicate,
    SelectAll,
    Copy,
    Paste,
    Undo,
    Redo,
    Group,
    Ungroup,
    Cancel,
}

impl Shortcut {
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        let mods = event.modifiers;
        match &event.key {
            Key::Delete | Key::Backspace => Some(Shortcut::Delete),
            Key::Escape => Some(Shortcut::Cancel),
            Key::Character(text) if mods.action() => {
                match (text.to_lowercase().as_str(), mods.shift) {
                    ("d", _) => Some(Shortcut::Duplicate),
                    ("a", _) => Some(Shortcut::SelectAll),
                    ("c", _) => Some(Shortcut::Copy),
                    ("v", _) => Some(Shortcut::Paste),
                    ("z", false) => Some(Shortcut::Undo),
                    ("z", true) | ("y", _) => Some(Shortcut::Redo),
                    ("g", false) => Some(Shortcut::Group),
                    ("g", true) => Some(Shortcut::Ungroup),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Pointer state carried between events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last pointer position in screen coordinates.
    pub screen: Point,
    /// Last pointer position in canvas coordinates.
    pub world: Point,
    pub modifiers: Modifiers,
    pressed: HashSet<MouseButton>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, event: &PointerEvent, world: Point) {
        self.screen = event.position();
        self.world = world;
        self.modifiers = event.modifiers();
        match event {
            PointerEvent::Down { button, .. } => {
                self.pressed.insert(*button);
            }
            PointerEvent::Up { button, .. } => {
                self.pressed.remove(button);
            }
            _ => {}
        }
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains(&button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_mapping() {
        assert_eq!(Shortcut::from_key_event(&KeyEvent::action('z')), Some(Shortcut::Undo));
        assert_eq!(Shortcut::from_key_event(&KeyEvent::action('Y')), Some(Shortcut::Redo));
        let redo = KeyEvent::new(
            Key::Character("z".into()),
            Modifiers {
                shift: true,
                ctrl: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(Shortcut::from_key_event(&redo), Some(Shortcut::Redo));
        assert_eq!(Shortcut::from_key_event(&KeyEvent::plain(Key::Delete)), Some(Shortcut::Delete));
        assert_eq!(Shortcut::from_key_event(&KeyEvent::character("d")), None);
    }

    #[test]
    fn test_meta_counts_as_action() {
        let event = KeyEvent::new(
            Key::Character("g".into()),
            Modifiers {
                meta: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(Shortcut::from_key_event(&event), Some(Shortcut::Group));
    }

    #[test]
    fn test_input_state_tracks_buttons() {
        let mut input = InputState::new();
        let down = PointerEvent::down(Point::new(10.0, 20.0)).with_modifiers(Modifiers::shift());
        input.track(&down, Point::new(5.0, 10.0));
        assert!(input.is_pressed(MouseButton::Left));
        assert!(input.modifiers.shift);
        assert_eq!(input.world, Point::new(5.0, 10.0));

        input.track(&PointerEvent::up(Point::new(10.0, 20.0)), Point::new(5.0, 10.0));
        assert!(!input.is_pressed(MouseButton::Left));
    }
}

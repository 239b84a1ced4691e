//! Decoded input as the state machine sees it. Device polling lives in the
//! binary; nothing here knows about terminals.

/// A discrete key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    /// Any printable character, including space.
    Char(char),
}

impl Key {
    /// Escape, or `q`/`Q` where the screen has no text entry.
    pub fn is_quit(self) -> bool {
        matches!(self, Key::Escape | Key::Char('q') | Key::Char('Q'))
    }

    pub fn is_fire(self) -> bool {
        self == Key::Char(' ')
    }
}

/// Movement keys currently held down, sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub const NONE: HeldKeys = HeldKeys {
        left: false,
        right: false,
    };

    pub fn left() -> Self {
        HeldKeys {
            left: true,
            right: false,
        }
    }

    pub fn right() -> Self {
        HeldKeys {
            left: false,
            right: true,
        }
    }
}

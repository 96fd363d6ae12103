//! Input events delivered to the game context
//!
//! The driver only delivers what the platform reports; interpreting the
//! events is up to the game.

/// State change of a key or button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Pressed down
    Press,
    /// Released
    Release,
    /// Held long enough to auto-repeat
    Repeat,
}

/// One input event
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Keyboard key
    Key {
        /// Platform key code
        key: i32,
        /// Hardware scancode
        scancode: i32,
        /// What happened
        action: ButtonAction,
        /// Modifier bit set
        modifiers: i32,
    },
    /// Mouse button
    MouseButton {
        /// Button index
        button: i32,
        /// What happened
        action: ButtonAction,
        /// Modifier bit set
        modifiers: i32,
    },
    /// Cursor moved, in window coordinates
    CursorPos {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
    /// Scroll wheel or touchpad scroll
    Scroll {
        /// Horizontal offset
        dx: f64,
        /// Vertical offset
        dy: f64,
    },
    /// Text input
    Char(char),
}

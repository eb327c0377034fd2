//! OS input injection boundary
//!
//! [`InputInjector`] is the only way the crate touches the operating system.
//! [`RecordingInjector`] captures actions for dry runs and tests; the
//! `enigo` feature adds a real backend.

use super::mapping::{Key, MouseButton};
use crate::time::timebase::Timestamp;
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("injection backend unavailable: {0}")]
    Unavailable(String),
    #[error("injection failed: {0}")]
    Failed(String),
    #[error("unsupported input: {0}")]
    Unsupported(String),
}

/// Primitive input operations
pub trait InputInjector: Send + Sync {
    fn key_down(&self, key: Key) -> Result<(), InjectError>;
    fn key_up(&self, key: Key) -> Result<(), InjectError>;
    fn button_down(&self, button: MouseButton) -> Result<(), InjectError>;
    fn button_up(&self, button: MouseButton) -> Result<(), InjectError>;
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectError>;
    fn scroll(&self, delta: i32) -> Result<(), InjectError>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInjector;

impl InputInjector for NoopInjector {
    fn key_down(&self, _key: Key) -> Result<(), InjectError> {
        Ok(())
    }
    fn key_up(&self, _key: Key) -> Result<(), InjectError> {
        Ok(())
    }
    fn button_down(&self, _button: MouseButton) -> Result<(), InjectError> {
        Ok(())
    }
    fn button_up(&self, _button: MouseButton) -> Result<(), InjectError> {
        Ok(())
    }
    fn move_relative(&self, _dx: i32, _dy: i32) -> Result<(), InjectError> {
        Ok(())
    }
    fn scroll(&self, _delta: i32) -> Result<(), InjectError> {
        Ok(())
    }
}

/// A primitive as seen by [`RecordingInjector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InputAction {
    KeyDown { key: Key },
    KeyUp { key: Key },
    ButtonDown { button: MouseButton },
    ButtonUp { button: MouseButton },
    Move { dx: i32, dy: i32 },
    Scroll { delta: i32 },
}

impl std::fmt::Display for InputAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputAction::KeyDown { key } => write!(f, "key_down {}", key),
            InputAction::KeyUp { key } => write!(f, "key_up {}", key),
            InputAction::ButtonDown { button } => write!(f, "button_down {}", button),
            InputAction::ButtonUp { button } => write!(f, "button_up {}", button),
            InputAction::Move { dx, dy } => write!(f, "move {} {}", dx, dy),
            InputAction::Scroll { delta } => write!(f, "scroll {}", delta),
        }
    }
}

/// Action with the time it was injected
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordedAction {
    pub at: Timestamp,
    #[serde(flatten)]
    pub action: InputAction,
}

/// Relative mouse motion summed over every move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionTotal {
    pub dx: i64,
    pub dy: i64,
    pub moves: u64,
}

/// Records every key, button and scroll primitive; optionally fails a chosen
/// one. Mouse moves arrive every integrator tick, so they are summed into a
/// [`MotionTotal`] instead of being stored.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    actions: Mutex<Vec<RecordedAction>>,
    motion: Mutex<MotionTotal>,
    fail_on: Mutex<Option<InputAction>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `action` fail (it is still not recorded)
    pub fn fail_on(&self, action: InputAction) {
        *self.fail_on.lock() = Some(action);
    }

    /// Recorded actions in injection order; mouse moves are not included
    pub fn actions(&self) -> Vec<InputAction> {
        self.actions.lock().iter().map(|r| r.action).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedAction> {
        self.actions.lock().clone()
    }

    /// Sum of all relative mouse motion
    pub fn total_motion(&self) -> (i64, i64) {
        let motion = *self.motion.lock();
        (motion.dx, motion.dy)
    }

    pub fn motion(&self) -> MotionTotal {
        *self.motion.lock()
    }

    pub fn clear(&self) {
        self.actions.lock().clear();
        *self.motion.lock() = MotionTotal::default();
    }

    fn check(&self, action: InputAction) -> Result<(), InjectError> {
        if *self.fail_on.lock() == Some(action) {
            return Err(InjectError::Failed(action.to_string()));
        }
        Ok(())
    }

    fn record(&self, action: InputAction) -> Result<(), InjectError> {
        self.check(action)?;
        self.actions.lock().push(RecordedAction {
            at: Timestamp::now(),
            action,
        });
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn key_down(&self, key: Key) -> Result<(), InjectError> {
        self.record(InputAction::KeyDown { key })
    }
    fn key_up(&self, key: Key) -> Result<(), InjectError> {
        self.record(InputAction::KeyUp { key })
    }
    fn button_down(&self, button: MouseButton) -> Result<(), InjectError> {
        self.record(InputAction::ButtonDown { button })
    }
    fn button_up(&self, button: MouseButton) -> Result<(), InjectError> {
        self.record(InputAction::ButtonUp { button })
    }
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectError> {
        self.check(InputAction::Move { dx, dy })?;
        let mut motion = self.motion.lock();
        motion.dx += i64::from(dx);
        motion.dy += i64::from(dy);
        motion.moves += 1;
        Ok(())
    }
    fn scroll(&self, delta: i32) -> Result<(), InjectError> {
        self.record(InputAction::Scroll { delta })
    }
}

#[cfg(feature = "enigo")]
pub use os::EnigoInjector;

#[cfg(feature = "enigo")]
mod os {
    use super::{InjectError, InputInjector};
    use crate::dispatch::mapping::{Key, MouseButton};
    use enigo::{Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
    use std::cell::RefCell;

    thread_local! {
        // Enigo handles are not shareable across threads on every platform,
        // so each injecting thread opens its own.
        static ENIGO: RefCell<Option<Enigo>> = const { RefCell::new(None) };
    }

    /// Injects real OS input through `enigo`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct EnigoInjector;

    impl EnigoInjector {
        /// Verify the backend can be opened on the calling thread
        pub fn new() -> Result<Self, InjectError> {
            with_enigo(|_| Ok(()))?;
            Ok(Self)
        }
    }

    fn with_enigo<T>(f: impl FnOnce(&mut Enigo) -> Result<T, InjectError>) -> Result<T, InjectError> {
        ENIGO.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                let enigo = Enigo::new(&Settings::default())
                    .map_err(|e| InjectError::Unavailable(format!("{:?}", e)))?;
                *slot = Some(enigo);
            }
            match slot.as_mut() {
                Some(enigo) => f(enigo),
                None => Err(InjectError::Unavailable("enigo not initialized".into())),
            }
        })
    }

    fn to_enigo_key(key: Key) -> enigo::Key {
        match key {
            Key::Char(c) => enigo::Key::Unicode(c),
            Key::Space => enigo::Key::Space,
            Key::Shift => enigo::Key::Shift,
            Key::Ctrl => enigo::Key::Control,
            Key::Alt => enigo::Key::Alt,
            Key::Tab => enigo::Key::Tab,
            Key::Enter => enigo::Key::Return,
            Key::Esc => enigo::Key::Escape,
            Key::Up => enigo::Key::UpArrow,
            Key::Down => enigo::Key::DownArrow,
            Key::Left => enigo::Key::LeftArrow,
            Key::Right => enigo::Key::RightArrow,
        }
    }

    fn to_enigo_button(button: MouseButton) -> Result<Button, InjectError> {
        match button {
            MouseButton::Left => Ok(Button::Left),
            MouseButton::Right => Ok(Button::Right),
            MouseButton::Middle => Ok(Button::Middle),
            #[cfg(not(target_os = "macos"))]
            MouseButton::X1 => Ok(Button::Back),
            #[cfg(not(target_os = "macos"))]
            MouseButton::X2 => Ok(Button::Forward),
            #[cfg(target_os = "macos")]
            other => Err(InjectError::Unsupported(format!("mouse button {}", other))),
        }
    }

    fn failed(e: enigo::InputError) -> InjectError {
        InjectError::Failed(format!("{:?}", e))
    }

    impl InputInjector for EnigoInjector {
        fn key_down(&self, key: Key) -> Result<(), InjectError> {
            with_enigo(|e| e.key(to_enigo_key(key), Direction::Press).map_err(failed))
        }
        fn key_up(&self, key: Key) -> Result<(), InjectError> {
            with_enigo(|e| e.key(to_enigo_key(key), Direction::Release).map_err(failed))
        }
        fn button_down(&self, button: MouseButton) -> Result<(), InjectError> {
            let button = to_enigo_button(button)?;
            with_enigo(|e| e.button(button, Direction::Press).map_err(failed))
        }
        fn button_up(&self, button: MouseButton) -> Result<(), InjectError> {
            let button = to_enigo_button(button)?;
            with_enigo(|e| e.button(button, Direction::Release).map_err(failed))
        }
        fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectError> {
            with_enigo(|e| e.move_mouse(dx, dy, Coordinate::Rel).map_err(failed))
        }
        fn scroll(&self, delta: i32) -> Result<(), InjectError> {
            with_enigo(|e| e.scroll(delta, Axis::Vertical).map_err(failed))
        }
    }
}

//! Input mapping
//!
//! Gesture name → input combination table, per-kind release intervals and the
//! hot-swappable settings handle the dispatcher and detector read from.

use crate::gesture::library::GestureKind;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// A keyboard key: a printable character or one of the named keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Char(char),
    Space,
    Shift,
    Ctrl,
    Alt,
    Tab,
    Enter,
    Esc,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Named keys accepted in mappings
    pub const NAMED: [Key; 11] = [
        Key::Space,
        Key::Shift,
        Key::Ctrl,
        Key::Alt,
        Key::Tab,
        Key::Enter,
        Key::Esc,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
    ];

    fn name(&self) -> Option<&'static str> {
        Some(match self {
            Key::Char(_) => return None,
            Key::Space => "space",
            Key::Shift => "shift",
            Key::Ctrl => "ctrl",
            Key::Alt => "alt",
            Key::Tab => "tab",
            Key::Enter => "enter",
            Key::Esc => "esc",
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
        })
    }
}

impl FromStr for Key {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(key) = Key::NAMED.iter().find(|k| k.name() == Some(lower.as_str())) {
            return Ok(*key);
        }

        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() && !c.is_whitespace() => Ok(Key::Char(c)),
            _ => Err(crate::Error::Config(format!("unknown key '{}'", s))),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self, self.name()) {
            (Key::Char(c), _) => write!(f, "{}", c),
            (_, Some(name)) => f.write_str(name),
            (_, None) => Ok(()),
        }
    }
}

/// Mouse buttons accepted in mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::X1 => "x1",
            MouseButton::X2 => "x2",
        };
        f.write_str(name)
    }
}

/// Mouse-movement direction; each component in [-1, 1]. Stored as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct MouseMove {
    pub x: f32,
    pub y: f32,
}

impl MouseMove {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for MouseMove {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<MouseMove> for [f32; 2] {
    fn from(m: MouseMove) -> Self {
        [m.x, m.y]
    }
}

/// What a gesture triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_button: Option<MouseButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_move: Option<MouseMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_scroll: Option<i32>,
    /// Inactive mappings also disable detection of their gesture
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for InputMapping {
    fn default() -> Self {
        Self {
            key: None,
            modifier: None,
            mouse_button: None,
            mouse_move: None,
            mouse_scroll: None,
            active: true,
        }
    }
}

impl InputMapping {
    pub fn key(key: Key) -> Self {
        Self {
            key: Some(key),
            ..Default::default()
        }
    }

    pub fn modifier(modifier: Key) -> Self {
        Self {
            modifier: Some(modifier),
            ..Default::default()
        }
    }

    pub fn mouse_button(button: MouseButton) -> Self {
        Self {
            mouse_button: Some(button),
            ..Default::default()
        }
    }

    pub fn mouse_move(x: f32, y: f32) -> Self {
        Self {
            mouse_move: Some(MouseMove::new(x, y)),
            ..Default::default()
        }
    }

    pub fn scroll(delta: i32) -> Self {
        Self {
            mouse_scroll: Some(delta),
            ..Default::default()
        }
    }

    /// The holdable part of the mapping
    pub fn combination(&self) -> Combination {
        Combination {
            key: self.key,
            modifier: self.modifier,
            mouse_button: self.mouse_button,
            mouse_move: self.mouse_move,
        }
    }

    /// Nothing to press, hold or scroll
    pub fn is_empty(&self) -> bool {
        self.combination().is_empty() && self.mouse_scroll.is_none()
    }
}

/// A holdable input combination
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Combination {
    pub key: Option<Key>,
    pub modifier: Option<Key>,
    pub mouse_button: Option<MouseButton>,
    pub mouse_move: Option<MouseMove>,
}

impl Combination {
    pub fn is_empty(&self) -> bool {
        self.key.is_none()
            && self.modifier.is_none()
            && self.mouse_button.is_none()
            && self.mouse_move.is_none()
    }
}

impl std::fmt::Display for Combination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(k) = self.key {
            parts.push(format!("key={}", k));
        }
        if let Some(m) = self.modifier {
            parts.push(format!("modifier={}", m));
        }
        if let Some(b) = self.mouse_button {
            parts.push(format!("button={}", b));
        }
        if let Some(mv) = self.mouse_move {
            parts.push(format!("move=({}, {})", mv.x, mv.y));
        }
        if parts.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// The mapping table, keyed by gesture name
pub type InputMappings = BTreeMap<String, InputMapping>;

/// Built-in mapping for the standard gesture library
pub fn default_mappings() -> InputMappings {
    let entries = [
        ("jump", InputMapping::modifier(Key::Space)),
        ("cross_hands", InputMapping::key(Key::Char('e'))),
        ("left_swing", InputMapping::mouse_button(MouseButton::Right)),
        ("right_swing", InputMapping::mouse_button(MouseButton::Left)),
        ("left_hand_right", InputMapping::scroll(-1)),
        ("right_hand_left", InputMapping::scroll(1)),
        ("walk_forward", InputMapping::key(Key::Char('w'))),
        ("walk_left", InputMapping::key(Key::Char('a'))),
        ("walk_right", InputMapping::key(Key::Char('d'))),
        ("walk_backward", InputMapping::key(Key::Char('s'))),
        ("squat", InputMapping::modifier(Key::Shift)),
        ("face_left", InputMapping::mouse_move(-1.0, 0.0)),
        ("face_right", InputMapping::mouse_move(1.0, 0.0)),
        ("face_up", InputMapping::mouse_move(0.0, -1.0)),
        ("face_down", InputMapping::mouse_move(0.0, 1.0)),
    ];
    entries
        .into_iter()
        .map(|(name, mapping)| (name.to_string(), mapping))
        .collect()
}

/// Auto-release interval per gesture kind, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerIntervals {
    pub click_ms: u64,
    pub hold_ms: u64,
    pub hand_swing_ms: u64,
    pub face_direction_ms: u64,
    pub scroll_ms: u64,
}

impl Default for TimerIntervals {
    fn default() -> Self {
        Self {
            click_ms: 300,
            hold_ms: 1000,
            hand_swing_ms: 800,
            face_direction_ms: 200,
            scroll_ms: 0,
        }
    }
}

impl TimerIntervals {
    pub fn for_kind(&self, kind: GestureKind) -> Duration {
        let ms = match kind {
            GestureKind::Click => self.click_ms,
            GestureKind::Hold => self.hold_ms,
            GestureKind::HandSwing => self.hand_swing_ms,
            GestureKind::FaceDirection => self.face_direction_ms,
            GestureKind::Scroll => self.scroll_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Everything the dispatcher reads per event
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub mappings: InputMappings,
    /// When false, gestures are recorded but nothing is injected
    pub keyboard_enabled: bool,
    pub intervals: TimerIntervals,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            mappings: default_mappings(),
            keyboard_enabled: true,
            intervals: TimerIntervals::default(),
        }
    }
}

/// Settings handle shared between the capture loop, the dispatch worker and
/// the application; replaceable while a session runs.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<DispatchSettings>>,
}

impl SharedSettings {
    pub fn new(settings: DispatchSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> DispatchSettings {
        self.inner.read().clone()
    }

    /// Replace all settings at once
    pub fn replace(&self, settings: DispatchSettings) {
        *self.inner.write() = settings;
    }

    pub fn set_keyboard_enabled(&self, enabled: bool) {
        self.inner.write().keyboard_enabled = enabled;
    }

    pub fn set_mapping(&self, gesture: impl Into<String>, mapping: InputMapping) {
        self.inner.write().mappings.insert(gesture.into(), mapping);
    }

    pub fn mapping(&self, gesture: &str) -> Option<InputMapping> {
        self.inner.read().mappings.get(gesture).cloned()
    }

    pub fn keyboard_enabled(&self) -> bool {
        self.inner.read().keyboard_enabled
    }

    pub fn interval(&self, kind: GestureKind) -> Duration {
        self.inner.read().intervals.for_kind(kind)
    }

    /// Gestures whose mapping is switched off
    pub fn disabled_gestures(&self) -> HashSet<String> {
        self.inner
            .read()
            .mappings
            .iter()
            .filter(|(_, m)| !m.active)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

//! Configuration Management

use crate::dispatch::history::DEFAULT_HISTORY_CAPACITY;
use crate::dispatch::mapping::{default_mappings, DispatchSettings, InputMappings, TimerIntervals};
use crate::gesture::library::{GestureLibrary, GestureThresholds};
use crate::mouse::DEFAULT_MOUSE_SPEED;
use crate::session::SessionOptions;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted checkpoint decay window
const MAX_DECAY_MS: u64 = 10_000;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pose input settings
    #[serde(default)]
    pub pose: PoseConfig,
    /// Gesture detection settings
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Input dispatch settings
    #[serde(default)]
    pub input: InputConfig,
    /// Mouse integrator settings
    #[serde(default)]
    pub mouse: MouseConfig,
    /// Gesture → input table; entries in the file replace the built-in entry
    /// of the same gesture and leave the others in place
    #[serde(default = "default_mappings", deserialize_with = "merge_over_defaults")]
    pub mappings: InputMappings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pose: PoseConfig::default(),
            detection: DetectionConfig::default(),
            input: InputConfig::default(),
            mouse: MouseConfig::default(),
            mappings: default_mappings(),
        }
    }
}

fn merge_over_defaults<'de, D>(deserializer: D) -> Result<InputMappings, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = InputMappings::deserialize(deserializer)?;
    let mut mappings = default_mappings();
    mappings.extend(overrides);
    Ok(mappings)
}

/// Pose input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Landmarks scoring below this are treated as unavailable
    pub visibility_threshold: f64,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
        }
    }
}

/// Gesture detection configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Keep the rest of an exclusion group suppressed for the group's
    /// hold-off after one member fires (same-frame suppression only when false)
    pub exclusion_hold_off: bool,
    /// Angles, ranges and decay windows of the standard gestures
    pub thresholds: GestureThresholds,
}

/// Input dispatch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Inject input (false records gestures only)
    pub keyboard_enabled: bool,
    /// Command history entries kept
    pub history_capacity: usize,
    /// Auto-release interval per gesture kind
    pub timers: TimerIntervals,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard_enabled: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            timers: TimerIntervals::default(),
        }
    }
}

/// Mouse integrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    /// Units per second at full deflection
    pub speed: f64,
    /// Integrator loop period (ms)
    pub poll_interval_ms: u64,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_MOUSE_SPEED,
            poll_interval_ms: 10,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(0.0..=1.0).contains(&self.pose.visibility_threshold) {
            return Err(crate::Error::Config(format!(
                "visibility_threshold must be in [0, 1], got {}",
                self.pose.visibility_threshold
            )));
        }
        if !self.mouse.speed.is_finite() || self.mouse.speed < 0.0 {
            return Err(crate::Error::Config(format!(
                "mouse speed must be finite and >= 0, got {}",
                self.mouse.speed
            )));
        }
        if !(1..=1000).contains(&self.mouse.poll_interval_ms) {
            return Err(crate::Error::Config(format!(
                "poll_interval_ms must be in [1, 1000], got {}",
                self.mouse.poll_interval_ms
            )));
        }
        if self.input.history_capacity == 0 {
            return Err(crate::Error::Config("history_capacity must be > 0".to_string()));
        }

        let t = &self.detection.thresholds;
        for (name, ms) in [
            ("default_checkpoint_decay_ms", t.default_checkpoint_decay_ms),
            ("jump_checkpoint_decay_ms", t.jump_checkpoint_decay_ms),
        ] {
            if ms > MAX_DECAY_MS {
                return Err(crate::Error::Config(format!(
                    "{} must be <= {}, got {}",
                    name, MAX_DECAY_MS, ms
                )));
            }
        }
        let angles = [
            t.elbow_cross_max_angle,
            t.squat_knee_max_angle,
            t.walk_knee_max_angle,
            t.direction_left_foot_min,
            t.direction_left_foot_max,
            t.direction_right_foot_min,
            t.direction_right_foot_max,
            t.face_left_min,
            t.face_right_min,
            t.face_up_min,
            t.face_down_min,
        ];
        if angles.iter().any(|a| !a.is_finite()) {
            return Err(crate::Error::Config("gesture thresholds must be finite".to_string()));
        }

        let library = self.library();
        for (gesture, mapping) in &self.mappings {
            if !library.contains(gesture) {
                return Err(crate::Error::Config(format!(
                    "mapping for unknown gesture '{}'",
                    gesture
                )));
            }
            if let Some(mv) = mapping.mouse_move {
                if !(-1.0..=1.0).contains(&mv.x) || !(-1.0..=1.0).contains(&mv.y) {
                    return Err(crate::Error::Config(format!(
                        "mouse_move for '{}' must be within [-1, 1], got [{}, {}]",
                        gesture, mv.x, mv.y
                    )));
                }
            }
        }
        Ok(())
    }

    /// Gesture library built from the configured thresholds
    pub fn library(&self) -> GestureLibrary {
        GestureLibrary::standard(&self.detection.thresholds)
    }

    /// Initial dispatch settings
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            mappings: self.mappings.clone(),
            keyboard_enabled: self.input.keyboard_enabled,
            intervals: self.input.timers.clone(),
        }
    }

    /// Session tunables
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            thresholds: self.detection.thresholds.clone(),
            visibility_threshold: self.pose.visibility_threshold,
            exclusion_hold_off: self.detection.exclusion_hold_off,
            mouse_speed: self.mouse.speed,
            poll_interval: Duration::from_millis(self.mouse.poll_interval_ms),
            history_capacity: self.input.history_capacity,
        }
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".motion_map").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// The `--config` path when given, the default location otherwise
    pub fn resolve_path(custom: Option<&Path>) -> PathBuf {
        custom.map(Path::to_path_buf).unwrap_or_else(Self::default_path)
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Look up a value by dotted key, e.g. `mouse.speed` or `mappings.jump.modifier`
    pub fn get_value(&self, key: &str) -> Result<Option<String>, crate::Error> {
        let value = toml::Value::try_from(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        let found = key
            .split('.')
            .try_fold(&value, |node, part| node.get(part));
        Ok(found.map(|v| match v {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }
}

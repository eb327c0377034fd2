//! Command Dispatcher
//!
//! Turns gesture events into input actions using the current settings, and
//! keeps the history of everything it was asked to dispatch.

use super::history::CommandHistory;
use super::injector::{InjectError, InputInjector};
use super::mapping::SharedSettings;
use super::press::{HeldInput, HoldChange};
use crate::gesture::detector::GestureEvent;
use crate::mouse::DirectionVector;
use crate::time::timebase::Timestamp;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Keyboard events are disabled; only recorded
    DryRun,
    /// No mapping, or a mapping with nothing to do
    Unmapped,
    Applied {
        scrolled: bool,
        hold: HoldChange,
    },
}

pub struct Dispatcher {
    settings: SharedSettings,
    history: CommandHistory,
    held: HeldInput,
}

impl Dispatcher {
    pub fn new(
        settings: SharedSettings,
        injector: Arc<dyn InputInjector>,
        direction: Arc<DirectionVector>,
        history_capacity: usize,
    ) -> Self {
        Self {
            settings,
            history: CommandHistory::with_capacity(history_capacity),
            held: HeldInput::new(injector, direction),
        }
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn into_history(self) -> CommandHistory {
        self.history
    }

    pub fn held(&self) -> &HeldInput {
        &self.held
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn pending_deadline(&self) -> Option<Timestamp> {
        self.held.pending_deadline()
    }

    /// Apply one gesture event at time `now`. Injection failures are logged
    /// and never stop the rest of the dispatch.
    pub fn dispatch(&mut self, event: &GestureEvent, now: Timestamp) -> DispatchOutcome {
        self.history.record(&event.gesture, event.kind, event.timestamp);

        let (enabled, mapping, interval) = {
            let settings = self.settings.snapshot();
            (
                settings.keyboard_enabled,
                settings.mappings.get(&event.gesture).cloned(),
                settings.intervals.for_kind(event.kind),
            )
        };

        if !enabled {
            debug!(gesture = %event.gesture, "Keyboard disabled, recorded only");
            return DispatchOutcome::DryRun;
        }

        let mapping = match mapping {
            Some(m) if !m.is_empty() => m,
            _ => {
                debug!(gesture = %event.gesture, "No input mapped");
                return DispatchOutcome::Unmapped;
            }
        };

        let mut scrolled = false;
        if let Some(delta) = mapping.mouse_scroll {
            match self.held.scroll(delta) {
                Ok(()) => scrolled = true,
                Err(e) => warn!(gesture = %event.gesture, error = %e, "Scroll failed"),
            }
        }

        let hold = match self.held.hold(mapping.combination(), now, interval) {
            Ok(change) => change,
            Err(e) => {
                warn!(gesture = %event.gesture, error = %e, "Input injection failed");
                HoldChange::Pressed
            }
        };

        debug!(
            gesture = %event.gesture,
            kind = %event.kind,
            ?hold,
            scrolled,
            interval_ms = interval.as_millis() as u64,
            "Dispatched"
        );
        DispatchOutcome::Applied { scrolled, hold }
    }

    /// Fire the release timer if due
    pub fn fire_due(&mut self, now: Timestamp) -> bool {
        match self.held.fire_due(now) {
            Ok(released) => released,
            Err(e) => {
                warn!(error = %e, "Release incomplete");
                true
            }
        }
    }

    pub fn release_all(&mut self) -> Result<(), InjectError> {
        self.held.release_all()
    }

    /// Drop the pending timer, release everything and clear the direction
    pub fn shutdown(&mut self) -> Result<(), InjectError> {
        self.held.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::injector::{InputAction, RecordingInjector};
    use crate::dispatch::mapping::{InputMapping, Key};
    use crate::gesture::library::GestureKind;

    fn setup() -> (Dispatcher, Arc<RecordingInjector>, SharedSettings) {
        let injector = Arc::new(RecordingInjector::new());
        let settings = SharedSettings::default();
        let dispatcher = Dispatcher::new(
            settings.clone(),
            injector.clone(),
            Arc::new(DirectionVector::new()),
            16,
        );
        (dispatcher, injector, settings)
    }

    fn event(gesture: &str, kind: GestureKind, ms: u64) -> GestureEvent {
        GestureEvent {
            gesture: gesture.to_string(),
            kind,
            timestamp: Timestamp::from_millis(ms),
        }
    }

    #[test]
    fn test_dry_run_records_only() {
        let (mut d, injector, settings) = setup();
        settings.set_keyboard_enabled(false);

        let outcome = d.dispatch(&event("jump", GestureKind::Click, 0), Timestamp::from_millis(0));
        assert_eq!(outcome, DispatchOutcome::DryRun);
        assert_eq!(d.history().len(), 1);
        assert!(injector.actions().is_empty());
        assert_eq!(d.pending_deadline(), None);
    }

    #[test]
    fn test_unmapped_gesture_recorded() {
        let (mut d, injector, _) = setup();
        let outcome = d.dispatch(&event("wave", GestureKind::Click, 0), Timestamp::from_millis(0));
        assert_eq!(outcome, DispatchOutcome::Unmapped);
        assert_eq!(d.history().latest().unwrap().gesture, "wave");
        assert!(injector.actions().is_empty());
    }

    #[test]
    fn test_scroll_is_fire_and_forget() {
        let (mut d, injector, _) = setup();
        let outcome = d.dispatch(
            &event("right_hand_left", GestureKind::Scroll, 0),
            Timestamp::from_millis(0),
        );
        assert_eq!(
            outcome,
            DispatchOutcome::Applied {
                scrolled: true,
                hold: HoldChange::Ignored
            }
        );
        assert_eq!(injector.actions(), vec![InputAction::Scroll { delta: 1 }]);
        assert_eq!(d.pending_deadline(), None);
    }

    #[test]
    fn test_interval_follows_kind() {
        let (mut d, _, _) = setup();
        d.dispatch(&event("left_swing", GestureKind::HandSwing, 0), Timestamp::from_millis(50));
        assert_eq!(d.pending_deadline(), Some(Timestamp::from_millis(850)));
    }

    #[test]
    fn test_hot_swapped_mapping_applies() {
        let (mut d, injector, settings) = setup();
        settings.set_mapping("jump", InputMapping::key(Key::Char('j')));

        d.dispatch(&event("jump", GestureKind::Click, 0), Timestamp::from_millis(0));
        assert_eq!(injector.actions(), vec![InputAction::KeyDown { key: Key::Char('j') }]);
    }
}

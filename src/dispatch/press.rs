//! Held-input state machine
//!
//! Owns the single held combination and its one-shot release timer. The timer
//! is data, not a thread: the owner polls [`HeldInput::pending_deadline`] and
//! calls [`HeldInput::fire_due`] once it passes. Every press is stamped with a
//! generation so a timer armed for an older combination can never release a
//! newer one.

use super::injector::{InjectError, InputInjector};
use super::mapping::Combination;
use crate::mouse::DirectionVector;
use crate::time::timebase::Timestamp;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The combination currently held down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressState {
    /// What the mapping asked for
    pub combination: Combination,
    /// The part of `combination` that actually went down; only this is released
    pub pressed: Combination,
    pub started_at: Timestamp,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReleaseTimer {
    generation: u64,
    deadline: Timestamp,
}

/// What [`HeldInput::hold`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldChange {
    /// A new combination was pressed (after releasing any previous one)
    Pressed,
    /// The same combination was already held; only the timer restarted
    Extended,
    /// Empty combination; nothing touched
    Ignored,
}

pub struct HeldInput {
    injector: Arc<dyn InputInjector>,
    direction: Arc<DirectionVector>,
    current: Option<PressState>,
    timer: Option<ReleaseTimer>,
    next_generation: u64,
}

impl HeldInput {
    pub fn new(injector: Arc<dyn InputInjector>, direction: Arc<DirectionVector>) -> Self {
        Self {
            injector,
            direction,
            current: None,
            timer: None,
            next_generation: 1,
        }
    }

    pub fn current(&self) -> Option<&PressState> {
        self.current.as_ref()
    }

    pub fn is_holding(&self) -> bool {
        self.current.is_some()
    }

    pub fn direction(&self) -> &Arc<DirectionVector> {
        &self.direction
    }

    /// Deadline of the pending release, if any
    pub fn pending_deadline(&self) -> Option<Timestamp> {
        self.timer.map(|t| t.deadline)
    }

    /// Hold `combination` and (re)arm the release timer for `interval` from `now`.
    ///
    /// A differing combination fully releases the previous one first. Press
    /// failures are logged and the remaining fields are still pressed; the
    /// first failure is returned. When nothing could be pressed no state is
    /// kept and no timer is armed.
    pub fn hold(
        &mut self,
        combination: Combination,
        now: Timestamp,
        interval: Duration,
    ) -> Result<HoldChange, InjectError> {
        if combination.is_empty() {
            return Ok(HoldChange::Ignored);
        }

        let mut first_error = None;
        let change = match self.current.map(|s| s.combination) {
            Some(held) if held == combination => HoldChange::Extended,
            _ => {
                if let Err(e) = self.release() {
                    first_error.get_or_insert(e);
                }
                let (pressed, press_error) = self.press(combination);
                if let Some(e) = press_error {
                    first_error.get_or_insert(e);
                }
                if !pressed.is_empty() {
                    let generation = self.next_generation;
                    self.next_generation += 1;
                    self.current = Some(PressState {
                        combination,
                        pressed,
                        started_at: now,
                        generation,
                    });
                }
                HoldChange::Pressed
            }
        };

        if let Some(state) = self.current {
            self.timer = Some(ReleaseTimer {
                generation: state.generation,
                deadline: now.add(interval),
            });
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(change),
        }
    }

    /// Fire the pending timer if its deadline has passed. Returns true when it
    /// released something.
    pub fn fire_due(&mut self, now: Timestamp) -> Result<bool, InjectError> {
        let timer = match self.timer {
            Some(t) if t.deadline <= now => t,
            _ => return Ok(false),
        };
        self.timer = None;

        match self.current.map(|s| (s.generation, s.combination)) {
            Some((generation, combination)) if generation == timer.generation => {
                debug!(generation, combination = %combination, "Release timer fired");
                self.release().map(|_| true)
            }
            _ => {
                debug!(generation = timer.generation, "Stale release timer ignored");
                Ok(false)
            }
        }
    }

    /// Drop the pending timer without firing it
    pub fn cancel_timer(&mut self) {
        self.timer = None;
    }

    /// Release everything now and drop the timer
    pub fn release_all(&mut self) -> Result<(), InjectError> {
        self.timer = None;
        self.release()
    }

    /// Release everything and clear the direction unconditionally
    pub fn shutdown(&mut self) -> Result<(), InjectError> {
        let result = self.release_all();
        self.direction.zero();
        result
    }

    /// Fire-and-forget scroll tick
    pub fn scroll(&self, delta: i32) -> Result<(), InjectError> {
        self.injector.scroll(delta)
    }

    /// Press every field of `combination`. Returns the fields that went down
    /// and the first failure.
    fn press(&self, combination: Combination) -> (Combination, Option<InjectError>) {
        let mut first_error = None;
        let mut note = |result: Result<(), InjectError>, what: &str| match result {
            Ok(()) => true,
            Err(e) => {
                warn!(input = what, error = %e, "Press failed");
                first_error.get_or_insert(e);
                false
            }
        };

        let mut pressed = Combination::default();
        if let Some(key) = combination.key {
            if note(self.injector.key_down(key), "key") {
                pressed.key = Some(key);
            }
        }
        if let Some(modifier) = combination.modifier {
            if note(self.injector.key_down(modifier), "modifier") {
                pressed.modifier = Some(modifier);
            }
        }
        if let Some(button) = combination.mouse_button {
            if note(self.injector.button_down(button), "mouse_button") {
                pressed.mouse_button = Some(button);
            }
        }
        if let Some(mv) = combination.mouse_move {
            self.direction.set(mv.x, mv.y);
            pressed.mouse_move = Some(mv);
        }

        (pressed, first_error)
    }

    /// Best-effort, total release of the held combination. Nothing held is a no-op.
    fn release(&mut self) -> Result<(), InjectError> {
        let Some(state) = self.current.take() else {
            return Ok(());
        };
        let combination = state.pressed;

        let mut first_error = None;
        let mut note = |result: Result<(), InjectError>, what: &str| {
            if let Err(e) = result {
                warn!(input = what, error = %e, "Release failed");
                first_error.get_or_insert(e);
            }
        };

        if let Some(key) = combination.key {
            note(self.injector.key_up(key), "key");
        }
        if let Some(modifier) = combination.modifier {
            note(self.injector.key_up(modifier), "modifier");
        }
        if let Some(button) = combination.mouse_button {
            note(self.injector.button_up(button), "mouse_button");
        }
        if combination.mouse_move.is_some() {
            self.direction.zero();
        }

        debug!(generation = state.generation, combination = %combination, "Released");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

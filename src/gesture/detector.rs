//! Gesture Detector
//!
//! Evaluates a [`GestureLibrary`] against successive feature vectors. Each
//! gesture owns one latch per checkpoint; a gesture fires when its final
//! checkpoint is true while every earlier checkpoint is still latched.
//!
//! Evaluation runs in definition order with a per-frame `ignored` accumulator:
//! when a gesture fires, the rest of its exclusion group is skipped for the
//! remainder of that frame. Skipped gestures neither advance nor decay.

use super::library::{GestureDefinition, GestureKind, GestureLibrary};
use crate::pose::features::FeatureState;
use crate::time::timebase::Timestamp;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// A completed gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GestureEvent {
    pub gesture: String,
    pub kind: GestureKind,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, Default)]
struct CheckpointState {
    latched: bool,
    last_true_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
struct GestureRuntime {
    checkpoints: Vec<CheckpointState>,
}

impl GestureRuntime {
    fn for_definition(definition: &GestureDefinition) -> Self {
        Self {
            checkpoints: vec![CheckpointState::default(); definition.checkpoints.len()],
        }
    }

    fn reset(&mut self) {
        self.checkpoints.fill(CheckpointState::default());
    }
}

/// Stateful checkpoint evaluator
pub struct GestureDetector {
    library: GestureLibrary,
    runtime: Vec<GestureRuntime>,
    index: HashMap<String, usize>,
    /// Cross-frame hold-off; disabled means same-frame suppression only
    hold_off_enabled: bool,
    suppressed_until: HashMap<String, Timestamp>,
}

impl GestureDetector {
    pub fn new(library: GestureLibrary) -> Self {
        let runtime = library
            .gestures()
            .iter()
            .map(GestureRuntime::for_definition)
            .collect();
        let index = library
            .gestures()
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), i))
            .collect();

        Self {
            library,
            runtime,
            index,
            hold_off_enabled: false,
            suppressed_until: HashMap::new(),
        }
    }

    /// Keep the other members of a group suppressed for the group's hold-off
    /// after one of them fires.
    pub fn with_hold_off(mut self, enabled: bool) -> Self {
        self.hold_off_enabled = enabled;
        self
    }

    pub fn library(&self) -> &GestureLibrary {
        &self.library
    }

    /// Run one frame. `disabled` holds gestures whose mapping is inactive.
    pub fn evaluate(&mut self, state: &FeatureState, disabled: &HashSet<String>) -> Vec<GestureEvent> {
        let now = state.timestamp();
        let mut ignored: HashSet<&str> = disabled.iter().map(String::as_str).collect();

        if self.hold_off_enabled {
            self.suppressed_until.retain(|_, until| now < *until);
            ignored.extend(self.suppressed_until.keys().map(String::as_str));
        }

        let mut events = Vec::new();
        let mut holds = Vec::new();

        for (gi, definition) in self.library.gestures().iter().enumerate() {
            if ignored.contains(definition.name.as_str()) {
                continue;
            }

            let runtime = &mut self.runtime[gi];
            let last = definition.checkpoints.len() - 1;
            let mut fired = false;

            for (ci, step) in definition.checkpoints.iter().enumerate() {
                if step.predicate.evaluate(state) {
                    let cp = &mut runtime.checkpoints[ci];
                    cp.latched = true;
                    cp.last_true_at = Some(now);

                    if ci == last && runtime.checkpoints.iter().all(|c| c.latched) {
                        fired = true;
                    }
                } else {
                    let cp = &mut runtime.checkpoints[ci];
                    let expired = match cp.last_true_at {
                        Some(at) => now.duration_since(at) > step.decay_window,
                        None => true,
                    };
                    if expired && cp.latched {
                        trace!(gesture = %definition.name, checkpoint = ci, "Checkpoint decayed");
                    }
                    if expired {
                        cp.latched = false;
                    }
                }
            }

            if fired {
                debug!(gesture = %definition.name, kind = %definition.kind, timestamp = %now, "Gesture fired");
                events.push(GestureEvent {
                    gesture: definition.name.clone(),
                    kind: definition.kind,
                    timestamp: now,
                });

                if let Some(group) = self.library.group_of(&definition.name) {
                    for member in &group.members {
                        if member != &definition.name {
                            ignored.insert(member.as_str());
                            if let Some(hold_off) = group.hold_off {
                                holds.push((member.clone(), now.add(hold_off)));
                            }
                        }
                    }
                }
            }
        }

        if self.hold_off_enabled {
            for (member, until) in holds {
                let entry = self.suppressed_until.entry(member).or_insert(until);
                if *entry < until {
                    *entry = until;
                }
            }
        }

        events
    }

    /// Clear every latch and hold-off
    pub fn reset(&mut self) {
        for runtime in &mut self.runtime {
            runtime.reset();
        }
        self.suppressed_until.clear();
    }

    /// Clear one gesture's latches; returns false for unknown names
    pub fn reset_gesture(&mut self, name: &str) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                self.runtime[i].reset();
                self.suppressed_until.remove(name);
                true
            }
            None => false,
        }
    }

    /// Latch state of a checkpoint, for inspection
    pub fn checkpoint_latched(&self, name: &str, checkpoint: usize) -> Option<bool> {
        let &i = self.index.get(name)?;
        self.runtime[i].checkpoints.get(checkpoint).map(|c| c.latched)
    }
}

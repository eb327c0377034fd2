//! Input dispatch
//!
//! Maps gesture events onto OS input with press/hold/release timing.
//!
//! - [`mapping`]: gesture → input table, release intervals, shared settings
//! - [`injector`]: the OS boundary and its test/dry-run implementations
//! - [`press`]: the single held combination and its release timer
//! - [`history`]: bounded log of dispatched gestures
//! - [`dispatcher`]: per-event dispatch logic
//! - [`worker`]: the `input-dispatch` thread

pub mod mapping;
pub mod injector;
pub mod press;
pub mod history;
pub mod dispatcher;
pub mod worker;

pub use mapping::{
    default_mappings, Combination, DispatchSettings, InputMapping, InputMappings, Key, MouseButton,
    MouseMove, SharedSettings, TimerIntervals,
};
pub use injector::{
    InjectError, InputAction, InputInjector, MotionTotal, NoopInjector, RecordingInjector,
};
#[cfg(feature = "enigo")]
pub use injector::EnigoInjector;
pub use press::{HeldInput, HoldChange, PressState};
pub use history::{CommandHistory, HistoryEntry};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use worker::{DispatchCommand, DispatchHandle, DispatchReport};

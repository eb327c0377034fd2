//! Session runtime
//!
//! Wires a pose source to the detector, the dispatch worker and the mouse
//! integrator, each on its own thread:
//!
//! ```text
//! pose-capture ──GestureEvent──▶ input-dispatch ──DirectionVector──▶ mouse-integrator
//! ```

use super::processor::{FrameOutcome, FrameProcessor};
use super::source::PoseSource;
use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::history::{HistoryEntry, DEFAULT_HISTORY_CAPACITY};
use crate::dispatch::injector::InputInjector;
use crate::dispatch::mapping::SharedSettings;
use crate::dispatch::worker::{DispatchCommand, DispatchHandle};
use crate::gesture::detector::GestureDetector;
use crate::gesture::library::{GestureLibrary, GestureThresholds};
use crate::mouse::{DirectionVector, MouseIntegrator, DEFAULT_MOUSE_SPEED, DEFAULT_POLL_INTERVAL};
use crate::pose::features::FeatureExtractor;
use crossbeam_channel::Sender;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunables for one session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub thresholds: GestureThresholds,
    pub visibility_threshold: f64,
    /// Cross-frame exclusion hold-off
    pub exclusion_hold_off: bool,
    pub mouse_speed: f64,
    pub poll_interval: Duration,
    pub history_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            thresholds: GestureThresholds::default(),
            visibility_threshold: 0.5,
            exclusion_hold_off: false,
            mouse_speed: DEFAULT_MOUSE_SPEED,
            poll_interval: DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Counters and history collected over a session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    pub frames_read: u64,
    pub frames_evaluated: u64,
    pub frames_skipped: u64,
    pub frames_dropped: u64,
    pub gestures_fired: u64,
    pub timer_releases: u64,
    /// Newest first
    pub history: Vec<HistoryEntry>,
    pub history_summary: String,
}

#[derive(Debug, Clone, Copy, Default)]
struct CaptureStats {
    frames_read: u64,
    frames_evaluated: u64,
    frames_skipped: u64,
    frames_dropped: u64,
    gestures_fired: u64,
}

/// Cloneable stop request, e.g. for a Ctrl+C handler
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Session;

impl Session {
    /// Start a session with the standard gesture library
    pub fn start(
        source: Box<dyn PoseSource>,
        injector: Arc<dyn InputInjector>,
        settings: SharedSettings,
        options: SessionOptions,
    ) -> crate::Result<SessionHandle> {
        let library = GestureLibrary::standard(&options.thresholds);
        Self::start_with_library(source, injector, settings, library, options)
    }

    pub fn start_with_library(
        source: Box<dyn PoseSource>,
        injector: Arc<dyn InputInjector>,
        settings: SharedSettings,
        library: GestureLibrary,
        options: SessionOptions,
    ) -> crate::Result<SessionHandle> {
        info!(
            gestures = library.len(),
            hold_off = options.exclusion_hold_off,
            "Starting session"
        );

        let direction = Arc::new(DirectionVector::new());

        let dispatcher = Dispatcher::new(
            settings.clone(),
            injector.clone(),
            direction.clone(),
            options.history_capacity,
        );
        let dispatch = DispatchHandle::spawn(dispatcher)?;

        let mouse_stop = Arc::new(AtomicBool::new(false));
        let mouse = MouseIntegrator::new(direction, injector)
            .with_speed(options.mouse_speed)
            .with_poll_interval(options.poll_interval)
            .spawn(mouse_stop.clone())?;

        let processor = FrameProcessor::new(
            FeatureExtractor::new(options.visibility_threshold),
            GestureDetector::new(library).with_hold_off(options.exclusion_hold_off),
        );

        let stop = Arc::new(AtomicBool::new(false));
        let capture = {
            let stop = stop.clone();
            let sender = dispatch.sender();
            let settings = settings.clone();
            thread::Builder::new()
                .name("pose-capture".into())
                .spawn(move || capture_loop(source, processor, settings, sender, &stop))?
        };

        Ok(SessionHandle {
            stop,
            settings,
            capture: Some(capture),
            dispatch: Some(dispatch),
            mouse: Some(mouse),
            mouse_stop,
        })
    }
}

fn capture_loop(
    mut source: Box<dyn PoseSource>,
    mut processor: FrameProcessor,
    settings: SharedSettings,
    sender: Sender<DispatchCommand>,
    stop: &AtomicBool,
) -> crate::Result<CaptureStats> {
    let mut stats = CaptureStats::default();

    while !stop.load(Ordering::SeqCst) {
        let frame = match source.next_frame()? {
            Some(frame) => frame,
            None => {
                debug!("Pose source exhausted");
                break;
            }
        };
        stats.frames_read += 1;

        let disabled = settings.disabled_gestures();
        match processor.process(&frame, &disabled) {
            Ok(FrameOutcome::Skipped) => stats.frames_skipped += 1,
            Ok(FrameOutcome::Evaluated { events }) => {
                stats.frames_evaluated += 1;
                for event in events {
                    stats.gestures_fired += 1;
                    info!(gesture = %event.gesture, kind = %event.kind, "Gesture");
                    sender
                        .send(DispatchCommand::Gesture(event))
                        .map_err(|_| crate::Error::Dispatch("dispatch worker has exited".into()))?;
                }
            }
            Err(e) => {
                stats.frames_dropped += 1;
                warn!(timestamp = %frame.timestamp, error = %e, "Dropping frame");
            }
        }
    }

    Ok(stats)
}

/// Running session
pub struct SessionHandle {
    stop: Arc<AtomicBool>,
    settings: SharedSettings,
    capture: Option<JoinHandle<crate::Result<CaptureStats>>>,
    dispatch: Option<DispatchHandle>,
    mouse: Option<JoinHandle<()>>,
    mouse_stop: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(self.stop.clone())
    }

    /// Settings handle; changes apply to the running session
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// True once the capture loop has ended
    pub fn is_finished(&self) -> bool {
        self.capture.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop after the current frame and tear everything down
    pub fn stop(self) -> crate::Result<SessionReport> {
        self.stop.store(true, Ordering::SeqCst);
        self.wait()
    }

    /// Wait for the source to end (or a stop request), then tear down.
    /// Held input is always released, even when the source failed.
    pub fn wait(mut self) -> crate::Result<SessionReport> {
        let capture = match self.capture.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(crate::Error::Source("capture thread panicked".into()))),
            None => Ok(CaptureStats::default()),
        };

        self.mouse_stop.store(true, Ordering::SeqCst);
        if let Some(mouse) = self.mouse.take() {
            if mouse.join().is_err() {
                warn!("Mouse integrator panicked");
            }
        }

        let dispatch = match self.dispatch.take() {
            Some(handle) => handle.shutdown()?,
            None => return Err(crate::Error::Dispatch("dispatch worker missing".into())),
        };

        let stats = capture?;
        let report = SessionReport {
            frames_read: stats.frames_read,
            frames_evaluated: stats.frames_evaluated,
            frames_skipped: stats.frames_skipped,
            frames_dropped: stats.frames_dropped,
            gestures_fired: stats.gestures_fired,
            timer_releases: dispatch.timer_releases,
            history_summary: dispatch.history.summary(),
            history: dispatch.history.iter().cloned().collect(),
        };

        info!(
            frames = report.frames_read,
            evaluated = report.frames_evaluated,
            dropped = report.frames_dropped,
            gestures = report.gestures_fired,
            "Session finished"
        );
        Ok(report)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.mouse_stop.store(true, Ordering::SeqCst);
        if let Some(capture) = self.capture.take() {
            let _ = capture.join();
        }
        if let Some(mouse) = self.mouse.take() {
            let _ = mouse.join();
        }
        // DispatchHandle's own Drop releases held input
        self.dispatch.take();
    }
}

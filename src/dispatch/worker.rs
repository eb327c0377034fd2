//! Dispatch worker
//!
//! Single `input-dispatch` thread that owns the [`Dispatcher`]. Every mutation
//! of held input (new gestures, timer expiry, release-all, shutdown) arrives
//! through one channel, so a release-then-press sequence is never interleaved
//! with anything else. The release timer is a receive deadline, not a thread.

use super::dispatcher::Dispatcher;
use super::history::CommandHistory;
use crate::gesture::detector::GestureEvent;
use crate::time::timebase::Timestamp;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Messages accepted by the worker
#[derive(Debug, Clone)]
pub enum DispatchCommand {
    Gesture(GestureEvent),
    ReleaseAll,
    Shutdown,
}

/// Summary returned when the worker exits
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub events: u64,
    pub timer_releases: u64,
    pub history: CommandHistory,
}

/// Handle to the running worker
pub struct DispatchHandle {
    sender: Sender<DispatchCommand>,
    thread: Option<JoinHandle<DispatchReport>>,
}

impl DispatchHandle {
    pub fn spawn(dispatcher: Dispatcher) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded();
        let thread = thread::Builder::new()
            .name("input-dispatch".into())
            .spawn(move || run(dispatcher, receiver))?;
        Ok(Self {
            sender,
            thread: Some(thread),
        })
    }

    /// A sender for producers (the capture loop)
    pub fn sender(&self) -> Sender<DispatchCommand> {
        self.sender.clone()
    }

    pub fn dispatch(&self, event: GestureEvent) -> crate::Result<()> {
        self.send(DispatchCommand::Gesture(event))
    }

    pub fn release_all(&self) -> crate::Result<()> {
        self.send(DispatchCommand::ReleaseAll)
    }

    fn send(&self, command: DispatchCommand) -> crate::Result<()> {
        self.sender
            .send(command)
            .map_err(|_| crate::Error::Dispatch("dispatch worker has exited".into()))
    }

    /// Stop the worker: the pending timer is dropped, held input released and
    /// the mouse direction cleared.
    pub fn shutdown(mut self) -> crate::Result<DispatchReport> {
        let _ = self.sender.send(DispatchCommand::Shutdown);
        let thread = self
            .thread
            .take()
            .ok_or_else(|| crate::Error::Dispatch("dispatch worker already joined".into()))?;
        thread
            .join()
            .map_err(|_| crate::Error::Dispatch("dispatch worker panicked".into()))
    }
}

impl Drop for DispatchHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.sender.send(DispatchCommand::Shutdown);
            let _ = thread.join();
        }
    }
}

fn run(mut dispatcher: Dispatcher, receiver: Receiver<DispatchCommand>) -> DispatchReport {
    info!("Dispatch worker started");
    let mut events = 0u64;
    let mut timer_releases = 0u64;

    loop {
        let command = match dispatcher.pending_deadline() {
            Some(deadline) => match receiver.recv_deadline(deadline.to_instant()) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        match command {
            None => {}
            Some(DispatchCommand::Gesture(event)) => {
                events += 1;
                dispatcher.dispatch(&event, Timestamp::now());
            }
            Some(DispatchCommand::ReleaseAll) => {
                if let Err(e) = dispatcher.release_all() {
                    warn!(error = %e, "Release-all incomplete");
                }
            }
            Some(DispatchCommand::Shutdown) => break,
        }

        // A busy channel must not starve the timer
        if dispatcher.fire_due(Timestamp::now()) {
            timer_releases += 1;
        }
    }

    if let Err(e) = dispatcher.shutdown() {
        warn!(error = %e, "Release on shutdown incomplete");
    }
    debug!(events, timer_releases, "Dispatch worker stopped");

    DispatchReport {
        events,
        timer_releases,
        history: dispatcher.into_history(),
    }
}

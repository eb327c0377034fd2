//! Pose sources
//!
//! The pose estimator itself is external; frames reach the session through
//! [`PoseSource`]. [`ReplaySource`] reads recorded frames from a JSON Lines
//! file, one [`PoseFrame`] per line.

use crate::pose::landmarks::PoseFrame;
use crate::time::timebase::Timestamp;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// A stream of pose frames
pub trait PoseSource: Send {
    /// Next frame, `Ok(None)` at end of stream. An error ends the session.
    fn next_frame(&mut self) -> crate::Result<Option<PoseFrame>>;
}

/// Frames replayed from a JSON Lines recording
pub struct ReplaySource {
    reader: Box<dyn BufRead + Send>,
    line_no: usize,
    skipped_lines: usize,
    realtime: bool,
    /// (first frame timestamp, wall-clock start) for paced replay
    anchor: Option<(Timestamp, Instant)>,
}

impl ReplaySource {
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            crate::Error::Source(format!("cannot open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened replay file");
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            line_no: 0,
            skipped_lines: 0,
            realtime: false,
            anchor: None,
        }
    }

    /// Pace frames by their timestamps instead of replaying as fast as possible
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Malformed lines skipped so far
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    fn pace(&mut self, timestamp: Timestamp) {
        let (first, started) = *self.anchor.get_or_insert((timestamp, Instant::now()));
        let target = started + timestamp.duration_since(first);
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        }
    }
}

impl PoseSource for ReplaySource {
    fn next_frame(&mut self) -> crate::Result<Option<PoseFrame>> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if self.reader.read_until(b'\n', &mut line)? == 0 {
                if self.skipped_lines > 0 {
                    warn!(skipped = self.skipped_lines, "Replay finished with malformed lines");
                }
                return Ok(None);
            }
            self.line_no += 1;

            let text = match std::str::from_utf8(&line) {
                Ok(text) => text.trim(),
                Err(e) => {
                    self.skipped_lines += 1;
                    warn!(line = self.line_no, error = %e, "Skipping non-UTF-8 line");
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }

            match serde_json::from_str::<PoseFrame>(text) {
                Ok(frame) => {
                    if self.realtime {
                        self.pace(frame.timestamp);
                    }
                    return Ok(Some(frame));
                }
                Err(e) => {
                    self.skipped_lines += 1;
                    warn!(line = self.line_no, error = %e, "Skipping malformed frame");
                }
            }
        }
    }
}

/// Frames held in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<PoseFrame>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = PoseFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl PoseSource for MemorySource {
    fn next_frame(&mut self) -> crate::Result<Option<PoseFrame>> {
        Ok(self.frames.pop_front())
    }
}

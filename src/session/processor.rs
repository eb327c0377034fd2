//! Frame processing
//!
//! One frame in, zero or more gesture events out. Frames without a usable pose
//! are skipped without touching detector state; malformed frames are returned
//! as a [`FrameError`] for the caller to log and drop.

use crate::gesture::detector::{GestureDetector, GestureEvent};
use crate::pose::features::FeatureExtractor;
use crate::pose::landmarks::PoseFrame;
use crate::time::timebase::Timestamp;
use crate::FrameError;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// No body in the frame (nothing solved in world space)
    Skipped,
    Evaluated { events: Vec<GestureEvent> },
}

pub struct FrameProcessor {
    extractor: FeatureExtractor,
    detector: GestureDetector,
    last_timestamp: Option<Timestamp>,
}

impl FrameProcessor {
    pub fn new(extractor: FeatureExtractor, detector: GestureDetector) -> Self {
        Self {
            extractor,
            detector,
            last_timestamp: None,
        }
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut GestureDetector {
        &mut self.detector
    }

    pub fn process(
        &mut self,
        frame: &PoseFrame,
        disabled: &HashSet<String>,
    ) -> Result<FrameOutcome, FrameError> {
        if !frame.has_pose() {
            return Ok(FrameOutcome::Skipped);
        }

        if let Some(previous) = self.last_timestamp {
            if frame.timestamp < previous {
                return Err(FrameError::TimestampRegression {
                    previous,
                    current: frame.timestamp,
                });
            }
        }

        let state = self.extractor.extract(frame)?;
        self.last_timestamp = Some(frame.timestamp);
        let events = self.detector.evaluate(&state, disabled);
        Ok(FrameOutcome::Evaluated { events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::library::GestureLibrary;
    use crate::pose::landmarks::{Landmark, LandmarkName};

    fn processor() -> FrameProcessor {
        FrameProcessor::new(
            FeatureExtractor::default(),
            GestureDetector::new(GestureLibrary::default()),
        )
    }

    fn frame(ms: u64) -> PoseFrame {
        PoseFrame::empty(Timestamp::from_millis(ms))
            .with_landmark(LandmarkName::Nose, Landmark::new([0.5, 0.2], [0.0, 0.0, 0.0], 0.9))
    }

    #[test]
    fn test_frame_without_pose_is_skipped() {
        let mut p = processor();
        let outcome = p.process(&PoseFrame::empty(Timestamp::from_millis(0)), &HashSet::new());
        assert_eq!(outcome, Ok(FrameOutcome::Skipped));
    }

    #[test]
    fn test_timestamp_regression_rejected() {
        let mut p = processor();
        assert!(p.process(&frame(100), &HashSet::new()).is_ok());
        let err = p.process(&frame(50), &HashSet::new()).unwrap_err();
        assert!(matches!(err, FrameError::TimestampRegression { .. }));
        // The next in-order frame is still accepted
        assert!(p.process(&frame(120), &HashSet::new()).is_ok());
    }

    #[test]
    fn test_non_finite_frame_rejected() {
        let mut p = processor();
        let bad = PoseFrame::empty(Timestamp::from_millis(0)).with_landmark(
            LandmarkName::Nose,
            Landmark::new([f64::INFINITY, 0.2], [0.0, 0.0, 0.0], 0.9),
        );
        assert!(matches!(
            p.process(&bad, &HashSet::new()),
            Err(FrameError::NonFiniteFeature { .. })
        ));
    }
}

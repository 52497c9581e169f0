//! Cutting a recorded demonstration into sub-task segments.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DatagenError;
use crate::subtask::SubtaskSequence;
use crate::Result;

/// Half-open step range `[start, end)` of one sub-task in a demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskSegment {
    /// First step of the segment.
    pub start: usize,
    /// One past the last step.
    pub end: usize,
}

impl SubtaskSegment {
    /// Number of steps in the segment.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the segment has no steps.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// First step at which a trace goes from low to high.
///
/// A trace that starts high has no rising edge at step 0.
#[must_use]
pub fn first_rise(trace: &[bool]) -> Option<usize> {
    trace.windows(2).position(|w| !w[0] && w[1]).map(|i| i + 1)
}

/// Compute sub-task segments of a demonstration of `len` steps.
///
/// Each non-terminal sub-task ends at the first rising edge of its signal
/// plus an offset drawn uniformly from its `term_offset_range`. The end is
/// clamped so that every later sub-task keeps at least one step. The next
/// sub-task starts where the previous one ends and the terminal sub-task
/// runs to `len`.
///
/// # Errors
///
/// - [`DatagenError::MissingTrace`] if a signal has no trace
/// - [`DatagenError::TraceLengthMismatch`] if a trace is not `len` long
/// - [`DatagenError::SignalNeverRaised`] if a trace never rises
/// - [`DatagenError::OutOfOrder`] if a segment would be empty
pub fn segment_boundaries<R: Rng + ?Sized>(
    traces: &HashMap<String, Vec<bool>>,
    len: usize,
    sequence: &SubtaskSequence,
    rng: &mut R,
) -> Result<Vec<SubtaskSegment>> {
    sequence.validate()?;

    let mut segments = Vec::with_capacity(sequence.len());
    let mut start = 0;
    for (index, subtask) in sequence.subtasks.iter().enumerate() {
        let end = match &subtask.term_signal {
            None => len,
            Some(signal) => {
                let trace = traces
                    .get(signal)
                    .ok_or_else(|| DatagenError::MissingTrace(signal.clone()))?;
                if trace.len() != len {
                    return Err(DatagenError::TraceLengthMismatch {
                        name: signal.clone(),
                        expected: len,
                        actual: trace.len(),
                    });
                }
                let rise = first_rise(trace)
                    .ok_or_else(|| DatagenError::SignalNeverRaised(signal.clone()))?;
                let (lo, hi) = subtask.term_offset_range;
                let offset = rng.gen_range(lo..=hi) as usize;
                let remaining = sequence.len() - index - 1;
                (rise + offset).min(len.saturating_sub(remaining))
            }
        };
        if end <= start {
            return Err(DatagenError::OutOfOrder { index, start, end });
        }
        segments.push(SubtaskSegment { start, end });
        start = end;
    }

    debug!(
        steps = len,
        segments = segments.len(),
        "Demonstration segmented"
    );
    Ok(segments)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn trace(len: usize, rise: usize) -> Vec<bool> {
        (0..len).map(|t| t >= rise).collect()
    }

    fn traces(len: usize, reach: usize, grasp: usize, lift: usize) -> HashMap<String, Vec<bool>> {
        HashMap::from([
            ("reach".to_owned(), trace(len, reach)),
            ("grasp".to_owned(), trace(len, grasp)),
            ("lift".to_owned(), trace(len, lift)),
        ])
    }

    #[test]
    fn test_first_rise() {
        assert_eq!(first_rise(&[false, false, true, true]), Some(2));
        assert_eq!(first_rise(&[true, true]), None);
        assert_eq!(first_rise(&[true, false, true]), Some(2));
        assert_eq!(first_rise(&[]), None);
    }

    #[test]
    fn test_segments_cover_trajectory() {
        let seq = SubtaskSequence::pick_place();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let segs = segment_boundaries(&traces(200, 40, 70, 110), 200, &seq, &mut rng).unwrap();

        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].start, 0);
        assert_eq!(segs[3].end, 200);
        for pair in segs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        // Offsets are within (3, 8)
        assert!((43..=48).contains(&segs[0].end));
        assert!((73..=78).contains(&segs[1].end));
        assert!((113..=118).contains(&segs[2].end));
    }

    #[test]
    fn test_zero_offsets_are_exact() {
        let mut seq = SubtaskSequence::pick_place();
        for s in seq.subtasks.iter_mut().take(3) {
            s.term_offset_range = (0, 0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let segs = segment_boundaries(&traces(100, 10, 20, 30), 100, &seq, &mut rng).unwrap();
        let ends: Vec<_> = segs.iter().map(|s| s.end).collect();
        assert_eq!(ends, [10, 20, 30, 100]);
        assert_eq!(segs[3].len(), 70);
    }

    #[test]
    fn test_late_rise_keeps_terminal_step() {
        let seq = SubtaskSequence::pick_place();
        let t = traces(100, 20, 40, 97);
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let segs = segment_boundaries(&t, 100, &seq, &mut rng).unwrap();
            assert_eq!(segs[2].end, 99);
            assert_eq!(segs[3], SubtaskSegment { start: 99, end: 100 });
        }
    }

    #[test]
    fn test_same_seed_same_segments() {
        let seq = SubtaskSequence::pick_place();
        let t = traces(150, 30, 60, 90);
        let a = segment_boundaries(&t, 150, &seq, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let b = segment_boundaries(&t, 150, &seq, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_and_flat_signals() {
        let seq = SubtaskSequence::pick_place();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut t = traces(50, 10, 20, 30);
        t.remove("grasp");
        assert_eq!(
            segment_boundaries(&t, 50, &seq, &mut rng).unwrap_err(),
            DatagenError::MissingTrace("grasp".into())
        );

        let mut t = traces(50, 10, 20, 30);
        t.insert("lift".into(), vec![false; 50]);
        assert_eq!(
            segment_boundaries(&t, 50, &seq, &mut rng).unwrap_err(),
            DatagenError::SignalNeverRaised("lift".into())
        );

        let t = traces(40, 10, 20, 30);
        assert!(matches!(
            segment_boundaries(&t, 50, &seq, &mut rng).unwrap_err(),
            DatagenError::TraceLengthMismatch { .. }
        ));
    }

    #[test]
    fn test_overlapping_signals_out_of_order() {
        let mut seq = SubtaskSequence::pick_place();
        for s in seq.subtasks.iter_mut().take(3) {
            s.term_offset_range = (0, 0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // Grasp rises before reach ends
        let err = segment_boundaries(&traces(100, 30, 20, 60), 100, &seq, &mut rng).unwrap_err();
        assert_eq!(
            err,
            DatagenError::OutOfOrder {
                index: 1,
                start: 30,
                end: 20
            }
        );
    }
}

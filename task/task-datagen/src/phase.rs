//! Linear phase state machine driven by termination signals.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::subtask::SubtaskSequence;

/// Phases of the pick-and-place episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Move the end-effector to the object.
    Reach,
    /// Close the gripper on the object.
    Grasp,
    /// Raise the object off the table.
    Lift,
    /// Carry the object to the basket and release it.
    Place,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Self; 4] = [Self::Reach, Self::Grasp, Self::Lift, Self::Place];

    /// Phase at a sequence position.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Reach),
            1 => Some(Self::Grasp),
            2 => Some(Self::Lift),
            3 => Some(Self::Place),
            _ => None,
        }
    }

    /// Sequence position.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Signal that ends this phase; `None` for the terminal phase.
    #[must_use]
    pub const fn signal(self) -> Option<&'static str> {
        match self {
            Self::Reach => Some("reach"),
            Self::Grasp => Some("grasp"),
            Self::Lift => Some("lift"),
            Self::Place => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reach => write!(f, "reach"),
            Self::Grasp => write!(f, "grasp"),
            Self::Lift => write!(f, "lift"),
            Self::Place => write!(f, "place"),
        }
    }
}

/// Read access to the boolean signals sampled from the environment on one step.
pub trait SignalSource {
    /// Current value of a named signal. Unknown signals read as low.
    fn signal(&self, name: &str) -> bool;
}

impl<S: std::hash::BuildHasher> SignalSource for HashMap<String, bool, S> {
    fn signal(&self, name: &str) -> bool {
        self.get(name).copied().unwrap_or(false)
    }
}

impl SignalSource for BTreeMap<String, bool> {
    fn signal(&self, name: &str) -> bool {
        self.get(name).copied().unwrap_or(false)
    }
}

impl SignalSource for [(&str, bool)] {
    fn signal(&self, name: &str) -> bool {
        self.iter().any(|(n, v)| *n == name && *v)
    }
}

impl<const N: usize> SignalSource for [(&str, bool); N] {
    fn signal(&self, name: &str) -> bool {
        self.as_slice().signal(name)
    }
}

/// Tracks the active sub-task of one episode.
///
/// Starts at the first sub-task. On each [`observe`](Self::observe) it
/// advances past every consecutive sub-task whose signal is high, so several
/// phases can complete on one step. It never moves backward and never leaves
/// the terminal sub-task until [`reset`](Self::reset).
///
/// # Example
///
/// ```
/// use task_datagen::{Phase, PhaseTracker, SubtaskSequence};
///
/// let mut tracker = PhaseTracker::new(SubtaskSequence::pick_place());
/// assert_eq!(tracker.phase(), Some(Phase::Reach));
///
/// tracker.observe(&[("reach", true)]);
/// assert_eq!(tracker.phase(), Some(Phase::Grasp));
///
/// // Signals dropping back low never rewind the tracker
/// tracker.observe(&[("reach", false)]);
/// assert_eq!(tracker.phase(), Some(Phase::Grasp));
/// ```
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    sequence: SubtaskSequence,
    current: usize,
    steps: u64,
}

impl PhaseTracker {
    /// Create a tracker at the first sub-task.
    #[must_use]
    pub fn new(sequence: SubtaskSequence) -> Self {
        Self {
            sequence,
            current: 0,
            steps: 0,
        }
    }

    /// Feed one step of signals. Returns the number of phases completed.
    pub fn observe<S: SignalSource + ?Sized>(&mut self, signals: &S) -> usize {
        let start = self.current;
        while let Some(signal) = self
            .sequence
            .subtasks
            .get(self.current)
            .and_then(|s| s.term_signal.as_deref())
        {
            if !signals.signal(signal) {
                break;
            }
            self.current += 1;
            debug!(
                step = self.steps,
                completed = signal,
                next = self.current,
                "Sub-task completed"
            );
        }
        self.steps += 1;
        self.current - start
    }

    /// Index of the active sub-task.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.current
    }

    /// Active phase, when the sequence has the pick-and-place shape.
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        Phase::from_index(self.current)
    }

    /// Description of the active sub-task.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.sequence
            .subtasks
            .get(self.current)
            .map(|s| s.description.as_str())
    }

    /// Whether the terminal sub-task is active.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.current + 1 >= self.sequence.len()
    }

    /// Number of steps observed since the last reset.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Return to the first sub-task for a new episode.
    pub fn reset(&mut self) {
        self.current = 0;
        self.steps = 0;
    }

    /// The sequence being tracked.
    #[must_use]
    pub const fn sequence(&self) -> &SubtaskSequence {
        &self.sequence
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn tracker() -> PhaseTracker {
        PhaseTracker::new(SubtaskSequence::pick_place())
    }

    #[test]
    fn test_phase_table() {
        assert_eq!(Phase::from_index(2), Some(Phase::Lift));
        assert_eq!(Phase::from_index(4), None);
        assert_eq!(Phase::Place.signal(), None);
        for (i, p) in Phase::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        // Phase signals agree with the configured sequence
        let seq = SubtaskSequence::pick_place();
        let configured: Vec<_> = seq.subtasks.iter().map(|s| s.term_signal.as_deref()).collect();
        let phases: Vec<_> = Phase::ALL.iter().map(|p| p.signal()).collect();
        assert_eq!(configured, phases);
    }

    #[test]
    fn test_linear_progression() {
        let mut t = tracker();
        assert_eq!(t.observe(&[("grasp", true)]), 0);
        assert_eq!(t.phase(), Some(Phase::Reach));

        assert_eq!(t.observe(&[("reach", true)]), 1);
        assert_eq!(t.observe(&[("grasp", true)]), 1);
        assert_eq!(t.phase(), Some(Phase::Lift));
        assert_eq!(t.description(), Some("Lift ketchup"));

        assert_eq!(t.observe(&[("lift", true)]), 1);
        assert_eq!(t.phase(), Some(Phase::Place));
        assert!(t.is_terminal());
        assert_eq!(t.steps(), 4);
    }

    #[test]
    fn test_cascade_on_one_step() {
        let mut t = tracker();
        let all = [("reach", true), ("grasp", true), ("lift", true)];
        assert_eq!(t.observe(&all), 3);
        assert_eq!(t.phase(), Some(Phase::Place));
    }

    #[test]
    fn test_place_is_never_exited() {
        let mut t = tracker();
        t.observe(&[("reach", true), ("grasp", true), ("lift", true)]);
        for _ in 0..10 {
            assert_eq!(t.observe(&[("reach", true), ("lift", false)]), 0);
            assert_eq!(t.phase(), Some(Phase::Place));
        }
        t.reset();
        assert_eq!(t.phase(), Some(Phase::Reach));
        assert_eq!(t.steps(), 0);
    }

    #[test]
    fn test_map_sources() {
        let mut t = tracker();
        let mut signals: HashMap<String, bool> = HashMap::new();
        signals.insert("reach".into(), true);
        t.observe(&signals);
        assert_eq!(t.phase(), Some(Phase::Grasp));

        let mut signals = BTreeMap::new();
        signals.insert("grasp".to_owned(), true);
        t.observe(&signals);
        assert_eq!(t.phase(), Some(Phase::Lift));
    }

    #[test]
    fn test_phase_index_non_decreasing() {
        let mut t = tracker();
        let pattern = [
            ("reach", false),
            ("reach", true),
            ("grasp", false),
            ("reach", false),
            ("grasp", true),
            ("lift", false),
            ("lift", true),
            ("reach", true),
        ];
        let mut last = t.index();
        for (name, value) in pattern {
            t.observe(&[(name, value)]);
            assert!(t.index() >= last);
            last = t.index();
        }
        assert_eq!(t.phase(), Some(Phase::Place));
    }
}

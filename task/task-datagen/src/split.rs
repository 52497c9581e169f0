//! Train/validation masks for generated demonstrations.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DatagenError;
use crate::Result;

/// Which split a demonstration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoMask {
    /// Used for training (mask value 1).
    Train,
    /// Held out for validation (mask value 0).
    Valid,
}

impl DemoMask {
    /// Integer flag stored alongside each demo.
    #[must_use]
    pub const fn flag(self) -> i8 {
        match self {
            Self::Train => 1,
            Self::Valid => 0,
        }
    }
}

/// Train/valid assignment of a demonstration set.
///
/// # Example
///
/// ```
/// use task_datagen::{DemoMask, DemoSplit};
///
/// let names: Vec<String> = (0..10).map(|i| format!("demo_{i}")).collect();
/// let split = DemoSplit::assign(&names, 0.8).unwrap();
///
/// assert_eq!(split.train().count(), 8);
/// assert_eq!(split.mask("demo_9"), Some(DemoMask::Valid));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoSplit {
    entries: Vec<(String, DemoMask)>,
}

impl DemoSplit {
    /// Assign the first `floor(n * train_ratio)` demos, in the given order, to training.
    pub fn assign(demo_names: &[String], train_ratio: f64) -> Result<Self> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(DatagenError::InvalidSplitRatio(train_ratio));
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let train_count = (demo_names.len() as f64 * train_ratio).floor() as usize;

        let entries = demo_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mask = if i < train_count {
                    DemoMask::Train
                } else {
                    DemoMask::Valid
                };
                (name.clone(), mask)
            })
            .collect();

        info!(
            total = demo_names.len(),
            train = train_count,
            valid = demo_names.len() - train_count,
            "Demo split assigned"
        );
        Ok(Self { entries })
    }

    /// Like [`assign`](Self::assign), after a seeded shuffle of the demo order.
    pub fn assign_shuffled(demo_names: &[String], train_ratio: f64, seed: u64) -> Result<Self> {
        let mut names = demo_names.to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        names.shuffle(&mut rng);
        Self::assign(&names, train_ratio)
    }

    /// Mask of a demo by name.
    #[must_use]
    pub fn mask(&self, name: &str) -> Option<DemoMask> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| *m)
    }

    /// Names of training demos, in order.
    pub fn train(&self) -> impl Iterator<Item = &str> {
        self.with_mask(DemoMask::Train)
    }

    /// Names of validation demos, in order.
    pub fn valid(&self) -> impl Iterator<Item = &str> {
        self.with_mask(DemoMask::Valid)
    }

    fn with_mask(&self, mask: DemoMask) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, m)| *m == mask)
            .map(|(n, _)| n.as_str())
    }

    /// Every `(name, mask)` pair in order.
    #[must_use]
    pub fn entries(&self) -> &[(String, DemoMask)] {
        &self.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("demo_{i}")).collect()
    }

    #[test]
    fn test_floor_semantics() {
        let split = DemoSplit::assign(&names(7), 0.8).unwrap();
        // floor(7 * 0.8) = 5
        assert_eq!(split.train().count(), 5);
        assert_eq!(split.valid().collect::<Vec<_>>(), ["demo_5", "demo_6"]);
    }

    #[test]
    fn test_order_preserved() {
        let split = DemoSplit::assign(&names(4), 0.5).unwrap();
        let flags: Vec<_> = split.entries().iter().map(|(_, m)| m.flag()).collect();
        assert_eq!(flags, [1, 1, 0, 0]);
    }

    #[test]
    fn test_ratio_bounds() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                DemoSplit::assign(&names(5), bad),
                Err(DatagenError::InvalidSplitRatio(_))
            ));
        }
    }

    #[test]
    fn test_empty_set() {
        let split = DemoSplit::assign(&[], 0.8).unwrap();
        assert!(split.entries().is_empty());
    }

    #[test]
    fn test_shuffled_is_reproducible() {
        let a = DemoSplit::assign_shuffled(&names(20), 0.8, 42).unwrap();
        let b = DemoSplit::assign_shuffled(&names(20), 0.8, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.train().count(), 16);
        assert!(a.mask("demo_0").is_some());
    }
}

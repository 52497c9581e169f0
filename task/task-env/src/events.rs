//! Reset events: object pose randomization.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use task_types::Pose;

use crate::error::EnvError;
use crate::Result;

/// Default number of draws per pose before the separation check is waived.
pub const DEFAULT_MAX_TRIES: usize = 5000;

/// Closed sampling intervals for a pose: position in meters, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRange {
    /// World x range.
    pub x: (f64, f64),
    /// World y range.
    pub y: (f64, f64),
    /// World z range.
    pub z: (f64, f64),
    /// Roll range.
    pub roll: (f64, f64),
    /// Pitch range.
    pub pitch: (f64, f64),
    /// Yaw range.
    pub yaw: (f64, f64),
}

impl PoseRange {
    /// A range that always yields the same pose.
    #[must_use]
    pub const fn fixed(position: [f64; 3], roll: f64, pitch: f64, yaw: f64) -> Self {
        let [x, y, z] = position;
        Self {
            x: (x, x),
            y: (y, y),
            z: (z, z),
            roll: (roll, roll),
            pitch: (pitch, pitch),
            yaw: (yaw, yaw),
        }
    }

    /// Set the x and y ranges.
    #[must_use]
    pub const fn with_xy(mut self, x: (f64, f64), y: (f64, f64)) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the yaw range.
    #[must_use]
    pub const fn with_yaw(mut self, yaw: (f64, f64)) -> Self {
        self.yaw = yaw;
        self
    }

    fn axes(&self) -> [(&'static str, (f64, f64)); 6] {
        [
            ("x", self.x),
            ("y", self.y),
            ("z", self.z),
            ("roll", self.roll),
            ("pitch", self.pitch),
            ("yaw", self.yaw),
        ]
    }

    /// Check every interval is finite and not inverted.
    pub fn validate(&self) -> Result<()> {
        for (name, (lo, hi)) in self.axes() {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(EnvError::invalid_range(name, lo, hi));
            }
        }
        Ok(())
    }

    /// Whether a position and yaw lie inside the range.
    #[must_use]
    pub fn contains(&self, pose: &Pose) -> bool {
        let within = |(lo, hi): (f64, f64), v: f64| v >= lo - 1e-9 && v <= hi + 1e-9;
        within(self.x, pose.position.x)
            && within(self.y, pose.position.y)
            && within(self.z, pose.position.z)
            && within(self.yaw, pose.yaw())
    }

    /// Pose at the midpoint of every interval.
    #[must_use]
    pub fn center(&self) -> Pose {
        let mid = |(lo, hi): (f64, f64)| 0.5 * (lo + hi);
        Pose::from_xyz_rpy(
            [mid(self.x), mid(self.y), mid(self.z)],
            mid(self.roll),
            mid(self.pitch),
            mid(self.yaw),
        )
    }

    /// Draw one pose uniformly. Orientation is built from roll, pitch and yaw.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Pose {
        let x = uniform(rng, self.x);
        let y = uniform(rng, self.y);
        let z = uniform(rng, self.z);
        let roll = uniform(rng, self.roll);
        let pitch = uniform(rng, self.pitch);
        let yaw = uniform(rng, self.yaw);
        Pose::from_xyz_rpy([x, y, z], roll, pitch, yaw)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if lo < hi {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

/// Sample `count` poses, keeping positions at least `min_separation` apart.
///
/// Each pose gets up to `max_tries` draws. A draw is accepted when it is the
/// first pose, when it is the last permitted draw, or when it is far enough
/// from every pose accepted so far. The result always has `count` poses.
pub fn sample_object_poses<R: Rng + ?Sized>(
    count: usize,
    min_separation: f64,
    range: &PoseRange,
    rng: &mut R,
    max_tries: usize,
) -> Vec<Pose> {
    let max_tries = max_tries.max(1);
    let mut accepted: Vec<Pose> = Vec::with_capacity(count);
    for _ in 0..count {
        for attempt in 0..max_tries {
            let candidate = range.sample(rng);
            let last = attempt + 1 == max_tries;
            if accepted.is_empty()
                || last
                || accepted
                    .iter()
                    .all(|p| p.distance_to(&candidate) >= min_separation)
            {
                if last && !accepted.is_empty() {
                    trace!(min_separation, "Separation waived after max tries");
                }
                accepted.push(candidate);
                break;
            }
        }
    }
    accepted
}

/// Randomize the reset pose of a group of assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomizeEvent {
    /// Event name.
    pub name: String,
    /// Assets placed by this event, sampled together.
    pub assets: Vec<String>,
    /// Sampling range.
    pub pose_range: PoseRange,
    /// Minimum distance between assets of this event.
    #[serde(default)]
    pub min_separation: f64,
}

impl RandomizeEvent {
    /// Randomize a single asset.
    #[must_use]
    pub fn single(asset: &str, pose_range: PoseRange) -> Self {
        Self {
            name: format!("randomize_{asset}"),
            assets: vec![asset.to_owned()],
            pose_range,
            min_separation: 0.0,
        }
    }

    /// Check the range and separation.
    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            return Err(EnvError::invalid_config(format!(
                "{}: no assets to randomize",
                self.name
            )));
        }
        if !(self.min_separation.is_finite() && self.min_separation >= 0.0) {
            return Err(EnvError::invalid_config(format!(
                "{}: min_separation must be non-negative",
                self.name
            )));
        }
        self.pose_range.validate()
    }
}

/// Reset-time events.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use task_env::{sample_object_poses, EventConfig};
///
/// let events = EventConfig::rl();
/// let ketchup = events.event("randomize_ketchup").unwrap();
///
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
/// let poses = sample_object_poses(1, 0.0, &ketchup.pose_range, &mut rng, 5000);
/// assert!(ketchup.pose_range.contains(&poses[0]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    /// Restore every entity's initial pose before randomizing.
    pub reset_to_default: bool,
    /// Randomizers, applied in order.
    pub randomize: Vec<RandomizeEvent>,
    /// Draws per pose before the separation check is waived.
    #[serde(default = "default_max_tries")]
    pub max_tries: usize,
}

const fn default_max_tries() -> usize {
    DEFAULT_MAX_TRIES
}

const LYING_ROLL: f64 = 1.5708;

impl Default for EventConfig {
    fn default() -> Self {
        Self::rl()
    }
}

impl EventConfig {
    /// Reset ranges used for reinforcement learning.
    #[must_use]
    pub fn rl() -> Self {
        Self {
            reset_to_default: true,
            randomize: vec![
                RandomizeEvent::single(
                    "ketchup",
                    PoseRange::fixed([0.0, 0.0, 0.50771], LYING_ROLL, 0.0, 0.0)
                        .with_xy((1.25, 1.50), (1.40, 1.65))
                        .with_yaw((-0.3, 0.3)),
                ),
                RandomizeEvent::single(
                    "orange_juice",
                    PoseRange::fixed([0.0, 0.0, 0.52], LYING_ROLL, 0.0, 0.0)
                        .with_xy((1.10, 1.60), (1.20, 1.80))
                        .with_yaw((-0.5, 0.5)),
                ),
                RandomizeEvent::single(
                    "cream_cheese",
                    PoseRange::fixed([0.0, 0.0, 0.45974], LYING_ROLL, 0.0, 0.0)
                        .with_xy((1.10, 1.60), (1.20, 1.80))
                        .with_yaw((-0.5, 0.5)),
                ),
                RandomizeEvent::single("basket", PoseRange::fixed([1.76, 1.48, 0.48], 0.0, 0.0, 0.0)),
            ],
            max_tries: DEFAULT_MAX_TRIES,
        }
    }

    /// Narrow ranges used when generating demonstrations.
    #[must_use]
    pub fn mimic() -> Self {
        let mut events = Self::rl();
        for event in &mut events.randomize {
            match event.name.as_str() {
                "randomize_ketchup" => {
                    event.pose_range = event
                        .pose_range
                        .with_xy((1.315, 1.345), (1.475, 1.515))
                        .with_yaw((-0.15, 0.15));
                }
                "randomize_basket" => {
                    event.pose_range = event
                        .pose_range
                        .with_xy((1.73, 1.79), (1.45, 1.51))
                        .with_yaw((-0.5, 0.5));
                }
                _ => {}
            }
        }
        events
    }

    /// Look up a randomizer by name.
    #[must_use]
    pub fn event(&self, name: &str) -> Option<&RandomizeEvent> {
        self.randomize.iter().find(|e| e.name == name)
    }

    /// Names of every randomized asset.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.randomize
            .iter()
            .flat_map(|e| e.assets.iter().map(String::as_str))
    }

    /// Validate every randomizer.
    pub fn validate(&self) -> Result<()> {
        if self.max_tries == 0 {
            return Err(EnvError::invalid_config("max_tries must be at least 1"));
        }
        for event in &self.randomize {
            event.validate()?;
        }
        Ok(())
    }
}

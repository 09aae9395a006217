//! Ground-truth click model and the candidate spaces built on top of it.
//!
//! A [`ClickModel`] holds the hidden per-arm click probabilities. It is validated once at
//! construction and immutable afterwards; policies never see it, only the sampler and the
//! score oracle do.
//!
//! A [`JointSpace`] is the cartesian product of `players` copies of the arm space. Joint
//! actions are identified by a flat mixed-radix index (player 0 is the most significant
//! digit), so the product never has to be materialized: [`JointSpace::decode`] turns an
//! index back into its tuple on demand and [`JointSpace::iter`] enumerates lazily.
//! With `players == 1` the joint space is the arm space itself (`decode(i) == [i]`).

use crate::Error;

/// Validated per-arm click probabilities.
///
/// With the `serde` feature the model (de)serializes as a plain probability list, and
/// deserialization runs the same validation as [`ClickModel::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct ClickModel {
    probs: Vec<f64>,
}

impl ClickModel {
    /// Build a model, rejecting any probability outside `[0, 1]` (or NaN).
    pub fn new(probs: Vec<f64>) -> Result<Self, Error> {
        if let Some((arm, &p)) = probs
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.is_finite() && (0.0..=1.0).contains(*p)))
        {
            return Err(Error::InvalidModel { arm, p });
        }
        Ok(Self { probs })
    }

    /// Number of arms.
    pub fn num_arms(&self) -> usize {
        self.probs.len()
    }

    /// Click probability of one arm (`0.0` for an unknown arm).
    pub fn p(&self, arm: usize) -> f64 {
        self.probs.get(arm).copied().unwrap_or(0.0)
    }

    /// All probabilities, indexed by arm.
    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    /// Probability that a joint tuple yields a click: `1 - prod(1 - p_arm)`.
    pub fn joint_p(&self, tuple: &[usize]) -> f64 {
        1.0 - tuple.iter().map(|&a| 1.0 - self.p(a)).product::<f64>()
    }
}

impl TryFrom<Vec<f64>> for ClickModel {
    type Error = Error;

    fn try_from(probs: Vec<f64>) -> Result<Self, Error> {
        Self::new(probs)
    }
}

impl From<ClickModel> for Vec<f64> {
    fn from(model: ClickModel) -> Self {
        model.probs
    }
}

/// Cartesian product of `players` per-player arm spaces of size `arms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointSpace {
    arms: usize,
    players: usize,
    size: usize,
}

impl JointSpace {
    /// Create the space; fails when it is empty or `arms^players` overflows `usize`.
    pub fn new(arms: usize, players: usize) -> Result<Self, Error> {
        if arms == 0 || players == 0 {
            return Err(Error::config(format!(
                "joint space needs at least one arm and one player (arms={arms}, players={players})"
            )));
        }
        let size = u32::try_from(players)
            .ok()
            .and_then(|p| arms.checked_pow(p))
            .ok_or_else(|| {
                Error::config(format!("joint space {arms}^{players} does not fit in usize"))
            })?;
        Ok(Self {
            arms,
            players,
            size,
        })
    }

    /// The single-player space: joint actions are plain arms.
    pub fn arms_only(arms: usize) -> Result<Self, Error> {
        Self::new(arms, 1)
    }

    pub fn arms(&self) -> usize {
        self.arms
    }

    pub fn players(&self) -> usize {
        self.players
    }

    /// Number of joint actions (`arms^players`).
    pub fn len(&self) -> usize {
        self.size
    }

    /// Always false: construction rejects empty spaces.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Flat index -> per-player arm tuple. `None` when out of range.
    pub fn decode(&self, mut idx: usize) -> Option<Vec<usize>> {
        if idx >= self.size {
            return None;
        }
        let mut tuple = vec![0; self.players];
        for slot in tuple.iter_mut().rev() {
            *slot = idx % self.arms;
            idx /= self.arms;
        }
        Some(tuple)
    }

    /// Per-player arm tuple -> flat index. `None` on wrong width or an out-of-range arm.
    pub fn encode(&self, tuple: &[usize]) -> Option<usize> {
        if tuple.len() != self.players {
            return None;
        }
        tuple.iter().try_fold(0usize, |acc, &a| {
            (a < self.arms).then(|| acc * self.arms + a)
        })
    }

    /// Lazily enumerate `(flat index, tuple)` pairs in index order.
    pub fn iter(&self) -> JointIter {
        JointIter {
            space: *self,
            next: 0,
        }
    }
}

/// Lazy iterator over a [`JointSpace`].
#[derive(Debug, Clone)]
pub struct JointIter {
    space: JointSpace,
    next: usize,
}

impl Iterator for JointIter {
    type Item = (usize, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next;
        let tuple = self.space.decode(idx)?;
        self.next += 1;
        Some((idx, tuple))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.space.len().saturating_sub(self.next);
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for JointIter {}

//! Confidence bound tracker: per-candidate running means and Hoeffding-style intervals.
//!
//! Each candidate carries an [`Estimate`] `(count, mean)`. Bounds are derived on demand:
//!
//! ```text
//!   radius = sqrt(c * ln(max(t, 1)) / count)
//!   ucb    = mean + radius
//!   lcb    = mean - radius
//! ```
//!
//! A candidate that has never been observed has `(+inf, -inf)` bounds, so it can neither be
//! eliminated nor dominate anyone until it has been tried.
//!
//! Counts are `f64` so that shared estimates can take fractional observations: when `P`
//! players pool their feedback, each player's observation carries weight `1/P`.

/// Running estimate for one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    /// Total observation weight (number of observations for unit weights).
    pub count: f64,
    /// Weighted average of observed rewards.
    pub mean: f64,
}

impl Estimate {
    /// Fold in one observation of `reward` with weight `weight`.
    pub fn observe_weighted(&mut self, reward: f64, weight: f64) {
        if !(weight.is_finite() && weight > 0.0) {
            return;
        }
        self.count += weight;
        // Incremental form keeps the mean exact for constant reward streams.
        self.mean += weight * (reward - self.mean) / self.count;
    }
}

/// Confidence interval for one candidate at a given round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub ucb: f64,
    pub lcb: f64,
}

/// Per-candidate estimates plus the confidence constant used to derive bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tracker {
    c: f64,
    estimates: Vec<Estimate>,
}

impl Tracker {
    /// Tracker over candidates `0..n` with confidence constant `c`.
    pub fn new(n: usize, c: f64) -> Self {
        Self {
            c,
            estimates: vec![Estimate::default(); n],
        }
    }

    /// Number of tracked candidates.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn confidence_c(&self) -> f64 {
        self.c
    }

    /// Estimate for `candidate` (zeroed for an unknown id).
    pub fn estimate(&self, candidate: usize) -> Estimate {
        self.estimates.get(candidate).copied().unwrap_or_default()
    }

    pub fn mean(&self, candidate: usize) -> f64 {
        self.estimate(candidate).mean
    }

    pub fn count(&self, candidate: usize) -> f64 {
        self.estimate(candidate).count
    }

    /// Record a unit-weight reward for `candidate`. Unknown ids are ignored.
    pub fn observe(&mut self, candidate: usize, reward: f64) {
        self.observe_weighted(candidate, reward, 1.0);
    }

    /// Record a reward with an explicit observation weight. Unknown ids are ignored.
    pub fn observe_weighted(&mut self, candidate: usize, reward: f64, weight: f64) {
        if let Some(e) = self.estimates.get_mut(candidate) {
            e.observe_weighted(reward, weight);
        }
    }

    /// Confidence radius after `t` elapsed rounds; `+inf` for an unobserved candidate.
    pub fn radius(&self, candidate: usize, t: u64) -> f64 {
        let n = self.count(candidate);
        if n <= 0.0 {
            return f64::INFINITY;
        }
        let log_t = (t.max(1) as f64).ln();
        (self.c * log_t / n).sqrt()
    }

    /// `(ucb, lcb)` for `candidate` after `t` elapsed rounds.
    pub fn bounds(&self, candidate: usize, t: u64) -> Bounds {
        let e = self.estimate(candidate);
        if e.count <= 0.0 {
            return Bounds {
                ucb: f64::INFINITY,
                lcb: f64::NEG_INFINITY,
            };
        }
        let r = self.radius(candidate, t);
        Bounds {
            ucb: e.mean + r,
            lcb: e.mean - r,
        }
    }

    /// Candidate with the highest mean among `candidates`; ties go to the lowest id.
    pub fn best_by_mean(&self, candidates: &[usize]) -> Option<usize> {
        candidates.iter().copied().min_by(|&a, &b| {
            self.mean(b)
                .total_cmp(&self.mean(a))
                .then_with(|| a.cmp(&b))
        })
    }

    /// Up to `k` candidates with the highest mean, descending; ties go to the lowest id.
    pub fn top_k_by_mean(&self, candidates: &[usize], k: usize) -> Vec<usize> {
        crate::top_k_by(candidates.iter().copied(), k, |c| self.mean(c))
    }

    /// Up to `k` candidates with the highest UCB at round `t`, descending.
    ///
    /// Unobserved candidates (infinite UCB) come first, lowest id first.
    pub fn top_k_by_ucb(&self, candidates: &[usize], k: usize, t: u64) -> Vec<usize> {
        crate::top_k_by(candidates.iter().copied(), k, |c| self.bounds(c, t).ucb)
    }
}

/// Whether players pool their observations or learn separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EstimateSharing {
    /// One tracker for everyone; each player's observation carries weight `1/P`, so a round
    /// in which all players observe a candidate adds exactly one to its count.
    #[default]
    Shared,
    /// One tracker per player, unit weights.
    PerPlayer,
}

/// Estimates for `players` players under a [`EstimateSharing`] policy.
#[derive(Debug, Clone)]
pub struct PlayerEstimates {
    sharing: EstimateSharing,
    players: usize,
    trackers: Vec<Tracker>,
}

impl PlayerEstimates {
    pub fn new(n: usize, c: f64, players: usize, sharing: EstimateSharing) -> Self {
        let players = players.max(1);
        let copies = match sharing {
            EstimateSharing::Shared => 1,
            EstimateSharing::PerPlayer => players,
        };
        Self {
            sharing,
            players,
            trackers: vec![Tracker::new(n, c); copies],
        }
    }

    pub fn sharing(&self) -> EstimateSharing {
        self.sharing
    }

    pub fn players(&self) -> usize {
        self.players
    }

    /// The tracker `player` reads from.
    pub fn for_player(&self, player: usize) -> &Tracker {
        let i = match self.sharing {
            EstimateSharing::Shared => 0,
            EstimateSharing::PerPlayer => player.min(self.trackers.len() - 1),
        };
        &self.trackers[i]
    }

    /// Every distinct tracker (one when shared).
    pub fn trackers(&self) -> Vec<&Tracker> {
        self.trackers.iter().collect()
    }

    /// Record one of `player`'s observations.
    pub fn observe(&mut self, player: usize, candidate: usize, reward: f64) {
        match self.sharing {
            EstimateSharing::Shared => {
                let w = 1.0 / self.players as f64;
                self.trackers[0].observe_weighted(candidate, reward, w);
            }
            EstimateSharing::PerPlayer => {
                if let Some(tr) = self.trackers.get_mut(player) {
                    tr.observe(candidate, reward);
                }
            }
        }
    }
}

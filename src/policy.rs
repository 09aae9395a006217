//! `CascadePolicy` trait and the strategies that implement it.
//!
//! A policy decides what to display each round and learns from what the sampler reports.
//! It never sees true probabilities or regret; the driver ([`crate::Simulation`]) owns those.
//!
//! Per round the driver calls, in order:
//!
//! ```text
//! let lists = policy.select(round)?;          // one ordered list per player
//! policy.observe(player, &lists[p], &outcome); // for every player
//! policy.end_round(round);                     // cursor / phase bookkeeping
//! ```
//!
//! Round indices are 0-based; confidence bounds are evaluated at `round + 1` elapsed rounds.
//!
//! | policy                        | candidates        | elimination          | schedule          |
//! |-------------------------------|-------------------|----------------------|-------------------|
//! | [`UcbPolicy`]                 | arms              | none                 | every round       |
//! | [`SharedEliminationPolicy`]   | arms              | every round          | round-robin       |
//! | [`PhasedEliminationPolicy`]   | arms/joint tuples | at phase boundaries  | [`PhaseStrategy`] |
//! | [`LambdaSchedulePolicy`]      | arms              | none                 | power-of-two      |

use crate::{
    fixed_sqrt_phase_len, power_of_two_exploit_len, CandidateSet, EliminationRule,
    EstimateSharing, Error, Outcome, PhaseStrategy, PlayerEstimates, Tracker,
};

/// Common interface for the simulated cascade policies.
///
/// # Example
///
/// ```rust
/// use cascader::{CascadePolicy, EstimateSharing, UcbPolicy};
///
/// let mut p = UcbPolicy::new(4, 2, 1, 1.5, EstimateSharing::Shared).unwrap();
/// // Nothing observed yet: every UCB is infinite, lowest ids win.
/// assert_eq!(p.select(0).unwrap(), vec![vec![0, 1]]);
/// ```
pub trait CascadePolicy {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Ordered lists to display in `round`, one per player. Every list has the display width.
    fn select(&mut self, round: u64) -> Result<Vec<Vec<usize>>, Error>;

    /// Feed back what `player` saw for the list `shown`.
    fn observe(&mut self, player: usize, shown: &[usize], outcome: &Outcome);

    /// Bookkeeping after the round's observations are in.
    fn end_round(&mut self, round: u64);

    /// Surviving candidates, for policies that eliminate.
    fn active_candidates(&self) -> Option<&[usize]> {
        None
    }
}

fn observe_into(est: &mut PlayerEstimates, player: usize, shown: &[usize], outcome: &Outcome) {
    for (pos, reward) in outcome.observations() {
        if let Some(&c) = shown.get(pos) {
            est.observe(player, c, reward);
        }
    }
}

fn check_shape(n: usize, k: usize) -> Result<(), Error> {
    if k == 0 || k > n {
        return Err(Error::config(format!("display width k={k} must be in 1..={n}")));
    }
    Ok(())
}

// ============================================================================
// Plain UCB
// ============================================================================

/// Display the `k` arms with the highest UCB each round.
///
/// Ties (including the all-infinite start) go to the lowest arm index. With per-player
/// estimates every player ranks by its own tracker.
#[derive(Debug, Clone)]
pub struct UcbPolicy {
    arms: Vec<usize>,
    k: usize,
    est: PlayerEstimates,
}

impl UcbPolicy {
    pub fn new(
        num_arms: usize,
        k: usize,
        players: usize,
        c: f64,
        sharing: EstimateSharing,
    ) -> Result<Self, Error> {
        check_shape(num_arms, k)?;
        Ok(Self {
            arms: (0..num_arms).collect(),
            k,
            est: PlayerEstimates::new(num_arms, c, players, sharing),
        })
    }

    pub fn estimates(&self) -> &PlayerEstimates {
        &self.est
    }
}

impl CascadePolicy for UcbPolicy {
    fn name(&self) -> &'static str {
        "ucb"
    }

    fn select(&mut self, round: u64) -> Result<Vec<Vec<usize>>, Error> {
        let t = round + 1;
        Ok((0..self.est.players())
            .map(|p| self.est.for_player(p).top_k_by_ucb(&self.arms, self.k, t))
            .collect())
    }

    fn observe(&mut self, player: usize, shown: &[usize], outcome: &Outcome) {
        observe_into(&mut self.est, player, shown, outcome);
    }

    fn end_round(&mut self, _round: u64) {}
}

// ============================================================================
// Multi-player elimination with shared bounds
// ============================================================================

/// Every player is shown the same round-robin window over the surviving arms; an
/// elimination pass runs at the start of each round while the set is wider than `k`.
///
/// A candidate dominated under any player's estimates is dropped. The round that follows an
/// elimination starts again at the head of the renumbered set.
#[derive(Debug, Clone)]
pub struct SharedEliminationPolicy {
    set: CandidateSet,
    est: PlayerEstimates,
    rule: EliminationRule,
    eliminated: bool,
}

impl SharedEliminationPolicy {
    pub fn new(
        num_arms: usize,
        k: usize,
        players: usize,
        c: f64,
        sharing: EstimateSharing,
        rule: EliminationRule,
    ) -> Result<Self, Error> {
        check_shape(num_arms, k)?;
        Ok(Self {
            set: CandidateSet::new(num_arms, k)?,
            est: PlayerEstimates::new(num_arms, c, players, sharing),
            rule,
            eliminated: false,
        })
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.set
    }

    pub fn estimates(&self) -> &PlayerEstimates {
        &self.est
    }
}

impl CascadePolicy for SharedEliminationPolicy {
    fn name(&self) -> &'static str {
        "shared_elimination"
    }

    fn select(&mut self, round: u64) -> Result<Vec<Vec<usize>>, Error> {
        self.eliminated = false;
        if !self.set.exhausted() {
            let trackers = self.est.trackers();
            let e = self.set.eliminate_with(&trackers, round + 1, self.rule);
            self.eliminated = e.eliminated();
        }
        let list = self.set.select(self.set.k())?;
        Ok(vec![list; self.est.players()])
    }

    fn observe(&mut self, player: usize, shown: &[usize], outcome: &Outcome) {
        observe_into(&mut self.est, player, shown, outcome);
    }

    fn end_round(&mut self, _round: u64) {
        self.set.advance(self.eliminated);
        self.eliminated = false;
    }

    fn active_candidates(&self) -> Option<&[usize]> {
        Some(self.set.live())
    }
}

// ============================================================================
// Phase bookkeeping shared by the scheduled policies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Explore { left: u64 },
    Exploit { left: u64, picks: Vec<Vec<usize>> },
}

// ============================================================================
// Phased round-robin elimination
// ============================================================================

/// Round-robin exploration over a candidate space (arms, or flat joint-action ids) with
/// elimination at phase boundaries.
///
/// - [`PhaseStrategy::FixedSqrtHorizon`]: phases of `ceil(sqrt(T))` rounds; after each one an
///   elimination pass runs. Once the set is down to `k` the whole set is displayed.
/// - [`PhaseStrategy::PowerOfTwo`]: explore for `lambda * |set|` rounds, eliminate, then
///   display the top `k` survivors by mean until the next power-of-two round; `lambda += 1`.
#[derive(Debug, Clone)]
pub struct PhasedEliminationPolicy {
    set: CandidateSet,
    tracker: Tracker,
    rule: EliminationRule,
    strategy: PhaseStrategy,
    horizon: u64,
    lambda: u64,
    stage: Stage,
}

impl PhasedEliminationPolicy {
    /// Policy over candidates `0..num_candidates`.
    pub fn new(
        num_candidates: usize,
        k: usize,
        horizon: u64,
        c: f64,
        rule: EliminationRule,
        strategy: PhaseStrategy,
    ) -> Result<Self, Error> {
        check_shape(num_candidates, k)?;
        let set = CandidateSet::new(num_candidates, k)?;
        let first = match strategy {
            PhaseStrategy::FixedSqrtHorizon => fixed_sqrt_phase_len(horizon),
            PhaseStrategy::PowerOfTwo => set.len() as u64,
        };
        Ok(Self {
            set,
            tracker: Tracker::new(num_candidates, c),
            rule,
            strategy,
            horizon,
            lambda: 1,
            stage: Stage::Explore { left: first },
        })
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.set
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Current exploration multiplier (power-of-two schedule).
    pub fn lambda(&self) -> u64 {
        self.lambda
    }

    fn explore_len(&self) -> u64 {
        match self.strategy {
            PhaseStrategy::FixedSqrtHorizon => fixed_sqrt_phase_len(self.horizon),
            PhaseStrategy::PowerOfTwo => self.lambda * self.set.len() as u64,
        }
    }

    fn end_explore_phase(&mut self, elapsed: u64) {
        let e = self.set.eliminate(&self.tracker, elapsed, self.rule);
        tracing::trace!(
            round = elapsed,
            lambda = self.lambda,
            removed = e.removed.len(),
            survivors = self.set.len(),
            "phase boundary"
        );
        self.stage = match self.strategy {
            PhaseStrategy::FixedSqrtHorizon => Stage::Explore {
                left: self.explore_len(),
            },
            PhaseStrategy::PowerOfTwo => {
                let left = power_of_two_exploit_len(elapsed, self.horizon);
                if left == 0 {
                    self.lambda += 1;
                    Stage::Explore {
                        left: self.explore_len(),
                    }
                } else {
                    let picks = vec![self.tracker.top_k_by_mean(self.set.live(), self.set.k())];
                    Stage::Exploit { left, picks }
                }
            }
        };
    }
}

impl CascadePolicy for PhasedEliminationPolicy {
    fn name(&self) -> &'static str {
        "phased_elimination"
    }

    fn select(&mut self, _round: u64) -> Result<Vec<Vec<usize>>, Error> {
        match &self.stage {
            Stage::Exploit { picks, .. } => Ok(picks.clone()),
            Stage::Explore { .. } => Ok(vec![self.set.select(self.set.k())?]),
        }
    }

    fn observe(&mut self, _player: usize, shown: &[usize], outcome: &Outcome) {
        for (pos, reward) in outcome.observations() {
            if let Some(&c) = shown.get(pos) {
                self.tracker.observe(c, reward);
            }
        }
    }

    fn end_round(&mut self, round: u64) {
        let elapsed = round + 1;
        match &mut self.stage {
            Stage::Explore { left } => {
                self.set.advance(false);
                *left = left.saturating_sub(1);
                if *left == 0 {
                    self.end_explore_phase(elapsed);
                }
            }
            Stage::Exploit { left, .. } => {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    self.lambda += 1;
                    self.stage = Stage::Explore {
                        left: self.explore_len(),
                    };
                }
            }
        }
    }

    fn active_candidates(&self) -> Option<&[usize]> {
        Some(self.set.live())
    }
}

// ============================================================================
// Lambda-scheduled explore/exploit
// ============================================================================

/// Alternates a shared exploration window with per-player exploitation, without
/// elimination.
///
/// Exploration lasts `lambda * N` rounds; in round `t` every player is shown
/// `(j + i) mod N` for `i < k` with `j = floor(t / lambda) mod N`. Exploitation shows each
/// player its own top `k` arms by mean (ties to the lowest index) until the round index
/// reaches the next power of two. Then `lambda += 1`.
#[derive(Debug, Clone)]
pub struct LambdaSchedulePolicy {
    num_arms: usize,
    k: usize,
    horizon: u64,
    arms: Vec<usize>,
    est: PlayerEstimates,
    lambda: u64,
    stage: Stage,
}

impl LambdaSchedulePolicy {
    pub fn new(
        num_arms: usize,
        k: usize,
        players: usize,
        horizon: u64,
        c: f64,
        sharing: EstimateSharing,
    ) -> Result<Self, Error> {
        check_shape(num_arms, k)?;
        Ok(Self {
            num_arms,
            k,
            horizon,
            arms: (0..num_arms).collect(),
            est: PlayerEstimates::new(num_arms, c, players, sharing),
            lambda: 1,
            stage: Stage::Explore {
                left: num_arms as u64,
            },
        })
    }

    pub fn lambda(&self) -> u64 {
        self.lambda
    }

    pub fn estimates(&self) -> &PlayerEstimates {
        &self.est
    }

    fn explore_list(&self, round: u64) -> Vec<usize> {
        let n = self.num_arms as u64;
        let j = (round / self.lambda) % n;
        (0..self.k as u64).map(|i| ((j + i) % n) as usize).collect()
    }

    fn start_explore(&mut self) {
        self.lambda += 1;
        self.stage = Stage::Explore {
            left: self.lambda * self.num_arms as u64,
        };
    }
}

impl CascadePolicy for LambdaSchedulePolicy {
    fn name(&self) -> &'static str {
        "lambda_schedule"
    }

    fn select(&mut self, round: u64) -> Result<Vec<Vec<usize>>, Error> {
        match &self.stage {
            Stage::Explore { .. } => Ok(vec![self.explore_list(round); self.est.players()]),
            Stage::Exploit { picks, .. } => Ok(picks.clone()),
        }
    }

    fn observe(&mut self, player: usize, shown: &[usize], outcome: &Outcome) {
        observe_into(&mut self.est, player, shown, outcome);
    }

    fn end_round(&mut self, round: u64) {
        let elapsed = round + 1;
        match &mut self.stage {
            Stage::Explore { left } => {
                *left = left.saturating_sub(1);
                if *left > 0 {
                    return;
                }
                let exploit = power_of_two_exploit_len(elapsed, self.horizon);
                if exploit == 0 {
                    self.start_explore();
                    return;
                }
                let picks = (0..self.est.players())
                    .map(|p| self.est.for_player(p).top_k_by_mean(&self.arms, self.k))
                    .collect();
                tracing::trace!(round = elapsed, lambda = self.lambda, exploit, "exploiting");
                self.stage = Stage::Exploit {
                    left: exploit,
                    picks,
                };
            }
            Stage::Exploit { left, .. } => {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    self.start_explore();
                }
            }
        }
    }
}

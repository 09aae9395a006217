//! Candidate set: surviving candidates, round-robin cursor, and confidence-bound elimination.
//!
//! The set is an ordered `Vec` of live candidate ids. Removal is order-preserving compaction
//! (`retain`), and the cursor is re-derived after every structural change instead of being
//! carried across a resize: after an elimination event the cursor restarts at position 0 of
//! the renumbered set.
//!
//! ## Invariants
//!
//! - No duplicates; candidates are removed, never re-added.
//! - `len() >= k` at all times once built with [`CandidateSet::new`]: an elimination that
//!   would take the set below the display width is refused (and logged), not an error.
//! - When `len() == k` the set is in pure exploitation: [`CandidateSet::select`] returns the
//!   whole set and [`CandidateSet::eliminate`] is a no-op.
//!
//! ## Elimination rules
//!
//! Two rules are supported, as independent strategies rather than one reconciled rule:
//!
//! - [`EliminationRule::BestLcb`]: drop every survivor whose UCB is below the LCB of the
//!   empirically best survivor (highest mean, ties to the lowest id).
//! - [`EliminationRule::KDominated`]: drop a survivor when its UCB is below the LCB of at
//!   least `k` other survivors, i.e. at least `k` candidates are confidently better.
//!
//! Dominated candidates are removed weakest-first (lowest UCB, then highest id) until either
//! all are gone or one more removal would leave fewer than `k`.

use crate::{Error, Tracker};

/// Which dominance test decides that a candidate can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EliminationRule {
    /// `ucb(c) < lcb(best)` where `best` maximizes the empirical mean.
    #[default]
    BestLcb,
    /// `ucb(c) < lcb(a)` for at least `k` other survivors `a`.
    KDominated,
}

/// What an elimination pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Elimination {
    /// Candidates removed, in removal order.
    pub removed: Vec<usize>,
    /// Dominated candidates kept because removing them would break `len >= k`.
    pub refused: Vec<usize>,
}

impl Elimination {
    /// True when at least one candidate was removed.
    pub fn eliminated(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Ordered set of surviving candidates with a round-robin cursor.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    live: Vec<usize>,
    k: usize,
    cursor: usize,
    phase: u64,
}

impl CandidateSet {
    /// Set over candidates `0..n` with display width `k`.
    pub fn new(n: usize, k: usize) -> Result<Self, Error> {
        Self::from_ids((0..n).collect(), k)
    }

    /// Set over explicit ids (in the given order).
    pub fn from_ids(ids: Vec<usize>, k: usize) -> Result<Self, Error> {
        if k == 0 {
            return Err(Error::config("display width k must be at least 1"));
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(dup) = ids.iter().find(|&&c| !seen.insert(c)) {
            return Err(Error::config(format!("duplicate candidate id {dup}")));
        }
        if ids.len() < k {
            return Err(Error::config(format!(
                "display width k={k} exceeds the {} available candidates",
                ids.len()
            )));
        }
        Ok(Self {
            live: ids,
            k,
            cursor: 0,
            phase: 0,
        })
    }

    /// Surviving candidates in round-robin order.
    pub fn live(&self) -> &[usize] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, candidate: usize) -> bool {
        self.live.contains(&candidate)
    }

    /// Display width.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Current round-robin position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of elimination passes that have run.
    pub fn phase(&self) -> u64 {
        self.phase
    }

    /// True once the set has shrunk to the display width.
    pub fn exhausted(&self) -> bool {
        self.live.len() <= self.k
    }

    /// The `k` consecutive candidates starting at the cursor, wrapping around.
    ///
    /// Returns the whole set when `len() == k`.
    pub fn select(&self, k: usize) -> Result<Vec<usize>, Error> {
        if k != self.k {
            return Err(Error::config(format!(
                "selected width {k} does not match display width {}",
                self.k
            )));
        }
        if self.live.len() == k {
            return Ok(self.live.clone());
        }
        let n = self.live.len();
        Ok((0..k).map(|i| self.live[(self.cursor + i) % n]).collect())
    }

    /// Move the cursor after a round.
    ///
    /// Without an elimination the cursor steps forward by one; after one it restarts at 0 of
    /// the renumbered set.
    pub fn advance(&mut self, eliminated_this_round: bool) {
        let n = self.live.len().max(1);
        self.cursor = if eliminated_this_round {
            0
        } else {
            (self.cursor + 1) % n
        };
    }

    /// Run one elimination pass against `tracker` at elapsed round `t`.
    ///
    /// Does nothing once the set is at the display width. Resets the cursor when anything is
    /// removed.
    pub fn eliminate(&mut self, tracker: &Tracker, t: u64, rule: EliminationRule) -> Elimination {
        self.eliminate_with(&[tracker], t, rule)
    }

    /// Like [`CandidateSet::eliminate`], but a candidate is dominated when it is dominated
    /// under any one of `trackers` (one per player).
    pub fn eliminate_with(
        &mut self,
        trackers: &[&Tracker],
        t: u64,
        rule: EliminationRule,
    ) -> Elimination {
        self.phase += 1;
        if self.exhausted() {
            return Elimination::default();
        }

        // (ucb, id) of every dominated survivor, weakest first.
        let mut dominated: Vec<(f64, usize)> = Vec::new();
        for &c in &self.live {
            let mut weakest: Option<f64> = None;
            for tr in trackers {
                if is_dominated(tr, &self.live, c, t, rule, self.k) {
                    let ucb = tr.bounds(c, t).ucb;
                    weakest = Some(weakest.map_or(ucb, |w| w.min(ucb)));
                }
            }
            if let Some(ucb) = weakest {
                dominated.push((ucb, c));
            }
        }
        if dominated.is_empty() {
            return Elimination::default();
        }
        dominated.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

        let budget = self.live.len() - self.k;
        let refused: Vec<usize> = dominated.iter().skip(budget).map(|&(_, c)| c).collect();
        let removed: Vec<usize> = dominated.into_iter().take(budget).map(|(_, c)| c).collect();

        if !refused.is_empty() {
            tracing::debug!(
                refused = refused.len(),
                k = self.k,
                "elimination would drop below display width; keeping dominated candidates"
            );
        }

        self.live.retain(|c| !removed.contains(c));
        if !removed.is_empty() {
            tracing::debug!(
                round = t,
                phase = self.phase,
                removed = ?removed,
                survivors = self.live.len(),
                "eliminated dominated candidates"
            );
            self.advance(true);
        }
        Elimination { removed, refused }
    }
}

fn is_dominated(
    tracker: &Tracker,
    live: &[usize],
    c: usize,
    t: u64,
    rule: EliminationRule,
    k: usize,
) -> bool {
    let ucb = tracker.bounds(c, t).ucb;
    match rule {
        EliminationRule::BestLcb => match tracker.best_by_mean(live) {
            Some(best) if best != c => ucb < tracker.bounds(best, t).lcb,
            _ => false,
        },
        EliminationRule::KDominated => {
            live.iter()
                .filter(|&&a| a != c && ucb < tracker.bounds(a, t).lcb)
                .count()
                >= k
        }
    }
}

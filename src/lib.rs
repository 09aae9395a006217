//! `cascader`: seedable simulation of cascading combinatorial bandits.
//!
//! Each round an agent (or a group of cooperating players) displays an ordered list of `K`
//! candidates out of `N`, a simulated user scans it under the cascade click model, and the
//! run accumulates regret against the best list under the true probabilities. The crate
//! exists to compare exploration strategies empirically: does regret grow sublinearly, and
//! how fast do confidence bounds prune the candidate space?
//!
//! **Goals:**
//! - **Deterministic by default**: same problem + config + seed → same trace.
//! - **Sequential**: every round's bookkeeping completes before the next round starts; no
//!   shared state between runs.
//! - **Expectation-based regret**: achieved and optimal scores are computed from the true
//!   probabilities, so sampling noise reaches regret only through what the policy learns.
//!
//! **Building blocks (leaf first):**
//! - [`sample`] / [`FeedbackMode`] / [`Outcome`]: draw a terminating-cascade or full-feedback
//!   response from an explicit RNG.
//! - [`expected_score`] / [`any_click_score`] / [`optimal_score`] /
//!   [`optimal_joint_score`]: the score oracle.
//! - [`Tracker`] / [`PlayerEstimates`]: running means and `(ucb, lcb)` bounds, `±inf` until
//!   a candidate has been observed.
//! - [`CandidateSet`] / [`EliminationRule`]: the shrinking round-robin set and the two
//!   dominance tests that prune it. Never shrinks below `K`.
//! - [`RegretTrace`]: cumulative regret per round.
//! - [`PhaseStrategy`]: `ceil(sqrt(T))` phases or power-of-two exploitation windows.
//!
//! **Policies** (all implement [`CascadePolicy`]):
//! - [`UcbPolicy`]: top-`K` by UCB every round.
//! - [`SharedEliminationPolicy`]: multi-player round-robin with per-round elimination.
//! - [`PhasedEliminationPolicy`]: round-robin over arms or joint actions, elimination at
//!   phase boundaries.
//! - [`LambdaSchedulePolicy`]: growing exploration windows and per-player exploitation.
//!
//! **Driver:** [`Simulation`], [`run_simulation`], [`average_regret`].
//!
//! ```rust
//! use cascader::{run_simulation, Algorithm, FeedbackMode, SimConfig};
//!
//! let cfg = SimConfig::default()
//!     .with_algorithm(Algorithm::Ucb)
//!     .with_feedback(FeedbackMode::CascadeTerminating)
//!     .with_seed(42);
//! let trace = run_simulation(500, 4, 2, 1, &[0.6, 0.3, 0.2, 0.1], &cfg).unwrap();
//! assert_eq!(trace.len(), 500);
//! assert!(trace.windows(2).all(|w| w[1] >= w[0] - 1e-12));
//! ```
//!
//! **Non-goals:**
//! - No optimality proofs or asymptotic certification; this is an empirical harness.
//! - No parallel execution, plotting, CLI, or persistence.
//!
//! ## Logging
//!
//! Events are emitted through `tracing` (start/finish at `info`, eliminations and refused
//! eliminations at `debug`, phase boundaries at `trace`). No subscriber is installed.
//!
//! ## The cascade objective
//!
//! For a list with click probabilities `p_1..p_K` the expected reward is
//!
//! ```text
//!   sum_i (prod_{j<i} (1 - p_j)) * p_i  =  1 - prod_i (1 - p_i)
//! ```
//!
//! The value does not depend on the order, so the best list is simply the `K` most
//! clickable candidates. What the order does change is what the learner observes: under
//! terminating feedback nothing below the first click is examined.

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod model;
pub use model::*;

mod sampler;
pub use sampler::*;

mod score;
pub use score::*;

mod tracker;
pub use tracker::*;

mod candidates;
pub use candidates::*;

mod regret;
pub use regret::*;

mod schedule;
pub use schedule::*;

mod policy;
pub use policy::*;

mod sim;
pub use sim::*;

pub const CASCADER_VERSION: &str = env!("CARGO_PKG_VERSION");

//! Simulation driver: wires a policy to the sampler, the score oracle and the regret trace.
//!
//! One round is a strict sequence:
//!
//! ```text
//! SELECT -> SAMPLE -> UPDATE_ESTIMATES -> SCORE -> RECORD_REGRET
//!   -> (phase boundary?) ELIMINATE/ADVANCE
//! ```
//!
//! Achieved and optimal scores are both expectations under the true model, so the trace is
//! non-decreasing in every run; sampling noise only reaches regret through what the policy
//! learns. A run owns its RNG, candidate set, estimates and trace: two simulations in one
//! process never share state.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{
    expected_score, mean_trace, optimal_joint_score, optimal_score, sample, CascadePolicy,
    ClickModel, EliminationRule, Error, EstimateSharing, FeedbackMode, JointSpace,
    LambdaSchedulePolicy, PhaseStrategy, PhasedEliminationPolicy, RegretTrace,
    SharedEliminationPolicy, UcbPolicy,
};

/// Which strategy a simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Top-`k` by UCB every round ([`UcbPolicy`]).
    Ucb,
    /// Round-robin over surviving arms, elimination every round ([`SharedEliminationPolicy`]).
    SharedElimination,
    /// Round-robin over arms (or joint actions when `num_players > 1`) with elimination at
    /// phase boundaries ([`PhasedEliminationPolicy`]).
    #[default]
    PhasedElimination,
    /// Lambda-scheduled exploration with per-player exploitation ([`LambdaSchedulePolicy`]).
    LambdaSchedule,
}

impl Algorithm {
    /// Elimination rule used when [`SimConfig::elimination`] is `None`.
    pub fn default_rule(self) -> EliminationRule {
        match self {
            Algorithm::SharedElimination => EliminationRule::KDominated,
            _ => EliminationRule::BestLcb,
        }
    }

    /// Estimate sharing used when [`SimConfig::sharing`] is `None`.
    pub fn default_sharing(self) -> EstimateSharing {
        match self {
            Algorithm::LambdaSchedule => EstimateSharing::PerPlayer,
            _ => EstimateSharing::Shared,
        }
    }
}

/// Knobs for a simulation run.
///
/// Start with [`SimConfig::default()`] and override via the `with_*` methods or by setting
/// fields directly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    pub algorithm: Algorithm,
    /// Confidence constant `c` in `sqrt(c * ln t / n)`. Larger explores longer.
    pub confidence_c: f64,
    /// Phase lengths for [`Algorithm::PhasedElimination`].
    pub phase_strategy: PhaseStrategy,
    pub feedback: FeedbackMode,
    /// Whether players pool estimates (ignored by [`Algorithm::PhasedElimination`], whose
    /// candidates already are joint actions); `None` uses [`Algorithm::default_sharing`].
    pub sharing: Option<EstimateSharing>,
    /// Elimination rule override; `None` uses [`Algorithm::default_rule`].
    pub elimination: Option<EliminationRule>,
    /// RNG seed for the outcome sampler.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            confidence_c: 1.5,
            phase_strategy: PhaseStrategy::default(),
            feedback: FeedbackMode::default(),
            sharing: None,
            elimination: None,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_confidence_c(mut self, c: f64) -> Self {
        self.confidence_c = c;
        self
    }

    pub fn with_phase_strategy(mut self, strategy: PhaseStrategy) -> Self {
        self.phase_strategy = strategy;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackMode) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_sharing(mut self, sharing: EstimateSharing) -> Self {
        self.sharing = Some(sharing);
        self
    }

    pub fn with_elimination(mut self, rule: EliminationRule) -> Self {
        self.elimination = Some(rule);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The rule actually applied.
    pub fn elimination_rule(&self) -> EliminationRule {
        self.elimination.unwrap_or(self.algorithm.default_rule())
    }

    /// The estimate sharing actually applied.
    pub fn estimate_sharing(&self) -> EstimateSharing {
        self.sharing.unwrap_or(self.algorithm.default_sharing())
    }
}

/// Shape of the simulated problem and its hidden click probabilities.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Problem {
    /// Number of rounds `T`.
    pub horizon: u64,
    /// Arms per player `N`.
    pub num_arms: usize,
    /// Positions displayed per round `K`.
    pub display_width: usize,
    /// Cooperating players `P`.
    pub num_players: usize,
    /// True click probability per arm; length must be `N`.
    pub probabilities: Vec<f64>,
}

impl Problem {
    pub fn new(
        horizon: u64,
        num_arms: usize,
        display_width: usize,
        num_players: usize,
        probabilities: Vec<f64>,
    ) -> Self {
        Self {
            horizon,
            num_arms,
            display_width,
            num_players,
            probabilities,
        }
    }
}

/// A single seeded run.
pub struct Simulation {
    model: ClickModel,
    space: JointSpace,
    k: usize,
    horizon: u64,
    feedback: FeedbackMode,
    optimal: f64,
    policy: Box<dyn CascadePolicy>,
    rng: StdRng,
    regret: RegretTrace,
    round: u64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("policy", &self.policy.name())
            .field("round", &self.round)
            .field("horizon", &self.horizon)
            .field("optimal", &self.optimal)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Validate `problem` and build the configured policy.
    pub fn new(problem: &Problem, cfg: &SimConfig) -> Result<Self, Error> {
        let model = ClickModel::new(problem.probabilities.clone())?;
        if model.num_arms() != problem.num_arms {
            return Err(Error::config(format!(
                "{} probabilities given for {} arms",
                model.num_arms(),
                problem.num_arms
            )));
        }
        if problem.num_players == 0 {
            return Err(Error::config("num_players must be at least 1"));
        }
        if !(cfg.confidence_c.is_finite() && cfg.confidence_c > 0.0) {
            return Err(Error::config(format!(
                "confidence constant must be positive and finite, got {}",
                cfg.confidence_c
            )));
        }

        let k = problem.display_width;
        let players = problem.num_players;
        let c = cfg.confidence_c;
        let rule = cfg.elimination_rule();
        let sharing = cfg.estimate_sharing();

        let space = match cfg.algorithm {
            Algorithm::PhasedElimination => JointSpace::new(problem.num_arms, players)?,
            _ => JointSpace::arms_only(problem.num_arms)?,
        };
        if k == 0 || k > space.len() {
            return Err(Error::config(format!(
                "display width k={k} must be in 1..={}",
                space.len()
            )));
        }

        let policy: Box<dyn CascadePolicy> = match cfg.algorithm {
            Algorithm::Ucb => Box::new(UcbPolicy::new(problem.num_arms, k, players, c, sharing)?),
            Algorithm::SharedElimination => Box::new(SharedEliminationPolicy::new(
                problem.num_arms,
                k,
                players,
                c,
                sharing,
                rule,
            )?),
            Algorithm::PhasedElimination => Box::new(PhasedEliminationPolicy::new(
                space.len(),
                k,
                problem.horizon,
                c,
                rule,
                cfg.phase_strategy,
            )?),
            Algorithm::LambdaSchedule => Box::new(LambdaSchedulePolicy::new(
                problem.num_arms,
                k,
                players,
                problem.horizon,
                c,
                sharing,
            )?),
        };

        let optimal = if space.players() == 1 {
            optimal_score(&model, k)
        } else {
            optimal_joint_score(&model, &space, k)
        };

        Ok(Self {
            model,
            space,
            k,
            horizon: problem.horizon,
            feedback: cfg.feedback,
            optimal,
            policy,
            rng: StdRng::seed_from_u64(cfg.seed),
            regret: RegretTrace::with_horizon(usize::try_from(problem.horizon).unwrap_or(0)),
            round: 0,
        })
    }

    /// Rounds completed so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.horizon
    }

    /// Expected score of the best list of `k` candidates.
    pub fn optimal(&self) -> f64 {
        self.optimal
    }

    pub fn policy(&self) -> &dyn CascadePolicy {
        self.policy.as_ref()
    }

    pub fn regret(&self) -> &RegretTrace {
        &self.regret
    }

    /// True click probability of a candidate id in this run's space.
    pub fn candidate_p(&self, candidate: usize) -> f64 {
        candidate_p(&self.model, &self.space, candidate)
    }

    /// Play one round and return its achieved (expected) score.
    pub fn step(&mut self) -> Result<f64, Error> {
        let round = self.round;
        let lists = self.policy.select(round)?;
        if lists.is_empty() {
            return Err(Error::config(format!(
                "policy {} displayed nothing in round {round}",
                self.policy.name()
            )));
        }
        if let Some(bad) = lists.iter().find(|l| l.len() != self.k) {
            return Err(Error::config(format!(
                "selected {} candidates, display width is {}",
                bad.len(),
                self.k
            )));
        }

        let (model, space) = (&self.model, &self.space);
        for (player, list) in lists.iter().enumerate() {
            let outcome = sample(
                &mut self.rng,
                list,
                |c| candidate_p(model, space, c),
                self.feedback,
            )?;
            self.policy.observe(player, list, &outcome);
        }

        let achieved = lists
            .iter()
            .map(|l| expected_score(l, |c| candidate_p(model, space, c)))
            .sum::<f64>()
            / lists.len() as f64;

        let index = usize::try_from(round)
            .map_err(|_| Error::config(format!("round {round} does not fit in usize")))?;
        self.regret.record(index, achieved, self.optimal);
        self.policy.end_round(round);
        self.round += 1;
        Ok(achieved)
    }

    /// Play the remaining rounds and return the regret trace.
    pub fn run(mut self) -> Result<RegretTrace, Error> {
        tracing::info!(
            policy = self.policy.name(),
            horizon = self.horizon,
            k = self.k,
            candidates = self.space.len(),
            optimal = self.optimal,
            "starting simulation"
        );
        while !self.is_finished() {
            self.step()?;
        }
        tracing::info!(
            policy = self.policy.name(),
            regret = self.regret.cumulative(),
            survivors = ?self.policy.active_candidates().map(<[usize]>::len),
            "simulation finished"
        );
        Ok(self.regret)
    }
}

fn candidate_p(model: &ClickModel, space: &JointSpace, candidate: usize) -> f64 {
    if space.players() == 1 {
        return model.p(candidate);
    }
    space
        .decode(candidate)
        .map_or(0.0, |tuple| model.joint_p(&tuple))
}

/// Run one simulation and return its cumulative regret trace (length `horizon`).
///
/// # Example
///
/// ```rust
/// use cascader::{run_simulation, Algorithm, SimConfig};
///
/// let cfg = SimConfig::default().with_algorithm(Algorithm::Ucb);
/// let trace = run_simulation(1, 3, 2, 1, &[0.5, 0.3, 0.1], &cfg).unwrap();
/// // Round one shows arms [0, 1], which happens to be optimal.
/// assert!(trace[0].abs() < 1e-12);
/// ```
pub fn run_simulation(
    horizon: u64,
    num_arms: usize,
    display_width: usize,
    num_players: usize,
    probabilities: &[f64],
    cfg: &SimConfig,
) -> Result<Vec<f64>, Error> {
    let problem = Problem::new(
        horizon,
        num_arms,
        display_width,
        num_players,
        probabilities.to_vec(),
    );
    Ok(Simulation::new(&problem, cfg)?.run()?.into_vec())
}

/// Mean regret trace over `trials` runs seeded `cfg.seed, cfg.seed + 1, ...`.
pub fn average_regret(
    problem: &Problem,
    cfg: &SimConfig,
    trials: usize,
) -> Result<Vec<f64>, Error> {
    let traces = (0..trials as u64)
        .map(|i| {
            let cfg = cfg.clone().with_seed(cfg.seed.wrapping_add(i));
            Simulation::new(problem, &cfg)?.run().map(RegretTrace::into_vec)
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(mean_trace(&traces))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(t: u64, k: usize, players: usize, p: &[f64]) -> Problem {
        Problem::new(t, p.len(), k, players, p.to_vec())
    }

    #[test]
    fn rejects_mismatched_probability_vector() {
        let pr = Problem::new(10, 4, 2, 1, vec![0.1, 0.2, 0.3]);
        let e = Simulation::new(&pr, &SimConfig::default()).unwrap_err();
        assert!(matches!(e, Error::Configuration(_)));
    }

    #[test]
    fn rejects_width_above_arm_count_and_bad_probabilities() {
        let e = Simulation::new(&problem(10, 4, 1, &[0.1, 0.2, 0.3]), &SimConfig::default())
            .unwrap_err();
        assert!(matches!(e, Error::Configuration(_)));
        let e = Simulation::new(&problem(10, 1, 1, &[0.1, 1.2]), &SimConfig::default())
            .unwrap_err();
        assert_eq!(e, Error::InvalidModel { arm: 1, p: 1.2 });
    }

    #[test]
    fn rejects_zero_players_and_bad_confidence() {
        assert!(Simulation::new(&problem(10, 1, 0, &[0.5, 0.5]), &SimConfig::default()).is_err());
        let cfg = SimConfig::default().with_confidence_c(0.0);
        assert!(Simulation::new(&problem(10, 1, 1, &[0.5, 0.5]), &cfg).is_err());
    }

    #[test]
    fn joint_width_may_exceed_arm_count() {
        // 2 arms, 2 players -> 4 joint actions.
        let cfg = SimConfig::default();
        let sim = Simulation::new(&problem(10, 3, 2, &[0.5, 0.2]), &cfg).unwrap();
        assert!((sim.candidate_p(0) - 0.75).abs() < 1e-12);
        assert!((sim.candidate_p(3) - 0.36).abs() < 1e-12);
        assert!(Simulation::new(
            &problem(10, 3, 2, &[0.5, 0.2]),
            &cfg.with_algorithm(Algorithm::Ucb)
        )
        .is_err());
    }

    #[test]
    fn zero_horizon_gives_empty_trace() {
        let tr = run_simulation(0, 2, 1, 1, &[0.3, 0.6], &SimConfig::default()).unwrap();
        assert!(tr.is_empty());
    }

    #[test]
    fn every_algorithm_produces_a_full_nondecreasing_trace() {
        let p = [0.7, 0.5, 0.2, 0.1, 0.05];
        for algorithm in [
            Algorithm::Ucb,
            Algorithm::SharedElimination,
            Algorithm::PhasedElimination,
            Algorithm::LambdaSchedule,
        ] {
            let cfg = SimConfig::default().with_algorithm(algorithm).with_seed(7);
            let tr = run_simulation(300, 5, 2, 2, &p, &cfg).unwrap();
            assert_eq!(tr.len(), 300, "{algorithm:?}");
            assert!(tr[0] >= -1e-12, "{algorithm:?}");
            for w in tr.windows(2) {
                assert!(w[1] >= w[0] - 1e-12, "{algorithm:?}: {w:?}");
            }
        }
    }

    #[test]
    fn same_seed_same_trace() {
        let p = [0.6, 0.4, 0.3, 0.1];
        let cfg = SimConfig::default()
            .with_algorithm(Algorithm::Ucb)
            .with_feedback(FeedbackMode::CascadeTerminating)
            .with_seed(11);
        let a = run_simulation(200, 4, 2, 1, &p, &cfg).unwrap();
        let b = run_simulation(200, 4, 2, 1, &p, &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn lambda_schedule_defaults_to_per_player_estimates() {
        let cfg = SimConfig::default().with_algorithm(Algorithm::LambdaSchedule);
        assert_eq!(cfg.estimate_sharing(), EstimateSharing::PerPlayer);
        assert_eq!(SimConfig::default().estimate_sharing(), EstimateSharing::Shared);

        let pr = problem(600, 2, 3, &[0.05, 0.6, 0.1, 0.5, 0.2, 0.15]);
        let implicit = Simulation::new(&pr, &cfg).unwrap().run().unwrap();
        let per_player = cfg.clone().with_sharing(EstimateSharing::PerPlayer);
        let explicit = Simulation::new(&pr, &per_player).unwrap().run().unwrap();
        assert_eq!(implicit, explicit);

        let shared = cfg.with_sharing(EstimateSharing::Shared);
        assert_eq!(shared.estimate_sharing(), EstimateSharing::Shared);
    }

    #[test]
    fn average_regret_matches_single_run_for_one_trial() {
        let pr = problem(50, 1, 1, &[0.8, 0.2, 0.1]);
        let cfg = SimConfig::default().with_seed(3);
        let avg = average_regret(&pr, &cfg, 1).unwrap();
        let one = Simulation::new(&pr, &cfg).unwrap().run().unwrap().into_vec();
        assert_eq!(avg, one);
    }
}

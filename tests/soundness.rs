//! Statistical soundness: confidence-bound elimination rarely discards the best arm.
//!
//! These run many seeded simulations, so thresholds are loose enough to be stable across
//! seeds while still catching a wrong sign or an off-by-one in the bounds.

use cascader::{Algorithm, EliminationRule, Problem, SimConfig, Simulation};

fn best_arm_loss_rate(problem: &Problem, cfg: &SimConfig, runs: u64) -> f64 {
    let mut lost = 0u64;
    for seed in 0..runs {
        let cfg = cfg.clone().with_seed(seed);
        let mut sim = Simulation::new(problem, &cfg).unwrap();
        while !sim.is_finished() {
            sim.step().unwrap();
        }
        let live = sim.policy().active_candidates().unwrap();
        if !live.contains(&0) {
            lost += 1;
        }
    }
    lost as f64 / runs as f64
}

#[test]
fn phased_elimination_keeps_the_best_arm() {
    let pr = Problem::new(2000, 4, 1, 1, vec![0.9, 0.1, 0.1, 0.1]);
    let rate = best_arm_loss_rate(&pr, &SimConfig::default(), 1000);
    assert!(rate < 0.05, "best arm eliminated in {:.1}% of runs", rate * 100.0);
}

#[test]
fn k_dominated_rule_keeps_the_best_arm() {
    let pr = Problem::new(2000, 4, 1, 1, vec![0.9, 0.1, 0.1, 0.1]);
    let cfg = SimConfig::default().with_elimination(EliminationRule::KDominated);
    let rate = best_arm_loss_rate(&pr, &cfg, 300);
    assert!(rate < 0.05, "best arm eliminated in {:.1}% of runs", rate * 100.0);
}

#[test]
fn shared_elimination_keeps_the_best_arm() {
    let pr = Problem::new(1000, 4, 1, 2, vec![0.9, 0.1, 0.1, 0.1]);
    let cfg = SimConfig::default().with_algorithm(Algorithm::SharedElimination);
    let rate = best_arm_loss_rate(&pr, &cfg, 200);
    assert!(rate < 0.05, "best arm eliminated in {:.1}% of runs", rate * 100.0);
}

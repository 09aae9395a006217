//! Score oracle: expected reward of a displayed list under the cascade model.
//!
//! These are deterministic functions of the true probabilities. They are used for two
//! things only: the optimal baseline a run is measured against, and the achieved score of
//! each round. Regret is therefore computed from expectations, never from realized clicks.

use crate::{ClickModel, JointSpace};

/// Cascade expected score of a list: `sum_i (prod_{j<i} (1 - p_j)) * p_i`.
///
/// `p` maps candidate ids to click probabilities. An empty list scores `0.0`.
pub fn expected_score<F>(ordered: &[usize], mut p: F) -> f64
where
    F: FnMut(usize) -> f64,
{
    let mut reward = 0.0;
    let mut cont = 1.0;
    for &c in ordered {
        let pc = p(c);
        reward += cont * pc;
        cont *= 1.0 - pc;
    }
    reward
}

/// Closed form of the same quantity: `1 - prod_i (1 - p_i)`.
///
/// Agrees with [`expected_score`] for every list (the "any click" event does not depend on
/// order); both exist so the identity can be checked.
pub fn any_click_score<F>(ordered: &[usize], mut p: F) -> f64
where
    F: FnMut(usize) -> f64,
{
    1.0 - ordered.iter().map(|&c| 1.0 - p(c)).product::<f64>()
}

/// The `k` highest-probability candidates, sorted descending; ties go to the lower id.
pub fn top_k_by<F>(candidates: impl IntoIterator<Item = usize>, k: usize, mut p: F) -> Vec<usize>
where
    F: FnMut(usize) -> f64,
{
    let mut rows: Vec<(f64, usize)> = candidates.into_iter().map(|c| (p(c), c)).collect();
    rows.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    rows.into_iter().take(k).map(|(_, c)| c).collect()
}

/// Best ordered set of `k` arms: the `k` most clickable arms, descending.
pub fn top_k_arms(model: &ClickModel, k: usize) -> Vec<usize> {
    top_k_by(0..model.num_arms(), k, |a| model.p(a))
}

/// Score of the best ordered list of `k` arms.
///
/// Greedy is exact for the cascade objective: an arm's marginal contribution depends only on
/// its own probability and the non-click mass of the arms placed above it.
pub fn optimal_score(model: &ClickModel, k: usize) -> f64 {
    expected_score(&top_k_arms(model, k), |a| model.p(a))
}

/// Score of the best list of `k` joint actions.
///
/// Joint tuples have no ordering structure, so every tuple is enumerated (lazily) and the
/// `k` best candidate probabilities are kept.
pub fn optimal_joint_score(model: &ClickModel, space: &JointSpace, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    // Running top-k, descending.
    let mut best: Vec<f64> = Vec::with_capacity(k + 1);
    for (_, tuple) in space.iter() {
        let q = model.joint_p(&tuple);
        if best.len() == k && best.last().is_some_and(|&worst| q <= worst) {
            continue;
        }
        let at = best.partition_point(|&b| b >= q);
        best.insert(at, q);
        best.truncate(k);
    }
    let idx: Vec<usize> = (0..best.len()).collect();
    expected_score(&idx, |i| best[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(p: &[f64]) -> ClickModel {
        ClickModel::new(p.to_vec()).unwrap()
    }

    #[test]
    fn weighted_sum_matches_closed_form() {
        let p = [0.5, 0.3, 0.1, 0.9, 0.0];
        let lists: [&[usize]; 4] = [&[0, 1], &[3, 2, 4], &[4], &[2, 0, 3, 1]];
        for l in lists {
            let a = expected_score(l, |c| p[c]);
            let b = any_click_score(l, |c| p[c]);
            assert!((a - b).abs() < 1e-12, "{l:?}: {a} vs {b}");
        }
    }

    #[test]
    fn empty_list_scores_zero() {
        assert_eq!(expected_score(&[], |_| 0.7), 0.0);
        assert_eq!(any_click_score(&[], |_| 0.7), 0.0);
    }

    #[test]
    fn optimal_picks_highest_probabilities() {
        let m = model(&[0.5, 0.3, 0.1]);
        assert_eq!(top_k_arms(&m, 2), vec![0, 1]);
        assert!((optimal_score(&m, 2) - 0.65).abs() < 1e-12);
    }

    #[test]
    fn ties_break_by_lower_index() {
        let m = model(&[0.2, 0.4, 0.4, 0.1]);
        assert_eq!(top_k_arms(&m, 2), vec![1, 2]);
        assert_eq!(top_k_arms(&m, 1), vec![1]);
    }

    #[test]
    fn joint_optimum_with_one_player_matches_arm_optimum() {
        let m = model(&[0.15, 0.6, 0.35, 0.05]);
        let s = JointSpace::arms_only(4).unwrap();
        for k in 1..=4 {
            let a = optimal_score(&m, k);
            let b = optimal_joint_score(&m, &s, k);
            assert!((a - b).abs() < 1e-12, "k={k}: {a} vs {b}");
        }
    }

    #[test]
    fn joint_optimum_k1_is_best_tuple() {
        let m = model(&[0.5, 0.3, 0.1]);
        let s = JointSpace::new(3, 2).unwrap();
        // Best tuple is (0, 0): 1 - 0.5 * 0.5.
        assert!((optimal_joint_score(&m, &s, 1) - 0.75).abs() < 1e-12);
        assert_eq!(optimal_joint_score(&m, &s, 0), 0.0);
    }
}

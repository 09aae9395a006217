//! Cascade outcome sampler.
//!
//! Draws one stochastic user response to a displayed list. The random source is always an
//! explicit `&mut R` so that a simulation seeded once is reproducible end to end, and
//! concurrent simulations in one process never share state.

use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

use crate::Error;

/// How much of a displayed list the learner gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeedbackMode {
    /// The user scans top to bottom and stops at the first click; positions below the
    /// click are never examined.
    CascadeTerminating,
    /// Every position is examined independently.
    #[default]
    FullFeedback,
}

/// A single sampled response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Terminating cascade: index of the first clicked position, `None` if nothing was
    /// clicked. `len` is the displayed list length.
    FirstClick { click: Option<usize>, len: usize },
    /// Full feedback: one click indicator per position.
    Clicks(Vec<bool>),
}

impl Outcome {
    /// First clicked position, or `len` (one past the list) when nothing was clicked.
    pub fn click_index(&self) -> usize {
        match self {
            Outcome::FirstClick { click, len } => click.unwrap_or(*len),
            Outcome::Clicks(c) => c.iter().position(|&x| x).unwrap_or(c.len()),
        }
    }

    /// Whether any position was clicked.
    pub fn any_click(&self) -> bool {
        match self {
            Outcome::FirstClick { click, .. } => click.is_some(),
            Outcome::Clicks(c) => c.iter().any(|&x| x),
        }
    }

    /// `(position, reward)` pairs the learner actually observed.
    ///
    /// Terminating: every position up to and including the click (reward `1.0` at the click,
    /// `0.0` above it); all positions with reward `0.0` when nothing was clicked.
    /// Full feedback: every position.
    pub fn observations(&self) -> Vec<(usize, f64)> {
        match self {
            Outcome::FirstClick { click, len } => {
                let last = click.map_or(*len, |c| c + 1);
                (0..last)
                    .map(|i| (i, if Some(i) == *click { 1.0 } else { 0.0 }))
                    .collect()
            }
            Outcome::Clicks(c) => c
                .iter()
                .enumerate()
                .map(|(i, &x)| (i, if x { 1.0 } else { 0.0 }))
                .collect(),
        }
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R, candidate: usize, p: f64) -> Result<bool, Error> {
    let dist = Bernoulli::new(p).map_err(|_| Error::InvalidModel { arm: candidate, p })?;
    Ok(dist.sample(rng))
}

/// Sample a response to `ordered` given each candidate's click probability.
///
/// `p` maps a candidate identifier to its true click probability; an out-of-range
/// probability is reported as [`Error::InvalidModel`].
pub fn sample<R, F>(
    rng: &mut R,
    ordered: &[usize],
    mut p: F,
    mode: FeedbackMode,
) -> Result<Outcome, Error>
where
    R: Rng + ?Sized,
    F: FnMut(usize) -> f64,
{
    match mode {
        FeedbackMode::CascadeTerminating => {
            for (i, &c) in ordered.iter().enumerate() {
                if draw(rng, c, p(c))? {
                    return Ok(Outcome::FirstClick {
                        click: Some(i),
                        len: ordered.len(),
                    });
                }
            }
            Ok(Outcome::FirstClick {
                click: None,
                len: ordered.len(),
            })
        }
        FeedbackMode::FullFeedback => {
            let clicks = ordered
                .iter()
                .map(|&c| draw(rng, c, p(c)))
                .collect::<Result<Vec<bool>, Error>>()?;
            Ok(Outcome::Clicks(clicks))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn terminating_stops_at_certain_click() {
        let mut rng = StdRng::seed_from_u64(1);
        let probs = [0.0, 1.0, 1.0];
        let o = sample(&mut rng, &[0, 1, 2], |c| probs[c], FeedbackMode::CascadeTerminating)
            .unwrap();
        assert_eq!(o, Outcome::FirstClick { click: Some(1), len: 3 });
        assert_eq!(o.click_index(), 1);
        assert_eq!(o.observations(), vec![(0, 0.0), (1, 1.0)]);
    }

    #[test]
    fn terminating_without_click_returns_sentinel_past_the_list() {
        let mut rng = StdRng::seed_from_u64(2);
        let o = sample(&mut rng, &[4, 7], |_| 0.0, FeedbackMode::CascadeTerminating).unwrap();
        assert_eq!(o.click_index(), 2);
        assert!(!o.any_click());
        assert_eq!(o.observations(), vec![(0, 0.0), (1, 0.0)]);
    }

    #[test]
    fn full_feedback_reports_every_position() {
        let mut rng = StdRng::seed_from_u64(3);
        let probs = [1.0, 0.0, 1.0];
        let o = sample(&mut rng, &[0, 1, 2], |c| probs[c], FeedbackMode::FullFeedback).unwrap();
        assert_eq!(o, Outcome::Clicks(vec![true, false, true]));
        assert_eq!(o.click_index(), 0);
        assert_eq!(o.observations().len(), 3);
    }

    #[test]
    fn same_seed_same_outcomes() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| {
                    sample(&mut rng, &[0, 1, 2], |_| 0.3, FeedbackMode::CascadeTerminating)
                        .unwrap()
                        .click_index()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn invalid_probability_is_an_error() {
        let mut rng = StdRng::seed_from_u64(4);
        let e = sample(&mut rng, &[5], |_| 2.0, FeedbackMode::FullFeedback).unwrap_err();
        assert_eq!(e, Error::InvalidModel { arm: 5, p: 2.0 });
    }
}

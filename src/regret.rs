//! Regret accumulator.

/// Cumulative regret, one entry per simulated round.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegretTrace {
    cumulative: f64,
    trace: Vec<f64>,
}

impl RegretTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty trace with room for `horizon` rounds.
    pub fn with_horizon(horizon: usize) -> Self {
        Self {
            cumulative: 0.0,
            trace: Vec::with_capacity(horizon),
        }
    }

    /// Add `optimal - achieved` to the running total and store it at `round`.
    ///
    /// Rounds are normally recorded in order. If `round` skips ahead, the gap is filled with
    /// the previous cumulative value; recording an earlier round overwrites that slot with the
    /// current total.
    pub fn record(&mut self, round: usize, achieved: f64, optimal: f64) -> f64 {
        let before = self.cumulative;
        self.cumulative += optimal - achieved;
        if round < self.trace.len() {
            self.trace[round] = self.cumulative;
        } else {
            self.trace.resize(round, before);
            self.trace.push(self.cumulative);
        }
        self.cumulative
    }

    /// Current cumulative regret.
    pub fn cumulative(&self) -> f64 {
        self.cumulative
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.trace
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.trace
    }
}

/// Element-wise mean of equally long traces. Empty input yields an empty vector.
pub fn mean_trace(traces: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = traces.first() else {
        return Vec::new();
    };
    let mut out = vec![0.0; first.len()];
    for tr in traces {
        for (o, x) in out.iter_mut().zip(tr) {
            *o += x;
        }
    }
    let n = traces.len() as f64;
    for o in &mut out {
        *o /= n;
    }
    out
}

//! Phase-length strategies: when exploration windows end and elimination runs.

/// How phased policies split the horizon into exploration and exploitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseStrategy {
    /// Exploration phases of `ceil(sqrt(T))` rounds, each followed by an elimination pass.
    #[default]
    FixedSqrtHorizon,
    /// Explore for `lambda * |set|` rounds, eliminate, then exploit until the round index
    /// reaches the next power of two; `lambda` grows by one per cycle.
    PowerOfTwo,
}

/// `ceil(sqrt(horizon))`, at least 1.
///
/// # Example
///
/// ```rust
/// use cascader::fixed_sqrt_phase_len;
///
/// assert_eq!(fixed_sqrt_phase_len(100), 10);
/// assert_eq!(fixed_sqrt_phase_len(101), 11);
/// ```
pub fn fixed_sqrt_phase_len(horizon: u64) -> u64 {
    let mut r = (horizon as f64).sqrt().ceil() as u64;
    // Correct float rounding at perfect squares and just past them.
    while r > 0 && (r - 1).saturating_mul(r - 1) >= horizon {
        r -= 1;
    }
    while r.saturating_mul(r) < horizon {
        r += 1;
    }
    r.max(1)
}

/// Exploitation rounds from round index `t` up to the next power-of-two boundary, capped by
/// the rounds left before `horizon`.
///
/// The boundary is `2^(floor(log2 t) + 1)`, so at `t = 4` the window runs to 8; at `t = 0`
/// it runs to 1.
pub fn power_of_two_exploit_len(t: u64, horizon: u64) -> u64 {
    let next = if t == 0 {
        1
    } else {
        1u64.checked_shl(64 - t.leading_zeros()).unwrap_or(u64::MAX)
    };
    next.saturating_sub(t).min(horizon.saturating_sub(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_phase_is_exact_ceiling() {
        assert_eq!(fixed_sqrt_phase_len(0), 1);
        assert_eq!(fixed_sqrt_phase_len(1), 1);
        assert_eq!(fixed_sqrt_phase_len(2), 2);
        assert_eq!(fixed_sqrt_phase_len(2000), 45);
        assert_eq!(fixed_sqrt_phase_len(2025), 45);
        assert_eq!(fixed_sqrt_phase_len(2026), 46);
    }

    #[test]
    fn exploit_runs_to_next_power_of_two() {
        assert_eq!(power_of_two_exploit_len(0, 100), 1);
        assert_eq!(power_of_two_exploit_len(1, 100), 1);
        assert_eq!(power_of_two_exploit_len(3, 100), 1);
        assert_eq!(power_of_two_exploit_len(4, 100), 4);
        assert_eq!(power_of_two_exploit_len(5, 100), 3);
        assert_eq!(power_of_two_exploit_len(40, 100), 24);
    }

    #[test]
    fn exploit_is_capped_by_horizon() {
        assert_eq!(power_of_two_exploit_len(40, 50), 10);
        assert_eq!(power_of_two_exploit_len(60, 50), 0);
    }
}

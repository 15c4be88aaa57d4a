//! Point values for verifications, completions and progress on a ranked level.
//!
//! A level's position on the list is the primary difficulty signal: the curve
//! `base - coefficient * (rank - 1)^exponent` decays with rank, and the achieved
//! percentage scales it linearly between `required - 1` and 100. Anything short of
//! a full completion loses a third of its value, and only the first
//! [`ScoringPolicy::progress_max_rank`] levels award progress at all.
//!
//! Scores are returned at full precision. Rounding via [`round`] happens once, on
//! the summed total of a player, so the sum-then-round step stays associative.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::numbers::{percent_to_f64, round_to_places, usize_to_f64};

/// Tunables of the scoring curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Decimal digits kept when rounding totals.
    #[serde(default = "ScoringPolicy::default_decimals")]
    pub decimals: u32,
    /// Levels ranked below this award nothing.
    #[serde(default = "ScoringPolicy::default_max_rank")]
    pub max_rank: usize,
    /// Levels ranked below this only award full completions.
    #[serde(default = "ScoringPolicy::default_progress_max_rank")]
    pub progress_max_rank: usize,
    #[serde(default = "ScoringPolicy::default_base")]
    pub base: f64,
    #[serde(default = "ScoringPolicy::default_rank_coefficient")]
    pub rank_coefficient: f64,
    #[serde(default = "ScoringPolicy::default_rank_exponent")]
    pub rank_exponent: f64,
    /// Fraction of the value removed from anything below 100%.
    #[serde(default = "ScoringPolicy::default_progress_penalty")]
    pub progress_penalty: f64,
}

impl ScoringPolicy {
    const fn default_decimals() -> u32 {
        3
    }

    const fn default_max_rank() -> usize {
        150
    }

    const fn default_progress_max_rank() -> usize {
        75
    }

    const fn default_base() -> f64 {
        200.0
    }

    const fn default_rank_coefficient() -> f64 {
        24.9975
    }

    const fn default_rank_exponent() -> f64 {
        0.4
    }

    const fn default_progress_penalty() -> f64 {
        1.0 / 3.0
    }

    /// Round a value to this policy's precision.
    #[must_use]
    pub fn round(&self, value: f64) -> f64 {
        round_to_places(value, self.decimals)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            decimals: Self::default_decimals(),
            max_rank: Self::default_max_rank(),
            progress_max_rank: Self::default_progress_max_rank(),
            base: Self::default_base(),
            rank_coefficient: Self::default_rank_coefficient(),
            rank_exponent: Self::default_rank_exponent(),
            progress_penalty: Self::default_progress_penalty(),
        }
    }
}

fn default_policy() -> &'static ScoringPolicy {
    static POLICY: OnceLock<ScoringPolicy> = OnceLock::new();
    POLICY.get_or_init(ScoringPolicy::default)
}

/// Score earned at `achieved` percent on the level ranked `rank`, which requires
/// `required` percent to qualify.
#[must_use]
pub fn score(rank: usize, achieved: u8, required: u8) -> f64 {
    score_with_policy(rank, achieved, required, default_policy())
}

/// Score using an explicit policy.
///
/// Percentages above 100 are clamped and rank 0 counts as rank 1.
#[must_use]
pub fn score_with_policy(rank: usize, achieved: u8, required: u8, policy: &ScoringPolicy) -> f64 {
    let rank = rank.max(1);
    if rank > policy.max_rank {
        return 0.0;
    }

    let achieved = percent_to_f64(achieved);
    let complete = achieved >= 100.0;
    if rank > policy.progress_max_rank && !complete {
        return 0.0;
    }

    let curve = policy.base
        - policy.rank_coefficient * usize_to_f64(rank - 1).powf(policy.rank_exponent);
    let floor = percent_to_f64(required) - 1.0;
    let factor = (achieved - floor) / (100.0 - floor);
    let value = (curve * factor).max(0.0);

    if complete {
        value
    } else {
        value - value * policy.progress_penalty
    }
}

/// Round a summed score to the default policy's precision.
#[must_use]
pub fn round(value: f64) -> f64 {
    default_policy().round(value)
}

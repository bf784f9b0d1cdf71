use soroban_sdk::{contracttype, Env, I256};

pub use common::PRECISION;

// ── Accumulator state ───────────────────────────────────────────────────────

/// Per reward-asset accumulator.
///
/// `reward_per_unit` only ever grows. `queued` holds inflows that arrived
/// while nothing was staked; it is folded into the accumulator by the next
/// inflow that finds a non-zero total stake.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RewardState {
    /// Reward per staked unit, scaled by `PRECISION`.
    pub reward_per_unit: i128,
    /// Reward received while `total_staked == 0`.
    pub queued: i128,
    /// Sum of every amount folded into `reward_per_unit` so far.
    pub total_distributed: i128,
}

/// Per (user, reward-asset) settlement snapshot.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserRewardState {
    /// `RewardState::reward_per_unit` at the user's last accrual.
    pub reward_per_unit_paid: i128,
    /// Settled but not yet claimed reward.
    pub accrued: i128,
}

impl RewardState {
    /// Record an inflow of `amount` against the current `total_staked`.
    ///
    /// Returns `Some(true)` when the inflow (plus anything queued) moved the
    /// accumulator and `Some(false)` when it was queued. `None` means the
    /// scaled arithmetic overflowed; `self` is left untouched in that case.
    pub fn record_inflow(&mut self, env: &Env, amount: i128, total_staked: i128) -> Option<bool> {
        let pending = self.queued.checked_add(amount)?;

        if total_staked <= 0 {
            self.queued = pending;
            return Some(false);
        }

        let reward_per_unit =
            compute_reward_per_unit(env, self.reward_per_unit, pending, total_staked)?;
        let total_distributed = self.total_distributed.checked_add(pending)?;

        self.reward_per_unit = reward_per_unit;
        self.total_distributed = total_distributed;
        self.queued = 0;
        Some(true)
    }
}

// ── Core reward engine ──────────────────────────────────────────────────────

/// `a × b / denominator` with a 256-bit intermediate, floored for
/// non-negative inputs.
///
/// The product of two `i128` always fits in 256 bits, so only the quotient
/// can fail to fit back into `i128`.
pub fn mul_div(env: &Env, a: i128, b: i128, denominator: i128) -> Option<i128> {
    if denominator == 0 {
        return None;
    }
    I256::from_i128(env, a)
        .mul(&I256::from_i128(env, b))
        .div(&I256::from_i128(env, denominator))
        .to_i128()
}

/// Fold `pending` reward units into the accumulator.
///
/// ```text
/// Δrpu = pending × PRECISION / total_staked
/// new_rpu = stored_rpu + Δrpu
/// ```
///
/// Floor division: at most `total_staked - 1` scaled units are lost per
/// call and stay in the pool as dust. With no stakers the accumulator is
/// returned unchanged; the caller queues the inflow instead.
pub fn compute_reward_per_unit(
    env: &Env,
    stored: i128,
    pending: i128,
    total_staked: i128,
) -> Option<i128> {
    if total_staked <= 0 {
        return Some(stored);
    }

    let delta = mul_div(env, pending, PRECISION, total_staked)?;
    stored.checked_add(delta)
}

/// Settle everything a staker has earned since their last snapshot.
///
/// ```text
/// earned = staked × (current_rpu − user_rpu_paid) / PRECISION + user_accrued
/// ```
///
/// The result is bounded by the reward actually paid into the pool, so it
/// fits in `i128` however large the accumulator has grown.
pub fn earned(
    env: &Env,
    staked: i128,
    current_rpu: i128,
    user_rpu_paid: i128,
    user_accrued: i128,
) -> Option<i128> {
    let delta = current_rpu.checked_sub(user_rpu_paid)?;
    let new_rewards = mul_div(env, staked, delta, PRECISION)?;

    user_accrued.checked_add(new_rewards)
}

// ── Unit tests ──────────────────────────────────────────────────────────────

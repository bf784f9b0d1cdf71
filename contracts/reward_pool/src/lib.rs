#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod events;
pub mod rewards;

use common::{guard, roles, Role};
use soroban_sdk::{
    contract, contractimpl, log, symbol_short, token, Address, Env, Map, Symbol, Vec,
};

use rewards::{RewardState, UserRewardState};

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const STAKE_TOKEN: Symbol = symbol_short!("STK_TOK");
const REWARD_ASSETS: Symbol = symbol_short!("RWD_ASTS");
const TOTAL_STAKED: Symbol = symbol_short!("TOT_STK");

// Persistent storage uses tuple keys:  (prefix, ...)
const USER_STAKE: Symbol = symbol_short!("STK");
const REWARD_STATE: Symbol = symbol_short!("RWD_ST");
const USER_REWARD: Symbol = symbol_short!("USR_RWD");

const USER_TTL_THRESHOLD: u32 = 5_184_000; // ~60 days
const USER_TTL_EXTEND_TO: u32 = 10_368_000; // ~120 days

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RewardPoolError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    MissingRole = 3,
    OnlyDistributor = 4,
    InvalidAmount = 5,
    InsufficientBalance = 6,
    InsufficientStake = 7,
    InvalidRewardToken = 8,
    Reentrant = 9,
    Overflow = 10,
}

// ── Contract ─────────────────────────────────────────────────────────────────

/// Proportional reward distribution over a staked claim-token.
///
/// Any number of reward assets can be pushed in by a distributor at any time;
/// each staker's share of an inflow is fixed by their stake at the moment the
/// inflow is recorded.
#[contract]
pub struct RewardPoolContract;

#[contractimpl]
impl RewardPoolContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the pool.
    ///
    /// * `staking_token` – token users stake (the custody pool's claim-token).
    /// * `reward_assets` – tokens that may be distributed through `add_reward`.
    pub fn initialize(
        env: Env,
        admin: Address,
        staking_token: Address,
        reward_assets: Vec<Address>,
    ) -> Result<(), RewardPoolError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(RewardPoolError::AlreadyInitialized);
        }
        if reward_assets.is_empty() {
            return Err(RewardPoolError::InvalidRewardToken);
        }
        for (i, asset) in reward_assets.iter().enumerate() {
            if asset == staking_token {
                return Err(RewardPoolError::InvalidRewardToken);
            }
            if reward_assets.first_index_of(&asset) != Some(i as u32) {
                return Err(RewardPoolError::InvalidRewardToken);
            }
        }

        env.storage().instance().set(&STAKE_TOKEN, &staking_token);
        env.storage().instance().set(&REWARD_ASSETS, &reward_assets);
        env.storage().instance().set(&INITIALIZED, &true);
        // TOTAL_STAKED and every RewardState start at zero; absent keys read
        // back as defaults.

        roles::grant_role(&env, Role::Admin, &admin);

        events::publish_initialized(&env, admin, staking_token, reward_assets);

        Ok(())
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Stake `amount` of the staking token.
    ///
    /// Pending rewards are settled at the old balance first, so the new
    /// stake does not share in inflows recorded before it arrived.
    pub fn stake(env: Env, staker: Address, amount: i128) -> Result<(), RewardPoolError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(RewardPoolError::InvalidAmount);
        }

        Self::non_reentrant(&env, || {
            Self::accrue(&env, &staker)?;

            let stake_token = Self::stake_token(&env)?;
            let stake_client = token::Client::new(&env, &stake_token);
            if stake_client.balance(&staker) < amount {
                return Err(RewardPoolError::InsufficientBalance);
            }

            let new_stake = Self::staked_of(&env, &staker)
                .checked_add(amount)
                .ok_or(RewardPoolError::Overflow)?;
            let new_total = Self::total_staked(&env)
                .checked_add(amount)
                .ok_or(RewardPoolError::Overflow)?;
            Self::set_staked(&env, &staker, new_stake);
            env.storage().instance().set(&TOTAL_STAKED, &new_total);

            stake_client.transfer(&staker, &env.current_contract_address(), &amount);

            events::publish_staked(&env, staker.clone(), amount, new_total);
            Ok(())
        })
    }

    /// Return `amount` of staked tokens to the staker.
    pub fn withdraw(env: Env, staker: Address, amount: i128) -> Result<(), RewardPoolError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(RewardPoolError::InvalidAmount);
        }
        let prev_stake = Self::staked_of(&env, &staker);
        if amount > prev_stake {
            return Err(RewardPoolError::InsufficientStake);
        }

        Self::non_reentrant(&env, || {
            Self::accrue(&env, &staker)?;

            let new_total = Self::total_staked(&env) - amount;
            Self::set_staked(&env, &staker, prev_stake - amount);
            env.storage().instance().set(&TOTAL_STAKED, &new_total);

            let stake_token = Self::stake_token(&env)?;
            token::Client::new(&env, &stake_token).transfer(
                &env.current_contract_address(),
                &staker,
                &amount,
            );

            events::publish_withdrawn(&env, staker.clone(), amount, new_total);
            Ok(())
        })
    }

    // ── Rewards ─────────────────────────────────────────────────────────────

    /// Pay out everything the staker has accrued, across every reward asset.
    ///
    /// Returns the amount paid per asset; assets with nothing accrued are
    /// left out.
    pub fn claim_reward(env: Env, staker: Address) -> Result<Map<Address, i128>, RewardPoolError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        Self::non_reentrant(&env, || {
            Self::accrue(&env, &staker)?;

            // Zero every accrual before the first transfer goes out.
            let mut payouts: Map<Address, i128> = Map::new(&env);
            for asset in Self::reward_assets(&env).iter() {
                let mut user_state = Self::user_reward(&env, &staker, &asset);
                if user_state.accrued > 0 {
                    payouts.set(asset.clone(), user_state.accrued);
                    user_state.accrued = 0;
                    Self::set_user_reward(&env, &staker, &asset, &user_state);
                }
            }

            for (asset, amount) in payouts.iter() {
                token::Client::new(&env, &asset).transfer(
                    &env.current_contract_address(),
                    &staker,
                    &amount,
                );
                events::publish_reward_claimed(&env, staker.clone(), asset, amount);
            }

            Ok(payouts)
        })
    }

    /// Push `amount` of `asset` into the pool as reward for current stakers.
    ///
    /// The value accompanies the call: it is pulled from `distributor`. With
    /// nothing staked the inflow is queued and released by the next inflow
    /// of the same asset that finds stake present.
    pub fn add_reward(
        env: Env,
        distributor: Address,
        asset: Address,
        amount: i128,
    ) -> Result<(), RewardPoolError> {
        Self::require_initialized(&env)?;
        if !roles::require_role(&env, Role::Distributor, &distributor) {
            return Err(RewardPoolError::OnlyDistributor);
        }
        if !Self::reward_assets(&env).contains(&asset) {
            return Err(RewardPoolError::InvalidRewardToken);
        }
        if amount <= 0 {
            return Err(RewardPoolError::InvalidAmount);
        }

        Self::non_reentrant(&env, || {
            let asset_client = token::Client::new(&env, &asset);
            if asset_client.balance(&distributor) < amount {
                return Err(RewardPoolError::InsufficientBalance);
            }

            let mut state = Self::reward_state(&env, &asset);
            let applied = state
                .record_inflow(&env, amount, Self::total_staked(&env))
                .ok_or(RewardPoolError::Overflow)?;
            Self::set_reward_state(&env, &asset, &state);

            if !applied {
                log!(&env, "reward queued, nothing staked", asset, state.queued);
            }

            asset_client.transfer(&distributor, &env.current_contract_address(), &amount);

            events::publish_reward_added(
                &env,
                distributor.clone(),
                asset.clone(),
                amount,
                !applied,
                state.reward_per_unit,
            );
            Ok(())
        })
    }

    // ── Admin functions ──────────────────────────────────────────────────────

    /// Register an additional reward asset.
    pub fn add_reward_asset(env: Env, caller: Address, asset: Address) -> Result<(), RewardPoolError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;

        let mut assets = Self::reward_assets(&env);
        if assets.contains(&asset) || asset == Self::stake_token(&env)? {
            return Err(RewardPoolError::InvalidRewardToken);
        }
        assets.push_back(asset.clone());
        env.storage().instance().set(&REWARD_ASSETS, &assets);

        events::publish_reward_asset_added(&env, asset);

        Ok(())
    }

    pub fn grant_role(
        env: Env,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<(), RewardPoolError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;

        roles::grant_role(&env, role, &account);
        events::publish_role_changed(&env, role, account, true);

        Ok(())
    }

    pub fn revoke_role(
        env: Env,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<(), RewardPoolError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;

        roles::revoke_role(&env, role, &account);
        events::publish_role_changed(&env, role, account, false);

        Ok(())
    }

    // ── View functions ───────────────────────────────────────────────────────

    pub fn has_role(env: Env, role: Role, account: Address) -> bool {
        roles::has_role(&env, role, &account)
    }

    /// Return the user's current staked balance.
    pub fn get_staked(env: Env, staker: Address) -> i128 {
        Self::staked_of(&env, &staker)
    }

    /// Return the sum of all currently staked tokens.
    pub fn get_total_staked(env: Env) -> i128 {
        Self::total_staked(&env)
    }

    pub fn get_staking_token(env: Env) -> Result<Address, RewardPoolError> {
        Self::stake_token(&env)
    }

    pub fn get_reward_assets(env: Env) -> Vec<Address> {
        Self::reward_assets(&env)
    }

    pub fn get_reward_state(env: Env, asset: Address) -> RewardState {
        Self::reward_state(&env, &asset)
    }

    /// Return the user's stored snapshot for `asset`, as of their last
    /// interaction.
    pub fn get_user_reward(env: Env, staker: Address, asset: Address) -> UserRewardState {
        Self::user_reward(&env, &staker, &asset)
    }

    /// Return what `claim_reward` would pay for `asset` right now, without
    /// mutating state.
    pub fn get_pending_reward(
        env: Env,
        staker: Address,
        asset: Address,
    ) -> Result<i128, RewardPoolError> {
        let state = Self::reward_state(&env, &asset);
        let user_state = Self::user_reward(&env, &staker, &asset);

        rewards::earned(
            &env,
            Self::staked_of(&env, &staker),
            state.reward_per_unit,
            user_state.reward_per_unit_paid,
            user_state.accrued,
        )
        .ok_or(RewardPoolError::Overflow)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

impl RewardPoolContract {
    fn require_initialized(env: &Env) -> Result<(), RewardPoolError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(RewardPoolError::NotInitialized);
        }
        Ok(())
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), RewardPoolError> {
        if !roles::require_role(env, Role::Admin, caller) {
            return Err(RewardPoolError::MissingRole);
        }
        Ok(())
    }

    /// Run `op` with the pool's in-flight flag held. A nested entry fails
    /// with `Reentrant`.
    fn non_reentrant<T>(
        env: &Env,
        op: impl FnOnce() -> Result<T, RewardPoolError>,
    ) -> Result<T, RewardPoolError> {
        if !guard::enter(env) {
            return Err(RewardPoolError::Reentrant);
        }
        let result = op();
        guard::exit(env);
        result
    }

    /// Settle `user`'s pending reward for every reward asset and move their
    /// snapshots up to the current accumulators.
    fn accrue(env: &Env, user: &Address) -> Result<(), RewardPoolError> {
        let staked = Self::staked_of(env, user);

        for asset in Self::reward_assets(env).iter() {
            let state = Self::reward_state(env, &asset);
            let mut user_state = Self::user_reward(env, user, &asset);
            if user_state.reward_per_unit_paid == state.reward_per_unit {
                continue;
            }

            user_state.accrued = rewards::earned(
                env,
                staked,
                state.reward_per_unit,
                user_state.reward_per_unit_paid,
                user_state.accrued,
            )
            .ok_or(RewardPoolError::Overflow)?;
            user_state.reward_per_unit_paid = state.reward_per_unit;

            Self::set_user_reward(env, user, &asset, &user_state);
        }

        Ok(())
    }

    fn stake_token(env: &Env) -> Result<Address, RewardPoolError> {
        env.storage()
            .instance()
            .get(&STAKE_TOKEN)
            .ok_or(RewardPoolError::NotInitialized)
    }

    fn reward_assets(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&REWARD_ASSETS)
            .unwrap_or(Vec::new(env))
    }

    fn total_staked(env: &Env) -> i128 {
        env.storage().instance().get(&TOTAL_STAKED).unwrap_or(0)
    }

    fn staked_of(env: &Env, staker: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&(USER_STAKE, staker.clone()))
            .unwrap_or(0)
    }

    fn set_staked(env: &Env, staker: &Address, amount: i128) {
        let key = (USER_STAKE, staker.clone());
        env.storage().persistent().set(&key, &amount);
        env.storage()
            .persistent()
            .extend_ttl(&key, USER_TTL_THRESHOLD, USER_TTL_EXTEND_TO);
    }

    fn reward_state(env: &Env, asset: &Address) -> RewardState {
        env.storage()
            .persistent()
            .get(&(REWARD_STATE, asset.clone()))
            .unwrap_or_default()
    }

    fn set_reward_state(env: &Env, asset: &Address, state: &RewardState) {
        let key = (REWARD_STATE, asset.clone());
        env.storage().persistent().set(&key, state);
        env.storage()
            .persistent()
            .extend_ttl(&key, USER_TTL_THRESHOLD, USER_TTL_EXTEND_TO);
    }

    fn user_reward(env: &Env, user: &Address, asset: &Address) -> UserRewardState {
        env.storage()
            .persistent()
            .get(&(USER_REWARD, user.clone(), asset.clone()))
            .unwrap_or_default()
    }

    fn set_user_reward(env: &Env, user: &Address, asset: &Address, state: &UserRewardState) {
        let key = (USER_REWARD, user.clone(), asset.clone());
        env.storage().persistent().set(&key, state);
        env.storage()
            .persistent()
            .extend_ttl(&key, USER_TTL_THRESHOLD, USER_TTL_EXTEND_TO);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test;

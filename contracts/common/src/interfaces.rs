//! Client interfaces for calls between the protocol contracts.

use soroban_sdk::{contractclient, Address, Env};

/// The deposit/custody pool as seen by the withdrawal queue.
#[contractclient(name = "CustodyClient")]
pub trait CustodyInterface {
    /// Claim-token balance held by `user`.
    fn claim_balance(env: Env, user: Address) -> i128;

    /// Asset balance the custody pool can hand out right now.
    fn available_liquidity(env: Env) -> i128;

    /// Burns `amount` claim-token from `user` and returns the asset amount
    /// the burn is worth.
    fn burn_claim(env: Env, user: Address, amount: i128) -> i128;

    /// Transfers `amount` of asset to the calling queue.
    fn pull_asset(env: Env, amount: i128) -> i128;
}

/// The reward pool as seen by the custody pool and the distributor.
#[contractclient(name = "RewardPoolClient")]
pub trait RewardPoolInterface {
    fn stake(env: Env, staker: Address, amount: i128);

    fn add_reward(env: Env, distributor: Address, asset: Address, amount: i128);
}

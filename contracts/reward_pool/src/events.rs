use common::Role;
use soroban_sdk::{contracttype, symbol_short, Address, Env, Vec};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub staking_token: Address,
    pub reward_assets: Vec<Address>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakedEvent {
    pub staker: Address,
    pub amount: i128,
    pub total_staked: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub staker: Address,
    pub amount: i128,
    pub total_staked: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardClaimedEvent {
    pub staker: Address,
    pub asset: Address,
    pub amount: i128,
}

/// Emitted for every inflow. `queued` is true when nothing was staked and
/// the amount was deferred instead of moving the accumulator.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAddedEvent {
    pub distributor: Address,
    pub asset: Address,
    pub amount: i128,
    pub queued: bool,
    pub reward_per_unit: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAssetAddedEvent {
    pub asset: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleChangedEvent {
    pub role: Role,
    pub account: Address,
    pub granted: bool,
}

pub fn publish_initialized(
    env: &Env,
    admin: Address,
    staking_token: Address,
    reward_assets: Vec<Address>,
) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            staking_token,
            reward_assets,
        },
    );
}

pub fn publish_staked(env: &Env, staker: Address, amount: i128, total_staked: i128) {
    env.events().publish(
        (symbol_short!("STAKED"), staker.clone()),
        StakedEvent {
            staker,
            amount,
            total_staked,
        },
    );
}

pub fn publish_withdrawn(env: &Env, staker: Address, amount: i128, total_staked: i128) {
    env.events().publish(
        (symbol_short!("WITHDRAWN"), staker.clone()),
        WithdrawnEvent {
            staker,
            amount,
            total_staked,
        },
    );
}

pub fn publish_reward_claimed(env: &Env, staker: Address, asset: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("CLAIMED"), staker.clone(), asset.clone()),
        RewardClaimedEvent {
            staker,
            asset,
            amount,
        },
    );
}

pub fn publish_reward_added(
    env: &Env,
    distributor: Address,
    asset: Address,
    amount: i128,
    queued: bool,
    reward_per_unit: i128,
) {
    env.events().publish(
        (symbol_short!("RWD_ADD"), asset.clone()),
        RewardAddedEvent {
            distributor,
            asset,
            amount,
            queued,
            reward_per_unit,
        },
    );
}

pub fn publish_reward_asset_added(env: &Env, asset: Address) {
    env.events().publish(
        (symbol_short!("ASSET_ADD"), asset.clone()),
        RewardAssetAddedEvent { asset },
    );
}

pub fn publish_role_changed(env: &Env, role: Role, account: Address, granted: bool) {
    env.events().publish(
        (symbol_short!("ROLE"), account.clone()),
        RoleChangedEvent {
            role,
            account,
            granted,
        },
    );
}

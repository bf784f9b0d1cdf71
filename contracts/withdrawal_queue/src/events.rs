use common::Role;
use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub custody: Address,
    pub asset: Address,
    pub unlock_delay: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalRequestedEvent {
    pub nonce: u64,
    pub owner: Address,
    pub claim_amount: i128,
    pub asset_amount: i128,
    pub requested_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalUnlockedEvent {
    /// First nonce covered by this unlock.
    pub from_nonce: u64,
    /// Last nonce covered, inclusive.
    pub to_nonce: u64,
    /// Liquidity pulled from custody to cover the range.
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalCompletedEvent {
    pub nonce: u64,
    pub owner: Address,
    pub asset_amount: i128,
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
    custody: Address,
    asset: Address,
    unlock_delay: u64,
) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            custody,
            asset,
            unlock_delay,
        },
    );
}

pub fn publish_withdrawal_requested(
    env: &Env,
    nonce: u64,
    owner: Address,
    claim_amount: i128,
    asset_amount: i128,
    requested_at: u64,
) {
    env.events().publish(
        (symbol_short!("WDR_REQ"), owner.clone()),
        WithdrawalRequestedEvent {
            nonce,
            owner,
            claim_amount,
            asset_amount,
            requested_at,
        },
    );
}

pub fn publish_withdrawal_unlocked(env: &Env, from_nonce: u64, to_nonce: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("WDR_UNLK"),),
        WithdrawalUnlockedEvent {
            from_nonce,
            to_nonce,
            amount,
        },
    );
}

pub fn publish_withdrawal_completed(env: &Env, nonce: u64, owner: Address, asset_amount: i128) {
    env.events().publish(
        (symbol_short!("WDR_DONE"), owner.clone()),
        WithdrawalCompletedEvent {
            nonce,
            owner,
            asset_amount,
        },
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

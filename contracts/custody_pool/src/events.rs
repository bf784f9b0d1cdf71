use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositedEvent {
    pub user: Address,
    pub amount: i128,
    pub minted: i128,
    pub total_deposited: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimBurnedEvent {
    pub user: Address,
    pub amount: i128,
    pub asset_amount: i128,
    pub total_deposited: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidityMovedEvent {
    pub counterparty: Address,
    pub amount: i128,
}

pub fn publish_initialized(env: &Env, admin: Address) {
    env.events().publish((symbol_short!("INIT"),), admin);
}

pub fn publish_deposited(env: &Env, user: Address, amount: i128, minted: i128, total_deposited: i128) {
    env.events().publish(
        (symbol_short!("DEPOSIT"), user.clone()),
        DepositedEvent {
            user,
            amount,
            minted,
            total_deposited,
        },
    );
}

pub fn publish_claim_burned(
    env: &Env,
    user: Address,
    amount: i128,
    asset_amount: i128,
    total_deposited: i128,
) {
    env.events().publish(
        (symbol_short!("BURN"), user.clone()),
        ClaimBurnedEvent {
            user,
            amount,
            asset_amount,
            total_deposited,
        },
    );
}

/// `topic` tells pulls to the queue, delegations out and replenishments in
/// apart.
pub fn publish_liquidity_moved(env: &Env, topic: soroban_sdk::Symbol, counterparty: Address, amount: i128) {
    env.events().publish(
        (topic, counterparty.clone()),
        LiquidityMovedEvent {
            counterparty,
            amount,
        },
    );
}

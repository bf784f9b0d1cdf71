use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributedEvent {
    pub asset: Address,
    pub fee: i128,
    pub forwarded: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeChangedEvent {
    pub fee_bps: u32,
    pub fee_recipient: Address,
}

pub fn publish_distributed(env: &Env, asset: Address, fee: i128, forwarded: i128) {
    env.events().publish(
        (symbol_short!("DISTRIB"), asset.clone()),
        DistributedEvent {
            asset,
            fee,
            forwarded,
        },
    );
}

pub fn publish_fee_changed(env: &Env, fee_bps: u32, fee_recipient: Address) {
    env.events().publish(
        (symbol_short!("FEE_SET"),),
        FeeChangedEvent {
            fee_bps,
            fee_recipient,
        },
    );
}

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod events;
pub mod policy;

use common::interfaces::RewardPoolClient;
use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{
    contract, contractimpl, symbol_short, token, vec, Address, Env, IntoVal, Symbol,
};

const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");
const REWARD_POOL: Symbol = symbol_short!("RWD_POOL");
const FEE_RECIPIENT: Symbol = symbol_short!("FEE_RCPT");
const FEE_BPS: Symbol = symbol_short!("FEE_BPS");

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum DistributorError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidFee = 4,
    NothingToDistribute = 5,
}

/// Forwards whatever value lands here into a reward pool, less a flat fee.
///
/// This contract must hold the `Distributor` role on the reward pool.
#[contract]
pub struct DistributorContract;

#[contractimpl]
impl DistributorContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        reward_pool: Address,
        fee_recipient: Address,
        fee_bps: u32,
    ) -> Result<(), DistributorError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(DistributorError::AlreadyInitialized);
        }
        if fee_bps > policy::MAX_FEE_BPS {
            return Err(DistributorError::InvalidFee);
        }

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&REWARD_POOL, &reward_pool);
        env.storage().instance().set(&FEE_RECIPIENT, &fee_recipient);
        env.storage().instance().set(&FEE_BPS, &fee_bps);
        env.storage().instance().set(&INITIALIZED, &true);

        Ok(())
    }

    /// Split the contract's whole `asset` balance between the fee recipient
    /// and the reward pool. Anyone may trigger it.
    ///
    /// Returns the amount forwarded to the reward pool.
    pub fn distribute(env: Env, asset: Address) -> Result<i128, DistributorError> {
        Self::require_initialized(&env)?;

        let asset_client = token::Client::new(&env, &asset);
        let balance = asset_client.balance(&env.current_contract_address());
        if balance <= 0 {
            return Err(DistributorError::NothingToDistribute);
        }

        let (fee, forwarded) =
            policy::split(balance, Self::get_fee_bps(env.clone())).ok_or(DistributorError::InvalidFee)?;

        if fee > 0 {
            let recipient = Self::address_at(&env, &FEE_RECIPIENT)?;
            asset_client.transfer(&env.current_contract_address(), &recipient, &fee);
        }

        if forwarded > 0 {
            let reward_pool = Self::address_at(&env, &REWARD_POOL)?;

            // The pool pulls the reward from us, one level below our own
            // call, so that transfer has to be pre-authorized.
            env.authorize_as_current_contract(vec![
                &env,
                InvokerContractAuthEntry::Contract(SubContractInvocation {
                    context: ContractContext {
                        contract: asset.clone(),
                        fn_name: Symbol::new(&env, "transfer"),
                        args: (
                            env.current_contract_address(),
                            reward_pool.clone(),
                            forwarded,
                        )
                            .into_val(&env),
                    },
                    sub_invocations: vec![&env],
                }),
            ]);

            RewardPoolClient::new(&env, &reward_pool).add_reward(
                &env.current_contract_address(),
                &asset,
                &forwarded,
            );
        }

        events::publish_distributed(&env, asset, fee, forwarded);

        Ok(forwarded)
    }

    pub fn set_fee(env: Env, caller: Address, fee_bps: u32) -> Result<(), DistributorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if fee_bps > policy::MAX_FEE_BPS {
            return Err(DistributorError::InvalidFee);
        }
        env.storage().instance().set(&FEE_BPS, &fee_bps);
        events::publish_fee_changed(&env, fee_bps, Self::address_at(&env, &FEE_RECIPIENT)?);

        Ok(())
    }

    pub fn set_fee_recipient(
        env: Env,
        caller: Address,
        recipient: Address,
    ) -> Result<(), DistributorError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        env.storage().instance().set(&FEE_RECIPIENT, &recipient);
        events::publish_fee_changed(&env, Self::get_fee_bps(env.clone()), recipient);

        Ok(())
    }

    pub fn get_fee_bps(env: Env) -> u32 {
        env.storage().instance().get(&FEE_BPS).unwrap_or(0)
    }

    pub fn get_fee_recipient(env: Env) -> Result<Address, DistributorError> {
        Self::address_at(&env, &FEE_RECIPIENT)
    }

    pub fn get_reward_pool(env: Env) -> Result<Address, DistributorError> {
        Self::address_at(&env, &REWARD_POOL)
    }
}

impl DistributorContract {
    fn require_initialized(env: &Env) -> Result<(), DistributorError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(DistributorError::NotInitialized);
        }
        Ok(())
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), DistributorError> {
        if *caller != Self::address_at(env, &ADMIN)? {
            return Err(DistributorError::Unauthorized);
        }
        Ok(())
    }

    fn address_at(env: &Env, key: &Symbol) -> Result<Address, DistributorError> {
        env.storage()
            .instance()
            .get(key)
            .ok_or(DistributorError::NotInitialized)
    }
}

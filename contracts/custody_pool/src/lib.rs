#![no_std]

pub mod events;

use common::interfaces::RewardPoolClient;
use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Symbol};

/// Storage keys for the contract
const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");
const ASSET: Symbol = symbol_short!("ASSET");
const CLAIM_TOKEN: Symbol = symbol_short!("CLM_TOK");
const QUEUE: Symbol = symbol_short!("QUEUE");
const REWARD_POOL: Symbol = symbol_short!("RWD_POOL");
const TOTAL_DEPOSITED: Symbol = symbol_short!("TOT_DEP");

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum CustodyError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidAmount = 4,
    InsufficientBalance = 5,
    AmountExceedsBalance = 6,
}

/// Holds deposited asset and issues claim-token against it 1:1.
///
/// The claim-token is a Stellar asset contract administered by this pool.
/// Only the registered withdrawal queue may burn claims or pull liquidity.
#[contract]
pub struct CustodyPoolContract;

#[contractimpl]
impl CustodyPoolContract {
    /// Initialize the pool. `claim_token` must already name this contract as
    /// its admin, and its issuer must have clawback enabled before any claim
    /// is minted.
    pub fn initialize(
        env: Env,
        admin: Address,
        asset: Address,
        claim_token: Address,
        withdrawal_queue: Address,
        reward_pool: Address,
    ) -> Result<(), CustodyError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(CustodyError::AlreadyInitialized);
        }

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&ASSET, &asset);
        env.storage().instance().set(&CLAIM_TOKEN, &claim_token);
        env.storage().instance().set(&QUEUE, &withdrawal_queue);
        env.storage().instance().set(&REWARD_POOL, &reward_pool);
        env.storage().instance().set(&INITIALIZED, &true);

        events::publish_initialized(&env, admin);

        Ok(())
    }

    /// Deposit `amount` of asset and receive the same amount of claim-token.
    pub fn deposit(env: Env, user: Address, amount: i128) -> Result<i128, CustodyError> {
        Self::require_initialized(&env)?;
        user.require_auth();

        Self::deposit_for(&env, &user, amount)
    }

    /// Deposit, then stake the minted claim-token into the reward pool for
    /// `user`.
    pub fn deposit_and_stake(env: Env, user: Address, amount: i128) -> Result<i128, CustodyError> {
        Self::require_initialized(&env)?;
        user.require_auth();

        let minted = Self::deposit_for(&env, &user, amount)?;
        let reward_pool = Self::address_at(&env, &REWARD_POOL)?;
        RewardPoolClient::new(&env, &reward_pool).stake(&user, &minted);

        Ok(minted)
    }

    /// Burn `amount` of `user`'s claim-token on behalf of the withdrawal
    /// queue. Returns the asset amount the burned claim is worth.
    ///
    /// The claim is clawed back by this pool, so no signature from `user`
    /// is needed below the queue's own call.
    pub fn burn_claim(env: Env, user: Address, amount: i128) -> Result<i128, CustodyError> {
        Self::require_initialized(&env)?;
        Self::require_queue(&env)?;

        if amount <= 0 {
            return Err(CustodyError::InvalidAmount);
        }
        let claim_token = Self::address_at(&env, &CLAIM_TOKEN)?;
        if token::Client::new(&env, &claim_token).balance(&user) < amount {
            return Err(CustodyError::InsufficientBalance);
        }

        let total = Self::total_deposited(env.clone())
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientBalance)?;
        env.storage().instance().set(&TOTAL_DEPOSITED, &total);

        token::StellarAssetClient::new(&env, &claim_token).clawback(&user, &amount);

        events::publish_claim_burned(&env, user, amount, amount, total);

        Ok(amount)
    }

    /// Hand `amount` of liquid asset to the withdrawal queue. All or
    /// nothing.
    pub fn pull_asset(env: Env, amount: i128) -> Result<i128, CustodyError> {
        Self::require_initialized(&env)?;
        let queue = Self::require_queue(&env)?;

        if amount <= 0 {
            return Err(CustodyError::InvalidAmount);
        }
        if Self::available_liquidity(env.clone()) < amount {
            return Err(CustodyError::AmountExceedsBalance);
        }

        Self::asset_client(&env)?.transfer(&env.current_contract_address(), &queue, &amount);

        events::publish_liquidity_moved(&env, symbol_short!("PULL"), queue, amount);

        Ok(amount)
    }

    /// Move liquid asset out of custody, e.g. to a validator operator.
    pub fn delegate(env: Env, caller: Address, to: Address, amount: i128) -> Result<(), CustodyError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if amount <= 0 {
            return Err(CustodyError::InvalidAmount);
        }
        if Self::available_liquidity(env.clone()) < amount {
            return Err(CustodyError::AmountExceedsBalance);
        }

        Self::asset_client(&env)?.transfer(&env.current_contract_address(), &to, &amount);

        events::publish_liquidity_moved(&env, symbol_short!("DELEGATE"), to, amount);

        Ok(())
    }

    /// Return previously delegated liquidity to custody.
    pub fn replenish(env: Env, from: Address, amount: i128) -> Result<(), CustodyError> {
        Self::require_initialized(&env)?;
        from.require_auth();

        if amount <= 0 {
            return Err(CustodyError::InvalidAmount);
        }

        Self::asset_client(&env)?.transfer(&from, &env.current_contract_address(), &amount);

        events::publish_liquidity_moved(&env, symbol_short!("REPLENISH"), from, amount);

        Ok(())
    }

    /// Claim-token balance of `user`.
    pub fn claim_balance(env: Env, user: Address) -> i128 {
        match Self::address_at(&env, &CLAIM_TOKEN) {
            Ok(claim) => token::Client::new(&env, &claim).balance(&user),
            Err(_) => 0,
        }
    }

    /// Asset balance held by the pool right now.
    pub fn available_liquidity(env: Env) -> i128 {
        match Self::asset_client(&env) {
            Ok(asset) => asset.balance(&env.current_contract_address()),
            Err(_) => 0,
        }
    }

    /// Asset deposited and not yet withdrawn through the queue.
    pub fn total_deposited(env: Env) -> i128 {
        env.storage().instance().get(&TOTAL_DEPOSITED).unwrap_or(0)
    }

    pub fn get_admin(env: Env) -> Result<Address, CustodyError> {
        Self::address_at(&env, &ADMIN)
    }

    pub fn get_claim_token(env: Env) -> Result<Address, CustodyError> {
        Self::address_at(&env, &CLAIM_TOKEN)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }
}

impl CustodyPoolContract {
    fn require_initialized(env: &Env) -> Result<(), CustodyError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(CustodyError::NotInitialized);
        }
        Ok(())
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), CustodyError> {
        let admin = Self::address_at(env, &ADMIN)?;
        if *caller != admin {
            return Err(CustodyError::Unauthorized);
        }
        Ok(())
    }

    /// Only the registered queue contract passes; it authorizes simply by
    /// being the direct caller.
    fn require_queue(env: &Env) -> Result<Address, CustodyError> {
        let queue = Self::address_at(env, &QUEUE)?;
        queue.require_auth();
        Ok(queue)
    }

    fn address_at(env: &Env, key: &Symbol) -> Result<Address, CustodyError> {
        env.storage()
            .instance()
            .get(key)
            .ok_or(CustodyError::NotInitialized)
    }

    fn asset_client<'a>(env: &Env) -> Result<token::Client<'a>, CustodyError> {
        Ok(token::Client::new(env, &Self::address_at(env, &ASSET)?))
    }

    fn deposit_for(env: &Env, user: &Address, amount: i128) -> Result<i128, CustodyError> {
        if amount <= 0 {
            return Err(CustodyError::InvalidAmount);
        }
        let asset = Self::asset_client(env)?;
        if asset.balance(user) < amount {
            return Err(CustodyError::InsufficientBalance);
        }

        let total = env
            .storage()
            .instance()
            .get::<_, i128>(&TOTAL_DEPOSITED)
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(CustodyError::InvalidAmount)?;
        env.storage().instance().set(&TOTAL_DEPOSITED, &total);

        asset.transfer(user, &env.current_contract_address(), &amount);
        let claim = Self::address_at(env, &CLAIM_TOKEN)?;
        token::StellarAssetClient::new(env, &claim).mint(user, &amount);

        events::publish_deposited(env, user.clone(), amount, amount, total);

        Ok(amount)
    }
}

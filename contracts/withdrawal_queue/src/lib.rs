#![no_std]

pub mod events;
pub mod queue;

use common::interfaces::CustodyClient;
use common::{guard, roles, Role};
use soroban_sdk::{contract, contractimpl, log, symbol_short, token, Address, Env, Symbol};

use queue::{RequestStatus, WithdrawalRequest};

/// Minimum time between creating a request and paying it out: 14 days.
pub const DEFAULT_UNLOCK_DELAY: u64 = 14 * 24 * 60 * 60;

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const CUSTODY: Symbol = symbol_short!("CUSTODY");
const ASSET: Symbol = symbol_short!("ASSET");
const UNLOCK_DELAY: Symbol = symbol_short!("UNLK_DLY");
/// Smallest nonce whose liquidity is not provisioned yet.
const NEXT_UNLOCK: Symbol = symbol_short!("NXT_UNLK");
/// Asset held for unlocked, unfulfilled requests.
const RESERVED: Symbol = symbol_short!("RESERVED");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum WithdrawalQueueError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    MissingRole = 3,
    InvalidAmount = 4,
    InsufficientBalance = 5,
    InvalidFirstExcludedNonce = 6,
    UnknownNonce = 7,
    AmountExceedsBalance = 8,
    NotUnlockedYet = 9,
    NotReadyToComplete = 10,
    NoWithdrawRequest = 11,
    RequestNotFound = 12,
    Reentrant = 13,
    Overflow = 14,
}

// ── Contract ─────────────────────────────────────────────────────────────────

/// Delayed, batched conversion of claim-token into asset.
///
/// Requests are numbered from 1. An admin provisions liquidity for a
/// contiguous range of nonces in one pull from custody, which advances the
/// unlock cursor; each owner then collects their requests oldest first once
/// the unlock delay has passed.
#[contract]
pub struct WithdrawalQueueContract;

#[contractimpl]
impl WithdrawalQueueContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the queue.
    ///
    /// * `custody`      – pool that burns claim-token and supplies liquidity.
    /// * `asset`        – token paid out on completion.
    /// * `unlock_delay` – seconds between request and payout eligibility.
    pub fn initialize(
        env: Env,
        admin: Address,
        custody: Address,
        asset: Address,
        unlock_delay: u64,
    ) -> Result<(), WithdrawalQueueError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(WithdrawalQueueError::AlreadyInitialized);
        }

        env.storage().instance().set(&CUSTODY, &custody);
        env.storage().instance().set(&ASSET, &asset);
        env.storage().instance().set(&UNLOCK_DELAY, &unlock_delay);
        env.storage().instance().set(&NEXT_UNLOCK, &1u64);
        env.storage().instance().set(&INITIALIZED, &true);

        roles::grant_role(&env, Role::Admin, &admin);

        events::publish_initialized(&env, admin, custody, asset, unlock_delay);

        Ok(())
    }

    // ── Requests ────────────────────────────────────────────────────────────

    /// Burn `amount` of the user's claim-token and queue the asset payout.
    ///
    /// Returns the nonce assigned to the new request.
    pub fn initiate_withdrawal(
        env: Env,
        user: Address,
        amount: i128,
    ) -> Result<u64, WithdrawalQueueError> {
        Self::require_initialized(&env)?;
        user.require_auth();

        if amount <= 0 {
            return Err(WithdrawalQueueError::InvalidAmount);
        }

        let custody = Self::custody(&env)?;
        if custody.claim_balance(&user) < amount {
            return Err(WithdrawalQueueError::InsufficientBalance);
        }

        Self::non_reentrant(&env, || {
            let asset_amount = custody.burn_claim(&user, &amount);

            let nonce = queue::next_nonce(&env);
            let now = env.ledger().timestamp();
            let request = WithdrawalRequest {
                nonce,
                owner: user.clone(),
                claim_amount: amount,
                asset_amount,
                requested_at: now,
                fulfilled: false,
            };
            queue::store_request(&env, &request);

            let running = queue::cumulative(&env, nonce - 1)
                .checked_add(asset_amount)
                .ok_or(WithdrawalQueueError::Overflow)?;
            queue::set_cumulative(&env, nonce, running);
            queue::push_user_request(&env, &user, nonce);

            events::publish_withdrawal_requested(
                &env,
                nonce,
                user.clone(),
                amount,
                asset_amount,
                now,
            );

            Ok(nonce)
        })
    }

    /// Liquidity needed to move the unlock cursor past `upto_nonce`.
    ///
    /// Covers every request from the current cursor through `upto_nonce`
    /// inclusive.
    pub fn calculate_unlock_nonce(env: Env, upto_nonce: u64) -> Result<i128, WithdrawalQueueError> {
        Self::require_initialized(&env)?;
        let first = Self::next_unlock(&env);
        Self::check_unlock_range(&env, first, upto_nonce)?;

        Ok(queue::cumulative(&env, upto_nonce) - queue::cumulative(&env, first - 1))
    }

    /// Provision liquidity for every request up to `upto_nonce` in one pull
    /// from custody and advance the unlock cursor past it.
    ///
    /// Returns the amount pulled.
    pub fn unlock_withdrawal(
        env: Env,
        caller: Address,
        upto_nonce: u64,
    ) -> Result<i128, WithdrawalQueueError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;

        let first = Self::next_unlock(&env);
        Self::check_unlock_range(&env, first, upto_nonce)?;
        let needed = queue::cumulative(&env, upto_nonce) - queue::cumulative(&env, first - 1);

        let custody = Self::custody(&env)?;
        if custody.available_liquidity() < needed {
            return Err(WithdrawalQueueError::AmountExceedsBalance);
        }

        Self::non_reentrant(&env, || {
            let reserved = Self::reserved(&env)
                .checked_add(needed)
                .ok_or(WithdrawalQueueError::Overflow)?;
            env.storage().instance().set(&NEXT_UNLOCK, &(upto_nonce + 1));
            env.storage().instance().set(&RESERVED, &reserved);

            let received = custody.pull_asset(&needed);
            if received != needed {
                // Returning an error rolls the cursor move back with it.
                return Err(WithdrawalQueueError::AmountExceedsBalance);
            }

            log!(&env, "unlocked withdrawals", first, upto_nonce, needed);
            events::publish_withdrawal_unlocked(&env, first, upto_nonce, needed);

            Ok(needed)
        })
    }

    /// Pay out the caller's oldest outstanding request.
    ///
    /// Settles exactly one request per call; returns the asset amount paid.
    pub fn complete_withdrawal(env: Env, user: Address) -> Result<i128, WithdrawalQueueError> {
        Self::require_initialized(&env)?;
        user.require_auth();

        let head = queue::user_head(&env, &user);
        let nonce = queue::user_request_at(&env, &user, head)
            .ok_or(WithdrawalQueueError::NoWithdrawRequest)?;
        let mut request =
            queue::get_request(&env, nonce).ok_or(WithdrawalQueueError::RequestNotFound)?;

        match request.status(
            Self::next_unlock(&env),
            env.ledger().timestamp(),
            Self::unlock_delay(&env),
        ) {
            RequestStatus::Pending => return Err(WithdrawalQueueError::NotUnlockedYet),
            RequestStatus::Unlocked => return Err(WithdrawalQueueError::NotReadyToComplete),
            RequestStatus::Fulfilled => return Err(WithdrawalQueueError::NoWithdrawRequest),
            RequestStatus::Matured => {}
        }

        Self::non_reentrant(&env, || {
            // Fulfilled before the transfer goes out.
            request.fulfilled = true;
            queue::store_request(&env, &request);
            queue::set_user_head(&env, &user, head + 1);
            let reserved = Self::reserved(&env) - request.asset_amount;
            env.storage().instance().set(&RESERVED, &reserved);

            let asset = Self::asset(&env)?;
            token::Client::new(&env, &asset).transfer(
                &env.current_contract_address(),
                &user,
                &request.asset_amount,
            );

            events::publish_withdrawal_completed(
                &env,
                request.nonce,
                user.clone(),
                request.asset_amount,
            );

            Ok(request.asset_amount)
        })
    }

    // ── Admin functions ──────────────────────────────────────────────────────

    pub fn grant_role(
        env: Env,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<(), WithdrawalQueueError> {
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
    ) -> Result<(), WithdrawalQueueError> {
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

    /// Number of requests the user has ever created, fulfilled ones included.
    pub fn get_user_withdraw_request_length(env: Env, user: Address) -> u32 {
        queue::user_request_count(&env, &user)
    }

    /// The user's `index`-th request, oldest first.
    pub fn get_user_withdraw_request(
        env: Env,
        user: Address,
        index: u32,
    ) -> Result<WithdrawalRequest, WithdrawalQueueError> {
        let nonce = queue::user_request_at(&env, &user, index)
            .ok_or(WithdrawalQueueError::RequestNotFound)?;
        queue::get_request(&env, nonce).ok_or(WithdrawalQueueError::RequestNotFound)
    }

    /// Requests the user still has to complete.
    pub fn get_pending_request_count(env: Env, user: Address) -> u32 {
        queue::user_request_count(&env, &user).saturating_sub(queue::user_head(&env, &user))
    }

    pub fn get_request(env: Env, nonce: u64) -> Result<WithdrawalRequest, WithdrawalQueueError> {
        queue::get_request(&env, nonce).ok_or(WithdrawalQueueError::RequestNotFound)
    }

    pub fn get_request_status(env: Env, nonce: u64) -> Result<RequestStatus, WithdrawalQueueError> {
        let request =
            queue::get_request(&env, nonce).ok_or(WithdrawalQueueError::RequestNotFound)?;
        Ok(request.status(
            Self::next_unlock(&env),
            env.ledger().timestamp(),
            Self::unlock_delay(&env),
        ))
    }

    /// Smallest nonce whose liquidity has not been provisioned.
    pub fn next_unlock_nonce(env: Env) -> u64 {
        Self::next_unlock(&env)
    }

    /// Nonce the next request will receive.
    pub fn get_next_nonce(env: Env) -> u64 {
        queue::peek_next_nonce(&env)
    }

    pub fn get_unlock_delay(env: Env) -> u64 {
        Self::unlock_delay(&env)
    }

    /// Asset held for requests that are unlocked but not yet completed.
    pub fn get_reserved_liquidity(env: Env) -> i128 {
        Self::reserved(&env)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

impl WithdrawalQueueContract {
    fn require_initialized(env: &Env) -> Result<(), WithdrawalQueueError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(WithdrawalQueueError::NotInitialized);
        }
        Ok(())
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), WithdrawalQueueError> {
        if !roles::require_role(env, Role::Admin, caller) {
            return Err(WithdrawalQueueError::MissingRole);
        }
        Ok(())
    }

    fn non_reentrant<T>(
        env: &Env,
        op: impl FnOnce() -> Result<T, WithdrawalQueueError>,
    ) -> Result<T, WithdrawalQueueError> {
        if !guard::enter(env) {
            return Err(WithdrawalQueueError::Reentrant);
        }
        let result = op();
        guard::exit(env);
        result
    }

    /// An unlock range must start at the cursor and end on an existing
    /// request.
    fn check_unlock_range(env: &Env, first: u64, upto_nonce: u64) -> Result<(), WithdrawalQueueError> {
        if upto_nonce < first {
            return Err(WithdrawalQueueError::InvalidFirstExcludedNonce);
        }
        if upto_nonce >= queue::peek_next_nonce(env) {
            return Err(WithdrawalQueueError::UnknownNonce);
        }
        Ok(())
    }

    fn custody(env: &Env) -> Result<CustodyClient<'_>, WithdrawalQueueError> {
        let custody: Address = env
            .storage()
            .instance()
            .get(&CUSTODY)
            .ok_or(WithdrawalQueueError::NotInitialized)?;
        Ok(CustodyClient::new(env, &custody))
    }

    fn asset(env: &Env) -> Result<Address, WithdrawalQueueError> {
        env.storage()
            .instance()
            .get(&ASSET)
            .ok_or(WithdrawalQueueError::NotInitialized)
    }

    fn next_unlock(env: &Env) -> u64 {
        env.storage().instance().get(&NEXT_UNLOCK).unwrap_or(1)
    }

    fn unlock_delay(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&UNLOCK_DELAY)
            .unwrap_or(DEFAULT_UNLOCK_DELAY)
    }

    fn reserved(env: &Env) -> i128 {
        env.storage().instance().get(&RESERVED).unwrap_or(0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

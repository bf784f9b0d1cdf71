use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

// ── Storage key constants ───────────────────────────────────────────────────

/// Last nonce handed out. Nonces are 1-based, so zero means "none yet".
const NONCE_CTR: Symbol = symbol_short!("NONCE_CTR");

const REQUEST: Symbol = symbol_short!("WDR_REQ");
const CUMULATIVE: Symbol = symbol_short!("WDR_CUM");
/// `(USR_REQ, user, index)` -> nonce of the user's `index`-th request.
const USER_REQUEST: Symbol = symbol_short!("USR_REQ");
const USER_COUNT: Symbol = symbol_short!("USR_LEN");
const USER_HEAD: Symbol = symbol_short!("USR_HEAD");

const REQUEST_TTL_THRESHOLD: u32 = 5_184_000; // ~60 days
const REQUEST_TTL_EXTEND_TO: u32 = 10_368_000; // ~120 days

// ── Types ───────────────────────────────────────────────────────────────────

/// A queued conversion of burned claim-token into a future asset payout.
///
/// Only `fulfilled` ever changes after creation, which keeps the audit
/// record intact once the payout has gone out.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalRequest {
    pub nonce: u64,
    pub owner: Address,
    /// Claim-token burned when the request was created.
    pub claim_amount: i128,
    /// Asset owed to `owner` once the request is unlocked and matured.
    pub asset_amount: i128,
    /// Ledger timestamp of creation; the unlock delay counts from here.
    pub requested_at: u64,
    pub fulfilled: bool,
}

/// Where a request sits in its lifecycle. Derived at read time from the
/// unlock cursor and the ledger clock; never stored.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestStatus {
    /// Liquidity not provisioned yet.
    Pending,
    /// Liquidity provisioned, delay still running.
    Unlocked,
    /// Ready to be paid out by `complete_withdrawal`.
    Matured,
    Fulfilled,
}

impl WithdrawalRequest {
    pub fn matures_at(&self, unlock_delay: u64) -> u64 {
        self.requested_at.saturating_add(unlock_delay)
    }

    pub fn status(&self, next_unlock_nonce: u64, now: u64, unlock_delay: u64) -> RequestStatus {
        if self.fulfilled {
            RequestStatus::Fulfilled
        } else if self.nonce >= next_unlock_nonce {
            RequestStatus::Pending
        } else if now < self.matures_at(unlock_delay) {
            RequestStatus::Unlocked
        } else {
            RequestStatus::Matured
        }
    }
}

// ── Storage helpers ─────────────────────────────────────────────────────────

fn request_key(nonce: u64) -> (Symbol, u64) {
    (REQUEST, nonce)
}

fn extend<K>(env: &Env, key: &K)
where
    K: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, REQUEST_TTL_THRESHOLD, REQUEST_TTL_EXTEND_TO);
}

/// Persist a `WithdrawalRequest`.
pub fn store_request(env: &Env, request: &WithdrawalRequest) {
    let key = request_key(request.nonce);
    env.storage().persistent().set(&key, request);
    extend(env, &key);
}

/// Retrieve a `WithdrawalRequest` by nonce, returning `None` when not found.
pub fn get_request(env: &Env, nonce: u64) -> Option<WithdrawalRequest> {
    env.storage().persistent().get(&request_key(nonce))
}

/// The nonce the next request will receive.
pub fn peek_next_nonce(env: &Env) -> u64 {
    let current: u64 = env.storage().instance().get(&NONCE_CTR).unwrap_or(0u64);
    current.saturating_add(1)
}

/// Allocate and return the next nonce (1-based, strictly increasing).
pub fn next_nonce(env: &Env) -> u64 {
    let next = peek_next_nonce(env);
    env.storage().instance().set(&NONCE_CTR, &next);
    next
}

/// Sum of `asset_amount` over nonces `1..=nonce`. Zero for nonce 0.
pub fn cumulative(env: &Env, nonce: u64) -> i128 {
    if nonce == 0 {
        return 0;
    }
    env.storage()
        .persistent()
        .get(&(CUMULATIVE, nonce))
        .unwrap_or(0)
}

pub fn set_cumulative(env: &Env, nonce: u64, total: i128) {
    let key = (CUMULATIVE, nonce);
    env.storage().persistent().set(&key, &total);
    extend(env, &key);
}

/// Number of requests `user` has ever created.
pub fn user_request_count(env: &Env, user: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&(USER_COUNT, user.clone()))
        .unwrap_or(0)
}

/// Nonce of the user's `index`-th request, oldest first.
pub fn user_request_at(env: &Env, user: &Address, index: u32) -> Option<u64> {
    env.storage()
        .persistent()
        .get(&(USER_REQUEST, user.clone(), index))
}

/// Append `nonce` to the user's index. Touches two fixed-size entries no
/// matter how many requests the user already has.
pub fn push_user_request(env: &Env, user: &Address, nonce: u64) {
    let index = user_request_count(env, user);

    let entry_key = (USER_REQUEST, user.clone(), index);
    env.storage().persistent().set(&entry_key, &nonce);
    extend(env, &entry_key);

    let count_key = (USER_COUNT, user.clone());
    env.storage().persistent().set(&count_key, &(index + 1));
    extend(env, &count_key);
}

/// Index of the user's oldest request not yet fulfilled.
pub fn user_head(env: &Env, user: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&(USER_HEAD, user.clone()))
        .unwrap_or(0)
}

pub fn set_user_head(env: &Env, user: &Address, head: u32) {
    let key = (USER_HEAD, user.clone());
    env.storage().persistent().set(&key, &head);
    extend(env, &key);
}

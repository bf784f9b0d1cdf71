use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

const ROLE: Symbol = symbol_short!("ROLE");
const ROLE_TTL_THRESHOLD: u32 = 5_184_000; // ~60 days
const ROLE_TTL_EXTEND_TO: u32 = 10_368_000; // ~120 days

/// Capabilities checked by the role-gated entry points.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Configures the contract, manages roles and advances the unlock cursor.
    Admin,
    /// Allowed to push reward inflows into a reward pool.
    Distributor,
}

fn role_key(role: Role, account: &Address) -> (Symbol, Role, Address) {
    (ROLE, role, account.clone())
}

fn extend_role_ttl(env: &Env, key: &(Symbol, Role, Address)) {
    env.storage()
        .persistent()
        .extend_ttl(key, ROLE_TTL_THRESHOLD, ROLE_TTL_EXTEND_TO);
}

/// Grants `role` to `account`. Granting an already held role is a no-op.
pub fn grant_role(env: &Env, role: Role, account: &Address) {
    let key = role_key(role, account);
    env.storage().persistent().set(&key, &true);
    extend_role_ttl(env, &key);
}

/// Removes `role` from `account`.
pub fn revoke_role(env: &Env, role: Role, account: &Address) {
    env.storage().persistent().remove(&role_key(role, account));
}

/// Returns whether `account` currently holds `role`.
pub fn has_role(env: &Env, role: Role, account: &Address) -> bool {
    let key = role_key(role, account);
    let held = env.storage().persistent().get(&key).unwrap_or(false);
    if held {
        extend_role_ttl(env, &key);
    }
    held
}

/// Authenticates `account` and checks that it holds `role`.
///
/// Returns `false` when the role is missing; callers map that to their own
/// error type.
pub fn require_role(env: &Env, role: Role, account: &Address) -> bool {
    account.require_auth();
    has_role(env, role, account)
}

use soroban_sdk::{symbol_short, Env, Symbol};

const LOCKED: Symbol = symbol_short!("LOCKED");

/// Marks the contract as executing an operation that moves assets out.
///
/// Returns `false` if another such operation is already in flight, in which
/// case nothing is written.
pub fn enter(env: &Env) -> bool {
    if env.storage().instance().has(&LOCKED) {
        return false;
    }
    env.storage().instance().set(&LOCKED, &true);
    true
}

/// Clears the in-flight flag set by [`enter`].
pub fn exit(env: &Env) {
    env.storage().instance().remove(&LOCKED);
}

pub fn is_locked(env: &Env) -> bool {
    env.storage().instance().has(&LOCKED)
}

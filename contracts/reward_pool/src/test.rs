extern crate std;

use super::*;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rewards::PRECISION;
use soroban_sdk::testutils::{Address as _, Events};
use soroban_sdk::{token, vec, IntoVal, TryIntoVal, Val};

/// 1 token with 7 decimals.
const UNIT: i128 = 10_000_000;

struct Setup<'a> {
    env: Env,
    pool: RewardPoolContractClient<'a>,
    admin: Address,
    distributor: Address,
    stake_token: token::Client<'a>,
    stake_mint: token::StellarAssetClient<'a>,
    reward: token::Client<'a>,
    reward_mint: token::StellarAssetClient<'a>,
}

fn create_token<'a>(
    env: &Env,
    admin: &Address,
) -> (token::Client<'a>, token::StellarAssetClient<'a>) {
    let sac = env.register_stellar_asset_contract_v2(admin.clone());
    (
        token::Client::new(env, &sac.address()),
        token::StellarAssetClient::new(env, &sac.address()),
    )
}

fn setup<'a>() -> Setup<'a> {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let distributor = Address::generate(&env);
    let (stake_token, stake_mint) = create_token(&env, &admin);
    let (reward, reward_mint) = create_token(&env, &admin);

    let contract_id = env.register(RewardPoolContract, ());
    let pool = RewardPoolContractClient::new(&env, &contract_id);
    pool.initialize(&admin, &stake_token.address, &vec![&env, reward.address.clone()]);
    pool.grant_role(&admin, &Role::Distributor, &distributor);

    Setup {
        env,
        pool,
        admin,
        distributor,
        stake_token,
        stake_mint,
        reward,
        reward_mint,
    }
}

impl Setup<'_> {
    fn staker(&self, balance: i128) -> Address {
        let staker = Address::generate(&self.env);
        self.stake_mint.mint(&staker, &balance);
        staker
    }

    fn add_reward(&self, amount: i128) {
        self.reward_mint.mint(&self.distributor, &amount);
        self.pool
            .add_reward(&self.distributor, &self.reward.address, &amount);
    }
}

/// Payload of the most recent event whose first topic is `name`.
fn last_event(env: &Env, name: Symbol) -> Option<Val> {
    let mut found = None;
    for (_, topics, data) in env.events().all().iter() {
        let Some(first) = topics.get(0) else {
            continue;
        };
        let first: Result<Symbol, _> = first.try_into_val(env);
        if let Ok(first) = first {
            if first == name {
                found = Some(data);
            }
        }
    }
    found
}

// ── Initialisation ──────────────────────────────────────────────────────────

#[test]
fn test_initialize() {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let (stake_token, _) = create_token(&env, &admin);
    let (reward, _) = create_token(&env, &admin);

    let contract_id = env.register(RewardPoolContract, ());
    let pool = RewardPoolContractClient::new(&env, &contract_id);
    let assets = vec![&env, reward.address.clone()];
    pool.initialize(&admin, &stake_token.address, &assets);

    let payload: events::InitializedEvent = last_event(&env, symbol_short!("INIT"))
        .expect("INIT event not found")
        .try_into_val(&env)
        .unwrap();
    assert_eq!(payload.admin, admin);
    assert_eq!(payload.reward_assets, assets);

    assert!(pool.is_initialized());
    assert!(pool.has_role(&Role::Admin, &admin));
    assert!(!pool.has_role(&Role::Distributor, &admin));
    assert_eq!(pool.get_staking_token(), stake_token.address);
    assert_eq!(pool.get_reward_assets(), assets);
    assert_eq!(pool.get_total_staked(), 0);
}

#[test]
fn test_initialize_twice_fails() {
    let s = setup();
    let result = s.pool.try_initialize(
        &s.admin,
        &s.stake_token.address,
        &vec![&s.env, s.reward.address.clone()],
    );
    assert_eq!(result, Err(Ok(RewardPoolError::AlreadyInitialized)));
}

#[test]
fn test_initialize_rejects_bad_reward_assets() {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let (stake_token, _) = create_token(&env, &admin);
    let (reward, _) = create_token(&env, &admin);
    let contract_id = env.register(RewardPoolContract, ());
    let pool = RewardPoolContractClient::new(&env, &contract_id);

    let empty: Vec<Address> = Vec::new(&env);
    assert_eq!(
        pool.try_initialize(&admin, &stake_token.address, &empty),
        Err(Ok(RewardPoolError::InvalidRewardToken))
    );
    assert_eq!(
        pool.try_initialize(
            &admin,
            &stake_token.address,
            &vec![&env, stake_token.address.clone()]
        ),
        Err(Ok(RewardPoolError::InvalidRewardToken))
    );
    assert_eq!(
        pool.try_initialize(
            &admin,
            &stake_token.address,
            &vec![&env, reward.address.clone(), reward.address.clone()]
        ),
        Err(Ok(RewardPoolError::InvalidRewardToken))
    );
    assert!(!pool.is_initialized());
}

#[test]
fn test_calls_before_initialize_fail() {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(RewardPoolContract, ());
    let pool = RewardPoolContractClient::new(&env, &contract_id);
    let user = Address::generate(&env);

    assert_eq!(
        pool.try_stake(&user, &UNIT),
        Err(Ok(RewardPoolError::NotInitialized))
    );
    assert_eq!(
        pool.try_claim_reward(&user),
        Err(Ok(RewardPoolError::NotInitialized))
    );
}

// ── Staking ─────────────────────────────────────────────────────────────────

#[test]
fn test_stake_and_withdraw() {
    let s = setup();
    let staker = s.staker(5 * UNIT);

    s.pool.stake(&staker, &(3 * UNIT));
    let payload: events::StakedEvent = last_event(&s.env, symbol_short!("STAKED"))
        .expect("STAKED event not found")
        .try_into_val(&s.env)
        .unwrap();
    assert_eq!(payload.staker, staker);
    assert_eq!(payload.amount, 3 * UNIT);
    assert_eq!(payload.total_staked, 3 * UNIT);

    assert_eq!(s.pool.get_staked(&staker), 3 * UNIT);
    assert_eq!(s.pool.get_total_staked(), 3 * UNIT);
    assert_eq!(s.stake_token.balance(&staker), 2 * UNIT);
    assert_eq!(s.stake_token.balance(&s.pool.address), 3 * UNIT);

    s.pool.withdraw(&staker, &UNIT);
    assert_eq!(s.pool.get_staked(&staker), 2 * UNIT);
    assert_eq!(s.pool.get_total_staked(), 2 * UNIT);
    assert_eq!(s.stake_token.balance(&staker), 3 * UNIT);
}

#[test]
fn test_stake_rejects_invalid_amounts() {
    let s = setup();
    let staker = s.staker(UNIT);

    assert_eq!(
        s.pool.try_stake(&staker, &0),
        Err(Ok(RewardPoolError::InvalidAmount))
    );
    assert_eq!(
        s.pool.try_stake(&staker, &-1),
        Err(Ok(RewardPoolError::InvalidAmount))
    );
    assert_eq!(
        s.pool.try_stake(&staker, &(UNIT + 1)),
        Err(Ok(RewardPoolError::InsufficientBalance))
    );
    assert_eq!(s.pool.get_total_staked(), 0);
}

#[test]
fn test_withdraw_more_than_stake_fails() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);

    assert_eq!(
        s.pool.try_withdraw(&staker, &(UNIT + 1)),
        Err(Ok(RewardPoolError::InsufficientStake))
    );
    assert_eq!(
        s.pool.try_withdraw(&staker, &0),
        Err(Ok(RewardPoolError::InvalidAmount))
    );
    assert_eq!(s.pool.get_staked(&staker), UNIT);
}

// ── Rewards ─────────────────────────────────────────────────────────────────

#[test]
fn test_single_staker_receives_whole_reward() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);

    s.add_reward(UNIT);

    let state = s.pool.get_reward_state(&s.reward.address);
    assert_eq!(state.reward_per_unit, PRECISION);
    assert_eq!(state.queued, 0);
    assert_eq!(state.total_distributed, UNIT);
    assert_eq!(s.pool.get_pending_reward(&staker, &s.reward.address), UNIT);

    let paid = s.pool.claim_reward(&staker);
    assert_eq!(paid.get(s.reward.address.clone()), Some(UNIT));
    assert_eq!(s.reward.balance(&staker), UNIT);
    assert_eq!(s.pool.get_pending_reward(&staker, &s.reward.address), 0);

    let user_state = s.pool.get_user_reward(&staker, &s.reward.address);
    assert_eq!(user_state.accrued, 0);
    assert_eq!(user_state.reward_per_unit_paid, PRECISION);
}

#[test]
fn test_large_inflows_keep_principal_withdrawable() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);

    // 18-decimal reward asset: 200 tokens over a 7-decimal stake.
    let inflow = 100 * 10i128.pow(18);
    s.add_reward(inflow);
    s.add_reward(inflow);
    s.add_reward(2 * inflow);

    assert_eq!(
        s.pool.get_pending_reward(&staker, &s.reward.address),
        4 * inflow
    );

    s.pool.withdraw(&staker, &UNIT);
    assert_eq!(s.stake_token.balance(&staker), UNIT);

    let paid = s.pool.claim_reward(&staker);
    assert_eq!(paid.get(s.reward.address.clone()), Some(4 * inflow));
    assert_eq!(s.reward.balance(&s.pool.address), 0);
}

#[test]
fn test_claim_emits_event_per_asset() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);
    s.add_reward(UNIT / 2);

    s.pool.claim_reward(&staker);

    let payload: events::RewardClaimedEvent = last_event(&s.env, symbol_short!("CLAIMED"))
        .expect("CLAIMED event not found")
        .try_into_val(&s.env)
        .unwrap();
    assert_eq!(payload.staker, staker);
    assert_eq!(payload.asset, s.reward.address);
    assert_eq!(payload.amount, UNIT / 2);
}

#[test]
fn test_claim_with_nothing_accrued_pays_nothing() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);

    let paid = s.pool.claim_reward(&staker);
    assert!(paid.is_empty());
    assert_eq!(s.reward.balance(&staker), 0);
}

#[test]
fn test_second_claim_pays_nothing() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);
    s.add_reward(UNIT);

    s.pool.claim_reward(&staker);
    let paid = s.pool.claim_reward(&staker);
    assert!(paid.is_empty());
    assert_eq!(s.reward.balance(&staker), UNIT);
}

#[test]
fn test_add_reward_requires_distributor() {
    let s = setup();
    let outsider = Address::generate(&s.env);
    s.reward_mint.mint(&outsider, &UNIT);

    assert_eq!(
        s.pool.try_add_reward(&outsider, &s.reward.address, &UNIT),
        Err(Ok(RewardPoolError::OnlyDistributor))
    );
}

#[test]
fn test_add_reward_validates_asset_and_amount() {
    let s = setup();
    let (other, other_mint) = create_token(&s.env, &s.admin);
    other_mint.mint(&s.distributor, &UNIT);

    assert_eq!(
        s.pool.try_add_reward(&s.distributor, &other.address, &UNIT),
        Err(Ok(RewardPoolError::InvalidRewardToken))
    );
    assert_eq!(
        s.pool.try_add_reward(&s.distributor, &s.reward.address, &0),
        Err(Ok(RewardPoolError::InvalidAmount))
    );
    // Value has to accompany the call.
    assert_eq!(
        s.pool.try_add_reward(&s.distributor, &s.reward.address, &UNIT),
        Err(Ok(RewardPoolError::InsufficientBalance))
    );
}

#[test]
fn test_reward_queued_while_nothing_staked() {
    let s = setup();
    s.add_reward(3 * UNIT);

    let payload: events::RewardAddedEvent = last_event(&s.env, symbol_short!("RWD_ADD"))
        .expect("RWD_ADD event not found")
        .try_into_val(&s.env)
        .unwrap();
    assert!(payload.queued);

    let state = s.pool.get_reward_state(&s.reward.address);
    assert_eq!(state.reward_per_unit, 0);
    assert_eq!(state.queued, 3 * UNIT);
    assert_eq!(s.reward.balance(&s.pool.address), 3 * UNIT);

    let staker = s.staker(2 * UNIT);
    s.pool.stake(&staker, &(2 * UNIT));
    // Queued reward stays put until the next inflow.
    assert_eq!(s.pool.get_pending_reward(&staker, &s.reward.address), 0);

    s.add_reward(UNIT);
    let state = s.pool.get_reward_state(&s.reward.address);
    assert_eq!(state.queued, 0);
    assert_eq!(state.reward_per_unit, 2 * PRECISION);
    assert_eq!(state.total_distributed, 4 * UNIT);
    assert_eq!(
        s.pool.get_pending_reward(&staker, &s.reward.address),
        4 * UNIT
    );
}

#[test]
fn test_reward_split_follows_stake_ratio() {
    let s = setup();
    let alice = s.staker(UNIT);
    let bob = s.staker(3 * UNIT);
    s.pool.stake(&alice, &UNIT);
    s.pool.stake(&bob, &(3 * UNIT));

    s.add_reward(4_000);

    assert_eq!(s.pool.get_pending_reward(&alice, &s.reward.address), 1_000);
    assert_eq!(s.pool.get_pending_reward(&bob, &s.reward.address), 3_000);
}

#[test]
fn test_late_staker_does_not_share_earlier_reward() {
    let s = setup();
    let early = s.staker(UNIT);
    let late = s.staker(UNIT);
    s.pool.stake(&early, &UNIT);

    s.add_reward(UNIT);
    s.pool.stake(&late, &UNIT);
    s.add_reward(UNIT);

    assert_eq!(
        s.pool.get_pending_reward(&early, &s.reward.address),
        UNIT + UNIT / 2
    );
    assert_eq!(s.pool.get_pending_reward(&late, &s.reward.address), UNIT / 2);
}

#[test]
fn test_accrual_survives_full_withdraw() {
    let s = setup();
    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);
    s.add_reward(UNIT);

    s.pool.withdraw(&staker, &UNIT);
    assert_eq!(s.pool.get_staked(&staker), 0);
    assert_eq!(s.pool.get_user_reward(&staker, &s.reward.address).accrued, UNIT);

    s.pool.claim_reward(&staker);
    assert_eq!(s.reward.balance(&staker), UNIT);
    assert_eq!(s.stake_token.balance(&staker), UNIT);
}

#[test]
fn test_multiple_reward_assets_claimed_together() {
    let s = setup();
    let (second, second_mint) = create_token(&s.env, &s.admin);
    s.pool.add_reward_asset(&s.admin, &second.address);
    assert_eq!(s.pool.get_reward_assets().len(), 2);

    let staker = s.staker(UNIT);
    s.pool.stake(&staker, &UNIT);

    s.add_reward(UNIT);
    second_mint.mint(&s.distributor, &(2 * UNIT));
    s.pool
        .add_reward(&s.distributor, &second.address, &(2 * UNIT));

    let paid = s.pool.claim_reward(&staker);
    assert_eq!(paid.len(), 2);
    assert_eq!(s.reward.balance(&staker), UNIT);
    assert_eq!(second.balance(&staker), 2 * UNIT);
}

// ── Roles and configuration ─────────────────────────────────────────────────

#[test]
fn test_admin_functions_require_admin_role() {
    let s = setup();
    let outsider = Address::generate(&s.env);
    let (other, _) = create_token(&s.env, &s.admin);

    assert_eq!(
        s.pool
            .try_grant_role(&outsider, &Role::Distributor, &outsider),
        Err(Ok(RewardPoolError::MissingRole))
    );
    assert_eq!(
        s.pool.try_add_reward_asset(&outsider, &other.address),
        Err(Ok(RewardPoolError::MissingRole))
    );
    assert_eq!(
        s.pool.try_add_reward_asset(&s.admin, &s.reward.address),
        Err(Ok(RewardPoolError::InvalidRewardToken))
    );
    assert_eq!(
        s.pool.try_add_reward_asset(&s.admin, &s.stake_token.address),
        Err(Ok(RewardPoolError::InvalidRewardToken))
    );
}

#[test]
fn test_revoked_distributor_cannot_add_reward() {
    let s = setup();
    s.pool
        .revoke_role(&s.admin, &Role::Distributor, &s.distributor);
    assert!(!s.pool.has_role(&Role::Distributor, &s.distributor));

    s.reward_mint.mint(&s.distributor, &UNIT);
    assert_eq!(
        s.pool
            .try_add_reward(&s.distributor, &s.reward.address, &UNIT),
        Err(Ok(RewardPoolError::OnlyDistributor))
    );
}

#[test]
fn test_role_event_published() {
    let s = setup();
    let account = Address::generate(&s.env);
    s.pool.grant_role(&s.admin, &Role::Distributor, &account);

    let all = s.env.events().all();
    let event = all.get(all.len() - 1).unwrap();
    assert_eq!(
        event.1,
        (symbol_short!("ROLE"), account.clone()).into_val(&s.env)
    );
    let payload: events::RoleChangedEvent = event.2.try_into_val(&s.env).unwrap();
    assert_eq!(payload.role, Role::Distributor);
    assert!(payload.granted);
}

// ── Conservation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Stake { user: u8, amount: u16 },
    Withdraw { user: u8, amount: u16 },
    Reward { amount: u32 },
    Claim { user: u8 },
}

const USERS: usize = 3;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Reward is neither created nor destroyed: what stakers hold or are
    /// owed never exceeds what was distributed, and the shortfall is bounded
    /// by per-inflow truncation dust.
    #[test]
    fn reward_is_conserved(ops in proptest::collection::vec(any::<Op>(), 1..24)) {
        let s = setup();
        let users: std::vec::Vec<Address> = (0..USERS).map(|_| s.staker(1_000_000)).collect();
        let mut added: i128 = 0;
        let mut inflows: i128 = 0;

        for op in ops {
            match op {
                Op::Stake { user, amount } => {
                    let _ = s.pool.try_stake(&users[user as usize % USERS], &(amount as i128));
                }
                Op::Withdraw { user, amount } => {
                    let _ = s.pool.try_withdraw(&users[user as usize % USERS], &(amount as i128));
                }
                Op::Reward { amount } => {
                    let amount = amount as i128 + 1;
                    s.add_reward(amount);
                    added += amount;
                    inflows += 1;
                }
                Op::Claim { user } => {
                    let _ = s.pool.try_claim_reward(&users[user as usize % USERS]);
                }
            }
        }

        let state = s.pool.get_reward_state(&s.reward.address);
        prop_assert_eq!(state.total_distributed + state.queued, added);

        let mut owed: i128 = 0;
        let mut paid: i128 = 0;
        for user in users.iter() {
            owed += s.pool.get_pending_reward(user, &s.reward.address);
            paid += s.reward.balance(user);
        }
        prop_assert!(owed + paid <= state.total_distributed);
        prop_assert!(state.total_distributed - (owed + paid) <= USERS as i128 * (inflows + 1));
        prop_assert_eq!(s.reward.balance(&s.pool.address), added - paid);
    }
}

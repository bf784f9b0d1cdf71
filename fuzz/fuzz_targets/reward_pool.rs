#![no_main]

use arbitrary::Arbitrary;
use common::Role;
use libfuzzer_sys::fuzz_target;
use reward_pool::{RewardPoolContract, RewardPoolContractClient};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{token, vec, Address, Env};

const STAKERS: usize = 3;

#[derive(Arbitrary, Debug)]
enum Op {
    Stake { who: u8, amount: u32 },
    Withdraw { who: u8, amount: u32 },
    Claim { who: u8 },
    AddReward { amount: u32 },
}

fuzz_target!(|ops: Vec<Op>| {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let distributor = Address::generate(&env);
    let stake_sac = env.register_stellar_asset_contract_v2(admin.clone());
    let reward_sac = env.register_stellar_asset_contract_v2(admin.clone());
    let stake_mint = token::StellarAssetClient::new(&env, &stake_sac.address());
    let reward = token::Client::new(&env, &reward_sac.address());
    let reward_mint = token::StellarAssetClient::new(&env, &reward_sac.address());

    let pool_id = env.register(RewardPoolContract, ());
    let pool = RewardPoolContractClient::new(&env, &pool_id);
    pool.initialize(&admin, &stake_sac.address(), &vec![&env, reward_sac.address()]);
    pool.grant_role(&admin, &Role::Distributor, &distributor);

    let stakers: Vec<Address> = (0..STAKERS).map(|_| Address::generate(&env)).collect();
    for staker in &stakers {
        stake_mint.mint(staker, &(u32::MAX as i128));
    }

    let mut added: i128 = 0;
    let mut paid: i128 = 0;

    for op in ops.iter().take(64) {
        match *op {
            Op::Stake { who, amount } => {
                let staker = &stakers[who as usize % STAKERS];
                let _ = pool.try_stake(staker, &(amount as i128));
            }
            Op::Withdraw { who, amount } => {
                let staker = &stakers[who as usize % STAKERS];
                let _ = pool.try_withdraw(staker, &(amount as i128));
            }
            Op::Claim { who } => {
                let staker = &stakers[who as usize % STAKERS];
                if let Ok(Ok(payouts)) = pool.try_claim_reward(staker) {
                    paid += payouts.get(reward.address.clone()).unwrap_or(0);
                }
            }
            Op::AddReward { amount } => {
                let amount = amount as i128;
                reward_mint.mint(&distributor, &amount);
                if pool.try_add_reward(&distributor, &reward.address, &amount).is_ok() {
                    added += amount;
                }
            }
        }

        let staked: i128 = stakers.iter().map(|s| pool.get_staked(s)).sum();
        assert_eq!(staked, pool.get_total_staked());

        // The pool never owes more reward than it holds.
        let owed: i128 = stakers
            .iter()
            .map(|s| pool.get_pending_reward(s, &reward.address))
            .sum();
        assert!(owed <= reward.balance(&pool_id));
        assert_eq!(reward.balance(&pool_id), added - paid);
    }
});

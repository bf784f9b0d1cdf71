#![no_main]

use arbitrary::Arbitrary;
use custody_pool::{CustodyPoolContract, CustodyPoolContractClient};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::testutils::{Address as _, IssuerFlags, Ledger};
use soroban_sdk::{token, Address, Env};
use withdrawal_queue::{WithdrawalQueueContract, WithdrawalQueueContractClient};

const USERS: usize = 3;

#[derive(Arbitrary, Debug)]
enum Op {
    Deposit { who: u8, amount: u32 },
    Initiate { who: u8, amount: u32 },
    Unlock { upto: u8 },
    Complete { who: u8 },
    Delegate { amount: u32 },
    Replenish { amount: u32 },
    Wait { days: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let operator = Address::generate(&env);
    let asset_sac = env.register_stellar_asset_contract_v2(admin.clone());
    let asset = token::Client::new(&env, &asset_sac.address());
    let asset_mint = token::StellarAssetClient::new(&env, &asset_sac.address());

    let custody_id = env.register(CustodyPoolContract, ());
    let claim_sac = env.register_stellar_asset_contract_v2(custody_id.clone());
    claim_sac.issuer().set_flag(IssuerFlags::ClawbackEnabledFlag);
    let queue_id = env.register(WithdrawalQueueContract, ());

    let custody = CustodyPoolContractClient::new(&env, &custody_id);
    custody.initialize(
        &admin,
        &asset_sac.address(),
        &claim_sac.address(),
        &queue_id,
        &Address::generate(&env),
    );
    let queue = WithdrawalQueueContractClient::new(&env, &queue_id);
    queue.initialize(&admin, &custody_id, &asset_sac.address(), &(3 * 24 * 60 * 60));

    let users: Vec<Address> = (0..USERS).map(|_| Address::generate(&env)).collect();
    let mut deposited: i128 = 0;
    let mut requested: i128 = 0;
    let mut completed: i128 = 0;

    for op in ops.iter().take(64) {
        match *op {
            Op::Deposit { who, amount } => {
                let user = &users[who as usize % USERS];
                let amount = amount as i128;
                asset_mint.mint(user, &amount);
                if custody.try_deposit(user, &amount).is_ok() {
                    deposited += amount;
                }
            }
            Op::Initiate { who, amount } => {
                let user = &users[who as usize % USERS];
                let amount = amount as i128;
                if queue.try_initiate_withdrawal(user, &amount).is_ok() {
                    requested += amount;
                }
            }
            Op::Unlock { upto } => {
                let first = queue.next_unlock_nonce();
                let _ = queue.try_unlock_withdrawal(&admin, &(first + upto as u64 % 4));
            }
            Op::Complete { who } => {
                let user = &users[who as usize % USERS];
                if let Ok(Ok(paid)) = queue.try_complete_withdrawal(user) {
                    completed += paid;
                }
            }
            Op::Delegate { amount } => {
                let _ = custody.try_delegate(&admin, &operator, &(amount as i128));
            }
            Op::Replenish { amount } => {
                let amount = (amount as i128).min(asset.balance(&operator));
                let _ = custody.try_replenish(&operator, &amount);
            }
            Op::Wait { days } => {
                let now = env.ledger().timestamp();
                env.ledger().set_timestamp(now + days as u64 * 24 * 60 * 60);
            }
        }

        let reserved = queue.get_reserved_liquidity();
        assert!(reserved >= 0);
        assert!(reserved <= asset.balance(&queue_id));
        assert_eq!(custody.total_deposited(), deposited - requested);
        assert!(completed <= requested);
        assert!(queue.next_unlock_nonce() <= queue.get_next_nonce());
    }
});

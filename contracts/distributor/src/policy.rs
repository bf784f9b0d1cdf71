use common::BPS_DENOMINATOR;

/// Highest fee the policy accepts: everything goes to the fee recipient.
pub const MAX_FEE_BPS: u32 = 10_000;

/// Split an inflow into `(fee, forwarded)`.
///
/// The fee is rounded down, so any rounding remainder goes to stakers.
/// Returns `None` if `fee_bps` is above `MAX_FEE_BPS` or the product
/// overflows.
pub fn split(amount: i128, fee_bps: u32) -> Option<(i128, i128)> {
    if fee_bps > MAX_FEE_BPS || amount < 0 {
        return None;
    }
    let fee = amount.checked_mul(fee_bps as i128)? / BPS_DENOMINATOR;
    Some((fee, amount - fee))
}

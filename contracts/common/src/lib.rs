#![no_std]

pub mod guard;
pub mod interfaces;
pub mod roles;

pub use roles::Role;

/// Fixed-point scale shared by every reward-per-unit value.
pub const PRECISION: i128 = 1_000_000_000_000_000_000;

/// Basis-point denominator used by fee policies.
pub const BPS_DENOMINATOR: i128 = 10_000;

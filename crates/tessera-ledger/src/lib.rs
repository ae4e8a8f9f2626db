//! # tessera-ledger
//!
//! Simulated settlement layer for the Tessera marketplace.
//!
//! This crate provides:
//! - Wallets and addresses (Ed25519 keypairs, base58 addresses)
//! - Native coin and registered fungible tokens with allowances
//! - Asset collections under two transfer protocols (single-owner and
//!   multi-unit)
//! - An atomic settlement primitive that collects payment, splits fee and
//!   proceeds, and conveys the asset in one indivisible step
//!
//! The market core (`tessera-market`) treats this crate as the external
//! chain: ownership, balances, approvals, and transfers all live here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod assets;
pub mod client;
pub mod error;
pub mod settlement;
pub mod tokens;
pub mod wallet;

pub use amount::Amount;
pub use assets::{AssetId, AssetProtocol, Collection, CollectionId};
pub use client::LedgerClient;
pub use error::{LedgerError, Result};
pub use settlement::{AssetLeg, PaymentSource, SettlementInstruction, SettlementReceipt};
pub use tokens::{TokenBook, TokenId};
pub use wallet::{Address, Wallet};

/// Decimal precision of the native coin.
pub const NATIVE_DECIMALS: u32 = 9;

/// One native coin in base units.
pub const UNITS_PER_COIN: u64 = 1_000_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(NATIVE_DECIMALS, 9);
        assert_eq!(UNITS_PER_COIN, 10u64.pow(NATIVE_DECIMALS));
    }
}

//! Registered payment methods.
//!
//! The method table is append-only: ids are a sequence starting at the
//! reserved native-currency method, and a method is never removed or mutated
//! once created — settled history keeps resolving against it.

use serde::{Deserialize, Serialize};

use tessera_ledger::TokenId;
use tessera_oracle::FeedId;

/// Identifier of a payment method.
pub type MethodId = u32;

/// The reserved id of the native-currency method.
pub const NATIVE_METHOD_ID: MethodId = 0;

/// What a payment method settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    /// Native coin at the identity rate.
    Native,
    /// A registered token priced by a feed.
    Token {
        /// The token pulled from the buyer.
        token: TokenId,
        /// Feed quoting base currency per whole token.
        feed: FeedId,
    },
}

/// One entry in the payment method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Method identifier.
    pub id: MethodId,
    /// Settlement currency and rate source.
    pub kind: MethodKind,
    /// Decimal precision of the settlement currency.
    pub decimals: u32,
}

impl PaymentMethod {
    /// Whether this is the reserved native method.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self.kind, MethodKind::Native)
    }
}

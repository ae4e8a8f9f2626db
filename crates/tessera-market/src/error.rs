//! Error taxonomy for marketplace operations.
//!
//! Every mutating operation is all-or-nothing: on any of these errors no
//! partial state change persists, and the market stays consistent for the
//! next attempt.

use thiserror::Error;

use tessera_ledger::LedgerError;
use tessera_oracle::OracleError;

/// Errors surfaced by marketplace operations.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Unknown offer id.
    #[error("unknown offer: {0}")]
    UnknownOffer(u64),

    /// Unknown payment method id.
    #[error("unknown payment method: {0}")]
    UnknownMethod(u32),

    /// Caller is not the identity the operation requires.
    #[error("unauthorized: {action} is restricted to the {required}")]
    Unauthorized {
        /// Operation that was attempted.
        action: String,
        /// Identity the operation requires.
        required: String,
    },

    /// Operation not valid for the offer's current state.
    #[error("invalid state: cannot {action} an offer in state {state}")]
    InvalidState {
        /// Operation that was attempted.
        action: String,
        /// Current offer state.
        state: String,
    },

    /// Sale-time transfer authorization is missing.
    #[error("not approved: {owner} has not authorized the market operator for asset {asset_id}")]
    NotApproved {
        /// Asset holder.
        owner: String,
        /// Asset identifier.
        asset_id: u64,
    },

    /// Buyer-supplied funds fall short of the resolved price.
    #[error("insufficient payment: resolved price is {required} units, attached {attached}")]
    InsufficientPayment {
        /// Resolved price in the payment token's base units.
        required: u64,
        /// Value the buyer attached.
        attached: u64,
    },

    /// The oracle cannot produce a usable rate for the method.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    /// A parameter failed validation.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the rejected parameter.
        message: String,
    },

    /// Settlement-layer failure (funds, allowances, asset balances).
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MarketError {
    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(action: impl Into<String>, required: impl Into<String>) -> Self {
        Self::Unauthorized {
            action: action.into(),
            required: required.into(),
        }
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(action: impl Into<String>, state: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            action: action.into(),
            state: state.to_string(),
        }
    }

    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

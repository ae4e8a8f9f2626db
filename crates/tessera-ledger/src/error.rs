//! Error types for ledger operations.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid address format.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// Insufficient funds for a payment or transfer.
    #[error("insufficient funds: have {have} units, need {need} units")]
    InsufficientFunds {
        /// Current balance in base units.
        have: u64,
        /// Required balance in base units.
        need: u64,
    },

    /// Spender allowance does not cover the requested pull.
    #[error("insufficient allowance: approved {approved} units, need {need} units")]
    InsufficientAllowance {
        /// Currently approved amount in base units.
        approved: u64,
        /// Required amount in base units.
        need: u64,
    },

    /// Operator lacks transfer authorization for the asset.
    #[error("not authorized: {operator} may not move asset {asset_id} held by {owner}")]
    NotAuthorized {
        /// Holder of the asset.
        owner: String,
        /// Operator attempting the transfer.
        operator: String,
        /// Asset identifier.
        asset_id: u64,
    },

    /// Unknown fungible token.
    #[error("unknown token: {id}")]
    UnknownToken {
        /// Token identifier.
        id: u32,
    },

    /// Unknown asset collection.
    #[error("unknown collection: {id}")]
    UnknownCollection {
        /// Collection identifier.
        id: u32,
    },

    /// Unknown asset within a collection.
    #[error("unknown asset: {asset_id} in collection {collection}")]
    UnknownAsset {
        /// Collection identifier.
        collection: u32,
        /// Asset identifier.
        asset_id: u64,
    },

    /// Holder does not own enough units of the asset.
    #[error("insufficient assets: {owner} holds {held} of asset {asset_id}, need {need}")]
    InsufficientAssets {
        /// Holder of the asset.
        owner: String,
        /// Asset identifier.
        asset_id: u64,
        /// Units held.
        held: u64,
        /// Units required.
        need: u64,
    },

    /// Operation does not match the collection's transfer protocol.
    #[error("protocol mismatch: {message}")]
    ProtocolMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Invalid amount or quantity.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Wallet or key error.
    #[error("wallet error: {message}")]
    WalletError {
        /// Description of the wallet error.
        message: String,
    },
}

impl LedgerError {
    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create an insufficient funds error.
    #[must_use]
    pub const fn insufficient_funds(have: u64, need: u64) -> Self {
        Self::InsufficientFunds { have, need }
    }

    /// Create a protocol mismatch error.
    #[must_use]
    pub fn protocol_mismatch(message: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            message: message.into(),
        }
    }

    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Create a wallet error.
    #[must_use]
    pub fn wallet_error(message: impl Into<String>) -> Self {
        Self::WalletError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_display() {
        let err = LedgerError::insufficient_funds(5, 10);
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_not_authorized_display() {
        let err = LedgerError::NotAuthorized {
            owner: "alice".to_string(),
            operator: "market".to_string(),
            asset_id: 7,
        };
        let s = err.to_string();
        assert!(s.contains("alice"));
        assert!(s.contains("market"));
        assert!(s.contains('7'));
    }

    #[test]
    fn test_unknown_collection_display() {
        let err = LedgerError::UnknownCollection { id: 3 };
        assert!(err.to_string().contains('3'));
    }
}

//! Atomic settlement instruction and receipt types.
//!
//! The market builds one [`SettlementInstruction`] per purchase attempt and
//! hands it to [`LedgerClient::settle`](crate::client::LedgerClient::settle),
//! which executes payment collection, fee/proceeds delivery, and the asset
//! transfer under a single state lock.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::Amount;
use crate::assets::{AssetId, CollectionId};
use crate::error::{LedgerError, Result};
use crate::tokens::TokenId;
use crate::wallet::Address;

/// Where the payment is collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    /// Native coin attached to the call. Only the settled amount is debited;
    /// the excess stays with the buyer.
    Native {
        /// Value the buyer attached.
        attached: Amount,
    },
    /// Registered token, pulled through the buyer's allowance for the
    /// operator.
    Token {
        /// The token to pull.
        token: TokenId,
    },
}

/// The asset leg of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLeg {
    /// Collection holding the asset.
    pub collection: CollectionId,
    /// Asset to convey.
    pub asset_id: AssetId,
    /// Units to convey.
    pub quantity: u64,
}

/// Everything needed to execute one purchase atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementInstruction {
    /// Paying party, receives the asset.
    pub buyer: Address,
    /// Asset holder, receives the proceeds.
    pub seller: Address,
    /// Gross payment in the source currency's base units.
    pub amount: Amount,
    /// Portion of `amount` delivered to `fee_recipient`.
    pub fee: Amount,
    /// Destination of the fee.
    pub fee_recipient: Address,
    /// Identity authorized by the seller to move the asset.
    pub operator: Address,
    /// Payment collection path.
    pub source: PaymentSource,
    /// Asset to convey.
    pub asset: AssetLeg,
}

impl SettlementInstruction {
    /// Seller proceeds after the fee. The fee split is floor-based, so any
    /// division remainder is already inside this figure.
    ///
    /// # Errors
    ///
    /// Fails if the fee exceeds the gross amount.
    pub fn proceeds(&self) -> Result<Amount> {
        self.amount
            .checked_sub(self.fee)
            .ok_or_else(|| LedgerError::invalid_amount("fee exceeds settlement amount"))
    }
}

/// Proof of an executed settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Unique receipt id.
    pub id: Uuid,
    /// Gross payment collected from the buyer.
    pub amount: Amount,
    /// Fee delivered to the fee recipient.
    pub fee: Amount,
    /// Proceeds delivered to the seller.
    pub proceeds: Amount,
    /// Unix timestamp of execution.
    pub executed_at: i64,
}

impl SettlementReceipt {
    /// Build a receipt stamped now.
    #[must_use]
    pub fn record(amount: Amount, fee: Amount, proceeds: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            fee,
            proceeds,
            executed_at: Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn addr() -> Address {
        Wallet::generate().expect("wallet").address().clone()
    }

    fn instruction(amount: u64, fee: u64) -> SettlementInstruction {
        SettlementInstruction {
            buyer: addr(),
            seller: addr(),
            amount: Amount::from_units(amount),
            fee: Amount::from_units(fee),
            fee_recipient: addr(),
            operator: addr(),
            source: PaymentSource::Native {
                attached: Amount::from_units(amount),
            },
            asset: AssetLeg {
                collection: 1,
                asset_id: 1,
                quantity: 1,
            },
        }
    }

    #[test]
    fn proceeds_is_amount_minus_fee() {
        let ix = instruction(1_000, 25);
        assert_eq!(ix.proceeds().expect("proceeds"), Amount::from_units(975));
    }

    #[test]
    fn fee_over_amount_rejected() {
        let ix = instruction(100, 200);
        assert!(ix.proceeds().is_err());
    }

    #[test]
    fn receipt_sums() {
        let receipt = SettlementReceipt::record(
            Amount::from_units(1_000),
            Amount::from_units(25),
            Amount::from_units(975),
        );
        assert_eq!(receipt.fee + receipt.proceeds, receipt.amount);
        assert!(receipt.executed_at > 0);
    }

    #[test]
    fn instruction_serialization() {
        let ix = instruction(1_000, 25);
        let json = serde_json::to_string(&ix).expect("serialize");
        let parsed: SettlementInstruction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.amount, ix.amount);
        assert_eq!(parsed.asset, ix.asset);
    }
}

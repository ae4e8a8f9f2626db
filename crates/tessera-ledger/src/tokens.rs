//! Fungible token books.
//!
//! A [`TokenBook`] tracks balances and spender allowances for one registered
//! token. Settlement pulls funds through the allowance mechanism, so a buyer
//! pre-approves the market operator for the resolved amount and the pull
//! decrements the grant by exactly what was taken.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::wallet::Address;

/// Identifier of a registered fungible token.
pub type TokenId = u32;

/// Balances and allowances for one fungible token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBook {
    /// Token identifier.
    pub id: TokenId,
    /// Short display symbol.
    pub symbol: String,
    /// Decimal precision of one whole token.
    pub decimals: u32,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
}

impl TokenBook {
    /// Create an empty book.
    #[must_use]
    pub fn new(id: TokenId, symbol: String, decimals: u32) -> Self {
        Self {
            id,
            symbol,
            decimals,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Balance of `holder`.
    #[must_use]
    pub fn balance(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(Amount::ZERO)
    }

    /// Remaining allowance granted by `owner` to `spender`.
    #[must_use]
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Credit `amount` to `holder`.
    pub fn credit(&mut self, holder: &Address, amount: Amount) {
        let balance = self.balances.entry(holder.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Debit `amount` from `holder`.
    ///
    /// # Errors
    ///
    /// Fails if the balance does not cover the debit.
    pub fn debit(&mut self, holder: &Address, amount: Amount) -> Result<()> {
        let held = self.balance(holder);
        let remaining = held
            .checked_sub(amount)
            .ok_or(LedgerError::insufficient_funds(held.units(), amount.units()))?;
        self.balances.insert(holder.clone(), remaining);
        Ok(())
    }

    /// Overwrite the allowance `owner` grants to `spender`.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    /// Pull `amount` from `owner` on the authority of `spender`, consuming
    /// that much of the allowance.
    ///
    /// # Errors
    ///
    /// Fails if the allowance or the balance does not cover the pull; neither
    /// is touched on failure.
    pub fn pull(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<()> {
        let approved = self.allowance(owner, spender);
        let remaining = approved
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                approved: approved.units(),
                need: amount.units(),
            })?;
        self.debit(owner, amount)?;
        self.allowances
            .insert((owner.clone(), spender.clone()), remaining);
        Ok(())
    }
}

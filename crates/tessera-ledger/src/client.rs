//! Simulated settlement-layer client.
//!
//! [`LedgerClient`] stands in for the external chain: native coin balances,
//! registered fungible tokens, and asset collections all live behind one
//! lock, so a settlement can check and move payment and asset state as a
//! single indivisible step.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::amount::Amount;
use crate::assets::{AssetId, AssetProtocol, Collection, CollectionId};
use crate::error::{LedgerError, Result};
use crate::settlement::{PaymentSource, SettlementInstruction, SettlementReceipt};
use crate::tokens::{TokenBook, TokenId};
use crate::wallet::{Address, Wallet};

#[derive(Debug, Default)]
struct LedgerState {
    native: HashMap<Address, Amount>,
    tokens: HashMap<TokenId, TokenBook>,
    next_token: TokenId,
    collections: HashMap<CollectionId, Collection>,
    next_collection: CollectionId,
}

impl LedgerState {
    fn token(&self, id: TokenId) -> Result<&TokenBook> {
        self.tokens.get(&id).ok_or(LedgerError::UnknownToken { id })
    }

    fn token_mut(&mut self, id: TokenId) -> Result<&mut TokenBook> {
        self.tokens
            .get_mut(&id)
            .ok_or(LedgerError::UnknownToken { id })
    }

    fn collection(&self, id: CollectionId) -> Result<&Collection> {
        self.collections
            .get(&id)
            .ok_or(LedgerError::UnknownCollection { id })
    }

    fn collection_mut(&mut self, id: CollectionId) -> Result<&mut Collection> {
        self.collections
            .get_mut(&id)
            .ok_or(LedgerError::UnknownCollection { id })
    }

    fn native_balance(&self, address: &Address) -> Amount {
        self.native.get(address).copied().unwrap_or(Amount::ZERO)
    }

    fn credit_native(&mut self, address: &Address, amount: Amount) {
        let balance = self.native.entry(address.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }

    fn debit_native(&mut self, address: &Address, amount: Amount) -> Result<()> {
        let held = self.native_balance(address);
        let remaining = held
            .checked_sub(amount)
            .ok_or(LedgerError::insufficient_funds(held.units(), amount.units()))?;
        self.native.insert(address.clone(), remaining);
        Ok(())
    }
}

/// Client over the simulated settlement layer.
pub struct LedgerClient {
    state: Arc<Mutex<LedgerState>>,
}

impl LedgerClient {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    // ---- native coin ----

    /// Native coin balance of an address.
    pub async fn native_balance(&self, address: &Address) -> Amount {
        self.state.lock().await.native_balance(address)
    }

    /// Faucet: credit native coin to an address.
    pub async fn mint_native(&self, address: &Address, amount: Amount) {
        let mut state = self.state.lock().await;
        state.credit_native(address, amount);
        info!(address = %address, amount = %amount, "native coin minted");
    }

    // ---- fungible tokens ----

    /// Register a new fungible token and return its id.
    pub async fn register_token(&self, symbol: impl Into<String>, decimals: u32) -> TokenId {
        let mut state = self.state.lock().await;
        let id = state.next_token;
        state.next_token += 1;
        let symbol = symbol.into();
        state
            .tokens
            .insert(id, TokenBook::new(id, symbol.clone(), decimals));
        info!(token = id, symbol = %symbol, decimals, "token registered");
        id
    }

    /// Decimal precision of a registered token.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown token.
    pub async fn token_decimals(&self, token: TokenId) -> Result<u32> {
        Ok(self.state.lock().await.token(token)?.decimals)
    }

    /// Faucet: credit tokens to an address.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown token.
    pub async fn mint_token(&self, token: TokenId, address: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        state.token_mut(token)?.credit(address, amount);
        info!(token, address = %address, amount = %amount, "tokens minted");
        Ok(())
    }

    /// Token balance of an address.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown token.
    pub async fn token_balance(&self, token: TokenId, address: &Address) -> Result<Amount> {
        Ok(self.state.lock().await.token(token)?.balance(address))
    }

    /// Overwrite the allowance `owner` grants `spender` for `token`.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown token.
    pub async fn approve_token(
        &self,
        owner: &Wallet,
        token: TokenId,
        spender: &Address,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.token_mut(token)?.approve(owner.address(), spender, amount);
        debug!(token, owner = %owner.address(), spender = %spender, amount = %amount, "allowance set");
        Ok(())
    }

    /// Remaining allowance `owner` has granted `spender` for `token`.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown token.
    pub async fn token_allowance(
        &self,
        token: TokenId,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount> {
        Ok(self.state.lock().await.token(token)?.allowance(owner, spender))
    }

    // ---- asset collections ----

    /// Create an asset collection under the given protocol.
    pub async fn create_collection(&self, protocol: AssetProtocol) -> CollectionId {
        let mut state = self.state.lock().await;
        let id = state.next_collection;
        state.next_collection += 1;
        state.collections.insert(id, Collection::new(id, protocol));
        info!(collection = id, protocol = %protocol, "collection created");
        id
    }

    /// Protocol of a collection.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown collection.
    pub async fn collection_protocol(&self, collection: CollectionId) -> Result<AssetProtocol> {
        Ok(self.state.lock().await.collection(collection)?.protocol)
    }

    /// Mint a single-owner asset.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown collection or a protocol mismatch.
    pub async fn mint_single(
        &self,
        collection: CollectionId,
        asset_id: AssetId,
        owner: &Address,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .collection_mut(collection)?
            .mint_single(asset_id, owner.clone())?;
        info!(collection, asset_id, owner = %owner, "single-owner asset minted");
        Ok(())
    }

    /// Mint units of a multi-unit asset.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown collection or a protocol mismatch.
    pub async fn mint_units(
        &self,
        collection: CollectionId,
        asset_id: AssetId,
        owner: &Address,
        quantity: u64,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .collection_mut(collection)?
            .mint_units(asset_id, owner.clone(), quantity)?;
        info!(collection, asset_id, owner = %owner, quantity, "asset units minted");
        Ok(())
    }

    /// Grant or revoke a per-asset spender (single-owner assets only).
    ///
    /// # Errors
    ///
    /// Returns error if the collection is unknown, multi-unit, or the caller
    /// does not hold the asset.
    pub async fn approve_asset(
        &self,
        owner: &Wallet,
        collection: CollectionId,
        asset_id: AssetId,
        spender: Option<Address>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .collection_mut(collection)?
            .approve_spender(owner.address(), asset_id, spender)?;
        debug!(collection, asset_id, owner = %owner.address(), "asset spender updated");
        Ok(())
    }

    /// Grant or revoke a blanket operator for everything `owner` holds in
    /// the collection.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown collection.
    pub async fn set_operator(
        &self,
        owner: &Wallet,
        collection: CollectionId,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .collection_mut(collection)?
            .set_operator(owner.address(), operator.clone(), approved);
        debug!(collection, owner = %owner.address(), operator = %operator, approved, "operator grant updated");
        Ok(())
    }

    /// Whether `operator` may currently move `asset_id` held by `owner`.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown collection.
    pub async fn is_authorized(
        &self,
        owner: &Address,
        operator: &Address,
        collection: CollectionId,
        asset_id: AssetId,
    ) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .collection(collection)?
            .is_authorized(owner, operator, asset_id))
    }

    /// Units of `asset_id` held by `owner`.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown collection.
    pub async fn asset_balance(
        &self,
        owner: &Address,
        collection: CollectionId,
        asset_id: AssetId,
    ) -> Result<u64> {
        Ok(self
            .state
            .lock()
            .await
            .collection(collection)?
            .balance_of(owner, asset_id))
    }

    /// Direct asset transfer on the authority of `operator`.
    ///
    /// # Errors
    ///
    /// Returns error if authorization or balance is insufficient.
    pub async fn transfer_asset(
        &self,
        operator: &Wallet,
        from: &Address,
        to: &Address,
        collection: CollectionId,
        asset_id: AssetId,
        quantity: u64,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .collection_mut(collection)?
            .transfer(operator.address(), from, to, asset_id, quantity)?;
        info!(collection, asset_id, from = %from, to = %to, quantity, "asset transferred");
        Ok(())
    }

    // ---- settlement ----

    /// Execute a settlement atomically.
    ///
    /// Every check — operator authorization, seller asset balance, buyer
    /// funds or allowance — happens against current state before anything
    /// moves; any failure returns with zero state change. On success the
    /// payment is collected from the buyer, split between the fee recipient
    /// and the seller, and the asset is conveyed to the buyer.
    ///
    /// # Errors
    ///
    /// Returns error if any precondition fails; the ledger is untouched.
    pub async fn settle(&self, ix: &SettlementInstruction) -> Result<SettlementReceipt> {
        let proceeds = ix.proceeds()?;
        let mut state = self.state.lock().await;

        // Asset preconditions, checked at settlement time rather than
        // trusted from any earlier activation query.
        {
            let collection = state.collection(ix.asset.collection)?;
            if collection.protocol == AssetProtocol::SingleOwner && ix.asset.quantity != 1 {
                return Err(LedgerError::protocol_mismatch(
                    "single-owner settlement conveys exactly one unit",
                ));
            }
            if ix.asset.quantity == 0 {
                return Err(LedgerError::invalid_amount("cannot settle zero units"));
            }
            if !collection.is_authorized(&ix.seller, &ix.operator, ix.asset.asset_id) {
                return Err(LedgerError::NotAuthorized {
                    owner: ix.seller.to_string(),
                    operator: ix.operator.to_string(),
                    asset_id: ix.asset.asset_id,
                });
            }
            let held = collection.balance_of(&ix.seller, ix.asset.asset_id);
            if held < ix.asset.quantity {
                return Err(LedgerError::InsufficientAssets {
                    owner: ix.seller.to_string(),
                    asset_id: ix.asset.asset_id,
                    held,
                    need: ix.asset.quantity,
                });
            }
        }

        // Payment preconditions.
        match ix.source {
            PaymentSource::Native { .. } => {
                let held = state.native_balance(&ix.buyer);
                if held < ix.amount {
                    return Err(LedgerError::insufficient_funds(
                        held.units(),
                        ix.amount.units(),
                    ));
                }
            }
            PaymentSource::Token { token } => {
                let book = state.token(token)?;
                let approved = book.allowance(&ix.buyer, &ix.operator);
                if approved < ix.amount {
                    return Err(LedgerError::InsufficientAllowance {
                        approved: approved.units(),
                        need: ix.amount.units(),
                    });
                }
                let held = book.balance(&ix.buyer);
                if held < ix.amount {
                    return Err(LedgerError::insufficient_funds(
                        held.units(),
                        ix.amount.units(),
                    ));
                }
            }
        }

        // All checks passed; apply both legs.
        match ix.source {
            PaymentSource::Native { .. } => {
                state.debit_native(&ix.buyer, ix.amount)?;
                state.credit_native(&ix.fee_recipient, ix.fee);
                state.credit_native(&ix.seller, proceeds);
            }
            PaymentSource::Token { token } => {
                let book = state.token_mut(token)?;
                book.pull(&ix.buyer, &ix.operator, ix.amount)?;
                book.credit(&ix.fee_recipient, ix.fee);
                book.credit(&ix.seller, proceeds);
            }
        }
        state.collection_mut(ix.asset.collection)?.transfer(
            &ix.operator,
            &ix.seller,
            &ix.buyer,
            ix.asset.asset_id,
            ix.asset.quantity,
        )?;

        let receipt = SettlementReceipt::record(ix.amount, ix.fee, proceeds);
        info!(
            receipt = %receipt.id,
            buyer = %ix.buyer,
            seller = %ix.seller,
            amount = %ix.amount,
            fee = %ix.fee,
            proceeds = %proceeds,
            asset_id = ix.asset.asset_id,
            quantity = ix.asset.quantity,
            "settlement executed"
        );
        Ok(receipt)
    }
}

impl Default for LedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient").finish_non_exhaustive()
    }
}

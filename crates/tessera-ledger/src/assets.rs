//! Asset collections and the two transfer protocols.
//!
//! A collection is created under exactly one [`AssetProtocol`] and keeps the
//! book for every asset id inside it. `SingleOwner` assets have one holder
//! and move one unit at a time; `MultiUnit` assets keep a balance per holder
//! and move N units at a time. Authorization follows the protocol: blanket
//! operator grants work for both, per-asset spender grants only exist for
//! `SingleOwner`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::wallet::Address;

/// Identifier of an asset collection.
pub type CollectionId = u32;

/// Identifier of an asset class or unit within a collection.
pub type AssetId = u64;

/// Transfer semantics of an asset collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetProtocol {
    /// Exactly one unit per asset id, one holder at a time.
    SingleOwner,
    /// A balance of N units per (holder, asset id).
    MultiUnit,
}

impl std::fmt::Display for AssetProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleOwner => write!(f, "single-owner"),
            Self::MultiUnit => write!(f, "multi-unit"),
        }
    }
}

/// The book for one asset collection.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Collection identifier.
    pub id: CollectionId,
    /// Transfer protocol every asset in this collection follows.
    pub protocol: AssetProtocol,
    /// SingleOwner: current holder per asset id.
    owners: HashMap<AssetId, Address>,
    /// MultiUnit: units held per (asset id, holder).
    balances: HashMap<(AssetId, Address), u64>,
    /// SingleOwner: per-asset approved spender, cleared on transfer.
    spenders: HashMap<AssetId, Address>,
    /// Blanket operator grants per holder.
    operators: HashMap<Address, HashSet<Address>>,
}

impl Collection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(id: CollectionId, protocol: AssetProtocol) -> Self {
        Self {
            id,
            protocol,
            owners: HashMap::new(),
            balances: HashMap::new(),
            spenders: HashMap::new(),
            operators: HashMap::new(),
        }
    }

    /// Mint a single-owner asset to `owner`.
    ///
    /// # Errors
    ///
    /// Fails on a multi-unit collection or if the asset id already exists.
    pub fn mint_single(&mut self, asset_id: AssetId, owner: Address) -> Result<()> {
        if self.protocol != AssetProtocol::SingleOwner {
            return Err(LedgerError::protocol_mismatch(format!(
                "collection {} is {}, cannot mint a single-owner asset",
                self.id, self.protocol
            )));
        }
        if self.owners.contains_key(&asset_id) {
            return Err(LedgerError::invalid_amount(format!(
                "asset {asset_id} already minted"
            )));
        }
        self.owners.insert(asset_id, owner);
        Ok(())
    }

    /// Mint `quantity` units of a multi-unit asset to `owner`.
    ///
    /// # Errors
    ///
    /// Fails on a single-owner collection or for a zero quantity.
    pub fn mint_units(&mut self, asset_id: AssetId, owner: Address, quantity: u64) -> Result<()> {
        if self.protocol != AssetProtocol::MultiUnit {
            return Err(LedgerError::protocol_mismatch(format!(
                "collection {} is {}, cannot mint units",
                self.id, self.protocol
            )));
        }
        if quantity == 0 {
            return Err(LedgerError::invalid_amount("cannot mint zero units"));
        }
        let held = self.balances.entry((asset_id, owner)).or_insert(0);
        *held = held.saturating_add(quantity);
        Ok(())
    }

    /// Units of `asset_id` held by `owner`. One or zero for single-owner.
    #[must_use]
    pub fn balance_of(&self, owner: &Address, asset_id: AssetId) -> u64 {
        match self.protocol {
            AssetProtocol::SingleOwner => {
                u64::from(self.owners.get(&asset_id) == Some(owner))
            }
            AssetProtocol::MultiUnit => self
                .balances
                .get(&(asset_id, owner.clone()))
                .copied()
                .unwrap_or(0),
        }
    }

    /// Current holder of a single-owner asset.
    ///
    /// # Errors
    ///
    /// Fails on a multi-unit collection or an unknown asset id.
    pub fn owner_of(&self, asset_id: AssetId) -> Result<&Address> {
        if self.protocol != AssetProtocol::SingleOwner {
            return Err(LedgerError::protocol_mismatch(format!(
                "collection {} is {}, assets have no single owner",
                self.id, self.protocol
            )));
        }
        self.owners.get(&asset_id).ok_or(LedgerError::UnknownAsset {
            collection: self.id,
            asset_id,
        })
    }

    /// Grant or revoke a per-asset spender (single-owner only).
    ///
    /// # Errors
    ///
    /// Fails on a multi-unit collection or if `caller` does not hold the
    /// asset.
    pub fn approve_spender(
        &mut self,
        caller: &Address,
        asset_id: AssetId,
        spender: Option<Address>,
    ) -> Result<()> {
        if self.protocol != AssetProtocol::SingleOwner {
            return Err(LedgerError::protocol_mismatch(
                "per-asset approval only exists for single-owner collections",
            ));
        }
        let owner = self.owner_of(asset_id)?;
        if owner != caller {
            return Err(LedgerError::NotAuthorized {
                owner: owner.to_string(),
                operator: caller.to_string(),
                asset_id,
            });
        }
        match spender {
            Some(spender) => {
                self.spenders.insert(asset_id, spender);
            }
            None => {
                self.spenders.remove(&asset_id);
            }
        }
        Ok(())
    }

    /// Grant or revoke a blanket operator for everything `caller` holds in
    /// this collection.
    pub fn set_operator(&mut self, caller: &Address, operator: Address, approved: bool) {
        let grants = self.operators.entry(caller.clone()).or_default();
        if approved {
            grants.insert(operator);
        } else {
            grants.remove(&operator);
        }
    }

    /// Whether `operator` may move `asset_id` on behalf of `owner` right now.
    ///
    /// Blanket grants satisfy both protocols; a per-asset spender grant
    /// additionally satisfies single-owner assets.
    #[must_use]
    pub fn is_authorized(&self, owner: &Address, operator: &Address, asset_id: AssetId) -> bool {
        if owner == operator {
            return true;
        }
        if self
            .operators
            .get(owner)
            .is_some_and(|grants| grants.contains(operator))
        {
            return true;
        }
        self.protocol == AssetProtocol::SingleOwner
            && self.spenders.get(&asset_id) == Some(operator)
            && self.owners.get(&asset_id) == Some(owner)
    }

    /// Move `quantity` units of `asset_id` from `from` to `to`, on the
    /// authority of `operator`.
    ///
    /// Authorization and balances are checked at call time, not assumed from
    /// any earlier query. A single-owner transfer clears the per-asset
    /// spender grant.
    ///
    /// # Errors
    ///
    /// Fails if the operator is not authorized, the holder's balance is
    /// short, or the quantity does not fit the protocol.
    pub fn transfer(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        asset_id: AssetId,
        quantity: u64,
    ) -> Result<()> {
        if !self.is_authorized(from, operator, asset_id) {
            return Err(LedgerError::NotAuthorized {
                owner: from.to_string(),
                operator: operator.to_string(),
                asset_id,
            });
        }
        match self.protocol {
            AssetProtocol::SingleOwner => {
                if quantity != 1 {
                    return Err(LedgerError::protocol_mismatch(
                        "single-owner transfers move exactly one unit",
                    ));
                }
                let owner = self.owner_of(asset_id)?;
                if owner != from {
                    return Err(LedgerError::InsufficientAssets {
                        owner: from.to_string(),
                        asset_id,
                        held: 0,
                        need: 1,
                    });
                }
                self.owners.insert(asset_id, to.clone());
                self.spenders.remove(&asset_id);
            }
            AssetProtocol::MultiUnit => {
                if quantity == 0 {
                    return Err(LedgerError::invalid_amount("cannot transfer zero units"));
                }
                let held = self.balance_of(from, asset_id);
                if held < quantity {
                    return Err(LedgerError::InsufficientAssets {
                        owner: from.to_string(),
                        asset_id,
                        held,
                        need: quantity,
                    });
                }
                self.balances
                    .insert((asset_id, from.clone()), held - quantity);
                let received = self.balances.entry((asset_id, to.clone())).or_insert(0);
                *received = received.saturating_add(quantity);
            }
        }
        Ok(())
    }
}

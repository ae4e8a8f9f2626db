//! Events surfaced to external observers.
//!
//! The market appends events to an in-order journal as operations commit;
//! the journal order is the settlement order.

use serde::{Deserialize, Serialize};

use tessera_ledger::{Address, Amount, AssetId, AssetProtocol, CollectionId, TokenId};
use tessera_oracle::FeedId;

use crate::methods::MethodId;
use crate::offer::OfferId;

/// An observable marketplace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// A new offer was registered.
    OfferCreated {
        /// Assigned offer id.
        id: OfferId,
        /// Listing identity.
        creator: Address,
        /// Collection holding the asset.
        collection: CollectionId,
        /// Asset within the collection.
        asset_id: AssetId,
        /// Units for sale.
        quantity: u64,
        /// Reference price in base units.
        price: Amount,
        /// Transfer protocol of the collection.
        protocol: AssetProtocol,
        /// Unix timestamp at creation.
        created_at: i64,
    },
    /// An offer was withdrawn by its creator.
    OfferCancelled {
        /// Offer id.
        id: OfferId,
        /// Listing identity.
        creator: Address,
        /// Collection holding the asset.
        collection: CollectionId,
        /// Asset within the collection.
        asset_id: AssetId,
        /// Unix timestamp at cancellation.
        cancelled_at: i64,
    },
    /// An offer settled.
    OfferSold {
        /// Offer id.
        id: OfferId,
        /// Paying party.
        buyer: Address,
        /// Collection holding the asset.
        collection: CollectionId,
        /// Asset within the collection.
        asset_id: AssetId,
        /// Unix timestamp at settlement.
        sold_at: i64,
    },
    /// A payment method was appended to the registry.
    NewPaymentMethod {
        /// Assigned method id.
        id: MethodId,
        /// Rate feed backing the method.
        feed: FeedId,
        /// Token the method settles in.
        token: TokenId,
    },
}

//! # tessera-market
//!
//! Marketplace engine for tokenized assets: offers with a forward-only
//! lifecycle, an append-only payment method registry, oracle-backed price
//! resolution, and atomic settlement with a configurable fee split.
//!
//! The market never takes custody. Assets stay with their creators until
//! settlement, which executes as one indivisible ledger instruction:
//! payment collection, fee split, and asset conveyance commit together or
//! not at all.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tessera_ledger::{Amount, AssetProtocol, LedgerClient, Wallet};
//! use tessera_market::{Market, NATIVE_METHOD_ID};
//! use tessera_oracle::OracleBoard;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = Arc::new(LedgerClient::new());
//! let oracle = Arc::new(OracleBoard::new());
//! let admin = Wallet::generate()?;
//! let market = Market::new(
//!     Arc::clone(&ledger),
//!     Arc::clone(&oracle),
//!     admin.address().clone(),
//!     admin.address().clone(),
//!     250,
//! )?;
//!
//! let seller = Wallet::generate()?;
//! let collection = ledger.create_collection(AssetProtocol::MultiUnit).await;
//! ledger.mint_units(collection, 7, seller.address(), 100).await?;
//! ledger
//!     .set_operator(&seller, collection, market.operator(), true)
//!     .await?;
//!
//! let offer = market
//!     .create_offer(seller.address(), collection, 7, 10, 3_600, Amount::from_units(5_000))
//!     .await?;
//! market.activate_offer(seller.address(), offer).await?;
//! let price = market.get_price(offer, NATIVE_METHOD_ID).await?;
//! # let _ = price;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod market;
pub mod methods;
pub mod offer;
pub mod pricing;

pub use error::MarketError;
pub use events::MarketEvent;
pub use market::{Market, MarketConfig};
pub use methods::{MethodId, MethodKind, PaymentMethod, NATIVE_METHOD_ID};
pub use offer::{Offer, OfferId, OfferState};
pub use pricing::{quote_amount, rescale, split_fee, BASE_DECIMALS, BPS_DENOMINATOR};

//! # tessera-oracle
//!
//! Price feed board for the Tessera marketplace.
//!
//! Feeds publish the exchange rate between the market's reference base
//! currency and a payment token. The board keeps the latest quote per feed
//! with a freshness stamp and leaves staleness policy to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod board;
pub mod error;

pub use board::{FeedId, OracleBoard, Quote};
pub use error::{OracleError, Result};

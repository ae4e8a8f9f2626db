//! The feed board: registered rate feeds and their latest quotes.
//!
//! A feed publishes the exchange rate of the market's reference base
//! currency per one whole payment token, as a fixed-point integer with the
//! feed's declared decimals. The board keeps only the latest quote per feed
//! together with the timestamp it arrived; it enforces no staleness bound —
//! the stamp is surfaced so callers can apply their own.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{OracleError, Result};

/// Identifier of a registered feed.
pub type FeedId = u32;

/// The latest published rate of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Base-currency units per one whole payment token, fixed-point.
    pub rate: u64,
    /// Decimal precision of `rate`.
    pub decimals: u32,
    /// Unix timestamp when the rate was published.
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
struct Feed {
    description: String,
    decimals: u32,
    latest: Option<Quote>,
}

#[derive(Debug, Default)]
struct BoardState {
    feeds: HashMap<FeedId, Feed>,
    next_feed: FeedId,
}

/// Board of registered price feeds.
pub struct OracleBoard {
    state: Arc<Mutex<BoardState>>,
}

impl OracleBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::default())),
        }
    }

    /// Register a feed and return its id.
    pub async fn register_feed(&self, description: impl Into<String>, decimals: u32) -> FeedId {
        let mut state = self.state.lock().await;
        let id = state.next_feed;
        state.next_feed += 1;
        let description = description.into();
        state.feeds.insert(
            id,
            Feed {
                description: description.clone(),
                decimals,
                latest: None,
            },
        );
        info!(feed = id, description = %description, decimals, "feed registered");
        id
    }

    /// Publish a new rate for a feed, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown feed or a zero rate.
    pub async fn push_rate(&self, feed: FeedId, rate: u64) -> Result<()> {
        if rate == 0 {
            return Err(OracleError::invalid_rate("rate must be positive"));
        }
        let mut state = self.state.lock().await;
        let entry = state
            .feeds
            .get_mut(&feed)
            .ok_or(OracleError::UnknownFeed { id: feed })?;
        entry.latest = Some(Quote {
            rate,
            decimals: entry.decimals,
            updated_at: Utc::now().timestamp(),
        });
        debug!(feed, rate, "rate published");
        Ok(())
    }

    /// Latest quote of a feed.
    ///
    /// # Errors
    ///
    /// Returns error if the feed is unknown or has never published.
    pub async fn latest_rate(&self, feed: FeedId) -> Result<Quote> {
        let state = self.state.lock().await;
        let entry = state
            .feeds
            .get(&feed)
            .ok_or(OracleError::UnknownFeed { id: feed })?;
        entry.latest.ok_or(OracleError::NoData { id: feed })
    }

    /// Human-readable description of a feed.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown feed.
    pub async fn describe(&self, feed: FeedId) -> Result<String> {
        let state = self.state.lock().await;
        state
            .feeds
            .get(&feed)
            .map(|f| f.description.clone())
            .ok_or(OracleError::UnknownFeed { id: feed })
    }
}

impl Default for OracleBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for OracleBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleBoard").finish_non_exhaustive()
    }
}

//! Offers and their lifecycle state machine.
//!
//! An offer moves forward only: `Pending` to `Active` on activation,
//! `Pending` or `Active` to `Cancelled` on creator cancellation, `Active` to
//! `Sold` on settlement. `Sold` and `Cancelled` are terminal; an offer in a
//! terminal state is immutable and its id is never reused.

use serde::{Deserialize, Serialize};

use tessera_ledger::{Address, Amount, AssetId, AssetProtocol, CollectionId};

use crate::error::MarketError;

/// Identifier of an offer. Assigned monotonically, never reused.
pub type OfferId = u64;

/// Lifecycle state of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferState {
    /// Registered, not yet open for purchase.
    Pending,
    /// Open for purchase.
    Active,
    /// Settled. Terminal.
    Sold,
    /// Withdrawn by the creator. Terminal.
    Cancelled,
}

impl OfferState {
    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use OfferState::{Active, Cancelled, Pending, Sold};

        matches!(
            (self, target),
            (Pending, Active) | (Pending | Active, Cancelled) | (Active, Sold)
        )
    }

    /// Whether the state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sold | Self::Cancelled)
    }
}

impl std::fmt::Display for OfferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Active => write!(f, "Active"),
            Self::Sold => write!(f, "Sold"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A listing of a quantity of an asset at a reference price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// Unique, monotonically assigned identifier.
    pub id: OfferId,
    /// Identity that listed the asset. Only identity allowed to cancel, and
    /// the recipient of sale proceeds.
    pub creator: Address,
    /// Collection holding the asset.
    pub collection: CollectionId,
    /// Asset class or unit within the collection.
    pub asset_id: AssetId,
    /// Transfer protocol of the collection, captured at creation.
    pub protocol: AssetProtocol,
    /// Units conveyed on sale. Always 1 for single-owner.
    pub quantity: u64,
    /// Price in reference base units, independent of any payment token.
    pub reference_price: Amount,
    /// Informational listing window in seconds.
    pub duration_secs: u64,
    /// Unix timestamp after which the offer should be considered stale.
    /// Informational only; no transition is driven by it.
    pub expires_at: i64,
    /// Current lifecycle state.
    pub state: OfferState,
    /// Unix timestamp at creation.
    pub created_at: i64,
}

impl Offer {
    /// Attempt a state transition, rejecting anything the machine forbids.
    pub(crate) fn transition_to(
        &mut self,
        target: OfferState,
        action: &str,
    ) -> Result<(), MarketError> {
        if self.state.can_transition_to(&target) {
            self.state = target;
            Ok(())
        } else {
            Err(MarketError::invalid_state(action, self.state))
        }
    }

    /// Whether the informational listing window has passed.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    use tessera_ledger::Wallet;

    fn offer(state: OfferState) -> Offer {
        Offer {
            id: 1,
            creator: Wallet::generate().expect("wallet").address().clone(),
            collection: 1,
            asset_id: 7,
            protocol: AssetProtocol::MultiUnit,
            quantity: 10,
            reference_price: Amount::from_units(100),
            duration_secs: 3_600,
            expires_at: 1_000 + 3_600,
            state,
            created_at: 1_000,
        }
    }

    #[test_case(OfferState::Pending, OfferState::Active => true; "pending activates")]
    #[test_case(OfferState::Pending, OfferState::Cancelled => true; "pending cancels")]
    #[test_case(OfferState::Active, OfferState::Cancelled => true; "active cancels")]
    #[test_case(OfferState::Active, OfferState::Sold => true; "active sells")]
    #[test_case(OfferState::Pending, OfferState::Sold => false; "no sale without activation")]
    #[test_case(OfferState::Active, OfferState::Pending => false; "no going back")]
    #[test_case(OfferState::Active, OfferState::Active => false; "no re-entry")]
    #[test_case(OfferState::Sold, OfferState::Cancelled => false; "sold is terminal")]
    #[test_case(OfferState::Sold, OfferState::Active => false; "sold never reopens")]
    #[test_case(OfferState::Cancelled, OfferState::Active => false; "cancelled is terminal")]
    #[test_case(OfferState::Cancelled, OfferState::Sold => false; "cancelled never sells")]
    fn transition_rules(from: OfferState, to: OfferState) -> bool {
        from.can_transition_to(&to)
    }

    #[test]
    fn terminal_states() {
        assert!(!OfferState::Pending.is_terminal());
        assert!(!OfferState::Active.is_terminal());
        assert!(OfferState::Sold.is_terminal());
        assert!(OfferState::Cancelled.is_terminal());
    }

    #[test]
    fn transition_updates_state() {
        let mut o = offer(OfferState::Pending);
        o.transition_to(OfferState::Active, "activate").expect("transition");
        assert_eq!(o.state, OfferState::Active);
    }

    #[test]
    fn forbidden_transition_reports_current_state() {
        let mut o = offer(OfferState::Sold);
        let err = o
            .transition_to(OfferState::Cancelled, "cancel")
            .expect_err("should reject");
        assert!(err.to_string().contains("Sold"));
        assert_eq!(o.state, OfferState::Sold);
    }

    #[test]
    fn expiry_is_informational() {
        let o = offer(OfferState::Active);
        assert!(!o.is_expired(o.created_at));
        assert!(o.is_expired(o.expires_at));
        // Still Active regardless.
        assert_eq!(o.state, OfferState::Active);
    }

    #[test]
    fn offer_serialization() {
        let o = offer(OfferState::Pending);
        let json = serde_json::to_string(&o).expect("serialize");
        let parsed: Offer = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, o.id);
        assert_eq!(parsed.state, o.state);
        assert_eq!(parsed.reference_price, o.reference_price);
    }
}

//! The marketplace: offer registry, payment method table, price resolution,
//! and the settlement engine.
//!
//! All mutating operations execute one at a time against the market's own
//! state lock, so no half-applied state is ever observable. Settlement hands
//! the ledger one atomic instruction: payment collection, fee split, and
//! asset transfer either all commit or none do, and a failed attempt leaves
//! the offer `Active` for a fresh try.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use tessera_ledger::{
    Address, Amount, AssetId, AssetLeg, AssetProtocol, CollectionId, LedgerClient, LedgerError,
    PaymentSource, SettlementInstruction, SettlementReceipt, TokenId, Wallet, NATIVE_DECIMALS,
};
use tessera_oracle::{FeedId, OracleBoard};

use crate::error::MarketError;
use crate::events::MarketEvent;
use crate::methods::{MethodId, MethodKind, PaymentMethod, NATIVE_METHOD_ID};
use crate::offer::{Offer, OfferId, OfferState};
use crate::pricing::{quote_amount, rescale, split_fee, BASE_DECIMALS};

/// Mutable marketplace configuration. Changed only by the admin, always as
/// an atomic overwrite.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Identity allowed to change configuration and add payment methods.
    pub admin: Address,
    /// Destination of protocol fees.
    pub fee_recipient: Address,
    /// Protocol fee in basis points of the gross payment.
    pub fee_bps: u16,
}

#[derive(Debug)]
struct MarketState {
    config: MarketConfig,
    offers: BTreeMap<OfferId, Offer>,
    next_offer: OfferId,
    methods: Vec<PaymentMethod>,
    events: Vec<MarketEvent>,
    receipts: HashMap<OfferId, SettlementReceipt>,
}

impl MarketState {
    fn offer(&self, id: OfferId) -> Result<&Offer, MarketError> {
        self.offers.get(&id).ok_or(MarketError::UnknownOffer(id))
    }

    fn offer_mut(&mut self, id: OfferId) -> Result<&mut Offer, MarketError> {
        self.offers
            .get_mut(&id)
            .ok_or(MarketError::UnknownOffer(id))
    }

    fn method(&self, id: MethodId) -> Result<PaymentMethod, MarketError> {
        self.methods
            .get(id as usize)
            .copied()
            .ok_or(MarketError::UnknownMethod(id))
    }

    fn require_admin(&self, caller: &Address, action: &str) -> Result<(), MarketError> {
        if caller == &self.config.admin {
            Ok(())
        } else {
            Err(MarketError::unauthorized(action, "market admin"))
        }
    }

    fn emit(&mut self, event: MarketEvent) {
        self.events.push(event);
    }
}

/// The marketplace engine.
pub struct Market {
    ledger: Arc<LedgerClient>,
    oracle: Arc<OracleBoard>,
    operator: Address,
    state: Mutex<MarketState>,
}

impl Market {
    /// Create a market with the given admin, fee recipient, and fee.
    ///
    /// The reserved native-currency payment method is installed as method 0.
    /// The market mints its own operator identity; creators authorize that
    /// identity on the ledger to make their offers sellable.
    ///
    /// # Errors
    ///
    /// Returns error if the fee exceeds 10 000 basis points or the operator
    /// identity cannot be generated.
    pub fn new(
        ledger: Arc<LedgerClient>,
        oracle: Arc<OracleBoard>,
        admin: Address,
        fee_recipient: Address,
        fee_bps: u16,
    ) -> Result<Self, MarketError> {
        if fee_bps > 10_000 {
            return Err(MarketError::invalid_parameter(format!(
                "fee must be at most 10000 bps, got {fee_bps}"
            )));
        }
        let operator = Wallet::generate()?.address().clone();
        let native = PaymentMethod {
            id: NATIVE_METHOD_ID,
            kind: MethodKind::Native,
            decimals: NATIVE_DECIMALS,
        };
        Ok(Self {
            ledger,
            oracle,
            operator,
            state: Mutex::new(MarketState {
                config: MarketConfig {
                    admin,
                    fee_recipient,
                    fee_bps,
                },
                offers: BTreeMap::new(),
                next_offer: 1,
                methods: vec![native],
                events: Vec::new(),
                receipts: HashMap::new(),
            }),
        })
    }

    /// The identity creators must authorize for asset transfers.
    #[must_use]
    pub fn operator(&self) -> &Address {
        &self.operator
    }

    // ---- offer registry ----

    /// Register a new offer in `Pending` state. No asset custody occurs.
    ///
    /// # Errors
    ///
    /// Returns error for a zero quantity or price, a quantity other than one
    /// on a single-owner collection, or an unknown collection.
    pub async fn create_offer(
        &self,
        caller: &Address,
        collection: CollectionId,
        asset_id: AssetId,
        quantity: u64,
        duration_secs: u64,
        reference_price: Amount,
    ) -> Result<OfferId, MarketError> {
        if quantity == 0 {
            return Err(MarketError::invalid_parameter("quantity must be positive"));
        }
        if reference_price.is_zero() {
            return Err(MarketError::invalid_parameter(
                "reference price must be positive",
            ));
        }
        let protocol = self.ledger.collection_protocol(collection).await?;
        if protocol == AssetProtocol::SingleOwner && quantity != 1 {
            return Err(MarketError::invalid_parameter(
                "single-owner offers convey exactly one unit",
            ));
        }

        let mut state = self.state.lock().await;
        let id = state.next_offer;
        state.next_offer += 1;
        let created_at = Utc::now().timestamp();
        let offer = Offer {
            id,
            creator: caller.clone(),
            collection,
            asset_id,
            protocol,
            quantity,
            reference_price,
            duration_secs,
            expires_at: created_at.saturating_add_unsigned(duration_secs),
            state: OfferState::Pending,
            created_at,
        };
        state.offers.insert(id, offer);
        state.emit(MarketEvent::OfferCreated {
            id,
            creator: caller.clone(),
            collection,
            asset_id,
            quantity,
            price: reference_price,
            protocol,
            created_at,
        });
        info!(offer = id, creator = %caller, collection, asset_id, quantity, price = %reference_price, "offer created");
        Ok(id)
    }

    /// Open a pending offer for purchase.
    ///
    /// The creator must have granted the market operator sale-time transfer
    /// authorization appropriate to the protocol: a blanket operator grant
    /// for multi-unit, blanket or per-asset for single-owner. The grant is
    /// checked again at settlement; activation does not cache it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a non-creator caller, `InvalidState`
    /// unless the offer is `Pending`, `NotApproved` if the grant is absent.
    pub async fn activate_offer(&self, caller: &Address, id: OfferId) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        let offer = state.offer(id)?;
        if &offer.creator != caller {
            return Err(MarketError::unauthorized("activate offer", "offer creator"));
        }
        if offer.state != OfferState::Pending {
            return Err(MarketError::invalid_state("activate", offer.state));
        }
        let authorized = self
            .ledger
            .is_authorized(&offer.creator, &self.operator, offer.collection, offer.asset_id)
            .await?;
        if !authorized {
            return Err(MarketError::NotApproved {
                owner: offer.creator.to_string(),
                asset_id: offer.asset_id,
            });
        }
        state.offer_mut(id)?.transition_to(OfferState::Active, "activate")?;
        info!(offer = id, "offer activated");
        Ok(())
    }

    /// Withdraw a pending or active offer. No asset or payment movement —
    /// nothing was custodied.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a non-creator caller, `InvalidState` for a
    /// terminal offer.
    pub async fn cancel_offer(&self, caller: &Address, id: OfferId) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        let offer = state.offer(id)?;
        if &offer.creator != caller {
            return Err(MarketError::unauthorized("cancel offer", "offer creator"));
        }
        let (collection, asset_id) = (offer.collection, offer.asset_id);
        state.offer_mut(id)?.transition_to(OfferState::Cancelled, "cancel")?;
        let cancelled_at = Utc::now().timestamp();
        state.emit(MarketEvent::OfferCancelled {
            id,
            creator: caller.clone(),
            collection,
            asset_id,
            cancelled_at,
        });
        info!(offer = id, "offer cancelled");
        Ok(())
    }

    /// Read-only projection of an offer.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown id.
    pub async fn get_offer(&self, id: OfferId) -> Result<Offer, MarketError> {
        Ok(self.state.lock().await.offer(id)?.clone())
    }

    /// All offers in id order.
    pub async fn list_offers(&self) -> Vec<Offer> {
        self.state.lock().await.offers.values().cloned().collect()
    }

    /// Offers currently open for purchase.
    pub async fn list_active_offers(&self) -> Vec<Offer> {
        self.state
            .lock()
            .await
            .offers
            .values()
            .filter(|o| o.state == OfferState::Active)
            .cloned()
            .collect()
    }

    /// Offers listed by `creator`, in id order.
    pub async fn list_offers_by_creator(&self, creator: &Address) -> Vec<Offer> {
        self.state
            .lock()
            .await
            .offers
            .values()
            .filter(|o| &o.creator == creator)
            .cloned()
            .collect()
    }

    // ---- payment methods ----

    /// Append a token payment method backed by a rate feed.
    ///
    /// The table is append-only and never deduplicated: adding the same
    /// token twice creates two independent methods, which is left to
    /// administrative care.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a non-admin caller or an error for an
    /// unknown token.
    pub async fn add_payment_method(
        &self,
        caller: &Address,
        token: TokenId,
        feed: FeedId,
    ) -> Result<MethodId, MarketError> {
        let mut state = self.state.lock().await;
        state.require_admin(caller, "add payment method")?;
        let decimals = self.ledger.token_decimals(token).await?;
        let id = state.methods.len() as MethodId;
        state.methods.push(PaymentMethod {
            id,
            kind: MethodKind::Token { token, feed },
            decimals,
        });
        state.emit(MarketEvent::NewPaymentMethod { id, feed, token });
        info!(method = id, token, feed, decimals, "payment method added");
        Ok(id)
    }

    /// A payment method table entry.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown id.
    pub async fn payment_method(&self, id: MethodId) -> Result<PaymentMethod, MarketError> {
        self.state.lock().await.method(id)
    }

    /// All registered payment methods in id order.
    pub async fn list_payment_methods(&self) -> Vec<PaymentMethod> {
        self.state.lock().await.methods.clone()
    }

    // ---- price resolution ----

    /// Resolve the current price of an offer in a payment method's token.
    ///
    /// The rate is read fresh at call time; a caller that quotes now and
    /// settles later races the rate and should apply its own tolerance
    /// margin before authorizing payment.
    ///
    /// # Errors
    ///
    /// Returns error for unknown ids, an unavailable or zero rate, or a
    /// price that overflows the token's representation.
    pub async fn get_price(
        &self,
        offer_id: OfferId,
        method_id: MethodId,
    ) -> Result<Amount, MarketError> {
        let (reference_price, method) = {
            let state = self.state.lock().await;
            (state.offer(offer_id)?.reference_price, state.method(method_id)?)
        };
        self.resolve_amount(reference_price, &method).await
    }

    async fn resolve_amount(
        &self,
        reference_price: Amount,
        method: &PaymentMethod,
    ) -> Result<Amount, MarketError> {
        let units = match method.kind {
            MethodKind::Native => rescale(reference_price.units(), BASE_DECIMALS, method.decimals),
            MethodKind::Token { feed, .. } => {
                let quote = self.oracle.latest_rate(feed).await?;
                quote_amount(
                    reference_price.units(),
                    quote.rate,
                    quote.decimals,
                    method.decimals,
                )
            }
        };
        units.map(Amount::from_units).ok_or_else(|| {
            MarketError::invalid_parameter("resolved price overflows the payment token")
        })
    }

    // ---- settlement ----

    /// Purchase an active offer.
    ///
    /// Resolves the price in the chosen method, collects payment (attached
    /// native value, or a token pull through the buyer's allowance for the
    /// market operator), splits fee and proceeds, conveys the asset, and
    /// marks the offer `Sold` — atomically. Any failure leaves the offer
    /// `Active` with no funds or assets moved; a later call is a fresh
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the offer is `Active`,
    /// `InsufficientPayment` if the attached native value or the buyer's
    /// native balance falls short, `NotApproved` if the creator's transfer
    /// authorization is gone, or a ledger error for missing token funds,
    /// allowance, or asset balance.
    pub async fn buy_offer(
        &self,
        buyer: &Address,
        offer_id: OfferId,
        method_id: MethodId,
        attached: Option<Amount>,
    ) -> Result<SettlementReceipt, MarketError> {
        let mut state = self.state.lock().await;

        let offer = state.offer(offer_id)?;
        if offer.state != OfferState::Active {
            return Err(MarketError::invalid_state("settle", offer.state));
        }
        let offer = offer.clone();
        let method = state.method(method_id)?;

        let amount = self.resolve_amount(offer.reference_price, &method).await?;
        let (fee, _proceeds) = split_fee(amount.units(), state.config.fee_bps);

        let source = match method.kind {
            MethodKind::Native => {
                let attached = attached.unwrap_or(Amount::ZERO);
                if attached < amount {
                    return Err(MarketError::InsufficientPayment {
                        required: amount.units(),
                        attached: attached.units(),
                    });
                }
                PaymentSource::Native { attached }
            }
            MethodKind::Token { token, .. } => {
                if attached.is_some() {
                    return Err(MarketError::invalid_parameter(
                        "attached value only applies to the native method",
                    ));
                }
                PaymentSource::Token { token }
            }
        };

        let instruction = SettlementInstruction {
            buyer: buyer.clone(),
            seller: offer.creator.clone(),
            amount,
            fee: Amount::from_units(fee),
            fee_recipient: state.config.fee_recipient.clone(),
            operator: self.operator.clone(),
            source,
            asset: AssetLeg {
                collection: offer.collection,
                asset_id: offer.asset_id,
                quantity: offer.quantity,
            },
        };

        let receipt = match self.ledger.settle(&instruction).await {
            Ok(receipt) => receipt,
            Err(LedgerError::NotAuthorized { .. }) => {
                warn!(offer = offer_id, "settlement rejected: authorization revoked");
                return Err(MarketError::NotApproved {
                    owner: offer.creator.to_string(),
                    asset_id: offer.asset_id,
                });
            }
            // An attached native value is only a claim; the debitable
            // balance is what counts.
            Err(LedgerError::InsufficientFunds { have, need })
                if matches!(instruction.source, PaymentSource::Native { .. }) =>
            {
                return Err(MarketError::InsufficientPayment {
                    required: need,
                    attached: have,
                });
            }
            Err(e) => return Err(e.into()),
        };

        state.offer_mut(offer_id)?.transition_to(OfferState::Sold, "settle")?;
        let sold_at = receipt.executed_at;
        state.emit(MarketEvent::OfferSold {
            id: offer_id,
            buyer: buyer.clone(),
            collection: offer.collection,
            asset_id: offer.asset_id,
            sold_at,
        });
        state.receipts.insert(offer_id, receipt.clone());
        info!(
            offer = offer_id,
            buyer = %buyer,
            method = method_id,
            amount = %receipt.amount,
            fee = %receipt.fee,
            "offer sold"
        );
        Ok(receipt)
    }

    /// Receipt of a settled offer, if it has sold.
    pub async fn receipt_for(&self, offer_id: OfferId) -> Option<SettlementReceipt> {
        self.state.lock().await.receipts.get(&offer_id).cloned()
    }

    // ---- configuration ----

    /// Overwrite the protocol fee.
    ///
    /// Offers already sold are unaffected: the fee was captured at their
    /// settlement time.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a non-admin caller, `InvalidParameter`
    /// beyond 10 000 bps.
    pub async fn set_fee(&self, caller: &Address, fee_bps: u16) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        state.require_admin(caller, "set fee")?;
        if fee_bps > 10_000 {
            return Err(MarketError::invalid_parameter(format!(
                "fee must be at most 10000 bps, got {fee_bps}"
            )));
        }
        state.config.fee_bps = fee_bps;
        info!(fee_bps, "fee updated");
        Ok(())
    }

    /// Overwrite the fee recipient.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a non-admin caller.
    pub async fn set_recipient(
        &self,
        caller: &Address,
        recipient: Address,
    ) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        state.require_admin(caller, "set recipient")?;
        info!(recipient = %recipient, "fee recipient updated");
        state.config.fee_recipient = recipient;
        Ok(())
    }

    /// Current fee in basis points.
    pub async fn fee_bps(&self) -> u16 {
        self.state.lock().await.config.fee_bps
    }

    /// Current fee recipient.
    pub async fn fee_recipient(&self) -> Address {
        self.state.lock().await.config.fee_recipient.clone()
    }

    /// The configuration admin.
    pub async fn admin(&self) -> Address {
        self.state.lock().await.config.admin.clone()
    }

    // ---- events ----

    /// Snapshot of the event journal, in settlement order.
    pub async fn events(&self) -> Vec<MarketEvent> {
        self.state.lock().await.events.clone()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Market")
            .field("operator", &self.operator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Wallet {
        Wallet::generate().expect("wallet")
    }

    async fn market() -> (Market, Wallet, Wallet) {
        let admin = wallet();
        let recipient = wallet();
        let market = Market::new(
            Arc::new(LedgerClient::new()),
            Arc::new(OracleBoard::new()),
            admin.address().clone(),
            recipient.address().clone(),
            100,
        )
        .expect("market");
        (market, admin, recipient)
    }

    #[tokio::test]
    async fn test_construction_installs_native_method() {
        let (market, _, _) = market().await;
        let methods = market.list_payment_methods().await;
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].id, NATIVE_METHOD_ID);
        assert!(methods[0].is_native());
        assert_eq!(methods[0].decimals, NATIVE_DECIMALS);
    }

    #[tokio::test]
    async fn test_construction_rejects_fee_over_limit() {
        let admin = wallet();
        let result = Market::new(
            Arc::new(LedgerClient::new()),
            Arc::new(OracleBoard::new()),
            admin.address().clone(),
            admin.address().clone(),
            10_001,
        );
        assert!(matches!(result, Err(MarketError::InvalidParameter { .. })));
    }

    #[tokio::test]
    async fn test_initial_config_readable() {
        let (market, admin, recipient) = market().await;
        assert_eq!(market.fee_bps().await, 100);
        assert_eq!(&market.fee_recipient().await, recipient.address());
        assert_eq!(&market.admin().await, admin.address());
    }

    #[tokio::test]
    async fn test_admin_changes_fee_and_recipient() {
        let (market, admin, _) = market().await;
        let other = wallet();

        market.set_fee(admin.address(), 200).await.expect("set fee");
        market
            .set_recipient(admin.address(), other.address().clone())
            .await
            .expect("set recipient");

        assert_eq!(market.fee_bps().await, 200);
        assert_eq!(&market.fee_recipient().await, other.address());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_change_config() {
        let (market, _, _) = market().await;
        let stranger = wallet();

        assert!(matches!(
            market.set_fee(stranger.address(), 50).await,
            Err(MarketError::Unauthorized { .. })
        ));
        assert!(matches!(
            market
                .set_recipient(stranger.address(), stranger.address().clone())
                .await,
            Err(MarketError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_fee_bounds_on_update() {
        let (market, admin, _) = market().await;
        assert!(matches!(
            market.set_fee(admin.address(), 10_001).await,
            Err(MarketError::InvalidParameter { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_add_method() {
        let (market, _, _) = market().await;
        let stranger = wallet();
        assert!(matches!(
            market.add_payment_method(stranger.address(), 0, 0).await,
            Err(MarketError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_offer_and_method() {
        let (market, _, _) = market().await;
        assert!(matches!(
            market.get_offer(99).await,
            Err(MarketError::UnknownOffer(99))
        ));
        assert!(matches!(
            market.payment_method(99).await,
            Err(MarketError::UnknownMethod(99))
        ));
        assert!(matches!(
            market.get_price(1, 0).await,
            Err(MarketError::UnknownOffer(1))
        ));
    }
}

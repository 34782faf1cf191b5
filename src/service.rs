//! Service layer API for trade negotiation operations.
//!
//! Thin translation layer over the lifecycle engine: authenticates the
//! caller through the identity seam, then delegates with the resolved user
//! id passed explicitly. All domain failures surface as [`TradeError`]
//! unchanged so the transport can map the taxonomy one-to-one.
use super::engine::TradeEngine;
use super::error::TradeError;
use super::identity::IdentityService;
use super::listing::ListingStore;
use super::trade::{TradeAction, TradeRecord};

pub struct TradeService<I: IdentityService, S: ListingStore> {
    identity: I,
    engine: TradeEngine<S>,
}

impl<I: IdentityService, S: ListingStore> TradeService<I, S> {
    pub fn new(identity: I, engine: TradeEngine<S>) -> Self {
        Self { identity, engine }
    }

    pub fn engine(&self) -> &TradeEngine<S> {
        &self.engine
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Propose a trade offering one of the caller's listings for somebody
    /// else's.
    pub fn propose_trade(
        &self,
        token: &str,
        offered_listing_id: &str,
        requested_listing_id: &str,
        message: &str,
    ) -> Result<TradeRecord, TradeError> {
        let caller = self.identity.authenticate(token)?;
        self.engine
            .propose(offered_listing_id, requested_listing_id, &caller, message)
    }

    /// Accept, reject, cancel or complete an existing trade.
    pub fn act_on_trade(
        &self,
        token: &str,
        trade_id: &str,
        action: TradeAction,
    ) -> Result<TradeRecord, TradeError> {
        let caller = self.identity.authenticate(token)?;
        self.engine.act(trade_id, &caller, action)
    }

    /// The caller's trades, sent and received, newest created first.
    pub fn list_trades(&self, token: &str) -> Result<Vec<TradeRecord>, TradeError> {
        let caller = self.identity.authenticate(token)?;
        self.engine.list_for(&caller)
    }
}

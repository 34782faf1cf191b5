//! The trade lifecycle state machine.
//!
//! Validates transitions against the table in `trade`, enforces the
//! authorization rules, and keeps listing availability consistent with the
//! trades that reference it. Listing status is only perturbed on acceptance
//! (reserves both items) and completion (finalizes), and is restored on any
//! path that reaches a terminal non-completed state after a reservation.
use super::error::TradeError;
use super::listing::{ListingStatus, ListingStore};
use super::repository::TradeRepository;
use super::trade::{TradeAction, TradeRecord, TradeStatus};
use super::utils;
use std::collections::HashMap;

#[derive(Clone)]
pub struct TradeEngine<S: ListingStore> {
    repo: TradeRepository,
    listings: S,
}

/// Listing status both referenced listings move to when a trade enters
/// `to`, or `None` when the transition leaves listings alone. A rejection
/// or cancellation only reverts listings if this trade had reserved them,
/// i.e. it was previously accepted.
fn listing_effect(from: TradeStatus, to: TradeStatus) -> Option<ListingStatus> {
    match to {
        TradeStatus::Accepted => Some(ListingStatus::Pending),
        TradeStatus::Completed => Some(ListingStatus::Traded),
        TradeStatus::Rejected | TradeStatus::Cancelled if from == TradeStatus::Accepted => {
            Some(ListingStatus::Available)
        }
        _ => None,
    }
}

impl<S: ListingStore> TradeEngine<S> {
    pub fn new(repo: TradeRepository, listings: S) -> Self {
        Self { repo, listings }
    }

    /// Propose a new trade: the caller offers one of their listings for a
    /// listing owned by someone else. Listings stay untouched until the
    /// receiver accepts, so one listing may sit in several pending
    /// proposals at once and the first acceptance wins.
    pub fn propose(
        &self,
        offered_listing_id: &str,
        requested_listing_id: &str,
        caller_id: &str,
        message: &str,
    ) -> Result<TradeRecord, TradeError> {
        let requested = self.listings.get(requested_listing_id)?;
        let offered = self.listings.get(offered_listing_id)?;

        if offered.owner != caller_id {
            return Err(TradeError::Forbidden(
                "you do not own the offered listing".into(),
            ));
        }
        if requested.owner == caller_id {
            return Err(TradeError::InvalidOperation(
                "cannot trade with yourself".into(),
            ));
        }

        let id = utils::mint_id("trade_")
            .map_err(|err| TradeError::Unavailable(err.to_string()))?;
        let record = TradeRecord::new(
            id,
            caller_id.to_string(),
            requested.owner,
            offered_listing_id.to_string(),
            requested_listing_id.to_string(),
            message,
        );
        self.repo.create(&record)?;

        Ok(record)
    }

    /// Apply one lifecycle action to a trade on behalf of `caller_id`.
    ///
    /// The record is re-read here and the transition is committed with a
    /// compare-and-swap against exactly those bytes, so two racing calls on
    /// one trade cannot both apply: the loser sees `Conflict`. Writes go in
    /// a fixed order (trade record first, then both listings); if a listing
    /// write fails the record swap is compensated before `Unavailable` is
    /// surfaced, and [`TradeEngine::reconcile`] repairs anything a crash
    /// leaves behind between the two steps.
    pub fn act(
        &self,
        trade_id: &str,
        caller_id: &str,
        action: TradeAction,
    ) -> Result<TradeRecord, TradeError> {
        let (record, stored) = self.repo.get_versioned(trade_id)?;

        let next = record.status.next(action).ok_or_else(|| {
            TradeError::InvalidOperation(format!(
                "cannot {action} a trade in status {}",
                record.status
            ))
        })?;
        if !record.authorizes(caller_id, action) {
            return Err(TradeError::Forbidden(format!(
                "caller is not authorized to {action} this trade"
            )));
        }

        let effect = listing_effect(record.status, next);

        // Resolve both listings before writing anything: a non-terminal
        // trade must reference live listings, and the prior offered status
        // is needed to compensate a half-applied side-effect.
        let offered_prior = match effect {
            Some(_) => {
                let prior = self.listings.get(&record.offered_listing)?.status;
                self.listings.get(&record.requested_listing)?;
                Some(prior)
            }
            None => None,
        };

        let mut updated = record.clone();
        updated.apply(next);
        let committed = self.repo.swap(trade_id, &stored, &updated)?;

        let (target, offered_prior) = match (effect, offered_prior) {
            (Some(target), Some(prior)) => (target, prior),
            _ => return Ok(updated),
        };

        if let Err(err) = self.listings.set_status(&updated.offered_listing, target) {
            let _ = self.repo.swap_raw(trade_id, &committed, &stored);
            return Err(TradeError::Unavailable(format!(
                "listing update failed, trade rolled back: {err}"
            )));
        }
        if let Err(err) = self.listings.set_status(&updated.requested_listing, target) {
            let _ = self.listings.set_status(&updated.offered_listing, offered_prior);
            let _ = self.repo.swap_raw(trade_id, &committed, &stored);
            return Err(TradeError::Unavailable(format!(
                "listing update failed, trade rolled back: {err}"
            )));
        }

        Ok(updated)
    }

    /// All trades the user participates in, newest created first.
    pub fn list_for(&self, user_id: &str) -> Result<Vec<TradeRecord>, TradeError> {
        self.repo.list_for_participant(user_id)
    }

    /// Repair listings left in a stale reserved state by a crash between
    /// the trade write and the listing writes. Recomputes each listing's
    /// expected status from the full trade set (a completed trade claims
    /// `traded`, an accepted one `pending`, anything else releases the
    /// reservation) and rewrites mismatched `pending`/`traded` listings.
    /// Returns the number of listings repaired.
    pub fn reconcile(&self) -> Result<usize, TradeError> {
        let mut expected: HashMap<String, ListingStatus> = HashMap::new();
        for trade in self.repo.list_all()? {
            let claim = match trade.status {
                TradeStatus::Accepted => ListingStatus::Pending,
                TradeStatus::Completed => ListingStatus::Traded,
                _ => continue,
            };
            for listing_id in [&trade.offered_listing, &trade.requested_listing] {
                let slot = expected
                    .entry(listing_id.clone())
                    .or_insert(claim);
                // a completed trade outranks a lingering accepted one
                if claim == ListingStatus::Traded {
                    *slot = ListingStatus::Traded;
                }
            }
        }

        let mut repaired = 0;
        for listing in self.listings.list_all()? {
            if listing.status == ListingStatus::Available {
                continue;
            }
            let want = expected
                .get(&listing.id)
                .copied()
                .unwrap_or(ListingStatus::Available);
            if want != listing.status {
                self.listings.set_status(&listing.id, want)?;
                repaired += 1;
            }
        }
        Ok(repaired)
    }
}

//! Item-for-item trade negotiation for a barter marketplace.
//!
//! The heart of the crate is [`engine::TradeEngine`], the state machine
//! moving a trade proposal through pending, accepted and the terminal
//! states while keeping the availability of the two listings involved
//! consistent. [`service::TradeService`] wraps it with caller
//! authentication; storage sits behind [`repository::TradeRepository`] and
//! the [`listing::ListingStore`] seam, both backed by sled.

pub mod engine;
pub mod error;
pub mod identity;
pub mod listing;
pub mod repository;
pub mod service;
pub mod trade;
pub mod utils;

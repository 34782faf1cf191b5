//! Identifier minting helpers.
//!
//! Every id in the system (trades, listings, users, session tokens) is a
//! uuid7 encoded as a bech32m string under a human-readable prefix, so ids
//! are both time-ordered and self-describing ("trade_1...", "listing_1...").

use bech32::Bech32m;
use uuid7::uuid7;

/// Mint a fresh id under the given human-readable prefix.
pub fn mint_id(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

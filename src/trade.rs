//! Core trade record model and the lifecycle transition table.
use super::error::TradeError;
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;

/// Lifecycle status of a trade proposal. `Pending` is the sole initial
/// state; `Rejected`, `Cancelled` and `Completed` are terminal.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Accepted,
    #[n(2)]
    Rejected,
    #[n(3)]
    Cancelled,
    #[n(4)]
    Completed,
}

/// Action a caller may attempt on an existing trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TradeStatus::Rejected | TradeStatus::Cancelled | TradeStatus::Completed
        )
    }

    /// Successor status for an action, or `None` when the edge is not in the
    /// transition table. The receiver may reject or either party may cancel
    /// an already-accepted trade right up until completion.
    pub fn next(&self, action: TradeAction) -> Option<TradeStatus> {
        match (self, action) {
            (TradeStatus::Pending, TradeAction::Accept) => Some(TradeStatus::Accepted),
            (TradeStatus::Pending, TradeAction::Reject) => Some(TradeStatus::Rejected),
            (TradeStatus::Pending, TradeAction::Cancel) => Some(TradeStatus::Cancelled),
            (TradeStatus::Accepted, TradeAction::Reject) => Some(TradeStatus::Rejected),
            (TradeStatus::Accepted, TradeAction::Cancel) => Some(TradeStatus::Cancelled),
            (TradeStatus::Accepted, TradeAction::Complete) => Some(TradeStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Rejected => "rejected",
            TradeStatus::Cancelled => "cancelled",
            TradeStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Accept => "accept",
            TradeAction::Reject => "reject",
            TradeAction::Cancel => "cancel",
            TradeAction::Complete => "complete",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(TradeAction::Accept),
            "reject" => Ok(TradeAction::Reject),
            "cancel" => Ok(TradeAction::Cancel),
            "complete" => Ok(TradeAction::Complete),
            other => Err(TradeError::InvalidOperation(format!(
                "unknown trade action '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone> PartialEq for TimeStamp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: TimeZone> Eq for TimeStamp<T> {}

impl<T: TimeZone> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn now() -> Self {
        Self(Utc::now())
    }
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// One trade proposal between two distinct listing owners. The two listing
/// ids are foreign references into the listing store, never embedded copies;
/// the engine re-resolves them whenever current listing state matters.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct TradeRecord {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub initiator: String,
    #[n(2)]
    pub receiver: String,
    #[n(3)]
    pub offered_listing: String,
    #[n(4)]
    pub requested_listing: String,
    #[n(5)]
    pub status: TradeStatus,
    #[n(6)]
    pub message: Option<String>,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
    #[n(8)]
    pub updated_at: TimeStamp<Utc>,
}

impl TradeRecord {
    /// New pending proposal. The receiver is the owner of the requested
    /// listing at proposal time. An empty or whitespace-only message is
    /// stored as none.
    pub fn new(
        id: String,
        initiator: String,
        receiver: String,
        offered_listing: String,
        requested_listing: String,
        message: &str,
    ) -> Self {
        let created = TimeStamp::now();
        let message = match message.trim() {
            "" => None,
            text => Some(text.to_string()),
        };

        Self {
            id,
            initiator,
            receiver,
            offered_listing,
            requested_listing,
            status: TradeStatus::Pending,
            message,
            created_at: created.clone(),
            updated_at: created,
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.initiator == user_id || self.receiver == user_id
    }

    /// Authorization table: the receiver decides accept/reject, while cancel
    /// and complete are held by both negotiating parties.
    pub fn authorizes(&self, caller_id: &str, action: TradeAction) -> bool {
        match action {
            TradeAction::Accept | TradeAction::Reject => self.receiver == caller_id,
            TradeAction::Cancel | TradeAction::Complete => self.is_participant(caller_id),
        }
    }

    /// Move to the successor status and refresh the updated timestamp.
    pub(crate) fn apply(&mut self, next: TradeStatus) {
        self.status = next;
        self.updated_at = TimeStamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TradeRecord {
        TradeRecord::new(
            "trade_1".into(),
            "user_a".into(),
            "user_b".into(),
            "listing_1".into(),
            "listing_2".into(),
            "  swap?  ",
        )
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::now();

        let encoding = minicbor::to_vec(&original).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn record_encoding() {
        let original = record();

        let encoding = minicbor::to_vec(&original).unwrap();
        let decode: TradeRecord = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn message_is_trimmed() {
        assert_eq!(record().message.as_deref(), Some("swap?"));

        let blank = TradeRecord::new(
            "trade_2".into(),
            "user_a".into(),
            "user_b".into(),
            "listing_1".into(),
            "listing_2".into(),
            "   ",
        );
        assert_eq!(blank.message, None);
    }

    #[test]
    fn terminal_states_have_no_successors() {
        let actions = [
            TradeAction::Accept,
            TradeAction::Reject,
            TradeAction::Cancel,
            TradeAction::Complete,
        ];
        for status in [
            TradeStatus::Rejected,
            TradeStatus::Cancelled,
            TradeStatus::Completed,
        ] {
            assert!(status.is_terminal());
            for action in actions {
                assert_eq!(status.next(action), None);
            }
        }
    }

    #[test]
    fn pending_cannot_complete() {
        assert_eq!(TradeStatus::Pending.next(TradeAction::Complete), None);
    }

    #[test]
    fn accepted_cannot_accept_again() {
        assert_eq!(TradeStatus::Accepted.next(TradeAction::Accept), None);
    }

    #[test]
    fn action_parses_from_wire_strings() {
        assert_eq!("accept".parse::<TradeAction>().unwrap(), TradeAction::Accept);
        assert_eq!("reject".parse::<TradeAction>().unwrap(), TradeAction::Reject);
        assert_eq!("cancel".parse::<TradeAction>().unwrap(), TradeAction::Cancel);
        assert_eq!(
            "complete".parse::<TradeAction>().unwrap(),
            TradeAction::Complete
        );
        assert!("approve".parse::<TradeAction>().is_err());
    }

    #[test]
    fn authorization_table() {
        let record = record();

        assert!(record.authorizes("user_b", TradeAction::Accept));
        assert!(!record.authorizes("user_a", TradeAction::Accept));
        assert!(!record.authorizes("user_a", TradeAction::Reject));
        assert!(record.authorizes("user_a", TradeAction::Cancel));
        assert!(record.authorizes("user_b", TradeAction::Cancel));
        assert!(record.authorizes("user_a", TradeAction::Complete));
        assert!(!record.authorizes("user_c", TradeAction::Cancel));
    }
}

//! Listing records and the availability store consulted by the lifecycle
//! engine.
//!
//! The engine only ever reads a listing's owner and writes its status; the
//! descriptive fields (title, category, value, condition) belong to the
//! surrounding marketplace plumbing and ride along in the same record.
use super::error::TradeError;
use super::trade::TimeStamp;
use chrono::Utc;

/// Availability of a listing. `Pending` is the reservation applied when a
/// trade referencing the listing is accepted; `Traded` is final.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    #[n(0)]
    Available,
    #[n(1)]
    Pending,
    #[n(2)]
    Traded,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    #[n(0)]
    Electronics,
    #[n(1)]
    Furniture,
    #[n(2)]
    Clothing,
    #[n(3)]
    Services,
    #[n(4)]
    Vehicles,
    #[n(5)]
    Other,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    #[n(0)]
    New,
    #[n(1)]
    LikeNew,
    #[n(2)]
    Good,
    #[n(3)]
    Fair,
    #[n(4)]
    Poor,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Listing {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub owner: String,
    #[n(2)]
    pub title: String,
    #[n(3)]
    pub description: String,
    #[n(4)]
    pub category: Category,
    #[n(5)]
    pub estimated_value: u64,
    #[n(6)]
    pub condition: Condition,
    #[n(7)]
    pub status: ListingStatus,
    #[n(8)]
    pub created_at: TimeStamp<Utc>,
}

impl Listing {
    /// New available listing with condition defaulting to `Good`.
    pub fn new(
        id: String,
        owner: String,
        title: String,
        description: String,
        category: Category,
        estimated_value: u64,
    ) -> Self {
        Self {
            id,
            owner,
            title,
            description,
            category,
            estimated_value,
            condition: Condition::Good,
            status: ListingStatus::Available,
            created_at: TimeStamp::now(),
        }
    }
}

/// Seam between the lifecycle engine and listing storage. `list_all` exists
/// only for the reconciliation sweep; transition side-effects go through
/// `set_status`.
pub trait ListingStore {
    fn get(&self, id: &str) -> Result<Listing, TradeError>;
    fn set_status(&self, id: &str, status: ListingStatus) -> Result<(), TradeError>;
    fn list_all(&self) -> Result<Vec<Listing>, TradeError>;
}

/// Sled-backed listing store sharing a database with the trade repository.
#[derive(Clone)]
pub struct SledListingStore {
    tree: sled::Tree,
}

impl SledListingStore {
    pub fn open(db: &sled::Db) -> Result<Self, TradeError> {
        Ok(Self {
            tree: db.open_tree("listings")?,
        })
    }

    /// Insert or replace a listing. Used by the marketplace CRUD plumbing
    /// and by tests to seed state; the engine itself never creates listings.
    pub fn insert(&self, listing: &Listing) -> Result<(), TradeError> {
        let bytes = minicbor::to_vec(listing)
            .map_err(|err| TradeError::Unavailable(err.to_string()))?;
        self.tree.insert(listing.id.as_bytes(), bytes)?;
        Ok(())
    }
}

impl ListingStore for SledListingStore {
    fn get(&self, id: &str) -> Result<Listing, TradeError> {
        let bytes = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| TradeError::NotFound(format!("listing {id}")))?;
        minicbor::decode(&bytes).map_err(|err| TradeError::Unavailable(err.to_string()))
    }

    fn set_status(&self, id: &str, status: ListingStatus) -> Result<(), TradeError> {
        let mut listing = self.get(id)?;
        listing.status = status;
        self.insert(&listing)
    }

    fn list_all(&self) -> Result<Vec<Listing>, TradeError> {
        let mut listings = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            let listing =
                minicbor::decode(&bytes).map_err(|err| TradeError::Unavailable(err.to_string()))?;
            listings.push(listing);
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_encoding() {
        let original = Listing::new(
            "listing_1".into(),
            "user_a".into(),
            "Road bike".into(),
            "Ten-speed, barely ridden".into(),
            Category::Other,
            250,
        );

        let encoding = minicbor::to_vec(&original).unwrap();
        let decode: Listing = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn new_listing_starts_available() {
        let listing = Listing::new(
            "listing_1".into(),
            "user_a".into(),
            "Couch".into(),
            "Three-seater".into(),
            Category::Furniture,
            120,
        );
        assert_eq!(listing.status, ListingStatus::Available);
        assert_eq!(listing.condition, Condition::Good);
    }
}

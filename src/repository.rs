//! Durable storage and lookup of trade records.
//!
//! Records live in their own sled tree keyed by trade id, serialized as
//! CBOR. The raw stored bytes double as the version for the optimistic
//! compare-and-swap the engine uses to serialize transitions per record.
use super::error::TradeError;
use super::trade::TradeRecord;

#[derive(Clone)]
pub struct TradeRepository {
    tree: sled::Tree,
}

fn encode(record: &TradeRecord) -> Result<Vec<u8>, TradeError> {
    minicbor::to_vec(record).map_err(|err| TradeError::Unavailable(err.to_string()))
}

fn decode(bytes: &[u8]) -> Result<TradeRecord, TradeError> {
    minicbor::decode(bytes).map_err(|err| TradeError::Unavailable(err.to_string()))
}

impl TradeRepository {
    pub fn open(db: &sled::Db) -> Result<Self, TradeError> {
        Ok(Self {
            tree: db.open_tree("trades")?,
        })
    }

    pub fn create(&self, record: &TradeRecord) -> Result<(), TradeError> {
        self.tree.insert(record.id.as_bytes(), encode(record)?)?;
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<TradeRecord, TradeError> {
        let (record, _) = self.get_versioned(id)?;
        Ok(record)
    }

    /// Load a record together with its stored bytes, which act as the
    /// version token for [`TradeRepository::swap`].
    pub(crate) fn get_versioned(&self, id: &str) -> Result<(TradeRecord, sled::IVec), TradeError> {
        let bytes = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| TradeError::NotFound(format!("trade {id}")))?;
        Ok((decode(&bytes)?, bytes))
    }

    /// Replace the stored record only if it still matches `expected`. A
    /// mismatch means a concurrent transition won the race; the caller gets
    /// `Conflict` and must re-read. Returns the newly stored bytes so the
    /// caller can roll the swap back if a later step fails.
    pub(crate) fn swap(
        &self,
        id: &str,
        expected: &sled::IVec,
        record: &TradeRecord,
    ) -> Result<sled::IVec, TradeError> {
        let new_bytes = sled::IVec::from(encode(record)?);
        self.tree
            .compare_and_swap(
                id.as_bytes(),
                Some(expected.clone()),
                Some(new_bytes.clone()),
            )?
            .map_err(|_| TradeError::Conflict(id.to_string()))?;
        Ok(new_bytes)
    }

    /// Best-effort compensating swap used when a listing update fails after
    /// the record was already advanced.
    pub(crate) fn swap_raw(
        &self,
        id: &str,
        expected: &sled::IVec,
        replacement: &sled::IVec,
    ) -> Result<(), TradeError> {
        self.tree
            .compare_and_swap(
                id.as_bytes(),
                Some(expected.clone()),
                Some(replacement.clone()),
            )?
            .map_err(|_| TradeError::Conflict(id.to_string()))?;
        Ok(())
    }

    /// All trades the user participates in, newest created first.
    pub fn list_for_participant(&self, user_id: &str) -> Result<Vec<TradeRecord>, TradeError> {
        let mut records: Vec<TradeRecord> = self
            .list_all()?
            .into_iter()
            .filter(|record| record.is_participant(user_id))
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    pub(crate) fn list_all(&self) -> Result<Vec<TradeRecord>, TradeError> {
        let mut records = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            records.push(decode(&bytes)?);
        }
        Ok(records)
    }
}

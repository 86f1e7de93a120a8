use crate::domain::models::SessionRecord;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::{KeyValueStore, read_json, write_json};
use std::sync::Arc;
use tracing::info;

pub const GUEST_HISTORY_KEY: &str = "focus_history";

/// Whose history bucket is open. Every guest shares the one guest bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOwner {
    User(i64),
    Guest,
}

impl HistoryOwner {
    pub fn storage_key(self) -> String {
        match self {
            Self::User(user_id) => format!("{GUEST_HISTORY_KEY}_{user_id}"),
            Self::Guest => GUEST_HISTORY_KEY.to_string(),
        }
    }
}

/// Completed focus sessions of one owner, newest first.
pub struct HistoryStore<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    owner: HistoryOwner,
    records: Vec<SessionRecord>,
}

impl<S> HistoryStore<S>
where
    S: KeyValueStore,
{
    pub fn load(store: Arc<S>, owner: HistoryOwner) -> Result<Self, InfraError> {
        let records = read_json::<Vec<SessionRecord>, _>(store.as_ref(), &owner.storage_key())?
            .unwrap_or_default();
        Ok(Self {
            store,
            owner,
            records,
        })
    }

    pub fn owner(&self) -> HistoryOwner {
        self.owner
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn append(&mut self, record: SessionRecord) -> Result<(), InfraError> {
        record.validate().map_err(InfraError::InvalidInput)?;
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(record);
        records.extend(self.records.iter().cloned());
        self.persist(records)?;
        info!(key = %self.owner.storage_key(), total = self.records.len(), "session recorded");
        Ok(())
    }

    /// Removes the record with `record_id`; absent ids are a no-op.
    pub fn delete(&mut self, record_id: i64) -> Result<bool, InfraError> {
        if !self.records.iter().any(|record| record.id == record_id) {
            return Ok(false);
        }
        let records = self
            .records
            .iter()
            .filter(|record| record.id != record_id)
            .cloned()
            .collect();
        self.persist(records)?;
        info!(key = %self.owner.storage_key(), record_id, "session deleted");
        Ok(true)
    }

    fn persist(&mut self, records: Vec<SessionRecord>) -> Result<(), InfraError> {
        write_json(self.store.as_ref(), &self.owner.storage_key(), &records)?;
        self.records = records;
        Ok(())
    }
}

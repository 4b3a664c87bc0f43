use crate::ports::outbound::{RecordStore, StoreError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory record store for unit tests.
///
/// Can be told to fail writes to exercise persistence error paths.
#[derive(Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    fail_writes: RwLock<Option<String>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a collection.
    pub fn with_collection(self, collection: &str, records: Vec<Value>) -> Self {
        self.collections
            .write()
            .insert(collection.to_string(), records);
        self
    }

    /// Make every subsequent write fail with `message`, or succeed again on `None`.
    pub fn fail_writes(&self, message: Option<&str>) {
        *self.fail_writes.write() = message.map(str::to_string);
    }
}

impl RecordStore for InMemoryRecordStore {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn write_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError> {
        if let Some(message) = self.fail_writes.read().clone() {
            return Err(StoreError::Io {
                collection: collection.to_string(),
                message,
            });
        }
        self.collections
            .write()
            .insert(collection.to_string(), records);
        Ok(())
    }
}

use crate::ports::outbound::{RecordStore, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

/// JSON-file record store for production.
///
/// Each collection lives in `<dir>/<collection>.json` as a pretty-printed JSON
/// array. Writes go to a temp file that is synced and renamed over the
/// original, so a crash leaves either the old or the new contents.
pub struct JsonFileRecordStore {
    dir: PathBuf,
    write_guard: Mutex<()>,
}

impl JsonFileRecordStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if dir.is_dir() {
            tracing::info!("[pos-01] 💾 Using record directory {}", dir.display());
        } else {
            tracing::info!(
                "[pos-01] 📁 Record directory {} does not exist yet",
                dir.display()
            );
        }
        Self {
            dir,
            write_guard: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `collection`.
    pub fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Io {
                collection: collection.to_string(),
                message: "invalid collection name".into(),
            });
        }
        Ok(self.dir.join(format!("{}.json", collection)))
    }
}

fn io_error(collection: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Io {
        collection: collection.to_string(),
        message: err.to_string(),
    }
}

impl RecordStore for JsonFileRecordStore {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(collection)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[pos-01] No {} file, starting empty", collection);
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_error(collection, e)),
        };

        let records: Vec<Value> =
            serde_json::from_str(&contents).map_err(|e| StoreError::Corrupted {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        tracing::info!(
            "[pos-01] 💾 Loaded {} records from {}",
            records.len(),
            path.display()
        );
        Ok(records)
    }

    fn write_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError> {
        let path = self.collection_path(collection)?;
        let bytes = serde_json::to_vec_pretty(&records).map_err(|e| io_error(collection, e))?;

        let _guard = self.write_guard.lock();
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(collection, e))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(|e| io_error(collection, e))?;
        file.write_all(&bytes).map_err(|e| io_error(collection, e))?;
        file.sync_all().map_err(|e| io_error(collection, e))?;
        std::fs::rename(&temp_path, &path).map_err(|e| io_error(collection, e))?;

        tracing::debug!(
            "[pos-01] Wrote {} records to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }
}

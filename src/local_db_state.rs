//! LMDB environment that backs the persistent store on disk.
//!
//! One environment per app, one unnamed database inside it, one key per
//! logical collection. Values are UTF-8 strings (JSON or raw text, decided by
//! the collection that owns the key).

use std::fs;
use std::path::PathBuf;

use lmdb::{Database, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::local_store::StoreBackend;

pub struct AppDbState {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl AppDbState {
    /// Opens (or creates) `<name>.lmdb/` with the given map size in bytes.
    pub fn init(name: &str, map_size: usize) -> Result<Self, AppResponse> {
        if name.trim().is_empty() {
            return Err(AppResponse::BadRequest("Database name cannot be empty".to_string()));
        }

        let path = PathBuf::from(format!("{name}.lmdb"));
        if path.exists() {
            info!("Opening existing database at: {}", path.display());
        } else {
            info!("Creating new database at: {}", path.display());
            fs::create_dir_all(&path)?;
        }

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)?;
        let db = env.open_db(None)?;

        Ok(Self { env, db, path })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                AppResponse::SerializationError(format!("Invalid UTF-8 under key {key}: {e}"))
            })?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.abort();
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    /// Returns `false` when the key was not present.
    pub fn delete(&self, key: &str) -> Result<bool, AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => {
                txn.abort();
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn clear_all_records(&self) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        info!("Cleared all records in {}", self.path.display());
        Ok(())
    }

    /// Flushes pending writes to disk. The environment itself is released on drop.
    pub fn close_database(&self) -> Result<(), AppResponse> {
        if let Err(e) = self.env.sync(true) {
            warn!("Failed to sync LMDB environment at {}: {e}", self.path.display());
            return Err(e.into());
        }
        info!("Database at {} synced for close", self.path.display());
        Ok(())
    }
}

impl StoreBackend for AppDbState {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        self.get(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        self.put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AppResponse> {
        self.delete(key).map(|_| ())
    }

    fn flush(&self) -> Result<(), AppResponse> {
        self.close_database()
    }
}

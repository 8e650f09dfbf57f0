//! Durable ledger store on top of the fjall LSM keyspace

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use ledger_core::*;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub mod accounts;
pub mod ledger;

pub use accounts::*;
pub use ledger::*;

const ACCOUNTS_PARTITION: &str = "accounts";
const NUMBERS_PARTITION: &str = "account_numbers";
const META_PARTITION: &str = "ledger_meta";

/// Storage engine wrapping a fjall keyspace and the ledger partitions
#[derive(Clone)]
pub struct StorageEngine {
    keyspace: Arc<Keyspace>,
    accounts: PartitionHandle,
    numbers: PartitionHandle,
    meta: PartitionHandle,
    /// Serialises id allocation and number uniqueness checks
    write_lock: Arc<Mutex<()>>,
}

impl StorageEngine {
    /// Open or create the storage engine at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Config::new(path)
            .open()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let accounts = open_partition(&keyspace, ACCOUNTS_PARTITION)?;
        let numbers = open_partition(&keyspace, NUMBERS_PARTITION)?;
        let meta = open_partition(&keyspace, META_PARTITION)?;

        Ok(StorageEngine {
            keyspace: Arc::new(keyspace),
            accounts,
            numbers,
            meta,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create temporary storage engine for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let engine = Self::new(temp_dir.path())?;
        Ok((engine, temp_dir))
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub(crate) fn accounts(&self) -> &PartitionHandle {
        &self.accounts
    }

    pub(crate) fn numbers(&self) -> &PartitionHandle {
        &self.numbers
    }

    pub(crate) fn meta(&self) -> &PartitionHandle {
        &self.meta
    }

    pub(crate) fn write_lock(&self) -> &Mutex<()> {
        &self.write_lock
    }

    /// Persist all changes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }
}

fn open_partition(keyspace: &Keyspace, name: &str) -> Result<PartitionHandle> {
    keyspace
        .open_partition(name, PartitionCreateOptions::default())
        .map_err(|e| LedgerError::Storage(e.to_string()))
}

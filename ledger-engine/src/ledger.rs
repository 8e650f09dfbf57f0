//! `LedgerStore` implementation over the storage engine

use crate::accounts::*;
use crate::StorageEngine;
use ledger_core::*;
use std::path::Path;
use std::sync::MutexGuard;

/// Durable account ledger
#[derive(Clone)]
pub struct FjallLedger {
    engine: StorageEngine,
}

impl FjallLedger {
    pub fn new(engine: StorageEngine) -> Self {
        FjallLedger { engine }
    }

    /// Open or create a ledger at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(StorageEngine::new(path)?))
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.engine
            .write_lock()
            .lock()
            .map_err(|_| LedgerError::Internal("ledger write lock poisoned".to_string()))
    }

    fn last_id(&self) -> Result<u64> {
        match self.engine.meta().get(NEXT_ID_KEY).map_err(storage_err)? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn number_taken(&self, number: AccountNumber) -> Result<bool> {
        self.engine
            .numbers()
            .contains_key(number_key(number))
            .map_err(storage_err)
    }
}

fn storage_err(e: fjall::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

impl LedgerStore for FjallLedger {
    fn create_account(&self, new: NewAccount) -> Result<Account> {
        let _guard = self.lock()?;

        let mut rng = rand::thread_rng();
        let number = loop {
            let candidate = AccountNumber::generate(&mut rng);
            if !self.number_taken(candidate)? {
                break candidate;
            }
        };

        let id = AccountId::new(self.last_id()? + 1);
        let account = Account::from_new(id, number, new);

        let mut batch = self.engine.keyspace().batch();
        batch.insert(self.engine.accounts(), id_key(id), encode_account(&account)?);
        batch.insert(self.engine.numbers(), number_key(number), id_key(id));
        batch.insert(self.engine.meta(), NEXT_ID_KEY, id.get().to_be_bytes().to_vec());
        batch.commit().map_err(storage_err)?;

        self.engine.persist()?;
        Ok(account)
    }

    fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        match self.engine.accounts().get(id_key(id)).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode_account(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_account_by_number(&self, number: AccountNumber) -> Result<Option<Account>> {
        match self.engine.numbers().get(number_key(number)).map_err(storage_err)? {
            Some(bytes) => self.find_account_by_id(AccountId::new(decode_u64(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();

        for item in self.engine.accounts().iter() {
            let (_key, value) = item.map_err(storage_err)?;
            accounts.push(decode_account(&value)?);
        }

        Ok(accounts)
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let _guard = self.lock()?;

        let stored = self
            .find_account_by_id(account.id)?
            .ok_or(LedgerError::AccountNotFound { id: account.id })?;

        if stored.number != account.number {
            return Err(LedgerError::ImmutableNumber {
                id: account.id,
                stored: stored.number,
                given: account.number,
            });
        }

        self.engine
            .accounts()
            .insert(id_key(account.id), encode_account(account)?)
            .map_err(storage_err)?;

        self.engine.persist()
    }

    fn update_profile(&self, id: AccountId, update: AccountUpdate) -> Result<Account> {
        let _guard = self.lock()?;

        let mut stored = self
            .find_account_by_id(id)?
            .ok_or(LedgerError::AccountNotFound { id })?;
        stored.apply(update);

        self.engine
            .accounts()
            .insert(id_key(id), encode_account(&stored)?)
            .map_err(storage_err)?;

        self.engine.persist()?;
        Ok(stored)
    }

    fn replace_credential(&self, id: AccountId, credential_hash: String) -> Result<()> {
        let _guard = self.lock()?;

        let mut stored = self
            .find_account_by_id(id)?
            .ok_or(LedgerError::AccountNotFound { id })?;
        stored.credential_hash = credential_hash;

        self.engine
            .accounts()
            .insert(id_key(id), encode_account(&stored)?)
            .map_err(storage_err)?;

        self.engine.persist()
    }

    fn delete_account(&self, id: AccountId) -> Result<()> {
        let _guard = self.lock()?;

        let stored = self
            .find_account_by_id(id)?
            .ok_or(LedgerError::AccountNotFound { id })?;

        let mut batch = self.engine.keyspace().batch();
        batch.remove(self.engine.accounts(), id_key(id));
        batch.remove(self.engine.numbers(), number_key(stored.number));
        batch.commit().map_err(storage_err)?;

        self.engine.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(name: &str) -> NewAccount {
        NewAccount {
            first_name: name.to_string(),
            last_name: "Fjall".to_string(),
            email: format!("{}@example.com", name),
            credential_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[test]
    fn test_create_and_find() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let ledger = FjallLedger::new(engine);

        let account = ledger.create_account(new_account("alice")).unwrap();
        assert_eq!(account.id, AccountId::new(1));

        let by_id = ledger.find_account_by_id(account.id).unwrap().unwrap();
        assert_eq!(by_id, account);

        let by_number = ledger.find_account_by_number(account.number).unwrap().unwrap();
        assert_eq!(by_number.id, account.id);
    }

    #[test]
    fn test_missing_lookups_are_none() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let ledger = FjallLedger::new(engine);

        assert!(ledger.find_account_by_id(AccountId::new(77)).unwrap().is_none());
        assert!(ledger
            .find_account_by_number(AccountNumber::new(77))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_then_update_is_not_found() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let ledger = FjallLedger::new(engine);

        let account = ledger.create_account(new_account("bob")).unwrap();
        ledger.delete_account(account.id).unwrap();

        assert!(matches!(
            ledger.update_account(&account),
            Err(LedgerError::AccountNotFound { .. })
        ));
        assert!(ledger
            .find_account_by_number(account.number)
            .unwrap()
            .is_none());
    }
}

//! Ledger store capability and an in-memory implementation

use crate::{Account, AccountId, AccountNumber, AccountUpdate, LedgerError, NewAccount, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Persistence capability for account records.
///
/// Lookups return `Ok(None)` when the record does not exist; `Err` is
/// reserved for infrastructure failures so callers can tell the two apart.
pub trait LedgerStore: Send + Sync {
    /// Persist a new account, assigning its id and a unique random number
    fn create_account(&self, new: NewAccount) -> Result<Account>;

    fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>>;

    fn find_account_by_number(&self, number: AccountNumber) -> Result<Option<Account>>;

    /// All accounts ordered by id
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Replace an existing record; the number must not change
    fn update_account(&self, account: &Account) -> Result<()>;

    /// Apply display-attribute changes to the current stored record
    fn update_profile(&self, id: AccountId, update: AccountUpdate) -> Result<Account>;

    /// Swap the credential hash of the current stored record, leaving the rest untouched
    fn replace_credential(&self, id: AccountId, credential_hash: String) -> Result<()>;

    fn delete_account(&self, id: AccountId) -> Result<()>;
}

/// Shared handle used by the auth subsystem and the transport
pub type SharedLedger = Arc<dyn LedgerStore>;

/// Volatile store for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    accounts: BTreeMap<AccountId, Account>,
    numbers: HashMap<AccountNumber, AccountId>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> LedgerError {
        LedgerError::Internal("memory ledger lock poisoned".to_string())
    }
}

impl LedgerStore for MemoryLedger {
    fn create_account(&self, new: NewAccount) -> Result<Account> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;

        let mut rng = rand::thread_rng();
        let number = loop {
            let candidate = AccountNumber::generate(&mut rng);
            if !state.numbers.contains_key(&candidate) {
                break candidate;
            }
        };

        state.next_id += 1;
        let id = AccountId::new(state.next_id);
        let account = Account::from_new(id, number, new);

        state.numbers.insert(number, id);
        state.accounts.insert(id, account.clone());
        Ok(account)
    }

    fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state.accounts.get(&id).cloned())
    }

    fn find_account_by_number(&self, number: AccountNumber) -> Result<Option<Account>> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .numbers
            .get(&number)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state.accounts.values().cloned().collect())
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;

        let stored = state
            .accounts
            .get_mut(&account.id)
            .ok_or(LedgerError::AccountNotFound { id: account.id })?;

        if stored.number != account.number {
            return Err(LedgerError::ImmutableNumber {
                id: account.id,
                stored: stored.number,
                given: account.number,
            });
        }

        *stored = account.clone();
        Ok(())
    }

    fn update_profile(&self, id: AccountId, update: AccountUpdate) -> Result<Account> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;

        let stored = state
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound { id })?;
        stored.apply(update);
        Ok(stored.clone())
    }

    fn replace_credential(&self, id: AccountId, credential_hash: String) -> Result<()> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;

        let stored = state
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound { id })?;
        stored.credential_hash = credential_hash;
        Ok(())
    }

    fn delete_account(&self, id: AccountId) -> Result<()> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;

        let removed = state
            .accounts
            .remove(&id)
            .ok_or(LedgerError::AccountNotFound { id })?;
        state.numbers.remove(&removed.number);
        Ok(())
    }
}

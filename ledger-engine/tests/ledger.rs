//! Integration tests for the fjall-backed ledger

use ledger_core::*;
use ledger_engine::*;
use std::collections::HashSet;
use std::sync::Arc;

fn new_account(i: usize) -> NewAccount {
    NewAccount {
        first_name: format!("first{}", i),
        last_name: format!("last{}", i),
        email: format!("user{}@example.com", i),
        credential_hash: format!("$argon2id$hash{}", i),
    }
}

#[test]
fn accounts_survive_reopen() {
    let temp = tempfile::tempdir().unwrap();

    let created = {
        let ledger = FjallLedger::open(temp.path()).unwrap();
        (0..3)
            .map(|i| ledger.create_account(new_account(i)).unwrap())
            .collect::<Vec<_>>()
    };

    let ledger = FjallLedger::open(temp.path()).unwrap();
    let listed = ledger.list_accounts().unwrap();
    assert_eq!(listed, created);

    for account in &created {
        let found = ledger.find_account_by_number(account.number).unwrap().unwrap();
        assert_eq!(found.credential_hash, account.credential_hash);
    }
}

#[test]
fn ids_are_not_reused_after_delete() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let ledger = FjallLedger::new(engine);

    let first = ledger.create_account(new_account(1)).unwrap();
    let second = ledger.create_account(new_account(2)).unwrap();
    ledger.delete_account(second.id).unwrap();

    let third = ledger.create_account(new_account(3)).unwrap();
    assert!(third.id > second.id);
    assert!(ledger.find_account_by_id(second.id).unwrap().is_none());
    assert_eq!(ledger.list_accounts().unwrap().len(), 2);
    assert_eq!(ledger.list_accounts().unwrap()[0].id, first.id);
}

#[test]
fn list_is_ordered_by_id() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let ledger = FjallLedger::new(engine);

    for i in 0..12 {
        ledger.create_account(new_account(i)).unwrap();
    }

    let ids: Vec<u64> = ledger
        .list_accounts()
        .unwrap()
        .iter()
        .map(|a| a.id.get())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn update_changes_display_attributes_only() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let ledger = FjallLedger::new(engine);

    let mut account = ledger.create_account(new_account(1)).unwrap();
    account.apply(AccountUpdate {
        first_name: "Renamed".to_string(),
        last_name: "Person".to_string(),
        email: "renamed@example.com".to_string(),
    });
    ledger.update_account(&account).unwrap();

    let stored = ledger.find_account_by_id(account.id).unwrap().unwrap();
    assert_eq!(stored.first_name, "Renamed");
    assert_eq!(stored.number, account.number);

    let mut moved = stored.clone();
    moved.number = AccountNumber::new((stored.number.get() + 1) % AccountNumber::UPPER_BOUND);
    assert!(matches!(
        ledger.update_account(&moved),
        Err(LedgerError::ImmutableNumber { .. })
    ));
}

#[test]
fn profile_update_preserves_rotated_credential() {
    let temp = tempfile::tempdir().unwrap();

    let account = {
        let ledger = FjallLedger::open(temp.path()).unwrap();
        let account = ledger.create_account(new_account(1)).unwrap();
        ledger
            .replace_credential(account.id, "$argon2id$rotated".to_string())
            .unwrap();
        ledger
            .update_profile(
                account.id,
                AccountUpdate {
                    first_name: "Edited".to_string(),
                    last_name: "After".to_string(),
                    email: "edited@example.com".to_string(),
                },
            )
            .unwrap();
        account
    };

    let ledger = FjallLedger::open(temp.path()).unwrap();
    let stored = ledger.find_account_by_id(account.id).unwrap().unwrap();
    assert_eq!(stored.first_name, "Edited");
    assert_eq!(stored.credential_hash, "$argon2id$rotated");
    assert_eq!(stored.number, account.number);

    assert!(matches!(
        ledger.update_profile(AccountId::new(999), AccountUpdate {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
        }),
        Err(LedgerError::AccountNotFound { .. })
    ));
}

#[test]
fn concurrent_creates_get_unique_ids_and_numbers() {
    let (engine, _temp) = StorageEngine::temp().unwrap();
    let ledger = Arc::new(FjallLedger::new(engine));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let ledger = ledger.clone();
            std::thread::spawn(move || {
                (0..10)
                    .map(|i| ledger.create_account(new_account(t * 100 + i)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let accounts: Vec<Account> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let ids: HashSet<_> = accounts.iter().map(|a| a.id).collect();
    let numbers: HashSet<_> = accounts.iter().map(|a| a.number).collect();
    assert_eq!(ids.len(), 40);
    assert_eq!(numbers.len(), 40);
}

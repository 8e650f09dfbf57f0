//! Key layout and record encoding for the account partitions
//!
//! `accounts`        : big-endian id  -> JSON account
//! `account_numbers` : big-endian number -> big-endian id
//! `ledger_meta`     : `next_id` -> big-endian u64

use ledger_core::*;

pub(crate) const NEXT_ID_KEY: &[u8] = b"next_id";

pub(crate) fn id_key(id: AccountId) -> Vec<u8> {
    id.get().to_be_bytes().to_vec()
}

pub(crate) fn number_key(number: AccountNumber) -> Vec<u8> {
    number.to_be_bytes().to_vec()
}

pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LedgerError::Storage(format!("expected 8 bytes, found {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

pub(crate) fn encode_account(account: &Account) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(account)?)
}

pub(crate) fn decode_account(bytes: &[u8]) -> Result<Account> {
    Ok(serde_json::from_slice(bytes)?)
}

//! Constant-time comparisons
//!
//! Comparisons of values derived from presented credentials go through
//! `subtle` so their timing does not depend on content.

use crate::AccountNumber;
use subtle::ConstantTimeEq;

/// Constant-time byte comparison; length mismatch returns early
pub fn constant_time_bytes_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Constant-time account number comparison
pub fn constant_time_number_compare(a: AccountNumber, b: AccountNumber) -> bool {
    a.get().ct_eq(&b.get()).into()
}

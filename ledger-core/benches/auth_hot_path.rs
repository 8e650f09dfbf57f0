//! Benchmarks for the per-request authorization path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledger_core::auth::*;
use ledger_core::*;
use std::sync::Arc;

fn bench_validate(c: &mut Criterion) {
    let secret = SigningSecret::new("bench-signing-secret-0123456789abc").unwrap();
    let issuer = TokenIssuer::new(&secret, DEFAULT_VALIDITY);
    let validator = TokenValidator::new(&secret);

    let ledger = Arc::new(MemoryLedger::new());
    let account = ledger
        .create_account(NewAccount {
            first_name: "Bench".to_string(),
            last_name: "Mark".to_string(),
            email: "bench@example.com".to_string(),
            credential_hash: String::new(),
        })
        .unwrap();
    let token = issuer.issue(&account).unwrap().token;
    let guard = AccessGuard::new(TokenValidator::new(&secret), ledger);

    c.bench_function("token_validate", |b| {
        b.iter(|| validator.validate(black_box(&token)).unwrap())
    });

    c.bench_function("guard_authorize", |b| {
        b.iter(|| guard.authorize(black_box(account.id), black_box(&token)).unwrap())
    });

    c.bench_function("guard_reject_malformed", |b| {
        b.iter(|| guard.authorize(black_box(account.id), black_box("not.a.token")).is_err())
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);

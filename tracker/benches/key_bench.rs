// Ledger key and ledger benchmarks for the reward tracker.
//
// Covers canonical key encoding/decoding for both policy shapes and credit
// throughput against a ledger with a growing number of buckets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use reward_tracker::{BalanceLedger, DispositionPolicy, LedgerKey, SignedWad, TokenId};

fn bench_encode(c: &mut Criterion) {
    let exchange = LedgerKey::new(
        DispositionPolicy::exchange(3000),
        TokenId::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    );
    let transfer = LedgerKey::new(
        DispositionPolicy::transfer("0x000000000000000000000000000000000000dEaD"),
        TokenId::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    );

    c.bench_function("key/encode_exchange", |b| {
        b.iter(|| black_box(&exchange).encode());
    });
    c.bench_function("key/encode_transfer", |b| {
        b.iter(|| black_box(&transfer).encode());
    });
}

fn bench_decode(c: &mut Criterion) {
    let key = LedgerKey::new(
        DispositionPolicy::transfer("0x000000000000000000000000000000000000dEaD"),
        TokenId::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    )
    .encode()
    .expect("encode");

    c.bench_function("key/decode", |b| {
        b.iter(|| black_box(&key).decode());
    });
}

fn bench_credit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/credit");

    for buckets in [10usize, 100, 1_000] {
        let tokens: Vec<TokenId> = (0..buckets)
            .map(|i| TokenId::new(format!("0x{:040x}", i)))
            .collect();
        let policy = DispositionPolicy::exchange(500);
        let amount = SignedWad::from_wei(1_000_000_000);

        group.throughput(Throughput::Elements(buckets as u64));
        group.bench_with_input(BenchmarkId::from_parameter(buckets), &tokens, |b, tokens| {
            let mut ledger = BalanceLedger::new();
            b.iter(|| {
                for token in tokens {
                    ledger.credit(&policy, token, amount).expect("credit");
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_credit);
criterion_main!(benches);

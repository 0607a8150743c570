use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;
use std::thread;

use libris_auth::{Principal, Role};
use libris_catalog::{ItemQuery, ItemSpec};
use libris_core::{AccountId, ItemId, Money};
use libris_lending::{LendingConfig, LendingService};

/// A service with `titles` items of `copies` each and one well-funded member.
fn setup(titles: usize, copies: u32) -> (LendingService, Vec<ItemId>, AccountId) {
    let svc = LendingService::new(LendingConfig::default());
    let admin = Principal::administrator(svc.open_account(Role::Administrator, Money::ZERO).unwrap());
    let items = (0..titles)
        .map(|n| {
            let spec = ItemSpec::new(format!("Title {n}"), format!("Author {}", n % 7), Money::from_cents(999), copies)
                .with_category(if n % 2 == 0 { "Fiction" } else { "History" });
            svc.add_item(&admin, spec).unwrap()
        })
        .collect();
    let reader = svc.open_account(Role::Member, Money::from_cents(100_000_000_000)).unwrap();
    (svc, items, reader)
}

fn bench_borrow_return_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("borrow_return");
    group.throughput(Throughput::Elements(1));

    let (svc, items, reader) = setup(1, 1);
    let item = items[0];
    group.bench_function("single_copy_cycle", |b| {
        b.iter(|| {
            let receipt = svc.borrow(black_box(item), black_box(reader), 7).unwrap();
            svc.return_item(item, reader).unwrap();
            black_box(receipt)
        })
    });

    // Reservation fails after the charge, so every iteration refunds.
    let (svc, items, holder) = setup(1, 1);
    let item = items[0];
    svc.borrow(item, holder, 7).unwrap();
    let latecomer = svc.open_account(Role::Member, Money::from_cents(100_000_000_000)).unwrap();
    group.bench_function("compensated_failure", |b| {
        b.iter(|| black_box(svc.borrow(black_box(item), black_box(latecomer), 7)).unwrap_err())
    });

    group.finish();
}

fn bench_contended_borrow(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_borrow");

    for threads in [2usize, 4, 8].iter() {
        group.throughput(Throughput::Elements(*threads as u64 * 50));
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            let (svc, items, _) = setup(1, 2);
            let svc = Arc::new(svc);
            let item = items[0];
            let readers: Vec<AccountId> = (0..threads)
                .map(|_| svc.open_account(Role::Member, Money::from_cents(100_000_000_000)).unwrap())
                .collect();
            b.iter(|| {
                let handles: Vec<_> = readers
                    .iter()
                    .copied()
                    .map(|reader| {
                        let svc = svc.clone();
                        thread::spawn(move || {
                            for _ in 0..50 {
                                if svc.borrow(item, reader, 1).is_ok() {
                                    svc.return_item(item, reader).unwrap();
                                }
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            })
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for titles in [100usize, 1_000, 10_000].iter() {
        let (svc, _, _) = setup(*titles, 3);
        group.throughput(Throughput::Elements(*titles as u64));
        group.bench_with_input(BenchmarkId::new("text_and_category", titles), titles, |b, _| {
            b.iter(|| {
                svc.find(ItemQuery::all().text(black_box("author 3")).category("Fiction"))
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_borrow_return_cycle,
    bench_contended_borrow,
    bench_search
);
criterion_main!(benches);

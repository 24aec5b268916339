use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use ledgerflow_store::InMemoryStore;
use ledgerflow_workflow::{LedgerWorkflow, WorkflowConfig};

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");
    for count in [10u64, 100] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let store = Arc::new(InMemoryStore::new());
                    let workflow =
                        LedgerWorkflow::new(Arc::clone(&store), WorkflowConfig::default());
                    let pair = workflow.provision_account_pair().unwrap();
                    (workflow, pair)
                },
                |(workflow, pair)| {
                    workflow.transfer(black_box(&pair), 1, count).unwrap();
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_check_consistency(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_consistency");
    for pairs in [1usize, 50] {
        let store = Arc::new(InMemoryStore::new());
        let workflow = LedgerWorkflow::new(Arc::clone(&store), WorkflowConfig::default());
        for _ in 0..pairs {
            let pair = workflow.provision_account_pair().unwrap();
            workflow.transfer(&pair, 1, 10).unwrap();
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(pairs),
            &workflow,
            |b, workflow| {
                b.iter(|| {
                    let report = workflow.check_consistency().unwrap();
                    black_box(report)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_transfer, bench_check_consistency);
criterion_main!(benches);

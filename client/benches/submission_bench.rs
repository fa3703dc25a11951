// Submission-path benchmarks for the NOVA client.
//
// Covers chunk planning, freezing payloads of increasing size into chunked
// bodies, signing every chunk, and the to_bytes/from_bytes envelope.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use nova_client::chunk::ChunkPlan;
use nova_client::{
    EntityId, FrozenTransaction, LocalSigner, OperationKind, Timestamp, TransactionBuilder,
    TransactionId,
};

const NODE: EntityId = EntityId::new(0, 0, 3);

fn base_id() -> TransactionId {
    TransactionId::new(EntityId::from_num(1001), Timestamp::new(1_700_000_000, 0))
}

fn builder(len: usize) -> TransactionBuilder {
    TransactionBuilder::new(OperationKind::FileAppend)
        .payload(vec![0xAB; len])
        .chunk_size(4096)
        .max_chunks(64)
        .transaction_id(base_id())
}

fn bench_chunk_plan(c: &mut Criterion) {
    c.bench_function("chunk/plan_80k", |b| {
        b.iter(|| {
            let plan = ChunkPlan::new(80_000, 4096, 20).unwrap();
            plan.ranges().map(|r| r.len()).sum::<usize>()
        });
    });
}

fn bench_freeze(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/freeze");
    for len in [1_000usize, 16_384, 65_536, 200_000] {
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| builder(len).freeze(&NODE, None).unwrap());
        });
    }
    group.finish();
}

fn bench_sign(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let signer = LocalSigner::generate();

    let mut group = c.benchmark_group("transaction/sign");
    for len in [1_000usize, 65_536, 200_000] {
        let frozen = builder(len).freeze(&NODE, None).unwrap();
        group.throughput(Throughput::Elements(frozen.chunk_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &frozen, |b, frozen| {
            b.iter(|| {
                let mut tx = frozen.clone();
                rt.block_on(tx.sign(&signer)).map(|_| ()).unwrap();
                tx
            });
        });
    }
    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut tx = builder(65_536).freeze(&NODE, None).unwrap();
    rt.block_on(tx.sign(&LocalSigner::generate())).map(|_| ()).unwrap();
    let bytes = tx.to_bytes().unwrap();

    c.bench_function("envelope/to_bytes_64k", |b| {
        b.iter(|| tx.to_bytes().unwrap());
    });
    c.bench_function("envelope/from_bytes_64k", |b| {
        b.iter(|| FrozenTransaction::from_bytes(&bytes).unwrap());
    });
}

criterion_group!(
    benches,
    bench_chunk_plan,
    bench_freeze,
    bench_sign,
    bench_envelope,
);
criterion_main!(benches);

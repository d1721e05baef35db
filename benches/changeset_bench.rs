use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use textsync_core::changeset::Changeset;
use textsync_core::protocol::{deserialize_changeset, serialize_changeset};
use textsync_core::{ClientSession, DocumentServer};

/// Edit that keeps every other run of `run` characters and inserts between
/// them, producing many strips
fn striped_edit(len: usize, run: usize) -> Changeset {
    let mut strips = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + run).min(len);
        strips.push(textsync_core::Strip::retain_range(start..end));
        strips.push(textsync_core::Strip::insert("xy"));
        start = end + run;
    }
    Changeset::new(strips)
}

/// Benchmark single character typing into a document
fn bench_single_insert(c: &mut Criterion) {
    let document = Changeset::from_text(&"a".repeat(1000));
    let edit = Changeset::edit(1000, 500..500, "b").unwrap();

    c.bench_function("compose_single_insert_1k", |b| {
        b.iter(|| black_box(document.compose(&edit).unwrap()));
    });
}

/// Benchmark sequential typing (simulates real user typing)
fn bench_sequential_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_typing");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut session = ClientSession::default();
                for _ in 0..size {
                    session.insert("a").unwrap();
                }
                black_box(session.text());
            });
        });
    }

    group.finish();
}

/// Benchmark follow on changesets with many strips
fn bench_follow(c: &mut Criterion) {
    let mut group = c.benchmark_group("follow_striped");

    for len in [100, 1000, 10000].iter() {
        let left = striped_edit(*len, 3);
        let right = striped_edit(*len, 5);
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| black_box(left.follow(&right)));
        });
    }

    group.finish();
}

/// Benchmark inverse and swap, the history rewrite primitives
fn bench_history_primitives(c: &mut Criterion) {
    let document = Changeset::from_text(&"abcdefghij".repeat(100));
    let first = striped_edit(1000, 4);
    let second = striped_edit(first.length(), 7);

    c.bench_function("inverse_striped_1k", |b| {
        b.iter(|| black_box(first.inverse(&document).unwrap()));
    });
    c.bench_function("swap_striped_1k", |b| {
        b.iter(|| black_box(first.swap(&second, 1000).unwrap()));
    });
}

/// Benchmark three sessions converging through the server
fn bench_concurrent_convergence(c: &mut Criterion) {
    c.bench_function("concurrent_3way_convergence", |b| {
        b.iter(|| {
            let mut server = DocumentServer::with_text("shared");
            let mut clients: Vec<_> = (0..3)
                .map(|_| {
                    let (id, headtext) = server.connect();
                    let mut session = ClientSession::default();
                    session.receive(headtext).unwrap();
                    (id, session)
                })
                .collect();

            // Each client makes 30 edits before anything is exchanged
            for (index, (_, session)) in clients.iter_mut().enumerate() {
                for _ in 0..30 {
                    session.insert(&index.to_string()).unwrap();
                }
            }

            let mut inbox = Vec::new();
            for (id, session) in clients.iter_mut() {
                if let Some(message) = session.poll_outbound().unwrap() {
                    inbox.extend(server.handle_message(*id, message).unwrap());
                }
            }
            for outbound in inbox {
                if let Some((_, session)) = clients.iter_mut().find(|(id, _)| *id == outbound.to) {
                    session.receive(outbound.message).unwrap();
                }
            }

            // Verify convergence
            let result = server.text();
            for (_, session) in &clients {
                assert_eq!(session.text(), result);
            }
        });
    });
}

/// Benchmark serialization
fn bench_serialization(c: &mut Criterion) {
    let edit = striped_edit(10000, 3);

    c.bench_function("serialize_striped_10k", |b| {
        b.iter(|| black_box(serialize_changeset(&edit).unwrap()));
    });
}

/// Benchmark deserialization
fn bench_deserialization(c: &mut Criterion) {
    let json = serialize_changeset(&striped_edit(10000, 3)).unwrap();

    c.bench_function("deserialize_striped_10k", |b| {
        b.iter(|| black_box(deserialize_changeset(&json).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_single_insert,
    bench_sequential_typing,
    bench_follow,
    bench_history_primitives,
    bench_concurrent_convergence,
    bench_serialization,
    bench_deserialization,
);

criterion_main!(benches);

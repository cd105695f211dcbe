//! Benchmarks the naive `find_forward`/`find_backward` scan and the
//! coalescing insert path, the two hot loops a real editing session
//! exercises most: incremental search re-scanning from the search origin on
//! every keystroke, and repeated single-character inserts at a fixed point.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use core_text::{Document, MatchMode};

fn sample_text(repeats: usize) -> String {
    "the quick brown fox jumps over the lazy dog. "
        .repeat(repeats)
}

fn bench_find_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_forward");
    let text = sample_text(2000);

    group.bench_function("needle_near_end", |b| {
        b.iter(|| {
            let mut doc = Document::from_str("bench", &text);
            doc.set_point_start();
            let found = doc.find_forward(black_box(b"lazy dog."), MatchMode::Exact);
            black_box(found);
        });
    });

    group.bench_function("no_match_scans_whole_document", |b| {
        b.iter(|| {
            let mut doc = Document::from_str("bench", &text);
            doc.set_point_start();
            let found = doc.find_forward(black_box(b"needle not present"), MatchMode::Exact);
            black_box(found);
        });
    });

    group.finish();
}

fn bench_coalesced_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesced_insert");
    let text = sample_text(200);

    group.bench_function("1000_single_byte_inserts_at_fixed_point", |b| {
        b.iter(|| {
            let mut doc = Document::from_str("bench", &text);
            doc.set_point_start();
            doc.move_point(10);
            for _ in 0..1000 {
                doc.insert(black_box(b"x"));
            }
            black_box(doc.to_bytes().len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_find_forward, bench_coalesced_insert);
criterion_main!(benches);

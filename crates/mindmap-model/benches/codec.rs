use criterion::{Criterion, criterion_group, criterion_main};
use mindmap_model::{MindMap, ParseOptions, parse, serialize};
use mindmap_syntax::lex;
mod common;

fn bench_lex(c: &mut Criterion) {
    let mut group = c.benchmark_group("lex");
    group.sample_size(10);

    let text = serialize(&common::generate_map(6, 4));
    group.bench_function("lex_6x4", |b| {
        b.iter(|| {
            let tokens = lex(std::hint::black_box(&text));
            std::hint::black_box(tokens);
        });
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    for (breadth, depth) in [(4, 3), (6, 4)] {
        let text = serialize(&common::generate_map(breadth, depth));
        group.bench_function(format!("parse_{breadth}x{depth}"), |b| {
            b.iter(|| {
                let map = parse(std::hint::black_box(&text), &ParseOptions::default());
                std::hint::black_box(map)
            });
        });
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.sample_size(10);

    for (breadth, depth) in [(4, 3), (6, 4)] {
        let map: MindMap = common::generate_map(breadth, depth);
        group.bench_function(format!("serialize_{breadth}x{depth}"), |b| {
            b.iter(|| std::hint::black_box(serialize(std::hint::black_box(&map))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lex, bench_parse, bench_serialize);
criterion_main!(benches);

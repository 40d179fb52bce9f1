//! Benchmarks for push/pop throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use segmentflow::prelude::*;
use segmentflow::testing::{fan_out_tree, SuffixAgent};
use std::sync::Arc;

fn linear_benchmark(c: &mut Criterion) {
    let agents: Vec<Arc<dyn Agent>> = (0..8)
        .map(|i| Arc::new(SuffixAgent::new(format!("stage-{i}"), "")) as Arc<dyn Agent>)
        .collect();
    let pipeline = LinearPipeline::new("bench", agents).expect("valid chain");
    let mut states = pipeline.build_states();

    c.bench_function("linear_8_pushpop", |b| {
        b.iter(|| {
            let out = pipeline
                .pushpop(black_box(Segment::text("x")), &mut states)
                .expect("push succeeds");
            black_box(out)
        });
    });
}

fn tree_benchmark(c: &mut Criterion) {
    let tree = fan_out_tree(None);
    let mut states = tree.build_states();

    c.bench_function("tree_fan_out_push_pop_all", |b| {
        b.iter(|| {
            tree.push(black_box(Segment::text("x")), &mut states)
                .expect("push succeeds");
            black_box(tree.pop_all(&mut states).expect("pop succeeds"))
        });
    });

    let selected = fan_out_tree(Some(1));
    let mut states = selected.build_states();

    c.bench_function("tree_fan_out_selected_output", |b| {
        b.iter(|| {
            let out = selected
                .pushpop(black_box(Segment::text("x")), &mut states)
                .expect("push succeeds");
            black_box(out)
        });
    });
}

criterion_group!(benches, linear_benchmark, tree_benchmark);
criterion_main!(benches);

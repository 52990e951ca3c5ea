use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gridnet::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Ladder of resistors, `cols` wide, closed by shorts along the bottom row.
fn ladder(cols: usize) -> GridSpec {
    let mut builder = GridSpec::builder(2, cols)
        .vedge(0, 0, EdgeComponent::voltage_source("1", 5.0, UnitScale::One));
    for c in 0..cols - 1 {
        builder = builder
            .hedge(0, c, EdgeComponent::resistor((c + 1).to_string(), 1.0, UnitScale::Kilo))
            .hedge(1, c, EdgeComponent::short());
    }
    for c in 1..cols {
        builder = builder.vedge(
            0,
            c,
            EdgeComponent::resistor((cols + c).to_string(), 2.2, UnitScale::Kilo),
        );
    }
    builder.build().unwrap()
}

fn bench_build_circuit(c: &mut Criterion) {
    let spec = ladder(64);

    c.bench_function("build_circuit", |b| {
        b.iter(|| Circuit::build(black_box(spec.clone()), CircuitOptions::default()));
    });
}

fn bench_emit(c: &mut Criterion) {
    let circuit = Circuit::build(ladder(64), CircuitOptions::default());

    c.bench_function("emit_spice", |b| {
        b.iter(|| SpiceEmitter::emit(black_box(&circuit)));
    });
    c.bench_function("emit_schematic", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| SchematicEmitter::emit(black_box(&circuit), &mut rng));
    });
}

fn bench_load_file(c: &mut Criterion) {
    c.bench_function("load_circuit", |b| {
        b.iter(|| {
            gridnet::load_circuit(
                black_box(&fixture_path("transistor.json")),
                CircuitOptions::default(),
            )
        });
    });
}

criterion_group!(benches, bench_build_circuit, bench_emit, bench_load_file);
criterion_main!(benches);

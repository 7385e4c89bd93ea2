use ckpt_diff::{checkpoint_diff, edit_script};
use ckpt_types::{NamedShape, StateDict, Tensor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A transformer-like parameter list with `layers` blocks of four tensors.
fn layer_list(layers: usize, hidden: usize) -> Vec<NamedShape> {
    let mut out = vec![NamedShape::new("embed.weight", [32000, hidden])];
    for i in 0..layers {
        out.push(NamedShape::new(format!("layers.{i}.attn.weight"), [hidden, hidden]));
        out.push(NamedShape::new(format!("layers.{i}.attn.bias"), [hidden]));
        out.push(NamedShape::new(format!("layers.{i}.mlp.weight"), [4 * hidden, hidden]));
        out.push(NamedShape::new(format!("layers.{i}.norm.weight"), [hidden]));
    }
    out
}

fn bench_edit_script(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit_script");
    for layers in [12usize, 48, 96] {
        let a = layer_list(layers, 768);
        // Reshape a scattering of parameters and add a sibling after others.
        let mut b = Vec::with_capacity(a.len());
        for (i, entry) in a.iter().enumerate() {
            if i % 20 == 4 {
                b.push(NamedShape::new(entry.key.clone(), [1536]));
            } else {
                b.push(entry.clone());
            }
            if i % 12 == 3 {
                b.push(NamedShape::new(format!("{}.extra", entry.key), [768]));
            }
        }
        group.bench_with_input(
            BenchmarkId::new("mostly_equal", layers),
            &(a.clone(), b.clone()),
            |bench, (a, b)| bench.iter(|| edit_script(black_box(a), black_box(b)).unwrap()),
        );
        let disjoint: Vec<_> = a
            .iter()
            .map(|e| NamedShape::new(format!("other.{}", e.key), e.shape.clone()))
            .collect();
        group.bench_with_input(
            BenchmarkId::new("disjoint", layers),
            &(a, disjoint),
            |bench, (a, b)| bench.iter(|| edit_script(black_box(a), black_box(b)).unwrap()),
        );
    }
    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let build = |offset: f32| {
        StateDict::from_entries((0..64).map(|i| {
            let data = (0..4096).map(|j| (i * j) as f32 * 1e-3 + offset).collect();
            (format!("p{i}"), Tensor::new([64, 64], data).unwrap())
        }))
        .unwrap()
    };
    let a = build(0.0);
    let b = build(0.5);
    c.bench_function("checkpoint_diff/64x4096", |bench| {
        bench.iter(|| checkpoint_diff(black_box(&a), black_box(&b)).unwrap())
    });
}

criterion_group!(benches, bench_edit_script, bench_classification);
criterion_main!(benches);

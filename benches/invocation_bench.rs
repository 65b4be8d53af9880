use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use virid::core::config::BlastConfig;
use virid::tools::outfmt::{parse_hits, OutputFormat};
use virid::{SampleUnit, TaskBuilder, TaskResources};

fn bench_build_invocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("invocation/build");
    let builder = TaskBuilder::new(&BlastConfig::default()).unwrap();
    let resources = TaskResources::with_cpus(8);

    for num_samples in [1, 100, 10_000].iter() {
        let samples: Vec<_> = (0..*num_samples)
            .map(|i| SampleUnit::new(format!("S{}", i), format!("/data/reads/S{}.fasta", i)))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(num_samples),
            &samples,
            |b, samples| {
                b.iter(|| {
                    let invocations: Vec<_> = samples
                        .iter()
                        .map(|s| builder.build(s, &resources))
                        .collect();
                    black_box(invocations);
                });
            },
        );
    }

    group.finish();
}

fn bench_parse_hits(c: &mut Criterion) {
    let format = OutputFormat::parse(&BlastConfig::default().output_format).unwrap();
    let mut data = String::new();
    for i in 0..5000 {
        data.push_str(&format!(
            "read{}\tHuman mastadenovirus C, complete genome\tAC_000008.1\t129951\t1e-40\t180\t98.7\t150\n",
            i
        ));
    }

    c.bench_function("outfmt/parse_5000_hits", |b| {
        b.iter(|| {
            let hits = parse_hits(data.as_bytes(), &format).unwrap();
            black_box(hits);
        });
    });
}

criterion_group!(benches, bench_build_invocations, bench_parse_hits);
criterion_main!(benches);

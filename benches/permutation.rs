use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tractometry_stats::synthetic::SyntheticCohort;
use tractometry_stats::{CorrectionMethod, TractAnalysis};

fn bench_permutation(c: &mut Criterion) {
    let group_cohort = SyntheticCohort::group(30)
        .tracts(&["AF_left", "CST_left"])
        .points(100)
        .confound("age", 0.3)
        .seed(1)
        .build()
        .expect("synthetic cohort");
    let correlation_cohort = SyntheticCohort::correlation(60)
        .points(100)
        .seed(2)
        .build()
        .expect("synthetic cohort");

    let mut group = c.benchmark_group("permutation");
    group.sample_size(20);
    group.bench_function("group_alpha_fwe_1000", |b| {
        b.iter(|| {
            let report = TractAnalysis::new()
                .permutations(1_000)
                .seed(7)
                .run(&group_cohort, &["AF_left"])
                .expect("analysis");
            black_box(report.records[0].threshold)
        });
    });

    group.bench_function("group_cluster_fwe_joint_1000", |b| {
        b.iter(|| {
            let report = TractAnalysis::new()
                .permutations(1_000)
                .method(CorrectionMethod::ClusterFwe)
                .joint_correction(true)
                .seed(7)
                .run(&group_cohort, &["AF_left", "CST_left"])
                .expect("analysis");
            black_box(report.records[0].threshold)
        });
    });

    group.bench_function("correlation_alpha_fwe_1000", |b| {
        b.iter(|| {
            let report = TractAnalysis::new()
                .permutations(1_000)
                .seed(7)
                .run(&correlation_cohort, &["tract_0"])
                .expect("analysis");
            black_box(report.records[0].threshold)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_permutation);
criterion_main!(benches);

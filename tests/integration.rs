//! End-to-end integration tests.

use std::collections::HashMap;

use tractometry_stats::output::{format_report, to_json, to_json_pretty};
use tractometry_stats::synthetic::SyntheticCohort;
use tractometry_stats::{
    analyze, AnalysisReport, AnalysisType, Cohort, Config, CorrectionMethod, Error, ErrorKind,
    MetadataRow, MetadataTable, PermutationCount, TractAnalysis,
};

fn effect_cohort() -> Cohort {
    SyntheticCohort::group(12)
        .tracts(&["AF_left", "CST_left", "UF_left"])
        .points(40)
        .noise_sd(0.05)
        .baseline(0.45)
        .effect(1, 10..20, 0.2)
        .confound("age", 0.02)
        .seed(31)
        .build()
        .unwrap()
}

/// Basic smoke test of the convenience function.
#[test]
fn smoke_test() {
    let cohort = SyntheticCohort::correlation(15).points(10).seed(4).build().unwrap();
    let report = analyze(&cohort, &["tract_0"]).unwrap();

    assert_eq!(report.analysis_type, AnalysisType::Correlation);
    assert_eq!(report.metadata.permutations, 1_000);
    assert!(report.tracts[0].p_value.iter().all(|p| (0.0..=1.0).contains(p)));
}

/// Test builder API.
#[test]
fn builder_api() {
    let analysis = TractAnalysis::new()
        .alpha(0.01)
        .permutations(2_000)
        .method(CorrectionMethod::ClusterFwe)
        .seed(12);

    let config = analysis.config();
    assert!((config.alpha - 0.01).abs() < 1e-12);
    assert_eq!(config.permutations, PermutationCount::Fixed(2_000));
    assert_eq!(config.method, CorrectionMethod::ClusterFwe);
    assert!(!config.joint_correction);
    assert_eq!(config.seed, Some(12));
}

#[test]
fn config_overrides_from_lookup() {
    let env: HashMap<&str, &str> = [
        ("TRACTSTATS_ALPHA", "0.01"),
        ("TRACTSTATS_METHOD", "cluster_fwe"),
        ("TRACTSTATS_NPERM", "not-a-number"),
    ]
    .into_iter()
    .collect();
    let config = Config::default().with_overrides_from(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.alpha, 0.01);
    assert_eq!(config.method, CorrectionMethod::ClusterFwe);
    assert_eq!(config.permutations, PermutationCount::Auto);

    let analysis = TractAnalysis::with_config(config);
    assert_eq!(analysis.config().method, CorrectionMethod::ClusterFwe);
}

#[test]
fn effect_found_in_affected_tract_only() {
    let report = TractAnalysis::quick()
        .alpha(0.01)
        .seed(99)
        .run(&effect_cohort(), &["AF_left", "CST_left", "UF_left"])
        .unwrap();

    let cst = report.tract("CST_left").unwrap();
    let positions = cst.significant_positions();
    assert_eq!(positions, (10..20).collect::<Vec<_>>());

    let record = report.records.iter().find(|r| r.tract == "CST_left").unwrap();
    assert!((10..20).contains(&record.min_p_position.unwrap()));
    // group 1 carries the positive shift
    assert!(record.statistic_at_min_p < 0.0);
}

#[test]
fn cluster_correction_finds_effect_window() {
    let cohort = SyntheticCohort::group(20)
        .points(40)
        .effect(0, 10..20, 1.5)
        .seed(5)
        .build()
        .unwrap();
    let report = TractAnalysis::quick()
        .method(CorrectionMethod::ClusterFwe)
        .seed(99)
        .run(&cohort, &["tract_0"])
        .unwrap();

    let areas = report.tracts[0].significant_areas();
    assert!(
        areas.iter().any(|a| a.start <= 12 && a.end >= 18),
        "effect window not recovered: {:?}",
        areas
    );
}

#[test]
fn json_serialization() {
    let report = TractAnalysis::quick()
        .seed(2)
        .run(&effect_cohort(), &["CST_left"])
        .unwrap();

    let json = to_json(&report).unwrap();
    assert!(json.contains("\"tract\":\"CST_left\""));
    assert!(json.contains("\"seed\":2"));

    let parsed: AnalysisReport = serde_json::from_str(&to_json_pretty(&report).unwrap()).unwrap();
    assert_eq!(parsed.records, report.records);
    assert_eq!(parsed.tracts[0].mask, report.tracts[0].mask);
}

#[test]
fn terminal_report_lists_tracts() {
    let report = TractAnalysis::quick()
        .seed(2)
        .run(&effect_cohort(), &["AF_left", "CST_left"])
        .unwrap();
    let output = format_report(&report);
    assert!(output.contains("AF_left"));
    assert!(output.contains("CST_left"));
    assert!(output.contains("Permutations: 500 (seed 2)"));
}

#[test]
fn alignment_errors_reported() {
    let table = MetadataTable {
        analysis_column: "group".to_string(),
        confound_names: vec![],
        rows: (0..4)
            .map(|i| MetadataRow {
                subject: format!("sub-{}", i),
                value: f64::from(i % 2),
                confounds: vec![],
            })
            .collect(),
    };
    let mut profiles: HashMap<String, Vec<Vec<f64>>> = (0..4)
        .map(|i| (format!("sub-{}", i), vec![vec![0.4, 0.5, 0.6]]))
        .collect();
    profiles.remove("sub-2");

    let err = Cohort::new(table, vec!["AF_left".to_string()], profiles).unwrap_err();
    assert!(matches!(err, Error::MissingMetrics { ref subject } if subject == "sub-2"));
    assert_eq!(err.kind(), ErrorKind::Alignment);
}

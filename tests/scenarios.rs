//! End-to-end scenarios with known outcomes.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use tractometry_stats::analysis::cluster_fwe_mask;
use tractometry_stats::{
    Cohort, ConfoundMatrix, CorrectionMethod, Error, ErrorKind, FweThreshold, Labels,
    MetadataRow, MetadataTable, MetricTensor, TractAnalysis,
};

const N_PER_GROUP: usize = 10;
const N_POINTS: usize = 10;

/// Two tracts, 20 subjects, group 1 shifted by +2 at positions 3..=6 of
/// both tracts. Every subject draws its own noise.
fn offset_cohort() -> Cohort {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let normal = Normal::new(0.5, 0.1).unwrap();
    let noise: Vec<Vec<Vec<f64>>> = (0..2)
        .map(|_| {
            (0..N_POINTS)
                .map(|_| (0..2 * N_PER_GROUP).map(|_| normal.sample(&mut rng)).collect())
                .collect()
        })
        .collect();

    let n = 2 * N_PER_GROUP;
    let groups: Vec<u8> = (0..n).map(|s| u8::from(s >= N_PER_GROUP)).collect();
    let metrics = MetricTensor::from_fn(2, N_POINTS, n, |t, p, s| {
        let shift = if groups[s] == 1 && (3..=6).contains(&p) {
            2.0
        } else {
            0.0
        };
        noise[t][p][s] + shift
    });

    Cohort::from_parts(
        (0..n).map(|s| format!("sub-{:02}", s)).collect(),
        vec!["AF_left".to_string(), "CST_left".to_string()],
        Labels::Group(groups),
        ConfoundMatrix::empty(n),
        metrics,
    )
    .unwrap()
}

#[test]
fn group_offset_detected_exactly() {
    let cohort = offset_cohort();
    let report = TractAnalysis::new()
        .permutations(1000)
        .method(CorrectionMethod::AlphaFwe)
        .seed(17)
        .run(&cohort, &["AF_left", "CST_left"])
        .unwrap();

    for tract in &report.tracts {
        assert_eq!(
            tract.significant_positions(),
            vec![3, 4, 5, 6],
            "tract {}",
            tract.name
        );
        // group 0 is lower where group 1 is shifted up
        assert!(tract.statistic[3..=6].iter().all(|&t| t < 0.0));
        match tract.threshold {
            FweThreshold::AlphaFwe { alpha_fwe, .. } => {
                assert!(alpha_fwe > 0.0 && alpha_fwe <= 0.05)
            }
            other => panic!("unexpected threshold {:?}", other),
        }
    }
    assert!(!report.precision_limited);
    assert!(report.warnings.is_empty());
    assert!(report.records.iter().all(|r| (3..=6).contains(&r.min_p_position.unwrap())));
}

#[test]
fn group_offset_detected_with_joint_correction() {
    let cohort = offset_cohort();
    let report = TractAnalysis::new()
        .permutations(1000)
        .joint_correction(true)
        .seed(17)
        .run(&cohort, &["AF_left", "CST_left"])
        .unwrap();

    assert_eq!(report.tracts[0].threshold, report.tracts[1].threshold);
    for tract in &report.tracts {
        assert_eq!(tract.significant_areas(), vec![3..7]);
    }
}

#[test]
fn swapped_groups_give_same_mask() {
    let cohort = offset_cohort();
    let swapped = Cohort::from_parts(
        cohort.subjects().to_vec(),
        cohort.tracts().to_vec(),
        cohort.labels().swapped(),
        ConfoundMatrix::empty(cohort.subjects().len()),
        cohort.metrics().clone(),
    )
    .unwrap();

    let analysis = TractAnalysis::quick().seed(5);
    let a = analysis.run(&cohort, &["AF_left"]).unwrap();
    let b = analysis.run(&swapped, &["AF_left"]).unwrap();

    for (x, y) in a.tracts[0].statistic.iter().zip(&b.tracts[0].statistic) {
        assert!((x + y).abs() < 1e-9);
    }
    assert_eq!(a.tracts[0].mask, b.tracts[0].mask);
}

/// Correlation cohort: position 0 is a linear function of the target, the
/// other positions are even functions of the centered target (r = 0).
fn linear_position_cohort() -> Cohort {
    let n = 20;
    let target: Vec<f64> = (0..n).map(|s| s as f64).collect();
    let center = (n - 1) as f64 / 2.0;
    let metrics = MetricTensor::from_fn(1, 8, n, |_, p, s| {
        let c = s as f64 - center;
        match p {
            0 => 0.5 * target[s] + 1.0,
            1 => c * c,
            2 => c.abs(),
            3 => c.cos(),
            4 => 0.01 * c.powi(4),
            5 => (c * 0.3).cosh(),
            6 => 1.0 / (1.0 + c * c),
            _ => (-c * c / 10.0).exp(),
        }
    });
    Cohort::from_parts(
        (0..n).map(|s| format!("sub-{:02}", s)).collect(),
        vec!["SLF_right".to_string()],
        Labels::Target(target),
        ConfoundMatrix::empty(n),
        metrics,
    )
    .unwrap()
}

/// Pointwise result of the linear-position cohort, checked against a
/// cluster mask with a minimum cluster size of one.
#[test]
fn linear_position_flagged_by_unit_cluster_mask() {
    let cohort = linear_position_cohort();
    let report = TractAnalysis::quick()
        .method(CorrectionMethod::ClusterFwe)
        .seed(8)
        .run(&cohort, &["SLF_right"])
        .unwrap();

    let tract = &report.tracts[0];
    assert!((tract.statistic[0] - 1.0).abs() < 1e-12);
    assert!(tract.p_value[0] < 1e-10);
    assert!(tract.p_value[1..].iter().all(|&p| p > 0.9));
    assert_eq!(report.records[0].min_p_position, Some(0));

    let mask = cluster_fwe_mask(&tract.p_value, report.alpha, 1);
    let flagged: Vec<usize> = (0..mask.len()).filter(|&i| mask[i]).collect();
    assert_eq!(flagged, vec![0]);
}

fn metadata_table(confound: impl Fn(usize, u8) -> f64) -> (MetadataTable, HashMap<String, Vec<Vec<f64>>>) {
    let rows: Vec<MetadataRow> = (0..8)
        .map(|s| {
            let group = (s % 2) as u8;
            MetadataRow {
                subject: format!("sub-{:02}", s),
                value: f64::from(group),
                confounds: vec![confound(s, group)],
            }
        })
        .collect();
    let profiles = rows
        .iter()
        .enumerate()
        .map(|(s, row)| {
            let profile: Vec<f64> = (0..5).map(|p| 0.4 + 0.01 * ((s * 3 + p) % 7) as f64).collect();
            (row.subject.clone(), vec![profile])
        })
        .collect();
    let table = MetadataTable {
        analysis_column: "group".to_string(),
        confound_names: vec!["dx".to_string()],
        rows,
    };
    (table, profiles)
}

#[test]
fn confound_equal_to_group_is_rejected() {
    let (table, profiles) = metadata_table(|_, group| f64::from(group));
    let cohort = Cohort::new(table, vec!["AF_left".to_string()], profiles).unwrap();

    let err = TractAnalysis::quick()
        .seed(1)
        .run(&cohort, &["AF_left"])
        .unwrap_err();
    assert!(matches!(err, Error::SingularDesign { .. }));
    assert_eq!(err.kind(), ErrorKind::SingularRegression);
}

#[test]
fn independent_confound_is_accepted() {
    let (table, profiles) = metadata_table(|s, _| 20.0 + (s * s % 11) as f64);
    let cohort = Cohort::new(table, vec!["AF_left".to_string()], profiles).unwrap();

    let report = TractAnalysis::quick()
        .seed(1)
        .run(&cohort, &["AF_left"])
        .unwrap();
    assert_eq!(report.metadata.confounds, vec!["dx".to_string()]);
    assert_eq!(report.tracts[0].p_value.len(), 5);
}

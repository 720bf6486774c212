//! Terminal output formatting with colors.

use colored::Colorize;

use crate::analysis::FweThreshold;
use crate::constants::SCIENTIFIC_CUTOFF;
use crate::result::AnalysisReport;
use crate::types::{AnalysisType, CorrectionMethod};

/// Format a value for display: 6 decimals, or scientific notation for
/// magnitudes at or below 1e-5.
///
/// Only the presentation is rounded; stored values keep full precision.
pub fn format_value(value: f64) -> String {
    if value.abs() > SCIENTIFIC_CUTOFF {
        format!("{:.6}", value)
    } else {
        format!("{:.6e}", value)
    }
}

/// Format an AnalysisReport for human-readable terminal output.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(72);

    output.push_str("tractometry-stats\n");
    output.push_str(&sep);
    output.push_str("\n\n");

    let analysis = match report.analysis_type {
        AnalysisType::Group => "group comparison (t test)",
        AnalysisType::Correlation => "correlation (Pearson r)",
    };
    let method = match report.method {
        CorrectionMethod::AlphaFwe => "alphaFWE",
        CorrectionMethod::ClusterFwe => "clusterFWE",
    };
    output.push_str(&format!("  Analysis:     {}\n", analysis));
    output.push_str(&format!(
        "  Subjects:     {} ({} positions per tract)\n",
        report.metadata.n_subjects, report.metadata.n_points
    ));
    if !report.metadata.confounds.is_empty() {
        output.push_str(&format!(
            "  Confounds:    {}\n",
            report.metadata.confounds.join(", ")
        ));
    }
    output.push_str(&format!(
        "  Correction:   {} at alpha = {}{}\n",
        method,
        report.alpha,
        if report.joint_correction {
            ", joint across tracts"
        } else {
            ""
        }
    ));
    output.push_str(&format!(
        "  Permutations: {} (seed {})\n\n",
        report.metadata.permutations, report.metadata.seed
    ));

    let stat_header = match report.analysis_type {
        AnalysisType::Group => "t",
        AnalysisType::Correlation => "r",
    };
    output.push_str(&format!(
        "  {:<20} {:>14} {:>14} {:>14} {:>6}  {}\n",
        "Tract", method, "min p", stat_header, "pos", "significant"
    ));

    for (record, tract) in report.records.iter().zip(&report.tracts) {
        let threshold = match tract.threshold {
            FweThreshold::AlphaFwe { alpha_fwe, .. } => format_value(alpha_fwe),
            FweThreshold::ClusterFwe { min_cluster } => min_cluster.to_string(),
        };
        let position = record
            .min_p_position
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let areas = tract.significant_areas();
        let significant = if areas.is_empty() {
            "none".dimmed().to_string()
        } else {
            areas
                .iter()
                .map(|a| format!("{}-{}", a.start, a.end - 1))
                .collect::<Vec<_>>()
                .join(", ")
                .green()
                .bold()
                .to_string()
        };
        output.push_str(&format!(
            "  {:<20} {:>14} {:>14} {:>14} {:>6}  {}\n",
            record.tract,
            threshold,
            format_value(record.min_p_value),
            format_value(record.statistic_at_min_p),
            position,
            significant
        ));
    }

    if report.precision_limited {
        output.push('\n');
        output.push_str(&format!(
            "  {}\n",
            "\u{26A0} Too few permutations: corrected thresholds are imprecise"
                .yellow()
                .bold()
        ));
    }

    if !report.warnings.is_empty() {
        output.push('\n');
        output.push_str("  Warnings:\n");
        for warning in &report.warnings {
            output.push_str(&format!("    - {}\n", warning.description()));
        }
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');
    output
}

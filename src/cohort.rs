//! Cohort data: subjects, labels, confounds and metric profiles.
//!
//! A [`Cohort`] is built once from the metadata table and the per-subject
//! profiles handed over by the loading layer. Construction validates every
//! invariant the statistics rely on (labels, alignment, shapes), so that
//! nothing downstream has to re-check them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{AnalysisType, Labels, Matrix};

/// Dense metric values indexed by `[tract, position, subject]`.
///
/// Subjects are the innermost dimension, so the values of one position
/// across all subjects form a contiguous slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTensor {
    n_tracts: usize,
    n_points: usize,
    n_subjects: usize,
    data: Vec<f64>,
}

impl MetricTensor {
    /// Create a zero-filled tensor.
    pub fn zeros(n_tracts: usize, n_points: usize, n_subjects: usize) -> Self {
        Self {
            n_tracts,
            n_points,
            n_subjects,
            data: vec![0.0; n_tracts * n_points * n_subjects],
        }
    }

    /// Build a tensor from a generator `f(tract, position, subject)`.
    pub fn from_fn<F>(n_tracts: usize, n_points: usize, n_subjects: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        let mut tensor = Self::zeros(n_tracts, n_points, n_subjects);
        for tract in 0..n_tracts {
            for position in 0..n_points {
                let profile = tensor.profile_mut(tract, position);
                for (subject, value) in profile.iter_mut().enumerate() {
                    *value = f(tract, position, subject);
                }
            }
        }
        tensor
    }

    /// Number of tracts.
    pub fn n_tracts(&self) -> usize {
        self.n_tracts
    }

    /// Number of positions per tract.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Number of subjects.
    pub fn n_subjects(&self) -> usize {
        self.n_subjects
    }

    fn offset(&self, tract: usize, position: usize) -> usize {
        debug_assert!(tract < self.n_tracts && position < self.n_points);
        (tract * self.n_points + position) * self.n_subjects
    }

    /// Values of all subjects at one position of one tract.
    pub fn profile(&self, tract: usize, position: usize) -> &[f64] {
        let start = self.offset(tract, position);
        &self.data[start..start + self.n_subjects]
    }

    /// Mutable values of all subjects at one position of one tract.
    pub fn profile_mut(&mut self, tract: usize, position: usize) -> &mut [f64] {
        let start = self.offset(tract, position);
        let n = self.n_subjects;
        &mut self.data[start..start + n]
    }

    /// Single value.
    pub fn get(&self, tract: usize, position: usize, subject: usize) -> f64 {
        self.profile(tract, position)[subject]
    }
}

/// Per-subject confound covariates, rows in cohort subject order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfoundMatrix {
    names: Vec<String>,
    values: Matrix,
}

impl ConfoundMatrix {
    /// Matrix without confound columns.
    pub fn empty(n_subjects: usize) -> Self {
        Self {
            names: Vec::new(),
            values: Matrix::zeros(n_subjects, 0),
        }
    }

    /// Build from row-major per-subject values.
    ///
    /// Every row must have one value per name and no value may be missing.
    pub fn from_rows(subjects: &[String], names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let k = names.len();
        let mut values = Matrix::zeros(rows.len(), k);
        for (i, row) in rows.iter().enumerate() {
            let subject = subjects.get(i).cloned().unwrap_or_else(|| format!("#{}", i));
            if row.len() != k {
                return Err(Error::ConfoundMisaligned {
                    subject,
                    expected: k,
                    found: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(Error::MissingConfoundValue {
                        subject,
                        column: names[j].clone(),
                    });
                }
                values[(i, j)] = value;
            }
        }
        Ok(Self { names, values })
    }

    /// Confound column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of confound columns.
    pub fn len(&self) -> usize {
        self.values.ncols()
    }

    /// Whether there are no confound columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subjects × confounds matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.values
    }
}

/// One row of the subject metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    /// Subject identifier.
    pub subject: String,
    /// Group label (0/1) or continuous target, depending on the table header.
    pub value: f64,
    /// Confound values, ordered like [`MetadataTable::confound_names`].
    pub confounds: Vec<f64>,
}

/// Subject metadata: identifier, analysis column, then confound columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTable {
    /// Header of the analysis column (`group` or `target`).
    pub analysis_column: String,
    /// Names of the confound columns.
    pub confound_names: Vec<String>,
    /// One row per subject.
    pub rows: Vec<MetadataRow>,
}

/// Validated analysis input.
#[derive(Debug, Clone)]
pub struct Cohort {
    subjects: Vec<String>,
    index: HashMap<String, usize>,
    tracts: Vec<String>,
    labels: Labels,
    confounds: ConfoundMatrix,
    metrics: MetricTensor,
}

impl Cohort {
    /// Validate metadata and profiles and assemble a cohort.
    ///
    /// `profiles` maps subject identifiers to `[tract][position]` values,
    /// with tracts ordered like `tract_names`. Subject order follows the
    /// metadata table.
    ///
    /// # Errors
    ///
    /// - label errors: unknown analysis column, group label outside {0,1},
    ///   non-finite target
    /// - alignment errors: subjects missing on either side, duplicate
    ///   subjects, inconsistent profile shapes, non-finite metric values,
    ///   incomplete confound rows
    /// - too few subjects for the requested analysis
    pub fn new(
        metadata: MetadataTable,
        tract_names: Vec<String>,
        mut profiles: HashMap<String, Vec<Vec<f64>>>,
    ) -> Result<Self> {
        let analysis = AnalysisType::from_column_header(&metadata.analysis_column)?;

        let mut subjects = Vec::with_capacity(metadata.rows.len());
        let mut index = HashMap::with_capacity(metadata.rows.len());
        for row in &metadata.rows {
            if index.insert(row.subject.clone(), subjects.len()).is_some() {
                return Err(Error::DuplicateSubject {
                    subject: row.subject.clone(),
                });
            }
            subjects.push(row.subject.clone());
        }

        let labels = parse_labels(analysis, &metadata.rows)?;
        check_subject_counts(&labels)?;

        // Every profile needs a metadata row.
        let mut orphans: Vec<&String> = profiles.keys().filter(|id| !index.contains_key(*id)).collect();
        orphans.sort();
        if let Some(subject) = orphans.first() {
            return Err(Error::MissingMetadata {
                subject: (*subject).clone(),
            });
        }

        let n_tracts = tract_names.len();
        let mut n_points = None;
        let mut ordered = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            let profile = profiles.remove(subject).ok_or_else(|| Error::MissingMetrics {
                subject: subject.clone(),
            })?;
            let expected_points = *n_points.get_or_insert_with(|| profile.first().map_or(0, Vec::len));
            check_shape(subject, &profile, n_tracts, expected_points)?;
            check_finite(subject, &profile)?;
            ordered.push(profile);
        }
        let n_points = n_points.unwrap_or(0);

        let metrics = MetricTensor::from_fn(n_tracts, n_points, subjects.len(), |t, p, s| {
            ordered[s][t][p]
        });

        let rows: Vec<Vec<f64>> = metadata.rows.iter().map(|r| r.confounds.clone()).collect();
        let confounds = ConfoundMatrix::from_rows(&subjects, metadata.confound_names, &rows)?;

        Ok(Self {
            subjects,
            index,
            tracts: tract_names,
            labels,
            confounds,
            metrics,
        })
    }

    /// Assemble a cohort from already aligned parts.
    ///
    /// Used for in-memory data (synthetic cohorts, tests). Dimensions are
    /// checked against the subject list.
    pub fn from_parts(
        subjects: Vec<String>,
        tracts: Vec<String>,
        labels: Labels,
        confounds: ConfoundMatrix,
        metrics: MetricTensor,
    ) -> Result<Self> {
        let n = subjects.len();
        if labels.len() != n || metrics.n_subjects() != n || confounds.matrix().nrows() != n {
            return Err(Error::ConfoundMisaligned {
                subject: subjects.first().cloned().unwrap_or_default(),
                expected: n,
                found: confounds.matrix().nrows().min(labels.len()).min(metrics.n_subjects()),
            });
        }
        if metrics.n_tracts() != tracts.len() {
            return Err(Error::ShapeMismatch {
                subject: subjects.first().cloned().unwrap_or_default(),
                expected_tracts: tracts.len(),
                expected_points: metrics.n_points(),
                found_tracts: metrics.n_tracts(),
                found_points: metrics.n_points(),
            });
        }
        if let Labels::Group(groups) = &labels {
            if let Some((i, &g)) = groups.iter().enumerate().find(|(_, g)| **g > 1) {
                return Err(Error::InvalidGroupLabel {
                    subject: subjects[i].clone(),
                    value: f64::from(g),
                });
            }
        }
        check_subject_counts(&labels)?;
        for t in 0..metrics.n_tracts() {
            for p in 0..metrics.n_points() {
                if let Some(s) = metrics.profile(t, p).iter().position(|v| !v.is_finite()) {
                    return Err(Error::NonFiniteMetric {
                        subject: subjects[s].clone(),
                        tract: t,
                        position: p,
                    });
                }
            }
        }

        let mut index = HashMap::with_capacity(n);
        for (i, subject) in subjects.iter().enumerate() {
            if index.insert(subject.clone(), i).is_some() {
                return Err(Error::DuplicateSubject {
                    subject: subject.clone(),
                });
            }
        }

        Ok(Self {
            subjects,
            index,
            tracts,
            labels,
            confounds,
            metrics,
        })
    }

    /// Subject identifiers in cohort order.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Index of a subject in the tensor, by identifier.
    pub fn subject_index(&self, subject: &str) -> Option<usize> {
        self.index.get(subject).copied()
    }

    /// Tract names in tensor order.
    pub fn tracts(&self) -> &[String] {
        &self.tracts
    }

    /// Index of a tract by name.
    pub fn tract_index(&self, name: &str) -> Option<usize> {
        self.tracts.iter().position(|t| t == name)
    }

    /// Subject labeling.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Analysis type implied by the labeling.
    pub fn analysis_type(&self) -> AnalysisType {
        self.labels.analysis_type()
    }

    /// Confound covariates.
    pub fn confounds(&self) -> &ConfoundMatrix {
        &self.confounds
    }

    /// Raw metric values.
    pub fn metrics(&self) -> &MetricTensor {
        &self.metrics
    }
}

fn parse_labels(analysis: AnalysisType, rows: &[MetadataRow]) -> Result<Labels> {
    match analysis {
        AnalysisType::Group => rows
            .iter()
            .map(|row| {
                if row.value == 0.0 {
                    Ok(0)
                } else if row.value == 1.0 {
                    Ok(1)
                } else {
                    Err(Error::InvalidGroupLabel {
                        subject: row.subject.clone(),
                        value: row.value,
                    })
                }
            })
            .collect::<Result<Vec<u8>>>()
            .map(Labels::Group),
        AnalysisType::Correlation => rows
            .iter()
            .map(|row| {
                if row.value.is_finite() {
                    Ok(row.value)
                } else {
                    Err(Error::InvalidTarget {
                        subject: row.subject.clone(),
                    })
                }
            })
            .collect::<Result<Vec<f64>>>()
            .map(Labels::Target),
    }
}

fn check_subject_counts(labels: &Labels) -> Result<()> {
    if labels.len() < 3 {
        return Err(Error::TooFewSubjects {
            reason: format!("{} subjects, at least 3 required", labels.len()),
        });
    }
    if let Labels::Group(groups) = labels {
        let ones = groups.iter().filter(|&&g| g == 1).count();
        if ones == 0 || ones == groups.len() {
            return Err(Error::TooFewSubjects {
                reason: "both groups need at least one subject".to_string(),
            });
        }
    }
    Ok(())
}

fn check_shape(
    subject: &str,
    profile: &[Vec<f64>],
    expected_tracts: usize,
    expected_points: usize,
) -> Result<()> {
    let bad_tract = profile.iter().find(|p| p.len() != expected_points);
    if profile.len() != expected_tracts || bad_tract.is_some() {
        return Err(Error::ShapeMismatch {
            subject: subject.to_string(),
            expected_tracts,
            expected_points,
            found_tracts: profile.len(),
            found_points: bad_tract.map_or(expected_points, Vec::len),
        });
    }
    Ok(())
}

fn check_finite(subject: &str, profile: &[Vec<f64>]) -> Result<()> {
    for (tract, values) in profile.iter().enumerate() {
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteMetric {
                subject: subject.to_string(),
                tract,
                position,
            });
        }
    }
    Ok(())
}

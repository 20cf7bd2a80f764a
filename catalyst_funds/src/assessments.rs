//! The assessments pipeline.
//!
//! The fund adapter builds the canonical assessments table. The community advisor
//! summary is derived from it, and the veteran table is read when the fund has an
//! adapter for it.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use snafu::prelude::*;

use crate::config::{CaStatus, Policy, QaStatus};
use crate::errors::*;
use crate::registry::{AdapterRegistry, Operation};
use crate::schema::{advisors, assessments, veterans};
use crate::table::{Cell, RowRef, Table};
use crate::workbook::WorkbookTables;

/// The canonical assessment tables of one fund.
#[derive(PartialEq, Debug, Clone)]
pub struct Assessments {
    fund: String,
    assessments: Table,
    advisors: Table,
    veterans: Option<Table>,
    warnings: Vec<PipelineWarning>,
}

impl Assessments {
    pub fn fund(&self) -> &str {
        &self.fund
    }

    /// One row per assessment.
    pub fn assessments(&self) -> &Table {
        &self.assessments
    }

    /// One row per community advisor, sorted by CA.
    pub fn advisors(&self) -> &Table {
        &self.advisors
    }

    /// The veteran community advisors, when the fund has an adapter for them.
    pub fn veterans(&self) -> Option<&Table> {
        self.veterans.as_ref()
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }
}

/// Runs the assessments pipeline of a fund over its workbook.
pub fn run_assessments(
    fund: &str,
    workbook: &WorkbookTables,
    registry: &AdapterRegistry,
    policy: &Policy,
) -> FundResult<Assessments> {
    info!("run_assessments: {}: sheets {:?}", fund, workbook.sheet_names());
    let assessments_adapter = registry.assessments(fund)?;
    let cas_adapter = registry.cas(fund)?;

    let mut warnings: Vec<PipelineWarning> = Vec::new();
    let raw = assessments_adapter(workbook, policy, &mut warnings)?;
    let mut table = ensure_columns(fund, Operation::Assessments, &raw, &assessments::COLUMNS)?;
    table.set_label(fund);

    let raw_cas = cas_adapter(&table, workbook, policy)?;
    let cas = ensure_columns(fund, Operation::CommunityAdvisors, &raw_cas, &advisors::COLUMNS)?;

    let veterans = match registry.vcas(fund) {
        Ok(adapter) => {
            let raw_vcas = adapter(workbook)?;
            Some(ensure_columns(
                fund,
                Operation::VeteranCommunityAdvisors,
                &raw_vcas,
                &veterans::COLUMNS,
            )?)
        }
        Err(e) => {
            info!("run_assessments: {}: skipping veterans: {}", fund, e);
            None
        }
    };

    info!(
        "run_assessments: {}: {} assessments, {} CAs, {} warnings",
        fund,
        table.len(),
        cas.len(),
        warnings.len()
    );
    Ok(Assessments {
        fund: fund.to_string(),
        assessments: table,
        advisors: cas,
        veterans,
        warnings,
    })
}

/// Checks that the output of an adapter has exactly the expected columns, and returns
/// it with the columns in the expected order.
pub fn ensure_columns(
    fund: &str,
    operation: Operation,
    table: &Table,
    expected: &[&str],
) -> FundResult<Table> {
    let found: BTreeSet<&str> = table.columns().iter().map(|s| s.as_str()).collect();
    let wanted: BTreeSet<&str> = expected.iter().copied().collect();
    ensure!(
        found == wanted && table.columns().len() == expected.len(),
        SchemaMismatchSnafu {
            adapter: operation.function_name(fund),
            expected: expected.iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            found: table.columns().to_vec(),
        }
    );
    table.select(expected)
}

// ********* Row derivations **********

/// Quality tier marker columns, with the class they stand for.
/// When several markers are set on a row, the first one in this order wins.
pub const QA_CLASS_MARKERS: [(&str, &str); 3] = [
    ("Result Filtered Out", assessments::REASON_FILTERED_OUT),
    ("Result Good", "Good"),
    ("Result Excellent", "Excellent"),
];

/// The quality class of a row: the class of its marked tier column.
pub fn qa_class(
    row: RowRef<'_>,
    sheet: &str,
    warnings: &mut Vec<PipelineWarning>,
) -> Option<&'static str> {
    let marked: Vec<&'static str> = QA_CLASS_MARKERS
        .iter()
        .filter(|(col, _)| row.get(col).is_marked())
        .map(|(_, class)| *class)
        .collect();
    let chosen = *marked.first()?;
    if marked.len() > 1 {
        record_warning(
            warnings,
            PipelineWarning::AmbiguousQaClass {
                sheet: sheet.to_string(),
                row: row.index(),
                markers: marked.iter().map(|s| s.to_string()).collect(),
                chosen: chosen.to_string(),
            },
        );
    }
    Some(chosen)
}

/// The mean of the non-blank cells of the given columns, or an empty cell.
pub fn mean_rating(row: RowRef<'_>, columns: &[&str]) -> Cell {
    let ratings: Vec<f64> = columns.iter().filter_map(|c| row.get(c).as_float()).collect();
    if ratings.is_empty() {
        return Cell::Empty;
    }
    Cell::Float(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// Number of characters of the justifications of an assessment, put together.
pub fn justification_length(row: RowRef<'_>) -> usize {
    assessments::JUSTIFICATION_COLUMNS
        .iter()
        .filter_map(|c| row.get(c).as_text())
        .map(|s| s.chars().count())
        .sum()
}

// ********* Community advisors **********

/// Where the exclusion of a community advisor comes from.
#[derive(PartialEq, Debug, Clone)]
pub enum CaExclusion<'a> {
    /// The fund has no exclusion criterion: everyone is included.
    None,
    /// Excluded when the share of excluded assessments is above the policy ratio.
    Heuristic(&'a Policy),
    /// The fund ships the list of excluded CAs, with the reason of each exclusion.
    Explicit(BTreeMap<String, String>),
}

/// Builds the summary of the community advisors found in the assessments.
pub fn ca_summary(table: &Table, exclusion: CaExclusion<'_>) -> FundResult<Table> {
    table.require_columns(&[assessments::CA, assessments::QA_STATUS])?;
    let counts = table.group_counts(assessments::CA, assessments::QA_STATUS);
    let excluded_label = QaStatus::Excluded.as_str();
    let mut res = Table::new("advisors", &advisors::COLUMNS);
    for (ca, by_status) in counts.iter() {
        let total: usize = by_status.values().sum();
        let (status, reason) = match &exclusion {
            CaExclusion::None => (CaStatus::Included, CaStatus::Included.as_str().to_string()),
            CaExclusion::Heuristic(policy) => {
                let excluded = by_status.get(excluded_label).copied().unwrap_or(0);
                if (excluded as f64) > policy.ca_exclusion_ratio * (total as f64) {
                    (CaStatus::Excluded, policy.ca_exclusion_reason())
                } else {
                    (CaStatus::Included, CaStatus::Included.as_str().to_string())
                }
            }
            CaExclusion::Explicit(excluded) => match excluded.get(ca) {
                Some(reason) => (CaStatus::Excluded, reason.clone()),
                None => (CaStatus::Included, CaStatus::Included.as_str().to_string()),
            },
        };
        res.push_row(vec![
            ca.as_str().into(),
            Cell::Int(total as i64),
            status.as_str().into(),
            reason.into(),
        ]);
    }
    debug!("ca_summary: {} CAs", res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AssessmentAdapters, FundAdapters};

    fn assessment_rows(ca: &str, excluded: usize, total: usize) -> Vec<Vec<Cell>> {
        (0..total)
            .map(|i| {
                let status = if i < excluded {
                    QaStatus::Excluded
                } else {
                    QaStatus::Valid
                };
                vec![
                    ca.into(),
                    format!("proposal {}", i).into(),
                    Cell::Float(4.0),
                    status.as_str().into(),
                    status.as_str().into(),
                    Cell::Empty,
                ]
            })
            .collect()
    }

    fn canonical(rows: Vec<Vec<Cell>>) -> Table {
        let mut t = Table::new("t", &assessments::COLUMNS);
        for r in rows {
            t.push_row(r);
        }
        t
    }

    #[test]
    fn heuristic_exclusion() {
        let mut rows = assessment_rows("ca_bad", 3, 10);
        rows.extend(assessment_rows("ca_good", 1, 10));
        let t = canonical(rows);
        let s = ca_summary(&t, CaExclusion::Heuristic(&Policy::DEFAULT)).unwrap();
        assert_eq!(s.columns(), &["CA", "NUMBER_ASSESSMENTS", "STATUS", "REASON"]);
        assert_eq!(
            s.rows(),
            &[
                vec![
                    "ca_bad".into(),
                    Cell::Int(10),
                    "Excluded".into(),
                    "(Excluded) > 20% (Valid+Excluded)".into()
                ],
                vec!["ca_good".into(), Cell::Int(10), "Included".into(), "Included".into()],
            ]
        );
    }

    #[test]
    fn exclusion_at_the_ratio_is_included() {
        let t = canonical(assessment_rows("ca", 2, 10));
        let s = ca_summary(&t, CaExclusion::Heuristic(&Policy::DEFAULT)).unwrap();
        assert_eq!(s.get(0, "STATUS"), Some(&Cell::text("Included")));
    }

    #[test]
    fn no_criterion_includes_everyone() {
        let t = canonical(assessment_rows("ca", 10, 10));
        let s = ca_summary(&t, CaExclusion::None).unwrap();
        assert_eq!(s.get(0, "STATUS"), Some(&Cell::text("Included")));
        assert_eq!(s.get(0, "REASON"), Some(&Cell::text("Included")));
    }

    #[test]
    fn explicit_exclusion() {
        let mut rows = assessment_rows("b", 0, 2);
        rows.extend(assessment_rows("a", 0, 1));
        let t = canonical(rows);
        let excluded = BTreeMap::from([("b".to_string(), "By Card".to_string())]);
        let s = ca_summary(&t, CaExclusion::Explicit(excluded)).unwrap();
        assert_eq!(s.unique("CA"), vec!["a", "b"]);
        assert_eq!(s.get(1, "STATUS"), Some(&Cell::text("Excluded")));
        assert_eq!(s.get(1, "REASON"), Some(&Cell::text("By Card")));
        assert_eq!(s.get(1, "NUMBER_ASSESSMENTS"), Some(&Cell::Int(2)));
    }

    #[test]
    fn ambiguous_markers_use_priority() {
        let mut sheet = Table::new("vCA Aggregated", &["Result Excellent", "Result Good", "Result Filtered Out"]);
        sheet.push_row(vec!["x".into(), Cell::Empty, Cell::Empty]);
        sheet.push_row(vec!["x".into(), "X".into(), Cell::Empty]);
        sheet.push_row(vec!["x".into(), Cell::Empty, "x".into()]);
        sheet.push_row(vec![Cell::Empty, Cell::Empty, Cell::Empty]);
        let mut warnings = vec![];
        let classes: Vec<Option<&str>> = sheet
            .iter_rows()
            .map(|r| qa_class(r, sheet.label(), &mut warnings))
            .collect();
        assert_eq!(
            classes,
            vec![Some("Excellent"), Some("Good"), Some("Filtered Out"), None]
        );
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0],
            PipelineWarning::AmbiguousQaClass {
                sheet: "vCA Aggregated".to_string(),
                row: 1,
                markers: vec!["Good".to_string(), "Excellent".to_string()],
                chosen: "Good".to_string(),
            }
        );
    }

    #[test]
    fn ratings_and_lengths() {
        let mut t = Table::new("t", &assessments::RATING_COLUMNS);
        t.push_row(vec![Cell::Int(3), Cell::Empty, Cell::Float(4.0)]);
        t.push_row(vec![Cell::Empty, Cell::Empty, Cell::Empty]);
        assert_eq!(mean_rating(t.row(0), &assessments::RATING_COLUMNS), Cell::Float(3.5));
        assert_eq!(mean_rating(t.row(1), &assessments::RATING_COLUMNS), Cell::Empty);

        let mut t = Table::new("t", &assessments::JUSTIFICATION_COLUMNS);
        t.push_row(vec!["é".repeat(100).into(), "b".repeat(20).into(), Cell::Empty]);
        assert_eq!(justification_length(t.row(0)), 120);
    }

    #[test]
    fn schema_check() {
        let t = Table::new("t", &["CA", "PROPOSAL_TITLE"]);
        let err = ensure_columns("f9", Operation::Assessments, &t, &assessments::COLUMNS).unwrap_err();
        match err {
            FundError::SchemaMismatch { adapter, expected, .. } => {
                assert_eq!(adapter, "get_assessments_f9");
                assert_eq!(expected.len(), 6);
            }
            e => panic!("unexpected error {:?}", e),
        }
        let mut columns = assessments::COLUMNS.to_vec();
        columns.reverse();
        let t = Table::new("t", &columns);
        let ordered = ensure_columns("f9", Operation::Assessments, &t, &assessments::COLUMNS).unwrap();
        assert_eq!(ordered.columns(), &assessments::COLUMNS);
    }

    fn bad_assessments(
        _: &WorkbookTables,
        _: &Policy,
        _: &mut Vec<PipelineWarning>,
    ) -> FundResult<Table> {
        Ok(Table::new("t", &["CA", "PROPOSAL_TITLE", "CA_RATING", "QA_STATUS", "REASON"]))
    }

    fn all_included(t: &Table, _: &WorkbookTables, _: &Policy) -> FundResult<Table> {
        ca_summary(t, CaExclusion::None)
    }

    #[test]
    fn adapter_output_is_checked() {
        let mut reg = AdapterRegistry::new();
        reg.register(
            "f9",
            FundAdapters {
                assessments: AssessmentAdapters {
                    assessments: Some(bad_assessments),
                    cas: Some(all_included),
                    vcas: None,
                },
                ..Default::default()
            },
        );
        let wb = WorkbookTables::default();
        let err = run_assessments("f9", &wb, &reg, &Policy::DEFAULT).unwrap_err();
        assert!(matches!(err, FundError::SchemaMismatch { .. }));
        let err = run_assessments("f3", &wb, &reg, &Policy::DEFAULT).unwrap_err();
        assert!(matches!(
            err,
            FundError::AdapterNotFound {
                operation: Operation::Assessments,
                ..
            }
        ));
    }
}

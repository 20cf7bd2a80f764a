//! The adapters of the historical funds.
//!
//! Each fund has its own module, and each module exposes the adapters of the fund
//! through `adapters()`. What the funds share lives here.

use std::ops::Range;

use log::debug;

use crate::assessments::{
    justification_length, mean_rating, qa_class, CaExclusion, QA_CLASS_MARKERS,
};
use crate::config::{Policy, QaStatus};
use crate::errors::*;
use crate::registry::{ChallengeSchema, FundAdapters};
use crate::schema::{assessments, results, veterans};
use crate::table::{Cell, CellKind, Table};
use crate::workbook::WorkbookTables;

mod f3;
mod f4;
mod f5;
mod f6;
mod f7;
mod f8;

pub(crate) fn builtin_adapters() -> Vec<(&'static str, FundAdapters)> {
    vec![
        ("f3", f3::adapters()),
        ("f4", f4::adapters()),
        ("f5", f5::adapters()),
        ("f6", f6::adapters()),
        ("f7", f7::adapters()),
        ("f8", f8::adapters()),
    ]
}

/// The text between the first parenthesis pair of a cell: "Challenge A (CA)" becomes "CA".
/// Cells without a parenthesis are returned unchanged.
pub fn parenthesized_name(cell: &Cell) -> Cell {
    let s = match cell {
        Cell::Str(s) => s,
        _ => return cell.clone(),
    };
    match s.split_once('(') {
        Some((_, rest)) => {
            let inner = rest.split_once(')').map(|(inner, _)| inner).unwrap_or(rest);
            Cell::text(inner)
        }
        None => cell.clone(),
    }
}

/// From fund 4 on, the score column is named "Overall score".
pub(crate) fn overall_score_schema() -> ChallengeSchema {
    ChallengeSchema {
        column_renames: &[("Overall score", results::SCORE)],
    }
}

/// Maps the first column of a validation sheet over a range of rows.
pub(crate) fn map_first_column<F>(table: &mut Table, rows: Range<usize>, f: F) -> FundResult<()>
where
    F: Fn(&Cell) -> Cell,
{
    let first = match table.columns().first() {
        Some(c) => c.clone(),
        // The shape check reports it.
        None => return Ok(()),
    };
    table.map_column(&first, rows, f)
}

/// The given raw columns of a sheet, renamed.
pub(crate) fn pick(sheet: &Table, renames: &[(&str, &str)]) -> FundResult<Table> {
    let raw: Vec<&str> = renames.iter().map(|(r, _)| *r).collect();
    let mut t = sheet.select(&raw)?;
    t.rename_columns(renames);
    Ok(t)
}

// ********* Assessments **********

pub(crate) const VALID_SHEET: &str = "Valid Assessments";
pub(crate) const EXCLUDED_SHEET: &str = "Excluded Assessments";
pub(crate) const AGGREGATED_SHEET: &str = "vCA Aggregated";
pub(crate) const VETERANS_SHEET: &str = "Veteran Community Advisors";

pub(crate) const IDEA_TITLE: &str = "Idea Title";
pub(crate) const ASSESSOR: &str = "Assessor";
pub(crate) const RATING_GIVEN: &str = "Rating Given";
const BLANK_MARKER: &str = "Blank";
const WITHDRAWN_TITLE: &str = "WITHDRAW";

/// Pushes one canonical assessment.
pub(crate) fn push_assessment(
    out: &mut Table,
    ca: Cell,
    title: Cell,
    rating: Cell,
    status: QaStatus,
    reason: &str,
    class: Option<&str>,
) {
    out.push_row(vec![
        ca,
        title,
        rating,
        status.as_str().into(),
        reason.into(),
        class.into(),
    ]);
}

/// The options of the "vCA Aggregated" layout shared by the later funds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AggregatedLayout {
    /// Drops the rows of withdrawn proposals.
    pub drop_withdrawn: bool,
    /// Excludes the valid assessments with too short justifications.
    pub minimum_characters: bool,
}

/// Reads the "vCA Aggregated" layout:
/// - the aggregated sheet holds all the reviewed assessments, with the tier markers
/// - the assessments marked "Blank" in the excluded sheet are added as excluded
pub(crate) fn aggregated_assessments(
    workbook: &WorkbookTables,
    policy: &Policy,
    warnings: &mut Vec<PipelineWarning>,
    layout: AggregatedLayout,
) -> FundResult<Table> {
    let valid = workbook.sheet(AGGREGATED_SHEET)?;
    valid.require_columns(&[IDEA_TITLE, ASSESSOR])?;
    // Without its tier markers or its notes, a row would silently become Valid or too short.
    let markers: Vec<&str> = QA_CLASS_MARKERS.iter().map(|(m, _)| *m).collect();
    valid.require_columns(&markers)?;
    if layout.minimum_characters {
        valid.require_columns(&assessments::JUSTIFICATION_COLUMNS)?;
    }
    let short_reason = policy.minimum_characters_reason();

    let mut out = Table::new(AGGREGATED_SHEET, &assessments::COLUMNS);
    for row in valid.iter_rows() {
        let class = qa_class(row, valid.label(), warnings);
        let (mut status, mut reason) = match class {
            Some(assessments::REASON_FILTERED_OUT) => {
                (QaStatus::Excluded, assessments::REASON_FILTERED_OUT)
            }
            _ => (QaStatus::Valid, assessments::REASON_VALID),
        };
        if layout.minimum_characters
            && status == QaStatus::Valid
            && justification_length(row) < policy.minimum_characters
        {
            status = QaStatus::Excluded;
            reason = short_reason.as_str();
        }
        push_assessment(
            &mut out,
            row.get(ASSESSOR).clone(),
            row.get(IDEA_TITLE).clone(),
            mean_rating(row, &assessments::RATING_COLUMNS),
            status,
            reason,
            class,
        );
    }

    let excluded = workbook.sheet(EXCLUDED_SHEET)?;
    excluded.require_columns(&[IDEA_TITLE, ASSESSOR, BLANK_MARKER])?;
    for row in excluded.iter_rows().filter(|r| r.get(BLANK_MARKER).is_marked()) {
        push_assessment(
            &mut out,
            row.get(ASSESSOR).clone(),
            row.get(IDEA_TITLE).clone(),
            mean_rating(row, &assessments::RATING_COLUMNS),
            QaStatus::Excluded,
            assessments::REASON_BLANK,
            None,
        );
    }

    if layout.drop_withdrawn {
        out.retain_rows(|r| r.get(assessments::PROPOSAL_TITLE).as_str() != Some(WITHDRAWN_TITLE));
    }
    debug!("aggregated_assessments: {} rows", out.len());
    Ok(out)
}

/// The community advisors of the funds without an explicit exclusion list.
pub(crate) fn heuristic_cas(
    table: &Table,
    _workbook: &WorkbookTables,
    policy: &Policy,
) -> FundResult<Table> {
    crate::assessments::ca_summary(table, CaExclusion::Heuristic(policy))
}

/// The "Veteran Community Advisors" sheet of the later funds.
pub(crate) fn veterans_sheet(workbook: &WorkbookTables, name_column: &str) -> FundResult<Table> {
    let sheet = workbook.sheet(VETERANS_SHEET)?;
    let mut t = pick(
        sheet,
        &[
            (name_column, veterans::NAME),
            ("No. of Reviews", veterans::NUMBER_REVIEWS),
            ("vca_link", veterans::URL),
        ],
    )?;
    t.coerce_column(veterans::NUMBER_REVIEWS, CellKind::Int, true)?;
    Ok(t)
}

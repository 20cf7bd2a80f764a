//! Fund 4.
//!
//! The assessments workbook splits valid and excluded assessments into two sheets,
//! and lists the excluded assessors on their own sheet. Each veteran advisor has a
//! master file sheet.

use std::collections::BTreeMap;

use log::debug;

use crate::assessments::{ca_summary, CaExclusion};
use crate::config::{Policy, QaStatus};
use crate::errors::*;
use crate::registry::*;
use crate::schema::{assessments, veterans};
use crate::table::{Cell, Table};
use crate::workbook::WorkbookTables;

use super::{
    map_first_column, overall_score_schema, parenthesized_name, push_assessment, ASSESSOR,
    EXCLUDED_SHEET, IDEA_TITLE, RATING_GIVEN, VALID_SHEET,
};

const EXCLUDED_ASSESSORS_SHEET: &str = "Excluded assessors";
const EXCLUSION_REASONS: [&str; 2] = ["By Card", "By Blanks"];
const VETERAN_SHEET_PREFIX: &str = "vCA Master File Fund 4 - ";
const VETERAN_REVIEW_COLUMNS: [&str; 9] = [
    "Fair",
    "Constructive Feedback",
    "Profanity",
    "Score doesn't match",
    "Copy",
    "Wrong challenge",
    "Wrong criteria",
    "General Infraction",
    "General Infraction: rationale",
];

const NAME_ALIASES: [(&str, &str); 3] = [
    ("DApp&Integrations", "DApps&Integrations "),
    ("Distributed decision making", "Distributed Decision Making"),
    ("Sponsored by leftovers", "Leftovers from regular challenges"),
];

pub(super) fn adapters() -> FundAdapters {
    FundAdapters {
        voting: VotingAdapters {
            validation_setup: Some(validation_setup),
            budget: Some(budget),
            process: Some(overall_score_schema),
        },
        assessments: AssessmentAdapters {
            assessments: Some(assessments),
            cas: Some(cas),
            vcas: Some(vcas),
        },
    }
}

/// Only the challenges of rows 9 to 15 carry their short name in parentheses.
fn validation_setup(mut t: Table) -> FundResult<Table> {
    map_first_column(&mut t, 9..16, parenthesized_name)?;
    Ok(t)
}

fn budget() -> BudgetPolicy {
    BudgetPolicy {
        name_aliases: &NAME_ALIASES,
        explicit_budgets: &[],
    }
}

fn assessments(
    workbook: &WorkbookTables,
    _policy: &Policy,
    _warnings: &mut Vec<PipelineWarning>,
) -> FundResult<Table> {
    let valid = workbook.sheet(VALID_SHEET)?;
    valid.require_columns(&[IDEA_TITLE, ASSESSOR, RATING_GIVEN])?;
    let excluded = workbook.sheet(EXCLUDED_SHEET)?;
    excluded.require_columns(&[IDEA_TITLE, ASSESSOR, RATING_GIVEN, "reason"])?;

    let mut out = Table::new(VALID_SHEET, &assessments::COLUMNS);
    for row in valid.iter_rows() {
        push_assessment(
            &mut out,
            row.get(ASSESSOR).clone(),
            row.get(IDEA_TITLE).clone(),
            row.get(RATING_GIVEN).as_float().into(),
            QaStatus::Valid,
            assessments::REASON_VALID,
            None,
        );
    }
    for row in excluded.iter_rows() {
        let reason = row.get("reason").as_text().unwrap_or_default();
        push_assessment(
            &mut out,
            row.get(ASSESSOR).clone(),
            row.get(IDEA_TITLE).clone(),
            row.get(RATING_GIVEN).as_float().into(),
            QaStatus::Excluded,
            &reason,
            None,
        );
    }
    Ok(out)
}

/// The excluded assessors, with the names of the marked reason columns.
fn cas(table: &Table, workbook: &WorkbookTables, _policy: &Policy) -> FundResult<Table> {
    let sheet = workbook.sheet(EXCLUDED_ASSESSORS_SHEET)?;
    sheet.require_columns(&["name"])?;
    let mut excluded: BTreeMap<String, String> = BTreeMap::new();
    for row in sheet.iter_rows() {
        let name = match row.get("name").as_text() {
            Some(n) => n,
            None => continue,
        };
        let reasons: Vec<&str> = EXCLUSION_REASONS
            .iter()
            .copied()
            .filter(|c| row.get(c).is_marked())
            .collect();
        let reason = if reasons.is_empty() {
            QaStatus::Excluded.as_str().to_string()
        } else {
            reasons.join(", ")
        };
        excluded.insert(name, reason);
    }
    debug!("cas: {} excluded assessors", excluded.len());
    ca_summary(table, CaExclusion::Explicit(excluded))
}

/// One sheet per veteran. A review is a row with any of the review columns filled.
fn vcas(workbook: &WorkbookTables) -> FundResult<Table> {
    let mut out = Table::new("veterans", &veterans::COLUMNS);
    for sheet in workbook.sheets_with_prefix(VETERAN_SHEET_PREFIX) {
        sheet.require_columns(&VETERAN_REVIEW_COLUMNS)?;
        let name = sheet
            .label()
            .strip_prefix(VETERAN_SHEET_PREFIX)
            .unwrap_or_else(|| sheet.label());
        let reviews = sheet
            .iter_rows()
            .filter(|r| VETERAN_REVIEW_COLUMNS.iter().any(|c| !r.get(c).is_blank()))
            .count();
        out.push_row(vec![name.into(), Cell::Int(reviews as i64), Cell::Empty]);
    }
    Ok(out)
}

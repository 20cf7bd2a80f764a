//! Fund 3: the first fund with community reviews.
//!
//! Assessments come from the "Proposals" sheet of the community review workbook,
//! which has no quality tiers and no ratings. The veteran advisors reviewed in
//! dedicated columns of the same sheet.

use crate::assessments::{ca_summary, CaExclusion};
use crate::config::{Policy, QaStatus};
use crate::errors::*;
use crate::registry::*;
use crate::schema::{assessments, veterans};
use crate::table::{Cell, Table};
use crate::workbook::WorkbookTables;

use super::{map_first_column, parenthesized_name, push_assessment, ASSESSOR, IDEA_TITLE};

const PROPOSALS_SHEET: &str = "Proposals";
const OUTCOME: &str = "Outcome";
const NOT_VOTED: &str = "NOT_VOTED";
const UNJUSTIFIED: &str = "UNJUSTIFIED";

const VETERAN_NAMES: [&str; 20] = [
    "Rene M",
    "Łukasz K",
    "Robert T",
    "Olexiy M",
    "Filip B",
    "Michael P",
    "Cryptostig",
    "2072 [ANFRA]",
    "Rodrigo P",
    "RescuedCookie22",
    "CryptoPrime",
    "Steve A",
    "Matias P",
    "Jaime S",
    "Ilija",
    "Anthony",
    "Greg P",
    "James A",
    "Thiago",
    "Danny R",
];

pub(super) fn adapters() -> FundAdapters {
    FundAdapters {
        voting: VotingAdapters {
            validation_setup: Some(validation_setup),
            budget: Some(budget),
            process: Some(process),
        },
        assessments: AssessmentAdapters {
            assessments: Some(assessments),
            cas: Some(cas),
            vcas: Some(vcas),
        },
    }
}

/// A total row closes the sheet, and every challenge name carries its short name
/// in parentheses.
fn validation_setup(mut t: Table) -> FundResult<Table> {
    t.truncate_tail(1);
    let n = t.len();
    map_first_column(&mut t, 0..n, parenthesized_name)?;
    Ok(t)
}

fn budget() -> BudgetPolicy {
    BudgetPolicy::EMPTY
}

fn process() -> ChallengeSchema {
    ChallengeSchema::IDENTITY
}

fn assessments(
    workbook: &WorkbookTables,
    _policy: &Policy,
    _warnings: &mut Vec<PipelineWarning>,
) -> FundResult<Table> {
    let sheet = workbook.sheet(PROPOSALS_SHEET)?;
    sheet.require_columns(&[IDEA_TITLE, ASSESSOR, OUTCOME])?;
    let mut out = Table::new(PROPOSALS_SHEET, &assessments::COLUMNS);
    for row in sheet.iter_rows() {
        let reason = row
            .get(OUTCOME)
            .as_text()
            .unwrap_or_else(|| NOT_VOTED.to_string());
        let status = if reason == UNJUSTIFIED {
            QaStatus::Excluded
        } else {
            QaStatus::Valid
        };
        push_assessment(
            &mut out,
            row.get(ASSESSOR).clone(),
            row.get(IDEA_TITLE).clone(),
            Cell::Empty,
            status,
            &reason,
            None,
        );
    }
    Ok(out)
}

fn cas(table: &Table, _workbook: &WorkbookTables, _policy: &Policy) -> FundResult<Table> {
    ca_summary(table, CaExclusion::None)
}

/// Each veteran has a column in the proposals sheet; a filled cell is a review.
fn vcas(workbook: &WorkbookTables) -> FundResult<Table> {
    let sheet = workbook.sheet(PROPOSALS_SHEET)?;
    sheet.require_columns(&VETERAN_NAMES)?;
    let mut out = Table::new("veterans", &veterans::COLUMNS);
    for name in VETERAN_NAMES {
        let reviews = sheet.iter_rows().filter(|r| !r.get(name).is_blank()).count();
        out.push_row(vec![name.into(), Cell::Int(reviews as i64), Cell::Empty]);
    }
    Ok(out)
}

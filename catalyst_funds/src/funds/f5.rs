//! Fund 5.
//!
//! Like fund 4, but the excluded assessments only refer to proposals by id, and the
//! community advisors sheet flags the excluded assessors.

use std::collections::HashMap;

use crate::assessments::{ca_summary, CaExclusion};
use crate::config::{Policy, QaStatus};
use crate::errors::*;
use crate::registry::*;
use crate::schema::{assessments, veterans};
use crate::table::{Cell, Table};
use crate::workbook::WorkbookTables;

use super::{
    map_first_column, overall_score_schema, parenthesized_name, pick, push_assessment, ASSESSOR,
    EXCLUDED_SHEET, IDEA_TITLE, RATING_GIVEN, VALID_SHEET, VETERANS_SHEET,
};

const PROPOSAL_ID: &str = "proposal_id";
const COMMUNITY_ADVISORS_SHEET: &str = "Community Advisors";
const EXCLUDED_FLAG: &str = "excluded";

const NAME_ALIASES: [(&str, &str); 6] = [
    ("DApp&Integrations", "DApps&Integrations "),
    ("Distributed decision making", "Distributed Decision Making"),
    ("Grow Africa, Grow Cardano wv", "Grow Africa, Grow Cardano"),
    ("Scale-UP Cardanos DeFi Ecosyste", "Scale-UP Cardano's DeFi Ecosystem"),
    ("Fund7 Challenge Setting wv", "Fund7 Challenge Setting"),
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

fn validation_setup(mut t: Table) -> FundResult<Table> {
    map_first_column(&mut t, 9..18, parenthesized_name)?;
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
    warnings: &mut Vec<PipelineWarning>,
) -> FundResult<Table> {
    let valid = workbook.sheet(VALID_SHEET)?;
    valid.require_columns(&[PROPOSAL_ID, IDEA_TITLE, ASSESSOR, RATING_GIVEN])?;
    let excluded = workbook.sheet(EXCLUDED_SHEET)?;
    excluded.require_columns(&[PROPOSAL_ID, ASSESSOR, RATING_GIVEN, "reason"])?;

    let mut out = Table::new(VALID_SHEET, &assessments::COLUMNS);
    let mut titles: HashMap<String, Cell> = HashMap::new();
    for row in valid.iter_rows() {
        if let Some(id) = row.get(PROPOSAL_ID).as_text() {
            titles
                .entry(id)
                .or_insert_with(|| row.get(IDEA_TITLE).clone());
        }
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
        let id = row.get(PROPOSAL_ID).as_text().unwrap_or_default();
        let title = match titles.get(&id) {
            Some(t) => t.clone(),
            None => {
                record_warning(
                    warnings,
                    PipelineWarning::UnmatchedProposal {
                        sheet: EXCLUDED_SHEET.to_string(),
                        proposal_id: id,
                    },
                );
                Cell::Empty
            }
        };
        let reason = row.get("reason").as_text().unwrap_or_default();
        push_assessment(
            &mut out,
            row.get(ASSESSOR).clone(),
            title,
            row.get(RATING_GIVEN).as_float().into(),
            QaStatus::Excluded,
            &reason,
            None,
        );
    }
    Ok(out)
}

/// The assessors flagged in the community advisors sheet.
fn cas(table: &Table, workbook: &WorkbookTables, _policy: &Policy) -> FundResult<Table> {
    let sheet = workbook.sheet(COMMUNITY_ADVISORS_SHEET)?;
    sheet.require_columns(&["assessor", EXCLUDED_FLAG])?;
    let excluded = sheet
        .iter_rows()
        .filter(|r| r.get(EXCLUDED_FLAG).is_marked())
        .filter_map(|r| r.get("assessor").as_text())
        .map(|ca| (ca, QaStatus::Excluded.as_str().to_string()))
        .collect();
    ca_summary(table, CaExclusion::Explicit(excluded))
}

/// Only the links of the veterans are known.
fn vcas(workbook: &WorkbookTables) -> FundResult<Table> {
    let sheet = workbook.sheet(VETERANS_SHEET)?;
    let mut t = pick(sheet, &[("link", veterans::URL)])?;
    t.fill_column(veterans::NAME, Cell::Empty);
    t.fill_column(veterans::NUMBER_REVIEWS, Cell::Empty);
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> WorkbookTables {
        let mut valid = Table::new(VALID_SHEET, &[PROPOSAL_ID, IDEA_TITLE, ASSESSOR, RATING_GIVEN]);
        valid.push_row(vec![Cell::Int(11), "p1".into(), "ca1".into(), Cell::Int(5)]);
        valid.push_row(vec![Cell::Int(12), "p2".into(), "ca2".into(), Cell::Int(3)]);
        let mut excluded = Table::new(EXCLUDED_SHEET, &[PROPOSAL_ID, ASSESSOR, RATING_GIVEN, "reason"]);
        excluded.push_row(vec![Cell::Int(12), "ca1".into(), Cell::Int(1), "Copy".into()]);
        excluded.push_row(vec![Cell::Int(99), "ca2".into(), Cell::Int(2), "Copy".into()]);
        let mut cas = Table::new(COMMUNITY_ADVISORS_SHEET, &["assessor", "excluded"]);
        cas.push_row(vec!["ca1".into(), Cell::Bool(false)]);
        cas.push_row(vec!["ca2".into(), Cell::Bool(true)]);
        let mut vcas = Table::new(VETERANS_SHEET, &["link"]);
        vcas.push_row(vec!["https://example.org/vca".into()]);
        WorkbookTables::from_sheets(vec![valid, excluded, cas, vcas])
    }

    #[test]
    fn excluded_titles_come_from_valid_assessments() {
        let mut warnings = vec![];
        let t = assessments(&workbook(), &Policy::DEFAULT, &mut warnings).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(2, "PROPOSAL_TITLE"), Some(&Cell::text("p2")));
        assert_eq!(t.get(3, "PROPOSAL_TITLE"), Some(&Cell::Empty));
        assert_eq!(
            warnings,
            vec![PipelineWarning::UnmatchedProposal {
                sheet: EXCLUDED_SHEET.to_string(),
                proposal_id: "99".to_string(),
            }]
        );
    }

    #[test]
    fn community_advisors_flag() {
        let wb = workbook();
        let t = assessments(&wb, &Policy::DEFAULT, &mut vec![]).unwrap();
        let s = cas(&t, &wb, &Policy::DEFAULT).unwrap();
        assert_eq!(s.get(0, "STATUS"), Some(&Cell::text("Included")));
        assert_eq!(s.get(1, "STATUS"), Some(&Cell::text("Excluded")));
    }

    #[test]
    fn veteran_links() {
        let t = vcas(&workbook()).unwrap();
        assert_eq!(t.get(0, "URL"), Some(&Cell::text("https://example.org/vca")));
        assert_eq!(t.get(0, "NAME"), Some(&Cell::Empty));
    }
}

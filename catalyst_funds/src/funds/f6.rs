//! Fund 6: the first fund with the "vCA Aggregated" layout.

use crate::config::Policy;
use crate::errors::*;
use crate::registry::*;
use crate::table::Table;
use crate::workbook::WorkbookTables;

use super::{
    aggregated_assessments, heuristic_cas, overall_score_schema, veterans_sheet, AggregatedLayout,
};

const NAME_ALIASES: [(&str, &str); 9] = [
    ("Metadata", "Metadata challenge"),
    ("Scale-UP Cardano’s DeFi Ecosyst", "Scale-UP Cardano's DeFi Ecosystem"),
    ("DeFi and Microlending for Afric", "DeFi and Microlending for Africa"),
    ("Partnerships for Global Adoptio", "Partnerships for Global Adoption"),
    ("Atala PRISM DID Mass-Scale Adop", "Atala PRISM DID Mass-Scale Adoption"),
    ("Disaster When all is at stake", "Disaster: When all is at stake"),
    ("Scale-UP Cardano’s Community Hu", "Scale-UP Cardano’s Community Hubs"),
    ("Fund7 challenge setting", "Fund7 Challenge Setting"),
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
            cas: Some(heuristic_cas),
            vcas: Some(vcas),
        },
    }
}

/// Two footer rows and a fund size column.
fn validation_setup(mut t: Table) -> FundResult<Table> {
    t.truncate_tail(2);
    t.drop_columns(&["Fund size:"])?;
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
    policy: &Policy,
    warnings: &mut Vec<PipelineWarning>,
) -> FundResult<Table> {
    let layout = AggregatedLayout {
        drop_withdrawn: true,
        minimum_characters: false,
    };
    aggregated_assessments(workbook, policy, warnings, layout)
}

fn vcas(workbook: &WorkbookTables) -> FundResult<Table> {
    veterans_sheet(workbook, "name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funds::test_sheets::*;
    use crate::table::Cell;

    #[test]
    fn validation_layout() {
        let mut raw = Table::new("Validation", &["Challenge", "Budget", "Fund size:"]);
        raw.push_row(vec!["Metadata challenge".into(), Cell::Int(250000), Cell::Int(1)]);
        raw.push_row(vec![Cell::Empty, Cell::Empty, Cell::Empty]);
        raw.push_row(vec!["Total".into(), Cell::Int(250000)]);
        let t = validation_setup(raw).unwrap();
        assert_eq!(t.columns(), &["Challenge", "Budget"]);
        assert_eq!(t.len(), 1);
        assert!(validation_setup(Table::new("Validation", &["a", "b"])).is_err());
    }

    #[test]
    fn withdrawn_proposals_are_dropped() {
        let wb = WorkbookTables::from_sheets(vec![
            aggregated(vec![
                aggregated_row("p1", "ca1", "Good", 10),
                aggregated_row("WITHDRAW", "ca1", "Good", 10),
            ]),
            excluded(&[("WITHDRAW", "ca2", true)]),
        ]);
        let t = assessments(&wb, &Policy::DEFAULT, &mut vec![]).unwrap();
        assert_eq!(t.len(), 1);
        // No length rule for this fund.
        assert_eq!(t.get(0, "QA_STATUS"), Some(&Cell::text("Valid")));
        assert_eq!(t.get(0, "QA_CLASS"), Some(&Cell::text("Good")));
    }

    #[test]
    fn veteran_sheet_layout() {
        let wb = WorkbookTables::from_sheets(vec![veterans("name")]);
        assert_eq!(vcas(&wb).unwrap().len(), 2);
    }
}

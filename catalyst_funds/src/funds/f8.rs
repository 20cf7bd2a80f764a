//! Fund 8.

use crate::config::Policy;
use crate::errors::*;
use crate::registry::*;
use crate::table::Table;
use crate::workbook::WorkbookTables;

use super::{
    aggregated_assessments, heuristic_cas, overall_score_schema, veterans_sheet, AggregatedLayout,
};

const NAME_ALIASES: [(&str, &str); 8] = [
    ("Accelerate Decentralized Identi", "Accelerate Decentralized Identity"),
    ("Film + Media (FAM) creatives un", "Film + Media (FAM) creatives unite!"),
    ("Lobbying for favorable legislat", "Lobbying for favorable legislation"),
    ("Open Source Development Ecosyst", "Open Source Development Ecosystem"),
    ("Open Standards & Interoperabili", "Open Standards & Interoperability"),
    ("Scale-UP Cardanos Community Hub", "Scale-UP Cardano's Community Hubs"),
    ("The Great Migration (from Ether", "The Great Migration (from Ethereum)"),
    ("Funded by leftovers", "Sum of the leftovers"),
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

fn validation_setup(mut t: Table) -> FundResult<Table> {
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
        drop_withdrawn: false,
        minimum_characters: true,
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
    fn validation_drops_fund_size() {
        let mut raw = Table::new("Validation", &["Challenge", "Fund size:", "Budget"]);
        raw.push_row(vec!["Open Source Development Ecosystem".into(), Cell::Empty, "$1,000,000".into()]);
        let t = validation_setup(raw).unwrap();
        assert_eq!(t.columns(), &["Challenge", "Budget"]);
    }

    #[test]
    fn blank_assessments_are_excluded() {
        let wb = WorkbookTables::from_sheets(vec![
            aggregated(vec![aggregated_row("p1", "ca1", "Good", 400)]),
            excluded(&[("p1", "ca2", true), ("p1", "ca3", false)]),
        ]);
        let t = assessments(&wb, &Policy::DEFAULT, &mut vec![]).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(1, "CA"), Some(&Cell::text("ca2")));
        assert_eq!(t.get(1, "REASON"), Some(&Cell::text("Blank")));
    }

    #[test]
    fn veteran_sheet_layout() {
        let wb = WorkbookTables::from_sheets(vec![veterans("name")]);
        let t = vcas(&wb).unwrap();
        assert_eq!(t.get(0, "NAME"), Some(&Cell::text("vca1")));
    }
}

//! Fund 7.
//!
//! Same layout as fund 6. Assessments with too short justifications are excluded, and
//! one challenge is missing from the validation sheet.

use crate::config::Policy;
use crate::errors::*;
use crate::registry::*;
use crate::table::Table;
use crate::workbook::WorkbookTables;

use super::{
    aggregated_assessments, heuristic_cas, overall_score_schema, veterans_sheet, AggregatedLayout,
};

const NAME_ALIASES: [(&str, &str); 15] = [
    ("A.I. & SingularityNet a $5T mar", "A.I. & SingularityNet a $5T market"),
    ("Boosting Cardanos DeFi", "Boosting Cardano's DeFi"),
    ("Catalyst - Rapid Funding Mechan", "Catalyst - Rapid Funding Mechanisms"),
    ("Catalyst Natives COTI Pay with ", "Catalyst Natives COTI: Pay with ADA Plug-in"),
    ("Connecting Japan日本 Community", "Connecting Japan/日本 Community"),
    ("DAOs ❤ Cardano", "DAOs <3 Cardano"),
    ("Disarm cyber disinformation att", "Disarm cyber disinformation attacks"),
    ("Global Sustainable Indep. SPOs", "Global Sustainable Indep. SPO's"),
    ("Grow Latin America, Grow Cardan", "Grow Latin America, Grow Cardano"),
    ("Lobbying for favorable legislat", "Lobbying for favorable legislation"),
    ("MiniLow-Budget Dapps & Integrat", "Mini/Low-Budget Dapps &Integrations"),
    ("Scale-UP Cardanos Community Hub", "Scale-UP Cardano's Community Hubs"),
    ("Seeding Cardanos Grassroots DeF", "Seeding Cardano's Grassroots DeFi"),
    ("Fund8 challenge setting", "Fund8 Challenge Setting"),
    ("Sponsored by leftovers", "Sum of the leftovers"),
];

const EXPLICIT_BUDGETS: [(&str, i64); 1] = [("Accelerate Decentralized Identi", 425000)];

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
    t.drop_columns(&["Fund size:", "Unnamed: 3"])?;
    Ok(t)
}

fn budget() -> BudgetPolicy {
    BudgetPolicy {
        name_aliases: &NAME_ALIASES,
        explicit_budgets: &EXPLICIT_BUDGETS,
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
    veterans_sheet(workbook, "Name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funds::test_sheets::*;
    use crate::table::Cell;
    use crate::voting::resolve_budget;

    #[test]
    fn explicit_budget_without_validation_entry() {
        let mut validation = Table::new("Validation", &["challenge", "budget"]);
        validation.push_row(vec!["Sum of the leftovers".into(), Cell::Int(12)]);
        let policy = budget();
        assert_eq!(
            resolve_budget("Accelerate Decentralized Identi", Some(&validation), &policy),
            Some(425000)
        );
        assert_eq!(
            resolve_budget("Sponsored by leftovers", Some(&validation), &policy),
            Some(12)
        );
    }

    #[test]
    fn short_justifications_are_excluded() {
        let wb = WorkbookTables::from_sheets(vec![
            aggregated(vec![
                aggregated_row("p1", "ca1", "Excellent", 120),
                aggregated_row("p2", "ca1", "Excellent", 150),
            ]),
            excluded(&[]),
        ]);
        let t = assessments(&wb, &Policy::DEFAULT, &mut vec![]).unwrap();
        assert_eq!(t.get(0, "QA_STATUS"), Some(&Cell::text("Excluded")));
        assert_eq!(t.get(0, "REASON"), Some(&Cell::text("<150 char")));
        assert_eq!(t.get(1, "QA_STATUS"), Some(&Cell::text("Valid")));

        let lenient = Policy {
            minimum_characters: 100,
            ..Policy::DEFAULT
        };
        let t = assessments(&wb, &lenient, &mut vec![]).unwrap();
        assert_eq!(t.get(0, "QA_STATUS"), Some(&Cell::text("Valid")));
    }

    #[test]
    fn notes_are_required() {
        let mut sheet = aggregated(vec![aggregated_row("p1", "ca1", "Excellent", 300)]);
        sheet
            .drop_columns(&crate::schema::assessments::JUSTIFICATION_COLUMNS)
            .unwrap();
        let wb = WorkbookTables::from_sheets(vec![sheet, excluded(&[])]);
        let err = assessments(&wb, &Policy::DEFAULT, &mut vec![]).unwrap_err();
        assert!(matches!(err, FundError::MissingColumn { .. }));
    }

    #[test]
    fn veteran_sheet_layout() {
        let wb = WorkbookTables::from_sheets(vec![veterans("Name")]);
        assert_eq!(vcas(&wb).unwrap().len(), 2);
    }
}

/*!
Normalization of the Catalyst fund spreadsheets.

Every fund of the grant program published its voting results and the quality
assessments of its community advisors in spreadsheets that change layout from one
fund to the next. This crate turns the sheets of these workbooks into a small set of
canonical tables:

- the voting results, one row per proposal (see [`schema::results`])
- the validation table, the budget of each challenge (see [`schema::validation`])
- the assessments, one row per (advisor, proposal) pair (see [`schema::assessments`])
- the community advisor summary, one row per advisor (see [`schema::advisors`])
- the veteran community advisors (see [`schema::veterans`])

The crate does not read files: the sheets are given as [`Table`]s grouped in a
[`WorkbookTables`]. What differs between funds is handled by the adapters of the
[`AdapterRegistry`]; see the [manual] for adding a fund.

```
use catalyst_funds::*;

let mut sheet = Table::new("Developer Ecosystem", &["Proposal", "SCORE", "YES", "NO", "STATUS", "REQUESTED $"]);
sheet.push_row(vec!["p1".into(), Cell::Float(3.5), Cell::Int(100), Cell::Int(100), "FUNDED".into(), Cell::Int(10000)]);
let mut validation = Table::new("Validation", &["Challenge", "Budget"]);
validation.push_row(vec!["Developer ecosystem (Developer Ecosystem)".into(), Cell::Int(250000)]);
validation.push_row(vec!["Total".into(), Cell::Int(250000)]);
let workbook = WorkbookTables::from_sheets(vec![validation, sheet]);

let res = run_voting_results("f3", workbook, &AdapterRegistry::builtin(), &Policy::DEFAULT).unwrap();
assert_eq!(res.results().get(0, "STATUS"), Some(&Cell::text("NOT APPROVED")));
assert_eq!(res.results().get(0, "Budget"), Some(&Cell::Int(250000)));
```
 */

pub mod analysis;
mod assessments;
mod config;
mod errors;
mod funds;
pub mod manual;
mod registry;
pub mod schema;
mod table;
mod voting;
mod workbook;

pub use crate::assessments::{
    ca_summary, ensure_columns, justification_length, mean_rating, qa_class, run_assessments,
    Assessments, CaExclusion, QA_CLASS_MARKERS,
};
pub use crate::config::*;
pub use crate::errors::{FundError, FundResult, PipelineWarning};
pub use crate::funds::parenthesized_name;
pub use crate::registry::*;
pub use crate::table::{Cell, CellKind, RowRef, Table};
pub use crate::voting::{
    concat_results, not_approved_by_margin, process_challenge, resolve_budget, run_voting_results,
    setup_budgets, setup_validation, VotingResults,
};
pub use crate::workbook::WorkbookTables;

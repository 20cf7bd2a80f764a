use std::io::Write;

use crate::report::*;

pub fn dataset_key(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::VotingResults => "votingResults",
        Dataset::Assessments => "assessments",
    }
}

fn cell_js(cell: &Cell) -> JSValue {
    match cell {
        Cell::Empty => JSValue::Null,
        Cell::Int(i) => json!(i),
        // NaN and infinities become null.
        Cell::Float(f) => json!(f),
        Cell::Str(s) => json!(s),
        Cell::Bool(b) => json!(b),
    }
}

/// A table as `{"name": .., "columns": [..], "rows": [[..]]}`, which keeps the column order.
pub fn table_js(table: &Table) -> JSValue {
    let rows: Vec<JSValue> = table
        .rows()
        .iter()
        .map(|r| JSValue::Array(r.iter().map(cell_js).collect()))
        .collect();
    json!({
        "name": table.label(),
        "columns": table.columns(),
        "rows": rows,
    })
}

fn optional_table_js(table: Option<&Table>) -> JSValue {
    table.map(table_js).unwrap_or(JSValue::Null)
}

fn warnings_js(warnings: &[PipelineWarning]) -> JSValue {
    json!(warnings.iter().map(|w| w.to_string()).collect::<Vec<String>>())
}

pub fn voting_results_js(res: &VotingResults) -> JSValue {
    let budgets: Vec<JSValue> = res
        .budgets()
        .into_iter()
        .map(|(challenge, budget)| json!({ "challenge": challenge, "budget": budget }))
        .collect();

    let results = res.results();
    let stats_columns: Vec<&str> = schema::results::STATS_COLUMNS
        .iter()
        .copied()
        .filter(|c| results.has_column(c))
        .collect();
    let statistics = match analysis::statistics_by_status(results, &stats_columns) {
        Ok(t) => table_js(&t),
        Err(e) => {
            debug!("voting_results_js: no statistics: {}", e);
            JSValue::Null
        }
    };
    let remaining_budget = match analysis::remaining_budget(results, None) {
        Ok(t) => table_js(&t),
        Err(e) => {
            debug!("voting_results_js: no remaining budget: {}", e);
            JSValue::Null
        }
    };

    json!({
        "results": table_js(results),
        "validation": optional_table_js(res.validation()),
        "withdrawals": optional_table_js(res.withdrawals()),
        "budgets": budgets,
        "warnings": warnings_js(res.warnings()),
        "analysis": {
            "statistics": statistics,
            "remainingBudget": remaining_budget,
        },
    })
}

pub fn assessments_js(res: &Assessments) -> FundResult<JSValue> {
    let table = res.assessments();
    Ok(json!({
        "assessments": table_js(table),
        "advisors": table_js(res.advisors()),
        "veterans": optional_table_js(res.veterans()),
        "warnings": warnings_js(res.warnings()),
        "analysis": {
            "qaStatusCounts": table_js(&analysis::ca_counts(table, schema::assessments::QA_STATUS)?),
            "reasonCounts": table_js(&analysis::ca_counts(table, schema::assessments::REASON)?),
            "qaClassCounts": table_js(&analysis::ca_counts(table, schema::assessments::QA_CLASS)?),
            "ratings": table_js(&analysis::rating_statistics_by_proposal(table)?),
        },
    }))
}

/// Writes to the standard output when `out` is empty or `stdout`.
pub fn write_output(out: Option<&str>, content: &str) -> ReportResult<()> {
    match out {
        None | Some("stdout") | Some("") => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content).context(WritingOutputSnafu { path: "stdout" })
        }
        Some(path) => {
            info!("write_output: writing to {:?}", path);
            fs::write(path, content).context(WritingOutputSnafu { path })
        }
    }
}

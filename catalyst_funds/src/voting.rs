//! The voting results pipeline.
//!
//! The stages run in order, once per fund:
//! validation setup, budget setup, challenge processing and concatenation.
//! A missing adapter stops the pipeline. A missing budget or missing vote columns
//! only degrade the output: they are recorded as warnings.

use log::{debug, info};
use snafu::prelude::*;

use crate::config::{Policy, ProposalStatus};
use crate::errors::*;
use crate::registry::{AdapterRegistry, BudgetPolicy, ChallengeSchema, Operation, ValidationAdapter};
use crate::schema::{results, validation};
use crate::table::{Cell, CellKind, Table};
use crate::workbook::WorkbookTables;

/// The canonical voting results of one fund.
#[derive(PartialEq, Debug, Clone)]
pub struct VotingResults {
    fund: String,
    validation: Option<Table>,
    withdrawals: Option<Table>,
    challenges: Vec<Table>,
    results: Table,
    warnings: Vec<PipelineWarning>,
}

impl VotingResults {
    pub fn fund(&self) -> &str {
        &self.fund
    }

    /// The normalized validation table, if the workbook had one.
    pub fn validation(&self) -> Option<&Table> {
        self.validation.as_ref()
    }

    pub fn withdrawals(&self) -> Option<&Table> {
        self.withdrawals.as_ref()
    }

    /// The challenge names, in workbook order.
    pub fn challenges(&self) -> Vec<String> {
        self.challenges.iter().map(|t| t.label().to_string()).collect()
    }

    /// The processed table of one challenge, with all its columns.
    pub fn challenge(&self, name: &str) -> Option<&Table> {
        self.challenges.iter().find(|t| t.label() == name)
    }

    /// The budget assigned to each challenge. None when it could not be resolved.
    pub fn budgets(&self) -> Vec<(String, Option<i64>)> {
        self.challenges
            .iter()
            .map(|t| {
                let budget = t.get(0, results::BUDGET).and_then(|c| c.as_int());
                (t.label().to_string(), budget)
            })
            .collect()
    }

    /// The canonical results table.
    pub fn results(&self) -> &Table {
        &self.results
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }
}

/// Runs the voting results pipeline of a fund over its workbook.
pub fn run_voting_results(
    fund: &str,
    workbook: WorkbookTables,
    registry: &AdapterRegistry,
    policy: &Policy,
) -> FundResult<VotingResults> {
    info!("run_voting_results: {}: {} challenges", fund, workbook.tables.len());
    // Adapters are looked up in stage order.
    let validation_adapter = match workbook.validation {
        Some(_) => Some(registry.validation_setup(fund)?),
        None => None,
    };
    let budget_policy = (registry.budget(fund)?)();
    let schema = (registry.process(fund)?)();

    let validation = match (workbook.validation, validation_adapter) {
        (Some(raw), Some(adapter)) => Some(setup_validation(fund, raw, adapter)?),
        _ => {
            info!("run_voting_results: {}: no validation table", fund);
            None
        }
    };

    let mut warnings: Vec<PipelineWarning> = Vec::new();
    let mut challenges = workbook.tables;
    setup_budgets(
        fund,
        &mut challenges,
        validation.as_ref(),
        &budget_policy,
        &mut warnings,
    );
    for table in challenges.iter_mut() {
        process_challenge(fund, table, &schema, policy, &mut warnings)?;
    }
    let results = concat_results(fund, &challenges);
    info!(
        "run_voting_results: {}: {} proposals, {} warnings",
        fund,
        results.len(),
        warnings.len()
    );

    Ok(VotingResults {
        fund: fund.to_string(),
        validation,
        withdrawals: workbook.withdrawals,
        challenges,
        results,
        warnings,
    })
}

// ********* Validation setup **********

/// Runs the fund's validation adapter and enforces the canonical shape:
/// two columns (challenge, budget), no blank challenge and integer budgets.
pub fn setup_validation(fund: &str, raw: Table, adapter: ValidationAdapter) -> FundResult<Table> {
    let mut table = adapter(raw)?;
    ensure!(
        table.set_column_names(&validation::COLUMNS),
        SchemaMismatchSnafu {
            adapter: Operation::ValidationSetup.function_name(fund),
            expected: validation::COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            found: table.columns().to_vec(),
        }
    );
    table.retain_rows(|r| !r.get(validation::CHALLENGE).is_blank());
    table.map_column(validation::CHALLENGE, 0..table.len(), |c| match c.as_text() {
        Some(s) => Cell::Str(s),
        None => Cell::Empty,
    })?;
    table.coerce_column(validation::BUDGET, CellKind::Int, false)?;
    debug!("setup_validation: {}: {} challenges", fund, table.len());
    Ok(table)
}

// ********* Budget setup **********

/// The budget of a challenge: the explicit budget of the fund if there is one, otherwise
/// the budget of the only validation entry with the (aliased) challenge name.
pub fn resolve_budget(
    challenge: &str,
    validation: Option<&Table>,
    policy: &BudgetPolicy,
) -> Option<i64> {
    if let Some(b) = policy.explicit_budget(challenge) {
        return Some(b);
    }
    let name = policy.validation_name(challenge);
    let table = validation?;
    let mut matches = table
        .iter_rows()
        .filter(|r| r.get(validation::CHALLENGE).as_str() == Some(name));
    let first = matches.next()?;
    if matches.next().is_some() {
        debug!("resolve_budget: several validation entries for {:?}", name);
        return None;
    }
    first.get(validation::BUDGET).as_int()
}

/// Stamps every challenge table with its name and its budget.
/// Challenges without a budget are kept, with a warning.
pub fn setup_budgets(
    fund: &str,
    tables: &mut [Table],
    validation: Option<&Table>,
    policy: &BudgetPolicy,
    warnings: &mut Vec<PipelineWarning>,
) {
    for table in tables.iter_mut() {
        let challenge = table.label().to_string();
        let budget = resolve_budget(&challenge, validation, policy);
        if budget.is_none() {
            record_warning(
                warnings,
                PipelineWarning::BudgetUnresolved {
                    fund: fund.to_string(),
                    challenge: challenge.clone(),
                },
            );
        }
        table.fill_column(results::CHALLENGE, Cell::Str(challenge));
        table.fill_column(results::BUDGET, budget.into());
    }
}

// ********* Challenge processing **********

/// True when the margin of YES votes over NO votes is too small for the proposal
/// to be approved.
pub fn not_approved_by_margin(yes: i64, no: i64, approval_ratio: f64) -> bool {
    (yes as f64) < approval_ratio * (no as f64)
}

/// Renames, converts and derives the columns of one challenge table.
pub fn process_challenge(
    fund: &str,
    table: &mut Table,
    schema: &ChallengeSchema,
    policy: &Policy,
    warnings: &mut Vec<PipelineWarning>,
) -> FundResult<()> {
    table.rename_columns(schema.column_renames);
    for col in results::INTEGER_COLUMNS {
        if table.has_column(col) {
            table.coerce_column(col, CellKind::Int, true)?;
        }
    }
    if table.has_column(results::SCORE) {
        table.coerce_column(results::SCORE, CellKind::Float, true)?;
    }

    // Always derived.
    if table.has_column(results::REQUESTED_PCT) {
        table.drop_columns(&[results::REQUESTED_PCT])?;
    }
    if table.has_column(results::REQUESTED) {
        let pct: Vec<Cell> = table
            .iter_rows()
            .map(|r| {
                let requested = r.get(results::REQUESTED).as_int();
                let budget = r.get(results::BUDGET).as_int().filter(|b| *b != 0);
                match (requested, budget) {
                    (Some(req), Some(b)) => Cell::Float(100.0 * req as f64 / b as f64),
                    _ => Cell::Empty,
                }
            })
            .collect();
        table.set_column(results::REQUESTED_PCT, pct);
    }

    derive_status(fund, table, policy, warnings);
    Ok(())
}

fn derive_status(
    fund: &str,
    table: &mut Table,
    policy: &Policy,
    warnings: &mut Vec<PipelineWarning>,
) {
    let flags: Vec<bool> = if table.has_column(results::MEETS_APPROVAL_THRESHOLD) {
        table
            .iter_rows()
            .map(|r| {
                r.get(results::MEETS_APPROVAL_THRESHOLD)
                    .as_text()
                    .map(|s| s.trim() == "NO")
                    .unwrap_or(false)
            })
            .collect()
    } else if table.has_column(results::YES) && table.has_column(results::NO) {
        table
            .iter_rows()
            .map(|r| match (r.get(results::YES).as_int(), r.get(results::NO).as_int()) {
                (Some(yes), Some(no)) => not_approved_by_margin(yes, no, policy.approval_ratio),
                _ => false,
            })
            .collect()
    } else {
        record_warning(
            warnings,
            PipelineWarning::StatusUndetermined {
                fund: fund.to_string(),
                challenge: table.label().to_string(),
                kept: table.unique(results::STATUS),
            },
        );
        return;
    };

    let count = flags.iter().filter(|b| **b).count();
    debug!(
        "derive_status: {} {:?}: {} proposals not approved",
        fund,
        table.label(),
        count
    );
    if count == 0 {
        return;
    }
    for (row, flagged) in flags.into_iter().enumerate() {
        if flagged {
            table.set(row, results::STATUS, ProposalStatus::NotApproved.as_str().into());
        }
    }
}

// ********* Concatenation **********

/// The union of the challenge tables over the canonical columns that at least one
/// of them has, in canonical order.
pub fn concat_results(fund: &str, tables: &[Table]) -> Table {
    let columns: Vec<&str> = results::COLUMNS
        .iter()
        .copied()
        .filter(|c| tables.iter().any(|t| t.has_column(c)))
        .collect();
    debug!("concat_results: {}: columns {:?}", fund, columns);
    Table::concat(fund, tables, &columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funds::parenthesized_name;
    use crate::registry::{FundAdapters, VotingAdapters};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn raw_validation() -> Table {
        let mut t = Table::new("Validation", &["Challenges", "Budget"]);
        t.push_row(vec!["Challenge A (CA)".into(), Cell::Int(100000)]);
        t.push_row(vec!["Challenge B".into(), Cell::Int(50000)]);
        t.push_row(vec![Cell::Empty, Cell::Empty]);
        t
    }

    fn first_row_parenthesized(mut t: Table) -> FundResult<Table> {
        let col = t.columns()[0].clone();
        t.map_column(&col, 0..1, parenthesized_name)?;
        Ok(t)
    }

    fn keep_all(t: Table) -> FundResult<Table> {
        Ok(t)
    }

    fn challenge(name: &str, rows: &[(&str, i64, i64, &str, &str)]) -> Table {
        let mut t = Table::new(name, &["Proposal", "Overall score", "YES", "NO", "REQUESTED $", "STATUS"]);
        for (p, yes, no, req, status) in rows {
            t.push_row(vec![
                (*p).into(),
                Cell::Float(3.5),
                Cell::Int(*yes),
                Cell::Int(*no),
                (*req).into(),
                (*status).into(),
            ]);
        }
        t
    }

    fn budget_policy() -> BudgetPolicy {
        BudgetPolicy {
            name_aliases: &[("Sponsored by leftovers", "Challenge B")],
            explicit_budgets: &[("Explicit", 425000)],
        }
    }

    fn schema() -> ChallengeSchema {
        ChallengeSchema {
            column_renames: &[("Overall score", "SCORE")],
        }
    }

    fn registry() -> AdapterRegistry {
        let mut reg = AdapterRegistry::new();
        reg.register(
            "f9",
            FundAdapters {
                voting: VotingAdapters {
                    validation_setup: Some(first_row_parenthesized),
                    budget: Some(budget_policy),
                    process: Some(schema),
                },
                ..Default::default()
            },
        );
        reg
    }

    fn workbook() -> WorkbookTables {
        WorkbookTables::from_sheets(vec![
            raw_validation(),
            challenge(
                "CA",
                &[("p1", 100, 100, "$10,000", "NOT FUNDED"), ("p2", 120, 100, "$20,000", "FUNDED")],
            ),
            challenge("Sponsored by leftovers", &[("p3", 500, 10, "5000", "FUNDED")]),
            challenge("Unknown", &[("p4", 10, 0, "1000", "NOT FUNDED")]),
            Table::new("Template", &["x"]),
        ])
    }

    #[test]
    fn validation_extracts_parenthesized_names() {
        init();
        let t = setup_validation("f9", raw_validation(), first_row_parenthesized).unwrap();
        assert_eq!(t.columns(), &["challenge", "budget"]);
        assert_eq!(
            t.rows(),
            &[
                vec!["CA".into(), Cell::Int(100000)],
                vec!["Challenge B".into(), Cell::Int(50000)]
            ]
        );
    }

    #[test]
    fn validation_with_extra_columns_is_rejected() {
        let mut raw = raw_validation();
        raw.fill_column("Fund size:", Cell::Int(1));
        let err = setup_validation("f9", raw, keep_all).unwrap_err();
        match err {
            FundError::SchemaMismatch { adapter, found, .. } => {
                assert_eq!(adapter, "validation_setup_f9");
                assert_eq!(found.len(), 3);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn budget_resolution_order() {
        let validation = setup_validation("f9", raw_validation(), first_row_parenthesized).unwrap();
        let policy = budget_policy();
        assert_eq!(resolve_budget("CA", Some(&validation), &policy), Some(100000));
        assert_eq!(
            resolve_budget("Sponsored by leftovers", Some(&validation), &policy),
            Some(50000)
        );
        assert_eq!(resolve_budget("Explicit", None, &policy), Some(425000));
        assert_eq!(resolve_budget("Unknown", Some(&validation), &policy), None);
        assert_eq!(resolve_budget("CA", None, &policy), None);
    }

    #[test]
    fn margin_rule() {
        assert!(not_approved_by_margin(100, 100, 1.15));
        assert!(!not_approved_by_margin(120, 100, 1.15));
        assert!(!not_approved_by_margin(115, 100, 1.15));
        assert!(not_approved_by_margin(0, 1, 1.15));
    }

    #[test]
    fn full_pipeline() {
        init();
        let res = run_voting_results("f9", workbook(), &registry(), &Policy::DEFAULT).unwrap();
        assert_eq!(res.challenges(), vec!["CA", "Sponsored by leftovers", "Unknown"]);
        assert_eq!(
            res.budgets(),
            vec![
                ("CA".to_string(), Some(100000)),
                ("Sponsored by leftovers".to_string(), Some(50000)),
                ("Unknown".to_string(), None),
            ]
        );
        assert_eq!(
            res.warnings(),
            &[PipelineWarning::BudgetUnresolved {
                fund: "f9".to_string(),
                challenge: "Unknown".to_string()
            }]
        );

        let t = res.results();
        assert_eq!(
            t.columns(),
            &["challenge", "Budget", "Proposal", "SCORE", "YES", "NO", "STATUS", "REQUESTED $", "REQUESTED %"]
        );
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(0, "STATUS"), Some(&Cell::text("NOT APPROVED")));
        assert_eq!(t.get(1, "STATUS"), Some(&Cell::text("FUNDED")));
        assert_eq!(t.get(2, "STATUS"), Some(&Cell::text("FUNDED")));
        // 10 < 1.15 * 0 is false: kept as sourced.
        assert_eq!(t.get(3, "STATUS"), Some(&Cell::text("NOT FUNDED")));
        assert_eq!(t.get(1, "REQUESTED $"), Some(&Cell::Int(20000)));
        assert_eq!(t.get(1, "REQUESTED %"), Some(&Cell::Float(20.0)));
        assert_eq!(t.get(3, "REQUESTED %"), Some(&Cell::Empty));
        assert_eq!(t.get(0, "SCORE"), Some(&Cell::Float(3.5)));
    }

    #[test]
    fn requested_percentage_matches_budget() {
        let res = run_voting_results("f9", workbook(), &registry(), &Policy::DEFAULT).unwrap();
        for r in res.results().iter_rows() {
            if let (Some(req), Some(b)) = (r.get("REQUESTED $").as_int(), r.get("Budget").as_int()) {
                let pct = r.get("REQUESTED %").as_float().unwrap();
                assert!((pct - 100.0 * req as f64 / b as f64).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn challenge_set_is_preserved() {
        let res = run_voting_results("f9", workbook(), &registry(), &Policy::DEFAULT).unwrap();
        let mut found = res.results().unique("challenge");
        found.sort();
        assert_eq!(found, vec!["CA", "Sponsored by leftovers", "Unknown"]);
    }

    #[test]
    fn pipeline_is_deterministic() {
        let a = run_voting_results("f9", workbook(), &registry(), &Policy::DEFAULT).unwrap();
        let b = run_voting_results("f9", workbook(), &registry(), &Policy::DEFAULT).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn approval_threshold_column_wins() {
        let mut t = challenge("C", &[("p1", 100, 100, "1", "FUNDED"), ("p2", 0, 100, "1", "FUNDED")]);
        t.set_column(
            "Meets approval threshold",
            vec![" YES ".into(), "YES".into()],
        );
        let mut warnings = vec![];
        process_challenge("f9", &mut t, &schema(), &Policy::DEFAULT, &mut warnings).unwrap();
        assert_eq!(t.unique("STATUS"), vec!["FUNDED"]);
        t.set(1, "Meets approval threshold", "NO".into());
        process_challenge("f9", &mut t, &schema(), &Policy::DEFAULT, &mut warnings).unwrap();
        assert_eq!(t.get(1, "STATUS"), Some(&Cell::text("NOT APPROVED")));
        assert!(warnings.is_empty());
    }

    #[test]
    fn status_without_votes_is_kept() {
        let mut t = Table::new("C", &["Proposal", "STATUS"]);
        t.push_row(vec!["p1".into(), "FUNDED".into()]);
        let mut warnings = vec![];
        process_challenge("f9", &mut t, &schema(), &Policy::DEFAULT, &mut warnings).unwrap();
        assert_eq!(t.get(0, "STATUS"), Some(&Cell::text("FUNDED")));
        assert_eq!(
            warnings,
            vec![PipelineWarning::StatusUndetermined {
                fund: "f9".to_string(),
                challenge: "C".to_string(),
                kept: vec!["FUNDED".to_string()],
            }]
        );
    }

    #[test]
    fn missing_adapter_is_fatal() {
        let err = run_voting_results("f10", workbook(), &registry(), &Policy::DEFAULT).unwrap_err();
        assert!(matches!(
            err,
            FundError::AdapterNotFound {
                operation: Operation::ValidationSetup,
                ..
            }
        ));
    }

    #[test]
    fn missing_adapters_are_reported_in_stage_order() {
        let mut reg = AdapterRegistry::new();
        reg.register(
            "f9",
            FundAdapters {
                voting: VotingAdapters {
                    validation_setup: Some(first_row_parenthesized),
                    budget: None,
                    process: None,
                },
                ..Default::default()
            },
        );
        let err = run_voting_results("f9", workbook(), &reg, &Policy::DEFAULT).unwrap_err();
        assert!(matches!(
            err,
            FundError::AdapterNotFound {
                operation: Operation::BudgetSetup,
                ..
            }
        ));
    }
}

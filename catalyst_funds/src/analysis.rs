//! Derived tables for the reports: counts, retention, budget walks and statistics.
//!
//! They only read the canonical tables.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::config::ProposalStatus;
use crate::errors::*;
use crate::schema::{advisors, assessments, results};
use crate::table::{Cell, RowRef, Table};

/// The label used for the statistics over all the challenges.
pub const ALL_CHALLENGES: &str = "ALL CHALLENGES";
pub const RANKING: &str = "Ranking";
pub const REMAINING_BUDGET: &str = "Remaining Budget";

/// The usual descriptive statistics of a sample.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation. None with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub const SUMMARY_COLUMNS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

impl Summary {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.count as i64),
            Cell::Float(self.mean),
            self.std.into(),
            Cell::Float(self.min),
            Cell::Float(self.q25),
            Cell::Float(self.median),
            Cell::Float(self.q75),
            Cell::Float(self.max),
        ]
    }
}

// Linear interpolation between the closest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Summarizes a sample. None for an empty sample.
pub fn describe(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let var = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64;
        Some(var.sqrt())
    } else {
        None
    };
    Some(Summary {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// Statistics of numeric result columns by STATUS, over all the challenges and then for
/// each challenge.
///
/// `count%` is the share of the values of a column that fall under this STATUS, within
/// the same challenge group.
pub fn statistics_by_status(table: &Table, columns: &[&str]) -> FundResult<Table> {
    table.require_columns(&[results::CHALLENGE, results::STATUS])?;
    table.require_columns(columns)?;

    let mut header = vec![results::CHALLENGE, results::STATUS, "feature", "count%"];
    header.extend(SUMMARY_COLUMNS);
    let mut out = Table::new("statistics", &header);

    let mut groups: Vec<(String, Option<String>)> = vec![(ALL_CHALLENGES.to_string(), None)];
    groups.extend(
        table
            .unique(results::CHALLENGE)
            .into_iter()
            .map(|c| (c.clone(), Some(c))),
    );
    let statuses: BTreeSet<String> = table.unique(results::STATUS).into_iter().collect();

    for (label, challenge) in groups.iter() {
        let in_group = |r: &RowRef<'_>| match challenge {
            Some(c) => r.get(results::CHALLENGE).as_text().as_ref() == Some(c),
            None => true,
        };
        for col in columns {
            let total = table
                .iter_rows()
                .filter(|r| in_group(r) && !r.get(results::STATUS).is_blank())
                .filter(|r| r.get(col).as_float().is_some())
                .count();
            for status in statuses.iter() {
                let values: Vec<f64> = table
                    .iter_rows()
                    .filter(|r| in_group(r))
                    .filter(|r| r.get(results::STATUS).as_text().as_ref() == Some(status))
                    .filter_map(|r| r.get(col).as_float())
                    .collect();
                let summary = match describe(&values) {
                    Some(s) => s,
                    None => continue,
                };
                let mut row: Vec<Cell> = vec![
                    label.as_str().into(),
                    status.as_str().into(),
                    (*col).into(),
                    Cell::Float(summary.count as f64 / total as f64),
                ];
                row.extend(summary.cells());
                out.push_row(row);
            }
        }
    }
    debug!("statistics_by_status: {} rows", out.len());
    Ok(out)
}

/// Statistics of the ratings received by each proposal, sorted by title.
pub fn rating_statistics_by_proposal(table: &Table) -> FundResult<Table> {
    table.require_columns(&[assessments::PROPOSAL_TITLE, assessments::CA_RATING])?;
    let mut ratings: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in table.iter_rows() {
        if let Some(title) = r.get(assessments::PROPOSAL_TITLE).as_text() {
            let entry = ratings.entry(title).or_default();
            if let Some(v) = r.get(assessments::CA_RATING).as_float() {
                entry.push(v);
            }
        }
    }
    let mut header = vec![assessments::PROPOSAL_TITLE];
    header.extend(SUMMARY_COLUMNS);
    let mut out = Table::new("ratings", &header);
    for (title, values) in ratings {
        let mut row: Vec<Cell> = vec![title.into()];
        match describe(&values) {
            Some(s) => row.extend(s.cells()),
            None => row.push(Cell::Int(0)),
        }
        out.push_row(row);
    }
    Ok(out)
}

/// For each CA, the number of assessments for each value of a column
/// (QA_STATUS, REASON or QA_CLASS).
pub fn ca_counts(table: &Table, column: &str) -> FundResult<Table> {
    table.require_columns(&[assessments::CA, column])?;
    let counts = table.group_counts(assessments::CA, column);
    let values: BTreeSet<&String> = counts.values().flat_map(|m| m.keys()).collect();
    let mut header = vec![assessments::CA];
    header.extend(values.iter().map(|s| s.as_str()));
    let mut out = Table::new(column, &header);
    for (ca, by_value) in counts.iter() {
        let mut row: Vec<Cell> = vec![ca.as_str().into()];
        row.extend(
            values
                .iter()
                .map(|v| Cell::Int(by_value.get(*v).copied().unwrap_or(0) as i64)),
        );
        out.push_row(row);
    }
    Ok(out)
}

/// The CAs present in the summaries of two funds, side by side.
///
/// The columns of each summary are prefixed with the fund: `f5 STATUS`, `f6 STATUS`...
pub fn ca_retention(
    previous_fund: &str,
    previous: &Table,
    current_fund: &str,
    current: &Table,
) -> FundResult<Table> {
    previous.require_columns(&advisors::COLUMNS)?;
    current.require_columns(&advisors::COLUMNS)?;
    let index = |t: &Table| -> BTreeMap<String, usize> {
        t.iter_rows()
            .filter_map(|r| r.get(advisors::CA).as_text().map(|ca| (ca, r.index())))
            .collect()
    };
    let prev_idx = index(previous);
    let cur_idx = index(current);

    let stats = &advisors::COLUMNS[1..];
    let mut header: Vec<String> = vec![advisors::CA.to_string()];
    for fund in [previous_fund, current_fund] {
        header.extend(stats.iter().map(|c| format!("{} {}", fund, c)));
    }
    let header_refs: Vec<&str> = header.iter().map(|s| s.as_str()).collect();
    let mut out = Table::new("retention", &header_refs);
    for (ca, p) in prev_idx.iter() {
        let c = match cur_idx.get(ca) {
            Some(c) => *c,
            None => continue,
        };
        let mut row: Vec<Cell> = vec![ca.as_str().into()];
        row.extend(stats.iter().map(|col| previous.row(*p).get(col).clone()));
        row.extend(stats.iter().map(|col| current.row(c).get(col).clone()));
        out.push_row(row);
    }
    debug!(
        "ca_retention: {} -> {}: {} of {} CAs",
        previous_fund,
        current_fund,
        out.len(),
        prev_idx.len()
    );
    Ok(out)
}

/// Walks down the proposals by decreasing result, taking each FUNDED request out of
/// the budget. `Remaining Budget` is the budget left before the proposal of the row.
///
/// For one challenge the walk starts from its budget; over all the challenges
/// (`challenge` is None) it starts from the sum of the known budgets.
pub fn remaining_budget(table: &Table, challenge: Option<&str>) -> FundResult<Table> {
    table.require_columns(&[
        results::CHALLENGE,
        results::BUDGET,
        results::PROPOSAL,
        results::RESULT,
        results::STATUS,
        results::REQUESTED,
    ])?;
    let rows: Vec<usize> = table
        .iter_rows()
        .filter(|r| match challenge {
            Some(c) => r.get(results::CHALLENGE).as_str() == Some(c),
            None => true,
        })
        .map(|r| r.index())
        .collect();

    let start: i64 = match challenge {
        Some(_) => rows
            .iter()
            .filter_map(|i| table.row(*i).get(results::BUDGET).as_int())
            .max()
            .unwrap_or(0),
        None => {
            let budgets: BTreeMap<String, i64> = table
                .iter_rows()
                .filter_map(|r| {
                    Some((
                        r.get(results::CHALLENGE).as_text()?,
                        r.get(results::BUDGET).as_int()?,
                    ))
                })
                .collect();
            budgets.values().sum()
        }
    };

    let mut sorted = rows;
    // Stable: ties keep the sourced order. Missing results go last.
    sorted.sort_by_key(|i| {
        std::cmp::Reverse(table.row(*i).get(results::RESULT).as_int().unwrap_or(i64::MIN))
    });

    let columns = [
        RANKING,
        results::CHALLENGE,
        results::PROPOSAL,
        results::RESULT,
        results::STATUS,
        results::REQUESTED,
        REMAINING_BUDGET,
    ];
    let mut out = Table::new(challenge.unwrap_or(ALL_CHALLENGES), &columns);
    let mut remaining = start;
    for (rank, i) in sorted.into_iter().enumerate() {
        let r = table.row(i);
        out.push_row(vec![
            Cell::Int(rank as i64 + 1),
            r.get(results::CHALLENGE).clone(),
            r.get(results::PROPOSAL).clone(),
            r.get(results::RESULT).clone(),
            r.get(results::STATUS).clone(),
            r.get(results::REQUESTED).clone(),
            Cell::Int(remaining),
        ]);
        if r.get(results::STATUS).as_str() == Some(ProposalStatus::Funded.as_str()) {
            remaining -= r.get(results::REQUESTED).as_int().unwrap_or(0);
        }
    }
    Ok(out)
}

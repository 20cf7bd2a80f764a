use std::fmt::Display;

use log::warn;
use snafu::Snafu;

use crate::registry::Operation;
use crate::table::CellKind;

/// Errors that abort the processing of a fund.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FundError {
    #[snafu(display(
        "Error while loading {fund}: no adapter for {operation}. Please provide a proper `{function}` adapter in the adapter registry."
    ))]
    AdapterNotFound {
        fund: String,
        operation: Operation,
        function: String,
    },
    #[snafu(display(
        "Error while loading {adapter}: the output has columns {found:?}, expected exactly {expected:?}"
    ))]
    SchemaMismatch {
        adapter: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[snafu(display(
        "Undefined fund reference {fund:?}. Available funds: {available:?}. To add a new fund, register its file and its adapters."
    ))]
    UnknownFund { fund: String, available: Vec<String> },
    #[snafu(display("Sheet {sheet:?} not found. Available sheets: {available:?}"))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },
    #[snafu(display("Column {column:?} not found in table {table:?}"))]
    MissingColumn { table: String, column: String },
    #[snafu(display(
        "Cannot read {content} as {kind} (table {table:?}, column {column:?}, row {row})"
    ))]
    CellCoercion {
        table: String,
        column: String,
        row: usize,
        content: String,
        kind: CellKind,
    },
}

pub type FundResult<T> = Result<T, FundError>;

/// Conditions that degrade the output of a pipeline without stopping it.
///
/// They are logged when they occur and kept on the pipeline output.
#[derive(PartialEq, Debug, Clone)]
pub enum PipelineWarning {
    /// Neither an explicit budget nor a validation entry exists for this challenge.
    /// The budget is missing for all its rows.
    BudgetUnresolved { fund: String, challenge: String },
    /// The challenge has neither an approval threshold column nor YES/NO columns.
    /// The STATUS values found in the source are kept.
    StatusUndetermined {
        fund: String,
        challenge: String,
        kept: Vec<String>,
    },
    /// More than one quality-tier marker was set on a row.
    AmbiguousQaClass {
        sheet: String,
        row: usize,
        markers: Vec<String>,
        chosen: String,
    },
    /// An excluded assessment refers to a proposal that is not in the valid assessments.
    UnmatchedProposal { sheet: String, proposal_id: String },
}

impl Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::BudgetUnresolved { fund, challenge } => write!(
                f,
                "< {}-{} > Budget not found. Please, make sure a proper get_budget_{} adapter is provided.",
                fund, challenge, fund
            ),
            PipelineWarning::StatusUndetermined {
                fund,
                challenge,
                kept,
            } => write!(
                f,
                "{} Challenge {}: status NOT APPROVED cannot be derived. Kept original STATUS={:?}",
                fund, challenge, kept
            ),
            PipelineWarning::AmbiguousQaClass {
                sheet,
                row,
                markers,
                chosen,
            } => write!(
                f,
                "{} row {}: several classes marked {:?}, using {:?}",
                sheet, row, markers, chosen
            ),
            PipelineWarning::UnmatchedProposal { sheet, proposal_id } => write!(
                f,
                "{}: no proposal title found for proposal id {}",
                sheet, proposal_id
            ),
        }
    }
}

/// Logs a warning and keeps it with the pipeline output.
pub(crate) fn record_warning(warnings: &mut Vec<PipelineWarning>, warning: PipelineWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}

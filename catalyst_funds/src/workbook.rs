use log::{debug, info};
use snafu::prelude::*;

use crate::errors::*;
use crate::table::Table;

/// The sheets of a fund workbook, after the conventional tables have been pulled out.
///
/// - a sheet named "validation" (any case) becomes the validation table
/// - a sheet named "withdrawals" or "withdrawal" (any case) becomes the withdrawals table
/// - a sheet named "template" (any case) is dropped
///
/// All the other sheets are kept in workbook order. For voting results, each of them
/// is the table of one challenge.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct WorkbookTables {
    pub tables: Vec<Table>,
    pub validation: Option<Table>,
    pub withdrawals: Option<Table>,
}

fn take_sheet(sheets: &mut Vec<Table>, names: &[&str]) -> Option<Table> {
    let idx = sheets
        .iter()
        .position(|t| names.iter().any(|n| t.label().eq_ignore_ascii_case(n)))?;
    Some(sheets.remove(idx))
}

impl WorkbookTables {
    pub fn from_sheets(mut sheets: Vec<Table>) -> WorkbookTables {
        let validation = take_sheet(&mut sheets, &["validation"]);
        let withdrawals = take_sheet(&mut sheets, &["withdrawals", "withdrawal"]);
        while let Some(t) = take_sheet(&mut sheets, &["template"]) {
            debug!("from_sheets: dropping sheet {:?}", t.label());
        }
        info!(
            "from_sheets: {} tables, validation: {}, withdrawals: {}",
            sheets.len(),
            validation.is_some(),
            withdrawals.is_some()
        );
        WorkbookTables {
            tables: sheets,
            validation,
            withdrawals,
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.label().to_string()).collect()
    }

    /// Finds a sheet by its exact name.
    pub fn sheet(&self, name: &str) -> FundResult<&Table> {
        self.tables
            .iter()
            .find(|t| t.label() == name)
            .context(MissingSheetSnafu {
                sheet: name,
                available: self.sheet_names(),
            })
    }

    /// The sheets whose name starts with the given prefix.
    pub fn sheets_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Table> + 'a {
        self.tables
            .iter()
            .filter(move |t| t.label().starts_with(prefix))
    }
}

// ********* Tabular data ***********

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::ops::Range;

use log::debug;
use snafu::prelude::*;

use crate::errors::*;

/// A single cell of a sheet.
///
/// `Empty` is the missing marker: blank spreadsheet cells, budgets that could not be
/// resolved and ratings that cannot be derived are all represented this way.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

static EMPTY_CELL: Cell = Cell::Empty;

/// The conversions applied to the typed canonical columns.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CellKind {
    Int,
    Float,
}

impl Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellKind::Int => write!(f, "integer"),
            CellKind::Float => write!(f, "float"),
        }
    }
}

impl Cell {
    pub fn text(s: &str) -> Cell {
        Cell::Str(s.to_string())
    }

    /// True for empty cells and for strings that only contain whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Str(s) => s.trim().is_empty(),
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The textual form of the cell, or None if the cell is blank.
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Cell::Str(s) => Some(s.clone()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Empty => None,
        }
    }

    /// Reads the cell as a float. Strings may carry currency symbols and
    /// thousands separators ("₳1,250,000").
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Str(s) => parse_amount(s),
            _ => None,
        }
    }

    /// Reads the cell as an integer, truncating floats.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            _ => self.as_float().map(|f| f.trunc() as i64),
        }
    }

    /// Marker cells flag a row with a single character ("x" or "X") or a boolean.
    pub fn is_marked(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Str(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("x") || s.eq_ignore_ascii_case("true")
            }
            _ => false,
        }
    }

    fn coerce(&self, kind: CellKind) -> Option<Cell> {
        match kind {
            CellKind::Int => self.as_int().map(Cell::Int),
            CellKind::Float => self.as_float().map(Cell::Float),
        }
    }
}

fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '₳' | '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl From<&str> for Cell {
    fn from(s: &str) -> Cell {
        Cell::Str(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Cell {
        Cell::Str(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Cell {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Cell {
        Cell::Float(f)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(o: Option<T>) -> Cell {
        o.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// A named table: the header of a sheet and its rows.
///
/// The label is the sheet name for raw tables, and is used in error messages.
/// Invariant: every row has exactly as many cells as there are columns.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    label: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// A borrowed view of one row, with access by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The cell under the given column, or an empty cell if the column does not exist.
    pub fn get(&self, column: &str) -> &'a Cell {
        self.table
            .column_index(column)
            .and_then(|idx| self.table.rows[self.index].get(idx))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn cells(&self) -> &'a [Cell] {
        &self.table.rows[self.index]
    }
}

impl Table {
    pub fn new(label: &str, columns: &[&str]) -> Table {
        Table {
            label: label.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from the first row of a sheet and the rows below it.
    ///
    /// Header cells that are blank are named `Unnamed: <idx>` and repeated names get a
    /// `.<n>` suffix, which is how the funds' historical exports refer to these columns.
    /// Rows are padded with empty cells (or truncated) to the width of the header.
    pub fn from_grid(label: &str, header: &[Cell], rows: Vec<Vec<Cell>>) -> Table {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut columns: Vec<String> = Vec::new();
        for (idx, cell) in header.iter().enumerate() {
            let base = cell
                .as_text()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| format!("Unnamed: {}", idx));
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            columns.push(name);
        }
        let mut table = Table {
            label: label.to_string(),
            columns,
            rows: Vec::new(),
        };
        for row in rows {
            table.push_row(row);
        }
        debug!(
            "from_grid: {:?}: {} columns, {} rows",
            label,
            table.columns.len(),
            table.rows.len()
        );
        table
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> RowRef<'_> {
        RowRef { table: self, index }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).map(move |index| RowRef { table: self, index })
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require(&self, name: &str) -> FundResult<usize> {
        self.column_index(name).context(MissingColumnSnafu {
            table: self.label.clone(),
            column: name,
        })
    }

    /// Fails on the first of the given columns that the table does not have.
    pub fn require_columns(&self, names: &[&str]) -> FundResult<()> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Sets a single cell, adding the column (filled with empty cells) if needed.
    pub fn set(&mut self, row: usize, column: &str, cell: Cell) {
        let idx = self.ensure_column(column);
        if let Some(r) = self.rows.get_mut(row) {
            r[idx] = cell;
        }
    }

    /// The cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> FundResult<Vec<&Cell>> {
        let idx = self.require(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for r in self.rows.iter_mut() {
                    r.push(Cell::Empty);
                }
                self.columns.len() - 1
            }
        }
    }

    /// Adds or replaces a column. Missing trailing values are empty.
    pub fn set_column(&mut self, name: &str, mut cells: Vec<Cell>) {
        let idx = self.ensure_column(name);
        cells.resize(self.rows.len(), Cell::Empty);
        for (r, c) in self.rows.iter_mut().zip(cells) {
            r[idx] = c;
        }
    }

    /// Adds or replaces a column holding the same value on every row.
    pub fn fill_column(&mut self, name: &str, cell: Cell) {
        let idx = self.ensure_column(name);
        for r in self.rows.iter_mut() {
            r[idx] = cell.clone();
        }
    }

    /// Renames the columns listed as (old name, new name). Unknown names are ignored.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for (old, new) in renames {
            if let Some(idx) = self.column_index(old) {
                debug!("rename_columns: {:?}: {:?} -> {:?}", self.label, old, new);
                self.columns[idx] = new.to_string();
            }
        }
    }

    /// Replaces all the column names at once. The number of names must match.
    pub fn set_column_names(&mut self, names: &[&str]) -> bool {
        if names.len() != self.columns.len() {
            return false;
        }
        self.columns = names.iter().map(|s| s.to_string()).collect();
        true
    }

    pub fn drop_columns(&mut self, names: &[&str]) -> FundResult<()> {
        for name in names {
            let idx = self.require(name)?;
            self.columns.remove(idx);
            for r in self.rows.iter_mut() {
                r.remove(idx);
            }
        }
        Ok(())
    }

    /// A new table with only the given columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> FundResult<Table> {
        let idxs: Vec<usize> = columns
            .iter()
            .map(|c| self.require(c))
            .collect::<FundResult<Vec<usize>>>()?;
        Ok(Table {
            label: self.label.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idxs.iter().map(|i| r[*i].clone()).collect())
                .collect(),
        })
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(RowRef<'_>) -> bool,
    {
        let flags: Vec<bool> = self.iter_rows().map(&mut keep).collect();
        let mut flags = flags.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(false));
    }

    /// Drops the last `n` rows (footers, totals).
    pub fn truncate_tail(&mut self, n: usize) {
        let keep = self.rows.len().saturating_sub(n);
        self.rows.truncate(keep);
    }

    /// Applies `f` to the cells of a column for the given row range. The range is
    /// clamped to the table.
    pub fn map_column<F>(&mut self, column: &str, rows: Range<usize>, f: F) -> FundResult<()>
    where
        F: Fn(&Cell) -> Cell,
    {
        let idx = self.require(column)?;
        let end = rows.end.min(self.rows.len());
        for r in self.rows[rows.start.min(end)..end].iter_mut() {
            r[idx] = f(&r[idx]);
        }
        Ok(())
    }

    /// Converts a column in place.
    ///
    /// Empty cells are left empty when `allow_missing` is set. Any other cell that
    /// cannot be read as the requested kind is an error.
    pub fn coerce_column(&mut self, column: &str, kind: CellKind, allow_missing: bool) -> FundResult<()> {
        let idx = self.require(column)?;
        for (row, r) in self.rows.iter_mut().enumerate() {
            let cell = &r[idx];
            if cell.is_blank() && allow_missing {
                r[idx] = Cell::Empty;
                continue;
            }
            let converted = cell.coerce(kind).context(CellCoercionSnafu {
                table: self.label.clone(),
                column,
                row,
                content: format!("{:?}", cell),
                kind,
            })?;
            r[idx] = converted;
        }
        Ok(())
    }

    /// Concatenates tables row-wise over the given columns. Cells of columns that a
    /// table does not have are empty.
    pub fn concat(label: &str, tables: &[Table], columns: &[&str]) -> Table {
        let mut res = Table::new(label, columns);
        for t in tables {
            let idxs: Vec<Option<usize>> = columns.iter().map(|c| t.column_index(c)).collect();
            for r in t.rows.iter() {
                res.rows.push(
                    idxs.iter()
                        .map(|i| i.map(|i| r[i].clone()).unwrap_or(Cell::Empty))
                        .collect(),
                );
            }
        }
        res
    }

    /// The distinct non-blank values of a column, in order of first appearance.
    pub fn unique(&self, column: &str) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        for r in self.iter_rows() {
            if let Some(s) = r.get(column).as_text() {
                if !res.contains(&s) {
                    res.push(s);
                }
            }
        }
        res
    }

    /// Number of rows for each (key, value) pair. Rows with a blank key or value are skipped.
    pub fn group_counts(&self, key: &str, value: &str) -> BTreeMap<String, BTreeMap<String, usize>> {
        let mut res: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for r in self.iter_rows() {
            if let (Some(k), Some(v)) = (r.get(key).as_text(), r.get(value).as_text()) {
                *res.entry(k).or_default().entry(v).or_insert(0) += 1;
            }
        }
        res
    }
}

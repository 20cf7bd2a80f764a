use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::report::*;

/// Reads all the sheets of a workbook, in workbook order.
pub type WorkbookReader = fn(&Path) -> ReportResult<Vec<Table>>;

/// The readers, by file extension.
pub const READERS: [(&str, WorkbookReader); 1] = [("xlsx", read_xlsx)];

pub fn read_workbook(path: &Path) -> ReportResult<WorkbookTables> {
    let extension = io_common::file_extension(path);
    let reader = READERS
        .iter()
        .find(|(ext, _)| extension.as_deref() == Some(*ext))
        .map(|(_, reader)| *reader)
        .context(UnsupportedFormatSnafu {
            path: path.display().to_string(),
            supported: READERS
                .iter()
                .map(|(ext, _)| ext.to_string())
                .collect::<Vec<String>>(),
        })?;
    let sheets = reader(path)?;
    Ok(WorkbookTables::from_sheets(sheets))
}

fn read_xlsx(path: &Path) -> ReportResult<Vec<Table>> {
    let path_s = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;
    let names: Vec<String> = workbook.sheet_names().to_vec();
    debug!("read_xlsx: {:?}: sheets {:?}", path_s, names);
    let mut res: Vec<Table> = Vec::new();
    for name in names {
        let wrange = workbook
            .worksheet_range(&name)
            .context(EmptyExcelSnafu {
                path: path_s.clone(),
                sheet: name.clone(),
            })?
            .context(OpeningExcelSnafu {
                path: path_s.clone(),
            })?;
        res.push(range_to_table(&name, &wrange));
    }
    Ok(res)
}

/// The first row of the sheet is the header.
fn range_to_table(name: &str, wrange: &Range<DataType>) -> Table {
    // The range starts at the first non-empty cell. Leading empty columns are put back
    // so that unnamed columns keep their position.
    let offset = wrange.start().map(|(_, col)| col as usize).unwrap_or(0);
    let read_row = |row: &[DataType]| -> Vec<Cell> {
        let mut cells = vec![Cell::Empty; offset];
        cells.extend(row.iter().map(read_cell));
        cells
    };
    let mut iter = wrange.rows();
    let header = match iter.next() {
        Some(row) => read_row(row),
        None => vec![],
    };
    let rows: Vec<Vec<Cell>> = iter.map(read_row).collect();
    Table::from_grid(name, &header, rows)
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Int(i) => Cell::Int(*i),
        DataType::Float(f) => Cell::Float(*f),
        DataType::String(s) => Cell::Str(s.clone()),
        DataType::Bool(b) => Cell::Bool(*b),
        // Serial date, as stored by Excel.
        DataType::DateTime(f) => Cell::Float(*f),
        DataType::Empty => Cell::Empty,
        x => {
            debug!("read_cell: unreadable cell {:?}", x);
            Cell::Empty
        }
    }
}

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::poll::*;

fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        // Ranks typed in a spreadsheet are stored as floats.
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        x => format!("{:?}", x),
    }
}

/// Reads the first worksheet of an Excel ballot: the rank in the first column
/// and the candidate in the second one.
pub fn read_xlsx_ballot(path: &Path) -> PResult<Vec<(usize, Vec<String>)>> {
    let p = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: p.clone() })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path: p.clone() })?
        .context(OpeningExcelSnafu { path: p })?;

    // The range starts at the first non-empty cell.
    let first_row = wrange.start().map(|(r, _)| r as usize).unwrap_or(0);
    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let fields: Vec<String> = row.iter().map(read_cell).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        let lineno = first_row + idx + 1;
        debug!("read_xlsx_ballot: lineno: {:?} row: {:?}", lineno, &fields);
        rows.push((lineno, fields));
    }
    Ok(rows)
}

// Primitives for reading CSV ballots.

use crate::poll::*;

/// Reads the `rank,candidate` records of a CSV ballot, with their line numbers.
/// A header row is still included.
pub fn read_csv_ballot(path: &Path) -> PResult<Vec<(usize, Vec<String>)>> {
    let p = path.display().to_string();
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path: p.clone() })?;

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    for (idx, record_r) in rdr.into_records().enumerate() {
        let record = match record_r {
            Ok(r) => r,
            Err(e) => {
                let lineno = e.position().map(|pos| pos.line() as usize).unwrap_or(idx + 1);
                return Err(e).context(CsvLineParseSnafu { path: p, lineno });
            }
        };
        let lineno = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 1);
        let fields: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        debug!("read_csv_ballot: lineno: {:?} row: {:?}", lineno, &fields);
        rows.push((lineno, fields));
    }
    Ok(rows)
}

use pairwise_poll::Registry;
use std::path::Path;

/// The supported ballot files, chosen by extension.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BallotFormat {
    Text,
    Csv,
    Xlsx,
}

pub fn ballot_format(path: &Path) -> Option<BallotFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "txt" => Some(BallotFormat::Text),
        "csv" => Some(BallotFormat::Csv),
        "xlsx" => Some(BallotFormat::Xlsx),
        _ => None,
    }
}

/// The name of the file, used to identify the ballot in the reports.
pub fn simplify_file_name(path: &Path) -> String {
    match path.file_name() {
        Some(n) => n.to_string_lossy().to_string(),
        None => path.display().to_string(),
    }
}

/// Drops the first row if it is a header: its rank column is not a number and
/// its candidate column is not a registered key. A first row naming a known
/// candidate is a ranking and stays, so a bad rank there is reported.
pub fn skip_header(
    rows: Vec<(usize, Vec<String>)>,
    registry: &Registry,
) -> Vec<(usize, Vec<String>)> {
    let is_header = match rows.first() {
        Some((_, fields)) => {
            let rank_is_number = fields
                .first()
                .map(|f| f.trim().parse::<i64>().is_ok())
                .unwrap_or(false);
            let names_candidate = fields
                .get(1)
                .map(|k| registry.lookup(k.trim()).is_some())
                .unwrap_or(false);
            !rank_is_number && !names_candidate
        }
        None => false,
    };
    if is_header {
        rows.into_iter().skip(1).collect()
    } else {
        rows
    }
}

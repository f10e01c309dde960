// Ballots filled in as a copy of the master list.

use crate::poll::*;

pub fn read_text_ballot(path: &Path) -> PResult<Vec<String>> {
    let bytes = fs::read(path).context(OpeningBallotSnafu {
        path: path.display().to_string(),
    })?;
    // Invalid UTF-8 is replaced, not fatal.
    let contents = String::from_utf8_lossy(&bytes);
    let lines: Vec<String> = contents.lines().map(|l| l.to_string()).collect();
    debug!("read_text_ballot: {:?}: {} lines", path, lines.len());
    Ok(lines)
}

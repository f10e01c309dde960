//! Line-oriented text formats: the master list of candidates and the voter
//! ballots.
//!
//! Both formats share the same conventions:
//! - everything before the [`SENTINEL_LINE`] is a free-text header,
//! - lines starting with the [`COMMENT_MARKER`] and blank lines are skipped,
//! - data rows are comma-separated and start with a rank.

use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

use crate::config::PollErrors;
use crate::registry::{CandidateId, CandidateMetadata, Registry};

/// Separates the header of a file from its data rows.
pub const SENTINEL_LINE: &str = "! DO NOT CHANGE OR DELETE THIS LINE !";

/// Lines starting with this marker (followed by a space, or alone) are comments.
pub const COMMENT_MARKER: &str = "*";

/// A voter field starting with this text was left as printed on the blank
/// ballot, which means that no answer was given.
pub const NO_ANSWER_PLACEHOLDER: &str = "-Replace";

/// Name, email, city, region and country.
pub const VOTER_INFO_FIELDS: usize = 5;

enum LineKind<'a> {
    Skip,
    Sentinel,
    Content(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    let sline = line.trim();
    if sline.is_empty() {
        LineKind::Skip
    } else if sline == SENTINEL_LINE {
        LineKind::Sentinel
    } else if sline == COMMENT_MARKER || sline.starts_with(&format!("{} ", COMMENT_MARKER)) {
        LineKind::Skip
    } else {
        LineKind::Content(sline)
    }
}

fn split_fields(sline: &str) -> Vec<String> {
    sline.split(',').map(|s| s.trim().to_string()).collect()
}

// ********* Master list **********

/// One data row of the master list.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MasterListEntry {
    pub line: usize,
    pub key: String,
    pub abbreviation: String,
    pub metadata: CandidateMetadata,
}

fn non_empty(field: Option<&String>) -> Option<String> {
    field.filter(|s| !s.is_empty()).cloned()
}

/// Reads the rows `rank, key, abbreviation[, designer[, year[, link]]]` that
/// follow the sentinel line.
///
/// The rank column is only informative for the people filling in a ballot and
/// is not interpreted.
pub fn parse_master_list<S: AsRef<str>>(lines: &[S]) -> Result<Vec<MasterListEntry>, PollErrors> {
    let mut started = false;
    let mut res: Vec<MasterListEntry> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let lineno = idx + 1;
        match classify(line.as_ref()) {
            LineKind::Sentinel if !started => {
                started = true;
            }
            LineKind::Content(sline) if started => {
                let words = split_fields(sline);
                if words.len() < 3 || words[1].is_empty() {
                    return Err(PollErrors::MalformedMasterList {
                        line: lineno,
                        reason: format!("expected 'rank, key, abbreviation', found {:?}", sline),
                    });
                }
                res.push(MasterListEntry {
                    line: lineno,
                    key: words[1].clone(),
                    abbreviation: words[2].clone(),
                    metadata: CandidateMetadata {
                        designer: non_empty(words.get(3)),
                        year: non_empty(words.get(4)),
                        link: non_empty(words.get(5)),
                    },
                });
            }
            _ => {}
        }
    }
    if !started {
        return Err(PollErrors::MissingSentinel);
    }
    Ok(res)
}

/// Builds the registry from the lines of a master list.
pub fn read_master_list<S: AsRef<str>>(lines: &[S]) -> Result<Registry, PollErrors> {
    let entries = parse_master_list(lines)?;
    if entries.is_empty() {
        return Err(PollErrors::EmptyRegistry);
    }
    let mut registry = Registry::new();
    for e in entries {
        registry.register(&e.key, &e.abbreviation, e.metadata)?;
    }
    debug!("read_master_list: {} candidates", registry.size());
    Ok(registry)
}

// ********* Ballots **********

/// The identity fields at the top of a ballot. A field left blank or with the
/// placeholder text is empty.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoterInfo {
    pub name: String,
    pub email: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl VoterInfo {
    /// Assigns the header fields in order. Missing fields stay empty and extra
    /// fields are ignored.
    pub fn from_fields(fields: &[String]) -> VoterInfo {
        let get = |idx: usize| -> String {
            match fields.get(idx) {
                Some(s) if s.starts_with(NO_ANSWER_PLACEHOLDER) => "".to_string(),
                Some(s) => s.clone(),
                None => "".to_string(),
            }
        };
        VoterInfo {
            name: get(0),
            email: get(1),
            city: get(2),
            region: get(3),
            country: get(4),
        }
    }
}

/// A (rank, candidate) row before validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawEntry {
    pub line: usize,
    pub rank: String,
    pub key: String,
}

/// The validated preferences of one voter: every candidate ranked above zero,
/// with its rank. A lower rank is preferred.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ranking {
    ranks: BTreeMap<CandidateId, u32>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CandidateId, u32)> + '_ {
        self.ranks.iter().map(|(cid, r)| (*cid, *r))
    }

    /// The rank given to a candidate, if it was ranked at all.
    pub fn rank_of(&self, registry: &Registry, key: &str) -> Option<u32> {
        registry
            .id_of(key)
            .and_then(|cid| self.ranks.get(&cid).cloned())
    }
}

/// A ballot that passed validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub voter_info: VoterInfo,
    pub ranking: Ranking,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotErrorReason {
    /// The rank is not a non-negative integer.
    RankNotInteger(String),
    /// The candidate key is not in the registry.
    UnknownCandidate(String),
    /// The row does not contain a rank and a candidate.
    MalformedLine(String),
    /// The same candidate appears twice on the ballot.
    DuplicateEntry(String),
    /// The sentinel line is missing: no row can be read.
    MissingSentinel,
    /// The file could not be decoded from this line on.
    Unreadable(String),
}

/// Why a ballot was discarded, and where.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotError {
    pub line: usize,
    pub reason: BallotErrorReason,
}

impl Display for BallotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            BallotErrorReason::RankNotInteger(s) => {
                write!(f, "line {}: rank must be an integer, found {:?}", self.line, s)
            }
            BallotErrorReason::UnknownCandidate(s) => {
                write!(f, "line {}: unknown candidate {:?}", self.line, s)
            }
            BallotErrorReason::MalformedLine(s) => {
                write!(f, "line {}: expected 'rank, candidate', found {:?}", self.line, s)
            }
            BallotErrorReason::DuplicateEntry(s) => {
                write!(f, "line {}: candidate {:?} is ranked twice", self.line, s)
            }
            BallotErrorReason::MissingSentinel => write!(
                f,
                "line {}: the line {:?} was not found",
                self.line, SENTINEL_LINE
            ),
            BallotErrorReason::Unreadable(s) => {
                write!(f, "line {}: unreadable content: {}", self.line, s)
            }
        }
    }
}

impl std::error::Error for BallotError {}

fn parse_rank(token: &str) -> Option<u32> {
    let t = token.trim();
    if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    t.parse::<u32>().ok()
}

/// Reads the `rank, candidate` columns of a row. Extra columns are ignored.
pub fn entry_from_fields(line: usize, fields: &[String]) -> Result<RawEntry, BallotError> {
    match fields {
        [rank, key, ..] if !key.is_empty() => Ok(RawEntry {
            line,
            rank: rank.clone(),
            key: key.clone(),
        }),
        _ => Err(BallotError {
            line,
            reason: BallotErrorReason::MalformedLine(fields.join(", ")),
        }),
    }
}

/// Checks every row of a ballot against the registry.
///
/// The whole ballot fails on the first bad row. Rows ranked zero are valid but
/// do not enter the ranking: the voter has not ridden that candidate.
pub fn validate_entries(
    voter_info: VoterInfo,
    entries: &[RawEntry],
    registry: &Registry,
) -> Result<ParsedBallot, BallotError> {
    let mut seen: HashSet<CandidateId> = HashSet::new();
    let mut ranks: BTreeMap<CandidateId, u32> = BTreeMap::new();
    for e in entries.iter() {
        let rank = parse_rank(&e.rank).ok_or_else(|| BallotError {
            line: e.line,
            reason: BallotErrorReason::RankNotInteger(e.rank.clone()),
        })?;
        let cid = registry.id_of(&e.key).ok_or_else(|| BallotError {
            line: e.line,
            reason: BallotErrorReason::UnknownCandidate(e.key.clone()),
        })?;
        if !seen.insert(cid) {
            return Err(BallotError {
                line: e.line,
                reason: BallotErrorReason::DuplicateEntry(e.key.clone()),
            });
        }
        if rank > 0 {
            ranks.insert(cid, rank);
        }
    }
    Ok(ParsedBallot {
        voter_info,
        ranking: Ranking { ranks },
    })
}

/// Parses the lines of one text ballot: up to five voter fields, the sentinel
/// line, then `rank, candidate` rows until the end.
pub fn parse_ballot<S: AsRef<str>>(
    lines: &[S],
    registry: &Registry,
) -> Result<ParsedBallot, BallotError> {
    let mut started = false;
    let mut header: Vec<String> = Vec::new();
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut malformed: Option<BallotError> = None;

    for (idx, line) in lines.iter().enumerate() {
        let lineno = idx + 1;
        match classify(line.as_ref()) {
            LineKind::Skip => {}
            LineKind::Sentinel if !started => {
                started = true;
            }
            LineKind::Sentinel => {
                malformed = Some(BallotError {
                    line: lineno,
                    reason: BallotErrorReason::MalformedLine(SENTINEL_LINE.to_string()),
                });
                break;
            }
            LineKind::Content(sline) if !started => {
                if header.len() < VOTER_INFO_FIELDS {
                    header.push(sline.to_string());
                } else {
                    debug!("parse_ballot: line {}: extra header line ignored", lineno);
                }
            }
            LineKind::Content(sline) => {
                match entry_from_fields(lineno, &split_fields(sline)) {
                    Ok(e) => entries.push(e),
                    Err(e) => {
                        malformed = Some(e);
                        break;
                    }
                }
            }
        }
    }

    if !started {
        return Err(BallotError {
            line: lines.len(),
            reason: BallotErrorReason::MissingSentinel,
        });
    }

    // Rows before a malformed line are checked first so that the earliest
    // problem is the one reported.
    let parsed = validate_entries(VoterInfo::from_fields(&header), &entries, registry)?;
    match malformed {
        Some(err) => Err(err),
        None => Ok(parsed),
    }
}

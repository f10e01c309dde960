// ********* Rules **********

use std::error::Error;
use std::fmt::Display;

/// The rules that govern how a poll is ranked and exported.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollRules {
    /// A candidate needs at least this many riders to appear in the ranking.
    pub min_riders: u32,
    /// If set, the voter identity fields of every valid ballot are kept in the
    /// results. This is sensitive information and is off by default.
    pub include_voter_info: bool,
}

impl PollRules {
    pub const DEFAULT_MIN_RIDERS: u32 = 1;

    pub const DEFAULT_RULES: PollRules = PollRules {
        min_riders: PollRules::DEFAULT_MIN_RIDERS,
        include_voter_info: false,
    };
}

impl Default for PollRules {
    fn default() -> Self {
        PollRules::DEFAULT_RULES
    }
}

// ******** Errors *********

/// Errors that prevent the poll from being tabulated at all.
///
/// Problems inside a single ballot are not reported here: they are collected as
/// [`crate::BallotDiagnostic`] records and the ballot is skipped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PollErrors {
    /// The master list did not contain a single candidate.
    EmptyRegistry,
    /// The same candidate key was registered twice.
    DuplicateCandidate(String),
    /// A data row of the master list could not be understood.
    MalformedMasterList { line: usize, reason: String },
    /// The sentinel line separating the header from the data rows is missing.
    MissingSentinel,
}

impl Error for PollErrors {}

impl Display for PollErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollErrors::EmptyRegistry => write!(f, "the master list contains no candidate"),
            PollErrors::DuplicateCandidate(key) => {
                write!(f, "candidate {:?} is registered more than once", key)
            }
            PollErrors::MalformedMasterList { line, reason } => {
                write!(f, "master list, line {}: {}", line, reason)
            }
            PollErrors::MissingSentinel => write!(
                f,
                "the master list does not contain the line {:?}",
                crate::ballot::SENTINEL_LINE
            ),
        }
    }
}

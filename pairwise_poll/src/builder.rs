use log::debug;
use std::fmt::Display;

pub use crate::config::*;

use crate::aggregate::{aggregate, Aggregates};
use crate::ballot::{
    entry_from_fields, parse_ballot, read_master_list, validate_entries, BallotError,
    ParsedBallot, RawEntry, VoterInfo,
};
use crate::projection::{project, Tables, VoterRow};
use crate::registry::{CandidateMetadata, Registry};
use crate::tally::Tally;

/// A ballot that was discarded, with the reason.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotDiagnostic {
    pub ballot_id: String,
    pub error: BallotError,
}

impl Display for BallotDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.ballot_id, self.error)
    }
}

/// Global figures about the poll.
#[derive(PartialEq, Debug, Clone)]
pub struct PollStats {
    pub valid_ballots: u64,
    pub rejected_ballots: u64,
    pub candidates: u64,
    /// Sum over the valid ballots of the number of ranked candidates.
    pub total_credits: u64,
    pub average_credits: f64,
}

/// Everything produced by a poll.
#[derive(PartialEq, Debug, Clone)]
pub struct PollResult {
    pub stats: PollStats,
    pub aggregates: Aggregates,
    pub tables: Tables,
    /// The discarded ballots, in the order they were submitted.
    pub diagnostics: Vec<BallotDiagnostic>,
}

/// A builder for tallying ballots one at a time.
///
/// ```
/// use pairwise_poll::builder::Builder;
/// use pairwise_poll::PollRules;
/// # use pairwise_poll::PollErrors;
///
/// let mut builder = Builder::new(&PollRules::DEFAULT_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder
///     .add_ballot_lines("ballot1", &["! DO NOT CHANGE OR DELETE THIS LINE !", "1, Bob", "2, Anna"])
///     .unwrap();
/// // Clara is not registered: the ballot is discarded.
/// assert!(builder.add_ballot_lines("ballot2", &["! DO NOT CHANGE OR DELETE THIS LINE !", "1, Clara"]).is_err());
///
/// let res = builder.finish()?;
/// assert_eq!(res.tables.overall[0].key, "Bob");
/// assert_eq!(res.diagnostics.len(), 1);
/// # Ok::<(), PollErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: PollRules,
    pub(crate) _registry: Registry,
    pub(crate) _tally: Tally,
    pub(crate) _voters: Vec<VoterRow>,
    pub(crate) _diagnostics: Vec<BallotDiagnostic>,
}

impl Builder {
    pub fn new(rules: &PollRules) -> Result<Builder, PollErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _registry: Registry::new(),
            _tally: Tally::new(0),
            _voters: Vec::new(),
            _diagnostics: Vec::new(),
        })
    }

    /// Uses the given registry. Ballots added before are dropped.
    pub fn registry(self, registry: Registry) -> Result<Builder, PollErrors> {
        if registry.is_empty() {
            return Err(PollErrors::EmptyRegistry);
        }
        Ok(Builder {
            _rules: self._rules,
            _tally: Tally::new(registry.size()),
            _registry: registry,
            _voters: Vec::new(),
            _diagnostics: Vec::new(),
        })
    }

    /// Registers candidates whose abbreviation is their key.
    pub fn candidates(self, keys: &[String]) -> Result<Builder, PollErrors> {
        let mut registry = Registry::new();
        for k in keys {
            registry.register(k, k, CandidateMetadata::default())?;
        }
        self.registry(registry)
    }

    /// Registers the candidates from the lines of a master list.
    pub fn master_list<S: AsRef<str>>(self, lines: &[S]) -> Result<Builder, PollErrors> {
        let registry = read_master_list(lines)?;
        self.registry(registry)
    }

    pub fn get_registry(&self) -> &Registry {
        &self._registry
    }

    /// Adds a ballot in the text format.
    ///
    /// A ballot with a single bad line changes nothing in the tally: the error
    /// is returned and kept in the diagnostics of the result.
    pub fn add_ballot_lines<S: AsRef<str>>(
        &mut self,
        ballot_id: &str,
        lines: &[S],
    ) -> Result<(), BallotError> {
        let res = parse_ballot(lines, &self._registry);
        self.add_parsed(ballot_id, res)
    }

    /// Adds a ballot whose rows were already extracted, for example from a
    /// spreadsheet.
    pub fn add_ballot_entries(
        &mut self,
        ballot_id: &str,
        voter_info: VoterInfo,
        entries: &[RawEntry],
    ) -> Result<(), BallotError> {
        let res = validate_entries(voter_info, entries, &self._registry);
        self.add_parsed(ballot_id, res)
    }

    /// Adds a ballot made of `(line, columns)` rows with the rank in the first
    /// column and the candidate in the second one. There is no voter
    /// information in this form.
    pub fn add_ballot_rows(
        &mut self,
        ballot_id: &str,
        rows: &[(usize, Vec<String>)],
    ) -> Result<(), BallotError> {
        let entries: Result<Vec<RawEntry>, BallotError> = rows
            .iter()
            .map(|(line, fields)| entry_from_fields(*line, fields))
            .collect();
        let res = match entries {
            Ok(es) => validate_entries(VoterInfo::default(), &es, &self._registry),
            Err(e) => Err(e),
        };
        self.add_parsed(ballot_id, res)
    }

    /// Records a ballot that could not be read at all. It counts as rejected.
    pub fn reject_ballot(&mut self, ballot_id: &str, error: BallotError) {
        let _ = self.add_parsed(ballot_id, Err(error));
    }

    fn add_parsed(
        &mut self,
        ballot_id: &str,
        res: Result<ParsedBallot, BallotError>,
    ) -> Result<(), BallotError> {
        match res {
            Ok(pb) => {
                let credits = pb.ranking.len() as u64;
                debug!("ballot {}: {} credits", ballot_id, credits);
                if self._rules.include_voter_info {
                    debug!("ballot {}: voter {:?}", ballot_id, pb.voter_info);
                }
                self._tally.record_ballot(&pb.ranking);
                self._voters.push(VoterRow {
                    ballot_id: ballot_id.to_string(),
                    voter_info: pb.voter_info,
                    credits,
                });
                Ok(())
            }
            Err(e) => {
                debug!("ballot {}: discarded: {}", ballot_id, e);
                self._diagnostics.push(BallotDiagnostic {
                    ballot_id: ballot_id.to_string(),
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    /// Aggregates the tallied ballots and builds the output tables.
    pub fn finish(self) -> Result<PollResult, PollErrors> {
        if self._registry.is_empty() {
            return Err(PollErrors::EmptyRegistry);
        }
        let aggregates = aggregate(&self._registry, &self._tally, &self._rules);
        let tables = project(&aggregates, &self._tally, &self._voters, &self._rules);
        let valid_ballots = self._tally.valid_ballots();
        let total_credits = self._tally.total_credits();
        let stats = PollStats {
            valid_ballots,
            rejected_ballots: self._diagnostics.len() as u64,
            candidates: self._registry.size() as u64,
            total_credits,
            average_credits: if valid_ballots == 0 {
                0.0
            } else {
                total_credits as f64 / valid_ballots as f64
            },
        };
        Ok(PollResult {
            stats,
            aggregates,
            tables,
            diagnostics: self._diagnostics,
        })
    }
}

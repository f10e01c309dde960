//! Pairwise tabulation of ranked polls.
//!
//! Every voter ranks any subset of the candidates registered in a master list.
//! Each ballot is broken down into head-to-head contests between every pair of
//! candidates it ranks, and candidates are ordered by the share of those
//! contests they won. See the [`manual`] for the input formats.
//!
//! ```
//! use pairwise_poll::{run_poll, PollRules};
//! # use pairwise_poll::PollErrors;
//!
//! let master_list = ["! DO NOT CHANGE OR DELETE THIS LINE !", "0, A, a", "0, B, b"];
//! let ballots = vec![(
//!     "ballot1.txt".to_string(),
//!     vec!["! DO NOT CHANGE OR DELETE THIS LINE !".to_string(), "1, B".to_string(), "2, A".to_string()],
//! )];
//! let res = run_poll(&master_list, &ballots, &PollRules::DEFAULT_RULES)?;
//! assert_eq!(res.tables.overall[0].key, "B");
//! # Ok::<(), PollErrors>(())
//! ```

mod aggregate;
mod ballot;
pub mod builder;
mod config;
pub mod manual;
mod projection;
mod registry;
mod tally;

use log::info;

pub use crate::aggregate::*;
pub use crate::ballot::{
    entry_from_fields, parse_ballot, parse_master_list, read_master_list, validate_entries,
    BallotError,
    BallotErrorReason, MasterListEntry, ParsedBallot, RawEntry, Ranking, VoterInfo,
    COMMENT_MARKER, NO_ANSWER_PLACEHOLDER, SENTINEL_LINE, VOTER_INFO_FIELDS,
};
pub use crate::builder::{BallotDiagnostic, Builder, PollResult, PollStats};
pub use crate::config::*;
pub use crate::projection::*;
pub use crate::registry::{Candidate, CandidateId, CandidateMetadata, KeyParts, Registry};
pub use crate::tally::{CandidateTotals, Record, Tally, WinRatio};

/// Runs a poll over ballots in the text format.
///
/// Arguments:
/// * `master_list` the lines of the master list
/// * `ballots` for each ballot, an identifier (typically the file name) and its lines
/// * `rules` the rules that govern this poll
///
/// Bad ballots do not stop the poll: they are listed in the diagnostics of the
/// result.
pub fn run_poll<S: AsRef<str>>(
    master_list: &[S],
    ballots: &[(String, Vec<String>)],
    rules: &PollRules,
) -> Result<PollResult, PollErrors> {
    info!(
        "run_poll: processing {} ballots, rules: {:?}",
        ballots.len(),
        rules
    );
    let mut builder = Builder::new(rules)?.master_list(master_list)?;
    for (ballot_id, lines) in ballots.iter() {
        // Failures are kept by the builder.
        let _ = builder.add_ballot_lines(ballot_id, lines);
    }
    let res = builder.finish()?;
    info!(
        "run_poll: {} valid ballots, {} rejected",
        res.stats.valid_ballots, res.stats.rejected_ballots
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot(id: &str, rows: &[&str]) -> (String, Vec<String>) {
        let mut lines = vec![
            "-Replace with your name".to_string(),
            SENTINEL_LINE.to_string(),
        ];
        lines.extend(rows.iter().map(|s| s.to_string()));
        (id.to_string(), lines)
    }

    fn master_list() -> Vec<&'static str> {
        vec![
            "* Coasters of the poll",
            SENTINEL_LINE,
            "0, Alpha - Park One - Ohio, A",
            "0, Beta - Park Two - Texas, B",
            "0, Gamma - Park One - Ohio, C",
            "0, Delta - Park Three - Utah, D",
        ]
    }

    #[test]
    fn end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ballots = vec![
            ballot(
                "b1.txt",
                &[
                    "1, Alpha - Park One - Ohio",
                    "2, Beta - Park Two - Texas",
                    "3, Gamma - Park One - Ohio",
                ],
            ),
            ballot(
                "b2.txt",
                &[
                    "1, Alpha - Park One - Ohio",
                    "1, Beta - Park Two - Texas",
                    "3, Gamma - Park One - Ohio",
                ],
            ),
            // Unknown candidate: the whole ballot is dropped.
            ballot("b3.txt", &["1, Gamma - Park One - Ohio", "2, Z"]),
            // Malformed line.
            ballot("b4.txt", &["1, Delta - Park Three - Utah", "first"]),
        ];
        let res = run_poll(&master_list(), &ballots, &PollRules::DEFAULT_RULES).unwrap();

        assert_eq!(res.stats.valid_ballots, 2);
        assert_eq!(res.stats.rejected_ballots, 2);
        assert_eq!(res.stats.total_credits, 6);
        assert_eq!(res.stats.average_credits, 3.0);
        assert_eq!(
            res.diagnostics[0].error.reason,
            BallotErrorReason::UnknownCandidate("Z".to_string())
        );
        assert_eq!(res.diagnostics[0].ballot_id, "b3.txt");
        assert_eq!(res.diagnostics[1].ballot_id, "b4.txt");
        assert_eq!(res.diagnostics[1].error.line, 4);

        let keys: Vec<&str> = res.tables.overall.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Alpha - Park One - Ohio",
                "Beta - Park Two - Texas",
                "Gamma - Park One - Ohio"
            ]
        );
        assert_eq!(res.tables.overall[0].total_win_percentage, 87.5);
        assert_eq!(res.tables.overall[0].pairwise_win_percentage, 100.0);
        assert_eq!(res.tables.overall[1].total_win_percentage, 62.5);
        assert_eq!(res.tables.overall[2].total_win_percentage, 0.0);
        assert_eq!(res.tables.overall[2].riders, 2);
        // Delta was only ranked on the malformed ballot.
        assert_eq!(res.aggregates.no_riders.len(), 1);
        assert_eq!(res.aggregates.no_riders[0].key, "Delta - Park Three - Utah");

        let first_pair = &res.tables.pairs[0];
        assert_eq!(first_pair.candidate, "Alpha - Park One - Ohio");
        assert_eq!(first_pair.rank, 1);
        assert_eq!(first_pair.win_percentage, 100.0);
        assert!(res.tables.voters.is_none());
    }

    #[test]
    fn voter_info_is_opt_in() {
        let ballots = vec![(
            "b1.txt".to_string(),
            vec![
                "Jane".to_string(),
                "-Replace with your email".to_string(),
                "Springfield".to_string(),
                "-Replace with your state or province".to_string(),
                "USA".to_string(),
                SENTINEL_LINE.to_string(),
                "1, Alpha - Park One - Ohio".to_string(),
            ],
        )];
        let rules = PollRules {
            include_voter_info: true,
            ..PollRules::DEFAULT_RULES
        };
        let res = run_poll(&master_list(), &ballots, &rules).unwrap();
        let voters = res.tables.voters.unwrap();
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].voter_info.name, "Jane");
        assert_eq!(voters[0].voter_info.email, "");
        assert_eq!(voters[0].voter_info.country, "USA");
        assert_eq!(voters[0].credits, 1);
    }

    #[test]
    fn min_riders() {
        let ballots = vec![
            ballot(
                "b1.txt",
                &["1, Alpha - Park One - Ohio", "2, Beta - Park Two - Texas"],
            ),
            ballot(
                "b2.txt",
                &["1, Alpha - Park One - Ohio", "2, Gamma - Park One - Ohio"],
            ),
        ];
        let rules = PollRules {
            min_riders: 2,
            ..PollRules::DEFAULT_RULES
        };
        let res = run_poll(&master_list(), &ballots, &rules).unwrap();
        assert_eq!(res.tables.overall.len(), 1);
        assert_eq!(res.tables.overall[0].key, "Alpha - Park One - Ohio");
        assert_eq!(res.aggregates.insufficient_riders.len(), 2);
        assert_eq!(res.aggregates.no_riders.len(), 1);
    }

    #[test]
    fn missing_sentinel_in_master_list() {
        let err = run_poll(&["0, A, a"], &[], &PollRules::DEFAULT_RULES).unwrap_err();
        assert_eq!(err, PollErrors::MissingSentinel);
    }
}

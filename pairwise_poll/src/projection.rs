//! Output tables, ready to be written by an exporter.

use std::fmt::Display;

use crate::aggregate::{Aggregates, PairStanding, RankedCandidate};
use crate::ballot::VoterInfo;
use crate::config::PollRules;
use crate::registry::CandidateMetadata;
use crate::tally::{Record, Tally};

/// One row of the overall ranking.
#[derive(PartialEq, Debug, Clone)]
pub struct OverallRow {
    pub rank: u32,
    pub key: String,
    pub abbreviation: String,
    pub metadata: CandidateMetadata,
    pub total_win_percentage: f64,
    pub pairwise_win_percentage: f64,
    pub total: Record,
    pub pairwise: Record,
    pub riders: u64,
    pub tied_with: Vec<String>,
}

/// One row of the pairwise ranking.
#[derive(PartialEq, Debug, Clone)]
pub struct PairRow {
    pub rank: u32,
    pub candidate: String,
    pub opponent: String,
    pub win_percentage: f64,
    pub record: Record,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

/// The result of all the contests between the row candidate and the column
/// candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct HeadToHeadCell {
    pub outcome: Outcome,
    pub record: Record,
}

impl HeadToHeadCell {
    fn from_record(record: Record) -> Option<HeadToHeadCell> {
        if record.contests() == 0 {
            return None;
        }
        let outcome = if record.wins > record.losses {
            Outcome::Win
        } else if record.wins < record.losses {
            Outcome::Loss
        } else {
            Outcome::Tie
        };
        Some(HeadToHeadCell { outcome, record })
    }
}

impl Display for HeadToHeadCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self.outcome {
            Outcome::Win => 'W',
            Outcome::Loss => 'L',
            Outcome::Tie => 'T',
        };
        write!(
            f,
            "{} {}-{}-{}",
            c, self.record.wins, self.record.losses, self.record.ties
        )
    }
}

/// Square grid over the ranked candidates, in ranking order. Cells are empty on
/// the diagonal and for pairs that never met.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HeadToHead {
    pub candidates: Vec<String>,
    pub cells: Vec<Vec<Option<HeadToHeadCell>>>,
}

/// The identity of a voter, as exported when requested.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoterRow {
    pub ballot_id: String,
    pub voter_info: VoterInfo,
    /// Number of candidates ranked on the ballot.
    pub credits: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Tables {
    pub overall: Vec<OverallRow>,
    pub pairs: Vec<PairRow>,
    pub head_to_head: HeadToHead,
    /// Only present if the rules allow exporting voter information.
    pub voters: Option<Vec<VoterRow>>,
}

pub fn overall_table(ranking: &[RankedCandidate]) -> Vec<OverallRow> {
    ranking
        .iter()
        .map(|rc| OverallRow {
            rank: rc.rank,
            key: rc.standing.key.clone(),
            abbreviation: rc.standing.abbreviation.clone(),
            metadata: rc.standing.metadata.clone(),
            total_win_percentage: rc.standing.total_win_percentage,
            pairwise_win_percentage: rc.standing.pairwise_win_percentage,
            total: rc.standing.total,
            pairwise: rc.standing.pairwise,
            riders: rc.standing.riders,
            tied_with: rc.tied_with.clone(),
        })
        .collect()
}

pub fn pairs_table(pairs: &[PairStanding]) -> Vec<PairRow> {
    pairs
        .iter()
        .map(|p| PairRow {
            rank: p.rank,
            candidate: p.candidate.clone(),
            opponent: p.opponent.clone(),
            win_percentage: p.win_percentage,
            record: p.record,
        })
        .collect()
}

pub fn head_to_head(ranking: &[RankedCandidate], tally: &Tally) -> HeadToHead {
    let cells = ranking
        .iter()
        .map(|row| {
            ranking
                .iter()
                .map(|col| {
                    if row.standing.cid == col.standing.cid {
                        None
                    } else {
                        HeadToHeadCell::from_record(tally.cell(row.standing.cid, col.standing.cid))
                    }
                })
                .collect()
        })
        .collect();
    HeadToHead {
        candidates: ranking.iter().map(|rc| rc.standing.key.clone()).collect(),
        cells,
    }
}

pub fn project(
    aggregates: &Aggregates,
    tally: &Tally,
    voters: &[VoterRow],
    rules: &PollRules,
) -> Tables {
    Tables {
        overall: overall_table(&aggregates.ranking),
        pairs: pairs_table(&aggregates.pairs),
        head_to_head: head_to_head(&aggregates.ranking, tally),
        voters: if rules.include_voter_info {
            Some(voters.to_vec())
        } else {
            None
        },
    }
}

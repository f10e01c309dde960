use log::{debug, info};
use std::cmp::Reverse;

use crate::config::PollRules;
use crate::registry::{CandidateId, CandidateMetadata, Registry};
use crate::tally::{Record, Tally, WinRatio};

/// Final statistics of one candidate.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateStanding {
    pub(crate) cid: CandidateId,
    pub key: String,
    pub abbreviation: String,
    pub metadata: CandidateMetadata,
    pub riders: u64,
    /// Every contest against every opponent.
    pub total: Record,
    /// One entry per opponent met at least once: a win if this candidate won
    /// more contests than it lost against that opponent.
    pub pairwise: Record,
    pub total_ratio: WinRatio,
    pub pairwise_ratio: WinRatio,
    pub total_win_percentage: f64,
    pub pairwise_win_percentage: f64,
}

/// Whether a candidate enters the ranking.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Eligibility {
    Ranked,
    InsufficientRiders,
    NoRiders,
}

pub fn eligibility(riders: u64, min_riders: u32) -> Eligibility {
    if riders == 0 {
        Eligibility::NoRiders
    } else if riders < min_riders as u64 {
        Eligibility::InsufficientRiders
    } else {
        Eligibility::Ranked
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankedCandidate {
    pub rank: u32,
    pub standing: CandidateStanding,
    /// The other candidates that share the same rank, in ranking order.
    pub tied_with: Vec<String>,
}

/// The statistics of one ordered pair with at least one contest.
#[derive(PartialEq, Debug, Clone)]
pub struct PairStanding {
    pub rank: u32,
    pub candidate: String,
    pub opponent: String,
    pub record: Record,
    pub ratio: WinRatio,
    pub win_percentage: f64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RiderCount {
    pub rank: u32,
    pub key: String,
    pub abbreviation: String,
    pub riders: u64,
}

/// Everything computed once all the ballots have been tallied.
#[derive(PartialEq, Debug, Clone)]
pub struct Aggregates {
    /// All the candidates, in registration order.
    pub standings: Vec<CandidateStanding>,
    /// The qualifying candidates, best first.
    pub ranking: Vec<RankedCandidate>,
    pub insufficient_riders: Vec<CandidateStanding>,
    pub no_riders: Vec<CandidateStanding>,
    /// All the ordered pairs with at least one contest, best first.
    pub pairs: Vec<PairStanding>,
    /// All the candidates by number of riders.
    pub riders: Vec<RiderCount>,
}

/// Standard competition ranks ("1224") over a sorted list: equal values share
/// the rank of the first of them.
fn competition_ranks<T, K: PartialEq, F: Fn(&T) -> K>(sorted: &[T], value: F) -> Vec<u32> {
    let mut ranks: Vec<u32> = Vec::with_capacity(sorted.len());
    for (idx, item) in sorted.iter().enumerate() {
        let rank = if idx > 0 && value(&sorted[idx - 1]) == value(item) {
            ranks[idx - 1]
        } else {
            idx as u32 + 1
        };
        ranks.push(rank);
    }
    ranks
}

fn pairwise_record(tally: &Tally, registry: &Registry, cid: CandidateId) -> Record {
    let mut res = Record::EMPTY;
    for (opp, _) in registry.iter() {
        if opp == cid {
            continue;
        }
        let cell = tally.cell(cid, opp);
        if cell.contests() == 0 {
            continue;
        }
        if cell.wins > cell.losses {
            res.wins += 1;
        } else if cell.wins < cell.losses {
            res.losses += 1;
        } else {
            res.ties += 1;
        }
    }
    res
}

fn standing(registry: &Registry, tally: &Tally, cid: CandidateId) -> CandidateStanding {
    let c = registry.get(cid);
    let totals = tally.totals(cid);
    let pairwise = pairwise_record(tally, registry, cid);
    let total_ratio = totals.record.ratio();
    let pairwise_ratio = pairwise.ratio();
    CandidateStanding {
        cid,
        key: c.key.clone(),
        abbreviation: c.abbreviation.clone(),
        metadata: c.metadata.clone(),
        riders: totals.riders,
        total: totals.record,
        pairwise,
        total_ratio,
        pairwise_ratio,
        total_win_percentage: total_ratio.percentage(),
        pairwise_win_percentage: pairwise_ratio.percentage(),
    }
}

fn rank_candidates(mut qualified: Vec<CandidateStanding>) -> Vec<RankedCandidate> {
    // Best ratio first, then the key to keep the order reproducible.
    qualified.sort_by(|s1, s2| {
        s2.total_ratio
            .cmp(&s1.total_ratio)
            .then_with(|| s1.key.cmp(&s2.key))
    });
    let ranks = competition_ranks(&qualified, |s| s.total_ratio);

    let mut res: Vec<RankedCandidate> = Vec::with_capacity(qualified.len());
    for (idx, s) in qualified.iter().enumerate() {
        let tied_with: Vec<String> = qualified
            .iter()
            .zip(ranks.iter())
            .filter(|(s2, r2)| **r2 == ranks[idx] && s2.key != s.key)
            .map(|(s2, _)| s2.key.clone())
            .collect();
        res.push(RankedCandidate {
            rank: ranks[idx],
            standing: s.clone(),
            tied_with,
        });
    }
    res
}

fn rank_pairs(registry: &Registry, tally: &Tally) -> Vec<PairStanding> {
    let mut pairs: Vec<(String, String, Record)> = tally
        .contested_cells()
        .iter()
        .map(|(k, r)| (registry.get(k.0).key.clone(), registry.get(k.1).key.clone(), *r))
        .collect();
    pairs.sort_by(|(a1, b1, r1), (a2, b2, r2)| {
        r2.ratio()
            .cmp(&r1.ratio())
            .then_with(|| a1.cmp(a2))
            .then_with(|| b1.cmp(b2))
    });
    let ranks = competition_ranks(&pairs, |(_, _, r)| r.ratio());
    pairs
        .into_iter()
        .zip(ranks)
        .map(|((candidate, opponent, record), rank)| PairStanding {
            rank,
            candidate,
            opponent,
            record,
            ratio: record.ratio(),
            win_percentage: record.ratio().percentage(),
        })
        .collect()
}

fn count_riders(standings: &[CandidateStanding]) -> Vec<RiderCount> {
    let mut sorted: Vec<&CandidateStanding> = standings.iter().collect();
    sorted.sort_by_key(|s| (Reverse(s.riders), s.key.clone()));
    let ranks = competition_ranks(&sorted, |s| s.riders);
    sorted
        .iter()
        .zip(ranks)
        .map(|(s, rank)| RiderCount {
            rank,
            key: s.key.clone(),
            abbreviation: s.abbreviation.clone(),
            riders: s.riders,
        })
        .collect()
}

/// Computes the percentages and the rankings from the final state of the
/// tally. It does not modify the tally and can be run any number of times.
pub fn aggregate(registry: &Registry, tally: &Tally, rules: &PollRules) -> Aggregates {
    let standings: Vec<CandidateStanding> = registry
        .iter()
        .map(|(cid, _)| standing(registry, tally, cid))
        .collect();

    let mut qualified: Vec<CandidateStanding> = Vec::new();
    let mut insufficient_riders: Vec<CandidateStanding> = Vec::new();
    let mut no_riders: Vec<CandidateStanding> = Vec::new();
    for s in standings.iter() {
        match eligibility(s.riders, rules.min_riders) {
            Eligibility::Ranked => qualified.push(s.clone()),
            Eligibility::InsufficientRiders => insufficient_riders.push(s.clone()),
            Eligibility::NoRiders => no_riders.push(s.clone()),
        }
    }
    debug!(
        "aggregate: {} qualified, {} with too few riders, {} without riders",
        qualified.len(),
        insufficient_riders.len(),
        no_riders.len()
    );

    let ranking = rank_candidates(qualified);
    for rc in ranking.iter() {
        info!(
            "{:>4} {:8.3}% {:8.3}% {:>5} riders  {}",
            rc.rank,
            rc.standing.total_win_percentage,
            rc.standing.pairwise_win_percentage,
            rc.standing.riders,
            rc.standing.key
        );
    }

    let pairs = rank_pairs(registry, tally);
    let riders = count_riders(&standings);

    Aggregates {
        standings,
        ranking,
        insufficient_riders,
        no_riders,
        pairs,
        riders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{parse_ballot, read_master_list, SENTINEL_LINE};

    fn setup(keys: &[&str]) -> (Registry, Tally) {
        let mut lines = vec![SENTINEL_LINE.to_string()];
        for k in keys {
            lines.push(format!("0, {}, {}", k, k.to_lowercase()));
        }
        let reg = read_master_list(&lines).unwrap();
        let tally = Tally::new(reg.size());
        (reg, tally)
    }

    fn vote(reg: &Registry, tally: &mut Tally, rows: &[(u32, &str)]) {
        let mut lines = vec![SENTINEL_LINE.to_string()];
        for (r, k) in rows {
            lines.push(format!("{}, {}", r, k));
        }
        tally.record_ballot(&parse_ballot(&lines, reg).unwrap().ranking);
    }

    fn rules(min_riders: u32) -> PollRules {
        PollRules {
            min_riders,
            include_voter_info: false,
        }
    }

    #[test]
    fn competition_ranks_skip_after_ties() {
        assert_eq!(competition_ranks(&[9, 7, 7, 5, 5, 5, 1], |x| *x), vec![1, 2, 2, 4, 4, 4, 7]);
        let empty: Vec<u32> = Vec::new();
        assert!(competition_ranks(&empty[..], |x| *x).is_empty());
    }

    #[test]
    fn reference_scenario() {
        let (reg, mut tally) = setup(&["A", "B", "C"]);
        vote(&reg, &mut tally, &[(1, "A"), (2, "B"), (3, "C")]);
        vote(&reg, &mut tally, &[(1, "A"), (1, "B"), (3, "C")]);
        let agg = aggregate(&reg, &tally, &rules(1));

        let keys: Vec<&str> = agg.ranking.iter().map(|r| r.standing.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        let a = &agg.ranking[0];
        assert_eq!(a.rank, 1);
        assert_eq!(a.standing.total_win_percentage, 87.5);
        assert_eq!(
            a.standing.pairwise,
            Record {
                wins: 2,
                losses: 0,
                ties: 0
            }
        );
        assert_eq!(a.standing.pairwise_win_percentage, 100.0);
        // B: beat C twice, lost to A once, tied A once.
        assert_eq!(agg.ranking[1].standing.total_win_percentage, 62.5);
        assert_eq!(agg.ranking[2].standing.total_win_percentage, 0.0);

        let ab = agg
            .pairs
            .iter()
            .find(|p| p.candidate == "A" && p.opponent == "B")
            .unwrap();
        assert_eq!(ab.win_percentage, 75.0);
        assert_eq!(agg.pairs.len(), 6);
        assert_eq!(agg.pairs[0].win_percentage, 100.0);
        // A>C and B>C share the first place.
        assert_eq!(agg.pairs[0].rank, 1);
        assert_eq!(agg.pairs[1].rank, 1);
        assert_eq!(agg.pairs[2].rank, 3);
    }

    #[test]
    fn total_and_pairwise_percentages_differ() {
        // A beats B on three ballots but loses to C once.
        let (reg, mut tally) = setup(&["A", "B", "C"]);
        for _ in 0..3 {
            vote(&reg, &mut tally, &[(1, "A"), (2, "B")]);
        }
        vote(&reg, &mut tally, &[(2, "A"), (1, "C")]);
        let agg = aggregate(&reg, &tally, &rules(1));
        let a = agg.standings.iter().find(|s| s.key == "A").unwrap();
        assert_eq!(a.total_win_percentage, 75.0);
        assert_eq!(a.pairwise_win_percentage, 50.0);
    }

    #[test]
    fn ties_share_rank() {
        let (reg, mut tally) = setup(&["D", "C", "B", "A"]);
        vote(&reg, &mut tally, &[(1, "A"), (1, "B"), (2, "C"), (3, "D")]);
        let agg = aggregate(&reg, &tally, &rules(1));
        let rows: Vec<(u32, &str)> = agg
            .ranking
            .iter()
            .map(|r| (r.rank, r.standing.key.as_str()))
            .collect();
        assert_eq!(rows, vec![(1, "A"), (1, "B"), (3, "C"), (4, "D")]);
        assert_eq!(agg.ranking[0].tied_with, vec!["B".to_string()]);
        assert_eq!(agg.ranking[1].tied_with, vec!["A".to_string()]);
        assert!(agg.ranking[2].tied_with.is_empty());
    }

    #[test]
    fn equal_percentages_with_different_contests_tie() {
        let (reg, mut tally) = setup(&["A", "B", "C", "D"]);
        // A: 1 win and 1 loss. B: 2 wins and 2 losses.
        vote(&reg, &mut tally, &[(1, "A"), (2, "C")]);
        vote(&reg, &mut tally, &[(1, "D"), (2, "A")]);
        vote(&reg, &mut tally, &[(1, "B"), (2, "C"), (2, "D")]);
        vote(&reg, &mut tally, &[(1, "C"), (1, "D"), (2, "B")]);
        let agg = aggregate(&reg, &tally, &rules(1));
        let a = agg.ranking.iter().find(|r| r.standing.key == "A").unwrap();
        let b = agg.ranking.iter().find(|r| r.standing.key == "B").unwrap();
        assert_eq!(a.standing.total_win_percentage, 50.0);
        assert_eq!(b.standing.total_win_percentage, 50.0);
        assert_eq!(a.rank, b.rank);
    }

    #[test]
    fn eligibility_boundary() {
        let (reg, mut tally) = setup(&["A", "B", "C"]);
        vote(&reg, &mut tally, &[(1, "A"), (2, "B")]);
        vote(&reg, &mut tally, &[(1, "A"), (2, "B")]);
        vote(&reg, &mut tally, &[(1, "A")]);
        let agg = aggregate(&reg, &tally, &rules(3));
        let ranked: Vec<&str> = agg.ranking.iter().map(|r| r.standing.key.as_str()).collect();
        assert_eq!(ranked, vec!["A"]);
        assert_eq!(agg.insufficient_riders.len(), 1);
        assert_eq!(agg.insufficient_riders[0].key, "B");
        assert_eq!(agg.no_riders.len(), 1);
        assert_eq!(agg.no_riders[0].key, "C");

        assert_eq!(eligibility(3, 3), Eligibility::Ranked);
        assert_eq!(eligibility(2, 3), Eligibility::InsufficientRiders);
        assert_eq!(eligibility(0, 0), Eligibility::NoRiders);
    }

    #[test]
    fn riders_table() {
        let (reg, mut tally) = setup(&["A", "B", "C"]);
        vote(&reg, &mut tally, &[(1, "B"), (2, "C")]);
        vote(&reg, &mut tally, &[(1, "C"), (2, "B")]);
        vote(&reg, &mut tally, &[(1, "A")]);
        let agg = aggregate(&reg, &tally, &rules(1));
        let rows: Vec<(u32, &str, u64)> = agg
            .riders
            .iter()
            .map(|r| (r.rank, r.key.as_str(), r.riders))
            .collect();
        assert_eq!(rows, vec![(1, "B", 2), (1, "C", 2), (3, "A", 1)]);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let (reg, mut tally) = setup(&["A", "B", "C"]);
        vote(&reg, &mut tally, &[(3, "A"), (1, "B"), (2, "C")]);
        vote(&reg, &mut tally, &[(1, "A"), (1, "C")]);
        let first = aggregate(&reg, &tally, &rules(1));
        let second = aggregate(&reg, &tally, &rules(1));
        assert_eq!(first, second);
    }
}

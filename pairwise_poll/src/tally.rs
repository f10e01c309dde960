use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::AddAssign;

use crate::ballot::Ranking;
use crate::registry::CandidateId;

/// An ordered pair of distinct candidates: the first one is the candidate the
/// statistics are counted for.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) struct PairKey(pub CandidateId, pub CandidateId);

/// Wins, losses and ties, seen from one side.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Hash)]
pub struct Record {
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
}

impl Record {
    pub const EMPTY: Record = Record {
        wins: 0,
        losses: 0,
        ties: 0,
    };

    pub fn contests(&self) -> u64 {
        self.wins + self.losses + self.ties
    }

    /// The same contests seen from the opponent.
    pub fn flipped(&self) -> Record {
        Record {
            wins: self.losses,
            losses: self.wins,
            ties: self.ties,
        }
    }

    pub fn ratio(&self) -> WinRatio {
        WinRatio::new(self.wins, self.ties, self.contests())
    }

    fn add_outcome(&mut self, outcome: Ordering) {
        match outcome {
            Ordering::Less => self.wins += 1,
            Ordering::Greater => self.losses += 1,
            Ordering::Equal => self.ties += 1,
        }
    }
}

impl AddAssign for Record {
    fn add_assign(&mut self, rhs: Record) {
        self.wins += rhs.wins;
        self.losses += rhs.losses;
        self.ties += rhs.ties;
    }
}

impl std::iter::Sum for Record {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut res = Record::EMPTY;
        for r in iter {
            res += r;
        }
        res
    }
}

/// `(wins + ties / 2) / contests`, kept as an exact fraction so that equal
/// scores compare equal whatever the number of contests.
///
/// A ratio without any contest counts as zero.
#[derive(Debug, Clone, Copy)]
pub struct WinRatio {
    // Twice the score, to keep half ties integral.
    points_x2: u64,
    contests: u64,
}

impl WinRatio {
    pub const ZERO: WinRatio = WinRatio {
        points_x2: 0,
        contests: 0,
    };

    pub fn new(wins: u64, ties: u64, contests: u64) -> WinRatio {
        WinRatio {
            points_x2: 2 * wins + ties,
            contests,
        }
    }

    pub fn has_contests(&self) -> bool {
        self.contests > 0
    }

    /// The win percentage, between 0 and 100.
    pub fn percentage(&self) -> f64 {
        if self.contests == 0 {
            0.0
        } else {
            (self.points_x2 as f64 / 2.0) / (self.contests as f64) * 100.0
        }
    }

    fn fraction(&self) -> (u128, u128) {
        if self.contests == 0 {
            (0, 1)
        } else {
            (self.points_x2 as u128, 2 * self.contests as u128)
        }
    }
}

impl PartialEq for WinRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WinRatio {}

impl PartialOrd for WinRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WinRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        let (n1, d1) = self.fraction();
        let (n2, d2) = other.fraction();
        (n1 * d2).cmp(&(n2 * d1))
    }
}

/// Counters accumulated for one candidate across all ballots.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct CandidateTotals {
    /// Number of valid ballots that ranked this candidate.
    pub riders: u64,
    /// All the contests against every opponent.
    pub record: Record,
}

/// The pairwise tally engine.
///
/// All the `n² - n` cells are created up front. Every ballot updates both
/// orderings of each pair it ranks, so `cell(a, b)` is always the flip of
/// `cell(b, a)`.
///
/// Only the [`crate::builder::Builder`] feeds a tally, with rankings checked
/// against the same registry:
///
/// ```compile_fail
/// let mut tally = pairwise_poll::Tally::new(2);
/// ```
#[derive(Debug, Clone)]
pub struct Tally {
    num_candidates: usize,
    cells: HashMap<PairKey, Record>,
    totals: Vec<CandidateTotals>,
    valid_ballots: u64,
    total_credits: u64,
}

impl Tally {
    pub(crate) fn new(num_candidates: usize) -> Tally {
        let mut cells: HashMap<PairKey, Record> =
            HashMap::with_capacity(num_candidates * num_candidates.saturating_sub(1));
        for a in 0..num_candidates {
            for b in 0..num_candidates {
                if a != b {
                    cells.insert(
                        PairKey(CandidateId(a as u32), CandidateId(b as u32)),
                        Record::EMPTY,
                    );
                }
            }
        }
        debug!("Tally::new: {} candidates, {} cells", num_candidates, cells.len());
        Tally {
            num_candidates,
            cells,
            totals: vec![CandidateTotals::default(); num_candidates],
            valid_ballots: 0,
            total_credits: 0,
        }
    }

    /// Records a valid ballot: one more rider for each ranked candidate, then
    /// the pairwise contests.
    ///
    /// Feeding the same ballot twice counts it twice.
    pub(crate) fn record_ballot(&mut self, ranking: &Ranking) {
        self.valid_ballots += 1;
        self.total_credits += ranking.len() as u64;
        for (cid, _) in ranking.iter() {
            self.totals[cid.index()].riders += 1;
        }
        self.tally(ranking);
    }

    /// Compares every ordered pair of candidates present in the ranking.
    pub(crate) fn tally(&mut self, ranking: &Ranking) {
        let ranks: Vec<(CandidateId, u32)> = ranking.iter().collect();
        for (a, rank_a) in ranks.iter() {
            for (b, rank_b) in ranks.iter() {
                if a == b {
                    continue;
                }
                // A lower rank number is preferred.
                let outcome = rank_a.cmp(rank_b);
                if let Some(cell) = self.cells.get_mut(&PairKey(*a, *b)) {
                    cell.add_outcome(outcome);
                }
                self.totals[a.index()].record.add_outcome(outcome);
            }
        }
    }

    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    pub fn valid_ballots(&self) -> u64 {
        self.valid_ballots
    }

    /// Sum of the number of ranked candidates over all the valid ballots.
    pub fn total_credits(&self) -> u64 {
        self.total_credits
    }

    pub(crate) fn cell(&self, a: CandidateId, b: CandidateId) -> Record {
        self.cells
            .get(&PairKey(a, b))
            .cloned()
            .unwrap_or(Record::EMPTY)
    }

    pub(crate) fn totals(&self, cid: CandidateId) -> CandidateTotals {
        self.totals[cid.index()]
    }

    /// The cells with at least one contest, in a stable order.
    pub(crate) fn contested_cells(&self) -> Vec<(PairKey, Record)> {
        let mut res: Vec<(PairKey, Record)> = self
            .cells
            .iter()
            .filter(|(_, r)| r.contests() > 0)
            .map(|(k, r)| (*k, *r))
            .collect();
        res.sort_by_key(|(k, _)| *k);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{parse_ballot, read_master_list};
    use crate::registry::Registry;

    fn registry() -> Registry {
        read_master_list(&[
            "! DO NOT CHANGE OR DELETE THIS LINE !",
            "0, A, a",
            "0, B, b",
            "0, C, c",
        ])
        .unwrap()
    }

    fn ranking(reg: &Registry, rows: &[(u32, &str)]) -> Ranking {
        let mut lines = vec![crate::ballot::SENTINEL_LINE.to_string()];
        for (r, k) in rows {
            lines.push(format!("{}, {}", r, k));
        }
        parse_ballot(&lines, reg).unwrap().ranking
    }

    fn id(reg: &Registry, key: &str) -> CandidateId {
        reg.id_of(key).unwrap()
    }

    #[test]
    fn cells_are_created_up_front() {
        let t = Tally::new(4);
        assert_eq!(t.cells.len(), 12);
        assert!(t.contested_cells().is_empty());
    }

    #[test]
    fn two_ballots() {
        let reg = registry();
        let mut t = Tally::new(reg.size());
        t.record_ballot(&ranking(&reg, &[(1, "A"), (2, "B"), (3, "C")]));
        t.record_ballot(&ranking(&reg, &[(1, "A"), (1, "B"), (3, "C")]));

        let (a, b, c) = (id(&reg, "A"), id(&reg, "B"), id(&reg, "C"));
        assert_eq!(
            t.cell(a, b),
            Record {
                wins: 1,
                losses: 0,
                ties: 1
            }
        );
        assert_eq!(t.cell(b, a), t.cell(a, b).flipped());
        assert_eq!(t.cell(c, a).losses, 2);
        assert_eq!(
            t.totals(a).record,
            Record {
                wins: 3,
                losses: 0,
                ties: 1
            }
        );
        assert_eq!(t.totals(a).riders, 2);
        assert_eq!(t.valid_ballots(), 2);
        assert_eq!(t.total_credits(), 6);
        assert_eq!(t.cell(a, b).ratio().percentage(), 75.0);
        assert_eq!(t.totals(a).record.ratio().percentage(), 87.5);
    }

    #[test]
    fn cells_stay_complementary_and_totals_add_up() {
        let reg = registry();
        let mut t = Tally::new(reg.size());
        t.record_ballot(&ranking(&reg, &[(2, "A"), (1, "B")]));
        t.record_ballot(&ranking(&reg, &[(5, "C"), (1, "B"), (5, "A")]));
        t.record_ballot(&ranking(&reg, &[(1, "C"), (0, "B"), (4, "A")]));
        t.record_ballot(&ranking(&reg, &[]));

        for (x, _) in reg.iter() {
            let mut sum = Record::EMPTY;
            for (y, _) in reg.iter() {
                if x == y {
                    continue;
                }
                assert_eq!(t.cell(x, y), t.cell(y, x).flipped());
                sum += t.cell(x, y);
            }
            assert_eq!(t.totals(x).record, sum);
        }
        assert_eq!(t.totals(id(&reg, "B")).riders, 2);
        assert_eq!(t.valid_ballots(), 4);
    }

    #[test]
    fn ratios_compare_exactly() {
        assert_eq!(WinRatio::new(1, 0, 2), WinRatio::new(2, 0, 4));
        assert_eq!(WinRatio::new(0, 2, 2), WinRatio::new(1, 0, 2));
        // 2/3 against 3.5/5
        assert!(WinRatio::new(2, 0, 3) < WinRatio::new(3, 1, 5));
        assert!(WinRatio::new(3, 0, 4) > WinRatio::new(3, 1, 5));
        assert_eq!(WinRatio::ZERO, WinRatio::new(0, 0, 7));
        assert!(WinRatio::ZERO < WinRatio::new(0, 1, 7));
        assert_eq!(WinRatio::ZERO.percentage(), 0.0);
    }
}

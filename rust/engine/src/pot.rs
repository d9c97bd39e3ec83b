use crate::cards::Card;

/// Chips one seat put into the pot over the whole hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub seat: usize,
    pub amount: u32,
    pub folded: bool,
}

/// A main or side pot and the seats that can win it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pot {
    pub amount: u32,
    pub eligible: Vec<usize>,
}

/// Splits hand contributions into a main pot and side pots.
///
/// Pots are built by contribution layers: every distinct contribution level
/// closes a layer whose chips can be won by the non-folded seats that reached
/// it. Neighbouring layers with the same eligible seats are merged. A layer
/// nobody live reached (chips a folded seat put in above every live seat)
/// falls back to all live seats, so chips are never stranded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PotManager {
    pots: Vec<Pot>,
}

impl PotManager {
    pub fn new(contributions: &[Contribution]) -> Self {
        let mut levels: Vec<u32> = contributions
            .iter()
            .map(|c| c.amount)
            .filter(|&a| a > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let live: Vec<usize> = contributions
            .iter()
            .filter(|c| !c.folded)
            .map(|c| c.seat)
            .collect();

        let mut pots: Vec<Pot> = Vec::new();
        let mut previous = 0;
        for level in levels {
            let amount: u32 = contributions
                .iter()
                .map(|c| c.amount.min(level) - c.amount.min(previous))
                .sum();
            previous = level;

            let mut eligible: Vec<usize> = contributions
                .iter()
                .filter(|c| !c.folded && c.amount >= level)
                .map(|c| c.seat)
                .collect();
            if eligible.is_empty() {
                eligible = live.clone();
            }

            match pots.last_mut() {
                Some(last) if last.eligible == eligible => last.amount += amount,
                _ => pots.push(Pot { amount, eligible }),
            }
        }

        Self { pots }
    }

    /// Pots for seats that all stayed in the hand, indexed by position in `amounts`.
    pub fn from_contributions(amounts: impl IntoIterator<Item = u32>) -> Self {
        let contributions: Vec<Contribution> = amounts
            .into_iter()
            .enumerate()
            .map(|(seat, amount)| Contribution {
                seat,
                amount,
                folded: false,
            })
            .collect();
        Self::new(&contributions)
    }

    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    pub fn main_pot(&self) -> u32 {
        self.pots.first().map_or(0, |p| p.amount)
    }

    pub fn side_pots(&self) -> Vec<u32> {
        self.pots.iter().skip(1).map(|p| p.amount).collect()
    }

    pub fn total(&self) -> u32 {
        self.pots.iter().map(|p| p.amount).sum()
    }

    /// Resolves every pot into per-seat awards.
    ///
    /// `pick` receives the eligible seats of a contested pot and returns its
    /// winners; an empty answer splits the pot among all eligible seats. Odd
    /// chips go one at a time to winners in `order` (clockwise from the dealer).
    pub fn distribute<F>(&self, order: &[usize], mut pick: F) -> Vec<(usize, u32)>
    where
        F: FnMut(&[usize]) -> Vec<usize>,
    {
        let mut awards: Vec<(usize, u32)> = Vec::new();
        for pot in &self.pots {
            if pot.amount == 0 || pot.eligible.is_empty() {
                continue;
            }
            let mut winners = if pot.eligible.len() == 1 {
                pot.eligible.clone()
            } else {
                pick(&pot.eligible)
            };
            winners.retain(|w| pot.eligible.contains(w));
            if winners.is_empty() {
                winners = pot.eligible.clone();
            }
            winners.sort_by_key(|w| order.iter().position(|o| o == w).unwrap_or(usize::MAX));
            winners.dedup();

            let count = winners.len() as u32;
            let share = pot.amount / count;
            let mut remainder = pot.amount % count;
            for &winner in &winners {
                let mut amount = share;
                if remainder > 0 {
                    amount += 1;
                    remainder -= 1;
                }
                match awards.iter_mut().find(|(seat, _)| *seat == winner) {
                    Some((_, total)) => *total += amount,
                    None => awards.push((winner, amount)),
                }
            }
        }
        awards
    }
}

/// Decides who wins a contested pot at showdown.
///
/// Hand-strength evaluation lives outside this crate; plug an evaluator in
/// here. Contenders are `(seat index, hole cards)`.
pub trait ShowdownJudge: Send {
    fn winners(&self, contenders: &[(usize, [Card; 2])], board: &[Card]) -> Vec<usize>;
}

/// Treats every contender as tied, so contested pots are split evenly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitPot;

impl ShowdownJudge for SplitPot {
    fn winners(&self, contenders: &[(usize, [Card; 2])], _board: &[Card]) -> Vec<usize> {
        contenders.iter().map(|(seat, _)| *seat).collect()
    }
}

use crate::cards::Card;
use serde::{Deserialize, Serialize};

/// Betting status of a seat within one hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Still owes decisions when action reaches it
    Active,
    /// Gave up the hand; never acts again
    Folded,
    /// Committed its whole stack; still eligible to win
    AllIn,
}

/// One position at the table with its chip stack.
///
/// Stacks move only through [`Seat::commit`] and [`Seat::award`], both of
/// which are crate-private so that the betting engine is the single writer.
#[derive(Debug, Clone)]
pub struct Seat {
    /// 1-based table position
    position: usize,
    stack: u32,
    starting_stack: u32,
    is_human: bool,
    hole: Option<[Card; 2]>,
    status: SeatStatus,
    /// Chips put in during the current street
    committed: u32,
    /// Chips put in over the whole hand
    contributed: u32,
}

impl Seat {
    pub fn new(position: usize, stack: u32, is_human: bool) -> Self {
        Self {
            position,
            stack,
            starting_stack: stack,
            is_human,
            hole: None,
            status: SeatStatus::Active,
            committed: 0,
            contributed: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }
    pub fn stack(&self) -> u32 {
        self.stack
    }
    pub fn starting_stack(&self) -> u32 {
        self.starting_stack
    }
    pub fn is_human(&self) -> bool {
        self.is_human
    }
    pub fn hole_cards(&self) -> Option<[Card; 2]> {
        self.hole
    }
    pub fn status(&self) -> SeatStatus {
        self.status
    }
    pub fn committed(&self) -> u32 {
        self.committed
    }
    pub fn contributed(&self) -> u32 {
        self.contributed
    }

    pub fn is_folded(&self) -> bool {
        self.status == SeatStatus::Folded
    }

    /// True when the seat can still be asked to act.
    pub fn can_act(&self) -> bool {
        self.status == SeatStatus::Active
    }

    pub fn net(&self) -> i64 {
        i64::from(self.stack) - i64::from(self.starting_stack)
    }

    pub(crate) fn give_hole(&mut self, cards: [Card; 2]) {
        self.hole = Some(cards);
    }

    pub(crate) fn fold(&mut self) {
        self.status = SeatStatus::Folded;
    }

    /// Moves up to `amount` chips from the stack into the pot and returns the
    /// number actually moved. An emptied stack marks the seat all-in.
    pub(crate) fn commit(&mut self, amount: u32) -> u32 {
        let moved = amount.min(self.stack);
        self.stack -= moved;
        self.committed += moved;
        self.contributed += moved;
        if self.stack == 0 && self.status == SeatStatus::Active {
            self.status = SeatStatus::AllIn;
        }
        moved
    }

    pub(crate) fn award(&mut self, amount: u32) {
        self.stack = self.stack.saturating_add(amount);
    }

    pub(crate) fn reset_street(&mut self) {
        self.committed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_moves_chips_and_tracks_totals() {
        let mut seat = Seat::new(3, 1_000, false);
        assert_eq!(seat.commit(40), 40);
        assert_eq!(seat.stack(), 960);
        assert_eq!(seat.committed(), 40);
        seat.reset_street();
        assert_eq!(seat.commit(100), 100);
        assert_eq!(seat.committed(), 100);
        assert_eq!(seat.contributed(), 140);
        assert_eq!(seat.net(), -140);
    }

    #[test]
    fn committing_whole_stack_goes_all_in() {
        let mut seat = Seat::new(1, 30, true);
        assert_eq!(seat.commit(40), 30);
        assert_eq!(seat.stack(), 0);
        assert_eq!(seat.status(), SeatStatus::AllIn);
        assert!(!seat.can_act());
    }

    #[test]
    fn folded_seat_stays_folded_when_awarded() {
        let mut seat = Seat::new(2, 100, false);
        seat.fold();
        seat.award(10);
        assert!(seat.is_folded());
        assert_eq!(seat.net(), 10);
    }
}

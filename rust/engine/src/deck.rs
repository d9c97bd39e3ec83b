use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// Where the hand state machine gets its cards from.
///
/// Implementations must never hand out the same card twice within a hand.
pub trait CardSource {
    fn deal_hole(&mut self) -> Result<Card, GameError>;

    fn deal_board(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        (0..n).map(|_| self.deal_hole()).collect()
    }

    fn burn(&mut self) -> Result<(), GameError> {
        self.deal_hole().map(|_| ())
    }
}

#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    /// A shuffled deck whose order is fully determined by `seed`.
    pub fn new_with_seed(seed: u64) -> Self {
        let mut deck = Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
        };
        deck.shuffle();
        deck
    }

    /// A shuffled deck seeded from the thread-local generator.
    pub fn new_random() -> Self {
        let mut deck = Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::from_rng(&mut rand::rng()),
        };
        deck.shuffle();
        deck
    }

    /// Deals `cards` front to back without shuffling. Unlisted cards are never dealt.
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self {
            cards,
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(0),
        }
    }

    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        if self.position >= self.cards.len() {
            None
        } else {
            let c = self.cards[self.position];
            self.position += 1;
            Some(c)
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

impl CardSource for Deck {
    fn deal_hole(&mut self) -> Result<Card, GameError> {
        self.deal_card().ok_or(GameError::DeckExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_order() {
        let mut a = Deck::new_with_seed(42);
        let mut b = Deck::new_with_seed(42);
        for _ in 0..52 {
            assert_eq!(a.deal_card(), b.deal_card());
        }
        assert_eq!(a.deal_card(), None);
    }

    #[test]
    fn deals_unique_cards_until_exhausted() {
        let mut deck = Deck::new_with_seed(7);
        let mut seen = HashSet::new();
        while let Ok(card) = deck.deal_hole() {
            assert!(seen.insert(card));
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(deck.burn(), Err(GameError::DeckExhausted));
    }

    #[test]
    fn burn_and_board_consume_in_order() {
        let as_ = Card::new(Rank::Ace, Suit::Spades);
        let kd = Card::new(Rank::King, Suit::Diamonds);
        let qh = Card::new(Rank::Queen, Suit::Hearts);
        let mut deck = Deck::stacked(vec![as_, kd, qh]);
        deck.burn().expect("burn");
        assert_eq!(deck.deal_board(2).expect("board"), vec![kd, qh]);
        assert_eq!(deck.remaining(), 0);
    }
}

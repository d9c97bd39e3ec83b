use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::cards::{format_cards, Card};
use crate::errors::GameError;
use crate::player::PlayerAction;
use crate::pot::{Contribution, PotManager, ShowdownJudge};
use crate::rules::{self, ValidatedAction};
use crate::seat::{Seat, SeatStatus};

/// Represents a betting street in Texas Hold'em poker.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    /// Before flop (hole cards dealt)
    Preflop,
    /// After flop (3 community cards)
    Flop,
    /// After turn (4th community card)
    Turn,
    /// After river (5th community card)
    River,
}

impl Street {
    /// Board size once this street has been dealt.
    pub fn board_len(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River => 5,
        }
    }

    pub fn next(self) -> Option<Street> {
        match self {
            Street::Preflop => Some(Street::Flop),
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            Street::River => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Street::Preflop => "Preflop",
            Street::Flop => "Flop",
            Street::Turn => "Turn",
            Street::River => "River",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandStatus {
    Running,
    Finished,
}

/// Fixed parameters of one hand. Copied into the hand at start, never shared.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub num_players: usize,
    /// 0-based index of the dealer button
    pub dealer_index: usize,
    /// 0-based index of the human-controlled seat
    pub human_seat: usize,
    pub starting_stack: u32,
    pub small_blind: u32,
    pub big_blind: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            num_players: 6,
            dealer_index: 0,
            human_seat: 0,
            starting_stack: 10_000,
            small_blind: 20,
            big_blind: 40,
        }
    }
}

impl TableConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 10;

    pub fn validate(&self) -> Result<(), GameError> {
        if !(Self::MIN_PLAYERS..=Self::MAX_PLAYERS).contains(&self.num_players) {
            return Err(GameError::InvalidTable(format!(
                "num_players must be between {} and {}, got {}",
                Self::MIN_PLAYERS,
                Self::MAX_PLAYERS,
                self.num_players
            )));
        }
        if self.dealer_index >= self.num_players {
            return Err(GameError::InvalidTable(format!(
                "dealer_index {} is outside a {}-seat table",
                self.dealer_index, self.num_players
            )));
        }
        if self.human_seat >= self.num_players {
            return Err(GameError::InvalidTable(format!(
                "human_seat {} is outside a {}-seat table",
                self.human_seat, self.num_players
            )));
        }
        if self.small_blind == 0 || self.small_blind > self.big_blind {
            return Err(GameError::InvalidTable(format!(
                "blinds must satisfy 0 < small ({}) <= big ({})",
                self.small_blind, self.big_blind
            )));
        }
        if self.big_blind > self.starting_stack {
            return Err(GameError::InvalidTable(format!(
                "starting stack {} cannot cover the big blind {}",
                self.starting_stack, self.big_blind
            )));
        }
        Ok(())
    }

    /// Index of the small blind. Heads-up the dealer posts it.
    pub fn small_blind_index(&self) -> usize {
        if self.num_players == 2 {
            self.dealer_index
        } else {
            (self.dealer_index + 1) % self.num_players
        }
    }

    pub fn big_blind_index(&self) -> usize {
        (self.small_blind_index() + 1) % self.num_players
    }
}

/// One choice currently open to the seat due to act.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LegalAction {
    Fold,
    Check,
    Call { amount: u32 },
    Bet { min: u32, max: u32 },
    Raise { min: u32, max: u32 },
    AllIn { amount: u32 },
}

/// The hand state machine: seats, street, pot, current bet, the to-act
/// queue, the board and the append-only action log.
///
/// Every query is total. With no seat due to act (between streets or after
/// the hand finished) the legality queries answer `false`, [`HandState::actor`]
/// answers `None` and [`HandState::legal_actions`] is empty.
#[derive(Debug, Clone)]
pub struct HandState {
    config: TableConfig,
    seats: Vec<Seat>,
    street: Street,
    status: HandStatus,
    pot: u32,
    current_bet: u32,
    to_act: VecDeque<usize>,
    board: Vec<Card>,
    log: Vec<String>,
}

impl HandState {
    pub fn new(config: TableConfig) -> Result<Self, GameError> {
        config.validate()?;
        let seats = (0..config.num_players)
            .map(|i| Seat::new(i + 1, config.starting_stack, i == config.human_seat))
            .collect();
        Ok(Self {
            config,
            seats,
            street: Street::Preflop,
            status: HandStatus::Running,
            pot: 0,
            current_bet: 0,
            to_act: VecDeque::new(),
            board: Vec::with_capacity(5),
            log: Vec::new(),
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }
    pub fn seat(&self, idx: usize) -> Option<&Seat> {
        self.seats.get(idx)
    }
    pub fn street(&self) -> Street {
        self.street
    }
    pub fn status(&self) -> HandStatus {
        self.status
    }
    pub fn is_finished(&self) -> bool {
        self.status == HandStatus::Finished
    }
    pub fn pot(&self) -> u32 {
        self.pot
    }
    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }
    pub fn board(&self) -> &[Card] {
        &self.board
    }
    pub fn log(&self) -> &[String] {
        &self.log
    }
    pub fn to_act(&self) -> impl Iterator<Item = usize> + '_ {
        self.to_act.iter().copied()
    }
    pub fn human_seat(&self) -> usize {
        self.config.human_seat
    }

    /// Chips on the table: every stack plus the pot.
    pub fn total_chips(&self) -> u64 {
        self.seats.iter().map(|s| u64::from(s.stack())).sum::<u64>() + u64::from(self.pot)
    }

    /// Seats that have not folded.
    pub fn remaining_players(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_folded()).count()
    }

    /// Seats that can still put chips in.
    pub fn players_able_to_bet(&self) -> usize {
        self.seats.iter().filter(|s| s.can_act()).count()
    }

    /// The single seat due to act, if any.
    pub fn actor(&self) -> Option<usize> {
        if self.is_finished() {
            return None;
        }
        self.to_act.front().copied()
    }

    pub fn to_call_for(&self, idx: usize) -> u32 {
        self.seats.get(idx).map_or(0, |s| {
            self.current_bet
                .saturating_sub(s.committed())
                .min(s.stack())
        })
    }

    /// Chips the actor owes, already capped at its stack. Zero with no actor.
    pub fn to_call(&self) -> u32 {
        self.actor().map_or(0, |idx| self.to_call_for(idx))
    }

    pub fn can_fold(&self) -> bool {
        self.actor().is_some()
    }

    pub fn can_check_or_call(&self) -> bool {
        self.actor().is_some()
    }

    pub fn can_bet_or_raise(&self) -> bool {
        let Some(idx) = self.actor() else {
            return false;
        };
        let stack = self.seats[idx].stack();
        let owed = self.current_bet.saturating_sub(self.seats[idx].committed());
        if owed == 0 {
            stack > 0
        } else {
            stack > owed
        }
    }

    /// Smallest legal bet or raise for the actor, capped at its stack.
    pub fn min_bet_or_raise(&self) -> Option<u32> {
        let idx = self.actor()?;
        if !self.can_bet_or_raise() {
            return None;
        }
        Some(rules::min_bet_or_raise(
            self.seats[idx].stack(),
            self.to_call(),
            self.config.big_blind,
        ))
    }

    pub fn legal_actions(&self) -> Vec<LegalAction> {
        let Some(idx) = self.actor() else {
            return Vec::new();
        };
        let stack = self.seats[idx].stack();
        let to_call = self.to_call();
        let mut actions = vec![LegalAction::Fold];
        if to_call == 0 {
            actions.push(LegalAction::Check);
        } else if to_call < stack {
            actions.push(LegalAction::Call { amount: to_call });
        }
        if let Some(min) = self.min_bet_or_raise() {
            // a minimum equal to the stack is only reachable as an all-in
            if min < stack {
                let open = if to_call == 0 {
                    LegalAction::Bet { min, max: stack }
                } else {
                    LegalAction::Raise { min, max: stack }
                };
                actions.push(open);
            }
        }
        if stack > 0 {
            actions.push(LegalAction::AllIn { amount: stack });
        }
        actions
    }

    /// Checks `action` for the seat due to act without touching any state.
    pub fn validate_for_actor(
        &self,
        action: PlayerAction,
    ) -> Result<(usize, ValidatedAction), GameError> {
        if self.is_finished() {
            return Err(GameError::HandAlreadyComplete);
        }
        let idx = self
            .actor()
            .ok_or_else(|| GameError::illegal("no seat is due to act"))?;
        let seat = &self.seats[idx];
        let owed = self.current_bet.saturating_sub(seat.committed());
        let validated =
            rules::validate_action(seat.stack(), owed, self.config.big_blind, action)?;
        Ok((idx, validated))
    }

    pub(crate) fn deal_hole(&mut self, idx: usize, cards: [Card; 2]) {
        if let Some(seat) = self.seats.get_mut(idx) {
            seat.give_hole(cards);
        }
    }

    /// Posts both blinds and queues preflop action: left of the big blind
    /// around to the big blind, which keeps its option.
    pub(crate) fn post_blinds(&mut self) {
        let sb = self.config.small_blind_index();
        let bb = self.config.big_blind_index();
        let posted_sb = self.commit(sb, self.config.small_blind);
        self.push_log(format!(
            "Player {} posts small blind - {} chips",
            self.seats[sb].position(),
            posted_sb
        ));
        let posted_bb = self.commit(bb, self.config.big_blind);
        self.push_log(format!(
            "Player {} posts big blind - {} chips",
            self.seats[bb].position(),
            posted_bb
        ));
        self.current_bet = self.seats[sb].committed().max(self.seats[bb].committed());
        self.to_act = self.order_after(bb, true);
        self.settle_queue();
    }

    /// Applies an action produced by [`HandState::validate_for_actor`].
    pub(crate) fn apply(&mut self, idx: usize, action: ValidatedAction) {
        let position = self.seats[idx].position();
        let verb = PlayerAction::from(action).verb();
        let mut reopened = false;
        match action {
            ValidatedAction::Fold => {
                self.seats[idx].fold();
                self.push_log(format!("Player {position} {verb}"));
            }
            ValidatedAction::Check => {
                self.push_log(format!("Player {position} {verb}"));
            }
            ValidatedAction::Call(amount) => {
                let moved = self.commit(idx, amount);
                self.push_log(format!("Player {position} {verb} {moved} chips"));
            }
            ValidatedAction::Bet(amount) | ValidatedAction::Raise(amount) => {
                let moved = self.commit(idx, amount);
                self.push_log(format!("Player {position} {verb} {moved} chips"));
                reopened = self.raise_to(idx);
            }
            ValidatedAction::AllIn(amount) => {
                let moved = self.commit(idx, amount);
                self.push_log(format!("Player {position} {verb} with {moved} chips"));
                reopened = self.raise_to(idx);
            }
        }

        if reopened {
            self.to_act = self.order_after(idx, false);
        } else if self.to_act.front() == Some(&idx) {
            self.to_act.pop_front();
        } else {
            self.to_act.retain(|&i| i != idx);
        }
        self.settle_queue();
    }

    /// Reveals the next street's cards and queues postflop action from the
    /// left of the dealer. With fewer than two seats able to bet nobody is
    /// queued and the board simply runs out.
    pub(crate) fn open_street(&mut self, street: Street, cards: Vec<Card>) {
        self.street = street;
        self.board.extend_from_slice(&cards);
        self.push_log(format!("{}: {}", street.label(), format_cards(&cards)));
        for seat in &mut self.seats {
            seat.reset_street();
        }
        self.current_bet = 0;
        self.to_act = self.order_after(self.config.dealer_index, true);
        self.settle_queue();
    }

    /// Awards every pot and marks the hand finished. No-op once finished.
    pub(crate) fn award_pots(&mut self, judge: &dyn ShowdownJudge) {
        if self.is_finished() {
            return;
        }
        self.to_act.clear();

        let contested = self.remaining_players() > 1;
        if contested {
            let shows: Vec<String> = self
                .seats
                .iter()
                .filter(|s| !s.is_folded())
                .filter_map(|s| {
                    s.hole_cards()
                        .map(|h| format!("Player {} shows {}", s.position(), format_cards(&h)))
                })
                .collect();
            for line in shows {
                self.push_log(line);
            }
        }

        let contributions: Vec<Contribution> = self
            .seats
            .iter()
            .enumerate()
            .map(|(seat, s)| Contribution {
                seat,
                amount: s.contributed(),
                folded: s.is_folded(),
            })
            .collect();
        let manager = PotManager::new(&contributions);
        let n = self.seats.len();
        let order: Vec<usize> = (1..=n)
            .map(|k| (self.config.dealer_index + k) % n)
            .collect();

        let awards = {
            let seats = &self.seats;
            let board = &self.board;
            manager.distribute(&order, |eligible| {
                let contenders: Vec<(usize, [Card; 2])> = eligible
                    .iter()
                    .filter_map(|&i| seats.get(i).and_then(|s| s.hole_cards()).map(|h| (i, h)))
                    .collect();
                judge.winners(&contenders, board)
            })
        };

        for (idx, amount) in awards {
            let position = self.seats[idx].position();
            self.seats[idx].award(amount);
            self.pot = self.pot.saturating_sub(amount);
            self.push_log(format!("Player {position} wins {amount} chips"));
        }
        self.status = HandStatus::Finished;
        tracing::debug!(street = ?self.street, contested, "hand finished");
    }

    fn commit(&mut self, idx: usize, amount: u32) -> u32 {
        let moved = self.seats[idx].commit(amount);
        self.pot += moved;
        moved
    }

    /// Lifts the current bet to the seat's commitment. Returns true when the
    /// bet went up, which reopens action for everyone else.
    fn raise_to(&mut self, idx: usize) -> bool {
        let committed = self.seats[idx].committed();
        if committed > self.current_bet {
            self.current_bet = committed;
            true
        } else {
            false
        }
    }

    /// Seats that can act, clockwise starting left of `start`. `include_start`
    /// appends `start` itself last.
    fn order_after(&self, start: usize, include_start: bool) -> VecDeque<usize> {
        let n = self.seats.len();
        let last = if include_start { n } else { n - 1 };
        (1..=last)
            .map(|k| (start + k) % n)
            .filter(|&i| self.seats[i].can_act())
            .collect()
    }

    /// Drops seats that can no longer act. A lone seat left able to bet with
    /// nothing to call has nobody to bet against, so its turn is skipped.
    fn settle_queue(&mut self) {
        let seats = &self.seats;
        self.to_act.retain(|&i| seats[i].status() == SeatStatus::Active);
        if self.players_able_to_bet() <= 1 && self.to_act.iter().all(|&i| self.to_call_for(i) == 0)
        {
            self.to_act.clear();
        }
    }

    fn push_log(&mut self, line: String) {
        self.log.push(line);
    }
}

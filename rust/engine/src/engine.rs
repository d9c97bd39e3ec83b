use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::CardSource;
use crate::errors::GameError;
use crate::game::{HandState, Street, TableConfig};
use crate::logger::HandHistory;
use crate::player::PlayerAction;
use crate::pot::{ShowdownJudge, SplitPot};
use crate::rules::ValidatedAction;

/// What an automated seat sees when asked for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// 1-based position of the deciding seat
    pub seat: usize,
    pub street: Street,
    /// Chips owed, capped at the stack
    pub to_call: u32,
    pub stack: u32,
    /// Chips already committed this street
    pub committed: u32,
    pub current_bet: u32,
    pub pot: u32,
    pub big_blind: u32,
    /// Smallest legal bet or raise, capped at the stack
    pub min_raise: u32,
    pub board_len: usize,
}

impl DecisionContext {
    pub fn can_check(&self) -> bool {
        self.to_call == 0
    }

    /// Chips needed to match the current bet, ignoring the stack cap.
    pub fn owed(&self) -> u32 {
        self.current_bet.saturating_sub(self.committed)
    }

    /// Share of the final pot the seat would be paying to call.
    pub fn pot_odds(&self) -> f64 {
        if self.to_call == 0 {
            return 0.0;
        }
        f64::from(self.to_call) / (f64::from(self.pot) + f64::from(self.to_call))
    }
}

/// Chooses actions for automated seats.
///
/// Policies live outside the engine so tests can script exact sequences.
pub trait DecisionSource {
    fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction;
}

/// Betting action engine for one hand.
///
/// Owns the [`HandState`], the card source and the showdown judge. Every
/// mutation goes through [`Engine::run_automated`] or
/// [`Engine::apply_human_action`]; both leave the hand either waiting on the
/// human seat or finished.
///
/// # Examples
///
/// ```
/// use holdem_engine::deck::Deck;
/// use holdem_engine::engine::{DecisionContext, DecisionSource, Engine};
/// use holdem_engine::game::TableConfig;
/// use holdem_engine::player::PlayerAction;
///
/// struct AlwaysFold;
/// impl DecisionSource for AlwaysFold {
///     fn choose(&mut self, _ctx: &DecisionContext) -> PlayerAction {
///         PlayerAction::Fold
///     }
/// }
///
/// let config = TableConfig { num_players: 3, ..TableConfig::default() };
/// let mut engine = Engine::new(config, Box::new(Deck::new_with_seed(7))).unwrap();
/// let mut bots = AlwaysFold;
/// engine.run_automated(&mut bots).unwrap();
/// // the human dealer is first to act three-handed
/// assert_eq!(engine.state().actor(), Some(0));
///
/// engine.apply_human_action(PlayerAction::Fold, &mut bots).unwrap();
/// assert!(engine.is_finished());
/// let history = engine.finalize("demo").unwrap();
/// assert_eq!(history.net_by_seat().iter().map(|(_, n)| n).sum::<i64>(), 0);
/// assert!(engine.finalize("demo").is_none());
/// ```
pub struct Engine {
    state: HandState,
    cards: Box<dyn CardSource + Send>,
    judge: Box<dyn ShowdownJudge>,
    finalized: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(config: TableConfig, cards: Box<dyn CardSource + Send>) -> Result<Self, GameError> {
        Self::with_judge(config, cards, Box::new(SplitPot))
    }

    /// Starts a hand: validates the table, deals two hole cards per seat
    /// clockwise from the left of the dealer and posts the blinds.
    pub fn with_judge(
        config: TableConfig,
        mut cards: Box<dyn CardSource + Send>,
        judge: Box<dyn ShowdownJudge>,
    ) -> Result<Self, GameError> {
        let mut state = HandState::new(config)?;
        let n = config.num_players;
        let first = (config.dealer_index + 1) % n;
        let mut dealt: Vec<Vec<Card>> = vec![Vec::with_capacity(2); n];
        for _ in 0..2 {
            for k in 0..n {
                dealt[(first + k) % n].push(cards.deal_hole()?);
            }
        }
        for (idx, hole) in dealt.into_iter().enumerate() {
            if let [a, b] = hole[..] {
                state.deal_hole(idx, [a, b]);
            }
        }
        state.post_blinds();

        let mut engine = Self {
            state,
            cards,
            judge,
            finalized: false,
        };
        engine.advance()?;
        tracing::debug!(
            players = n,
            dealer = config.dealer_index,
            "hand started"
        );
        Ok(engine)
    }

    pub fn state(&self) -> &HandState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_human_turn(&self) -> bool {
        self.state.actor() == Some(self.state.human_seat())
    }

    pub fn human_hole_cards(&self) -> Option<[Card; 2]> {
        self.state
            .seat(self.state.human_seat())
            .and_then(|s| s.hole_cards())
    }

    pub fn decision_context(&self, idx: usize) -> Option<DecisionContext> {
        let seat = self.state.seat(idx)?;
        let to_call = self.state.to_call_for(idx);
        Some(DecisionContext {
            seat: seat.position(),
            street: self.state.street(),
            to_call,
            stack: seat.stack(),
            committed: seat.committed(),
            current_bet: self.state.current_bet(),
            pot: self.state.pot(),
            big_blind: self.state.config().big_blind,
            min_raise: crate::rules::min_bet_or_raise(
                seat.stack(),
                to_call,
                self.state.config().big_blind,
            ),
            board_len: self.state.board().len(),
        })
    }

    /// Lets automated seats act until the human seat is due or the hand is
    /// over. Returns how many automated actions were applied.
    ///
    /// A policy answer the rules reject is logged as an anomaly and the seat
    /// folds instead. If even a fold cannot be applied the loop stops. Only
    /// automated seats take this path: a rejected human action is returned
    /// by [`Engine::apply_human_action`] and changes nothing.
    pub fn run_automated<D>(&mut self, bots: &mut D) -> Result<usize, GameError>
    where
        D: DecisionSource + ?Sized,
    {
        let mut applied = 0;
        self.advance()?;
        while let Some(idx) = self.state.actor() {
            if idx == self.state.human_seat() {
                break;
            }
            let Some(ctx) = self.decision_context(idx) else {
                break;
            };
            let choice = bots.choose(&ctx);
            let (actor, validated) = match self.state.validate_for_actor(choice) {
                Ok(ok) => ok,
                Err(err) => {
                    tracing::warn!(
                        seat = ctx.seat,
                        action = ?choice,
                        error = %err,
                        "automated seat chose an illegal action, folding"
                    );
                    match self.state.validate_for_actor(PlayerAction::Fold) {
                        Ok(ok) => ok,
                        Err(err) => {
                            tracing::error!(seat = ctx.seat, error = %err, "automated seat cannot act");
                            break;
                        }
                    }
                }
            };
            self.apply(actor, validated)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Applies the human seat's action, first letting automated seats ahead
    /// of it act and afterwards running them again.
    ///
    /// A rejected action returns the error and leaves the hand exactly as it
    /// was after the automated seats ahead of the human acted.
    pub fn apply_human_action<D>(
        &mut self,
        action: PlayerAction,
        bots: &mut D,
    ) -> Result<(), GameError>
    where
        D: DecisionSource + ?Sized,
    {
        self.run_automated(bots)?;
        if self.state.is_finished() {
            return Err(GameError::HandAlreadyComplete);
        }
        let human = self.state.human_seat();
        match self.state.actor() {
            Some(idx) if idx == human => {}
            Some(idx) => {
                return Err(GameError::NotPlayersTurn {
                    expected: human,
                    actual: idx,
                })
            }
            None => return Err(GameError::illegal("no seat is due to act")),
        }
        let (idx, validated) = self.state.validate_for_actor(action)?;
        self.apply(idx, validated)?;
        self.run_automated(bots)?;
        Ok(())
    }

    /// Returns the finished hand's history the first time it is called; every
    /// later call, and any call on a running hand, returns `None`.
    pub fn finalize(&mut self, id: &str) -> Option<HandHistory> {
        if !self.state.is_finished() || self.finalized {
            return None;
        }
        self.finalized = true;
        let history = HandHistory::from_state(id, &self.state);
        tracing::info!(hand_id = id, result = %history.result, "hand finalized");
        Some(history)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn apply(&mut self, idx: usize, action: ValidatedAction) -> Result<(), GameError> {
        tracing::debug!(seat = idx + 1, action = ?action, street = ?self.state.street(), "apply");
        self.state.apply(idx, action);
        self.advance()
    }

    /// Closes finished betting rounds: deals streets, runs out the board when
    /// betting is over, and awards the pot when the hand ends.
    fn advance(&mut self) -> Result<(), GameError> {
        while !self.state.is_finished() {
            if self.state.remaining_players() <= 1 {
                self.state.award_pots(self.judge.as_ref());
                break;
            }
            if self.state.actor().is_some() {
                break;
            }
            match self.state.street().next() {
                None => {
                    self.state.award_pots(self.judge.as_ref());
                }
                Some(next) => {
                    let count = next.board_len() - self.state.board().len();
                    self.cards.burn()?;
                    let cards = self.cards.deal_board(count)?;
                    self.state.open_street(next, cards);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Deck;
    use std::collections::VecDeque;

    struct Script(VecDeque<PlayerAction>);

    impl DecisionSource for Script {
        fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction {
            self.0.pop_front().unwrap_or(if ctx.can_check() {
                PlayerAction::Check
            } else {
                PlayerAction::Call
            })
        }
    }

    fn engine(num_players: usize) -> Engine {
        let config = TableConfig {
            num_players,
            ..TableConfig::default()
        };
        Engine::new(config, Box::new(Deck::new_with_seed(11))).expect("engine")
    }

    #[test]
    fn deals_two_unique_cards_per_seat() {
        let e = engine(6);
        let mut seen = std::collections::HashSet::new();
        for seat in e.state().seats() {
            let hole = seat.hole_cards().expect("hole cards");
            assert!(seen.insert(hole[0]));
            assert!(seen.insert(hole[1]));
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn illegal_bot_action_folds_the_seat() {
        let mut e = engine(3);
        // seat 0 is the human dealer; give it a call, then bots act
        let mut bots = Script(VecDeque::from([PlayerAction::Check]));
        e.apply_human_action(PlayerAction::Call, &mut bots)
            .expect("call");
        assert!(e.state().seats()[1].is_folded());
        assert!(e.state().log().iter().any(|l| l == "Player 2 folds"));
        assert!(!e.state().seats()[0].is_folded());
    }

    #[test]
    fn passive_table_reaches_showdown() {
        let mut e = engine(2);
        let mut bots = Script(VecDeque::new());
        e.run_automated(&mut bots).expect("bots");
        while !e.is_finished() {
            let action = if e.state().to_call() == 0 {
                PlayerAction::Check
            } else {
                PlayerAction::Call
            };
            e.apply_human_action(action, &mut bots).expect("human");
        }
        assert_eq!(e.state().board().len(), 5);
        assert_eq!(e.state().pot(), 0);
        assert_eq!(e.state().total_chips(), 20_000);
        // split pot: nobody wins or loses
        assert!(e.state().seats().iter().all(|s| s.net() == 0));
    }

    #[test]
    fn all_in_runs_out_the_board() {
        let mut e = engine(2);
        let mut bots = Script(VecDeque::from([PlayerAction::Call]));
        e.run_automated(&mut bots).expect("bots");
        // heads-up with dealer 0 the human posts the small blind and acts first
        assert!(e.is_human_turn());
        e.apply_human_action(PlayerAction::AllIn, &mut bots)
            .expect("shove");
        assert!(e.is_finished());
        assert_eq!(e.state().board().len(), 5);
        let log = e.state().log();
        assert!(log.iter().any(|l| l.starts_with("Flop: ")));
        assert!(log.iter().any(|l| l.starts_with("River: ")));
    }

    #[test]
    fn finalize_only_once_and_only_when_finished() {
        let mut e = engine(2);
        assert!(e.finalize("x").is_none());
        let mut bots = Script(VecDeque::new());
        e.apply_human_action(PlayerAction::Fold, &mut bots)
            .expect("fold");
        assert!(e.finalize("x").is_some());
        assert!(e.finalize("x").is_none());
        assert!(matches!(
            e.apply_human_action(PlayerAction::Check, &mut bots),
            Err(GameError::HandAlreadyComplete)
        ));
    }

    #[test]
    fn pot_odds_reflect_price() {
        let ctx = DecisionContext {
            seat: 2,
            street: Street::Flop,
            to_call: 50,
            stack: 1_000,
            committed: 0,
            current_bet: 50,
            pot: 150,
            big_blind: 40,
            min_raise: 100,
            board_len: 3,
        };
        assert!((ctx.pot_odds() - 0.25).abs() < f64::EPSILON);
        assert!(!ctx.can_check());
    }
}

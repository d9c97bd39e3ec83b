//! Baseline policy for automated seats.
//!
//! Decisions look only at the price of the action (amount owed, stack, big
//! blind) and a random draw. The draw comes from a ChaCha20 generator: seeded
//! runs are reproducible, unseeded runs are not.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::AIOpponent;
use holdem_engine::engine::{DecisionContext, DecisionSource};
use holdem_engine::player::PlayerAction;

/// Chance of checking when checking is free.
const CHECK_FREQ: f64 = 0.60;
/// Chance of shoving when the stack cannot cover the call.
const SHORT_SHOVE_FREQ: f64 = 0.40;
/// Bets above this many big blinds count as large.
const LARGE_BET_BB: u32 = 5;
/// Chance of folding to a large bet.
const LARGE_FOLD_FREQ: f64 = 0.60;
/// Cumulative thresholds against an ordinary bet: call, then raise, else fold.
const CALL_FREQ: f64 = 0.70;
const RAISE_FREQ: f64 = 0.85;

/// Probabilistic policy for automated seats.
///
/// # Strategy
///
/// - Free to check: 60% check, otherwise bet 2 to 4 big blinds (capped at
///   the stack; a capped amount below one big blind checks instead).
/// - Stack below the amount owed: 40% all-in, otherwise fold.
/// - Owed more than 5 big blinds: 60% fold, otherwise call.
/// - Otherwise: 70% call, 15% raise `min(2 × owed, stack)` (calls when that
///   would not exceed the amount owed), 15% fold.
#[derive(Debug, Clone)]
pub struct BaselineAI {
    rng: ChaCha20Rng,
}

impl BaselineAI {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha20Rng::seed_from_u64(s),
            None => ChaCha20Rng::from_rng(&mut rand::rng()),
        };
        Self { rng }
    }

    /// Action when nothing is owed, for a draw `roll` in `[0, 1)` and a bet
    /// size of `multiplier` big blinds.
    fn decide_unopened(ctx: &DecisionContext, roll: f64, multiplier: u32) -> PlayerAction {
        if roll < CHECK_FREQ {
            return PlayerAction::Check;
        }
        let bet = ctx.big_blind.saturating_mul(multiplier).min(ctx.stack);
        if bet < ctx.big_blind || bet == 0 {
            PlayerAction::Check
        } else {
            PlayerAction::Bet(bet)
        }
    }

    /// Action when facing a bet, for a draw `roll` in `[0, 1)`.
    fn decide_facing_bet(ctx: &DecisionContext, roll: f64) -> PlayerAction {
        let owed = ctx.owed();
        if ctx.stack < owed {
            return if roll < SHORT_SHOVE_FREQ {
                PlayerAction::AllIn
            } else {
                PlayerAction::Fold
            };
        }
        if owed > ctx.big_blind.saturating_mul(LARGE_BET_BB) {
            return if roll < LARGE_FOLD_FREQ {
                PlayerAction::Fold
            } else {
                PlayerAction::Call
            };
        }
        if roll < CALL_FREQ {
            PlayerAction::Call
        } else if roll < RAISE_FREQ {
            let raise = owed.saturating_mul(2).min(ctx.stack);
            if raise <= owed {
                PlayerAction::Call
            } else {
                PlayerAction::Raise(raise)
            }
        } else {
            PlayerAction::Fold
        }
    }
}

impl Default for BaselineAI {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DecisionSource for BaselineAI {
    fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction {
        let roll: f64 = self.rng.random();
        let action = if ctx.owed() == 0 {
            let multiplier = self.rng.random_range(2..=4);
            Self::decide_unopened(ctx, roll, multiplier)
        } else {
            Self::decide_facing_bet(ctx, roll)
        };
        tracing::trace!(seat = ctx.seat, roll, action = ?action, "baseline decision");
        action
    }
}

impl AIOpponent for BaselineAI {
    fn name(&self) -> &str {
        "BaselineAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_engine::game::Street;
    use holdem_engine::rules::validate_action;

    fn ctx(owed: u32, stack: u32) -> DecisionContext {
        DecisionContext {
            seat: 2,
            street: Street::Flop,
            to_call: owed.min(stack),
            stack,
            committed: 0,
            current_bet: owed,
            pot: 200,
            big_blind: 40,
            min_raise: if owed == 0 { 40 } else { (owed * 2).min(stack) },
            board_len: 3,
        }
    }

    #[test]
    fn checks_most_of_the_time_when_free() {
        assert_eq!(
            BaselineAI::decide_unopened(&ctx(0, 1_000), 0.59, 3),
            PlayerAction::Check
        );
        assert_eq!(
            BaselineAI::decide_unopened(&ctx(0, 1_000), 0.60, 3),
            PlayerAction::Bet(120)
        );
    }

    #[test]
    fn bet_is_capped_at_stack_and_checks_below_big_blind() {
        assert_eq!(
            BaselineAI::decide_unopened(&ctx(0, 100), 0.9, 4),
            PlayerAction::Bet(100)
        );
        assert_eq!(
            BaselineAI::decide_unopened(&ctx(0, 30), 0.9, 2),
            PlayerAction::Check
        );
    }

    #[test]
    fn short_stack_shoves_or_folds() {
        let c = ctx(500, 300);
        assert_eq!(BaselineAI::decide_facing_bet(&c, 0.39), PlayerAction::AllIn);
        assert_eq!(BaselineAI::decide_facing_bet(&c, 0.40), PlayerAction::Fold);
    }

    #[test]
    fn large_bets_are_mostly_folded() {
        let c = ctx(201, 5_000);
        assert_eq!(BaselineAI::decide_facing_bet(&c, 0.59), PlayerAction::Fold);
        assert_eq!(BaselineAI::decide_facing_bet(&c, 0.60), PlayerAction::Call);
        // exactly five big blinds is not large
        assert_eq!(
            BaselineAI::decide_facing_bet(&ctx(200, 5_000), 0.10),
            PlayerAction::Call
        );
    }

    #[test]
    fn ordinary_bets_call_raise_or_fold() {
        let c = ctx(100, 5_000);
        assert_eq!(BaselineAI::decide_facing_bet(&c, 0.69), PlayerAction::Call);
        assert_eq!(
            BaselineAI::decide_facing_bet(&c, 0.70),
            PlayerAction::Raise(200)
        );
        assert_eq!(BaselineAI::decide_facing_bet(&c, 0.85), PlayerAction::Fold);
    }

    #[test]
    fn raise_is_capped_at_stack() {
        let c = ctx(100, 150);
        assert_eq!(
            BaselineAI::decide_facing_bet(&c, 0.80),
            PlayerAction::Raise(150)
        );
        // the capped raise still validates, as an all-in
        assert!(validate_action(150, 100, 40, PlayerAction::Raise(150)).is_ok());
    }

    #[test]
    fn seeded_policies_repeat_decisions() {
        let c = ctx(40, 1_000);
        let mut a = BaselineAI::new(Some(99));
        let mut b = BaselineAI::new(Some(99));
        for _ in 0..50 {
            assert_eq!(a.choose(&c), b.choose(&c));
        }
    }

    #[test]
    fn decisions_always_validate() {
        let mut ai = BaselineAI::new(Some(5));
        for (owed, stack) in [(0, 1_000), (0, 20), (40, 1_000), (400, 1_000), (500, 100)] {
            let c = ctx(owed, stack);
            for _ in 0..100 {
                let action = ai.choose(&c);
                assert!(
                    validate_action(stack, owed, 40, action).is_ok(),
                    "{action:?} rejected for owed {owed} stack {stack}"
                );
            }
        }
    }
}

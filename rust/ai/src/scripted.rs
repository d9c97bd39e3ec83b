//! Replays a fixed list of decisions, then plays passively.

use std::collections::VecDeque;

use crate::{AIOpponent, PassiveAI};
use holdem_engine::engine::{DecisionContext, DecisionSource};
use holdem_engine::player::PlayerAction;

#[derive(Debug, Clone, Default)]
pub struct ScriptedAI {
    script: VecDeque<PlayerAction>,
    /// `(seat position, action)` for every decision handed out
    history: Vec<(usize, PlayerAction)>,
}

impl ScriptedAI {
    pub fn new(actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        Self {
            script: actions.into_iter().collect(),
            history: Vec::new(),
        }
    }

    /// Scripted actions not yet handed out.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn history(&self) -> &[(usize, PlayerAction)] {
        &self.history
    }
}

impl DecisionSource for ScriptedAI {
    fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction {
        let action = match self.script.pop_front() {
            Some(action) => action,
            None => PassiveAI.choose(ctx),
        };
        self.history.push((ctx.seat, action));
        action
    }
}

impl AIOpponent for ScriptedAI {
    fn name(&self) -> &str {
        "ScriptedAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_engine::game::Street;

    fn ctx(seat: usize, owed: u32) -> DecisionContext {
        DecisionContext {
            seat,
            street: Street::Preflop,
            to_call: owed,
            stack: 1_000,
            committed: 0,
            current_bet: owed,
            pot: 60,
            big_blind: 40,
            min_raise: 80,
            board_len: 0,
        }
    }

    #[test]
    fn replays_then_falls_back_to_passive() {
        let mut ai = ScriptedAI::new([PlayerAction::Raise(120), PlayerAction::Fold]);
        assert_eq!(ai.choose(&ctx(4, 40)), PlayerAction::Raise(120));
        assert_eq!(ai.choose(&ctx(5, 120)), PlayerAction::Fold);
        assert_eq!(ai.remaining(), 0);
        assert_eq!(ai.choose(&ctx(6, 120)), PlayerAction::Call);
        assert_eq!(ai.choose(&ctx(2, 0)), PlayerAction::Check);
        assert_eq!(
            ai.history(),
            &[
                (4, PlayerAction::Raise(120)),
                (5, PlayerAction::Fold),
                (6, PlayerAction::Call),
                (2, PlayerAction::Check),
            ]
        );
    }
}

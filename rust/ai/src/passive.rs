use crate::AIOpponent;
use holdem_engine::engine::{DecisionContext, DecisionSource};
use holdem_engine::player::PlayerAction;

/// Checks when checking is free, otherwise calls. Fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveAI;

impl DecisionSource for PassiveAI {
    fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction {
        if ctx.owed() == 0 {
            PlayerAction::Check
        } else {
            PlayerAction::Call
        }
    }
}

impl AIOpponent for PassiveAI {
    fn name(&self) -> &str {
        "PassiveAI"
    }
}

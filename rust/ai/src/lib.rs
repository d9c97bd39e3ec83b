//! # holdem-ai: Automated Seats for Hold'em Hands
//!
//! Decision sources for the automated seats of a hand. Every policy plugs
//! into the engine through [`holdem_engine::engine::DecisionSource`], so the
//! engine never depends on how a bot decides.
//!
//! ## Core Components
//!
//! - [`AIOpponent`] - Trait adding an identifier to a decision source
//! - [`baseline`] - Probabilistic policy driven by bet size and stack
//! - [`passive`] - Deterministic check-or-call policy
//! - [`scripted`] - Replays a fixed list of actions
//! - [`create_ai`] - Factory function for creating AI opponents
//!
//! ## Quick Start
//!
//! ```rust
//! use holdem_ai::create_ai;
//! use holdem_engine::deck::Deck;
//! use holdem_engine::engine::Engine;
//! use holdem_engine::game::TableConfig;
//!
//! let mut bots = create_ai("baseline", Some(42));
//! let mut engine = Engine::new(TableConfig::default(), Box::new(Deck::new_with_seed(42)))
//!     .expect("valid table");
//!
//! engine.run_automated(bots.as_mut()).expect("bots act");
//! assert!(engine.is_finished() || engine.is_human_turn());
//! ```
//!
//! ## AI Types
//!
//! - `"baseline"` - the default probabilistic policy
//! - `"passive"` - checks when free, otherwise calls

use holdem_engine::engine::DecisionSource;

pub mod baseline;
pub mod passive;
pub mod scripted;

pub use baseline::BaselineAI;
pub use passive::PassiveAI;
pub use scripted::ScriptedAI;

/// A [`DecisionSource`] with a name, usable from any thread.
///
/// # Example Implementation
///
/// ```rust
/// use holdem_ai::AIOpponent;
/// use holdem_engine::engine::{DecisionContext, DecisionSource};
/// use holdem_engine::player::PlayerAction;
///
/// struct AlwaysCall;
///
/// impl DecisionSource for AlwaysCall {
///     fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction {
///         if ctx.can_check() { PlayerAction::Check } else { PlayerAction::Call }
///     }
/// }
///
/// impl AIOpponent for AlwaysCall {
///     fn name(&self) -> &str {
///         "AlwaysCall"
///     }
/// }
/// ```
pub trait AIOpponent: DecisionSource + Send {
    fn name(&self) -> &str;
}

/// Strategy names accepted by [`create_ai`].
pub const STRATEGIES: [&str; 2] = ["baseline", "passive"];

/// Factory function to create AI opponents by strategy name.
///
/// `seed` makes the baseline policy reproducible; without it the policy
/// draws from an OS-seeded generator. Unknown names fall back to the
/// baseline policy.
///
/// # Example
///
/// ```rust
/// use holdem_ai::create_ai;
///
/// let ai = create_ai("baseline", Some(7));
/// assert_eq!(ai.name(), "BaselineAI");
/// assert_eq!(create_ai("nonsense", None).name(), "BaselineAI");
/// ```
pub fn create_ai(strategy: &str, seed: Option<u64>) -> Box<dyn AIOpponent> {
    match strategy.trim().to_ascii_lowercase().as_str() {
        "passive" => Box::new(PassiveAI),
        "baseline" => Box::new(BaselineAI::new(seed)),
        other => {
            tracing::warn!(strategy = other, "unknown strategy, using baseline");
            Box::new(BaselineAI::new(seed))
        }
    }
}

//! # holdem-engine: No-Limit Hold'em Hand Engine
//!
//! Runs a single-table No-Limit Texas Hold'em hand for 2 to 10 seats, one of
//! them human-controlled. The engine deals, sequences betting, moves chips
//! between stacks and the pot, advances streets and formats the finished
//! hand into a flat textual [`logger::HandHistory`].
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and text formatting
//! - [`deck`] - The [`deck::CardSource`] seam and a ChaCha20-shuffled deck
//! - [`player`] - Action tokens submitted by seats
//! - [`seat`] - Per-seat chip ledger
//! - [`rules`] - Betting validation and minimum bet/raise
//! - [`game`] - Hand state machine and its legality queries
//! - [`pot`] - Main/side pot layering and the showdown collaborator
//! - [`engine`] - Betting action engine and the automated-seat seam
//! - [`logger`] - Hand history formatting
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use holdem_engine::deck::Deck;
//! use holdem_engine::engine::{DecisionContext, DecisionSource, Engine};
//! use holdem_engine::game::TableConfig;
//! use holdem_engine::player::PlayerAction;
//!
//! struct CheckOrCall;
//! impl DecisionSource for CheckOrCall {
//!     fn choose(&mut self, ctx: &DecisionContext) -> PlayerAction {
//!         if ctx.can_check() { PlayerAction::Check } else { PlayerAction::Call }
//!     }
//! }
//!
//! let mut engine = Engine::new(TableConfig::default(), Box::new(Deck::new_with_seed(42)))
//!     .expect("valid table");
//! let mut bots = CheckOrCall;
//! engine.run_automated(&mut bots).expect("bots act");
//!
//! // Player 2 and Player 3 posted the blinds
//! let log = engine.state().log();
//! assert_eq!(log[0], "Player 2 posts small blind - 20 chips");
//! assert_eq!(log[1], "Player 3 posts big blind - 40 chips");
//! ```
//!
//! ## Action Validation
//!
//! ```rust
//! use holdem_engine::rules::validate_action;
//! use holdem_engine::player::PlayerAction;
//!
//! let stack = 1000;
//! let to_call = 50;
//! let big_blind = 40;
//!
//! match validate_action(stack, to_call, big_blind, PlayerAction::Call) {
//!     Ok(validated) => println!("Valid action: {:?}", validated),
//!     Err(e) => println!("Invalid action: {}", e),
//! }
//! ```

pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod logger;
pub mod player;
pub mod pot;
pub mod rules;
pub mod seat;

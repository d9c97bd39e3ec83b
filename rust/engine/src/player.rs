use serde::{Deserialize, Serialize};

use crate::errors::GameError;

/// An action a seat may submit during a betting round.
///
/// `Bet` and `Raise` carry the number of chips the seat moves from its stack
/// with this action, not a "raise to" total.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    Bet(u32),
    Raise(u32),
    AllIn,
}

impl PlayerAction {
    /// Parses a request token. Long forms (`fold`, `raise`, `all-in`), single
    /// letters (`f`, `x`, `c`) and compact sized tokens (`b40`, `r160`) are
    /// accepted. `amount` is only consulted for bet and raise.
    pub fn from_token(token: &str, amount: Option<i64>) -> Result<Self, GameError> {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "fold" | "f" => return Ok(PlayerAction::Fold),
            "check" | "x" | "k" => return Ok(PlayerAction::Check),
            "call" | "c" => return Ok(PlayerAction::Call),
            "all-in" | "allin" | "all_in" | "shove" => return Ok(PlayerAction::AllIn),
            "bet" | "b" => return Ok(PlayerAction::Bet(required_amount(amount)?)),
            "raise" | "r" => return Ok(PlayerAction::Raise(required_amount(amount)?)),
            _ => {}
        }

        let (kind, digits) = token.split_at(token.chars().next().map_or(0, char::len_utf8));
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let embedded = digits
                .parse::<i64>()
                .map_err(|_| GameError::amount(format!("`{digits}` is out of range")))?;
            match kind {
                "b" => return Ok(PlayerAction::Bet(required_amount(Some(embedded))?)),
                "r" => return Ok(PlayerAction::Raise(required_amount(Some(embedded))?)),
                _ => {}
            }
        }

        Err(GameError::illegal(format!("unknown action `{token}`")))
    }

    /// Verb used in action-log lines, e.g. `Player 4 raises 160 chips`.
    pub fn verb(&self) -> &'static str {
        match self {
            PlayerAction::Fold => "folds",
            PlayerAction::Check => "checks",
            PlayerAction::Call => "calls",
            PlayerAction::Bet(_) => "bets",
            PlayerAction::Raise(_) => "raises",
            PlayerAction::AllIn => "goes all-in",
        }
    }
}

fn required_amount(amount: Option<i64>) -> Result<u32, GameError> {
    let amount = amount.ok_or_else(|| GameError::amount("bet and raise require an amount"))?;
    if amount <= 0 {
        return Err(GameError::amount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    u32::try_from(amount).map_err(|_| GameError::amount(format!("{amount} is out of range")))
}

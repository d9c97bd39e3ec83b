use crate::errors::GameError;
use crate::player::PlayerAction as A;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    Call(u32),
    Bet(u32),
    Raise(u32),
    AllIn(u32),
}

impl From<ValidatedAction> for A {
    fn from(action: ValidatedAction) -> Self {
        match action {
            ValidatedAction::Fold => A::Fold,
            ValidatedAction::Check => A::Check,
            ValidatedAction::Call(_) => A::Call,
            ValidatedAction::Bet(amount) => A::Bet(amount),
            ValidatedAction::Raise(amount) => A::Raise(amount),
            ValidatedAction::AllIn(_) => A::AllIn,
        }
    }
}

impl ValidatedAction {
    /// Chips this action moves from the stack into the pot.
    pub fn chips(&self) -> u32 {
        match *self {
            ValidatedAction::Fold | ValidatedAction::Check => 0,
            ValidatedAction::Call(c)
            | ValidatedAction::Bet(c)
            | ValidatedAction::Raise(c)
            | ValidatedAction::AllIn(c) => c,
        }
    }
}

/// Smallest legal bet (nothing to call) or raise (facing `to_call`), capped at the stack.
///
/// A bet opens for at least one big blind; a raise must put in at least twice
/// the amount owed.
pub fn min_bet_or_raise(stack: u32, to_call: u32, big_blind: u32) -> u32 {
    if to_call == 0 {
        big_blind.min(stack)
    } else {
        to_call.saturating_mul(2).min(stack)
    }
}

/// Validates a player action according to betting rules and stack size.
///
/// Converts a [`crate::player::PlayerAction`] into a [`ValidatedAction`].
/// Nothing is mutated here; a rejected action leaves the hand untouched.
///
/// # Arguments
///
/// * `stack` - Player's remaining chip stack
/// * `to_call` - Chips the player owes to match the current bet
/// * `big_blind` - Big blind of the table, the minimum opening bet
/// * `action` - The action the player wishes to perform
///
/// # Errors
///
/// - [`GameError::IllegalAction`] - the action does not fit the betting state
///   (check facing a bet, raise with nothing to raise, bet or raise below the minimum)
/// - [`GameError::InvalidAmount`] - a bet or raise of zero or of more chips than the stack
///
/// # Examples
///
/// ```
/// use holdem_engine::rules::{validate_action, ValidatedAction};
/// use holdem_engine::player::PlayerAction;
///
/// // Call with sufficient stack
/// let result = validate_action(1000, 40, 40, PlayerAction::Call);
/// assert_eq!(result, Ok(ValidatedAction::Call(40)));
///
/// // Calling with a short stack is an all-in call
/// let result = validate_action(30, 40, 40, PlayerAction::Call);
/// assert_eq!(result, Ok(ValidatedAction::AllIn(30)));
/// ```
///
/// ```
/// use holdem_engine::rules::validate_action;
/// use holdem_engine::player::PlayerAction;
/// use holdem_engine::errors::GameError;
///
/// // Check when facing a bet
/// let result = validate_action(1000, 40, 40, PlayerAction::Check);
/// assert!(matches!(result, Err(GameError::IllegalAction(_))));
///
/// // Raise with no outstanding bet
/// let result = validate_action(1000, 0, 40, PlayerAction::Raise(80));
/// assert!(matches!(result, Err(GameError::IllegalAction(_))));
/// ```
pub fn validate_action(
    stack: u32,
    to_call: u32,
    big_blind: u32,
    action: A,
) -> Result<ValidatedAction, GameError> {
    match action {
        A::Fold => Ok(ValidatedAction::Fold),
        A::Check => {
            if to_call == 0 {
                Ok(ValidatedAction::Check)
            } else {
                Err(GameError::illegal(format!(
                    "cannot check facing {to_call} chips"
                )))
            }
        }
        A::Call => {
            if to_call == 0 {
                Err(GameError::illegal("nothing to call"))
            } else if stack <= to_call {
                Ok(ValidatedAction::AllIn(stack))
            } else {
                Ok(ValidatedAction::Call(to_call))
            }
        }
        A::Bet(amount) => {
            if to_call > 0 {
                return Err(GameError::illegal(format!(
                    "a bet of {to_call} chips is already outstanding"
                )));
            }
            check_amount(amount, stack)?;
            let minimum = min_bet_or_raise(stack, to_call, big_blind);
            if amount == stack {
                Ok(ValidatedAction::AllIn(stack))
            } else if amount < minimum {
                Err(GameError::illegal(format!(
                    "bet of {amount} is below the minimum of {minimum}"
                )))
            } else {
                Ok(ValidatedAction::Bet(amount))
            }
        }
        A::Raise(amount) => {
            if to_call == 0 {
                return Err(GameError::illegal("no bet to raise"));
            }
            if stack <= to_call {
                return Err(GameError::illegal(format!(
                    "stack of {stack} cannot raise over {to_call}"
                )));
            }
            check_amount(amount, stack)?;
            let minimum = min_bet_or_raise(stack, to_call, big_blind);
            if amount == stack {
                Ok(ValidatedAction::AllIn(stack))
            } else if amount < minimum {
                Err(GameError::illegal(format!(
                    "raise of {amount} is below the minimum of {minimum}"
                )))
            } else {
                Ok(ValidatedAction::Raise(amount))
            }
        }
        A::AllIn => {
            if stack == 0 {
                Err(GameError::illegal("no chips left to push"))
            } else {
                Ok(ValidatedAction::AllIn(stack))
            }
        }
    }
}

fn check_amount(amount: u32, stack: u32) -> Result<(), GameError> {
    if amount == 0 {
        Err(GameError::amount("amount must be positive"))
    } else if amount > stack {
        Err(GameError::amount(format!(
            "{amount} exceeds the remaining stack of {stack}"
        )))
    } else {
        Ok(())
    }
}

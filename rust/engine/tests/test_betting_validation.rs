use holdem_engine::errors::GameError;
use holdem_engine::player::PlayerAction as A;
use holdem_engine::rules::{min_bet_or_raise, validate_action, ValidatedAction};

#[test]
fn bet_zero_is_invalid() {
    let err = validate_action(
        10_000,
        /*to_call*/ 0,
        /*big_blind*/ 40,
        A::Bet(0),
    )
    .unwrap_err();
    match err {
        GameError::InvalidAmount(_) => {}
        _ => panic!("expected InvalidAmount"),
    }
}

#[test]
fn bet_over_stack_is_invalid_amount() {
    let err = validate_action(10_000, 0, 40, A::Bet(10_001)).unwrap_err();
    assert!(matches!(err, GameError::InvalidAmount(_)));
}

#[test]
fn bet_of_whole_stack_is_all_in() {
    let va = validate_action(500, 0, 40, A::Bet(500)).unwrap();
    assert_eq!(va, ValidatedAction::AllIn(500));
}

#[test]
fn bet_below_big_blind_is_illegal() {
    let err = validate_action(10_000, 0, 40, A::Bet(30)).unwrap_err();
    assert!(matches!(err, GameError::IllegalAction(_)));
}

#[test]
fn short_stack_may_bet_less_than_big_blind_only_all_in() {
    assert_eq!(
        validate_action(25, 0, 40, A::Bet(25)).unwrap(),
        ValidatedAction::AllIn(25)
    );
    assert!(matches!(
        validate_action(25, 0, 40, A::Bet(10)),
        Err(GameError::IllegalAction(_))
    ));
}

#[test]
fn bet_facing_a_bet_is_illegal() {
    let err = validate_action(10_000, 40, 40, A::Bet(200)).unwrap_err();
    assert!(matches!(err, GameError::IllegalAction(_)));
}

#[test]
fn call_with_insufficient_stack_is_allin_call() {
    let va = validate_action(60, 100, 40, A::Call).unwrap();
    assert_eq!(va, ValidatedAction::AllIn(60));
}

#[test]
fn call_with_nothing_owed_is_illegal() {
    let err = validate_action(1_000, 0, 40, A::Call).unwrap_err();
    assert_eq!(err, GameError::IllegalAction("nothing to call".into()));
}

#[test]
fn raise_without_bet_is_illegal() {
    let err = validate_action(1_000, 0, 40, A::Raise(80)).unwrap_err();
    assert_eq!(err, GameError::IllegalAction("no bet to raise".into()));
}

#[test]
fn raise_must_double_the_call() {
    assert_eq!(
        validate_action(1_000, 100, 40, A::Raise(200)).unwrap(),
        ValidatedAction::Raise(200)
    );
    assert!(matches!(
        validate_action(1_000, 100, 40, A::Raise(150)),
        Err(GameError::IllegalAction(_))
    ));
}

#[test]
fn short_raise_is_only_legal_all_in() {
    // stack 130 cannot reach the 200 minimum, so only the whole stack goes
    assert_eq!(
        validate_action(130, 100, 40, A::Raise(130)).unwrap(),
        ValidatedAction::AllIn(130)
    );
    assert!(matches!(
        validate_action(130, 100, 40, A::Raise(120)),
        Err(GameError::IllegalAction(_))
    ));
}

#[test]
fn raise_when_stack_only_covers_the_call_is_illegal() {
    let err = validate_action(100, 100, 40, A::Raise(100)).unwrap_err();
    assert!(matches!(err, GameError::IllegalAction(_)));
}

#[test]
fn all_in_needs_chips() {
    assert_eq!(
        validate_action(70, 40, 40, A::AllIn).unwrap(),
        ValidatedAction::AllIn(70)
    );
    assert!(matches!(
        validate_action(0, 40, 40, A::AllIn),
        Err(GameError::IllegalAction(_))
    ));
}

#[test]
fn minimum_is_capped_at_stack() {
    assert_eq!(min_bet_or_raise(10_000, 0, 40), 40);
    assert_eq!(min_bet_or_raise(10_000, 120, 40), 240);
    assert_eq!(min_bet_or_raise(30, 0, 40), 30);
    assert_eq!(min_bet_or_raise(150, 100, 40), 150);
}

use holdem_web::{
    AppContext, AppSettings, HistoryRepository, ServerConfig, SqliteHistory, StartHandRequest,
};
use tempfile::TempDir;

fn play_one_hand(context: &AppContext, seed: u64) -> String {
    let sessions = context.sessions();
    let started = sessions
        .start_hand(StartHandRequest {
            seed: Some(seed),
            strategy: Some("passive".into()),
            ..Default::default()
        })
        .expect("start");
    let outcome = sessions
        .apply_action(&started.game_id, "fold", None)
        .expect("fold");
    assert!(outcome.is_finished());
    started.game_id
}

#[test]
fn finished_hands_survive_a_restart() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("nested").join("hands.db");

    let first = {
        let config = ServerConfig::for_tests().with_database(&db);
        let context = AppContext::new(config, AppSettings::default()).expect("context");
        play_one_hand(&context, 1)
    };
    assert!(db.exists());

    let config = ServerConfig::for_tests().with_database(&db);
    let context = AppContext::new(config, AppSettings::default()).expect("reopen");
    let second = play_one_hand(&context, 2);

    let ids: Vec<String> = context
        .history()
        .list()
        .expect("list")
        .into_iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(ids, vec![first.clone(), second]);

    let stored = context
        .sessions()
        .get_history(&first)
        .expect("history of first hand");
    assert!(stored.actions.contains("Player 1 folds"));
    assert!(stored.ts.is_some());
}

#[test]
fn stored_record_matches_what_the_caller_saw() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("hands.db");
    let config = ServerConfig::for_tests().with_database(&db);
    let context = AppContext::new(config, AppSettings::default()).expect("context");
    let sessions = context.sessions();

    let started = sessions
        .start_hand(StartHandRequest {
            seed: Some(17),
            ..Default::default()
        })
        .expect("start");
    let outcome = sessions
        .apply_action(&started.game_id, "fold", None)
        .expect("fold");
    let returned = match outcome {
        holdem_web::HandOutcome::Finished(done) => done,
        holdem_web::HandOutcome::Live(_) => panic!("fold should end the hand for the human"),
    };
    assert!(returned.persisted);

    let reopened = SqliteHistory::open(&db).expect("open");
    assert_eq!(
        reopened.get(&started.game_id).expect("get"),
        Some(returned.hand)
    );
}

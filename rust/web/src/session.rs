use crate::history::{HistoryError, HistoryRepository};
use crate::settings::{AppSettings, SettingsError, SettingsStore};
use holdem_ai::{create_ai, AIOpponent, STRATEGIES};
use holdem_engine::cards::{format_cards, Card};
use holdem_engine::deck::Deck;
use holdem_engine::engine::Engine;
use holdem_engine::errors::GameError;
use holdem_engine::game::{HandStatus, LegalAction, Street, TableConfig};
use holdem_engine::logger::HandHistory;
use holdem_engine::player::PlayerAction;
use holdem_engine::seat::SeatStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

pub type SessionId = String;

/// Table used when a start request does not name one.
pub const DEFAULT_TABLE: &str = "default";

/// Registry of live hands.
///
/// Each [`GameSession`] carries its own lock, so requests on one hand are
/// serialized while requests on different hands never wait on each other.
/// A session lock may be held while taking the registry lock, never the
/// other way round.
pub struct SessionManager {
    registry: RwLock<Registry>,
    history: Arc<dyn HistoryRepository>,
    settings: Arc<SettingsStore>,
    /// Overrides the timeout from settings when set
    session_ttl: Option<Duration>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("active", &self.active_sessions().len())
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(history: Arc<dyn HistoryRepository>, settings: Arc<SettingsStore>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            history,
            settings,
            session_ttl: None,
        }
    }

    pub fn with_ttl(
        history: Arc<dyn HistoryRepository>,
        settings: Arc<SettingsStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            session_ttl: Some(ttl),
            ..Self::new(history, settings)
        }
    }

    pub fn settings(&self) -> Arc<SettingsStore> {
        Arc::clone(&self.settings)
    }

    fn ttl(&self) -> Duration {
        self.session_ttl.unwrap_or_else(|| {
            self.settings
                .get()
                .map(|s| s.session_timeout())
                .unwrap_or_else(|_| AppSettings::default().session_timeout())
        })
    }

    /// Deals a new hand and plays the automated seats up to the human's
    /// first decision. A hand dealt across a reset is dealt again with the
    /// new settings.
    pub fn start_hand(&self, request: StartHandRequest) -> Result<StartHandResponse, SessionError> {
        let table = request
            .table
            .clone()
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());

        loop {
            let (settings, generation) = self.settings_snapshot()?;
            let Dealt {
                mut engine,
                bots,
                config,
                strategy,
            } = Self::deal(&request, &settings)?;

            let id = Uuid::new_v4().to_string();
            let log = engine.state().log().to_vec();
            let ttl = self.ttl();

            {
                let mut guard = self
                    .registry
                    .write()
                    .map_err(|_| SessionError::StoragePoisoned)?;
                if guard.generation != generation {
                    tracing::debug!(table = %table, "tables reset while dealing, dealing again");
                    continue;
                }
                guard.sessions.retain(|_, session| !session.is_expired(ttl));
                if guard.sessions.values().any(|session| session.table == table) {
                    return Err(SessionError::AlreadyInProgress(table));
                }
                if !engine.is_finished() {
                    let state = HandView::from_engine(&id, &engine);
                    let session = GameSession::new(id.clone(), table.clone(), engine, bots);
                    guard.sessions.insert(id.clone(), Arc::new(session));
                    tracing::info!(
                        session_id = %id,
                        table = %table,
                        players = config.num_players,
                        dealer = config.dealer_index,
                        stack = config.starting_stack,
                        strategy = %strategy,
                        "hand started"
                    );
                    return Ok(StartHandResponse {
                        game_id: id,
                        log,
                        finished: false,
                        state: Some(state),
                        hand: None,
                    });
                }
            }

            // the human was all-in from the blinds and the board ran out
            let hand = self.finish(&id, &mut engine);
            return Ok(StartHandResponse {
                game_id: id,
                log,
                finished: true,
                state: None,
                hand: hand.map(|h| h.hand),
            });
        }
    }

    /// Settings paired with the reset generation they belong to.
    fn settings_snapshot(&self) -> Result<(AppSettings, u64), SessionError> {
        let guard = self
            .registry
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        Ok((self.settings.get()?, guard.generation))
    }

    fn deal(request: &StartHandRequest, settings: &AppSettings) -> Result<Dealt, SessionError> {
        let strategy = request
            .strategy
            .as_deref()
            .unwrap_or(settings.default_strategy.as_str())
            .trim()
            .to_ascii_lowercase();
        if !STRATEGIES.contains(&strategy.as_str()) {
            return Err(SessionError::InvalidConfig(format!(
                "unknown strategy: {strategy}"
            )));
        }

        let config = settings.table_config(request.num_players, request.dealer_index.unwrap_or(0));
        let deck = match request.seed {
            Some(seed) => Deck::new_with_seed(seed),
            None => Deck::new_random(),
        };
        let mut engine = Engine::new(config, Box::new(deck))?;
        let mut bots = create_ai(&strategy, request.seed);
        engine.run_automated(bots.as_mut())?;
        Ok(Dealt {
            engine,
            bots,
            config,
            strategy,
        })
    }

    pub fn get_session(&self, id: &str) -> Result<Arc<GameSession>, SessionError> {
        let guard = self
            .registry
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Live session that has not outlived its timeout; an expired one is
    /// dropped on the spot.
    fn live_session(&self, id: &str) -> Result<Arc<GameSession>, SessionError> {
        let session = self.get_session(id)?;
        if session.is_expired(self.ttl()) {
            self.remove_session(id)?;
            tracing::info!(session_id = %id, "session expired due to inactivity");
            return Err(SessionError::Expired(id.to_string()));
        }
        session.touch();
        Ok(session)
    }

    /// Current view of a hand. Finished hands are served from history.
    pub fn state(&self, id: &str) -> Result<HandOutcome, SessionError> {
        match self.live_session(id) {
            Ok(session) => {
                let hand = session.lock()?;
                Ok(HandOutcome::Live(HandView::from_engine(id, &hand.engine)))
            }
            Err(SessionError::NotFound(_)) => {
                let hand = self.get_history(id)?;
                Ok(HandOutcome::Finished(FinishedHand {
                    finished: true,
                    hand,
                    persisted: true,
                }))
            }
            Err(err) => Err(err),
        }
    }

    /// Applies the human's action, then lets the automated seats play on.
    /// A rejected action changes nothing.
    pub fn apply_action(
        &self,
        id: &str,
        token: &str,
        amount: Option<i64>,
    ) -> Result<HandOutcome, SessionError> {
        let action = PlayerAction::from_token(token, amount)?;
        let session = self.live_session(id)?;

        let finished = {
            let mut guard = session.lock()?;
            // a reset may have dropped the session while this call waited
            if !self.is_registered(&session)? {
                return Err(SessionError::NotFound(id.to_string()));
            }
            let LiveHand { engine, bots } = &mut *guard;
            match engine.apply_human_action(action, bots.as_mut()) {
                Ok(()) => {}
                Err(GameError::HandAlreadyComplete) => {
                    return Err(SessionError::NotFound(id.to_string()))
                }
                Err(err) => {
                    tracing::debug!(session_id = %id, action = ?action, error = %err, "action rejected");
                    return Err(err.into());
                }
            }
            tracing::debug!(session_id = %id, action = ?action, "action applied");
            if !engine.is_finished() {
                return Ok(HandOutcome::Live(HandView::from_engine(id, engine)));
            }
            if !self.unregister(&session)? {
                tracing::info!(session_id = %id, "hand discarded by reset before it finished");
                return Err(SessionError::NotFound(id.to_string()));
            }
            self.finish(id, engine)
        };

        finished
            .map(HandOutcome::Finished)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    pub fn get_history(&self, id: &str) -> Result<HandHistory, SessionError> {
        self.history
            .get(id)?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    pub fn list_histories(&self) -> Result<Vec<HandHistory>, SessionError> {
        Ok(self.history.list()?)
    }

    /// Drops every live hand and sets the stack future hands start with.
    /// Both happen under the registry write lock, so no hand dealt with the
    /// previous stack survives the reset.
    pub fn reset(&self, starting_stack: u32) -> Result<ResetResponse, SessionError> {
        let (settings, cleared) = {
            let mut guard = self
                .registry
                .write()
                .map_err(|_| SessionError::StoragePoisoned)?;
            let settings = self.settings.set_starting_stack(starting_stack)?;
            let cleared = guard.sessions.len();
            guard.sessions.clear();
            guard.generation += 1;
            (settings, cleared)
        };
        tracing::info!(starting_stack, cleared, "tables reset");
        Ok(ResetResponse {
            starting_stack: settings.starting_stack,
            cleared,
        })
    }

    /// Removes sessions idle past the timeout; returns how many went.
    pub fn cleanup_expired_sessions(&self) -> usize {
        let ttl = self.ttl();
        let mut expired = Vec::new();
        {
            let mut guard = match self.registry.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.sessions.retain(|id, session| {
                if session.is_expired(ttl) {
                    expired.push(id.clone());
                    false
                } else {
                    true
                }
            });
        }
        for id in &expired {
            tracing::info!(session_id = %id, "session expired");
        }
        expired.len()
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        match self.registry.read() {
            Ok(guard) => guard.sessions.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn finish(&self, id: &str, engine: &mut Engine) -> Option<FinishedHand> {
        engine.finalize(id).map(|hand| {
            let persisted = self.persist(&hand);
            FinishedHand {
                finished: true,
                hand,
                persisted,
            }
        })
    }

    /// Best-effort save: a failure is logged and the history still reaches
    /// the caller.
    fn persist(&self, hand: &HandHistory) -> bool {
        match self.history.save(hand) {
            Ok(()) => {
                tracing::info!(hand_id = %hand.id, "hand history saved");
                true
            }
            Err(err) => {
                tracing::error!(hand_id = %hand.id, error = %err, "failed to persist hand history");
                false
            }
        }
    }

    fn remove_session(&self, id: &str) -> Result<Option<Arc<GameSession>>, SessionError> {
        match self.registry.write() {
            Ok(mut guard) => Ok(guard.sessions.remove(id)),
            Err(_) => Err(SessionError::StoragePoisoned),
        }
    }

    fn is_registered(&self, session: &Arc<GameSession>) -> Result<bool, SessionError> {
        let guard = self
            .registry
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        Ok(guard.holds(session))
    }

    /// Removes `session` if it is still the registered entry for its id.
    /// Exactly one caller wins the right to finish a hand.
    fn unregister(&self, session: &Arc<GameSession>) -> Result<bool, SessionError> {
        let mut guard = self
            .registry
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        if !guard.holds(session) {
            return Ok(false);
        }
        guard.sessions.remove(session.id());
        Ok(true)
    }
}

/// Live sessions plus a counter bumped by every reset.
#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, Arc<GameSession>>,
    generation: u64,
}

impl Registry {
    fn holds(&self, session: &Arc<GameSession>) -> bool {
        self.sessions
            .get(session.id())
            .is_some_and(|registered| Arc::ptr_eq(registered, session))
    }
}

struct Dealt {
    engine: Engine,
    bots: Box<dyn AIOpponent>,
    config: TableConfig,
    strategy: String,
}

/// Engine and bot policy of one hand, always locked together.
struct LiveHand {
    engine: Engine,
    bots: Box<dyn AIOpponent>,
}

pub struct GameSession {
    id: SessionId,
    table: String,
    created_at: Instant,
    last_active: Mutex<Instant>,
    hand: Mutex<LiveHand>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("table", &self.table)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    fn new(id: SessionId, table: String, engine: Engine, bots: Box<dyn AIOpponent>) -> Self {
        let now = Instant::now();
        Self {
            id,
            table,
            created_at: now,
            last_active: Mutex::new(now),
            hand: Mutex::new(LiveHand { engine, bots }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn lock(&self) -> Result<MutexGuard<'_, LiveHand>, SessionError> {
        self.hand.lock().map_err(|_| SessionError::StoragePoisoned)
    }

    fn touch(&self) {
        if let Ok(mut guard) = self.last_active.lock() {
            *guard = Instant::now();
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        match self.last_active.lock() {
            Ok(last) => last.elapsed() >= ttl,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartHandRequest {
    #[serde(default)]
    pub num_players: Option<usize>,
    /// 0-based seat holding the dealer button
    #[serde(default)]
    pub dealer_index: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartHandResponse {
    pub game_id: SessionId,
    pub log: Vec<String>,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<HandView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<HandHistory>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatView {
    /// 1-based table position
    pub seat: usize,
    pub stack: u32,
    pub committed: u32,
    pub status: SeatStatus,
    pub is_human: bool,
    /// Only the human's own cards are shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<String>,
}

/// What the human at a live hand may see.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HandView {
    pub game_id: SessionId,
    pub finished: bool,
    pub status: HandStatus,
    pub street: Street,
    pub board: Vec<String>,
    pub pot: u32,
    pub current_bet: u32,
    pub to_call: u32,
    /// 1-based seat due to act
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<usize>,
    pub hole_cards: Option<String>,
    pub seats: Vec<SeatView>,
    pub legal_actions: Vec<LegalAction>,
    pub log: Vec<String>,
}

impl HandView {
    pub fn from_engine(game_id: &str, engine: &Engine) -> Self {
        let state = engine.state();
        let hole = |cards: Option<[Card; 2]>| cards.map(|c| format_cards(&c));
        let seats = state
            .seats()
            .iter()
            .map(|seat| SeatView {
                seat: seat.position(),
                stack: seat.stack(),
                committed: seat.committed(),
                status: seat.status(),
                is_human: seat.is_human(),
                hole_cards: if seat.is_human() {
                    hole(seat.hole_cards())
                } else {
                    None
                },
            })
            .collect();
        let legal_actions = if engine.is_human_turn() {
            state.legal_actions()
        } else {
            Vec::new()
        };
        Self {
            game_id: game_id.to_string(),
            finished: state.is_finished(),
            status: state.status(),
            street: state.street(),
            board: state.board().iter().map(Card::to_string).collect(),
            pot: state.pot(),
            current_bet: state.current_bet(),
            to_call: state.to_call(),
            actor: state.actor().map(|idx| idx + 1),
            hole_cards: hole(engine.human_hole_cards()),
            seats,
            legal_actions,
            log: state.log().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FinishedHand {
    pub finished: bool,
    pub hand: HandHistory,
    /// `false` when saving the history failed
    pub persisted: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HandOutcome {
    Live(HandView),
    Finished(FinishedHand),
}

impl HandOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, HandOutcome::Finished(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetResponse {
    pub starting_stack: u32,
    pub cleared: usize,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Hand not found: {0}")]
    NotFound(SessionId),
    #[error("Illegal action: {0}")]
    IllegalAction(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("A hand is already in progress at table {0}")]
    AlreadyInProgress(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Session expired: {0}")]
    Expired(SessionId),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Game engine error: {0}")]
    Engine(String),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::IllegalAction(reason) => SessionError::IllegalAction(reason),
            GameError::InvalidAmount(reason) => SessionError::InvalidAmount(reason),
            GameError::HandAlreadyComplete | GameError::NotPlayersTurn { .. } => {
                SessionError::IllegalAction(err.to_string())
            }
            GameError::InvalidTable(reason) => SessionError::InvalidConfig(reason),
            GameError::DeckExhausted | GameError::InvalidCard(_) => {
                SessionError::Engine(err.to_string())
            }
        }
    }
}

impl From<HistoryError> for SessionError {
    fn from(err: HistoryError) -> Self {
        SessionError::Persistence(err.to_string())
    }
}

impl From<SettingsError> for SessionError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidValue(reason) => SessionError::InvalidConfig(reason),
            SettingsError::StoragePoisoned => SessionError::StoragePoisoned,
        }
    }
}

impl crate::errors::IntoErrorResponse for SessionError {
    fn status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Expired(_) => StatusCode::GONE,
            SessionError::IllegalAction(_)
            | SessionError::InvalidAmount(_)
            | SessionError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            SessionError::AlreadyInProgress(_) => StatusCode::CONFLICT,
            SessionError::Persistence(_)
            | SessionError::Engine(_)
            | SessionError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "not_found",
            SessionError::Expired(_) => "session_expired",
            SessionError::IllegalAction(_) => "illegal_action",
            SessionError::InvalidAmount(_) => "invalid_amount",
            SessionError::InvalidConfig(_) => "invalid_config",
            SessionError::AlreadyInProgress(_) => "already_in_progress",
            SessionError::Persistence(_) => "persistence_failure",
            SessionError::Engine(_) => "engine_error",
            SessionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            SessionError::NotFound(id) => Some(serde_json::json!({ "game_id": id })),
            SessionError::Expired(id) => Some(serde_json::json!({
                "game_id": id,
                "reason": "Session expired due to inactivity"
            })),
            SessionError::AlreadyInProgress(table) => Some(serde_json::json!({ "table": table })),
            _ => None,
        }
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        use crate::errors::ErrorSeverity;
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            SessionError::Persistence(_) | SessionError::Engine(_) => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}

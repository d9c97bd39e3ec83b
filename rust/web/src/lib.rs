pub mod errors;
pub mod handlers;
pub mod history;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod session;
pub mod settings;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use history::{HistoryError, HistoryRepository, MemoryHistory, SqliteHistory};
pub use logging::{init_logging, init_test_logging, LogEntry, LogFormat, TestLogSubscriber};
pub use middleware::{log_response, with_request_logging};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use session::{
    FinishedHand, GameSession, HandOutcome, HandView, ResetResponse, SeatView, SessionError,
    SessionId, SessionManager, StartHandRequest, StartHandResponse, DEFAULT_TABLE,
};
pub use settings::{
    load_with_sources, AppSettings, ConfigError, SettingsError, SettingsResolved, SettingsStore,
    ValueSource,
};

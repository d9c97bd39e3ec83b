use crate::handlers;
use crate::history::{HistoryError, HistoryRepository, MemoryHistory, SqliteHistory};
use crate::middleware::with_request_logging;
use crate::session::{SessionError, SessionManager};
use crate::settings::{AppSettings, SettingsError, SettingsStore};
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::filters::BoxedFilter;
use warp::hyper::body::Bytes;
use warp::reply::Reply;
use warp::Filter;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    /// SQLite file for hand histories; in-memory when absent
    database: Option<PathBuf>,
    sweep_interval: Duration,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = Some(path.into());
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> Option<&Path> {
        self.database.as_deref()
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppContext {
    config: ServerConfig,
    settings: Arc<SettingsStore>,
    history: Arc<dyn HistoryRepository>,
    sessions: Arc<SessionManager>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn new(config: ServerConfig, settings: AppSettings) -> Result<Self, ServerError> {
        let history: Arc<dyn HistoryRepository> = match config.database() {
            Some(path) => {
                tracing::info!(path = %path.display(), "opening hand history database");
                Arc::new(SqliteHistory::open(path)?)
            }
            None => Arc::new(MemoryHistory::new()),
        };
        let settings = Arc::new(SettingsStore::with_settings(settings)?);
        Ok(Self::new_with_dependencies(config, settings, history))
    }

    pub fn new_with_dependencies(
        config: ServerConfig,
        settings: Arc<SettingsStore>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&history),
            Arc::clone(&settings),
        ));
        Self {
            config,
            settings,
            history,
            sessions,
        }
    }

    pub fn new_for_tests() -> Self {
        Self::new_with_dependencies(
            ServerConfig::for_tests(),
            Arc::new(SettingsStore::new()),
            Arc::new(MemoryHistory::new()),
        )
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn settings(&self) -> Arc<SettingsStore> {
        Arc::clone(&self.settings)
    }

    pub fn history(&self) -> Arc<dyn HistoryRepository> {
        Arc::clone(&self.history)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),
    #[error("History error: {0}")]
    History(#[from] HistoryError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: ServerConfig, settings: AppSettings) -> Result<Self, ServerError> {
        let context = AppContext::new(config, settings)?;
        Ok(Self { context })
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Binds and serves until [`ServerHandle::shutdown`] is called. Also
    /// starts the idle-session sweep.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let config = context.config().clone();
        let bind_addr = Self::bind_addr(&config)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        tracing::info!(address = %addr, "web server listening");

        let task = tokio::spawn(async move {
            server_future.await;
            Ok(())
        });
        let sweeper = Self::spawn_sweeper(context.sessions(), config.sweep_interval());

        Ok(ServerHandle::new(addr, shutdown_tx, task, sweeper, context))
    }

    fn spawn_sweeper(sessions: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = sessions.cleanup_expired_sessions();
                if removed > 0 {
                    tracing::info!(removed, "expired sessions swept");
                }
            }
        })
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }

        ServerError::ConfigError(err.to_string())
    }

    /// Every route, wrapped in request logging.
    pub fn routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let health = Self::health_route();
        let hands = Self::hand_routes(context);
        let settings = Self::settings_routes(context);

        with_request_logging(health.or(hands).unify().or(settings).unify()).boxed()
    }

    fn health_route() -> BoxedFilter<(warp::reply::Response,)> {
        warp::path("health")
            .and(warp::get())
            .and(warp::path::end())
            .map(|| handlers::health::health().into_response())
            .boxed()
    }

    fn hand_routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let sessions = context.sessions();

        let start = warp::path!("api" / "hands" / "start")
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .and(warp::body::bytes())
            .and_then(|sessions: Arc<SessionManager>, body: Bytes| async move {
                let response = handlers::start_hand(sessions, body).await;
                Ok::<_, Infallible>(response)
            });

        let list = warp::path!("api" / "hands")
            .and(warp::get())
            .and(Self::with_session_manager(sessions.clone()))
            .and_then(|sessions: Arc<SessionManager>| async move {
                let response = handlers::list_hands(sessions).await;
                Ok::<_, Infallible>(response)
            });

        let state = warp::path!("api" / "hands" / String)
            .and(warp::get())
            .and(Self::with_session_manager(sessions.clone()))
            .and_then(|id: String, sessions: Arc<SessionManager>| async move {
                let response = handlers::get_hand(sessions, id).await;
                Ok::<_, Infallible>(response)
            });

        let action = warp::path!("api" / "hands" / String / "action")
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .and(warp::body::bytes())
            .and_then(
                |id: String, sessions: Arc<SessionManager>, body: Bytes| async move {
                    let response = handlers::submit_action(sessions, id, body).await;
                    Ok::<_, Infallible>(response)
                },
            );

        let result = warp::path!("api" / "hands" / String / "result")
            .and(warp::get())
            .and(Self::with_session_manager(sessions.clone()))
            .and_then(|id: String, sessions: Arc<SessionManager>| async move {
                let response = handlers::get_result(sessions, id).await;
                Ok::<_, Infallible>(response)
            });

        let reset = warp::path!("api" / "reset")
            .and(warp::post())
            .and(Self::with_session_manager(sessions))
            .and(warp::body::bytes())
            .and_then(|sessions: Arc<SessionManager>, body: Bytes| async move {
                let response = handlers::reset(sessions, body).await;
                Ok::<_, Infallible>(response)
            });

        start
            .or(list)
            .unify()
            .or(state)
            .unify()
            .or(action)
            .unify()
            .or(result)
            .unify()
            .or(reset)
            .unify()
            .boxed()
    }

    fn settings_routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let store = context.settings();

        let get = warp::path!("api" / "settings")
            .and(warp::get())
            .and(Self::with_settings(store.clone()))
            .and_then(|store: Arc<SettingsStore>| async move {
                let response = handlers::get_settings(store).await;
                Ok::<_, Infallible>(response)
            });

        let put = warp::path!("api" / "settings")
            .and(warp::put())
            .and(Self::with_settings(store))
            .and(warp::body::bytes())
            .and_then(|store: Arc<SettingsStore>, body: Bytes| async move {
                let response = handlers::update_settings(store, body).await;
                Ok::<_, Infallible>(response)
            });

        get.or(put).unify().boxed()
    }

    fn with_session_manager(
        sessions: Arc<SessionManager>,
    ) -> impl Filter<Extract = (Arc<SessionManager>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&sessions))
    }

    fn with_settings(
        store: Arc<SettingsStore>,
    ) -> impl Filter<Extract = (Arc<SettingsStore>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&store))
    }
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    sweeper: Option<JoinHandle<()>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        sweeper: JoinHandle<()>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            sweeper: Some(sweeper),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        tracing::info!(address = %self.addr, "web server stopped");
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

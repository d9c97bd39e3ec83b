use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

use holdem_engine::game::TableConfig;

/// Table defaults shared by every new hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub starting_stack: u32,
    pub small_blind: u32,
    pub big_blind: u32,
    /// Seats at a table when the start request leaves it out
    pub default_players: usize,
    /// Policy for automated seats
    pub default_strategy: String,
    /// Idle minutes before a live hand is dropped
    pub session_timeout_minutes: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            starting_stack: 10_000,
            small_blind: 20,
            big_blind: 40,
            default_players: 6,
            default_strategy: "baseline".to_string(),
            session_timeout_minutes: 30,
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.starting_stack == 0 {
            return Err(SettingsError::InvalidValue(
                "starting_stack must be greater than 0".to_string(),
            ));
        }
        if self.small_blind == 0 || self.small_blind > self.big_blind {
            return Err(SettingsError::InvalidValue(
                "small_blind must be positive and no larger than big_blind".to_string(),
            ));
        }
        if self.big_blind > self.starting_stack {
            return Err(SettingsError::InvalidValue(
                "big_blind cannot exceed starting_stack".to_string(),
            ));
        }
        if !(TableConfig::MIN_PLAYERS..=TableConfig::MAX_PLAYERS).contains(&self.default_players) {
            return Err(SettingsError::InvalidValue(format!(
                "default_players must be between {} and {}",
                TableConfig::MIN_PLAYERS,
                TableConfig::MAX_PLAYERS
            )));
        }
        if !holdem_ai::STRATEGIES.contains(&self.default_strategy.as_str()) {
            return Err(SettingsError::InvalidValue(format!(
                "unknown strategy: {}",
                self.default_strategy
            )));
        }
        if self.session_timeout_minutes == 0 {
            return Err(SettingsError::InvalidValue(
                "session_timeout_minutes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes.saturating_mul(60))
    }

    /// Snapshot of the table a new hand is dealt with. The human sits in
    /// seat 1.
    pub fn table_config(&self, num_players: Option<usize>, dealer_index: usize) -> TableConfig {
        TableConfig {
            num_players: num_players.unwrap_or(self.default_players),
            dealer_index,
            human_seat: 0,
            starting_stack: self.starting_stack,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
        }
    }
}

/// The only value shared across sessions. Hands copy what they need at
/// start, so later updates never reach a running hand.
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(AppSettings::default()),
        }
    }

    pub fn with_settings(settings: AppSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    pub fn get(&self) -> Result<AppSettings, SettingsError> {
        self.settings
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SettingsError::StoragePoisoned)
    }

    /// Applies `change` under a single write guard. An invalid result is
    /// rejected and the stored settings stay as they were.
    pub fn modify<F>(&self, change: F) -> Result<AppSettings, SettingsError>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut guard = self
            .settings
            .write()
            .map_err(|_| SettingsError::StoragePoisoned)?;
        let mut next = guard.clone();
        change(&mut next);
        next.validate()?;
        *guard = next.clone();
        tracing::info!(
            starting_stack = next.starting_stack,
            small_blind = next.small_blind,
            big_blind = next.big_blind,
            strategy = %next.default_strategy,
            "settings updated"
        );
        Ok(next)
    }

    /// Changes the stack future hands start with.
    pub fn set_starting_stack(&self, starting_stack: u32) -> Result<AppSettings, SettingsError> {
        self.modify(|settings| settings.starting_stack = starting_stack)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Settings storage poisoned")]
    StoragePoisoned,
}

impl crate::errors::IntoErrorResponse for SettingsError {
    fn status_code(&self) -> warp::http::StatusCode {
        match self {
            SettingsError::InvalidValue(_) => warp::http::StatusCode::BAD_REQUEST,
            SettingsError::StoragePoisoned => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SettingsError::InvalidValue(_) => "invalid_settings",
            SettingsError::StoragePoisoned => "settings_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        use crate::errors::ErrorSeverity;
        match self {
            SettingsError::InvalidValue(_) => ErrorSeverity::Client,
            SettingsError::StoragePoisoned => ErrorSeverity::Critical,
        }
    }
}

// ---------------------------------------------------------------------------
// Layered loading: defaults, then a TOML file, then environment overrides.

pub const CONFIG_ENV: &str = "HOLDEM_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsSources {
    pub starting_stack: ValueSource,
    pub small_blind: ValueSource,
    pub big_blind: ValueSource,
    pub default_players: ValueSource,
    pub default_strategy: ValueSource,
    pub session_timeout_minutes: ValueSource,
}

impl Default for SettingsSources {
    fn default() -> Self {
        Self {
            starting_stack: ValueSource::Default,
            small_blind: ValueSource::Default,
            big_blind: ValueSource::Default,
            default_players: ValueSource::Default,
            default_strategy: ValueSource::Default,
            session_timeout_minutes: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsResolved {
    pub settings: AppSettings,
    pub sources: SettingsSources,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    starting_stack: Option<u32>,
    #[serde(default)]
    small_blind: Option<u32>,
    #[serde(default)]
    big_blind: Option<u32>,
    #[serde(default)]
    default_players: Option<usize>,
    #[serde(default)]
    default_strategy: Option<String>,
    #[serde(default)]
    session_timeout_minutes: Option<u64>,
}

/// Resolves settings from the process environment. An explicit `path`
/// takes precedence over `HOLDEM_CONFIG`.
pub fn load_with_sources(path: Option<&Path>) -> Result<SettingsResolved, ConfigError> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let path = path.map(Path::to_path_buf).or(from_env);
    resolve(path.as_deref(), |name| std::env::var(name).ok())
}

fn resolve(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SettingsResolved, ConfigError> {
    let mut settings = AppSettings::default();
    let mut sources = SettingsSources::default();

    if let Some(path) = path {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&text)?;
        if let Some(v) = file.starting_stack {
            settings.starting_stack = v;
            sources.starting_stack = ValueSource::File;
        }
        if let Some(v) = file.small_blind {
            settings.small_blind = v;
            sources.small_blind = ValueSource::File;
        }
        if let Some(v) = file.big_blind {
            settings.big_blind = v;
            sources.big_blind = ValueSource::File;
        }
        if let Some(v) = file.default_players {
            settings.default_players = v;
            sources.default_players = ValueSource::File;
        }
        if let Some(v) = file.default_strategy {
            settings.default_strategy = v;
            sources.default_strategy = ValueSource::File;
        }
        if let Some(v) = file.session_timeout_minutes {
            settings.session_timeout_minutes = v;
            sources.session_timeout_minutes = ValueSource::File;
        }
    }

    if let Some(v) = env_parse(&env, "HOLDEM_STARTING_STACK")? {
        settings.starting_stack = v;
        sources.starting_stack = ValueSource::Env;
    }
    if let Some(v) = env_parse(&env, "HOLDEM_SMALL_BLIND")? {
        settings.small_blind = v;
        sources.small_blind = ValueSource::Env;
    }
    if let Some(v) = env_parse(&env, "HOLDEM_BIG_BLIND")? {
        settings.big_blind = v;
        sources.big_blind = ValueSource::Env;
    }
    if let Some(v) = env_parse(&env, "HOLDEM_PLAYERS")? {
        settings.default_players = v;
        sources.default_players = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_STRATEGY").filter(|v| !v.is_empty()) {
        settings.default_strategy = v.trim().to_ascii_lowercase();
        sources.default_strategy = ValueSource::Env;
    }
    if let Some(v) = env_parse(&env, "HOLDEM_SESSION_TIMEOUT")? {
        settings.session_timeout_minutes = v;
        sources.session_timeout_minutes = ValueSource::Env;
    }

    settings.validate()?;
    Ok(SettingsResolved { settings, sources })
}

fn env_parse<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match env(var) {
        Some(value) if !value.is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_settings_are_valid() {
        assert!(AppSettings::default().validate().is_ok());
    }

    #[test]
    fn validates_blind_structure() {
        let inverted = AppSettings {
            small_blind: 50,
            big_blind: 40,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let huge_blind = AppSettings {
            big_blind: 20_000,
            ..Default::default()
        };
        assert!(huge_blind.validate().is_err());

        let zero_stack = AppSettings {
            starting_stack: 0,
            ..Default::default()
        };
        assert!(zero_stack.validate().is_err());
    }

    #[test]
    fn validates_players_and_strategy() {
        for players in [1, 11] {
            let settings = AppSettings {
                default_players: players,
                ..Default::default()
            };
            assert!(settings.validate().is_err(), "{players} players accepted");
        }
        let settings = AppSettings {
            default_strategy: "aggressive".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejected_changes_leave_the_store_alone() {
        let store = SettingsStore::new();
        let updated = store.modify(|s| s.big_blind = 100).expect("update");
        assert_eq!(updated.big_blind, 100);

        assert!(store.modify(|s| s.small_blind = 500).is_err());
        assert!(store.set_starting_stack(0).is_err());
        assert_eq!(store.get().expect("get"), updated);
    }

    #[test]
    fn concurrent_changes_to_different_fields_all_land() {
        let store = std::sync::Arc::new(SettingsStore::new());
        let workers: Vec<_> = (0..8u32)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if n % 2 == 0 {
                            store.set_starting_stack(5_000).expect("stack");
                        } else {
                            store.modify(|s| s.default_players = 4).expect("players");
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker");
        }

        let settings = store.get().expect("get");
        assert_eq!(settings.starting_stack, 5_000);
        assert_eq!(settings.default_players, 4);
    }

    #[test]
    fn table_config_copies_table_defaults() {
        let settings = AppSettings {
            starting_stack: 2_000,
            ..Default::default()
        };
        let config = settings.table_config(None, 2);
        assert_eq!(config.num_players, 6);
        assert_eq!(config.dealer_index, 2);
        assert_eq!(config.starting_stack, 2_000);
        assert_eq!(config.human_seat, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolve_without_inputs_reports_defaults() {
        let resolved = resolve(None, no_env).expect("resolve");
        assert_eq!(resolved.settings, AppSettings::default());
        assert_eq!(resolved.sources, SettingsSources::default());
    }

    #[test]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "starting_stack = 5000\nbig_blind = 100\nsmall_blind = 50").expect("write");

        let env: HashMap<&str, &str> =
            HashMap::from([("HOLDEM_BIG_BLIND", "200"), ("HOLDEM_STRATEGY", "Passive")]);
        let resolved = resolve(Some(file.path()), |name| {
            env.get(name).map(|v| v.to_string())
        })
        .expect("resolve");

        assert_eq!(resolved.settings.starting_stack, 5_000);
        assert_eq!(resolved.sources.starting_stack, ValueSource::File);
        assert_eq!(resolved.settings.big_blind, 200);
        assert_eq!(resolved.sources.big_blind, ValueSource::Env);
        assert_eq!(resolved.settings.small_blind, 50);
        assert_eq!(resolved.settings.default_strategy, "passive");
        assert_eq!(resolved.sources.session_timeout_minutes, ValueSource::Default);
    }

    #[test]
    fn malformed_inputs_are_reported() {
        let err = resolve(None, |name| {
            (name == "HOLDEM_PLAYERS").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "HOLDEM_PLAYERS", .. }));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "starting_stack = \"deep\"").expect("write");
        assert!(matches!(
            resolve(Some(file.path()), no_env),
            Err(ConfigError::Parse(_))
        ));

        let missing = Path::new("/definitely/not/here.toml");
        assert!(matches!(
            resolve(Some(missing), no_env),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn resolved_settings_are_validated() {
        let err = resolve(None, |name| {
            (name == "HOLDEM_SMALL_BLIND").then(|| "80".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}

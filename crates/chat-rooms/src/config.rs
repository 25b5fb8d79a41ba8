//! Chat server configuration.
//!
//! Configuration is loaded from environment variables. Every variable is optional; the
//! defaults describe a single building "school" with one room "cafeteria".

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default building name.
pub const DEFAULT_BUILDING: &str = "school";

/// Default comma-separated room list.
pub const DEFAULT_ROOMS: &str = "cafeteria";

/// Default comma-separated censored word list.
pub const DEFAULT_CENSORED_WORDS: &str = "hell";

/// Default time a room waits for its censor, in milliseconds.
pub const DEFAULT_CENSOR_TIMEOUT_MS: u64 = 1000;

/// Default deadline of every other mesh query, in milliseconds.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 1000;

/// Default public address announcement interval in seconds (`0` disables it).
pub const DEFAULT_ANNOUNCE_INTERVAL_SECS: u64 = 10;

/// Default time allowed between two frames from a websocket peer, in seconds.
pub const DEFAULT_PONG_WAIT_SECS: u64 = 60;

/// Default time allowed to write one frame to a websocket peer, in seconds.
pub const DEFAULT_WRITE_WAIT_SECS: u64 = 10;

/// Longest timeout or interval accepted from the environment (one week).
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default maximum inbound frame size in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Limits applied to every websocket session.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    /// A peer that sends nothing (not even a pong) for this long is disconnected.
    pub pong_wait: Duration,

    /// Deadline for writing one frame.
    pub write_wait: Duration,

    /// Larger inbound frames end the session.
    pub max_message_size: usize,

    /// Deadline for the disconnect notification sent to the user cell.
    pub query_timeout: Duration,
}

impl GatewaySettings {
    /// Pings go out at 9/10 of the pong wait, so a healthy peer always answers in time.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait - self.pong_wait / 10
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            pong_wait: Duration::from_secs(DEFAULT_PONG_WAIT_SECS),
            write_wait: Duration::from_secs(DEFAULT_WRITE_WAIT_SECS),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }
}

/// Chat server configuration.
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    /// HTTP bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Name of the single building served.
    pub building: String,

    /// Rooms created at startup.
    pub rooms: Vec<String>,

    /// Words every censor rejects.
    pub censored_words: Vec<String>,

    /// How long a room waits for its censor before dropping a message.
    pub censor_timeout: Duration,

    /// Deadline of membership checks and listing queries.
    pub query_timeout: Duration,

    /// Interval of the public address time announcement; `None` disables it.
    pub announce_interval: Option<Duration>,

    /// Attach a logging listener to every room.
    pub log_rooms: bool,

    pub gateway: GatewaySettings,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("bind_address", &self.bind_address)
            .field("building", &self.building)
            .field("rooms", &self.rooms)
            // The word list is not something to print in logs.
            .field("censored_words", &self.censored_words.len())
            .field("censor_timeout", &self.censor_timeout)
            .field("query_timeout", &self.query_timeout)
            .field("announce_interval", &self.announce_interval)
            .field("log_rooms", &self.log_rooms)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            building: DEFAULT_BUILDING.to_string(),
            rooms: split_list(DEFAULT_ROOMS),
            censored_words: split_list(DEFAULT_CENSORED_WORDS),
            censor_timeout: Duration::from_millis(DEFAULT_CENSOR_TIMEOUT_MS),
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            announce_interval: Some(Duration::from_secs(DEFAULT_ANNOUNCE_INTERVAL_SECS)),
            log_rooms: false,
            gateway: GatewaySettings::default(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("CHAT_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let building = vars
            .get("CHAT_BUILDING")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BUILDING.to_string());
        if building.is_empty() {
            return Err(invalid("CHAT_BUILDING", &building, "must not be empty"));
        }

        let rooms = split_list(
            vars.get("CHAT_ROOMS")
                .map(String::as_str)
                .unwrap_or(DEFAULT_ROOMS),
        );
        if rooms.is_empty() {
            let value = vars.get("CHAT_ROOMS").cloned().unwrap_or_default();
            return Err(invalid("CHAT_ROOMS", &value, "at least one room is required"));
        }

        let censored_words = split_list(
            vars.get("CHAT_CENSORED_WORDS")
                .map(String::as_str)
                .unwrap_or(DEFAULT_CENSORED_WORDS),
        );

        let censor_timeout = bounded(
            vars,
            "CHAT_CENSOR_TIMEOUT_MS",
            Duration::from_millis(positive(vars, "CHAT_CENSOR_TIMEOUT_MS", DEFAULT_CENSOR_TIMEOUT_MS)?),
        )?;
        let query_timeout = bounded(
            vars,
            "CHAT_QUERY_TIMEOUT_MS",
            Duration::from_millis(positive(vars, "CHAT_QUERY_TIMEOUT_MS", DEFAULT_QUERY_TIMEOUT_MS)?),
        )?;

        // Zero is allowed here and switches the announcements off.
        let announce_secs: u64 = number(
            vars,
            "CHAT_ANNOUNCE_INTERVAL_SECS",
            DEFAULT_ANNOUNCE_INTERVAL_SECS,
        )?;
        let announce_interval = match announce_secs {
            0 => None,
            secs => Some(bounded(
                vars,
                "CHAT_ANNOUNCE_INTERVAL_SECS",
                Duration::from_secs(secs),
            )?),
        };

        let log_rooms = number(vars, "CHAT_LOG_ROOMS", false)?;

        let gateway = GatewaySettings {
            pong_wait: bounded(
                vars,
                "CHAT_PONG_WAIT_SECS",
                Duration::from_secs(positive(vars, "CHAT_PONG_WAIT_SECS", DEFAULT_PONG_WAIT_SECS)?),
            )?,
            write_wait: bounded(
                vars,
                "CHAT_WRITE_WAIT_SECS",
                Duration::from_secs(positive(vars, "CHAT_WRITE_WAIT_SECS", DEFAULT_WRITE_WAIT_SECS)?),
            )?,
            max_message_size: positive(vars, "CHAT_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE)?,
            query_timeout,
        };

        Ok(ChatConfig {
            bind_address,
            building,
            rooms,
            censored_words,
            censor_timeout,
            query_timeout,
            announce_interval,
            log_rooms,
            gateway,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Parses `var` if present, otherwise returns `default`.
fn number<T>(vars: &HashMap<String, String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match vars.get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, value, e.to_string())),
        None => Ok(default),
    }
}

/// Like [`number`], but zero is rejected.
fn positive<T>(vars: &HashMap<String, String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: fmt::Display,
{
    let value = number(vars, var, default)?;
    if value == T::default() {
        let raw = vars.get(var).cloned().unwrap_or_default();
        return Err(invalid(var, &raw, "must be greater than 0"));
    }
    Ok(value)
}

/// Rejects durations above [`MAX_INTERVAL`].
fn bounded(
    vars: &HashMap<String, String>,
    var: &'static str,
    duration: Duration,
) -> Result<Duration, ConfigError> {
    if duration > MAX_INTERVAL {
        let raw = vars.get(var).cloned().unwrap_or_default();
        return Err(invalid(
            var,
            &raw,
            format!("must not exceed {} seconds", MAX_INTERVAL.as_secs()),
        ));
    }
    Ok(duration)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

use planner_utils::create_random_secret;
use std::{fmt::Display, str::FromStr};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to verify the session tokens issued by the identity
    /// provider bridge
    pub session_secret: String,
    /// Port for the application to run on
    pub port: usize,
    /// Url of the http mail relay delivering notifications. When not set,
    /// notifications are only logged.
    pub mail_relay_url: Option<String>,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// An event is reminded about when it starts within this many millis
    pub window_millis: i64,
    /// How often to look for events to remind about
    pub tick_interval_secs: u64,
    /// Upper bound for delivering a single reminder
    pub dispatch_timeout_secs: u64,
    /// Identity reminders are sent from
    pub sender: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            window_millis: 1000 * 60 * 20, // 20 minutes
            tick_interval_secs: 60,
            dispatch_timeout_secs: 10,
            sender: "reminders@planner.local".into(),
        }
    }
}

impl ReminderConfig {
    fn from_env() -> Self {
        let default = Self::default();
        let window_minutes = parse_positive_or(
            "REMINDER_WINDOW_MINUTES",
            env("REMINDER_WINDOW_MINUTES"),
            default.window_millis / (1000 * 60),
        );
        Self {
            window_millis: minutes_to_millis_or(window_minutes, default.window_millis),
            tick_interval_secs: parse_positive_or(
                "REMINDER_TICK_INTERVAL_SECS",
                env("REMINDER_TICK_INTERVAL_SECS"),
                default.tick_interval_secs,
            ),
            dispatch_timeout_secs: parse_positive_or(
                "REMINDER_DISPATCH_TIMEOUT_SECS",
                env("REMINDER_DISPATCH_TIMEOUT_SECS"),
                default.dispatch_timeout_secs,
            ),
            sender: env("REMINDER_SENDER").unwrap_or(default.sender),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let session_secret = match env("SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                info!("Did not find SESSION_SECRET environment variable. Going to create one.");
                let secret = create_random_secret(32);
                info!("Secret for verifying session tokens was generated and set to: {}", secret);
                secret
            }
        };
        let port = parse_or("PORT", env("PORT"), 5000);

        Self {
            session_secret,
            port,
            mail_relay_url: env("MAIL_RELAY_URL").filter(|url| !url.trim().is_empty()),
            reminders: ReminderConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T: FromStr + Display>(key: &str, value: Option<String>, default: T) -> T {
    let value = match value {
        Some(value) => value,
        None => return default,
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(
                "The given {}: {} is not valid, falling back to the default: {}.",
                key, value, default
            );
            default
        }
    }
}

fn parse_positive_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display + PartialOrd + Default + Copy,
{
    let parsed = parse_or(key, value, default);
    if parsed <= T::default() {
        warn!(
            "The given {}: {} must be positive, falling back to the default: {}.",
            key, parsed, default
        );
        return default;
    }
    parsed
}

fn minutes_to_millis_or(minutes: i64, default_millis: i64) -> i64 {
    match minutes.checked_mul(1000 * 60) {
        Some(millis) => millis,
        None => {
            warn!(
                "The given REMINDER_WINDOW_MINUTES: {} is too large, falling back to the default: {} minutes.",
                minutes,
                default_millis / (1000 * 60)
            );
            default_millis
        }
    }
}

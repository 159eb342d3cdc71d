use std::env;
use std::str::FromStr;

use log::warn;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN};
use crate::events::DEFAULT_EVENT_BUFFER;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    /// Hash attempts allowed per admission; `None` searches until solved.
    pub pow_max_attempts: Option<u64>,
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            difficulty: DEFAULT_DIFFICULTY,
            pow_max_attempts: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let difficulty: u32 = parse_or(&lookup, "DIFFICULTY", defaults.difficulty);
        let clamped = difficulty.clamp(DIFF_MIN, DIFF_MAX);
        if clamped != difficulty {
            warn!("DIFFICULTY={difficulty} out of range, using {clamped}");
        }

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            difficulty: clamped,
            pow_max_attempts: lookup("POW_MAX_ATTEMPTS").and_then(|v| match v.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("POW_MAX_ATTEMPTS={v:?} is not a number, searching without a budget");
                    None
                }
            }),
            event_buffer: parse_or(&lookup, "EVENT_BUFFER", defaults.event_buffer),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{key}={raw:?} is invalid, using default");
            default
        }),
        None => default,
    }
}

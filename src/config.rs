use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::model::target_from_secs;
use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_TARGET_BLOCK_TIME_SECS};
use crate::error::{ChainError, Result};

/// Runtime settings read from the environment (and `.env`, loaded in `main`).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub initial_difficulty: u32,
    pub target_block_time: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or blank keys fall
    /// back to defaults; anything else must parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 8080)?;
        let initial_difficulty = parse_or(&lookup, "INITIAL_DIFFICULTY", DEFAULT_DIFFICULTY)?;
        let target_secs = parse_or(
            &lookup,
            "TARGET_BLOCK_TIME_SECS",
            DEFAULT_TARGET_BLOCK_TIME_SECS,
        )?;

        Ok(Self {
            host,
            port,
            initial_difficulty,
            target_block_time: target_from_secs(target_secs)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ChainError::Config {
            key,
            value: raw,
        }),
        _ => Ok(default),
    }
}

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use poise::serenity_prelude::UserId;

use crate::BotError;

/// Runtime configuration pulled from the environment once at startup.
///
/// The Discord and Riot tokens are read separately in `main` since they never
/// travel past client construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single administrator who approves or rejects new events.
    pub admin_user_id: UserId,
    /// Riot platform region, e.g. `na1` or `euw1`.
    pub region: String,
    /// Path of the persisted state document.
    pub state_file: PathBuf,
    /// UTC time of day for the daily schedule check.
    pub check_hour: u32,
    pub check_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, BotError> {
        let admin_user_id = std::env::var("ADMIN_USER_ID")
            .context("ADMIN_USER_ID environment variable not found")?
            .parse::<u64>()
            .context("ADMIN_USER_ID must be a Discord user id")?;

        let region = std::env::var("RIOT_REGION").unwrap_or_else(|_| "na1".to_string());

        let state_file = std::env::var("CLASH_STATE_FILE")
            .unwrap_or_else(|_| "clash_state.json".to_string())
            .into();

        let check_hour = env_number("CHECK_HOUR_UTC", 18)?;
        let check_minute = env_number("CHECK_MINUTE_UTC", 0)?;
        if check_hour >= 24 || check_minute >= 60 {
            return Err(anyhow!(
                "CHECK_HOUR_UTC/CHECK_MINUTE_UTC must form a valid time of day, got {}:{}",
                check_hour,
                check_minute
            ));
        }

        Ok(Self {
            admin_user_id: UserId::new(admin_user_id),
            region,
            state_file,
            check_hour,
            check_minute,
        })
    }
}

fn env_number(name: &str, default: u32) -> Result<u32, BotError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u32>()
            .with_context(|| format!("{} must be a number, got {:?}", name, value)),
        Err(_) => Ok(default),
    }
}

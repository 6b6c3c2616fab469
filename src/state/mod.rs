use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::rsvp::{ClashDay, RemoveOutcome, Role, RsvpMap};
use crate::BotError;

/// Everything the bot remembers about one guild.
///
/// Created lazily the first time reconciliation or configuration touches the
/// guild; never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildAnnouncement {
    /// The explicitly configured announcement channel, if any.
    #[serde(default)]
    pub channel_id: Option<u64>,
    /// The currently-live announcement message.
    #[serde(default)]
    pub message_id: Option<u64>,
    /// Where that message actually landed. May differ from `channel_id` when
    /// the configured channel was unusable and a fallback was picked.
    #[serde(default)]
    pub message_channel_id: Option<u64>,
    /// The composite event id last announced or updated for this guild.
    #[serde(default)]
    pub last_event_id: Option<String>,
    #[serde(default)]
    pub saturday: RsvpMap,
    #[serde(default)]
    pub sunday: RsvpMap,
}

impl GuildAnnouncement {
    pub fn rsvps(&self, day: ClashDay) -> &RsvpMap {
        match day {
            ClashDay::Saturday => &self.saturday,
            ClashDay::Sunday => &self.sunday,
        }
    }

    /// Records or overwrites a user's signup; returns the selection as stored.
    pub fn set_rsvp(&mut self, day: ClashDay, user_id: &str, roles: Vec<Role>) -> Vec<Role> {
        crate::rsvp::set_rsvp(self.rsvps_mut(day), user_id, roles)
    }

    /// Drops a user's signup for one day, if any.
    pub fn remove_rsvp(&mut self, day: ClashDay, user_id: &str) -> RemoveOutcome {
        crate::rsvp::remove_rsvp(self.rsvps_mut(day), user_id)
    }

    /// Clears both days, for when a new event replaces the old one.
    pub fn reset_rsvps(&mut self) {
        self.saturday.clear();
        self.sunday.clear();
    }

    fn rsvps_mut(&mut self, day: ClashDay) -> &mut RsvpMap {
        match day {
            ClashDay::Saturday => &mut self.saturday,
            ClashDay::Sunday => &mut self.sunday,
        }
    }
}

/// The persisted state root: one document holding every guild plus the
/// approval sets. Missing fields default so older documents still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClashState {
    #[serde(default)]
    pub guilds: BTreeMap<String, GuildAnnouncement>,
    /// Composite event ids awaiting an administrator decision.
    #[serde(default)]
    pub pending: BTreeSet<String>,
    /// Composite event ids cleared for broadcast.
    #[serde(default)]
    pub approved: BTreeSet<String>,
}

impl ClashState {
    /// The single place where guild entries come into existence.
    pub fn get_or_create_guild(&mut self, guild_id: &str) -> &mut GuildAnnouncement {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    pub fn guild(&self, guild_id: &str) -> Option<&GuildAnnouncement> {
        self.guilds.get(guild_id)
    }
}

/// Durable storage for the bot's state: a single JSON document, replaced
/// wholesale on every save.
///
/// All mutation funnels through [`JsonStore::mutate`], which holds the lock
/// across the whole load-mutate-persist sequence. That serializes the daily
/// check, manual checks and concurrent button presses against each other.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<ClashState>,
}

impl JsonStore {
    /// Loads the state document, substituting a fresh default when the file
    /// is missing or unreadable. Never fails startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        "State file {} is malformed, starting fresh: {}",
                        path.display(),
                        e
                    );
                    ClashState::default()
                }
            },
            Err(_) => ClashState::default(),
        };

        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Applies a mutation and writes the whole document back atomically.
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut ClashState) -> T) -> Result<T, BotError> {
        let mut state = self.state.lock().await;
        let result = f(&mut state);
        write_document(&self.path, &state)?;
        Ok(result)
    }

    /// Reads from the current state without persisting anything.
    pub async fn read<T>(&self, f: impl FnOnce(&ClashState) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }
}

/// Full-document replace: write to a sibling temp file, then rename over the
/// old document so a crash mid-write never leaves a torn file.
fn write_document(path: &Path, state: &ClashState) -> Result<(), BotError> {
    let serialized = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serialized)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsvp::Role;

    fn temp_state_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("clash-bot-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn state_survives_a_save_and_reload() {
        let path = temp_state_path("roundtrip");

        let store = JsonStore::load(&path);
        store
            .mutate(|state| {
                let guild = state.get_or_create_guild("42");
                guild.channel_id = Some(1000);
                guild.message_id = Some(2000);
                guild.last_event_id = Some("10_11".to_string());
                guild.set_rsvp(ClashDay::Saturday, "7", vec![Role::Top, Role::Fill]);
                state.pending.insert("12_13".to_string());
                state.approved.insert("10_11".to_string());
                // an empty guild entry must survive too
                state.get_or_create_guild("43");
            })
            .await
            .unwrap();

        let original = store.read(|state| state.clone()).await;
        let reloaded = JsonStore::load(&path).read(|state| state.clone()).await;

        assert_eq!(original, reloaded);
        assert_eq!(
            reloaded.guild("42").unwrap().saturday.get("7"),
            Some(&vec![Role::Top, Role::Fill])
        );
        assert!(reloaded.guild("43").unwrap().saturday.is_empty());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn malformed_document_falls_back_to_empty_state() {
        let path = temp_state_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();

        let state = JsonStore::load(&path).read(|state| state.clone()).await;

        assert_eq!(state, ClashState::default());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_document_starts_empty() {
        let path = temp_state_path("missing-file-nonexistent");
        std::fs::remove_file(&path).ok();

        let state = JsonStore::load(&path).read(|state| state.clone()).await;

        assert!(state.guilds.is_empty());
        assert!(state.pending.is_empty());
        assert!(state.approved.is_empty());
    }

    #[tokio::test]
    async fn document_with_missing_keys_still_loads() {
        let path = temp_state_path("partial");
        std::fs::write(&path, r#"{ "guilds": { "42": { "channel_id": 5 } } }"#).unwrap();

        let state = JsonStore::load(&path).read(|state| state.clone()).await;

        let guild = state.guild("42").unwrap();
        assert_eq!(guild.channel_id, Some(5));
        assert_eq!(guild.message_id, None);
        assert!(guild.saturday.is_empty());

        std::fs::remove_file(&path).ok();
    }
}

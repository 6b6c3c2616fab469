use std::collections::BTreeSet;

use chrono::Utc;
use futures::future::join_all;
use poise::serenity_prelude::{
    self as serenity, ChannelId, ChannelType, CreateMessage, EditMessage, GuildChannel, GuildId,
    MessageId,
};
use tracing::{error, info, warn};

use crate::announcement::{announcement_components, announcement_embed, ANNOUNCEMENT_CONTENT};
use crate::api::models::upcoming_schedule;
use crate::api::{ApiResult, ClashApi};
use crate::approval::{request_decision, GateCheck};
use crate::state::GuildAnnouncement;
use crate::window::{split_composite_id, EventWindow};
use crate::{BotData, BotError};

/// Channel names tried first when no announcement channel is configured.
const PREFERRED_CHANNELS: [&str; 4] = ["general", "clash", "league", "announcements"];

/// What to do with one guild's announcement for a freshly resolved event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// The guild already announced exactly this event.
    UpToDate,
    /// The event overlaps the one already announced: edit in place, keep signups.
    Update,
    /// A genuinely new event: reset signups and post fresh.
    NewPost,
}

/// Decides between updating the live announcement and starting over.
///
/// An event counts as "the same, shifted" when its member ids share at least
/// one id with the previously announced event and a live message still
/// exists to edit. `forced` is set for targeted re-checks, which refresh
/// even an up-to-date guild.
pub fn decide(
    last_event_id: Option<&str>,
    has_message: bool,
    new_composite_id: &str,
    forced: bool,
) -> ReconcileAction {
    if !forced && last_event_id == Some(new_composite_id) {
        return ReconcileAction::UpToDate;
    }

    let old_ids: BTreeSet<String> = last_event_id.map(split_composite_id).unwrap_or_default();
    let new_ids = split_composite_id(new_composite_id);

    if has_message && !old_ids.is_disjoint(&new_ids) {
        ReconcileAction::Update
    } else {
        ReconcileAction::NewPost
    }
}

/// One fetch-resolve-gate-broadcast cycle.
///
/// Both the daily schedule and the manual per-guild command land here; the
/// manual path narrows `target` to a single guild and forces a refresh even
/// when that guild is already up to date. Fetch failures are logged and
/// treated as an empty schedule, so a bad cycle changes nothing.
pub async fn run_clash_check(
    ctx: &serenity::Context,
    data: &BotData,
    target: Option<GuildId>,
) -> Result<(), BotError> {
    info!("Checking for Clash tournaments...");

    let tournaments = match data.api.fetch_tournaments().await {
        Ok(ApiResult::Ok(tournaments)) => tournaments,
        Ok(ApiResult::NotFound) => {
            warn!("Clash tournament endpoint returned nothing this cycle");
            return Ok(());
        }
        Ok(ApiResult::RateLimited) => {
            warn!("Rate limited by the Riot API, skipping this cycle");
            return Ok(());
        }
        Ok(ApiResult::Maintenance) => {
            warn!("Riot API is under maintenance, skipping this cycle");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to fetch Clash tournaments: {}", e);
            return Ok(());
        }
    };

    let schedule = upcoming_schedule(&tournaments, Utc::now().timestamp_millis());
    let Some(window) = EventWindow::resolve(&schedule) else {
        info!("No upcoming Clash days found");
        return Ok(());
    };

    info!("Current event id: {}", window.composite_id);

    let check = data
        .store
        .mutate(|state| state.gate_offer(&window.composite_id))
        .await?;

    match check {
        GateCheck::Approved => broadcast(ctx, data, &window, target).await,
        GateCheck::AlreadyPending => {
            info!(
                "Event {} is still awaiting an administrator decision",
                window.composite_id
            );
            Ok(())
        }
        GateCheck::NewlyPending => {
            let preview = announcement_embed(&window, &GuildAnnouncement::default());
            request_decision(ctx, data.config.admin_user_id, &window, preview).await
        }
    }
}

/// Rolls the event out to every targeted guild. Guilds are reconciled
/// concurrently and in isolation: one guild failing to resolve a channel or
/// accept a message never stops the others.
pub async fn broadcast(
    ctx: &serenity::Context,
    data: &BotData,
    window: &EventWindow,
    target: Option<GuildId>,
) -> Result<(), BotError> {
    let guild_ids = match target {
        Some(guild_id) => vec![guild_id],
        None => ctx.cache.guilds(),
    };
    let forced = target.is_some();

    let results = join_all(
        guild_ids
            .iter()
            .map(|guild_id| reconcile_guild(ctx, data, window, *guild_id, forced)),
    )
    .await;

    for (guild_id, result) in guild_ids.iter().zip(results) {
        if let Err(e) = result {
            error!("Failed to reconcile guild {}: {}", guild_id, e);
        }
    }

    Ok(())
}

/// Runs the update-vs-new-post decision for one guild and applies it.
async fn reconcile_guild(
    ctx: &serenity::Context,
    data: &BotData,
    window: &EventWindow,
    guild_id: GuildId,
    forced: bool,
) -> Result<(), BotError> {
    let guild_key = guild_id.to_string();
    let snapshot = data
        .store
        .read(|state| state.guild(&guild_key).cloned())
        .await
        .unwrap_or_default();

    let action = decide(
        snapshot.last_event_id.as_deref(),
        snapshot.message_id.is_some(),
        &window.composite_id,
        forced,
    );

    if action == ReconcileAction::UpToDate {
        return Ok(());
    }

    let Some(channel) = resolve_channel(ctx, guild_id, snapshot.channel_id.map(ChannelId::new))
    else {
        warn!("No suitable channel found for guild {}. Skipping.", guild_id);
        return Ok(());
    };

    if action == ReconcileAction::Update {
        match update_in_place(ctx, data, window, &guild_key, &snapshot, channel).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                // the recorded message is gone or unreachable, start over
                info!(
                    "Could not update announcement in guild {} ({}), posting new",
                    guild_id, e
                );
            }
        }
    }

    post_new(ctx, data, window, &guild_key, channel).await
}

/// Edits the existing announcement, keeping the current signups.
async fn update_in_place(
    ctx: &serenity::Context,
    data: &BotData,
    window: &EventWindow,
    guild_key: &str,
    snapshot: &GuildAnnouncement,
    fallback_channel: ChannelId,
) -> Result<(), BotError> {
    let message_id = snapshot
        .message_id
        .map(MessageId::new)
        .ok_or_else(|| anyhow::anyhow!("no recorded message id"))?;
    let message_channel = snapshot
        .message_channel_id
        .map(ChannelId::new)
        .unwrap_or(fallback_channel);

    // verify the message still exists before committing the new identity
    message_channel.message(&ctx.http, message_id).await?;

    let embed = announcement_embed(window, snapshot);
    message_channel
        .edit_message(
            &ctx.http,
            message_id,
            EditMessage::new()
                .embed(embed)
                .components(announcement_components()),
        )
        .await?;

    data.store
        .mutate(|state| {
            state.get_or_create_guild(guild_key).last_event_id =
                Some(window.composite_id.clone());
        })
        .await?;

    info!("Updated announcement in guild {}", guild_key);
    Ok(())
}

/// Posts a fresh announcement with both signup lists reset.
async fn post_new(
    ctx: &serenity::Context,
    data: &BotData,
    window: &EventWindow,
    guild_key: &str,
    channel: ChannelId,
) -> Result<(), BotError> {
    let reset = data
        .store
        .mutate(|state| {
            let guild = state.get_or_create_guild(guild_key);
            guild.reset_rsvps();
            guild.last_event_id = Some(window.composite_id.clone());
            guild.clone()
        })
        .await?;

    let embed = announcement_embed(window, &reset);
    let message = channel
        .send_message(
            &ctx.http,
            CreateMessage::default()
                .content(ANNOUNCEMENT_CONTENT)
                .embed(embed)
                .components(announcement_components()),
        )
        .await?;

    data.store
        .mutate(|state| {
            let guild = state.get_or_create_guild(guild_key);
            guild.message_id = Some(message.id.get());
            guild.message_channel_id = Some(channel.get());
        })
        .await?;

    info!("Posted new announcement in guild {}", guild_key);
    Ok(())
}

/// Picks the channel to announce in: the configured channel if it still
/// exists, then the system channel, then named channels the community would
/// expect, then anything the bot can send to.
fn resolve_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    configured: Option<ChannelId>,
) -> Option<ChannelId> {
    let bot_id = ctx.cache.current_user().id;
    let guild = ctx.cache.guild(guild_id)?;
    let me = guild.members.get(&bot_id)?;

    let can_send = |channel: &GuildChannel| {
        guild
            .user_permissions_in(channel, me)
            .send_messages()
    };

    if let Some(id) = configured {
        if let Some(channel) = guild.channels.get(&id) {
            return Some(channel.id);
        }
    }

    if let Some(system) = guild
        .system_channel_id
        .and_then(|id| guild.channels.get(&id))
    {
        if can_send(system) {
            return Some(system.id);
        }
    }

    let mut text_channels: Vec<&GuildChannel> = guild
        .channels
        .values()
        .filter(|channel| channel.kind == ChannelType::Text)
        .collect();
    text_channels.sort_by_key(|channel| channel.position);

    if let Some(preferred) = text_channels
        .iter()
        .find(|channel| PREFERRED_CHANNELS.contains(&channel.name.as_str()) && can_send(channel))
    {
        return Some(preferred.id);
    }

    text_channels
        .into_iter()
        .find(|channel| can_send(channel))
        .map(|channel| channel.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_ids_with_a_live_message_update_in_place() {
        let action = decide(Some("10_11"), true, "11_12_13", false);

        assert_eq!(action, ReconcileAction::Update);
    }

    #[test]
    fn disjoint_ids_post_fresh() {
        let action = decide(Some("5_6"), true, "11_12", false);

        assert_eq!(action, ReconcileAction::NewPost);
    }

    #[test]
    fn overlap_without_a_message_still_posts_fresh() {
        let action = decide(Some("10_11"), false, "11_12", false);

        assert_eq!(action, ReconcileAction::NewPost);
    }

    #[test]
    fn identical_ids_are_a_no_op() {
        let action = decide(Some("10_11"), true, "10_11", false);

        assert_eq!(action, ReconcileAction::UpToDate);
    }

    #[test]
    fn targeted_rechecks_refresh_even_when_up_to_date() {
        let action = decide(Some("10_11"), true, "10_11", true);

        assert_eq!(action, ReconcileAction::Update);
    }

    #[test]
    fn a_guild_that_never_announced_posts_fresh() {
        let action = decide(None, false, "10_11", false);

        assert_eq!(action, ReconcileAction::NewPost);
    }
}

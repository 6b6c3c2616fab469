use anyhow::anyhow;
use chrono::DateTime;
use poise::CreateReply;
use prettytable::{row, Table};
use tracing::{info, instrument};

use super::{checks::is_admin, CommandsContainer};
use crate::api::{ApiResult, ClashApi};
use crate::reconcile::run_clash_check;
use crate::{BotContext, BotData, BotError};

/// CommandsContainer for the administrator commands.
pub struct AdminCommands;

impl CommandsContainer for AdminCommands {
    type Data = BotData;
    type Error = BotError;

    fn get_all() -> Vec<poise::Command<Self::Data, Self::Error>> {
        vec![
            set_clash_channel_slash(),
            check_clash_slash(),
            list_tournaments_slash(),
        ]
    }
}

/// Set the current channel as the target for Clash announcements.
#[poise::command(
    slash_command,
    guild_only,
    check = "is_admin",
    rename = "set_clash_channel"
)]
#[instrument(skip(ctx))]
async fn set_clash_channel_slash(ctx: BotContext<'_>) -> Result<(), BotError> {
    let guild_id = ctx
        .guild_id()
        .ok_or(anyhow!("set_clash_channel used outside of a guild"))?;
    let channel_id = ctx.channel_id();

    ctx.data()
        .store
        .mutate(|state| {
            state.get_or_create_guild(&guild_id.to_string()).channel_id = Some(channel_id.get());
        })
        .await?;

    info!(
        "Announcement channel for guild {} set to {}",
        guild_id, channel_id
    );
    ctx.say(format!(
        "✅ Clash announcements will now be posted in <#{}>.",
        channel_id
    ))
    .await?;

    Ok(())
}

/// Manually check for upcoming Clash tournaments in this guild.
#[poise::command(slash_command, guild_only, check = "is_admin", rename = "check_clash")]
#[instrument(skip(ctx))]
async fn check_clash_slash(ctx: BotContext<'_>) -> Result<(), BotError> {
    let guild_id = ctx
        .guild_id()
        .ok_or(anyhow!("check_clash used outside of a guild"))?;

    ctx.send(
        CreateReply::default()
            .content("Manually checking...")
            .ephemeral(true),
    )
    .await?;

    run_clash_check(ctx.serenity_context(), ctx.data(), Some(guild_id)).await
}

/// Dump the raw upcoming tournament schedule from the Riot API.
#[poise::command(
    slash_command,
    guild_only,
    check = "is_admin",
    rename = "list_tournaments"
)]
#[instrument(skip(ctx))]
async fn list_tournaments_slash(ctx: BotContext<'_>) -> Result<(), BotError> {
    ctx.defer_ephemeral().await?;

    let tournaments = match ctx.data().api.fetch_tournaments().await? {
        ApiResult::Ok(tournaments) => tournaments,
        ApiResult::NotFound => {
            ctx.say("The Riot API returned nothing for this region.")
                .await?;
            return Ok(());
        }
        ApiResult::RateLimited => {
            ctx.say("Rate limited by the Riot API, try again in a minute.")
                .await?;
            return Ok(());
        }
        ApiResult::Maintenance => {
            ctx.say("The Riot API is under maintenance.").await?;
            return Ok(());
        }
    };

    if tournaments.is_empty() {
        ctx.say("No tournaments are currently published.").await?;
        return Ok(());
    }

    let mut table = Table::new();
    table.set_titles(row![
        "Tournament",
        "Name Key",
        "Day",
        "Registration (UTC)",
        "Start (UTC)"
    ]);
    for tournament in &tournaments {
        for day in &tournament.schedule {
            table.add_row(row![
                tournament.id,
                tournament.name_key,
                day.id,
                format_utc(day.registration_time),
                format_utc(day.start_time)
            ]);
        }
    }

    ctx.send(
        CreateReply::default()
            .content(format!("```\n{}\n```", table))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

fn format_utc(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

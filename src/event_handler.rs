use poise::serenity_prelude::{
    self as serenity, ChannelId, ComponentInteraction, ComponentInteractionDataKind,
    CreateInteractionResponse, CreateInteractionResponseMessage, EditMessage, MessageId,
};
use tracing::{info, warn};

use crate::announcement::{
    refresh_signup_fields, signup_components, REMOVE_PREFIX, ROLE_SELECT_PREFIX, RSVP_SATURDAY_ID,
    RSVP_SUNDAY_ID,
};
use crate::approval::{APPROVE_PREFIX, REJECT_PREFIX};
use crate::reconcile::run_clash_check;
use crate::rsvp::{format_roles, ClashDay, RemoveOutcome, Role};
use crate::state::GuildAnnouncement;
use crate::{BotData, BotError};

/// Dispatches component interactions by custom id prefix. The handlers look
/// the current state up by guild and message id; no live message handles are
/// captured anywhere.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, BotError>,
    data: &BotData,
) -> Result<(), BotError> {
    match event {
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            let custom_id = component.data.custom_id.clone();
            match custom_id.as_str() {
                RSVP_SATURDAY_ID => open_signup(ctx, component, ClashDay::Saturday).await?,
                RSVP_SUNDAY_ID => open_signup(ctx, component, ClashDay::Sunday).await?,
                id => {
                    if let Some(day) = id.strip_prefix(ROLE_SELECT_PREFIX) {
                        if let Some(day) = ClashDay::from_label(day) {
                            handle_role_select(ctx, data, component, day).await?;
                        }
                    } else if let Some(day) = id.strip_prefix(REMOVE_PREFIX) {
                        if let Some(day) = ClashDay::from_label(day) {
                            handle_remove(ctx, data, component, day).await?;
                        }
                    } else if let Some(event_id) = id.strip_prefix(APPROVE_PREFIX) {
                        handle_decision(ctx, data, component, event_id, true).await?;
                    } else if let Some(event_id) = id.strip_prefix(REJECT_PREFIX) {
                        handle_decision(ctx, data, component, event_id, false).await?;
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Answers a day button with the ephemeral role picker for that day.
async fn open_signup(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    day: ClashDay,
) -> Result<(), BotError> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(format!("Select your roles for **{}**:", day))
                    .components(signup_components(day))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Records a role selection, refreshes the live announcement and acks the
/// picker with the stored selection.
async fn handle_role_select(
    ctx: &serenity::Context,
    data: &BotData,
    component: &ComponentInteraction,
    day: ClashDay,
) -> Result<(), BotError> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let ComponentInteractionDataKind::StringSelect { ref values } = component.data.kind else {
        return Ok(());
    };

    let roles: Vec<Role> = values
        .iter()
        .filter_map(|value| Role::from_label(value))
        .collect();
    if roles.is_empty() {
        return Ok(());
    }

    let guild_key = guild_id.to_string();
    let user_id = component.user.id.to_string();
    let (stored, snapshot) = data
        .store
        .mutate(|state| {
            let guild = state.get_or_create_guild(&guild_key);
            let stored = guild.set_rsvp(day, &user_id, roles);
            (stored, guild.clone())
        })
        .await?;

    info!(
        "User {} signed up for {} in guild {} as {}",
        user_id,
        day,
        guild_key,
        format_roles(&stored)
    );

    if let Err(e) = refresh_announcement(ctx, &snapshot).await {
        warn!("Could not refresh announcement in guild {}: {}", guild_key, e);
    }

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .content(format!("✅ Registered for {} as: {}", day, format_roles(&stored))),
            ),
        )
        .await?;
    Ok(())
}

/// Drops a signup. Removal of an absent entry is not an error, but the
/// acknowledgment tells the user nothing was there.
async fn handle_remove(
    ctx: &serenity::Context,
    data: &BotData,
    component: &ComponentInteraction,
    day: ClashDay,
) -> Result<(), BotError> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };

    let guild_key = guild_id.to_string();
    let user_id = component.user.id.to_string();
    let (outcome, snapshot) = data
        .store
        .mutate(|state| {
            let guild = state.get_or_create_guild(&guild_key);
            let outcome = guild.remove_rsvp(day, &user_id);
            (outcome, guild.clone())
        })
        .await?;

    if let Err(e) = refresh_announcement(ctx, &snapshot).await {
        warn!("Could not refresh announcement in guild {}: {}", guild_key, e);
    }

    let content = match outcome {
        RemoveOutcome::Removed => format!("🗑️ Removed from {}.", day),
        RemoveOutcome::NotSignedUp => format!("You weren't signed up for {}.", day),
    };
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new().content(content),
            ),
        )
        .await?;
    Ok(())
}

/// Applies an administrator decision on a pending event. Presses from anyone
/// but the configured administrator are ignored without a reply.
async fn handle_decision(
    ctx: &serenity::Context,
    data: &BotData,
    component: &ComponentInteraction,
    event_id: &str,
    approve: bool,
) -> Result<(), BotError> {
    if component.user.id != data.config.admin_user_id {
        return Ok(());
    }

    let (applied, content) = if approve {
        let applied = data
            .store
            .mutate(|state| state.gate_approve(event_id))
            .await?;
        let content = if applied {
            format!("✅ Approved event `{}`. Broadcasting to all guilds.", event_id)
        } else {
            format!("Event `{}` is no longer pending.", event_id)
        };
        (applied, content)
    } else {
        let applied = data
            .store
            .mutate(|state| state.gate_reject(event_id))
            .await?;
        let content = if applied {
            format!(
                "❌ Rejected event `{}`. It will be offered again if it shows up in a later check.",
                event_id
            )
        } else {
            format!("Event `{}` is no longer pending.", event_id)
        };
        (applied, content)
    };

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .components(vec![]),
            ),
        )
        .await?;

    if approve && applied {
        info!("Administrator approved event {}", event_id);
        run_clash_check(ctx, data, None).await?;
    }

    Ok(())
}

/// Re-renders the signup fields of the guild's live announcement from state.
///
/// A guild without a recorded message is a quiet no-op; a stale message id
/// surfaces as an error for the caller to log.
async fn refresh_announcement(
    ctx: &serenity::Context,
    guild: &GuildAnnouncement,
) -> Result<(), BotError> {
    let (Some(channel_id), Some(message_id)) = (guild.message_channel_id, guild.message_id) else {
        return Ok(());
    };

    let channel = ChannelId::new(channel_id);
    let message_id = MessageId::new(message_id);
    let message = channel.message(&ctx.http, message_id).await?;
    let Some(embed) = message.embeds.into_iter().next() else {
        return Ok(());
    };

    let updated = refresh_signup_fields(embed, guild);
    channel
        .edit_message(&ctx.http, message_id, EditMessage::new().embed(updated))
        .await?;
    Ok(())
}

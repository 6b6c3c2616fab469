use poise::serenity_prelude::{
    ButtonStyle, Colour, CreateActionRow, CreateButton, CreateEmbed, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, Embed, ReactionType,
};
use strum::IntoEnumIterator;

use crate::rsvp::{format_roles, ClashDay, Role, RsvpMap};
use crate::state::GuildAnnouncement;
use crate::window::EventWindow;

const TROPHY_URL: &str = "https://raw.communitydragon.org/latest/plugins/rcp-fe-lol-clash/global/default/assets/images/trophy.png";

pub const RSVP_SATURDAY_ID: &str = "rsvp_saturday";
pub const RSVP_SUNDAY_ID: &str = "rsvp_sunday";
pub const ROLE_SELECT_PREFIX: &str = "rsvp_roles:";
pub const REMOVE_PREFIX: &str = "rsvp_remove:";

/// The ping prepended to every fresh announcement.
pub const ANNOUNCEMENT_CONTENT: &str = "@everyone New Clash Tournament detected!";

/// Renders the full announcement embed for one guild: event header, lock-in
/// schedule and the current signups for both days.
pub fn announcement_embed(window: &EventWindow, guild: &GuildAnnouncement) -> CreateEmbed {
    let anchor = window.anchor();
    let dates = window.registration_date_tags().join(" & ");
    let lock_in = window.lock_in_schedule();

    let schedule_block = format!(
        "**Tier IV:** <t:{}:t>\n**Tier III:** <t:{}:t>\n**Tier II:** <t:{}:t>\n**Tier I:** <t:{}:t>\n**Lock-in Closes:** <t:{}:t>",
        lock_in.tier_four, lock_in.tier_three, lock_in.tier_two, lock_in.tier_one, lock_in.closes
    );

    let mut embed = CreateEmbed::new()
        .title(format!("🏆 Clash Alert: {} Cup", anchor.name))
        .description(format!(
            "The next Clash is coming up!\n📅 **Dates:** {}\n\nRegister your availability below.",
            dates
        ))
        .colour(Colour::GOLD)
        .thumbnail(TROPHY_URL)
        .field("⏰ Lock-In Schedule", schedule_block, false);

    for day in [ClashDay::Saturday, ClashDay::Sunday] {
        let rsvps = guild.rsvps(day);
        embed = embed.field(
            format!("{} {} ({})", day.emoji(), day, rsvps.len()),
            signup_list(rsvps),
            true,
        );
    }

    embed
}

/// The signup body for one day: one line per user in signup order.
fn signup_list(rsvps: &RsvpMap) -> String {
    if rsvps.is_empty() {
        return "No one yet.".to_string();
    }
    rsvps
        .iter()
        .map(|(user_id, roles)| format!("<@{}> *({})*", user_id, format_roles(roles)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrites the two signup fields of an already-posted announcement embed
/// from current state, leaving the event header and schedule intact.
///
/// Field layout matches [`announcement_embed`]: 0 is the lock-in schedule,
/// 1 and 2 are Saturday and Sunday.
pub fn refresh_signup_fields(mut embed: Embed, guild: &GuildAnnouncement) -> CreateEmbed {
    for (index, day) in [(1usize, ClashDay::Saturday), (2, ClashDay::Sunday)] {
        if let Some(field) = embed.fields.get_mut(index) {
            let rsvps = guild.rsvps(day);
            field.name = format!("{} {} ({})", day.emoji(), day, rsvps.len());
            field.value = signup_list(rsvps);
        }
    }
    CreateEmbed::from(embed)
}

/// The two day buttons attached to the announcement message.
pub fn announcement_components() -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(RSVP_SATURDAY_ID)
            .label("🛰️ Saturday")
            .style(ButtonStyle::Primary),
        CreateButton::new(RSVP_SUNDAY_ID)
            .label("🌞 Sunday")
            .style(ButtonStyle::Primary),
    ])]
}

/// The ephemeral signup controls for one day: a role multi-select plus a
/// removal button.
pub fn signup_components(day: ClashDay) -> Vec<CreateActionRow> {
    let options: Vec<CreateSelectMenuOption> = Role::iter()
        .map(|role| {
            CreateSelectMenuOption::new(role.to_string(), role.to_string())
                .emoji(ReactionType::Unicode(role.emoji().to_string()))
        })
        .collect();

    let select = CreateSelectMenu::new(
        format!("{}{}", ROLE_SELECT_PREFIX, day),
        CreateSelectMenuKind::String { options },
    )
    .placeholder(format!("Select roles for {}...", day))
    .min_values(1)
    .max_values(Role::iter().count() as u8);

    vec![
        CreateActionRow::SelectMenu(select),
        CreateActionRow::Buttons(vec![CreateButton::new(format!("{}{}", REMOVE_PREFIX, day))
            .label("Remove Me ❌")
            .style(ButtonStyle::Danger)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsvp::set_rsvp;

    #[test]
    fn empty_day_shows_a_placeholder() {
        assert_eq!(signup_list(&RsvpMap::new()), "No one yet.");
    }

    #[test]
    fn signups_render_in_signup_order_with_roles() {
        let mut rsvps = RsvpMap::new();
        set_rsvp(&mut rsvps, "200", vec![Role::Mid]);
        set_rsvp(&mut rsvps, "100", vec![Role::Fill, Role::Top]);

        assert_eq!(
            signup_list(&rsvps),
            "<@200> *(Mid)*\n<@100> *(Top, Fill)*"
        );
    }
}

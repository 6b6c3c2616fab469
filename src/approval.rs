use poise::serenity_prelude::{
    ButtonStyle, CacheHttp, CreateActionRow, CreateButton, CreateEmbed, CreateMessage, UserId,
};
use tracing::info;

use crate::state::ClashState;
use crate::window::EventWindow;
use crate::BotError;

pub const APPROVE_PREFIX: &str = "clash_approve:";
pub const REJECT_PREFIX: &str = "clash_reject:";

/// Where a composite event id stands with the administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCheck {
    /// Cleared earlier; broadcast may proceed.
    Approved,
    /// Already offered; wait for the outstanding decision.
    AlreadyPending,
    /// First sighting; now pending, the administrator must be asked.
    NewlyPending,
}

impl ClashState {
    /// Runs one event id through the gate. Ids keep their slot: an approved
    /// id stays approved, a pending one stays pending, anything else becomes
    /// pending.
    pub fn gate_offer(&mut self, composite_id: &str) -> GateCheck {
        if self.approved.contains(composite_id) {
            return GateCheck::Approved;
        }
        if self.pending.contains(composite_id) {
            return GateCheck::AlreadyPending;
        }
        self.pending.insert(composite_id.to_string());
        GateCheck::NewlyPending
    }

    /// Administrator accepted: move the id from pending to approved.
    ///
    /// Returns false when the id was not pending (stale or repeated press).
    pub fn gate_approve(&mut self, composite_id: &str) -> bool {
        if !self.pending.remove(composite_id) {
            return false;
        }
        self.approved.insert(composite_id.to_string());
        true
    }

    /// Administrator declined: drop the id entirely. A later fetch that
    /// reproduces it will be offered again.
    pub fn gate_reject(&mut self, composite_id: &str) -> bool {
        self.pending.remove(composite_id)
    }
}

/// DMs the administrator the rendered announcement along with approve and
/// reject buttons keyed by the composite id.
pub async fn request_decision(
    http: impl CacheHttp,
    admin: UserId,
    window: &EventWindow,
    embed: CreateEmbed,
) -> Result<(), BotError> {
    info!(
        "Asking the administrator to approve event {}",
        window.composite_id
    );

    let buttons = CreateActionRow::Buttons(vec![
        CreateButton::new(format!("{}{}", APPROVE_PREFIX, window.composite_id))
            .label("Approve ✅")
            .style(ButtonStyle::Success),
        CreateButton::new(format!("{}{}", REJECT_PREFIX, window.composite_id))
            .label("Reject ❌")
            .style(ButtonStyle::Danger),
    ]);

    let dm = admin.create_dm_channel(&http).await?;
    dm.send_message(
        &http,
        CreateMessage::default()
            .content(format!(
                "A new Clash event (`{}`) was detected. Approve to announce it to every guild.",
                window.composite_id
            ))
            .embed(embed)
            .components(vec![buttons]),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_goes_pending() {
        let mut state = ClashState::default();

        assert_eq!(state.gate_offer("10_11"), GateCheck::NewlyPending);
        assert!(state.pending.contains("10_11"));
        assert!(!state.approved.contains("10_11"));
    }

    #[test]
    fn pending_ids_are_not_re_offered() {
        let mut state = ClashState::default();
        state.gate_offer("10_11");

        assert_eq!(state.gate_offer("10_11"), GateCheck::AlreadyPending);
    }

    #[test]
    fn approval_moves_the_id_out_of_pending() {
        let mut state = ClashState::default();
        state.gate_offer("10_11");

        assert!(state.gate_approve("10_11"));

        assert!(!state.pending.contains("10_11"));
        assert!(state.approved.contains("10_11"));
        assert_eq!(state.gate_offer("10_11"), GateCheck::Approved);
    }

    #[test]
    fn rejected_ids_are_offered_again_on_redetection() {
        let mut state = ClashState::default();
        state.gate_offer("10_11");

        assert!(state.gate_reject("10_11"));
        assert!(state.pending.is_empty());

        // the same event shows up in a later fetch
        assert_eq!(state.gate_offer("10_11"), GateCheck::NewlyPending);
    }

    #[test]
    fn stale_decisions_are_no_ops() {
        let mut state = ClashState::default();

        assert!(!state.gate_approve("10_11"));
        assert!(!state.gate_reject("10_11"));
        assert!(state.approved.is_empty());
    }

    #[test]
    fn multiple_ids_can_be_pending_at_once() {
        let mut state = ClashState::default();

        state.gate_offer("10_11");
        state.gate_offer("12_13");
        assert!(state.gate_approve("12_13"));

        assert!(state.pending.contains("10_11"));
        assert!(state.approved.contains("12_13"));
    }
}

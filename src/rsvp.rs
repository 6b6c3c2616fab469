use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// A position a player can offer to fill for one Clash day.
///
/// Declaration order is the canonical display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter,
)]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bot,
    Support,
    Fill,
}

impl Role {
    /// Parses a select-menu value back into a role. Unknown labels yield None.
    pub fn from_label(label: &str) -> Option<Self> {
        Role::iter().find(|role| role.to_string() == label)
    }

    /// The emoji shown next to the role in the select menu.
    pub fn emoji(&self) -> &'static str {
        match self {
            Role::Top => "🛡️",
            Role::Jungle => "🌲",
            Role::Mid => "🔮",
            Role::Bot => "🏹",
            Role::Support => "🩹",
            Role::Fill => "🔄",
        }
    }
}

/// The two playable days of a Clash weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ClashDay {
    Saturday,
    Sunday,
}

impl ClashDay {
    pub fn emoji(&self) -> &'static str {
        match self {
            ClashDay::Saturday => "🛰️",
            ClashDay::Sunday => "🌞",
        }
    }

    /// Parses the day segment of a component custom id.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Saturday" => Some(ClashDay::Saturday),
            "Sunday" => Some(ClashDay::Sunday),
            _ => None,
        }
    }
}

/// Signups for one day: user id -> roles, in signup order.
pub type RsvpMap = IndexMap<String, Vec<Role>>;

/// The reported outcome of a removal request. Not an error either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotSignedUp,
}

/// Sorts a selection into canonical role order and drops duplicates.
pub fn canonicalize(mut roles: Vec<Role>) -> Vec<Role> {
    roles.sort();
    roles.dedup();
    roles
}

/// Records or overwrites a user's signup for one day.
///
/// Returns the canonicalized selection as stored.
pub fn set_rsvp(map: &mut RsvpMap, user_id: &str, roles: Vec<Role>) -> Vec<Role> {
    let roles = canonicalize(roles);
    map.insert(user_id.to_string(), roles.clone());
    roles
}

/// Drops a user's signup for one day, if any.
pub fn remove_rsvp(map: &mut RsvpMap, user_id: &str) -> RemoveOutcome {
    // shift_remove keeps the remaining entries in signup order
    match map.shift_remove(user_id) {
        Some(_) => RemoveOutcome::Removed,
        None => RemoveOutcome::NotSignedUp,
    }
}

/// Renders a stored selection for display, e.g. `Top, Support, Fill`.
pub fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_stored_in_canonical_role_order() {
        let mut map = RsvpMap::new();

        let stored = set_rsvp(&mut map, "100", vec![Role::Fill, Role::Top, Role::Support]);

        assert_eq!(stored, vec![Role::Top, Role::Support, Role::Fill]);
        assert_eq!(format_roles(&stored), "Top, Support, Fill");
    }

    #[test]
    fn setting_again_overwrites_the_previous_selection() {
        let mut map = RsvpMap::new();
        set_rsvp(&mut map, "100", vec![Role::Top, Role::Mid]);

        set_rsvp(&mut map, "100", vec![Role::Jungle]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("100"), Some(&vec![Role::Jungle]));
    }

    #[test]
    fn duplicate_roles_collapse() {
        let mut map = RsvpMap::new();

        let stored = set_rsvp(&mut map, "100", vec![Role::Mid, Role::Mid, Role::Bot]);

        assert_eq!(stored, vec![Role::Mid, Role::Bot]);
    }

    #[test]
    fn removing_an_absent_user_reports_not_signed_up() {
        let mut map = RsvpMap::new();
        set_rsvp(&mut map, "100", vec![Role::Top]);

        assert_eq!(remove_rsvp(&mut map, "200"), RemoveOutcome::NotSignedUp);
        assert_eq!(map.len(), 1);
        assert_eq!(remove_rsvp(&mut map, "100"), RemoveOutcome::Removed);
        assert!(map.is_empty());
    }

    #[test]
    fn overwrite_keeps_signup_order_for_display() {
        let mut map = RsvpMap::new();
        set_rsvp(&mut map, "first", vec![Role::Top]);
        set_rsvp(&mut map, "second", vec![Role::Mid]);

        set_rsvp(&mut map, "first", vec![Role::Fill]);

        let order: Vec<&String> = map.keys().collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[test]
    fn labels_round_trip_through_the_select_menu() {
        for role in Role::iter() {
            assert_eq!(Role::from_label(&role.to_string()), Some(role));
        }
        assert_eq!(Role::from_label("Coach"), None);
    }
}

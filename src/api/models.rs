use serde::{Deserialize, Serialize};

/// A Clash tournament as returned by the Riot API.
///
/// Each tournament carries a nested schedule with one entry per playable day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: i64,
    pub theme_id: Option<i64>,
    pub name_key: String,
    pub name_key_secondary: String,
    #[serde(default)]
    pub schedule: Vec<TournamentDay>,
}

/// One day of a tournament's schedule. All times are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDay {
    pub id: i64,
    pub registration_time: i64,
    pub start_time: i64,
    #[serde(default)]
    pub cancelled: bool,
}

/// A single upcoming tournament day, normalized for the rest of the bot.
///
/// Produced fresh on every fetch and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub tournament_id: i64,
    pub name: String,
    pub secondary_name: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds.
    pub registration_time: i64,
}

/// Flattens raw tournaments into schedule entries, keeping only days that
/// start strictly after `now_ms`, sorted by start time ascending.
pub fn upcoming_schedule(tournaments: &[Tournament], now_ms: i64) -> Vec<ScheduleEntry> {
    let mut upcoming: Vec<ScheduleEntry> = tournaments
        .iter()
        .flat_map(|tournament| {
            tournament
                .schedule
                .iter()
                .filter(|day| day.start_time > now_ms)
                .map(|day| ScheduleEntry {
                    tournament_id: tournament.id,
                    name: display_name(&tournament.name_key),
                    secondary_name: display_name(&tournament.name_key_secondary),
                    start_time: day.start_time,
                    registration_time: day.registration_time,
                })
        })
        .collect();

    upcoming.sort_by_key(|entry| entry.start_time);

    upcoming
}

/// Turns a Riot name key like `bandle_city` into `Bandle City`.
fn display_name(name_key: &str) -> String {
    name_key
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tournament(id: i64, name_key: &str, days: Vec<(i64, i64, i64)>) -> Tournament {
        Tournament {
            id,
            theme_id: None,
            name_key: name_key.to_string(),
            name_key_secondary: "day_1".to_string(),
            schedule: days
                .into_iter()
                .map(|(day_id, registration_time, start_time)| TournamentDay {
                    id: day_id,
                    registration_time,
                    start_time,
                    cancelled: false,
                })
                .collect(),
        }
    }

    #[test]
    fn filters_out_past_days_and_sorts_ascending() {
        let tournaments = vec![
            tournament(7, "bandle_city", vec![(1, 500, 3_000), (2, 500, 900)]),
            tournament(8, "piltover", vec![(3, 500, 2_000)]),
        ];

        let schedule = upcoming_schedule(&tournaments, 1_000);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].tournament_id, 8);
        assert_eq!(schedule[0].start_time, 2_000);
        assert_eq!(schedule[1].tournament_id, 7);
        assert_eq!(schedule[1].start_time, 3_000);
    }

    #[test]
    fn day_starting_exactly_now_is_not_upcoming() {
        let tournaments = vec![tournament(1, "ionia", vec![(1, 100, 1_000)])];

        assert!(upcoming_schedule(&tournaments, 1_000).is_empty());
    }

    #[test]
    fn name_keys_are_title_cased() {
        let tournaments = vec![tournament(4, "bandle_city", vec![(1, 100, 2_000)])];

        let schedule = upcoming_schedule(&tournaments, 1_000);

        assert_eq!(schedule[0].name, "Bandle City");
        assert_eq!(schedule[0].secondary_name, "Day 1");
    }
}

use std::collections::BTreeSet;

use crate::api::models::ScheduleEntry;

/// Everything within this span of the earliest upcoming day is treated as one event.
const WINDOW_SPAN_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// The upcoming Clash event: the nearest tournament day plus every day that
/// starts within seven days of it.
///
/// The `composite_id` is the canonical identity of the event. It is derived
/// from the member tournament ids alone, so two fetches that return the same
/// tournaments in any order produce the same id. Downstream reconciliation
/// depends on that.
#[derive(Debug, Clone)]
pub struct EventWindow {
    pub entries: Vec<ScheduleEntry>,
    pub composite_id: String,
}

impl EventWindow {
    /// Groups a start-time-sorted schedule into the current event window.
    ///
    /// Returns None when the schedule is empty.
    pub fn resolve(schedule: &[ScheduleEntry]) -> Option<Self> {
        let anchor = schedule.first()?;
        let cutoff = anchor.start_time + WINDOW_SPAN_MS;

        let entries: Vec<ScheduleEntry> = schedule
            .iter()
            .filter(|entry| entry.start_time <= cutoff)
            .cloned()
            .collect();

        let composite_id = composite_id(entries.iter().map(|entry| entry.tournament_id));

        Some(Self {
            entries,
            composite_id,
        })
    }

    /// The earliest entry. The window is never empty, so this always exists.
    pub fn anchor(&self) -> &ScheduleEntry {
        &self.entries[0]
    }

    /// Registration-date tags for display, deduplicated in first-seen order.
    pub fn registration_date_tags(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut tags = Vec::new();
        for entry in &self.entries {
            let tag = format!("<t:{}:D>", entry.registration_time / 1000);
            if seen.insert(tag.clone()) {
                tags.push(tag);
            }
        }
        tags
    }

    /// The tier lock-in checkpoints derived from the anchor day.
    pub fn lock_in_schedule(&self) -> LockInSchedule {
        let registration = self.anchor().registration_time / 1000;
        LockInSchedule {
            tier_four: registration,
            tier_three: registration + 45 * 60,
            tier_two: registration + 90 * 60,
            tier_one: registration + 120 * 60,
            closes: self.anchor().start_time / 1000,
        }
    }
}

/// When each tier may lock in, plus when lock-in closes. Epoch seconds,
/// ready for Discord `<t:..:t>` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockInSchedule {
    pub tier_four: i64,
    pub tier_three: i64,
    pub tier_two: i64,
    pub tier_one: i64,
    pub closes: i64,
}

/// Builds the canonical event id: string ids, deduplicated, sorted
/// lexicographically, joined with `_`.
pub fn composite_id(ids: impl IntoIterator<Item = i64>) -> String {
    let unique: BTreeSet<String> = ids.into_iter().map(|id| id.to_string()).collect();
    unique.into_iter().collect::<Vec<_>>().join("_")
}

/// Splits a composite id back into its member ids.
pub fn split_composite_id(id: &str) -> BTreeSet<String> {
    id.split('_')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn entry(tournament_id: i64, start_time: i64) -> ScheduleEntry {
        ScheduleEntry {
            tournament_id,
            name: "Bandle City".to_string(),
            secondary_name: "Day 1".to_string(),
            start_time,
            registration_time: start_time - 3 * 60 * 60 * 1000,
        }
    }

    #[test]
    fn composite_id_is_order_independent() {
        let forward = composite_id([10, 11, 12]);
        let shuffled = composite_id([12, 10, 11]);
        let with_duplicates = composite_id([11, 12, 10, 10, 11]);

        assert_eq!(forward, shuffled);
        assert_eq!(forward, with_duplicates);
        assert_eq!(forward, "10_11_12");
    }

    #[test]
    fn window_cuts_off_seven_days_after_the_anchor() {
        let base = 1_700_000_000_000;
        let schedule = vec![
            entry(1, base),
            entry(2, base + DAY_MS),
            entry(3, base + 6 * DAY_MS),
            entry(4, base + 8 * DAY_MS),
        ];

        let window = EventWindow::resolve(&schedule).unwrap();

        assert_eq!(window.entries.len(), 3);
        assert_eq!(window.composite_id, "1_2_3");
        assert!(window.entries.iter().all(|e| e.tournament_id != 4));
    }

    #[test]
    fn empty_schedule_yields_no_window() {
        assert!(EventWindow::resolve(&[]).is_none());
    }

    #[test]
    fn same_tournaments_in_any_fetch_order_share_an_identity() {
        let base = 1_700_000_000_000;
        let first_fetch = vec![entry(5, base), entry(6, base + DAY_MS)];
        // start-time sorting upstream keeps the entry order fixed, but the ids
        // themselves may collide in any order
        let second_fetch = vec![entry(6, base), entry(5, base + DAY_MS)];

        let a = EventWindow::resolve(&first_fetch).unwrap();
        let b = EventWindow::resolve(&second_fetch).unwrap();

        assert_eq!(a.composite_id, b.composite_id);
    }

    #[test]
    fn registration_dates_are_deduplicated_in_first_seen_order() {
        let base = 1_700_000_000_000;
        let mut saturday = entry(1, base);
        saturday.registration_time = base - DAY_MS;
        let mut sunday = entry(2, base + DAY_MS);
        sunday.registration_time = base;
        let mut duplicate = entry(3, base + 2 * DAY_MS);
        duplicate.registration_time = base - DAY_MS;

        let window = EventWindow::resolve(&[saturday, sunday, duplicate]).unwrap();
        let tags = window.registration_date_tags();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], format!("<t:{}:D>", (base - DAY_MS) / 1000));
        assert_eq!(tags[1], format!("<t:{}:D>", base / 1000));
    }

    #[test]
    fn lock_in_checkpoints_step_up_from_registration() {
        let base = 1_700_000_000_000;
        let window = EventWindow::resolve(&[entry(1, base)]).unwrap();

        let schedule = window.lock_in_schedule();
        let registration = (base - 3 * 60 * 60 * 1000) / 1000;

        assert_eq!(schedule.tier_four, registration);
        assert_eq!(schedule.tier_three, registration + 45 * 60);
        assert_eq!(schedule.tier_two, registration + 90 * 60);
        assert_eq!(schedule.tier_one, registration + 120 * 60);
        assert_eq!(schedule.closes, base / 1000);
    }
}

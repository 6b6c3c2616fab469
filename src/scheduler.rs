use chrono::{DateTime, Duration, NaiveTime, Utc};
use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::reconcile::run_clash_check;
use crate::BotData;

/// The next occurrence of the configured UTC time of day: today if it is
/// still ahead, otherwise tomorrow.
pub fn next_run(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let time_of_day = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let today = now.date_naive().and_time(time_of_day).and_utc();

    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Wakes up once a day at the configured time and runs the check for every
/// guild. Spawned once at startup; runs for the life of the process.
pub async fn run_daily_checks(ctx: serenity::Context, data: BotData) {
    loop {
        let now = Utc::now();
        let wake_at = next_run(now, data.config.check_hour, data.config.check_minute);
        let delay = (wake_at - now).to_std().unwrap_or_default();

        info!(
            "Next scheduled Clash check at {} ({:.2} hours from now)",
            wake_at.format("%H:%M UTC"),
            delay.as_secs_f64() / 3600.0
        );
        tokio::time::sleep(delay).await;

        if let Err(e) = run_clash_check(&ctx, &data, None).await {
            error!("Scheduled Clash check failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn runs_today_when_the_time_is_still_ahead() {
        let now = Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap();

        let next = next_run(now, 18, 0);

        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 4, 18, 0, 0).unwrap());
    }

    #[test]
    fn runs_tomorrow_when_the_time_already_passed() {
        let now = Utc.with_ymd_and_hms(2024, 5, 4, 19, 30, 0).unwrap();

        let next = next_run(now, 18, 0);

        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 5, 18, 0, 0).unwrap());
    }

    #[test]
    fn exactly_at_the_target_time_waits_a_full_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 4, 18, 0, 0).unwrap();

        let next = next_run(now, 18, 0);

        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 5, 18, 0, 0).unwrap());
    }
}

//! Read-only stats view over PlayerProgress.

use crate::{progress::PlayerProgress, types::TimestampMs};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSummary {
    pub coins_per_click:          f64,
    pub coins_per_second:         f64,
    pub total_clicks:             u64,
    pub total_upgrades_purchased: u64,
    pub total_upgrades_cost:      f64,
    pub play_time:                String,
    pub first_played:             String,
    pub experience:               u64,
}

impl StatsSummary {
    pub fn from_progress(progress: &PlayerProgress) -> Self {
        Self {
            coins_per_click:          progress.coins_per_click,
            coins_per_second:         progress.coins_per_second,
            total_clicks:             progress.total_clicks,
            total_upgrades_purchased: progress.total_upgrades_purchased,
            total_upgrades_cost:      progress.total_upgrades_cost,
            play_time:                format_play_time(progress.total_play_time_secs),
            first_played:             format_date(progress.first_play_timestamp),
            experience:               progress.experience,
        }
    }
}

/// `"{h}h {m}m"`.
pub fn format_play_time(seconds: u64) -> String {
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// `"{h}h {m}m {s}s"` for a cooldown countdown.
pub fn format_countdown(ms: TimestampMs) -> String {
    let total = ms.max(0) / 1000;
    format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
}

/// `"HH:MM:SS"` for the daily claim countdown.
pub fn format_clock(ms: TimestampMs) -> String {
    let total = ms.max(0) / 1000;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Calendar date (UTC) of an epoch-millisecond stamp.
pub fn format_date(ms: TimestampMs) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_time_drops_seconds() {
        assert_eq!(format_play_time(0), "0h 0m");
        assert_eq!(format_play_time(3_725), "1h 2m");
    }

    #[test]
    fn countdowns() {
        assert_eq!(format_countdown(2 * 3_600_000 - 1), "1h 59m 59s");
        assert_eq!(format_countdown(-5), "0h 0m 0s");
        assert_eq!(format_clock(86_399_000), "23:59:59");
    }

    #[test]
    fn first_played_date() {
        assert_eq!(format_date(1_700_000_000_000), "2023-11-14");
    }
}

//! Aggregates over a record snapshot.
//!
//! Recomputed on every call in O(n); the tracked list is small enough that
//! no caching is kept.

use crate::model::record::{TechStatus, TechnologyRecord};
use serde::Serialize;

/// Per-status counts plus progress aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyStats {
    pub total: usize,
    pub planned: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub paused: usize,
    /// Mean of `progress`, rounded half up.
    pub average_progress: u8,
    /// Share of completed records as a rounded percentage.
    pub completion_rate: u8,
}

impl TechnologyStats {
    pub fn count(&self, status: TechStatus) -> usize {
        match status {
            TechStatus::Planned => self.planned,
            TechStatus::InProgress => self.in_progress,
            TechStatus::Completed => self.completed,
            TechStatus::Paused => self.paused,
        }
    }
}

/// Computes stats; an empty slice yields all zeros.
pub fn compute_stats(records: &[TechnologyRecord]) -> TechnologyStats {
    let mut stats = TechnologyStats {
        total: records.len(),
        ..TechnologyStats::default()
    };
    if records.is_empty() {
        return stats;
    }

    let mut progress_sum = 0usize;
    for record in records {
        progress_sum += usize::from(record.progress);
        match record.status {
            TechStatus::Planned => stats.planned += 1,
            TechStatus::InProgress => stats.in_progress += 1,
            TechStatus::Completed => stats.completed += 1,
            TechStatus::Paused => stats.paused += 1,
        }
    }

    stats.average_progress = rounded_percent(progress_sum, stats.total);
    stats.completion_rate = rounded_percent(stats.completed * 100, stats.total);
    stats
}

// `numerator / denominator` rounded half up; callers guarantee the result is
// at most 100.
fn rounded_percent(numerator: usize, denominator: usize) -> u8 {
    let value = (numerator * 2 + denominator) / (denominator * 2);
    u8::try_from(value.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::compute_stats;
    use crate::model::defaults::default_records;
    use crate::model::record::TechStatus;

    #[test]
    fn empty_snapshot_is_all_zero() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, Default::default());
    }

    #[test]
    fn counts_and_rounds_half_up() {
        let mut records = default_records("2026-10-19");
        records.truncate(4);
        records[0].apply_status(TechStatus::Completed, "2026-10-19");
        records[1].apply_progress(50, "2026-10-19");
        records[2].apply_status(TechStatus::Paused, "2026-10-19");
        records[2].apply_progress(2, "2026-10-19");

        let stats = compute_stats(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.count(TechStatus::Completed), 1);
        assert_eq!(stats.count(TechStatus::InProgress), 1);
        assert_eq!(stats.count(TechStatus::Paused), 1);
        assert_eq!(stats.count(TechStatus::Planned), 1);
        // (100 + 50 + 2 + 0) / 4 = 38
        assert_eq!(stats.average_progress, 38);
        assert_eq!(stats.completion_rate, 25);
    }
}

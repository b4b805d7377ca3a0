use serde::Serialize;

/// Watch status of a tracker entry. Transitions freely between all
/// variants; the only side effect of a change is an `updated_at` refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl WatchStatus {
    pub const ALL: [Self; 5] = [
        Self::Watching,
        Self::Completed,
        Self::OnHold,
        Self::Dropped,
        Self::PlanToWatch,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
            Self::Dropped => "dropped",
            Self::PlanToWatch => "plan-to-watch",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Aggregated tracker statistics for one user's profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerStats {
    pub total_anime: i64,
    pub completed: i64,
    pub watching: i64,
    pub on_hold: i64,
    pub dropped: i64,
    pub plan_to_watch: i64,
    /// Mean of non-null ratings, one decimal place ("0.0" when unrated)
    pub mean_score: String,
}

impl TrackerStats {
    /// Folds (status, rating) rows into per-status counts and a mean score.
    #[must_use]
    pub fn from_rows(rows: &[(String, Option<i32>)]) -> Self {
        let mut stats = Self {
            mean_score: "0.0".to_string(),
            ..Self::default()
        };

        let mut rating_sum: i64 = 0;
        let mut rating_count: i64 = 0;

        for (status, rating) in rows {
            stats.total_anime += 1;
            match WatchStatus::parse(status) {
                Some(WatchStatus::Watching) => stats.watching += 1,
                Some(WatchStatus::Completed) => stats.completed += 1,
                Some(WatchStatus::OnHold) => stats.on_hold += 1,
                Some(WatchStatus::Dropped) => stats.dropped += 1,
                Some(WatchStatus::PlanToWatch) => stats.plan_to_watch += 1,
                None => {}
            }
            if let Some(r) = rating {
                rating_sum += i64::from(*r);
                rating_count += 1;
            }
        }

        if rating_count > 0 {
            #[allow(clippy::cast_precision_loss)]
            let mean = rating_sum as f64 / rating_count as f64;
            stats.mean_score = format!("{mean:.1}");
        }

        stats
    }
}

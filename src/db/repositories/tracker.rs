use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::tracker;

/// Partial tracker update. Outer `None` leaves the field untouched;
/// `rating: Some(None)` clears the rating.
#[derive(Debug, Default, Clone)]
pub struct TrackerPatch {
    pub status: Option<String>,
    pub progress: Option<i32>,
    pub rating: Option<Option<i32>>,
    pub notes: Option<String>,
}

impl TrackerPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.rating.is_none()
            && self.notes.is_none()
    }
}

pub struct TrackerRepository {
    conn: DatabaseConnection,
}

impl TrackerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All of one user's entries, most recently updated first, optionally
    /// filtered to one status.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<&str>,
    ) -> Result<Vec<tracker::Model>> {
        let mut query = tracker::Entity::find()
            .filter(tracker::Column::UserId.eq(user_id))
            .order_by_desc(tracker::Column::UpdatedAt);

        if let Some(status) = status {
            query = query.filter(tracker::Column::Status.eq(status));
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to list tracker entries")
    }

    /// Inserts or updates the caller's entry for one anime. Returns the row
    /// and whether it was newly created. On update, `progress`, `rating`
    /// and `notes` only overwrite when a new value is supplied; `status`
    /// always overwrites. A unique index on (user_id, anime_id) backstops
    /// concurrent first inserts.
    pub async fn upsert(
        &self,
        user_id: i32,
        anime_id: i64,
        status: &str,
        progress: Option<i32>,
        rating: Option<i32>,
        notes: Option<String>,
    ) -> Result<(tracker::Model, bool)> {
        let existing = tracker::Entity::find()
            .filter(tracker::Column::UserId.eq(user_id))
            .filter(tracker::Column::AnimeId.eq(anime_id))
            .one(&self.conn)
            .await
            .context("Failed to query tracker entry")?;

        let now = chrono::Utc::now().to_rfc3339();

        if let Some(entry) = existing {
            let mut active: tracker::ActiveModel = entry.into();
            active.status = Set(status.to_string());
            if let Some(progress) = progress {
                active.progress = Set(progress);
            }
            if let Some(rating) = rating {
                active.rating = Set(Some(rating));
            }
            if let Some(notes) = notes {
                active.notes = Set(notes);
            }
            active.updated_at = Set(now);

            let updated = active
                .update(&self.conn)
                .await
                .context("Failed to update tracker entry")?;

            return Ok((updated, false));
        }

        let entry = tracker::ActiveModel {
            user_id: Set(user_id),
            anime_id: Set(anime_id),
            status: Set(status.to_string()),
            progress: Set(progress.unwrap_or(0)),
            rating: Set(rating),
            notes: Set(notes.unwrap_or_default()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert tracker entry")?;

        Ok((entry, true))
    }

    /// Applies a patch to one entry matched on id AND owner. `None` means
    /// no such row for this user; callers cannot tell not-found from
    /// not-owned.
    pub async fn update_entry(
        &self,
        user_id: i32,
        id: i32,
        patch: TrackerPatch,
    ) -> Result<Option<tracker::Model>> {
        let entry = tracker::Entity::find_by_id(id)
            .filter(tracker::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query tracker entry")?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        let mut active: tracker::ActiveModel = entry.into();
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        if let Some(progress) = patch.progress {
            active.progress = Set(progress);
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(notes) = patch.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update tracker entry")?;

        Ok(Some(updated))
    }

    /// Owner-scoped delete; false when no row matched.
    pub async fn delete_entry(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = tracker::Entity::delete_many()
            .filter(tracker::Column::Id.eq(id))
            .filter(tracker::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete tracker entry")?;

        Ok(result.rows_affected > 0)
    }

    /// (status, rating) rows for one user, for stats aggregation.
    pub async fn stats_rows(&self, user_id: i32) -> Result<Vec<(String, Option<i32>)>> {
        tracker::Entity::find()
            .select_only()
            .column(tracker::Column::Status)
            .column(tracker::Column::Rating)
            .filter(tracker::Column::UserId.eq(user_id))
            .into_tuple::<(String, Option<i32>)>()
            .all(&self.conn)
            .await
            .context("Failed to load tracker stats rows")
    }
}

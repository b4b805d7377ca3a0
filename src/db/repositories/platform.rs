use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::entities::{anime_platforms, platforms};

/// A platform joined with the link url for one anime.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformAvailability {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub website_url: Option<String>,
    pub platform_url: Option<String>,
}

pub struct PlatformRepository {
    conn: DatabaseConnection,
}

impl PlatformRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<platforms::Model>> {
        platforms::Entity::find()
            .order_by_asc(platforms::Column::DisplayName)
            .all(&self.conn)
            .await
            .context("Failed to list platforms")
    }

    /// Platforms an anime is available on, ordered by display name.
    pub async fn for_anime(&self, anime_id: i64) -> Result<Vec<PlatformAvailability>> {
        let rows = anime_platforms::Entity::find()
            .filter(anime_platforms::Column::AnimeId.eq(anime_id))
            .find_also_related(platforms::Entity)
            .order_by_asc(platforms::Column::DisplayName)
            .all(&self.conn)
            .await
            .context("Failed to list platforms for anime")?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, platform)| {
                platform.map(|p| PlatformAvailability {
                    id: p.id,
                    name: p.name,
                    display_name: p.display_name,
                    website_url: p.website_url,
                    platform_url: link.url,
                })
            })
            .collect())
    }

    /// Links an anime to a platform, replacing the url when the pair
    /// already exists. Returns `None` when the platform id is unknown.
    pub async fn upsert_link(
        &self,
        anime_id: i64,
        platform_id: i32,
        url: Option<String>,
    ) -> Result<Option<anime_platforms::Model>> {
        let platform = platforms::Entity::find_by_id(platform_id)
            .one(&self.conn)
            .await
            .context("Failed to query platform")?;
        if platform.is_none() {
            return Ok(None);
        }

        anime_platforms::Entity::insert(anime_platforms::ActiveModel {
            anime_id: Set(anime_id),
            platform_id: Set(platform_id),
            url: Set(url),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                anime_platforms::Column::AnimeId,
                anime_platforms::Column::PlatformId,
            ])
            .update_column(anime_platforms::Column::Url)
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to upsert platform link")?;

        let link = anime_platforms::Entity::find()
            .filter(anime_platforms::Column::AnimeId.eq(anime_id))
            .filter(anime_platforms::Column::PlatformId.eq(platform_id))
            .one(&self.conn)
            .await
            .context("Failed to reload platform link")?;

        Ok(link)
    }
}

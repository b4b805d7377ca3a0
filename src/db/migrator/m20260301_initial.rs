use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Streaming platforms available at launch
const SEED_PLATFORMS: [(&str, &str, &str); 6] = [
    ("crunchyroll", "Crunchyroll", "https://www.crunchyroll.com"),
    ("netflix", "Netflix", "https://www.netflix.com"),
    ("hulu", "Hulu", "https://www.hulu.com"),
    ("amazon-prime", "Amazon Prime Video", "https://www.primevideo.com"),
    ("disney-plus", "Disney+", "https://www.disneyplus.com"),
    ("hidive", "HIDIVE", "https://www.hidive.com"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tracker)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One tracker row per (user, anime); upserts rely on this
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracker_user_anime")
                    .table(Tracker)
                    .col(crate::entities::tracker::Column::UserId)
                    .col(crate::entities::tracker::Column::AnimeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Discussions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(DiscussionLikes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_discussion_likes_discussion_user")
                    .table(DiscussionLikes)
                    .col(crate::entities::discussion_likes::Column::DiscussionId)
                    .col(crate::entities::discussion_likes::Column::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(DiscussionComments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Platforms)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimePlatforms)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_anime_platforms_anime_platform")
                    .table(AnimePlatforms)
                    .col(crate::entities::anime_platforms::Column::AnimeId)
                    .col(crate::entities::anime_platforms::Column::PlatformId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        for (name, display_name, website_url) in SEED_PLATFORMS {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(Platforms)
                .columns([
                    crate::entities::platforms::Column::Name,
                    crate::entities::platforms::Column::DisplayName,
                    crate::entities::platforms::Column::WebsiteUrl,
                ])
                .values_panic([name.into(), display_name.into(), website_url.into()])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnimePlatforms).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Platforms).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DiscussionComments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DiscussionLikes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Discussions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tracker).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tracing::info;

use crate::entities::{anime_platforms, discussions, platforms, tracker, users};

pub mod migrator;
pub mod repositories;

pub use repositories::discussion::{
    CommentView, DiscussionPatch, DiscussionRepository, DiscussionView, ModifyOutcome,
};
pub use repositories::platform::PlatformAvailability;
pub use repositories::tracker::TrackerPatch;
pub use repositories::user::{ProfilePatch, UserProfile};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn tracker_repo(&self) -> repositories::tracker::TrackerRepository {
        repositories::tracker::TrackerRepository::new(self.conn.clone())
    }

    fn discussion_repo(&self) -> DiscussionRepository {
        DiscussionRepository::new(self.conn.clone())
    }

    fn platform_repo(&self) -> repositories::platform::PlatformRepository {
        repositories::platform::PlatformRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo().create(username, email, password).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn update_user_profile(
        &self,
        user_id: i32,
        patch: ProfilePatch,
    ) -> Result<Option<users::Model>> {
        self.user_repo().update_profile(user_id, patch).await
    }

    // ========== Tracker ==========

    pub async fn list_tracker(
        &self,
        user_id: i32,
        status: Option<&str>,
    ) -> Result<Vec<tracker::Model>> {
        self.tracker_repo().list_for_user(user_id, status).await
    }

    pub async fn upsert_tracker(
        &self,
        user_id: i32,
        anime_id: i64,
        status: &str,
        progress: Option<i32>,
        rating: Option<i32>,
        notes: Option<String>,
    ) -> Result<(tracker::Model, bool)> {
        self.tracker_repo()
            .upsert(user_id, anime_id, status, progress, rating, notes)
            .await
    }

    pub async fn update_tracker(
        &self,
        user_id: i32,
        id: i32,
        patch: TrackerPatch,
    ) -> Result<Option<tracker::Model>> {
        self.tracker_repo().update_entry(user_id, id, patch).await
    }

    pub async fn delete_tracker(&self, user_id: i32, id: i32) -> Result<bool> {
        self.tracker_repo().delete_entry(user_id, id).await
    }

    pub async fn tracker_stats_rows(&self, user_id: i32) -> Result<Vec<(String, Option<i32>)>> {
        self.tracker_repo().stats_rows(user_id).await
    }

    // ========== Discussions ==========

    pub async fn list_discussions(
        &self,
        category: Option<&str>,
        sort: &str,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<DiscussionView>, u64)> {
        self.discussion_repo()
            .list(category, sort, limit, offset)
            .await
    }

    pub async fn get_discussion(&self, id: i32) -> Result<Option<DiscussionView>> {
        self.discussion_repo().get(id).await
    }

    pub async fn create_discussion(
        &self,
        user_id: i32,
        title: &str,
        content: &str,
        category: &str,
        anime_id: Option<i64>,
        image_url: Option<String>,
    ) -> Result<discussions::Model> {
        self.discussion_repo()
            .create(user_id, title, content, category, anime_id, image_url)
            .await
    }

    pub async fn update_discussion(
        &self,
        id: i32,
        user_id: i32,
        patch: DiscussionPatch,
    ) -> Result<ModifyOutcome<discussions::Model>> {
        self.discussion_repo().update(id, user_id, patch).await
    }

    pub async fn delete_discussion(&self, id: i32, user_id: i32) -> Result<ModifyOutcome<()>> {
        self.discussion_repo().delete(id, user_id).await
    }

    pub async fn toggle_discussion_like(
        &self,
        discussion_id: i32,
        user_id: i32,
    ) -> Result<Option<bool>> {
        self.discussion_repo()
            .toggle_like(discussion_id, user_id)
            .await
    }

    pub async fn list_discussion_comments(&self, discussion_id: i32) -> Result<Vec<CommentView>> {
        self.discussion_repo().comments(discussion_id).await
    }

    pub async fn add_discussion_comment(
        &self,
        discussion_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<Option<CommentView>> {
        self.discussion_repo()
            .add_comment(discussion_id, user_id, content)
            .await
    }

    // ========== Platforms ==========

    pub async fn list_platforms(&self) -> Result<Vec<platforms::Model>> {
        self.platform_repo().list().await
    }

    pub async fn platforms_for_anime(&self, anime_id: i64) -> Result<Vec<PlatformAvailability>> {
        self.platform_repo().for_anime(anime_id).await
    }

    pub async fn upsert_platform_link(
        &self,
        anime_id: i64,
        platform_id: i32,
        url: Option<String>,
    ) -> Result<Option<anime_platforms::Model>> {
        self.platform_repo()
            .upsert_link(anime_id, platform_id, url)
            .await
    }
}

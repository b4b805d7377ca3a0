use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{discussion_comments, discussion_likes, discussions, users};

/// Joined author fields carried with discussions and comments.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub user_id: i32,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<users::Model> for AuthorSummary {
    fn from(user: users::Model) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscussionView {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub category: String,
    pub anime_id: Option<i64>,
    pub image_url: Option<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<AuthorSummary>,
}

impl DiscussionView {
    fn from_row((discussion, author): (discussions::Model, Option<users::Model>)) -> Self {
        Self {
            id: discussion.id,
            user_id: discussion.user_id,
            title: discussion.title,
            content: discussion.content,
            category: discussion.category,
            anime_id: discussion.anime_id,
            image_url: discussion.image_url,
            likes_count: discussion.likes_count,
            comments_count: discussion.comments_count,
            created_at: discussion.created_at,
            updated_at: discussion.updated_at,
            author: author.map(AuthorSummary::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub discussion_id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: String,
    pub author: Option<AuthorSummary>,
}

impl CommentView {
    fn from_row((comment, author): (discussion_comments::Model, Option<users::Model>)) -> Self {
        Self {
            id: comment.id,
            discussion_id: comment.discussion_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
            author: author.map(AuthorSummary::from),
        }
    }
}

/// Result of a write that requires ownership. Existence is checked before
/// ownership, so a missing row is never reported as `Forbidden`.
#[derive(Debug)]
pub enum ModifyOutcome<T> {
    NotFound,
    Forbidden,
    Done(T),
}

/// Fields a discussion author may change; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct DiscussionPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

pub struct DiscussionRepository {
    conn: DatabaseConnection,
}

impl DiscussionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Pages through discussions with their authors. `category: None`
    /// means no filter; `hot` sorts by `likes_count + comments_count*2`
    /// before recency. Returns the page plus the unpaged total.
    pub async fn list(
        &self,
        category: Option<&str>,
        sort: &str,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<DiscussionView>, u64)> {
        let mut query = discussions::Entity::find();
        if let Some(category) = category {
            query = query.filter(discussions::Column::Category.eq(category));
        }

        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count discussions")?;

        if sort == "hot" {
            let engagement = Expr::col((discussions::Entity, discussions::Column::LikesCount))
                .add(Expr::col((discussions::Entity, discussions::Column::CommentsCount)).mul(2));
            query = query.order_by_desc(engagement);
        }
        query = query.order_by_desc(discussions::Column::CreatedAt);

        let rows = query
            .find_also_related(users::Entity)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list discussions")?;

        Ok((rows.into_iter().map(DiscussionView::from_row).collect(), total))
    }

    pub async fn get(&self, id: i32) -> Result<Option<DiscussionView>> {
        let row = discussions::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query discussion")?;

        Ok(row.map(DiscussionView::from_row))
    }

    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        content: &str,
        category: &str,
        anime_id: Option<i64>,
        image_url: Option<String>,
    ) -> Result<discussions::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        discussions::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            category: Set(category.to_string()),
            anime_id: Set(anime_id),
            image_url: Set(image_url),
            likes_count: Set(0),
            comments_count: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert discussion")
    }

    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        patch: DiscussionPatch,
    ) -> Result<ModifyOutcome<discussions::Model>> {
        let Some(discussion) = discussions::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query discussion")?
        else {
            return Ok(ModifyOutcome::NotFound);
        };

        if discussion.user_id != user_id {
            return Ok(ModifyOutcome::Forbidden);
        }

        let mut active: discussions::ActiveModel = discussion.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(content) = patch.content {
            active.content = Set(content);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update discussion")?;

        Ok(ModifyOutcome::Done(updated))
    }

    /// Deletes a discussion with its likes and comments in one transaction.
    pub async fn delete(&self, id: i32, user_id: i32) -> Result<ModifyOutcome<()>> {
        let txn = self.conn.begin().await?;

        let Some(discussion) = discussions::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query discussion")?
        else {
            return Ok(ModifyOutcome::NotFound);
        };

        if discussion.user_id != user_id {
            return Ok(ModifyOutcome::Forbidden);
        }

        discussion_likes::Entity::delete_many()
            .filter(discussion_likes::Column::DiscussionId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete discussion likes")?;

        discussion_comments::Entity::delete_many()
            .filter(discussion_comments::Column::DiscussionId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete discussion comments")?;

        discussions::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete discussion")?;

        txn.commit().await?;

        Ok(ModifyOutcome::Done(()))
    }

    /// Strict like toggle. The like row insert carries an
    /// on-conflict-do-nothing clause; zero rows inserted means the like
    /// already existed, so it is removed instead. The denormalized
    /// `likes_count` moves in the same transaction. Returns the resulting
    /// liked state, or `None` when the discussion does not exist.
    pub async fn toggle_like(&self, discussion_id: i32, user_id: i32) -> Result<Option<bool>> {
        let txn = self.conn.begin().await?;

        let exists = discussions::Entity::find_by_id(discussion_id)
            .one(&txn)
            .await
            .context("Failed to query discussion")?;
        if exists.is_none() {
            return Ok(None);
        }

        let inserted = discussion_likes::Entity::insert(discussion_likes::ActiveModel {
            discussion_id: Set(discussion_id),
            user_id: Set(user_id),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                discussion_likes::Column::DiscussionId,
                discussion_likes::Column::UserId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .context("Failed to insert like")?;

        let liked = if inserted == 0 {
            discussion_likes::Entity::delete_many()
                .filter(discussion_likes::Column::DiscussionId.eq(discussion_id))
                .filter(discussion_likes::Column::UserId.eq(user_id))
                .exec(&txn)
                .await
                .context("Failed to delete like")?;

            discussions::Entity::update_many()
                .col_expr(
                    discussions::Column::LikesCount,
                    Expr::col(discussions::Column::LikesCount).sub(1),
                )
                .filter(discussions::Column::Id.eq(discussion_id))
                .exec(&txn)
                .await
                .context("Failed to decrement like count")?;

            false
        } else {
            discussions::Entity::update_many()
                .col_expr(
                    discussions::Column::LikesCount,
                    Expr::col(discussions::Column::LikesCount).add(1),
                )
                .filter(discussions::Column::Id.eq(discussion_id))
                .exec(&txn)
                .await
                .context("Failed to increment like count")?;

            true
        };

        txn.commit().await?;

        Ok(Some(liked))
    }

    /// Comments for one discussion, oldest first.
    pub async fn comments(&self, discussion_id: i32) -> Result<Vec<CommentView>> {
        let rows = discussion_comments::Entity::find()
            .filter(discussion_comments::Column::DiscussionId.eq(discussion_id))
            .find_also_related(users::Entity)
            .order_by_asc(discussion_comments::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?;

        Ok(rows.into_iter().map(CommentView::from_row).collect())
    }

    /// Adds a comment and bumps `comments_count` transactionally. Returns
    /// `None` when the discussion does not exist.
    pub async fn add_comment(
        &self,
        discussion_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<Option<CommentView>> {
        let txn = self.conn.begin().await?;

        let exists = discussions::Entity::find_by_id(discussion_id)
            .one(&txn)
            .await
            .context("Failed to query discussion")?;
        if exists.is_none() {
            return Ok(None);
        }

        let comment = discussion_comments::ActiveModel {
            discussion_id: Set(discussion_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert comment")?;

        discussions::Entity::update_many()
            .col_expr(
                discussions::Column::CommentsCount,
                Expr::col(discussions::Column::CommentsCount).add(1),
            )
            .filter(discussions::Column::Id.eq(discussion_id))
            .exec(&txn)
            .await
            .context("Failed to increment comment count")?;

        let author = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await
            .context("Failed to query comment author")?;

        txn.commit().await?;

        Ok(Some(CommentView::from_row((comment, author))))
    }
}

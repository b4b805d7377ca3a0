use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "discussions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub title: String,

    pub content: String,

    pub category: String,

    pub anime_id: Option<i64>,

    pub image_url: Option<String>,

    /// Denormalized counter, maintained by like writes
    pub likes_count: i32,

    /// Denormalized counter, maintained by comment writes
    pub comments_count: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::discussion_likes::Entity")]
    DiscussionLikes,
    #[sea_orm(has_many = "super::discussion_comments::Entity")]
    DiscussionComments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::discussion_likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiscussionLikes.def()
    }
}

impl Related<super::discussion_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiscussionComments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

/// Append-only from the API's perspective; no update or delete route.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "discussion_comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub discussion_id: i32,

    pub user_id: i32,

    pub content: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::discussions::Entity",
        from = "Column::DiscussionId",
        to = "super::discussions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Discussions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::discussions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discussions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

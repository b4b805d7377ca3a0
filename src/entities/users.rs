use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub display_name: Option<String>,

    pub bio: Option<String>,

    pub avatar_url: Option<String>,

    /// JSON array of genre names, ordered by user preference
    pub favorite_genres: Option<String>,

    pub location: Option<String>,

    pub website: Option<String>,

    pub birth_date: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tracker::Entity")]
    Tracker,
    #[sea_orm(has_many = "super::discussions::Entity")]
    Discussions,
}

impl Related<super::tracker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tracker.def()
    }
}

impl Related<super::discussions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discussions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

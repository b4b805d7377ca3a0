use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Links an external anime id to a platform; at most one row per
/// (anime_id, platform_id) pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "anime_platforms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub anime_id: i64,

    pub platform_id: i32,

    pub url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::platforms::Entity",
        from = "Column::PlatformId",
        to = "super::platforms::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Platforms,
}

impl Related<super::platforms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Platforms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

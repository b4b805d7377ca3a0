use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Static reference data, seeded by migration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "platforms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub display_name: String,

    pub website_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::anime_platforms::Entity")]
    AnimePlatforms,
}

impl Related<super::anime_platforms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimePlatforms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

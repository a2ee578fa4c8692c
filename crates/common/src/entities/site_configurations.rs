use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-site LMS root and theme; one row per site.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site_configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub site_id: Uuid,
    pub lms_url_root: String,
    pub theme_scss_path: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Site,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Site => Entity::belongs_to(super::sites::Entity)
                .from(Column::SiteId)
                .to(super::sites::Column::Id)
                .into(),
        }
    }
}

impl Related<super::sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

super::timestamped_behavior!();

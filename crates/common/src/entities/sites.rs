use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub domain: String,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Configuration,
    CourseCertificates,
    ProgramCertificates,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Configuration => Entity::has_one(super::site_configurations::Entity).into(),
            Self::CourseCertificates => Entity::has_many(super::course_certificates::Entity).into(),
            Self::ProgramCertificates => {
                Entity::has_many(super::program_certificates::Entity).into()
            }
        }
    }
}

impl Related<super::site_configurations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Configuration.def()
    }
}

impl Related<super::course_certificates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseCertificates.def()
    }
}

impl Related<super::program_certificates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProgramCertificates.def()
    }
}

super::timestamped_behavior!();

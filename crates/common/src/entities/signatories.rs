use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "signatories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub title: String,
    /// Storage path, `signatories/{id}/{filename}`.
    pub image: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    CourseCertificateLinks,
    ProgramCertificateLinks,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::CourseCertificateLinks => {
                Entity::has_many(super::course_certificate_signatories::Entity).into()
            }
            Self::ProgramCertificateLinks => {
                Entity::has_many(super::program_certificate_signatories::Entity).into()
            }
        }
    }
}

impl Related<super::course_certificates::Entity> for Entity {
    fn to() -> RelationDef {
        super::course_certificate_signatories::Relation::CourseCertificate.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::course_certificate_signatories::Relation::Signatory.def().rev())
    }
}

impl Related<super::program_certificates::Entity> for Entity {
    fn to() -> RelationDef {
        super::program_certificate_signatories::Relation::ProgramCertificate.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::program_certificate_signatories::Relation::Signatory.def().rev())
    }
}

impl Model {
    pub fn display_name(&self) -> String {
        format!("Signatory {}, {}", self.name, self.title)
    }
}

super::timestamped_behavior!();

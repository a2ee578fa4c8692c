use super::sea_orm_active_enums::CertificateMode;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Certificate configuration for one (course, mode, site).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_certificates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub site_id: Uuid,
    pub is_active: bool,
    pub template_id: Option<Uuid>,
    pub title: Option<String>,
    pub course_id: String,
    pub certificate_type: CertificateMode,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Site,
    Template,
    SignatoryLinks,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Site => Entity::belongs_to(super::sites::Entity)
                .from(Column::SiteId)
                .to(super::sites::Column::Id)
                .into(),
            Self::Template => Entity::belongs_to(super::certificate_templates::Entity)
                .from(Column::TemplateId)
                .to(super::certificate_templates::Column::Id)
                .into(),
            Self::SignatoryLinks => {
                Entity::has_many(super::course_certificate_signatories::Entity).into()
            }
        }
    }
}

impl Related<super::sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::certificate_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl Related<super::signatories::Entity> for Entity {
    fn to() -> RelationDef {
        super::course_certificate_signatories::Relation::Signatory.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::course_certificate_signatories::Relation::CourseCertificate.def().rev())
    }
}

impl Model {
    pub fn display_name(&self) -> String {
        format!("CourseCertificate {}, {}", self.course_id, self.certificate_type)
    }
}

super::timestamped_behavior!();

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Certificate configuration for a program; one per program.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_certificates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub site_id: Uuid,
    pub is_active: bool,
    pub template_id: Option<Uuid>,
    pub title: Option<String>,
    #[sea_orm(unique)]
    pub program_id: i64,
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
                Entity::has_many(super::program_certificate_signatories::Entity).into()
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
        super::program_certificate_signatories::Relation::Signatory.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::program_certificate_signatories::Relation::ProgramCertificate.def().rev())
    }
}

impl Model {
    pub fn display_name(&self) -> String {
        format!("ProgramCertificate for program {}", self.program_id)
    }
}

super::timestamped_behavior!();

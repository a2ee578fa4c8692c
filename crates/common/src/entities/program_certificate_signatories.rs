use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_certificate_signatories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub program_certificate_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub signatory_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    ProgramCertificate,
    Signatory,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::ProgramCertificate => Entity::belongs_to(super::program_certificates::Entity)
                .from(Column::ProgramCertificateId)
                .to(super::program_certificates::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
            Self::Signatory => Entity::belongs_to(super::signatories::Entity)
                .from(Column::SignatoryId)
                .to(super::signatories::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
        }
    }
}

impl Related<super::program_certificates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProgramCertificate.def()
    }
}

impl Related<super::signatories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Signatory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

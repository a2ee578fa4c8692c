use super::sea_orm_active_enums::{CredentialKind, CredentialStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A credential issued to a learner against a course or program certificate.
///
/// `(credential_kind, credential_id)` is the tagged reference to the
/// certificate configuration; see [`crate::credentials::CredentialRef`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub credential_kind: CredentialKind,
    pub credential_id: Uuid,
    pub username: String,
    pub status: CredentialStatus,
    pub download_url: Option<String>,
    #[sea_orm(unique)]
    pub uuid: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Attributes,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Attributes => Entity::has_many(super::user_credential_attributes::Entity).into(),
        }
    }
}

impl Related<super::user_credential_attributes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attributes.def()
    }
}

super::timestamped_behavior!();

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Namespaced key/value metadata on a user credential (grade, whitelist, ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credential_attributes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_credential_id: Uuid,
    pub namespace: String,
    pub name: String,
    pub value: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    UserCredential,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::UserCredential => Entity::belongs_to(super::user_credentials::Entity)
                .from(Column::UserCredentialId)
                .to(super::user_credentials::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
        }
    }
}

impl Related<super::user_credentials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCredential.def()
    }
}

super::timestamped_behavior!();

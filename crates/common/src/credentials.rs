//! Issuing and revoking learner credentials.
//!
//! A user credential points at exactly one certificate configuration through
//! [`CredentialRef`]. At most one credential exists per (username, reference);
//! awarding again re-activates the existing row instead of adding another.

use crate::entities::sea_orm_active_enums::{CredentialKind, CredentialStatus};
use crate::entities::{
    course_certificates, program_certificates, user_credential_attributes, user_credentials,
};
use crate::error::{CredentialsError, Result};
use crate::models::{AttributeInput, AwardCredentialRequest, CredentialListQuery};
use crate::validation::{MAX_CHAR_LENGTH, validate_max_length, validate_required};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Typed reference from a user credential to its certificate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CredentialRef {
    CourseCertificate(Uuid),
    ProgramCertificate(Uuid),
}

impl CredentialRef {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::CourseCertificate(_) => CredentialKind::CourseCertificate,
            Self::ProgramCertificate(_) => CredentialKind::ProgramCertificate,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::CourseCertificate(id) | Self::ProgramCertificate(id) => *id,
        }
    }

    pub fn from_parts(kind: CredentialKind, id: Uuid) -> Self {
        match kind {
            CredentialKind::CourseCertificate => Self::CourseCertificate(id),
            CredentialKind::ProgramCertificate => Self::ProgramCertificate(id),
        }
    }
}

impl user_credentials::Model {
    pub fn credential_ref(&self) -> CredentialRef {
        CredentialRef::from_parts(self.credential_kind, self.credential_id)
    }
}

/// Shape shared by course and program certificate configurations.
pub trait CertificateConfig {
    fn credential_ref(&self) -> CredentialRef;
    fn site_id(&self) -> Uuid;
    fn is_active(&self) -> bool;
    fn template_id(&self) -> Option<Uuid>;
    fn title(&self) -> Option<&str>;
}

impl CertificateConfig for course_certificates::Model {
    fn credential_ref(&self) -> CredentialRef {
        CredentialRef::CourseCertificate(self.id)
    }

    fn site_id(&self) -> Uuid {
        self.site_id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn template_id(&self) -> Option<Uuid> {
        self.template_id
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl CertificateConfig for program_certificates::Model {
    fn credential_ref(&self) -> CredentialRef {
        CredentialRef::ProgramCertificate(self.id)
    }

    fn site_id(&self) -> Uuid {
        self.site_id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn template_id(&self) -> Option<Uuid> {
        self.template_id
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// A loaded certificate configuration of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "certificate", rename_all = "snake_case")]
pub enum Certificate {
    CourseCertificate(course_certificates::Model),
    ProgramCertificate(program_certificates::Model),
}

impl Certificate {
    pub fn config(&self) -> &dyn CertificateConfig {
        match self {
            Self::CourseCertificate(model) => model,
            Self::ProgramCertificate(model) => model,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::CourseCertificate(model) => model.display_name(),
            Self::ProgramCertificate(model) => model.display_name(),
        }
    }
}

pub async fn load_certificate<C>(db: &C, reference: CredentialRef) -> Result<Certificate>
where
    C: ConnectionTrait,
{
    let certificate = match reference {
        CredentialRef::CourseCertificate(id) => course_certificates::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Certificate::CourseCertificate),
        CredentialRef::ProgramCertificate(id) => program_certificates::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Certificate::ProgramCertificate),
    };
    certificate.ok_or_else(|| CredentialsError::not_found("certificate configuration"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardOutcome {
    pub credential: user_credentials::Model,
    /// False when an existing row was re-awarded.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokeOutcome {
    pub credential: user_credentials::Model,
    /// False when the credential was already revoked.
    pub revoked: bool,
}

fn validate_award(req: &AwardCredentialRequest) -> Result<()> {
    validate_required("username", &req.username, MAX_CHAR_LENGTH)?;
    if let Some(url) = &req.download_url {
        validate_max_length("download_url", url, MAX_CHAR_LENGTH)?;
    }
    for attribute in &req.attributes {
        validate_attribute(attribute)?;
    }
    Ok(())
}

fn validate_attribute(attribute: &AttributeInput) -> Result<()> {
    validate_required("namespace", &attribute.namespace, MAX_CHAR_LENGTH)?;
    validate_required("name", &attribute.name, MAX_CHAR_LENGTH)?;
    validate_max_length("value", &attribute.value, MAX_CHAR_LENGTH)?;
    Ok(())
}

/// Awards `req.credential` to `req.username`.
///
/// The certificate configuration must exist and be active. An existing
/// credential for the same pair is moved back to `awarded`.
pub async fn award_credential(
    db: &DatabaseConnection,
    req: AwardCredentialRequest,
) -> Result<AwardOutcome> {
    validate_award(&req)?;

    let outcome = crate::txn!(db, |txn| {
        let certificate = load_certificate(txn, req.credential).await?;
        if !certificate.config().is_active() {
            return Err(CredentialsError::bad_request(format!(
                "{} is not active",
                certificate.display_name()
            )));
        }

        let existing = user_credentials::Entity::find()
            .filter(user_credentials::Column::Username.eq(&req.username))
            .filter(user_credentials::Column::CredentialKind.eq(req.credential.kind()))
            .filter(user_credentials::Column::CredentialId.eq(req.credential.id()))
            .one(txn)
            .await?;

        let (credential, created) = match existing {
            Some(existing) => {
                let mut active: user_credentials::ActiveModel = existing.into();
                active.status = Set(CredentialStatus::Awarded);
                if let Some(url) = req.download_url.clone() {
                    active.download_url = Set(Some(url));
                }
                (active.update(txn).await?, false)
            }
            None => {
                let active = user_credentials::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    credential_kind: Set(req.credential.kind()),
                    credential_id: Set(req.credential.id()),
                    username: Set(req.username.clone()),
                    status: Set(CredentialStatus::Awarded),
                    download_url: Set(req.download_url.clone()),
                    uuid: Set(Uuid::new_v4()),
                    ..Default::default()
                };
                let inserted = active
                    .insert(txn)
                    .await
                    .map_err(|err| CredentialsError::from_db_unique(err, "user credential"))?;
                (inserted, true)
            }
        };

        for attribute in &req.attributes {
            upsert_attribute(txn, credential.id, attribute).await?;
        }

        Ok::<_, CredentialsError>(AwardOutcome {
            credential,
            created,
        })
    })?;

    tracing::info!(
        username = %outcome.credential.username,
        credential_id = %outcome.credential.id,
        created = outcome.created,
        "credential awarded"
    );
    Ok(outcome)
}

/// Moves a credential to `revoked`. Revoking twice is a no-op.
pub async fn revoke_credential(db: &DatabaseConnection, id: Uuid) -> Result<RevokeOutcome> {
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    // 条件更新：并发撤销同一凭证时只有一个请求会改到这一行
    let result = user_credentials::Entity::update_many()
        .col_expr(user_credentials::Column::Status, Expr::value(CredentialStatus::Revoked))
        .col_expr(user_credentials::Column::UpdatedAt, Expr::value(now))
        .filter(user_credentials::Column::Id.eq(id))
        .filter(user_credentials::Column::Status.ne(CredentialStatus::Revoked))
        .exec(db)
        .await?;

    let credential = get_credential(db, id).await?;
    let revoked = result.rows_affected > 0;
    if revoked {
        tracing::info!(
            username = %credential.username,
            credential_id = %credential.id,
            "credential revoked"
        );
    }
    Ok(RevokeOutcome {
        credential,
        revoked,
    })
}

pub async fn list_credentials(
    db: &DatabaseConnection,
    query: &CredentialListQuery,
) -> Result<Vec<user_credentials::Model>> {
    let mut select =
        user_credentials::Entity::find().order_by_asc(user_credentials::Column::CreatedAt);
    if let Some(username) = &query.username {
        select = select.filter(user_credentials::Column::Username.eq(username));
    }
    if let Some(status) = query.status {
        select = select.filter(user_credentials::Column::Status.eq(status));
    }
    Ok(select.all(db).await?)
}

pub async fn get_credential(db: &DatabaseConnection, id: Uuid) -> Result<user_credentials::Model> {
    user_credentials::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("user credential"))
}

/// Credentials held against one certificate configuration.
pub async fn credentials_for_certificate(
    db: &DatabaseConnection,
    reference: CredentialRef,
) -> Result<Vec<user_credentials::Model>> {
    Ok(user_credentials::Entity::find()
        .filter(user_credentials::Column::CredentialKind.eq(reference.kind()))
        .filter(user_credentials::Column::CredentialId.eq(reference.id()))
        .order_by_asc(user_credentials::Column::Username)
        .all(db)
        .await?)
}

/// Sets `namespace:name` on a credential, replacing any previous value.
pub async fn set_attribute(
    db: &DatabaseConnection,
    credential_id: Uuid,
    attribute: AttributeInput,
) -> Result<user_credential_attributes::Model> {
    validate_attribute(&attribute)?;
    get_credential(db, credential_id).await?;
    upsert_attribute(db, credential_id, &attribute).await
}

pub async fn list_attributes(
    db: &DatabaseConnection,
    credential_id: Uuid,
) -> Result<Vec<user_credential_attributes::Model>> {
    let credential = get_credential(db, credential_id).await?;
    Ok(credential
        .find_related(user_credential_attributes::Entity)
        .order_by_asc(user_credential_attributes::Column::Namespace)
        .order_by_asc(user_credential_attributes::Column::Name)
        .all(db)
        .await?)
}

async fn upsert_attribute<C>(
    db: &C,
    credential_id: Uuid,
    attribute: &AttributeInput,
) -> Result<user_credential_attributes::Model>
where
    C: ConnectionTrait,
{
    let existing = user_credential_attributes::Entity::find()
        .filter(user_credential_attributes::Column::UserCredentialId.eq(credential_id))
        .filter(user_credential_attributes::Column::Namespace.eq(&attribute.namespace))
        .filter(user_credential_attributes::Column::Name.eq(&attribute.name))
        .one(db)
        .await?;

    let model = match existing {
        Some(existing) => {
            let mut active: user_credential_attributes::ActiveModel = existing.into();
            active.value = Set(attribute.value.clone());
            active.update(db).await?
        }
        None => {
            user_credential_attributes::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_credential_id: Set(credential_id),
                namespace: Set(attribute.namespace.clone()),
                name: Set(attribute.name.clone()),
                value: Set(attribute.value.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    Ok(model)
}

//! Certificate templates and course / program certificate configurations.

use crate::credentials::{CertificateConfig, CredentialRef};
use crate::entities::{
    certificate_templates, course_certificate_signatories, course_certificates,
    program_certificate_signatories, program_certificates, signatories,
};
use crate::error::{CredentialsError, Result};
use crate::models::{
    CreateCertificateTemplate, CreateCourseCertificate, CreateProgramCertificate,
    UpdateCertificate, UpdateCertificateTemplate,
};
use crate::sites::get_site;
use crate::validation::{
    MAX_CHAR_LENGTH, validate_certificate_mode, validate_course_key, validate_max_length,
    validate_program_id, validate_required,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

// ============ 证书模板 ============

pub async fn create_template(
    db: &DatabaseConnection,
    req: CreateCertificateTemplate,
) -> Result<certificate_templates::Model> {
    validate_required("name", &req.name, MAX_CHAR_LENGTH)?;

    certificate_templates::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        content: Set(req.content),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| CredentialsError::from_db_unique(err, "certificate template"))
}

pub async fn list_templates(db: &DatabaseConnection) -> Result<Vec<certificate_templates::Model>> {
    Ok(certificate_templates::Entity::find()
        .order_by_asc(certificate_templates::Column::Name)
        .all(db)
        .await?)
}

pub async fn get_template<C>(db: &C, id: Uuid) -> Result<certificate_templates::Model>
where
    C: ConnectionTrait,
{
    certificate_templates::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("certificate template"))
}

pub async fn update_template(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateCertificateTemplate,
) -> Result<certificate_templates::Model> {
    let template = get_template(db, id).await?;
    let mut active: certificate_templates::ActiveModel = template.into();
    if let Some(name) = req.name {
        validate_required("name", &name, MAX_CHAR_LENGTH)?;
        active.name = Set(name);
    }
    if let Some(content) = req.content {
        active.content = Set(content);
    }
    active
        .update(db)
        .await
        .map_err(|err| CredentialsError::from_db_unique(err, "certificate template"))
}

/// Certificates using the template keep existing with `template_id` cleared.
pub async fn delete_template(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let template = get_template(db, id).await?;
    template.delete(db).await?;
    Ok(())
}

// ============ 公共校验 ============

fn validate_title(title: Option<&str>) -> Result<()> {
    if let Some(title) = title {
        validate_max_length("title", title, MAX_CHAR_LENGTH)?;
    }
    Ok(())
}

async fn ensure_template<C>(db: &C, template_id: Option<Uuid>) -> Result<()>
where
    C: ConnectionTrait,
{
    if let Some(id) = template_id {
        get_template(db, id).await?;
    }
    Ok(())
}

async fn ensure_signatories<C>(db: &C, ids: &[Uuid]) -> Result<()>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(());
    }
    let found = signatories::Entity::find()
        .filter(signatories::Column::Id.is_in(ids.iter().copied()))
        .count(db)
        .await?;
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    if found as usize != unique.len() {
        return Err(CredentialsError::not_found("signatory"));
    }
    Ok(())
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

/// Replaces every signatory link of `reference` with `signatory_ids`.
async fn replace_signatory_links<C>(
    db: &C,
    reference: CredentialRef,
    signatory_ids: &[Uuid],
) -> Result<()>
where
    C: ConnectionTrait,
{
    match reference {
        CredentialRef::CourseCertificate(id) => {
            course_certificate_signatories::Entity::delete_many()
                .filter(course_certificate_signatories::Column::CourseCertificateId.eq(id))
                .exec(db)
                .await?;
            for signatory_id in dedup(signatory_ids) {
                course_certificate_signatories::ActiveModel {
                    course_certificate_id: Set(id),
                    signatory_id: Set(signatory_id),
                }
                .insert(db)
                .await?;
            }
        }
        CredentialRef::ProgramCertificate(id) => {
            program_certificate_signatories::Entity::delete_many()
                .filter(program_certificate_signatories::Column::ProgramCertificateId.eq(id))
                .exec(db)
                .await?;
            for signatory_id in dedup(signatory_ids) {
                program_certificate_signatories::ActiveModel {
                    program_certificate_id: Set(id),
                    signatory_id: Set(signatory_id),
                }
                .insert(db)
                .await?;
            }
        }
    }
    Ok(())
}

// ============ 课程证书 ============

pub async fn create_course_certificate(
    db: &DatabaseConnection,
    req: CreateCourseCertificate,
) -> Result<course_certificates::Model> {
    validate_max_length("course_id", &req.course_id, MAX_CHAR_LENGTH)?;
    let course_key = validate_course_key(&req.course_id)?;
    let mode = validate_certificate_mode(&req.certificate_type)?;
    validate_title(req.title.as_deref())?;

    let certificate = crate::txn!(db, |txn| {
        get_site(txn, req.site_id).await?;
        ensure_template(txn, req.template_id).await?;
        ensure_signatories(txn, &req.signatory_ids).await?;

        let certificate = course_certificates::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(req.site_id),
            is_active: Set(req.is_active.unwrap_or(false)),
            template_id: Set(req.template_id),
            title: Set(req.title.clone()),
            course_id: Set(course_key.to_string()),
            certificate_type: Set(mode),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|err| CredentialsError::from_db_unique(err, "course certificate"))?;

        replace_signatory_links(txn, certificate.credential_ref(), &req.signatory_ids).await?;
        Ok::<_, CredentialsError>(certificate)
    })?;

    tracing::info!(
        certificate_id = %certificate.id,
        course_id = %certificate.course_id,
        mode = %certificate.certificate_type,
        "course certificate created"
    );
    Ok(certificate)
}

pub async fn list_course_certificates(
    db: &DatabaseConnection,
    site_id: Option<Uuid>,
) -> Result<Vec<course_certificates::Model>> {
    let mut select = course_certificates::Entity::find()
        .order_by_asc(course_certificates::Column::CourseId)
        .order_by_asc(course_certificates::Column::CertificateType);
    if let Some(site_id) = site_id {
        select = select.filter(course_certificates::Column::SiteId.eq(site_id));
    }
    Ok(select.all(db).await?)
}

pub async fn get_course_certificate(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<course_certificates::Model> {
    course_certificates::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("course certificate"))
}

pub async fn update_course_certificate(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateCertificate,
) -> Result<course_certificates::Model> {
    validate_title(req.title.as_ref().and_then(|t| t.as_deref()))?;

    crate::txn!(db, |txn| {
        let certificate = course_certificates::Entity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| CredentialsError::not_found("course certificate"))?;

        let mut active: course_certificates::ActiveModel = certificate.into();
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(template_id) = req.template_id {
            ensure_template(txn, template_id).await?;
            active.template_id = Set(template_id);
        }
        if let Some(title) = req.title.clone() {
            active.title = Set(title);
        }
        let updated = active.update(txn).await?;

        if let Some(signatory_ids) = &req.signatory_ids {
            ensure_signatories(txn, signatory_ids).await?;
            replace_signatory_links(txn, updated.credential_ref(), signatory_ids).await?;
        }
        Ok::<_, CredentialsError>(updated)
    })
    .map_err(CredentialsError::from)
}

/// Cascades to signatory links; awarded credentials referencing the
/// configuration are left in place.
pub async fn delete_course_certificate(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let certificate = get_course_certificate(db, id).await?;
    certificate.delete(db).await?;
    Ok(())
}

// ============ 项目证书 ============

pub async fn create_program_certificate(
    db: &DatabaseConnection,
    req: CreateProgramCertificate,
) -> Result<program_certificates::Model> {
    validate_program_id(req.program_id)?;
    validate_title(req.title.as_deref())?;

    let certificate = crate::txn!(db, |txn| {
        get_site(txn, req.site_id).await?;
        ensure_template(txn, req.template_id).await?;
        ensure_signatories(txn, &req.signatory_ids).await?;

        let certificate = program_certificates::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(req.site_id),
            is_active: Set(req.is_active.unwrap_or(false)),
            template_id: Set(req.template_id),
            title: Set(req.title.clone()),
            program_id: Set(req.program_id),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|err| CredentialsError::from_db_unique(err, "program certificate"))?;

        replace_signatory_links(txn, certificate.credential_ref(), &req.signatory_ids).await?;
        Ok::<_, CredentialsError>(certificate)
    })?;

    tracing::info!(
        certificate_id = %certificate.id,
        program_id = certificate.program_id,
        "program certificate created"
    );
    Ok(certificate)
}

pub async fn list_program_certificates(
    db: &DatabaseConnection,
    site_id: Option<Uuid>,
) -> Result<Vec<program_certificates::Model>> {
    let mut select =
        program_certificates::Entity::find().order_by_asc(program_certificates::Column::ProgramId);
    if let Some(site_id) = site_id {
        select = select.filter(program_certificates::Column::SiteId.eq(site_id));
    }
    Ok(select.all(db).await?)
}

pub async fn get_program_certificate(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<program_certificates::Model> {
    program_certificates::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("program certificate"))
}

pub async fn update_program_certificate(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateCertificate,
) -> Result<program_certificates::Model> {
    validate_title(req.title.as_ref().and_then(|t| t.as_deref()))?;

    crate::txn!(db, |txn| {
        let certificate = program_certificates::Entity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| CredentialsError::not_found("program certificate"))?;

        let mut active: program_certificates::ActiveModel = certificate.into();
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(template_id) = req.template_id {
            ensure_template(txn, template_id).await?;
            active.template_id = Set(template_id);
        }
        if let Some(title) = req.title.clone() {
            active.title = Set(title);
        }
        let updated = active.update(txn).await?;

        if let Some(signatory_ids) = &req.signatory_ids {
            ensure_signatories(txn, signatory_ids).await?;
            replace_signatory_links(txn, updated.credential_ref(), signatory_ids).await?;
        }
        Ok::<_, CredentialsError>(updated)
    })
    .map_err(CredentialsError::from)
}

pub async fn delete_program_certificate(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let certificate = get_program_certificate(db, id).await?;
    certificate.delete(db).await?;
    Ok(())
}

/// Signatories linked to a certificate configuration, by name.
pub async fn certificate_signatories(
    db: &DatabaseConnection,
    reference: CredentialRef,
) -> Result<Vec<signatories::Model>> {
    let signatories = match reference {
        CredentialRef::CourseCertificate(id) => {
            let certificate = get_course_certificate(db, id).await?;
            certificate
                .find_related(signatories::Entity)
                .order_by_asc(signatories::Column::Name)
                .all(db)
                .await?
        }
        CredentialRef::ProgramCertificate(id) => {
            let certificate = get_program_certificate(db, id).await?;
            certificate
                .find_related(signatories::Entity)
                .order_by_asc(signatories::Column::Name)
                .all(db)
                .await?
        }
    };
    Ok(signatories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::CertificateMode;
    use crate::test_support::{setup_db, signatory, site};

    fn course_req(site_id: Uuid, course_id: &str, mode: &str) -> CreateCourseCertificate {
        CreateCourseCertificate {
            site_id,
            course_id: course_id.to_string(),
            certificate_type: mode.to_string(),
            is_active: Some(true),
            template_id: None,
            title: None,
            signatory_ids: Vec::new(),
        }
    }

    fn program_req(site_id: Uuid, program_id: i64) -> CreateProgramCertificate {
        CreateProgramCertificate {
            site_id,
            program_id,
            is_active: None,
            template_id: None,
            title: None,
            signatory_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_course_certificate_unique_per_course_mode_site() {
        let db = setup_db().await;
        let site_a = site(&db, "a.example.com").await;
        let site_b = site(&db, "b.example.com").await;

        let demo = "course-v1:edX+DemoX+2015";
        create_course_certificate(&db, course_req(site_a.id, demo, "verified"))
            .await
            .unwrap();
        // 不同模式、不同站点都可以
        create_course_certificate(&db, course_req(site_a.id, demo, "honor"))
            .await
            .unwrap();
        create_course_certificate(&db, course_req(site_b.id, demo, "verified"))
            .await
            .unwrap();

        let err = create_course_certificate(&db, course_req(site_a.id, demo, "verified"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialsError::Conflict(_)));
        assert_eq!(list_course_certificates(&db, Some(site_a.id)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_course_certificate_validation() {
        let db = setup_db().await;
        let site = site(&db, "example.com").await;

        let err = create_course_certificate(&db, course_req(site.id, "not a key", "honor"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "validation failed: Invalid course key.");

        let err = create_course_certificate(&db, course_req(site.id, "TestX/TS01/2015", "audit"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialsError::Validation(_)));

        let mut req = course_req(site.id, "TestX/TS01/2015", "professional");
        req.title = Some("t".repeat(256));
        assert!(create_course_certificate(&db, req).await.is_err());

        let req = course_req(site.id, "TestX/TS01/2015", "professional");
        let created = create_course_certificate(&db, req).await.unwrap();
        assert_eq!(created.certificate_type, CertificateMode::Professional);
        assert_eq!(created.course_id, "TestX/TS01/2015");
    }

    #[tokio::test]
    async fn test_course_id_longer_than_column_rejected() {
        let db = setup_db().await;
        let site = site(&db, "example.com").await;

        // 合法的 key 格式，但超出 255 个字符
        let course_id = format!("course-v1:edX+{}+2015", "X".repeat(300));
        let err = create_course_certificate(&db, course_req(site.id, &course_id, "honor"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialsError::Validation(_)));
        assert!(err.to_string().contains("course_id has"));
        assert!(list_course_certificates(&db, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_join_rows_navigate_both_ways() {
        let db = setup_db().await;
        let site = site(&db, "example.com").await;
        let ada = signatory(&db, "Ada").await;

        let mut req = course_req(site.id, "TestX/TS01/2015", "honor");
        req.signatory_ids = vec![ada.id];
        let certificate = create_course_certificate(&db, req).await.unwrap();

        let link = course_certificate_signatories::Entity::find()
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let linked_signatory = link
            .find_related(signatories::Entity)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(linked_signatory.id, ada.id);
        let linked_certificate = link
            .find_related(course_certificates::Entity)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(linked_certificate.id, certificate.id);
    }

    #[tokio::test]
    async fn test_program_id_unique_and_non_negative() {
        let db = setup_db().await;
        let site = site(&db, "example.com").await;

        let created = create_program_certificate(&db, program_req(site.id, 0)).await.unwrap();
        assert!(!created.is_active);

        let err = create_program_certificate(&db, program_req(site.id, 0)).await.unwrap_err();
        assert!(matches!(err, CredentialsError::Conflict(_)));

        let err = create_program_certificate(&db, program_req(site.id, -1)).await.unwrap_err();
        assert!(matches!(err, CredentialsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_signatory_links_are_replaced() {
        let db = setup_db().await;
        let site = site(&db, "example.com").await;
        let first = signatory(&db, "Ada").await;
        let second = signatory(&db, "Grace").await;

        let mut req = program_req(site.id, 42);
        req.signatory_ids = vec![first.id, first.id];
        let certificate = create_program_certificate(&db, req).await.unwrap();
        let linked = certificate_signatories(&db, certificate.credential_ref()).await.unwrap();
        assert_eq!(linked.len(), 1);

        update_program_certificate(
            &db,
            certificate.id,
            UpdateCertificate {
                signatory_ids: Some(vec![second.id, first.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let names: Vec<_> = certificate_signatories(&db, certificate.credential_ref())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Grace"]);

        let err = update_program_certificate(
            &db,
            certificate.id,
            UpdateCertificate {
                signatory_ids: Some(vec![Uuid::new_v4()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CredentialsError::NotFound(_)));
        // 失败的更新整体回滚
        assert_eq!(
            certificate_signatories(&db, certificate.credential_ref()).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_template_delete_clears_reference() {
        let db = setup_db().await;
        let site = site(&db, "example.com").await;
        let template = create_template(
            &db,
            CreateCertificateTemplate {
                name: "default".to_string(),
                content: "<html></html>".to_string(),
            },
        )
        .await
        .unwrap();

        let mut req = course_req(site.id, "TestX/TS01/2015", "honor");
        req.template_id = Some(template.id);
        req.title = Some("Honor Code Certificate".to_string());
        let certificate = create_course_certificate(&db, req).await.unwrap();
        assert_eq!(certificate.template_id, Some(template.id));

        delete_template(&db, template.id).await.unwrap();
        let reloaded = get_course_certificate(&db, certificate.id).await.unwrap();
        assert_eq!(reloaded.template_id, None);

        let cleared = update_course_certificate(
            &db,
            certificate.id,
            UpdateCertificate {
                title: Some(None),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.title, None);
        assert!(!cleared.is_active);
    }

    #[tokio::test]
    async fn test_template_name_unique() {
        let db = setup_db().await;
        let req = CreateCertificateTemplate {
            name: "default".to_string(),
            content: String::new(),
        };
        create_template(&db, req.clone()).await.unwrap();
        let err = create_template(&db, req).await.unwrap_err();
        assert!(matches!(err, CredentialsError::Conflict(_)));
    }
}

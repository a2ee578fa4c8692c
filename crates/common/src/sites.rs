//! Sites and their per-site configuration.

use crate::entities::{site_configurations, sites};
use crate::error::{CredentialsError, Result};
use crate::models::{CreateSite, CreateSiteConfiguration, UpdateSite, UpdateSiteConfiguration};
use crate::validation::{MAX_CHAR_LENGTH, validate_required, validate_url};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

const MAX_SITE_NAME: usize = 50;

pub async fn create_site(db: &DatabaseConnection, req: CreateSite) -> Result<sites::Model> {
    validate_required("domain", &req.domain, MAX_CHAR_LENGTH)?;
    validate_required("name", &req.name, MAX_SITE_NAME)?;

    let site = sites::ActiveModel {
        id: Set(Uuid::new_v4()),
        domain: Set(req.domain),
        name: Set(req.name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| CredentialsError::from_db_unique(err, "site domain"))?;

    tracing::info!(site_id = %site.id, domain = %site.domain, "site created");
    Ok(site)
}

pub async fn list_sites(db: &DatabaseConnection) -> Result<Vec<sites::Model>> {
    Ok(sites::Entity::find()
        .order_by_asc(sites::Column::Domain)
        .all(db)
        .await?)
}

pub async fn get_site<C>(db: &C, id: Uuid) -> Result<sites::Model>
where
    C: ConnectionTrait,
{
    sites::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("site"))
}

pub async fn update_site(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateSite,
) -> Result<sites::Model> {
    let site = get_site(db, id).await?;
    let mut active: sites::ActiveModel = site.into();
    if let Some(domain) = req.domain {
        validate_required("domain", &domain, MAX_CHAR_LENGTH)?;
        active.domain = Set(domain);
    }
    if let Some(name) = req.name {
        validate_required("name", &name, MAX_SITE_NAME)?;
        active.name = Set(name);
    }
    active
        .update(db)
        .await
        .map_err(|err| CredentialsError::from_db_unique(err, "site domain"))
}

/// Deleting a site cascades to its configuration and certificates.
pub async fn delete_site(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let site = get_site(db, id).await?;
    site.delete(db).await?;
    tracing::info!(site_id = %id, "site deleted");
    Ok(())
}

fn validate_configuration(lms_url_root: &str, theme_scss_path: &str) -> Result<()> {
    validate_url("lms_url_root", lms_url_root)?;
    validate_required("theme_scss_path", theme_scss_path, MAX_CHAR_LENGTH)?;
    Ok(())
}

pub async fn create_site_configuration(
    db: &DatabaseConnection,
    req: CreateSiteConfiguration,
) -> Result<site_configurations::Model> {
    validate_configuration(&req.lms_url_root, &req.theme_scss_path)?;
    get_site(db, req.site_id).await?;

    let configuration = site_configurations::ActiveModel {
        id: Set(Uuid::new_v4()),
        site_id: Set(req.site_id),
        lms_url_root: Set(req.lms_url_root),
        theme_scss_path: Set(req.theme_scss_path),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| CredentialsError::from_db_unique(err, "site configuration"))?;
    Ok(configuration)
}

pub async fn get_site_configuration(
    db: &DatabaseConnection,
    site_id: Uuid,
) -> Result<site_configurations::Model> {
    site_configurations::Entity::find()
        .filter(site_configurations::Column::SiteId.eq(site_id))
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("site configuration"))
}

pub async fn update_site_configuration(
    db: &DatabaseConnection,
    site_id: Uuid,
    req: UpdateSiteConfiguration,
) -> Result<site_configurations::Model> {
    let configuration = get_site_configuration(db, site_id).await?;
    let lms_url_root = req
        .lms_url_root
        .unwrap_or_else(|| configuration.lms_url_root.clone());
    let theme_scss_path = req
        .theme_scss_path
        .unwrap_or_else(|| configuration.theme_scss_path.clone());
    validate_configuration(&lms_url_root, &theme_scss_path)?;

    let mut active: site_configurations::ActiveModel = configuration.into();
    active.lms_url_root = Set(lms_url_root);
    active.theme_scss_path = Set(theme_scss_path);
    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    fn new_site(domain: &str) -> CreateSite {
        CreateSite {
            domain: domain.to_string(),
            name: "Example".to_string(),
        }
    }

    #[tokio::test]
    async fn test_site_domain_is_unique() {
        let db = setup_db().await;
        create_site(&db, new_site("example.com")).await.unwrap();
        let err = create_site(&db, new_site("example.com")).await.unwrap_err();
        assert!(matches!(err, CredentialsError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_site_name_length() {
        let db = setup_db().await;
        let mut req = new_site("example.com");
        req.name = "n".repeat(51);
        let err = create_site(&db, req).await.unwrap_err();
        assert!(matches!(err, CredentialsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_one_configuration_per_site() {
        let db = setup_db().await;
        let site = create_site(&db, new_site("example.com")).await.unwrap();
        let req = CreateSiteConfiguration {
            site_id: site.id,
            lms_url_root: "https://lms.example.com".to_string(),
            theme_scss_path: "sass/theme.scss".to_string(),
        };
        create_site_configuration(&db, req.clone()).await.unwrap();
        let err = create_site_configuration(&db, req).await.unwrap_err();
        assert!(matches!(err, CredentialsError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_configuration_requires_http_url() {
        let db = setup_db().await;
        let site = create_site(&db, new_site("example.com")).await.unwrap();
        let err = create_site_configuration(
            &db,
            CreateSiteConfiguration {
                site_id: site.id,
                lms_url_root: "lms.example.com".to_string(),
                theme_scss_path: "sass/theme.scss".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CredentialsError::Validation(_)));

        create_site_configuration(
            &db,
            CreateSiteConfiguration {
                site_id: site.id,
                lms_url_root: "http://localhost:8000".to_string(),
                theme_scss_path: "sass/theme.scss".to_string(),
            },
        )
        .await
        .unwrap();
        let updated = update_site_configuration(
            &db,
            site.id,
            UpdateSiteConfiguration {
                lms_url_root: Some("https://courses.example.com".to_string()),
                theme_scss_path: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.theme_scss_path, "sass/theme.scss");
        assert_eq!(updated.lms_url_root, "https://courses.example.com");
    }

    #[tokio::test]
    async fn test_delete_site_cascades_configuration() {
        let db = setup_db().await;
        let site = create_site(&db, new_site("example.com")).await.unwrap();
        create_site_configuration(
            &db,
            CreateSiteConfiguration {
                site_id: site.id,
                lms_url_root: "https://lms.example.com".to_string(),
                theme_scss_path: "sass/theme.scss".to_string(),
            },
        )
        .await
        .unwrap();

        delete_site(&db, site.id).await.unwrap();
        assert!(matches!(
            get_site_configuration(&db, site.id).await,
            Err(CredentialsError::NotFound(_))
        ));
    }
}

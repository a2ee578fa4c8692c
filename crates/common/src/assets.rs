//! File-backed records: signatories (with their image) and certificate
//! template assets.
//!
//! The row id is allocated first so the storage path can embed it; the file
//! is written, then the row is inserted once. A failed insert removes the
//! file again.

use crate::entities::{certificate_template_assets, signatories};
use crate::error::{CredentialsError, Result};
use crate::storage::{FileStore, signatory_image_path, template_asset_path};
use crate::validation::{MAX_CHAR_LENGTH, clean_filename, validate_image, validate_required};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set};
use uuid::Uuid;

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignatoryFields {
    pub name: Option<String>,
    pub title: Option<String>,
}

/// Writes `upload` to `path`, runs `insert`, and removes
/// the file if `insert` fails.
async fn store_then_insert<T, F, Fut>(
    files: &dyn FileStore,
    path: String,
    upload: &Upload,
    insert: F,
) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    files.save(&path, &upload.data).await?;
    match insert().await {
        Ok(model) => Ok(model),
        Err(err) => {
            if let Err(cleanup) = files.delete(&path).await {
                tracing::warn!(path = %path, error = %cleanup, "failed to remove orphaned upload");
            }
            Err(err)
        }
    }
}

// ============ 签名人 ============

pub async fn create_signatory(
    db: &DatabaseConnection,
    files: &dyn FileStore,
    name: String,
    title: String,
    image: Upload,
) -> Result<signatories::Model> {
    validate_required("name", &name, MAX_CHAR_LENGTH)?;
    validate_required("title", &title, MAX_CHAR_LENGTH)?;
    validate_image(image.data.len())?;
    let filename = clean_filename(&image.filename)?;

    let id = Uuid::new_v4();
    let path = signatory_image_path(id, &filename);
    let signatory = store_then_insert(files, path.clone(), &image, || async move {
        Ok(signatories::ActiveModel {
            id: Set(id),
            name: Set(name),
            title: Set(title),
            image: Set(path.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?)
    })
    .await?;

    tracing::info!(signatory_id = %signatory.id, image = %signatory.image, "signatory created");
    Ok(signatory)
}

pub async fn list_signatories(db: &DatabaseConnection) -> Result<Vec<signatories::Model>> {
    Ok(signatories::Entity::find()
        .order_by_asc(signatories::Column::Name)
        .all(db)
        .await?)
}

pub async fn get_signatory(db: &DatabaseConnection, id: Uuid) -> Result<signatories::Model> {
    signatories::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("signatory"))
}

/// Updates name/title and optionally swaps the image. The new image lives in
/// the same id-derived directory; the previous file is removed once the row
/// points at the new one.
pub async fn update_signatory(
    db: &DatabaseConnection,
    files: &dyn FileStore,
    id: Uuid,
    fields: SignatoryFields,
    image: Option<Upload>,
) -> Result<signatories::Model> {
    let signatory = get_signatory(db, id).await?;
    let previous_image = signatory.image.clone();
    let mut active: signatories::ActiveModel = signatory.into();

    if let Some(name) = fields.name {
        validate_required("name", &name, MAX_CHAR_LENGTH)?;
        active.name = Set(name);
    }
    if let Some(title) = fields.title {
        validate_required("title", &title, MAX_CHAR_LENGTH)?;
        active.title = Set(title);
    }

    let Some(image) = image else {
        return Ok(active.update(db).await?);
    };

    validate_image(image.data.len())?;
    let filename = clean_filename(&image.filename)?;
    let path = signatory_image_path(id, &filename);
    active.image = Set(path.clone());

    // 同名上传会覆盖旧文件，先留一份以便更新失败时写回
    let overwritten = if path == previous_image {
        files.read(&path).await?
    } else {
        None
    };

    files.save(&path, &image.data).await?;
    let updated = match active.update(db).await {
        Ok(updated) => updated,
        Err(err) => {
            let cleanup = match &overwritten {
                Some(original) => files.save(&path, original).await,
                None => files.delete(&path).await,
            };
            if let Err(cleanup) = cleanup {
                tracing::warn!(
                    path = %path,
                    error = %cleanup,
                    "failed to roll back signatory image"
                );
            }
            return Err(err.into());
        }
    };
    if previous_image != path {
        if let Err(err) = files.delete(&previous_image).await {
            tracing::warn!(path = %previous_image, error = %err, "failed to remove replaced image");
        }
    }
    Ok(updated)
}

/// Removes the signatory, its certificate links and its image. Certificate
/// configurations are untouched.
pub async fn delete_signatory(
    db: &DatabaseConnection,
    files: &dyn FileStore,
    id: Uuid,
) -> Result<()> {
    let signatory = get_signatory(db, id).await?;
    let image = signatory.image.clone();
    signatory.delete(db).await?;
    files.delete(&image).await?;
    tracing::info!(signatory_id = %id, "signatory deleted");
    Ok(())
}

// ============ 模板资源 ============

pub async fn create_template_asset(
    db: &DatabaseConnection,
    files: &dyn FileStore,
    name: String,
    asset: Upload,
) -> Result<certificate_template_assets::Model> {
    validate_required("name", &name, MAX_CHAR_LENGTH)?;
    let filename = clean_filename(&asset.filename)?;

    let id = Uuid::new_v4();
    let path = template_asset_path(id, &filename);
    store_then_insert(files, path.clone(), &asset, || async move {
        Ok(certificate_template_assets::ActiveModel {
            id: Set(id),
            name: Set(name),
            asset_file: Set(path.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?)
    })
    .await
}

pub async fn list_template_assets(
    db: &DatabaseConnection,
) -> Result<Vec<certificate_template_assets::Model>> {
    Ok(certificate_template_assets::Entity::find()
        .order_by_asc(certificate_template_assets::Column::Name)
        .all(db)
        .await?)
}

pub async fn get_template_asset(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<certificate_template_assets::Model> {
    certificate_template_assets::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CredentialsError::not_found("certificate template asset"))
}

/// Renames the asset without touching its stored file.
pub async fn rename_template_asset(
    db: &DatabaseConnection,
    id: Uuid,
    name: String,
) -> Result<certificate_template_assets::Model> {
    validate_required("name", &name, MAX_CHAR_LENGTH)?;
    let asset = get_template_asset(db, id).await?;
    let mut active: certificate_template_assets::ActiveModel = asset.into();
    active.name = Set(name);
    Ok(active.update(db).await?)
}

pub async fn delete_template_asset(
    db: &DatabaseConnection,
    files: &dyn FileStore,
    id: Uuid,
) -> Result<()> {
    let asset = get_template_asset(db, id).await?;
    let path = asset.asset_file.clone();
    asset.delete(db).await?;
    files.delete(&path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::{
        certificate_signatories, create_course_certificate, get_course_certificate,
    };
    use crate::entities::course_certificates;
    use crate::credentials::CertificateConfig;
    use crate::models::CreateCourseCertificate;
    use crate::storage::LocalFileStore;
    use crate::test_support::{setup_db, site};
    use crate::validation::MAX_IMAGE_BYTES;
    use sea_orm::PaginatorTrait;

    fn png(bytes: usize) -> Upload {
        Upload::new("signature.png", vec![0u8; bytes])
    }

    #[tokio::test]
    async fn test_signatory_image_path_embeds_id() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "/media/");

        let signatory = create_signatory(
            &db,
            &files,
            "Ada Lovelace".to_string(),
            "Dean".to_string(),
            Upload::new("uploads/../signature.png", vec![1, 2, 3]),
        )
        .await
        .unwrap();

        assert_eq!(signatory.image, format!("signatories/{}/signature.png", signatory.id));
        assert!(files.exists(&signatory.image).await.unwrap());

        // 只改名字时路径不变
        let renamed = update_signatory(
            &db,
            &files,
            signatory.id,
            SignatoryFields {
                name: Some("Ada King".to_string()),
                title: None,
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(renamed.image, signatory.image);
        assert_eq!(renamed.name, "Ada King");
    }

    #[tokio::test]
    async fn test_signatory_image_size_limit() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "/media/");

        create_signatory(&db, &files, "A".to_string(), "B".to_string(), png(MAX_IMAGE_BYTES))
            .await
            .unwrap();

        let err = create_signatory(
            &db,
            &files,
            "A".to_string(),
            "B".to_string(),
            png(MAX_IMAGE_BYTES + 1),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: The image file size must be less than 250KB."
        );
        assert_eq!(signatories::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replacing_image_keeps_directory() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "/media/");

        let signatory = create_signatory(&db, &files, "A".to_string(), "B".to_string(), png(10))
            .await
            .unwrap();
        let updated = update_signatory(
            &db,
            &files,
            signatory.id,
            SignatoryFields::default(),
            Some(Upload::new("new.png", vec![9; 4])),
        )
        .await
        .unwrap();

        assert_eq!(updated.image, format!("signatories/{}/new.png", signatory.id));
        assert!(files.exists(&updated.image).await.unwrap());
        assert!(!files.exists(&signatory.image).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "/media/");
        let path = "signatories/orphan/signature.png".to_string();

        let result: Result<()> = store_then_insert(&files, path.clone(), &png(3), || async {
            Err(CredentialsError::conflict("duplicate"))
        })
        .await;

        assert!(result.is_err());
        assert!(!files.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_signatory_keeps_certificates() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "/media/");
        let site = site(&db, "example.com").await;

        let signatory = create_signatory(&db, &files, "A".to_string(), "B".to_string(), png(10))
            .await
            .unwrap();
        let certificate = create_course_certificate(
            &db,
            CreateCourseCertificate {
                site_id: site.id,
                course_id: "TestX/TS01/2015".to_string(),
                certificate_type: "honor".to_string(),
                is_active: Some(true),
                template_id: None,
                title: None,
                signatory_ids: vec![signatory.id],
            },
        )
        .await
        .unwrap();

        delete_signatory(&db, &files, signatory.id).await.unwrap();

        assert!(!files.exists(&signatory.image).await.unwrap());
        let linked = certificate_signatories(&db, certificate.credential_ref())
            .await
            .unwrap();
        assert!(linked.is_empty());

        // 证书配置本身保留
        let reloaded = get_course_certificate(&db, certificate.id).await.unwrap();
        assert_eq!(reloaded.course_id, "TestX/TS01/2015");
        assert!(reloaded.is_active);
        assert_eq!(course_certificates::Entity::find().count(&db).await.unwrap(), 1);
    }

    /// Local store that can drop a signatory row while saving, or refuse deletes.
    struct InterferingStore {
        inner: LocalFileStore,
        db: DatabaseConnection,
        drop_row_on_save: Option<Uuid>,
        fail_deletes: bool,
    }

    #[async_trait::async_trait]
    impl FileStore for InterferingStore {
        async fn save(&self, path: &str, data: &[u8]) -> Result<()> {
            self.inner.save(path, data).await?;
            if let Some(id) = self.drop_row_on_save {
                signatories::Entity::delete_by_id(id).exec(&self.db).await?;
            }
            Ok(())
        }

        async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
            self.inner.read(path).await
        }

        async fn delete(&self, path: &str) -> Result<()> {
            if self.fail_deletes {
                return Err(CredentialsError::storage("delete refused"));
            }
            self.inner.delete(path).await
        }

        async fn exists(&self, path: &str) -> Result<bool> {
            self.inner.exists(path).await
        }

        fn url(&self, path: &str) -> String {
            self.inner.url(path)
        }
    }

    #[tokio::test]
    async fn test_failed_update_restores_same_name_image() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let local = LocalFileStore::new(dir.path(), "/media/");

        let signatory = create_signatory(
            &db,
            &local,
            "A".to_string(),
            "B".to_string(),
            Upload::new("signature.png", vec![1, 1, 1]),
        )
        .await
        .unwrap();

        let store = InterferingStore {
            inner: local.clone(),
            db: db.clone(),
            drop_row_on_save: Some(signatory.id),
            fail_deletes: false,
        };
        let err = update_signatory(
            &db,
            &store,
            signatory.id,
            SignatoryFields::default(),
            Some(Upload::new("signature.png", vec![2, 2, 2, 2])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CredentialsError::Database(_)));
        assert_eq!(local.read(&signatory.image).await.unwrap(), Some(vec![1, 1, 1]));
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_fail_update() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let local = LocalFileStore::new(dir.path(), "/media/");

        let signatory = create_signatory(&db, &local, "A".to_string(), "B".to_string(), png(10))
            .await
            .unwrap();

        let store = InterferingStore {
            inner: local.clone(),
            db: db.clone(),
            drop_row_on_save: None,
            fail_deletes: true,
        };
        let updated = update_signatory(
            &db,
            &store,
            signatory.id,
            SignatoryFields::default(),
            Some(Upload::new("new.png", vec![9; 4])),
        )
        .await
        .unwrap();

        assert_eq!(updated.image, format!("signatories/{}/new.png", signatory.id));
        assert_eq!(get_signatory(&db, signatory.id).await.unwrap().image, updated.image);
        // 旧文件删不掉只记日志
        assert!(local.exists(&signatory.image).await.unwrap());
    }

    #[tokio::test]
    async fn test_template_asset_lifecycle() {
        let db = setup_db().await;
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "/media/");

        let asset = create_template_asset(
            &db,
            &files,
            "logo".to_string(),
            Upload::new("logo.svg", b"<svg/>".to_vec()),
        )
        .await
        .unwrap();
        assert_eq!(
            asset.asset_file,
            format!("certificate_template_assets/{}/logo.svg", asset.id)
        );

        let renamed = rename_template_asset(&db, asset.id, "header logo".to_string())
            .await
            .unwrap();
        assert_eq!(renamed.asset_file, asset.asset_file);

        let err = create_template_asset(&db, &files, "x".to_string(), Upload::new("..", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialsError::Validation(_)));

        delete_template_asset(&db, &files, asset.id).await.unwrap();
        assert!(!files.exists(&asset.asset_file).await.unwrap());
        assert!(list_template_assets(&db).await.unwrap().is_empty());
    }
}

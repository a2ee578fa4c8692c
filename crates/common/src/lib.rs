pub mod assets;
pub mod certificates;
pub mod config;
pub mod course_key;
pub mod credentials;
pub mod entities;
pub mod error;
pub mod fragment;
pub mod grades;
pub mod models;
pub mod sites;
pub mod storage;
pub mod transaction;
pub mod validation;

// ============ 重新导出常用类型 ============

// 错误处理
pub use error::{CredentialsError, Result};

// 配置相关
pub use config::AppConfig;

// 领域类型
pub use course_key::{CourseKey, InvalidKeyError, UsageKey};
pub use credentials::{
    AwardOutcome, Certificate, CertificateConfig, CredentialRef, RevokeOutcome,
};
pub use fragment::Fragment;

// 存储
pub use assets::Upload;
pub use storage::{FileStore, LocalFileStore};

// 验证相关
pub use validation::ValidationError;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::entities::sea_orm_active_enums::CertificateMode;
    use crate::entities::{course_certificates, program_certificates, signatories, sites};
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
    use sea_orm_migration::MigratorTrait;
    use uuid::Uuid;

    /// In-memory SQLite with every migration applied. A single connection
    /// keeps the memory database alive for the whole test.
    pub async fn setup_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        credentials_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    pub async fn site(db: &DatabaseConnection, domain: &str) -> sites::Model {
        sites::ActiveModel {
            id: Set(Uuid::new_v4()),
            domain: Set(domain.to_string()),
            name: Set("Test Site".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn signatory(db: &DatabaseConnection, name: &str) -> signatories::Model {
        let id = Uuid::new_v4();
        signatories::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            title: Set("Professor".to_string()),
            image: Set(crate::storage::signatory_image_path(id, "signature.png")),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn course_certificate(
        db: &DatabaseConnection,
        site_id: Uuid,
        course_id: &str,
        mode: CertificateMode,
        is_active: bool,
    ) -> course_certificates::Model {
        course_certificates::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(site_id),
            is_active: Set(is_active),
            template_id: Set(None),
            title: Set(None),
            course_id: Set(course_id.to_string()),
            certificate_type: Set(mode),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn program_certificate(
        db: &DatabaseConnection,
        site_id: Uuid,
        program_id: i64,
        is_active: bool,
    ) -> program_certificates::Model {
        program_certificates::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(site_id),
            is_active: Set(is_active),
            template_id: Set(None),
            title: Set(None),
            program_id: Set(program_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }
}

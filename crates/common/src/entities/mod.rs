pub mod certificate_template_assets;
pub mod certificate_templates;
pub mod course_certificate_signatories;
pub mod course_certificates;
pub mod program_certificate_signatories;
pub mod program_certificates;
pub mod sea_orm_active_enums;
pub mod signatories;
pub mod site_configurations;
pub mod sites;
pub mod student_modules;
pub mod user_credential_attributes;
pub mod user_credentials;

/// Stamps `created_at` on insert and `updated_at` on every write.
macro_rules! timestamped_behavior {
    () => {
        #[async_trait::async_trait]
        impl sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
                if insert {
                    self.created_at = sea_orm::ActiveValue::Set(now);
                }
                self.updated_at = sea_orm::ActiveValue::Set(now);
                Ok(self)
            }
        }
    };
}

pub(crate) use timestamped_behavior;

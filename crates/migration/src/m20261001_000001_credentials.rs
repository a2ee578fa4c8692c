use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sites::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sites::Domain).string_len(255).not_null())
                    .col(ColumnDef::new(Sites::Name).string_len(50).not_null())
                    .col(timestamp_col(Sites::CreatedAt))
                    .col(timestamp_col(Sites::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("sites_domain_key")
                    .table(Sites::Table)
                    .col(Sites::Domain)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SiteConfigurations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiteConfigurations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SiteConfigurations::SiteId).uuid().not_null())
                    .col(
                        ColumnDef::new(SiteConfigurations::LmsUrlRoot)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SiteConfigurations::ThemeScssPath)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(timestamp_col(SiteConfigurations::CreatedAt))
                    .col(timestamp_col(SiteConfigurations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("site_configurations_site_fk")
                            .from(SiteConfigurations::Table, SiteConfigurations::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("site_configurations_site_key")
                    .table(SiteConfigurations::Table)
                    .col(SiteConfigurations::SiteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Signatories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Signatories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Signatories::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Signatories::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Signatories::Image).string_len(255).not_null())
                    .col(timestamp_col(Signatories::CreatedAt))
                    .col(timestamp_col(Signatories::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CertificateTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateTemplates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateTemplates::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CertificateTemplates::Content).text().not_null())
                    .col(timestamp_col(CertificateTemplates::CreatedAt))
                    .col(timestamp_col(CertificateTemplates::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("certificate_templates_name_key")
                    .table(CertificateTemplates::Table)
                    .col(CertificateTemplates::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseCertificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseCertificates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseCertificates::SiteId).uuid().not_null())
                    .col(
                        ColumnDef::new(CourseCertificates::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(CourseCertificates::TemplateId).uuid().null())
                    .col(ColumnDef::new(CourseCertificates::Title).string_len(255).null())
                    .col(
                        ColumnDef::new(CourseCertificates::CourseId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseCertificates::CertificateType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(timestamp_col(CourseCertificates::CreatedAt))
                    .col(timestamp_col(CourseCertificates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("course_certificates_site_fk")
                            .from(CourseCertificates::Table, CourseCertificates::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("course_certificates_template_fk")
                            .from(CourseCertificates::Table, CourseCertificates::TemplateId)
                            .to(CertificateTemplates::Table, CertificateTemplates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("course_certificates_course_mode_site_key")
                    .table(CourseCertificates::Table)
                    .col(CourseCertificates::CourseId)
                    .col(CourseCertificates::CertificateType)
                    .col(CourseCertificates::SiteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProgramCertificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramCertificates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProgramCertificates::SiteId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProgramCertificates::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ProgramCertificates::TemplateId).uuid().null())
                    .col(ColumnDef::new(ProgramCertificates::Title).string_len(255).null())
                    .col(
                        ColumnDef::new(ProgramCertificates::ProgramId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(timestamp_col(ProgramCertificates::CreatedAt))
                    .col(timestamp_col(ProgramCertificates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("program_certificates_site_fk")
                            .from(ProgramCertificates::Table, ProgramCertificates::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("program_certificates_template_fk")
                            .from(ProgramCertificates::Table, ProgramCertificates::TemplateId)
                            .to(CertificateTemplates::Table, CertificateTemplates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("program_certificates_program_key")
                    .table(ProgramCertificates::Table)
                    .col(ProgramCertificates::ProgramId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseCertificateSignatories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseCertificateSignatories::CourseCertificateId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseCertificateSignatories::SignatoryId)
                            .uuid()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CourseCertificateSignatories::CourseCertificateId)
                            .col(CourseCertificateSignatories::SignatoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("course_certificate_signatories_certificate_fk")
                            .from(
                                CourseCertificateSignatories::Table,
                                CourseCertificateSignatories::CourseCertificateId,
                            )
                            .to(CourseCertificates::Table, CourseCertificates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("course_certificate_signatories_signatory_fk")
                            .from(
                                CourseCertificateSignatories::Table,
                                CourseCertificateSignatories::SignatoryId,
                            )
                            .to(Signatories::Table, Signatories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProgramCertificateSignatories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramCertificateSignatories::ProgramCertificateId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramCertificateSignatories::SignatoryId)
                            .uuid()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProgramCertificateSignatories::ProgramCertificateId)
                            .col(ProgramCertificateSignatories::SignatoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("program_certificate_signatories_certificate_fk")
                            .from(
                                ProgramCertificateSignatories::Table,
                                ProgramCertificateSignatories::ProgramCertificateId,
                            )
                            .to(ProgramCertificates::Table, ProgramCertificates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("program_certificate_signatories_signatory_fk")
                            .from(
                                ProgramCertificateSignatories::Table,
                                ProgramCertificateSignatories::SignatoryId,
                            )
                            .to(Signatories::Table, Signatories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserCredentials::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserCredentials::CredentialKind)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserCredentials::CredentialId).uuid().not_null())
                    .col(ColumnDef::new(UserCredentials::Username).string_len(255).not_null())
                    .col(
                        ColumnDef::new(UserCredentials::Status)
                            .string_len(32)
                            .not_null()
                            .default("awarded"),
                    )
                    .col(ColumnDef::new(UserCredentials::DownloadUrl).string_len(255).null())
                    .col(ColumnDef::new(UserCredentials::Uuid).uuid().not_null())
                    .col(timestamp_col(UserCredentials::CreatedAt))
                    .col(timestamp_col(UserCredentials::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("user_credentials_username_credential_key")
                    .table(UserCredentials::Table)
                    .col(UserCredentials::Username)
                    .col(UserCredentials::CredentialKind)
                    .col(UserCredentials::CredentialId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("user_credentials_uuid_key")
                    .table(UserCredentials::Table)
                    .col(UserCredentials::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("user_credentials_username_idx")
                    .table(UserCredentials::Table)
                    .col(UserCredentials::Username)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserCredentialAttributes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserCredentialAttributes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserCredentialAttributes::UserCredentialId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCredentialAttributes::Namespace)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCredentialAttributes::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCredentialAttributes::Value)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(timestamp_col(UserCredentialAttributes::CreatedAt))
                    .col(timestamp_col(UserCredentialAttributes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("user_credential_attributes_credential_fk")
                            .from(
                                UserCredentialAttributes::Table,
                                UserCredentialAttributes::UserCredentialId,
                            )
                            .to(UserCredentials::Table, UserCredentials::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CertificateTemplateAssets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateTemplateAssets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateTemplateAssets::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateTemplateAssets::AssetFile)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(timestamp_col(CertificateTemplateAssets::CreatedAt))
                    .col(timestamp_col(CertificateTemplateAssets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CertificateTemplateAssets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserCredentialAttributes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserCredentials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProgramCertificateSignatories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseCertificateSignatories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProgramCertificates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseCertificates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CertificateTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Signatories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SiteConfigurations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sites::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn timestamp_col<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

#[derive(Iden)]
enum Sites {
    Table,
    Id,
    Domain,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SiteConfigurations {
    Table,
    Id,
    SiteId,
    LmsUrlRoot,
    ThemeScssPath,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Signatories {
    Table,
    Id,
    Name,
    Title,
    Image,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CertificateTemplates {
    Table,
    Id,
    Name,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CourseCertificates {
    Table,
    Id,
    SiteId,
    IsActive,
    TemplateId,
    Title,
    CourseId,
    CertificateType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProgramCertificates {
    Table,
    Id,
    SiteId,
    IsActive,
    TemplateId,
    Title,
    ProgramId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CourseCertificateSignatories {
    Table,
    CourseCertificateId,
    SignatoryId,
}

#[derive(Iden)]
enum ProgramCertificateSignatories {
    Table,
    ProgramCertificateId,
    SignatoryId,
}

#[derive(Iden)]
enum UserCredentials {
    Table,
    Id,
    CredentialKind,
    CredentialId,
    Username,
    Status,
    DownloadUrl,
    Uuid,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserCredentialAttributes {
    Table,
    Id,
    UserCredentialId,
    Namespace,
    Name,
    Value,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CertificateTemplateAssets {
    Table,
    Id,
    Name,
    AssetFile,
    CreatedAt,
    UpdatedAt,
}

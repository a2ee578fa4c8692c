use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Certificate mode a course certificate is issued for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(255))")]
#[serde(rename_all = "lowercase")]
pub enum CertificateMode {
    #[sea_orm(string_value = "honor")]
    Honor,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "professional")]
    Professional,
}

impl CertificateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Honor => "honor",
            Self::Verified => "verified",
            Self::Professional => "professional",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "honor" => Some(Self::Honor),
            "verified" => Some(Self::Verified),
            "professional" => Some(Self::Professional),
            _ => None,
        }
    }
}

impl fmt::Display for CertificateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    #[sea_orm(string_value = "awarded")]
    Awarded,
    #[sea_orm(string_value = "revoked")]
    Revoked,
}

/// Discriminant of the certificate configuration a user credential points at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    #[sea_orm(string_value = "course_certificate")]
    CourseCertificate,
    #[sea_orm(string_value = "program_certificate")]
    ProgramCertificate,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CourseCertificate => "course_certificate",
            Self::ProgramCertificate => "program_certificate",
        }
    }
}

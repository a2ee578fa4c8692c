use crate::credentials::CredentialRef;
use crate::entities::sea_orm_active_enums::CredentialStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSite {
    pub domain: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSite {
    pub domain: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSiteConfiguration {
    pub site_id: Uuid,
    pub lms_url_root: String,
    pub theme_scss_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSiteConfiguration {
    pub lms_url_root: Option<String>,
    pub theme_scss_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCertificateTemplate {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCertificateTemplate {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseCertificate {
    pub site_id: Uuid,
    pub course_id: String,
    pub certificate_type: String,
    pub is_active: Option<bool>,
    pub template_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default)]
    pub signatory_ids: Vec<Uuid>,
}

/// `template_id` / `title` use `Some(None)` to clear the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCertificate {
    pub is_active: Option<bool>,
    #[serde(default, with = "double_option")]
    pub template_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub title: Option<Option<String>>,
    pub signatory_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProgramCertificate {
    pub site_id: Uuid,
    pub program_id: i64,
    pub is_active: Option<bool>,
    pub template_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default)]
    pub signatory_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeInput {
    pub namespace: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardCredentialRequest {
    pub username: String,
    pub credential: CredentialRef,
    pub download_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialListQuery {
    pub username: Option<String>,
    pub status: Option<CredentialStatus>,
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_certificate_distinguishes_null_from_missing() {
        let update: UpdateCertificate = serde_json::from_value(json!({"title": null})).unwrap();
        assert_eq!(update.title, Some(None));
        assert_eq!(update.template_id, None);

        let update: UpdateCertificate =
            serde_json::from_value(json!({"title": "Honor Code"})).unwrap();
        assert_eq!(update.title, Some(Some("Honor Code".to_string())));
    }

    #[test]
    fn test_award_request_shape() {
        let id = Uuid::new_v4();
        let req: AwardCredentialRequest = serde_json::from_value(json!({
            "username": "learner",
            "credential": {"kind": "program_certificate", "id": id},
        }))
        .unwrap();
        assert_eq!(req.credential, CredentialRef::ProgramCertificate(id));
        assert!(req.attributes.is_empty());
        assert!(req.download_url.is_none());
    }
}

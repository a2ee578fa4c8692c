//! 字段验证模块
//!
//! 保存前的同步校验：图片大小、course key、字符字段长度、URL 等。
//! 所有错误最终转换为 `CredentialsError::Validation`。

use crate::course_key::CourseKey;
use crate::entities::sea_orm_active_enums::CertificateMode;
use crate::error::CredentialsError;
use regex::Regex;
use std::sync::OnceLock;

/// 签名图片大小上限（250KB）
pub const MAX_IMAGE_BYTES: usize = 250 * 1024;

/// 字符字段默认最大长度
pub const MAX_CHAR_LENGTH: usize = 255;

/// 验证错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 图片超过大小上限
    ImageTooLarge { size: usize },

    /// course key 无法解析
    InvalidCourseKey { value: String },

    /// 未知的证书模式
    InvalidCertificateMode { value: String },

    /// 必填字段为空
    Blank { field: &'static str },

    /// 字段超长
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// URL 格式错误
    InvalidUrl { field: &'static str, value: String },

    /// 负数的 program id
    NegativeProgramId { value: i64 },

    /// 上传文件名无效
    InvalidFilename { value: String },
}

impl ValidationError {
    /// 获取错误的详细描述
    pub fn description(&self) -> String {
        match self {
            Self::ImageTooLarge { .. } => {
                "The image file size must be less than 250KB.".to_string()
            }
            Self::InvalidCourseKey { .. } => "Invalid course key.".to_string(),
            Self::InvalidCertificateMode { value } => {
                format!("certificate_type {} is not one of honor, verified, professional", value)
            }
            Self::Blank { field } => format!("{} must not be blank", field),
            Self::TooLong { field, max, actual } => {
                format!("{} has {} characters (max {})", field, actual, max)
            }
            Self::InvalidUrl { field, value } => {
                format!("{} {} is not a valid http(s) URL", field, value)
            }
            Self::NegativeProgramId { value } => {
                format!("program_id {} must be zero or positive", value)
            }
            Self::InvalidFilename { value } => format!("invalid file name {:?}", value),
        }
    }
}

impl From<ValidationError> for CredentialsError {
    fn from(err: ValidationError) -> Self {
        CredentialsError::Validation(err.description())
    }
}

pub fn validate_image(size: usize) -> Result<(), ValidationError> {
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge { size });
    }
    Ok(())
}

pub fn validate_course_key(course_key: &str) -> Result<CourseKey, ValidationError> {
    course_key
        .parse::<CourseKey>()
        .map_err(|_| ValidationError::InvalidCourseKey {
            value: course_key.to_string(),
        })
}

pub fn validate_certificate_mode(value: &str) -> Result<CertificateMode, ValidationError> {
    CertificateMode::parse(value).ok_or_else(|| ValidationError::InvalidCertificateMode {
        value: value.to_string(),
    })
}

/// 必填字符字段：非空且不超过 `max` 个字符
pub fn validate_required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    validate_max_length(field, value, max)
}

pub fn validate_max_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

fn http_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://[A-Za-z0-9](?:[A-Za-z0-9\-.]*[A-Za-z0-9])?(?::\d{1,5})?(?:/\S*)?$")
            .expect("url pattern is valid")
    })
}

pub fn validate_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    validate_required(field, value, 200)?;
    if !http_url_re().is_match(value) {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub fn validate_program_id(value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeProgramId { value });
    }
    Ok(())
}

/// 只保留文件名最后一段，拒绝空名和 `.`/`..`
pub fn clean_filename(raw: &str) -> Result<String, ValidationError> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(ValidationError::InvalidFilename {
            value: raw.to_string(),
        });
    }
    validate_max_length("filename", name, 100).map_err(|_| ValidationError::InvalidFilename {
        value: raw.to_string(),
    })?;
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size_boundary() {
        assert!(validate_image(0).is_ok());
        assert!(validate_image(MAX_IMAGE_BYTES).is_ok());
        assert_eq!(
            validate_image(MAX_IMAGE_BYTES + 1),
            Err(ValidationError::ImageTooLarge {
                size: MAX_IMAGE_BYTES + 1
            })
        );
    }

    #[test]
    fn test_image_error_message() {
        let err: CredentialsError = validate_image(300 * 1024).unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "validation failed: The image file size must be less than 250KB."
        );
    }

    #[test]
    fn test_course_key_validation() {
        assert!(validate_course_key("course-v1:edX+DemoX+Demo_2015").is_ok());
        assert!(validate_course_key("edX/DemoX/Demo_2015").is_ok());

        let err = validate_course_key("invalid").unwrap_err();
        assert_eq!(err.description(), "Invalid course key.");
    }

    #[test]
    fn test_certificate_mode_validation() {
        assert_eq!(
            validate_certificate_mode("verified"),
            Ok(CertificateMode::Verified)
        );
        assert!(validate_certificate_mode("audit").is_err());
        assert!(validate_certificate_mode("Honor").is_err());
    }

    #[test]
    fn test_char_fields() {
        assert!(validate_required("name", "Dr. Ada", MAX_CHAR_LENGTH).is_ok());
        assert_eq!(
            validate_required("name", "   ", MAX_CHAR_LENGTH),
            Err(ValidationError::Blank { field: "name" })
        );
        let long = "x".repeat(256);
        assert!(matches!(
            validate_required("title", &long, MAX_CHAR_LENGTH),
            Err(ValidationError::TooLong { actual: 256, .. })
        ));
        // 按字符而非字节计数
        assert!(validate_max_length("title", &"é".repeat(255), MAX_CHAR_LENGTH).is_ok());
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url("lms_url_root", "https://courses.stage.edx.org").is_ok());
        assert!(validate_url("lms_url_root", "http://localhost:8000/").is_ok());
        assert!(validate_url("lms_url_root", "ftp://example.com").is_err());
        assert!(validate_url("lms_url_root", "courses.edx.org").is_err());
        assert!(validate_url("lms_url_root", "").is_err());
    }

    #[test]
    fn test_program_id() {
        assert!(validate_program_id(0).is_ok());
        assert!(validate_program_id(42).is_ok());
        assert!(validate_program_id(-1).is_err());
    }

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("logo.png").unwrap(), "logo.png");
        assert_eq!(clean_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(clean_filename("C:\\images\\sig.png").unwrap(), "sig.png");
        assert!(clean_filename("").is_err());
        assert!(clean_filename("dir/").is_err());
        assert!(clean_filename("..").is_err());
    }
}

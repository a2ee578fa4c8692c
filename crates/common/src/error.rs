//! Credentials 统一错误类型定义
//!
//! 全项目共享一个错误类型，简化错误传播和处理。

use thiserror::Error;

/// Credentials 统一错误类型
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// 资源未找到 (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// 请求参数错误 (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 字段验证错误 (400)
    #[error("validation failed: {0}")]
    Validation(String),

    /// 唯一约束冲突 (409)
    #[error("conflict: {0}")]
    Conflict(String),

    /// 数据库错误 (500)
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// 文件存储错误 (500)
    #[error("storage error: {0}")]
    Storage(String),

    /// IO 错误 (500)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误 (500)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 其他内部错误 (500)
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CredentialsError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// 将唯一约束冲突的数据库错误转换为 Conflict，其余保持 Database
    pub fn from_db_unique(err: sea_orm::DbErr, what: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                Self::Conflict(format!("{} already exists", what))
            }
            _ => Self::Database(err),
        }
    }

    /// 判断是否为客户端错误（4xx）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::BadRequest(_) | Self::Validation(_) | Self::Conflict(_)
        )
    }

    /// 判断是否为服务端错误（5xx）
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// 获取 HTTP 状态码
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            _ => 500,
        }
    }

    #[cfg(feature = "service")]
    pub fn axum_status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::from_u16(self.http_status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub type Result<T> = std::result::Result<T, CredentialsError>;

// ============ Axum HTTP 响应支持 ============

#[cfg(feature = "service")]
mod axum_impl {
    use super::*;
    use axum::{
        Json,
        response::{IntoResponse, Response},
    };
    use serde_json::json;

    impl IntoResponse for CredentialsError {
        fn into_response(self) -> Response {
            let status = self.axum_status_code();

            // 客户端错误记 info，存储类错误记 warn，其余记 error
            match &self {
                CredentialsError::NotFound(resource) => {
                    tracing::info!(
                        status = status.as_u16(),
                        resource = %resource,
                        "Resource not found"
                    );
                }
                CredentialsError::BadRequest(msg) => {
                    tracing::info!(
                        status = status.as_u16(),
                        reason = %msg,
                        "Bad request"
                    );
                }
                CredentialsError::Validation(msg) => {
                    tracing::info!(
                        status = status.as_u16(),
                        validation_error = %msg,
                        "Request validation failed"
                    );
                }
                CredentialsError::Conflict(msg) => {
                    tracing::info!(
                        status = status.as_u16(),
                        conflict = %msg,
                        "Unique constraint conflict"
                    );
                }
                CredentialsError::Database(db_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        error = %db_err,
                        "Database operation failed"
                    );
                }
                CredentialsError::Storage(msg) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        storage_error = %msg,
                        "File storage operation failed"
                    );
                }
                CredentialsError::Io(io_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        io_error = %io_err,
                        "IO operation failed"
                    );
                }
                CredentialsError::Serialization(json_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        serialization_error = %json_err,
                        "JSON serialization failed"
                    );
                }
                CredentialsError::Internal(internal_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        internal_error = ?internal_err,
                        "Internal server error"
                    );
                }
            }

            let body = Json(json!({"error": self.to_string()}));
            (status, body).into_response()
        }
    }
}

// ============ 事务错误支持 ============

impl<T> From<sea_orm::TransactionError<T>> for CredentialsError
where
    T: Into<CredentialsError>,
{
    fn from(err: sea_orm::TransactionError<T>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db) => Self::Database(db),
            sea_orm::TransactionError::Transaction(app) => app.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_err() -> CredentialsError {
        CredentialsError::Database(sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "test".to_string(),
        )))
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(CredentialsError::not_found("x").http_status_code(), 404);
        assert_eq!(CredentialsError::bad_request("x").http_status_code(), 400);
        assert_eq!(CredentialsError::validation("x").http_status_code(), 400);
        assert_eq!(CredentialsError::conflict("x").http_status_code(), 409);
        assert_eq!(CredentialsError::storage("x").http_status_code(), 500);
        assert_eq!(db_err().http_status_code(), 500);
    }

    #[test]
    fn test_constructors_and_messages() {
        let err = CredentialsError::validation("Invalid course key.");
        assert!(matches!(err, CredentialsError::Validation(_)));
        assert_eq!(err.to_string(), "validation failed: Invalid course key.");

        let err = CredentialsError::not_found("signatory");
        assert_eq!(err.to_string(), "not found: signatory");

        let err = CredentialsError::conflict("user credential already exists");
        assert_eq!(err.to_string(), "conflict: user credential already exists");
    }

    #[test]
    fn test_classification() {
        assert!(CredentialsError::conflict("x").is_client_error());
        assert!(CredentialsError::validation("x").is_client_error());
        assert!(!db_err().is_client_error());
        assert!(db_err().is_server_error());
        assert!(CredentialsError::storage("disk full").is_server_error());
    }

    #[test]
    fn test_non_unique_db_error_stays_database() {
        let err = sea_orm::DbErr::Custom("boom".to_string());
        let converted = CredentialsError::from_db_unique(err, "site");
        assert!(matches!(converted, CredentialsError::Database(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CredentialsError = io_err.into();
        assert!(matches!(err, CredentialsError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_transaction_error_conversion() {
        let tx_err: sea_orm::TransactionError<CredentialsError> =
            sea_orm::TransactionError::Connection(sea_orm::DbErr::Conn(
                sea_orm::RuntimeErr::Internal("connection failed".to_string()),
            ));
        let converted: CredentialsError = tx_err.into();
        assert!(matches!(converted, CredentialsError::Database(_)));

        let tx_err: sea_orm::TransactionError<CredentialsError> =
            sea_orm::TransactionError::Transaction(CredentialsError::validation("bad"));
        let converted: CredentialsError = tx_err.into();
        assert!(matches!(converted, CredentialsError::Validation(_)));
    }

    #[cfg(feature = "service")]
    #[test]
    fn test_axum_status_code() {
        use axum::http::StatusCode;

        assert_eq!(
            CredentialsError::conflict("x").axum_status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CredentialsError::validation("x").axum_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(db_err().axum_status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

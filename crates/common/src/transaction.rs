//! 事务处理辅助宏
//!
//! 提供简化的数据库事务处理接口，减少重复的样板代码。

/// 简化数据库事务处理的宏。
///
/// # 参数
///
/// * `$db` - 数据库连接引用
/// * `$txn` - 事务参数名称
/// * `$body` - 事务体，返回 `Result<T, CredentialsError>`
///
/// # 示例
///
/// ```ignore
/// use credentials_common::CredentialsError;
///
/// let credential = txn!(db, |txn| {
///     let active = user_credentials::ActiveModel {
///         id: Set(Uuid::new_v4()),
///         username: Set(username),
///         ..Default::default()
///     };
///     Ok::<_, CredentialsError>(active.insert(txn).await?)
/// })?;
/// ```
#[macro_export]
macro_rules! txn {
    ($db:expr, |$txn:ident| $body:expr) => {{
        use sea_orm::TransactionTrait;
        $db.transaction(|$txn| Box::pin(async move { $body })).await
    }};
}

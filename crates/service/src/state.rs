use crate::notes::NotesStore;
use credentials_common::FileStore;
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub files: Arc<dyn FileStore>,
    /// 本地媒体目录，由 `/media/` 直接提供
    pub media_root: PathBuf,
    pub media_url: String,
    pub notes: NotesStore,
    pub notes_enabled: bool,
}

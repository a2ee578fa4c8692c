//! `/edxnotes/` 路由表与进程内笔记存储
//!
//! 路由由静态表 [`NOTES_ROUTES`] 声明，`router()` 按表挂载。
//! 每个请求通过 `?user=` 指定用户。

use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::routing::{MethodRouter, get};
use chrono::{DateTime, Utc};
use credentials_common::{CredentialsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesView {
    Notes,
    List,
    Search,
    Token,
    Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotesRoute {
    pub path: &'static str,
    pub name: &'static str,
    pub view: NotesView,
}

pub static NOTES_ROUTES: [NotesRoute; 5] = [
    NotesRoute {
        path: "/edxnotes/",
        name: "edxnotes",
        view: NotesView::Notes,
    },
    NotesRoute {
        path: "/edxnotes/list/",
        name: "list_notes",
        view: NotesView::List,
    },
    NotesRoute {
        path: "/edxnotes/search/",
        name: "search_notes",
        view: NotesView::Search,
    },
    NotesRoute {
        path: "/edxnotes/token/",
        name: "get_token",
        view: NotesView::Token,
    },
    NotesRoute {
        path: "/edxnotes/visibility/",
        name: "edxnotes_visibility",
        view: NotesView::Visibility,
    },
];

/// Path of the route registered under `name`.
pub fn reverse(name: &str) -> Option<&'static str> {
    NOTES_ROUTES
        .iter()
        .find(|route| route.name == name)
        .map(|route| route.path)
}

impl NotesView {
    fn method_router(self) -> MethodRouter<AppState> {
        match self {
            Self::Notes => get(notes_view),
            Self::List => get(list_notes).post(create_note),
            Self::Search => get(search_notes),
            Self::Token => get(get_token),
            Self::Visibility => get(set_visibility).post(set_visibility),
        }
    }
}

pub fn router() -> axum::Router<AppState> {
    NOTES_ROUTES
        .iter()
        .fold(axum::Router::new(), |router, route| {
            router.route(route.path, route.view.method_router())
        })
}

// ============ 存储 ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct UserNotes {
    notes: Vec<Note>,
    visible: bool,
}

impl Default for UserNotes {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            visible: true,
        }
    }
}

#[derive(Clone, Default)]
pub struct NotesStore {
    inner: Arc<RwLock<HashMap<String, UserNotes>>>,
}

impl NotesStore {
    pub async fn add(&self, user: &str, text: String) -> Note {
        let note = Note {
            id: Uuid::new_v4(),
            user: user.to_string(),
            text,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .entry(user.to_string())
            .or_default()
            .notes
            .push(note.clone());
        note
    }

    pub async fn list(&self, user: &str) -> Vec<Note> {
        self.inner
            .read()
            .await
            .get(user)
            .map(|entry| entry.notes.clone())
            .unwrap_or_default()
    }

    /// Case-insensitive substring match on the note text.
    pub async fn search(&self, user: &str, text: &str) -> Vec<Note> {
        let needle = text.to_lowercase();
        self.list(user)
            .await
            .into_iter()
            .filter(|note| note.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub async fn is_visible(&self, user: &str) -> bool {
        self.inner
            .read()
            .await
            .get(user)
            .map(|entry| entry.visible)
            .unwrap_or(true)
    }

    pub async fn set_visible(&self, user: &str, visible: bool) {
        self.inner
            .write()
            .await
            .entry(user.to_string())
            .or_default()
            .visible = visible;
    }
}

// ============ 处理函数 ============

#[derive(Debug, Deserialize)]
pub struct NotesQuery {
    pub user: String,
    pub text: Option<String>,
    pub visibility: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNote {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct NotesPage {
    pub total: usize,
    pub rows: Vec<Note>,
}

impl From<Vec<Note>> for NotesPage {
    fn from(rows: Vec<Note>) -> Self {
        Self {
            total: rows.len(),
            rows,
        }
    }
}

fn check_enabled(state: &AppState, query: &NotesQuery) -> Result<()> {
    if !state.notes_enabled {
        return Err(CredentialsError::not_found("notes"));
    }
    if query.user.trim().is_empty() {
        return Err(CredentialsError::bad_request("user is required"));
    }
    Ok(())
}

async fn notes_view(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<serde_json::Value>> {
    check_enabled(&state, &query)?;
    let notes = state.notes.list(&query.user).await;
    let visible = state.notes.is_visible(&query.user).await;
    Ok(Json(serde_json::json!({
        "user": query.user,
        "visibility": visible,
        "total": notes.len(),
        "endpoints": {
            "list": reverse("list_notes"),
            "search": reverse("search_notes"),
            "token": reverse("get_token"),
            "visibility": reverse("edxnotes_visibility"),
        },
    })))
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<NotesPage>> {
    check_enabled(&state, &query)?;
    Ok(Json(state.notes.list(&query.user).await.into()))
}

async fn create_note(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
    Json(payload): Json<CreateNote>,
) -> Result<Json<Note>> {
    check_enabled(&state, &query)?;
    if payload.text.trim().is_empty() {
        return Err(CredentialsError::validation("text must not be blank"));
    }
    let note = state.notes.add(&query.user, payload.text).await;
    tracing::debug!(user = %note.user, note_id = %note.id, "note added");
    Ok(Json(note))
}

async fn search_notes(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<NotesPage>> {
    check_enabled(&state, &query)?;
    let text = query
        .text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| CredentialsError::bad_request("text is required"))?;
    Ok(Json(state.notes.search(&query.user, text).await.into()))
}

async fn get_token(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<serde_json::Value>> {
    check_enabled(&state, &query)?;
    Ok(Json(serde_json::json!({
        "user": query.user,
        "token": Uuid::new_v4().simple().to_string(),
    })))
}

async fn set_visibility(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<serde_json::Value>> {
    check_enabled(&state, &query)?;
    let visibility = query
        .visibility
        .ok_or_else(|| CredentialsError::bad_request("visibility is required"))?;
    state.notes.set_visible(&query.user, visibility).await;
    Ok(Json(serde_json::json!({ "visibility": visibility })))
}

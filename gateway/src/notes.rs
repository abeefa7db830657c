//! 示例资源：内存中的笔记
//!
//! 单条路由 `/api/notes/{id}`，批量路由 `/api/notes`。
//! 只作演示用，不做持久化。

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    Json, RequestExt,
    extract::{FromRequest, Path, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;
use webcrud::{AppError, AppResult, CrudInterface, Role, UserUuid};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub owner: UserUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewNote {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteChanges {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteFilter {
    pub owner: Option<String>,
    /// 标题包含（不区分大小写）
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMany {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct Affected {
    pub affected: usize,
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    Ok(())
}

async fn path_id(req: &mut Request) -> AppResult<Uuid> {
    req.extract_parts::<Path<Uuid>>()
        .await
        .map(|Path(id)| id)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

async fn json_body<T: DeserializeOwned>(req: Request) -> AppResult<T> {
    Json::<T>::from_request(req, &())
        .await
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

#[derive(Default)]
pub struct NoteStore {
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(id: Uuid, new: NewNote, owner: &UserUuid) -> Note {
        let now = Utc::now();
        Note {
            id,
            title: new.title,
            body: new.body,
            owner: owner.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(note: &mut Note, changes: NoteChanges) {
        if let Some(title) = changes.title {
            note.title = title;
        }
        if let Some(body) = changes.body {
            note.body = body;
        }
        note.updated_at = Utc::now();
    }
}

#[async_trait]
impl CrudInterface for NoteStore {
    async fn create_one(&self, mut req: Request, _role: &Role, user: &UserUuid) -> AppResult<Response> {
        let id = path_id(&mut req).await?;
        let new: NewNote = json_body(req).await?;
        validate_title(&new.title)?;

        let mut notes = self.notes.write().await;
        if notes.contains_key(&id) {
            return Err(AppError::conflict(format!("note {} already exists", id)));
        }
        let note = Self::build(id, new, user);
        notes.insert(id, note.clone());
        info!(note_id = %id, owner = %user, "Note created");

        Ok((StatusCode::CREATED, Json(note)).into_response())
    }

    async fn create_all(&self, req: Request, _role: &Role, user: &UserUuid) -> AppResult<Response> {
        let batch: Vec<NewNote> = json_body(req).await?;
        for new in &batch {
            validate_title(&new.title)?;
        }

        let mut notes = self.notes.write().await;
        if let Some(id) = batch.iter().filter_map(|n| n.id).find(|id| notes.contains_key(id)) {
            return Err(AppError::conflict(format!("note {} already exists", id)));
        }

        let created: Vec<Note> = batch
            .into_iter()
            .map(|new| {
                let id = new.id.unwrap_or_else(Uuid::now_v7);
                Self::build(id, new, user)
            })
            .collect();
        for note in &created {
            notes.insert(note.id, note.clone());
        }
        info!(count = created.len(), owner = %user, "Notes created");

        Ok((StatusCode::CREATED, Json(created)).into_response())
    }

    async fn read_one(&self, mut req: Request, _role: &Role, _user: &UserUuid) -> AppResult<Response> {
        let id = path_id(&mut req).await?;
        let notes = self.notes.read().await;
        let note = notes
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("note {}", id)))?;

        Ok(Json(note.clone()).into_response())
    }

    async fn read_all(&self, mut req: Request, _role: &Role, _user: &UserUuid) -> AppResult<Response> {
        let Query(filter) = req
            .extract_parts::<Query<NoteFilter>>()
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        let needle = filter.q.map(|q| q.to_lowercase());

        let notes = self.notes.read().await;
        let mut matched: Vec<Note> = notes
            .values()
            .filter(|n| filter.owner.as_deref().is_none_or(|o| n.owner.as_str() == o))
            .filter(|n| {
                needle
                    .as_deref()
                    .is_none_or(|q| n.title.to_lowercase().contains(q))
            })
            .cloned()
            .collect();
        matched.sort_by_key(|n| n.created_at);

        Ok(Json(matched).into_response())
    }

    async fn update_one(&self, mut req: Request, _role: &Role, _user: &UserUuid) -> AppResult<Response> {
        let id = path_id(&mut req).await?;
        let changes: NoteChanges = json_body(req).await?;
        if let Some(title) = &changes.title {
            validate_title(title)?;
        }

        let mut notes = self.notes.write().await;
        let note = notes
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("note {}", id)))?;
        Self::apply(note, changes);

        Ok(Json(note.clone()).into_response())
    }

    async fn update_all(&self, req: Request, _role: &Role, _user: &UserUuid) -> AppResult<Response> {
        let batch: Vec<NoteChanges> = json_body(req).await?;

        let mut notes = self.notes.write().await;
        // 先整体校验，任何一条不合法都不做修改
        let mut ids = Vec::with_capacity(batch.len());
        for changes in &batch {
            let id = changes
                .id
                .ok_or_else(|| AppError::validation("every update needs an id"))?;
            if !notes.contains_key(&id) {
                return Err(AppError::not_found(format!("note {}", id)));
            }
            if let Some(title) = &changes.title {
                validate_title(title)?;
            }
            ids.push(id);
        }

        let mut updated = Vec::with_capacity(batch.len());
        for (id, changes) in ids.into_iter().zip(batch) {
            if let Some(note) = notes.get_mut(&id) {
                Self::apply(note, changes);
                updated.push(note.clone());
            }
        }

        Ok(Json(updated).into_response())
    }

    async fn delete_one(&self, mut req: Request, _role: &Role, user: &UserUuid) -> AppResult<Response> {
        let id = path_id(&mut req).await?;
        self.notes
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("note {}", id)))?;
        info!(note_id = %id, by = %user, "Note deleted");

        Ok(StatusCode::NO_CONTENT.into_response())
    }

    async fn delete_all(&self, req: Request, _role: &Role, user: &UserUuid) -> AppResult<Response> {
        let DeleteMany { ids } = json_body(req).await?;

        let mut notes = self.notes.write().await;
        let affected = ids.iter().filter(|id| notes.remove(*id).is_some()).count();
        info!(affected, by = %user, "Notes deleted");

        Ok(Json(Affected { affected }).into_response())
    }
}

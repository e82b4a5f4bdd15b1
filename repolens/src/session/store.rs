//! In-memory session registry for the web server.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::Session;
use crate::error::{AppError, Result};

/// Generate a UUIDv7 (time-ordered, globally unique).
fn generate_session_id() -> String {
    Uuid::now_v7().to_string()
}

/// Sessions keyed by id.
///
/// Each session sits behind its own mutex so a session handles one request
/// at a time while other sessions proceed independently.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Register `session` under a fresh id and return the id.
    pub async fn insert(&self, mut session: Session) -> String {
        let id = generate_session_id();
        session.id.clone_from(&id);
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(AppError::UnknownSession)
    }
}

//! Live session registry.
//!
//! The registry lock is only held to look up, insert or remove; each session
//! has its own mutex, held for a whole upload or query turn.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use docquery_agent::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new empty session and return its id.
    pub async fn create(&self) -> String {
        let session = Session::new();
        let id = session.id.clone();
        let mut w = self.sessions.write().await;
        w.insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let r = self.sessions.read().await;
        r.get(session_id).cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        let mut w = self.sessions.write().await;
        w.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

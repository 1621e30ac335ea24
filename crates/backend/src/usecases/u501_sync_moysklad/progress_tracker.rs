use contracts::usecases::u501_sync_moysklad::progress::{SyncProgress, SyncStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Трекер прогресса синхронизации (in-memory)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, SyncProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SyncProgress>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SyncProgress>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    fn update<F: FnOnce(&mut SyncProgress)>(&self, session_id: &str, f: F) {
        if let Some(p) = self.write().get_mut(session_id) {
            f(p);
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn create_session(&self, session_id: String) {
        self.write()
            .insert(session_id.clone(), SyncProgress::new(session_id));
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.read().get(session_id).cloned()
    }

    pub fn set_total(&self, session_id: &str, total: i32) {
        self.update(session_id, |p| p.cabinets_total = Some(total));
    }

    pub fn set_current_item(&self, session_id: &str, item: Option<String>) {
        self.update(session_id, |p| p.current_item = item);
    }

    /// Кабинет обработан (успешно или нет), `rows` строк попало в буферы
    pub fn cabinet_processed(&self, session_id: &str, rows: usize) {
        self.update(session_id, |p| {
            p.cabinets_processed += 1;
            p.rows_buffered += rows as i32;
        });
    }

    pub fn set_rows_written(&self, session_id: &str, rows: usize) {
        self.update(session_id, |p| p.rows_written = rows as i32);
    }

    pub fn add_error(&self, session_id: &str, message: String) {
        self.update(session_id, |p| {
            p.error_messages.push(message);
            p.errors += 1;
        });
    }

    pub fn complete_session(&self, session_id: &str, status: SyncStatus) {
        self.update(session_id, |p| {
            p.status = status;
            p.current_item = None;
            p.completed_at = Some(chrono::Utc::now());
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Текущий прогресс синхронизации МойСклад -> Google Sheets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub session_id: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    /// Прогресс по кабинетам
    pub cabinets_total: Option<i32>,
    pub cabinets_processed: i32,
    pub rows_buffered: i32,
    pub rows_written: i32,
    pub errors: i32,

    /// Текущий обрабатываемый кабинет / вид данных
    pub current_item: Option<String>,

    /// Список ошибок
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Синхронизация запущена
    Running,
    /// Завершена успешно
    Completed,
    /// Завершена, но часть кабинетов упала
    CompletedWithErrors,
    /// Провалена
    Failed,
}

impl SyncProgress {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            status: SyncStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            updated_at: Utc::now(),
            cabinets_total: None,
            cabinets_processed: 0,
            rows_buffered: 0,
            rows_written: 0,
            errors: 0,
            current_item: None,
            error_messages: Vec::new(),
        }
    }
}

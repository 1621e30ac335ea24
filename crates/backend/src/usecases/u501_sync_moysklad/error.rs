use contracts::enums::SheetCategory;

/// Ошибка синхронизации одного кабинета
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Запрос к МойСклад или разбор ответа не удался
    #[error("кабинет '{cabinet}', {kind}: {cause:#}")]
    Cabinet {
        cabinet: String,
        kind: SheetCategory,
        cause: anyhow::Error,
    },

    /// Задача кабинета завершилась аварийно (panic / отмена)
    #[error("кабинет '{cabinet}': задача прервана: {message}")]
    TaskAborted { cabinet: String, message: String },
}

impl SyncError {
    pub fn cabinet(cabinet: &str, kind: SheetCategory, cause: anyhow::Error) -> Self {
        SyncError::Cabinet {
            cabinet: cabinet.to_string(),
            kind,
            cause,
        }
    }

    /// Вид данных, на котором упал кабинет
    pub fn kind(&self) -> Option<SheetCategory> {
        match self {
            SyncError::Cabinet { kind, .. } => Some(*kind),
            SyncError::TaskAborted { .. } => None,
        }
    }
}

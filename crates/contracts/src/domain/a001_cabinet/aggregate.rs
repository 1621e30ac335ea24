use serde::{Deserialize, Serialize};

/// Кабинет МойСклад: набор учётных данных одного арендатора
///
/// Читается один раз в начале синхронизации из листа "основа"
/// и не меняется до конца прогона.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cabinet {
    /// Название кабинета (используется в именах листов)
    pub name: String,
    pub login: String,
    pub password: String,
}

impl Cabinet {
    pub fn new(name: impl Into<String>, login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            login: login.into(),
            password: password.into(),
        }
    }
}

/// Строка листа учётных данных, которая не стала кабинетом
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCabinetRow {
    /// Номер строки в таблице (1-based, как видит пользователь)
    pub row_number: usize,
    /// Название кабинета, если оно заполнено
    pub name: Option<String>,
    pub reason: String,
}

use serde::{Deserialize, Serialize};

/// Заглушка для отсутствующих текстовых значений
pub const PLACEHOLDER: &str = "—";

/// Значение ячейки таблицы
///
/// Сериализуется без тега: текст уходит строкой JSON, число - числом,
/// как того ожидает `valueInputOption=RAW`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn placeholder() -> Self {
        CellValue::Text(PLACEHOLDER.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Строка листа
pub type SheetRow = Vec<CellValue>;

/// Преобразовать список заголовков в строку листа
pub fn header_row(headers: &[String]) -> SheetRow {
    headers.iter().map(|h| CellValue::Text(h.clone())).collect()
}

/// Строка с префиксом кабинета для сводного листа
pub fn with_cabinet(cabinet: &str, row: &[CellValue]) -> SheetRow {
    let mut prefixed = Vec::with_capacity(row.len() + 1);
    prefixed.push(CellValue::text(cabinet));
    prefixed.extend_from_slice(row);
    prefixed
}

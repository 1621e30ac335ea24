pub mod auth;
pub mod client;
#[cfg(test)]
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use contracts::shared::sheet_row::SheetRow;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, TokenProvider};
pub use client::GoogleSheetsClient;

/// Операции с таблицей, которые нужны синхронизации
///
/// Диапазоны передаются в нотации A1 (`'Лист'!A1:Z10000`).
#[async_trait]
pub trait SpreadsheetApi: Send + Sync {
    /// Прочитать значения диапазона. Пустые хвосты строк таблица не возвращает.
    async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Названия всех листов таблицы
    async fn sheet_titles(&self) -> Result<Vec<String>>;

    /// Создать пустой лист
    async fn add_sheet(&self, title: &str) -> Result<()>;

    async fn clear_values(&self, range: &str) -> Result<()>;

    /// Записать строки, начиная с левой верхней ячейки диапазона
    async fn update_values(&self, range: &str, rows: &[SheetRow]) -> Result<()>;

    /// Дописать строки после последней заполненной строки листа
    async fn append_values(&self, range: &str, rows: &[SheetRow]) -> Result<()>;
}

/// Название листа в кавычках для нотации A1 (`'` экранируется удвоением)
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Диапазон `'Лист'!cells`
pub fn a1_range(sheet: &str, cells: &str) -> String {
    format!("{}!{}", quote_sheet_title(sheet), cells)
}

use contracts::shared::sheet_row::{CellValue, SheetRow};
use serde_json::Value;

use super::normalize;

/// Строка отчёта об остатках -> [Наименование, Артикул, Код, Остаток]
pub fn process_stock_row(row: &Value, trim: bool) -> SheetRow {
    vec![
        CellValue::Text(normalize::text(row.get("name"), trim)),
        CellValue::Text(normalize::text(row.get("article"), trim)),
        CellValue::Text(normalize::text(row.get("code"), trim)),
        CellValue::Number(normalize::number(row.get("stock"))),
    ]
}

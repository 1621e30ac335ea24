//! Таблица в памяти для тестов: повторяет поведение Sheets API,
//! которое важно синхронизации (A1-диапазоны, clear, update, append).

use anyhow::Result;
use async_trait::async_trait;
use contracts::shared::sheet_row::{CellValue, SheetRow};
use std::sync::Mutex;

use super::SpreadsheetApi;

#[derive(Default)]
pub struct MemorySpreadsheet {
    sheets: Mutex<Vec<(String, Vec<SheetRow>)>>,
    calls: Mutex<Vec<String>>,
}

/// Разобранный A1-диапазон: лист + прямоугольник (индексы с нуля, правая граница включительно)
struct A1Range {
    sheet: String,
    first_row: usize,
    first_col: usize,
    last_row: Option<usize>,
    last_col: Option<usize>,
}

impl MemorySpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Таблица с уже существующим листом
    pub fn with_sheet(self, title: &str, rows: Vec<Vec<&str>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(CellValue::from).collect())
            .collect();
        self.sheets.lock().unwrap().push((title.to_string(), rows));
        self
    }

    pub fn rows(&self, title: &str) -> Option<Vec<SheetRow>> {
        self.sheets
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, rows)| rows.clone())
    }

    pub fn titles(&self) -> Vec<String> {
        self.sheets.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Число вызовов API, запись которых начинается с `prefix` (вида "append 'Лист'!A1")
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn with_rows<T>(&self, sheet: &str, f: impl FnOnce(&mut Vec<SheetRow>) -> T) -> Result<T> {
        let mut sheets = self.sheets.lock().unwrap();
        let (_, rows) = sheets
            .iter_mut()
            .find(|(t, _)| t == sheet)
            .ok_or_else(|| anyhow::anyhow!("Unable to parse range: sheet '{}' not found", sheet))?;
        Ok(f(rows))
    }
}

fn is_blank(row: &SheetRow) -> bool {
    row.iter()
        .all(|c| matches!(c, CellValue::Text(s) if s.is_empty()))
}

fn parse_cell(cell: &str) -> (Option<usize>, Option<usize>) {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    let col = if letters.is_empty() {
        None
    } else {
        Some(
            letters
                .to_ascii_uppercase()
                .bytes()
                .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
                - 1,
        )
    };
    let row = digits.parse::<usize>().ok().map(|r| r - 1);
    (row, col)
}

fn parse_range(range: &str) -> A1Range {
    let (sheet, cells) = range.rsplit_once('!').unwrap_or((range, "A1"));
    let sheet = sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map(|s| s.replace("''", "'"))
        .unwrap_or_else(|| sheet.to_string());

    let (start, end) = cells.split_once(':').unwrap_or((cells, ""));
    let (first_row, first_col) = parse_cell(start);
    let (last_row, last_col) = if end.is_empty() {
        (None, None)
    } else {
        parse_cell(end)
    };

    A1Range {
        sheet,
        first_row: first_row.unwrap_or(0),
        first_col: first_col.unwrap_or(0),
        last_row,
        last_col,
    }
}

fn write_at(rows: &mut Vec<SheetRow>, start_row: usize, start_col: usize, values: &[SheetRow]) {
    for (offset, values_row) in values.iter().enumerate() {
        let index = start_row + offset;
        if rows.len() <= index {
            rows.resize(index + 1, Vec::new());
        }
        let row = &mut rows[index];
        if row.len() < start_col + values_row.len() {
            row.resize(start_col + values_row.len(), CellValue::text(""));
        }
        for (col, value) in values_row.iter().enumerate() {
            row[start_col + col] = value.clone();
        }
    }
}

#[async_trait]
impl SpreadsheetApi for MemorySpreadsheet {
    async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        self.record(format!("get {}", range));
        let a1 = parse_range(range);
        self.with_rows(&a1.sheet, |rows| {
            let last_row = a1.last_row.unwrap_or(usize::MAX);
            rows.iter()
                .enumerate()
                .filter(|(i, _)| *i >= a1.first_row && *i <= last_row)
                .map(|(_, row)| {
                    let last_col = a1.last_col.unwrap_or(usize::MAX).min(row.len().saturating_sub(1));
                    let mut cells: Vec<String> = row
                        .iter()
                        .enumerate()
                        .filter(|(c, _)| *c >= a1.first_col && *c <= last_col)
                        .map(|(_, v)| match v {
                            CellValue::Text(s) => s.clone(),
                            CellValue::Number(n) => n.to_string(),
                        })
                        .collect();
                    while cells.last().is_some_and(|c| c.is_empty()) {
                        cells.pop();
                    }
                    cells
                })
                .collect::<Vec<_>>()
        })
        .map(|mut rows| {
            while rows.last().is_some_and(|r| r.is_empty()) {
                rows.pop();
            }
            rows
        })
    }

    async fn sheet_titles(&self) -> Result<Vec<String>> {
        self.record("titles".to_string());
        Ok(self.titles())
    }

    async fn add_sheet(&self, title: &str) -> Result<()> {
        self.record(format!("add {}", title));
        let mut sheets = self.sheets.lock().unwrap();
        if sheets.iter().any(|(t, _)| t == title) {
            anyhow::bail!("A sheet with the name \"{}\" already exists", title);
        }
        sheets.push((title.to_string(), Vec::new()));
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        self.record(format!("clear {}", range));
        let a1 = parse_range(range);
        self.with_rows(&a1.sheet, |rows| {
            let last_row = a1.last_row.unwrap_or(usize::MAX);
            let last_col = a1.last_col.unwrap_or(usize::MAX);
            for (i, row) in rows.iter_mut().enumerate() {
                if i < a1.first_row || i > last_row {
                    continue;
                }
                for (c, cell) in row.iter_mut().enumerate() {
                    if c >= a1.first_col && c <= last_col {
                        *cell = CellValue::text("");
                    }
                }
            }
            while rows.last().is_some_and(is_blank) {
                rows.pop();
            }
        })
    }

    async fn update_values(&self, range: &str, values: &[SheetRow]) -> Result<()> {
        self.record(format!("update {}", range));
        let a1 = parse_range(range);
        self.with_rows(&a1.sheet, |rows| {
            write_at(rows, a1.first_row, a1.first_col, values)
        })
    }

    async fn append_values(&self, range: &str, values: &[SheetRow]) -> Result<()> {
        self.record(format!("append {}", range));
        let a1 = parse_range(range);
        self.with_rows(&a1.sheet, |rows| {
            let next = rows
                .iter()
                .rposition(|row| !is_blank(row))
                .map(|i| i + 1)
                .unwrap_or(0)
                .max(a1.first_row);
            write_at(rows, next, a1.first_col, values)
        })
    }
}

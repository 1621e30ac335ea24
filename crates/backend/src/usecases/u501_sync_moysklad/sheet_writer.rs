use anyhow::{Context, Result};
use contracts::shared::sheet_row::{header_row, SheetRow};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::shared::google_sheets::{a1_range, SpreadsheetApi};

/// Очищаемая при сбросе область листа
pub const CLEAR_CELLS: &str = "A1:Z10000";

/// Буфер строк одного листа
#[derive(Debug, Clone)]
struct SheetBuffer {
    name: String,
    /// Заголовок, который будет записан при сбросе листа; `None` - лист не сбрасывается
    header: Option<SheetRow>,
    rows: Vec<SheetRow>,
}

/// Итог записи буферов
#[derive(Debug, Default, Clone)]
pub struct FlushSummary {
    /// Записанные листы в порядке записи
    pub sheets_written: Vec<String>,
    pub rows_written: usize,
    /// Листы, запись которых не удалась, с причиной
    pub failed: Vec<(String, String)>,
}

/// Буферизованная запись в таблицу
///
/// Строки копятся по названию листа в порядке регистрации листов и записываются
/// одним batched-вызовом на лист при `flush`. Сброс (очистка + заголовок)
/// выполняется тоже при `flush`, поэтому до готовности новых данных в листах
/// остаются старые.
pub struct SheetWriter {
    api: Arc<dyn SpreadsheetApi>,
    buffers: Vec<SheetBuffer>,
    index: HashMap<String, usize>,
    known_titles: Option<HashSet<String>>,
}

impl SheetWriter {
    pub fn new(api: Arc<dyn SpreadsheetApi>) -> Self {
        Self {
            api,
            buffers: Vec::new(),
            index: HashMap::new(),
            known_titles: None,
        }
    }

    fn buffer_mut(&mut self, name: &str) -> &mut SheetBuffer {
        let idx = match self.index.get(name) {
            Some(idx) => *idx,
            None => {
                self.buffers.push(SheetBuffer {
                    name: name.to_string(),
                    header: None,
                    rows: Vec::new(),
                });
                self.index.insert(name.to_string(), self.buffers.len() - 1);
                self.buffers.len() - 1
            }
        };
        &mut self.buffers[idx]
    }

    /// Зарегистрировать лист, который при записи будет сброшен с заголовком `headers`
    pub fn register(&mut self, name: &str, headers: &[String]) {
        self.buffer_mut(name).header = Some(header_row(headers));
    }

    pub fn buffer_row(&mut self, name: &str, row: SheetRow) {
        self.buffer_mut(name).rows.push(row);
    }

    pub fn buffer_rows<I>(&mut self, name: &str, rows: I)
    where
        I: IntoIterator<Item = SheetRow>,
    {
        self.buffer_mut(name).rows.extend(rows);
    }

    /// Число строк в буфере листа; `None`, если лист не упоминался
    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|idx| self.buffers[*idx].rows.len())
    }

    pub fn buffered_rows(&self, name: &str) -> Option<&[SheetRow]> {
        self.index
            .get(name)
            .map(|idx| self.buffers[*idx].rows.as_slice())
    }

    /// Листы в порядке регистрации
    pub fn sheet_names(&self) -> Vec<&str> {
        self.buffers.iter().map(|b| b.name.as_str()).collect()
    }

    /// Создать лист, если его нет. Возвращает `true`, если лист создан.
    pub async fn ensure_sheet_exists(&mut self, name: &str) -> Result<bool> {
        if self.known_titles.is_none() {
            let titles = self
                .api
                .sheet_titles()
                .await
                .context("Не удалось получить список листов")?;
            self.known_titles = Some(titles.into_iter().collect());
        }

        if self
            .known_titles
            .as_ref()
            .is_some_and(|titles| titles.contains(name))
        {
            return Ok(false);
        }

        tracing::info!("Создаю лист: {}", name);
        self.api
            .add_sheet(name)
            .await
            .with_context(|| format!("Не удалось создать лист '{}'", name))?;
        if let Some(titles) = self.known_titles.as_mut() {
            titles.insert(name.to_string());
        }
        Ok(true)
    }

    /// Очистить лист и записать заголовок в первую строку
    pub async fn reset_sheet(&mut self, name: &str, header: &SheetRow) -> Result<()> {
        self.ensure_sheet_exists(name).await?;
        self.api
            .clear_values(&a1_range(name, CLEAR_CELLS))
            .await
            .with_context(|| format!("Не удалось очистить лист '{}'", name))?;
        self.api
            .update_values(&a1_range(name, "A1"), std::slice::from_ref(header))
            .await
            .with_context(|| format!("Не удалось записать заголовок листа '{}'", name))?;
        Ok(())
    }

    async fn flush_sheet(&mut self, idx: usize) -> Result<usize> {
        let name = self.buffers[idx].name.clone();

        if let Some(header) = self.buffers[idx].header.clone() {
            self.reset_sheet(&name, &header).await?;
            self.buffers[idx].header = None;
        } else {
            self.ensure_sheet_exists(&name).await?;
        }

        let rows = std::mem::take(&mut self.buffers[idx].rows);
        if rows.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.api.append_values(&a1_range(&name, "A1"), &rows).await {
            self.buffers[idx].rows = rows;
            return Err(e.context(format!("Не удалось дописать строки в лист '{}'", name)));
        }
        Ok(rows.len())
    }

    /// Записать все зарегистрированные листы
    ///
    /// Ошибка одного листа не останавливает запись остальных; буфер такого листа сохраняется.
    pub async fn flush(&mut self) -> FlushSummary {
        let mut summary = FlushSummary::default();

        for idx in 0..self.buffers.len() {
            let buffer = &self.buffers[idx];
            if buffer.header.is_none() && buffer.rows.is_empty() {
                continue;
            }
            let name = buffer.name.clone();

            match self.flush_sheet(idx).await {
                Ok(written) => {
                    tracing::info!("Лист '{}': записано строк {}", name, written);
                    summary.rows_written += written;
                    summary.sheets_written.push(name);
                }
                Err(e) => {
                    tracing::error!("Лист '{}' не записан: {:#}", name, e);
                    summary.failed.push((name, format!("{:#}", e)));
                }
            }
        }

        summary
    }
}

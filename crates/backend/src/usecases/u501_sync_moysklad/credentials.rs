use anyhow::{Context, Result};
use contracts::domain::a001_cabinet::aggregate::{Cabinet, SkippedCabinetRow};
use contracts::enums::sheet_category::CONSOLIDATED_SUFFIX;
use std::collections::HashSet;

use crate::shared::google_sheets::SpreadsheetApi;

/// Кабинеты из листа учётных данных
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CabinetList {
    pub cabinets: Vec<Cabinet>,
    pub skipped: Vec<SkippedCabinetRow>,
}

/// Прочитать кабинеты из диапазона вида `основа!A2:C`
pub async fn list_cabinets(api: &dyn SpreadsheetApi, range: &str) -> Result<CabinetList> {
    let rows = api
        .read_values(range)
        .await
        .with_context(|| format!("Не удалось прочитать кабинеты из {}", range))?;

    Ok(parse_cabinet_rows(rows, first_row_number(range)))
}

/// Строки -> кабинеты. Неполные строки, повторы названий и название `общее`
/// (листы кабинета совпали бы со сводными) пропускаются, полностью пустые
/// строки игнорируются.
pub fn parse_cabinet_rows(rows: Vec<Vec<String>>, first_row_number: usize) -> CabinetList {
    let mut list = CabinetList::default();
    let mut seen = HashSet::new();

    for (offset, row) in rows.into_iter().enumerate() {
        let row_number = first_row_number + offset;
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or_default();
        let (name, login, password) = (cell(0), cell(1), cell(2));

        if name.is_empty() && login.is_empty() && password.is_empty() {
            continue;
        }

        let missing: Vec<&str> = [("название", name), ("логин", login), ("пароль", password)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();

        let skip_reason = if !missing.is_empty() {
            Some(format!("не заполнено: {}", missing.join(", ")))
        } else if name.to_lowercase() == CONSOLIDATED_SUFFIX {
            Some(format!(
                "название '{}' зарезервировано для сводных листов",
                name
            ))
        } else if !seen.insert(name.to_string()) {
            Some("повтор названия кабинета".to_string())
        } else {
            None
        };

        match skip_reason {
            Some(reason) => {
                tracing::warn!("Строка {} листа кабинетов пропущена: {}", row_number, reason);
                list.skipped.push(SkippedCabinetRow {
                    row_number,
                    name: (!name.is_empty()).then(|| name.to_string()),
                    reason,
                });
            }
            None => list.cabinets.push(Cabinet::new(name, login, password)),
        }
    }

    list
}

/// Номер первой строки диапазона: `основа!A2:C` -> 2
fn first_row_number(range: &str) -> usize {
    let cells = range.rsplit_once('!').map(|(_, c)| c).unwrap_or(range);
    cells
        .split(':')
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(1)
}

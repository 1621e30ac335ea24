//! Приведение полей JSON МойСклад к значениям ячеек.
//!
//! Поля могут прийти строкой, числом или не прийти вовсе. Правило:
//! пустое значение (null, нет поля, "", false, 0) даёт "—" для текста и 0 для чисел.

use contracts::shared::sheet_row::PLACEHOLDER;
use serde_json::Value;

/// Текстовое значение ячейки
pub fn text(value: Option<&Value>, trim: bool) -> String {
    let rendered = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 0.0 => return PLACEHOLDER.to_string(),
            // 101.0 -> "101", как в ячейке таблицы
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    };

    let rendered = if trim { rendered.trim().to_string() } else { rendered };
    if rendered.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        rendered
    }
}

/// Числовое значение ячейки (остаток, количество)
pub fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Дата документа: часть момента до разделителя времени
///
/// МойСклад отдаёт `2024-03-05 12:30:00.000`, ISO-формат `2024-03-05T12:30:00` тоже принимается.
pub fn date(moment: Option<&Value>) -> String {
    let Some(Value::String(moment)) = moment else {
        return PLACEHOLDER.to_string();
    };
    let day = moment
        .trim()
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or_default();
    if day.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        day.to_string()
    }
}

/// Содержит ли название статуса токен (без учёта регистра)
pub fn state_contains(state_name: Option<&Value>, token: &str) -> bool {
    match state_name {
        Some(Value::String(name)) => name.to_lowercase().contains(&token.to_lowercase()),
        _ => false,
    }
}

use anyhow::Result;
use contracts::domain::a001_cabinet::Cabinet;
use contracts::shared::sheet_row::{CellValue, SheetRow};
use serde_json::Value;

use super::normalize;
use crate::usecases::u501_sync_moysklad::moysklad_api_client::MoySkladApiClient;
use crate::usecases::u501_sync_moysklad::product_resolver::{resolve_product, Product, ProductCache};

/// Шапка документа (заказа или отгрузки), общая для всех его позиций
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub date: String,
    pub agent: String,
    pub status: String,
}

/// Шапка документа или `None`, если статус содержит `excluded_state`
pub fn document_header(doc: &Value, excluded_state: &str, trim: bool) -> Option<DocumentHeader> {
    let state_name = doc.pointer("/state/name");
    if normalize::state_contains(state_name, excluded_state) {
        return None;
    }

    Some(DocumentHeader {
        date: normalize::date(doc.get("moment")),
        agent: normalize::text(doc.pointer("/agent/name"), trim),
        status: normalize::text(state_name, trim),
    })
}

/// Позиции документа: (href товара, количество) в порядке API
pub fn document_positions(doc: &Value) -> Vec<(Option<&str>, f64)> {
    doc.pointer("/positions/rows")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|pos| {
                    (
                        pos.pointer("/assortment/meta/href").and_then(Value::as_str),
                        normalize::number(pos.get("quantity")),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// [Дата, Контрагент, Статус, Товар, Артикул, Код, Количество]
pub fn position_row(header: &DocumentHeader, product: &Product, quantity: f64) -> SheetRow {
    vec![
        CellValue::text(header.date.as_str()),
        CellValue::text(header.agent.as_str()),
        CellValue::text(header.status.as_str()),
        CellValue::text(product.name.as_str()),
        CellValue::text(product.article.as_str()),
        CellValue::text(product.code.as_str()),
        CellValue::Number(quantity),
    ]
}

/// Строки всех позиций документа; документ с исключённым статусом строк не даёт
pub async fn process_document(
    client: &MoySkladApiClient,
    cabinet: &Cabinet,
    cache: &mut ProductCache,
    doc: &Value,
    excluded_state: &str,
    trim: bool,
) -> Result<Vec<SheetRow>> {
    let Some(header) = document_header(doc, excluded_state, trim) else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for (href, quantity) in document_positions(doc) {
        let product = resolve_product(client, cabinet, cache, href, trim).await?;
        rows.push(position_row(&header, &product, quantity));
    }
    Ok(rows)
}

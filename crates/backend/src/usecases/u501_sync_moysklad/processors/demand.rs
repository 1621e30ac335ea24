use anyhow::Result;
use contracts::domain::a001_cabinet::Cabinet;
use contracts::shared::sheet_row::SheetRow;
use serde_json::Value;

use super::document::process_document;
use crate::usecases::u501_sync_moysklad::moysklad_api_client::MoySkladApiClient;
use crate::usecases::u501_sync_moysklad::product_resolver::ProductCache;

/// Отгрузки в статусе "Поступило в продажу" не выгружаются
pub const ON_SALE_STATE: &str = "поступило в продажу";

/// Обработать одну отгрузку
pub async fn process_demand(
    client: &MoySkladApiClient,
    cabinet: &Cabinet,
    cache: &mut ProductCache,
    demand: &Value,
    trim: bool,
) -> Result<Vec<SheetRow>> {
    process_document(client, cabinet, cache, demand, ON_SALE_STATE, trim).await
}

use anyhow::Result;
use contracts::domain::a001_cabinet::Cabinet;
use contracts::shared::sheet_row::SheetRow;
use serde_json::Value;

use super::document::process_document;
use crate::usecases::u501_sync_moysklad::moysklad_api_client::MoySkladApiClient;
use crate::usecases::u501_sync_moysklad::product_resolver::ProductCache;

/// Заказы в статусе "Доставлено..." не выгружаются
pub const DELIVERED_STATE: &str = "доставлено";

/// Обработать один заказ поставщику
pub async fn process_order(
    client: &MoySkladApiClient,
    cabinet: &Cabinet,
    cache: &mut ProductCache,
    order: &Value,
    trim: bool,
) -> Result<Vec<SheetRow>> {
    process_document(client, cabinet, cache, order, DELIVERED_STATE, trim).await
}

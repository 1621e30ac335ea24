use super::credentials;
use super::error::SyncError;
use super::moysklad_api_client::MoySkladApiClient;
use super::processors::{demand, purchase_order, stock};
use super::product_resolver::ProductCache;
use super::progress_tracker::ProgressTracker;
use super::sheet_writer::SheetWriter;
use crate::shared::config::SyncConfig;
use crate::shared::google_sheets::SpreadsheetApi;
use anyhow::Result;
use contracts::domain::a001_cabinet::Cabinet;
use contracts::enums::SheetCategory;
use contracts::shared::sheet_row::{with_cabinet, SheetRow};
use contracts::usecases::u501_sync_moysklad::{
    progress::SyncStatus,
    response::{CabinetOutcome, CabinetReport, SyncReport},
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Данные одного кабинета, собранные за один проход
#[derive(Debug, Default)]
pub struct CabinetData {
    pub cabinet: String,
    pub stock: Vec<SheetRow>,
    pub orders: Vec<SheetRow>,
    pub shipments: Vec<SheetRow>,
}

impl CabinetData {
    pub fn new(cabinet: &str) -> Self {
        Self {
            cabinet: cabinet.to_string(),
            ..Self::default()
        }
    }

    pub fn rows(&self, category: SheetCategory) -> &[SheetRow] {
        match category {
            SheetCategory::Stock => &self.stock,
            SheetCategory::OrderPositions => &self.orders,
            SheetCategory::Shipments => &self.shipments,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.stock.len() + self.orders.len() + self.shipments.len()
    }

    fn outcome(&self) -> CabinetOutcome {
        CabinetOutcome::Synced {
            stock_rows: self.stock.len(),
            order_rows: self.orders.len(),
            shipment_rows: self.shipments.len(),
        }
    }

    /// Переложить строки в буферы: лист кабинета + сводный лист с префиксом кабинета
    pub fn stage(&self, writer: &mut SheetWriter) {
        for category in SheetCategory::all() {
            let rows = self.rows(category);
            let sheet = category.cabinet_sheet(&self.cabinet);
            writer.register(&sheet, &category.headers());
            writer.buffer_rows(&sheet, rows.iter().cloned());
            writer.buffer_rows(
                &category.consolidated_sheet(),
                rows.iter().map(|row| with_cabinet(&self.cabinet, row)),
            );
        }
    }
}

/// Executor синхронизации МойСклад -> Google Sheets
pub struct SyncExecutor {
    sheets: Arc<dyn SpreadsheetApi>,
    api_client: Arc<MoySkladApiClient>,
    settings: SyncConfig,
    pub progress_tracker: Arc<ProgressTracker>,
}

impl SyncExecutor {
    pub fn new(
        sheets: Arc<dyn SpreadsheetApi>,
        api_client: Arc<MoySkladApiClient>,
        settings: SyncConfig,
        progress_tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            sheets,
            api_client,
            settings,
            progress_tracker,
        }
    }

    /// Полный прогон: кабинеты -> выгрузка по кабинетам -> одна запись буферов
    pub async fn run(&self) -> Result<SyncReport> {
        let session_id = Uuid::new_v4().to_string();
        self.progress_tracker.create_session(session_id.clone());

        match self.execute(&session_id).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!("Синхронизация провалена: {:#}", e);
                self.progress_tracker
                    .add_error(&session_id, format!("{:#}", e));
                self.progress_tracker
                    .complete_session(&session_id, SyncStatus::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&self, session_id: &str) -> Result<SyncReport> {
        let list =
            credentials::list_cabinets(self.sheets.as_ref(), &self.settings.cabinets_range).await?;
        tracing::info!(
            "Кабинетов к обработке: {}, пропущено строк: {}",
            list.cabinets.len(),
            list.skipped.len()
        );
        self.progress_tracker
            .set_total(session_id, list.cabinets.len() as i32);

        let results = self.fetch_cabinets(session_id, &list.cabinets).await;

        let mut writer = SheetWriter::new(self.sheets.clone());
        for category in SheetCategory::all() {
            writer.register(
                &category.consolidated_sheet(),
                &category.consolidated_headers(),
            );
        }

        let mut cabinets = Vec::with_capacity(results.len());
        for (cabinet, result) in list.cabinets.iter().zip(results) {
            let outcome = match result {
                Ok(data) => {
                    data.stage(&mut writer);
                    data.outcome()
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    self.progress_tracker.add_error(session_id, e.to_string());
                    CabinetOutcome::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };
            cabinets.push(CabinetReport {
                cabinet: cabinet.name.clone(),
                outcome,
            });
        }

        let summary = writer.flush().await;
        for (sheet, message) in &summary.failed {
            self.progress_tracker
                .add_error(session_id, format!("лист '{}': {}", sheet, message));
        }
        self.progress_tracker
            .set_rows_written(session_id, summary.rows_written);

        let all_synced = cabinets.iter().all(CabinetReport::is_synced);
        let status = if all_synced && summary.failed.is_empty() {
            SyncStatus::Completed
        } else {
            SyncStatus::CompletedWithErrors
        };
        self.progress_tracker.complete_session(session_id, status);

        if status == SyncStatus::Completed {
            tracing::info!("Готово! Все данные загружены.");
        } else {
            tracing::warn!(
                "Готово с ошибками: кабинетов с ошибкой {}, листов с ошибкой {}",
                cabinets.iter().filter(|c| !c.is_synced()).count(),
                summary.failed.len()
            );
        }

        Ok(SyncReport {
            session_id: session_id.to_string(),
            status,
            cabinets,
            skipped: list.skipped,
            sheets_written: summary.sheets_written,
            rows_written: summary.rows_written,
            failed_sheets: summary.failed,
        })
    }

    /// Кабинеты обрабатываются параллельно (не больше `max_parallel_cabinets`),
    /// результаты возвращаются в порядке списка кабинетов
    async fn fetch_cabinets(
        &self,
        session_id: &str,
        cabinets: &[Cabinet],
    ) -> Vec<Result<CabinetData, SyncError>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_parallel_cabinets.max(1)));
        let trim = self.settings.trim_strings;

        let handles: Vec<_> = cabinets
            .iter()
            .cloned()
            .map(|cabinet| {
                let client = self.api_client.clone();
                let tracker = self.progress_tracker.clone();
                let semaphore = semaphore.clone();
                let sid = session_id.to_string();
                let name = cabinet.name.clone();

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let result = sync_cabinet(&client, &cabinet, trim, &tracker, &sid).await;
                    let rows = result.as_ref().map(CabinetData::total_rows).unwrap_or(0);
                    tracker.cabinet_processed(&sid, rows);
                    result
                });
                (name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (cabinet, handle) in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(SyncError::TaskAborted {
                    cabinet,
                    message: e.to_string(),
                }),
            });
        }
        results
    }
}

fn failed_on(cabinet: &Cabinet, kind: SheetCategory) -> impl FnOnce(anyhow::Error) -> SyncError + '_ {
    move |e| SyncError::cabinet(&cabinet.name, kind, e)
}

/// Один проход по кабинету: остатки, затем заказы поставщикам, затем отгрузки
///
/// Кэш товаров живёт только в пределах этого прохода.
pub async fn sync_cabinet(
    client: &MoySkladApiClient,
    cabinet: &Cabinet,
    trim: bool,
    tracker: &ProgressTracker,
    session_id: &str,
) -> Result<CabinetData, SyncError> {
    tracing::info!("Обработка кабинета: {}", cabinet.name);
    let mut data = CabinetData::new(&cabinet.name);
    let mut cache = ProductCache::new();
    let current = |kind: SheetCategory| Some(format!("{}: {}", cabinet.name, kind));

    tracker.set_current_item(session_id, current(SheetCategory::Stock));
    let rows = client
        .fetch_stock(cabinet)
        .await
        .map_err(failed_on(cabinet, SheetCategory::Stock))?;
    data.stock = rows
        .iter()
        .map(|row| stock::process_stock_row(row, trim))
        .collect();

    tracker.set_current_item(session_id, current(SheetCategory::OrderPositions));
    let orders = client
        .fetch_purchase_orders(cabinet)
        .await
        .map_err(failed_on(cabinet, SheetCategory::OrderPositions))?;
    for order in &orders {
        let rows = purchase_order::process_order(client, cabinet, &mut cache, order, trim)
            .await
            .map_err(failed_on(cabinet, SheetCategory::OrderPositions))?;
        data.orders.extend(rows);
    }

    tracker.set_current_item(session_id, current(SheetCategory::Shipments));
    let demands = client
        .fetch_demands(cabinet)
        .await
        .map_err(failed_on(cabinet, SheetCategory::Shipments))?;
    for item in &demands {
        let rows = demand::process_demand(client, cabinet, &mut cache, item, trim)
            .await
            .map_err(failed_on(cabinet, SheetCategory::Shipments))?;
        data.shipments.extend(rows);
    }

    tracing::info!(
        "Кабинет {}: остатков {}, позиций заказов {}, отгрузок {}, товаров загружено {}",
        cabinet.name,
        data.stock.len(),
        data.orders.len(),
        data.shipments.len(),
        cache.len()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::MoySkladConfig;
    use crate::shared::google_sheets::memory::MemorySpreadsheet;
    use crate::usecases::u501_sync_moysklad::moysklad_api_client::basic_auth_header;
    use contracts::shared::sheet_row::{header_row, CellValue};
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> SyncConfig {
        SyncConfig {
            cabinets_range: "основа!A2:C".to_string(),
            trim_strings: true,
            max_parallel_cabinets: 2,
        }
    }

    fn base_sheet(cabinets: &[(&'static str, &'static str, &'static str)]) -> MemorySpreadsheet {
        let mut rows = vec![vec!["Кабинет", "Логин", "Пароль"]];
        rows.extend(cabinets.iter().map(|(n, l, p)| vec![*n, *l, *p]));
        MemorySpreadsheet::new().with_sheet("основа", rows)
    }

    fn executor(server: &MockServer, sheets: Arc<MemorySpreadsheet>) -> SyncExecutor {
        let client = MoySkladApiClient::new(&MoySkladConfig {
            api_url: server.uri(),
            ..MoySkladConfig::default()
        })
        .unwrap();
        SyncExecutor::new(
            sheets,
            Arc::new(client),
            settings(),
            Arc::new(ProgressTracker::new()),
        )
    }

    async fn mount_list(server: &MockServer, login: &str, route: &str, rows: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", basic_auth_header(login, "pw").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": rows })))
            .mount(server)
            .await;
    }

    async fn mount_product(server: &MockServer, id: &str, body: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/entity/product/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn position(server: &MockServer, product_id: &str, quantity: f64) -> Value {
        json!({
            "quantity": quantity,
            "assortment": { "meta": { "href": format!("{}/entity/product/{}", server.uri(), product_id) } }
        })
    }

    fn text(row: &SheetRow, idx: usize) -> &str {
        row[idx].as_text().unwrap()
    }

    /// Кабинет Alpha: 2 остатка, 1 открытый заказ на 2 позиции, 1 доставленный заказ, отгрузок нет
    async fn mount_alpha(server: &MockServer) {
        mount_list(
            server,
            "alpha",
            "/report/stock/all",
            json!([
                { "name": "Чашка", "article": "CUP-1", "code": "101", "stock": 5 },
                { "name": null, "code": "A1" }
            ]),
        )
        .await;
        mount_list(
            server,
            "alpha",
            "/entity/purchaseorder",
            json!([
                {
                    "moment": "2024-05-01 09:00:00.000",
                    "agent": { "name": "ООО Ромашка" },
                    "state": { "name": "В пути" },
                    "positions": { "rows": [position(server, "p1", 2.0), position(server, "p2", 3.0)] }
                },
                {
                    "moment": "2024-04-01 09:00:00.000",
                    "state": { "name": "Доставлено частично" },
                    "positions": { "rows": [position(server, "p3", 1.0)] }
                }
            ]),
        )
        .await;
        mount_list(server, "alpha", "/entity/demand", json!([])).await;
    }

    #[tokio::test]
    async fn test_single_cabinet_end_to_end() {
        let server = MockServer::start().await;
        mount_alpha(&server).await;
        mount_product(&server, "p1", json!({ "name": "Чашка", "article": "CUP-1", "code": "101" }), 1).await;
        mount_product(&server, "p2", json!({ "name": "Блюдце", "code": 102 }), 1).await;
        mount_product(&server, "p3", json!({}), 0).await;

        let sheets = Arc::new(base_sheet(&[("Alpha", "alpha", "pw")]));
        let report = executor(&server, sheets.clone()).run().await.unwrap();

        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(
            report.cabinets[0].outcome,
            CabinetOutcome::Synced { stock_rows: 2, order_rows: 2, shipment_rows: 0 }
        );
        assert_eq!(report.rows_written, 8);

        let stock = sheets.rows("Остатки Alpha").unwrap();
        assert_eq!(stock.len(), 3);
        assert_eq!(stock[0], header_row(&SheetCategory::Stock.headers()));
        assert_eq!(
            stock[2],
            vec![
                CellValue::text("—"),
                CellValue::text("—"),
                CellValue::text("A1"),
                CellValue::Number(0.0),
            ]
        );

        let stock_all = sheets.rows("Остатки общее").unwrap();
        assert_eq!(stock_all.len(), 3);
        assert_eq!(stock_all[0], header_row(&SheetCategory::Stock.consolidated_headers()));
        assert_eq!(text(&stock_all[1], 0), "Alpha");
        assert_eq!(&stock_all[1][1..], stock[1].as_slice());

        let orders = sheets.rows("ПозицииЗаказов Alpha").unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(text(&orders[1], 0), "2024-05-01");
        assert_eq!(text(&orders[1], 3), "Чашка");
        assert_eq!(text(&orders[2], 3), "Блюдце");
        assert_eq!(text(&orders[2], 4), "—");
        assert_eq!(text(&orders[2], 5), "102");
        assert_eq!(sheets.rows("ПозицииЗаказов общее").unwrap().len(), 3);

        assert_eq!(sheets.rows("Отгрузки Alpha").unwrap().len(), 1);
        assert_eq!(sheets.rows("Отгрузки общее").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_cabinet_keeps_other_results() {
        let server = MockServer::start().await;
        mount_alpha(&server).await;
        mount_product(&server, "p1", json!({ "name": "Чашка" }), 1).await;
        mount_product(&server, "p2", json!({ "name": "Блюдце" }), 1).await;

        mount_list(&server, "beta", "/report/stock/all", json!([{ "name": "Ложка", "stock": 1 }])).await;
        mount_list(&server, "beta", "/entity/purchaseorder", json!([])).await;
        Mock::given(method("GET"))
            .and(path("/entity/demand"))
            .and(header("authorization", basic_auth_header("beta", "pw").as_str()))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let sheets = Arc::new(
            base_sheet(&[("Alpha", "alpha", "pw"), ("Beta", "beta", "pw")])
                .with_sheet("Остатки Beta", vec![vec!["старые данные"]]),
        );
        let exec = executor(&server, sheets.clone());
        let report = exec.run().await.unwrap();

        assert_eq!(report.status, SyncStatus::CompletedWithErrors);
        assert!(report.cabinets[0].is_synced());
        match &report.cabinets[1].outcome {
            CabinetOutcome::Failed { kind, message } => {
                assert_eq!(*kind, Some(SheetCategory::Shipments));
                assert!(message.contains("'Beta'"));
                assert!(message.contains("отгрузки"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        // листы упавшего кабинета не тронуты, сводные - только с Alpha
        assert_eq!(
            sheets.rows("Остатки Beta").unwrap(),
            vec![vec![CellValue::text("старые данные")]]
        );
        assert!(sheets.rows("Отгрузки Beta").is_none());
        let stock_all = sheets.rows("Остатки общее").unwrap();
        assert_eq!(stock_all.len(), 3);
        assert!(stock_all[1..].iter().all(|row| text(row, 0) == "Alpha"));

        let progress = exec.progress_tracker.get_progress(&report.session_id).unwrap();
        assert_eq!(progress.errors, 1);
        assert_eq!(progress.cabinets_processed, 2);
    }

    #[tokio::test]
    async fn test_consolidated_rows_follow_cabinet_order() {
        let server = MockServer::start().await;
        for login in ["alpha", "beta"] {
            mount_list(
                &server,
                login,
                "/report/stock/all",
                json!([
                    { "name": format!("{}-1", login), "stock": 1 },
                    { "name": format!("{}-2", login), "stock": 2 }
                ]),
            )
            .await;
            mount_list(&server, login, "/entity/purchaseorder", json!([])).await;
            mount_list(&server, login, "/entity/demand", json!([])).await;
        }

        let sheets = Arc::new(base_sheet(&[("Alpha", "alpha", "pw"), ("Beta", "beta", "pw")]));
        executor(&server, sheets.clone()).run().await.unwrap();

        let stock_all = sheets.rows("Остатки общее").unwrap();
        let names: Vec<&str> = stock_all[1..]
            .iter()
            .map(|row| text(row, 1))
            .collect();
        assert_eq!(names, vec!["alpha-1", "alpha-2", "beta-1", "beta-2"]);
        assert_eq!(sheets.rows("Остатки Beta").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cabinet_named_like_consolidated_sheet_is_not_synced() {
        let server = MockServer::start().await;
        mount_alpha(&server).await;
        mount_product(&server, "p1", json!({ "name": "Чашка" }), 1).await;
        mount_product(&server, "p2", json!({ "name": "Блюдце" }), 1).await;
        Mock::given(method("GET"))
            .and(header("authorization", basic_auth_header("total", "pw").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": [] })))
            .expect(0)
            .mount(&server)
            .await;

        let sheets = Arc::new(base_sheet(&[("общее", "total", "pw"), ("Alpha", "alpha", "pw")]));
        let report = executor(&server, sheets.clone()).run().await.unwrap();

        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.cabinets.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name.as_deref(), Some("общее"));

        let stock_all = sheets.rows("Остатки общее").unwrap();
        assert_eq!(stock_all[0], header_row(&SheetCategory::Stock.consolidated_headers()));
        assert_eq!(stock_all.len(), 3);
        assert!(stock_all[1..].iter().all(|row| text(row, 0) == "Alpha"));
    }

    #[tokio::test]
    async fn test_product_cache_is_per_cabinet() {
        let server = MockServer::start().await;
        for login in ["alpha", "beta"] {
            mount_list(&server, login, "/report/stock/all", json!([])).await;
            mount_list(
                &server,
                login,
                "/entity/purchaseorder",
                json!([{ "state": { "name": "Новый" }, "positions": { "rows": [position(&server, "shared", 1.0)] } }]),
            )
            .await;
            mount_list(
                &server,
                login,
                "/entity/demand",
                json!([{ "state": { "name": "Отгружено" }, "positions": { "rows": [position(&server, "shared", 4.0)] } }]),
            )
            .await;
        }
        // один запрос на кабинет: заказы и отгрузки кабинета делят кэш
        mount_product(&server, "shared", json!({ "name": "Чашка" }), 2).await;

        let sheets = Arc::new(base_sheet(&[("Alpha", "alpha", "pw"), ("Beta", "beta", "pw")]));
        let report = executor(&server, sheets.clone()).run().await.unwrap();

        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(sheets.rows("Отгрузки общее").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_run_is_idempotent() {
        let server = MockServer::start().await;
        mount_alpha(&server).await;
        mount_product(&server, "p1", json!({ "name": "Чашка" }), 2).await;
        mount_product(&server, "p2", json!({ "name": "Блюдце" }), 2).await;

        let sheets = Arc::new(base_sheet(&[("Alpha", "alpha", "pw")]));
        let exec = executor(&server, sheets.clone());

        exec.run().await.unwrap();
        let first: Vec<_> = sheets.titles().iter().map(|t| sheets.rows(t)).collect();
        exec.run().await.unwrap();
        let second: Vec<_> = sheets.titles().iter().map(|t| sheets.rows(t)).collect();

        assert_eq!(first, second);
        assert_eq!(sheets.titles().len(), 7);
    }

    #[tokio::test]
    async fn test_missing_base_sheet_fails_run() {
        let server = MockServer::start().await;
        let sheets = Arc::new(MemorySpreadsheet::new());
        let exec = executor(&server, sheets.clone());

        assert!(exec.run().await.is_err());
        assert!(sheets.titles().is_empty());
    }

    #[tokio::test]
    async fn test_no_cabinets_still_resets_consolidated_sheets() {
        let server = MockServer::start().await;
        let sheets = Arc::new(
            base_sheet(&[]).with_sheet("Остатки общее", vec![vec!["x"], vec!["y"]]),
        );
        let report = executor(&server, sheets.clone()).run().await.unwrap();

        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.sheets_written.len(), 3);
        assert_eq!(
            sheets.rows("Остатки общее").unwrap(),
            vec![header_row(&SheetCategory::Stock.consolidated_headers())]
        );
    }
}

use backend::shared::config::{get_credentials_path, load_config};
use backend::shared::google_sheets::{GoogleSheetsClient, ServiceAccountAuth};
use backend::system;
use backend::usecases::u501_sync_moysklad::moysklad_api_client::MoySkladApiClient;
use backend::usecases::u501_sync_moysklad::{ProgressTracker, SyncExecutor};
use contracts::usecases::u501_sync_moysklad::{CabinetOutcome, SyncReport};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env не обязателен: переменные могут прийти из окружения
    let dotenv = dotenvy::dotenv();

    system::tracing::initialize()?;
    if let Ok(path) = dotenv {
        tracing::info!("Loaded environment from {}", path.display());
    }

    let config = load_config()?;
    config.validate()?;

    let credentials_path = get_credentials_path(&config);
    tracing::info!("Service account key: {}", credentials_path.display());
    let auth = ServiceAccountAuth::from_file(&credentials_path)?;

    let sheets = GoogleSheetsClient::new(
        &config.google.sheets_api_url,
        &config.google.spreadsheet_id,
        Arc::new(auth),
    )?;
    let moysklad = MoySkladApiClient::new(&config.moysklad)?;

    let executor = SyncExecutor::new(
        Arc::new(sheets),
        Arc::new(moysklad),
        config.sync.clone(),
        Arc::new(ProgressTracker::new()),
    );

    tracing::info!("Старт синхронизации МойСклад -> Google Sheets");
    let report = executor.run().await?;
    log_summary(&report);

    if report.has_errors() {
        anyhow::bail!(
            "Синхронизация завершена с ошибками: кабинетов {}, листов {}",
            report.failed_cabinets().count(),
            report.failed_sheets.len()
        );
    }
    Ok(())
}

fn log_summary(report: &SyncReport) {
    if !report.skipped.is_empty() {
        tracing::warn!("Пропущено строк листа кабинетов: {}", report.skipped.len());
    }

    for cabinet in &report.cabinets {
        match &cabinet.outcome {
            CabinetOutcome::Synced {
                stock_rows,
                order_rows,
                shipment_rows,
            } => tracing::info!(
                "  {}: остатков {}, позиций заказов {}, отгрузок {}",
                cabinet.cabinet,
                stock_rows,
                order_rows,
                shipment_rows
            ),
            CabinetOutcome::Failed { message, .. } => {
                tracing::error!("  {}: ошибка: {}", cabinet.cabinet, message)
            }
        }
    }

    tracing::info!(
        "Листов записано: {}, строк: {}",
        report.sheets_written.len(),
        report.rows_written
    );
    for (sheet, message) in &report.failed_sheets {
        tracing::error!("  лист '{}' не записан: {}", sheet, message);
    }
}

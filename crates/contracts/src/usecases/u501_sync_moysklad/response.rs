use serde::{Deserialize, Serialize};

use crate::domain::a001_cabinet::aggregate::SkippedCabinetRow;
use crate::enums::SheetCategory;
use super::progress::SyncStatus;

/// Итог синхронизации одного кабинета
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CabinetOutcome {
    /// Все виды данных выгружены
    Synced {
        stock_rows: usize,
        order_rows: usize,
        shipment_rows: usize,
    },
    /// Кабинет упал на виде данных `kind`; его листы не трогаем
    Failed {
        kind: Option<SheetCategory>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabinetReport {
    pub cabinet: String,
    #[serde(flatten)]
    pub outcome: CabinetOutcome,
}

impl CabinetReport {
    pub fn is_synced(&self) -> bool {
        matches!(self.outcome, CabinetOutcome::Synced { .. })
    }
}

/// Отчёт о прогоне синхронизации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub session_id: String,
    pub status: SyncStatus,
    /// Кабинеты в порядке листа "основа"
    pub cabinets: Vec<CabinetReport>,
    /// Строки учётных данных, пропущенные при чтении
    pub skipped: Vec<SkippedCabinetRow>,
    /// Листы, записанные при сбросе буферов, в порядке записи
    pub sheets_written: Vec<String>,
    pub rows_written: usize,
    /// Листы, которые не удалось записать, с причиной
    pub failed_sheets: Vec<(String, String)>,
}

impl SyncReport {
    pub fn failed_cabinets(&self) -> impl Iterator<Item = &CabinetReport> {
        self.cabinets.iter().filter(|c| !c.is_synced())
    }

    pub fn has_errors(&self) -> bool {
        self.status != SyncStatus::Completed
    }
}

use serde::{Deserialize, Serialize};

/// Суффикс сводных (межкабинетных) листов
pub const CONSOLIDATED_SUFFIX: &str = "общее";

/// Заголовок колонки с названием кабинета в сводных листах
pub const CABINET_HEADER: &str = "Кабинет";

const STOCK_HEADERS: &[&str] = &["Наименование", "Артикул", "Код", "Остаток"];

const POSITION_HEADERS: &[&str] = &[
    "Дата",
    "Контрагент",
    "Статус",
    "Товар",
    "Артикул",
    "Код",
    "Количество",
];

/// Категория выгружаемых данных. Определяет название листа и его заголовки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetCategory {
    /// Остатки (отчёт по складским остаткам)
    Stock,
    /// Позиции заказов поставщикам
    OrderPositions,
    /// Отгрузки
    Shipments,
}

impl SheetCategory {
    /// Префикс названия листа
    pub fn title_prefix(&self) -> &'static str {
        match self {
            SheetCategory::Stock => "Остатки",
            SheetCategory::OrderPositions => "ПозицииЗаказов",
            SheetCategory::Shipments => "Отгрузки",
        }
    }

    /// Человекочитаемое название вида данных (для логов и ошибок)
    pub fn display_name(&self) -> &'static str {
        match self {
            SheetCategory::Stock => "остатки",
            SheetCategory::OrderPositions => "заказы поставщикам",
            SheetCategory::Shipments => "отгрузки",
        }
    }

    /// Все категории в порядке обработки
    pub fn all() -> [SheetCategory; 3] {
        [
            SheetCategory::Stock,
            SheetCategory::OrderPositions,
            SheetCategory::Shipments,
        ]
    }

    /// Лист кабинета: "{Категория} {кабинет}"
    pub fn cabinet_sheet(&self, cabinet: &str) -> String {
        format!("{} {}", self.title_prefix(), cabinet)
    }

    /// Сводный лист: "{Категория} общее"
    pub fn consolidated_sheet(&self) -> String {
        format!("{} {}", self.title_prefix(), CONSOLIDATED_SUFFIX)
    }

    /// Заголовки листа кабинета
    pub fn headers(&self) -> Vec<String> {
        let headers = match self {
            SheetCategory::Stock => STOCK_HEADERS,
            SheetCategory::OrderPositions | SheetCategory::Shipments => POSITION_HEADERS,
        };
        headers.iter().map(|h| h.to_string()).collect()
    }

    /// Заголовки сводного листа: колонка "Кабинет" + заголовки листа кабинета
    pub fn consolidated_headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(8);
        headers.push(CABINET_HEADER.to_string());
        headers.extend(self.headers());
        headers
    }
}

impl std::fmt::Display for SheetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

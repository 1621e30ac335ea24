use anyhow::{Context, Result};
use contracts::domain::a001_cabinet::Cabinet;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde_json::Value;

use crate::shared::config::MoySkladConfig;

/// HTTP-клиент JSON API МойСклад (remap 1.2)
///
/// Accept-Encoding: gzip (обязателен для МойСклад) reqwest добавляет сам.
///
/// Каждый список запрашивается одной страницей: если документов больше лимита,
/// остальные не выгружаются.
pub struct MoySkladApiClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    stock_limit: u32,
    document_limit: u32,
}

impl MoySkladApiClient {
    pub fn new(config: &MoySkladConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_secs))
                .build()
                .context("Failed to create HTTP client")?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            stock_limit: config.stock_limit,
            document_limit: config.document_limit,
        })
    }

    /// Отчёт "Остатки" по всем товарам
    pub async fn fetch_stock(&self, cabinet: &Cabinet) -> Result<Vec<Value>> {
        let url = format!("{}/report/stock/all?limit={}", self.base_url, self.stock_limit);
        let body = self.get_json(cabinet, &url).await?;
        Ok(rows_of(body))
    }

    /// Заказы поставщикам с развёрнутыми позициями, контрагентом и статусом
    pub async fn fetch_purchase_orders(&self, cabinet: &Cabinet) -> Result<Vec<Value>> {
        let url = format!(
            "{}/entity/purchaseorder?expand=positions,agent,state&limit={}",
            self.base_url, self.document_limit
        );
        let body = self.get_json(cabinet, &url).await?;
        Ok(rows_of(body))
    }

    /// Отгрузки с развёрнутыми позициями, контрагентом и статусом
    pub async fn fetch_demands(&self, cabinet: &Cabinet) -> Result<Vec<Value>> {
        let url = format!(
            "{}/entity/demand?expand=positions,agent,state&limit={}",
            self.base_url, self.document_limit
        );
        let body = self.get_json(cabinet, &url).await?;
        Ok(rows_of(body))
    }

    /// Карточка товара по href из meta позиции
    pub async fn fetch_product(&self, cabinet: &Cabinet, href: &str) -> Result<Value> {
        self.get_json(cabinet, href).await
    }

    async fn get_json(&self, cabinet: &Cabinet, url: &str) -> Result<Value> {
        tracing::debug!("МойСклад API: GET {} (кабинет '{}')", url, cabinet.name);

        let response = self
            .client
            .get(url)
            .basic_auth(&cabinet.login, Some(&cabinet.password))
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Сетевая ошибка при запросе {}: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let hint = if status.as_u16() == 401 {
                format!(" | проверьте логин/пароль кабинета '{}'", cabinet.name)
            } else {
                String::new()
            };
            anyhow::bail!("HTTP {} при запросе {}: {}{}", status, url, body, hint);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| anyhow::anyhow!("Ошибка парсинга JSON ответа от {}: {}", url, e))
    }
}

/// Ожидаемое значение заголовка Authorization для wiremock-матчеров
#[cfg(test)]
pub(crate) fn basic_auth_header(login: &str, password: &str) -> String {
    use base64::{engine::general_purpose, Engine as _};

    let token = general_purpose::STANDARD.encode(format!("{}:{}", login, password));
    format!("Basic {}", token)
}

/// Коллекция `rows` ответа; отсутствие поля - пустой список
fn rows_of(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
